//! Serve command - message host over stdio
//!
//! Reads newline-delimited JSON requests from stdin and writes one JSON line
//! per response to stdout. Purge requests for the browser and
//! `blacklistUpdated` notifications are written as lines of their own:
//!
//! ```text
//! -> {"action":"addToBlacklist","url":"tracker\\.net"}
//! <- {"result":"added","added":true}
//! <- {"action":"blacklistUpdated"}
//! -> {"action":"visit","url":"https://tracker.net/p"}
//! <- {"action":"purge","url":"https://tracker.net/p"}
//! <- {"result":"decided","purge":true}
//! ```

use anyhow::{Context, Result};
use clap::Args;
use histpurge_core::events::StoreEvent;
use histpurge_core::{Config, Dispatcher, Error, HistoryPurger, PurgeEngine};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Do not forward blacklistUpdated notifications
    #[arg(long)]
    pub no_notify: bool,
}

/// Hands purge requests to the output writer
struct StdoutPurger {
    tx: mpsc::UnboundedSender<String>,
}

impl HistoryPurger for StdoutPurger {
    fn purge(&self, address: &str) -> histpurge_core::Result<()> {
        let line = json!({ "action": "purge", "url": address }).to_string();
        self.tx
            .send(line)
            .map_err(|_| Error::purge(address, "output closed"))
    }
}

/// Execute serve command
pub fn execute(args: ServeArgs, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    runtime.block_on(serve(args, config))
}

async fn serve(args: ServeArgs, config: &Config) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let store = Arc::new(config.build_store());
    let purger = Arc::new(StdoutPurger { tx: tx.clone() });
    let engine = Arc::new(PurgeEngine::new(store.clone(), config.build_filter(), purger));
    let dispatcher = Dispatcher::with_engine(engine);
    let mut updates = store.subscribe();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    info!(backend = ?config.storage.backend, path = %config.storage.path, "Serving on stdio");

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::select! {
            read = stdin.read_until(b'\n', &mut buf) => read.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                0
            }
        };
        if read == 0 {
            break;
        }

        let result = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => dispatcher.handle_message(line.trim_end()),
            Err(e) => Err(Error::Protocol(format!("request is not valid UTF-8: {}", e))),
        };

        let reply = match result {
            Ok(response) => serde_json::to_string(&response).context("Failed to encode response")?,
            Err(e) => {
                warn!(error = %e, "Request failed");
                json!({ "result": "error", "message": e.to_string() }).to_string()
            }
        };
        if tx.send(reply).is_err() {
            break;
        }

        if forward_updates(&mut updates, &tx, args.no_notify) {
            debug!("Forwarded change notification");
        }
    }

    drop(tx);
    drop(dispatcher);
    writer
        .await
        .context("Output task panicked")?
        .context("Failed to write stdout")?;

    info!("Input closed, exiting");
    Ok(())
}

/// Emit one notification per pending change event
fn forward_updates(
    updates: &mut tokio::sync::broadcast::Receiver<StoreEvent>,
    tx: &mpsc::UnboundedSender<String>,
    muted: bool,
) -> bool {
    let mut forwarded = false;
    loop {
        let event = match updates.try_recv() {
            Ok(event) => event,
            // Missed events carry no payload; one notification covers them
            Err(TryRecvError::Lagged(_)) => StoreEvent::BlacklistUpdated,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return forwarded,
        };
        if muted {
            continue;
        }
        if let Ok(line) = serde_json::to_string(&event) {
            forwarded |= tx.send(line).is_ok();
        }
    }
}

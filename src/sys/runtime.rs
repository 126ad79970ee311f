use crate::events::AppEvent;
use anyhow::Context;
use async_channel::Sender;
use std::sync::mpsc;
use std::thread;
use tokio::runtime::{Handle, Runtime};

/// Starts the tokio runtime that runs decode tasks and the config watcher on
/// its own thread, and returns a handle for spawning onto it.
pub fn start_background_services(tx: Sender<AppEvent>) -> anyhow::Result<Handle> {
    let (handle_tx, handle_rx) = mpsc::channel();

    thread::Builder::new()
        .name("harmonist-runtime".into())
        .spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to create Tokio runtime: {}", e);
                    return;
                }
            };
            if handle_tx.send(rt.handle().clone()).is_err() {
                return;
            }

            rt.block_on(async {
                tokio::spawn(async move {
                    crate::config::run_async_watcher(tx).await;
                });

                std::future::pending::<()>().await;
            });
        })
        .context("Failed to spawn the background runtime thread")?;

    handle_rx
        .recv()
        .context("Background runtime failed to start")
}

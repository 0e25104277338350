// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PayBridge host: plays the hybrid runtime for the wallet plugin.
//
// Entry point. Initialises logging, loads configuration, attaches the plugin
// and then serves JSON-line calls from stdin until EOF. Replies and
// `walletReadyChanged` events are written to stdout; logs go to stderr.

mod channel;
mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use paybridge_core::error::ErrorReply;
use paybridge_native::simulator::SimulatedWallet;
use paybridge_native::stub::StubPlatform;
use paybridge_wallet::WalletPlugin;

use channel::{Call, ChannelSink, Outbound};
use config::{Backend, HostConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("PayBridge host starting");
    let config = HostConfig::load();

    let native = match config.backend {
        Backend::Simulator => SimulatedWallet::services(config.simulator.clone()),
        Backend::Stub => StubPlatform::services(),
    };

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_stdout(out_rx));

    let sink = Arc::new(ChannelSink::new(out_tx.clone()));
    let plugin = match WalletPlugin::attach(config.bridge.clone(), native, sink) {
        Ok(plugin) => Arc::new(plugin),
        Err(e) => {
            error!(error = %e, "could not attach wallet plugin");
            std::process::exit(1);
        }
    };

    serve(&plugin, &out_tx).await;

    // Blocks on the main loop thread joining.
    let detaching = Arc::clone(&plugin);
    if tokio::task::spawn_blocking(move || detaching.detach())
        .await
        .is_err()
    {
        warn!("detach task panicked");
    }

    drop(plugin);
    drop(out_tx);
    if writer.await.is_err() {
        warn!("stdout writer panicked");
    }
    info!("PayBridge host stopped");
}

/// Read calls until EOF, running each one concurrently, then wait for all.
async fn serve(plugin: &Arc<WalletPlugin>, out: &mpsc::UnboundedSender<Outbound>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut calls = JoinSet::new();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let call = match Call::parse(&line) {
            Ok(call) => call,
            Err(e) => {
                warn!(error = %e, "malformed call line");
                let reply = ErrorReply::from_error(&e, plugin.platform());
                send(out, Outbound::for_call(serde_json::Value::Null, Err(reply)));
                continue;
            }
        };

        let plugin = Arc::clone(plugin);
        let out = out.clone();
        calls.spawn(async move {
            let reply = plugin.handle_call(&call.method, call.args).await;
            send(&out, Outbound::for_call(call.id, reply));
        });
    }

    info!(pending = calls.len(), "stdin closed, waiting for in-flight calls");
    while let Some(joined) = calls.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "call task failed");
        }
    }
}

fn send(out: &mpsc::UnboundedSender<Outbound>, message: Outbound) {
    if out.send(message).is_err() {
        warn!("stdout writer has gone away");
    }
}

async fn write_stdout(mut rx: mpsc::UnboundedReceiver<Outbound>) {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = rx.recv().await {
        let line = match message.to_line() {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "could not encode outbound message");
                continue;
            }
        };
        let written = async {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await
        };
        if let Err(e) = written.await {
            error!(error = %e, "stdout write failed");
            break;
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A dedicated OS thread acting as the main execution context.
//
// On device the host app already owns a main looper / run loop and supplies
// its own `MainThreadExecutor`. Desktop hosts and tests use `MainLoop`, which
// drains posted tasks in FIFO order on one named thread.

use std::panic::AssertUnwindSafe;
use std::sync::Mutex;
use std::thread::{JoinHandle, ThreadId};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use paybridge_core::error::{PayBridgeError, Result};

use crate::traits::{MainTask, MainThreadExecutor};

/// Single-threaded FIFO executor.
pub struct MainLoop {
    sender: Mutex<Option<mpsc::UnboundedSender<MainTask>>>,
    thread_id: ThreadId,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MainLoop {
    /// Spawn the loop thread.
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<MainTask>();

        let handle = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                while let Some(task) = rx.blocking_recv() {
                    // A panicking task must not take the UI thread down with it.
                    if std::panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        error!("main-thread task panicked");
                    }
                }
                debug!("main loop drained");
            })?;

        info!(thread = name, "main loop started");
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            thread_id: handle.thread().id(),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Stop accepting tasks and wait for queued ones to finish.
    ///
    /// Must not be called from the loop thread itself.
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        drop(sender);

        if self.is_main_thread() {
            return;
        }
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("main loop thread panicked during shutdown");
            }
            info!("main loop stopped");
        }
    }
}

impl MainThreadExecutor for MainLoop {
    fn post(&self, task: MainTask) -> Result<()> {
        let guard = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_ref() {
            Some(tx) => tx
                .send(task)
                .map_err(|_| PayBridgeError::MainThreadUnavailable),
            None => Err(PayBridgeError::MainThreadUnavailable),
        }
    }

    fn is_main_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }
}

impl Drop for MainLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run `f` on the main thread and wait for its result without blocking the
/// calling worker.
pub async fn run_on_main<T, F>(executor: &dyn MainThreadExecutor, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    executor.post(Box::new(move || {
        let _ = tx.send(f());
    }))?;
    rx.await.map_err(|_| PayBridgeError::MainThreadUnavailable)
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-at-a-time gate for wallet configuration and payment sessions.
//
// Built on a single-permit tokio semaphore, which hands the permit out in
// the order `acquire` was called. Configuration uses the scoped form; a
// payment session takes an owned permit that outlives the calling frame and
// is released by the session correlator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use paybridge_core::error::{PayBridgeError, Result};

/// FIFO mutual exclusion across wallet requests.
pub struct RequestSerializer {
    gate: Arc<Semaphore>,
    held: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// Proof of holding the serializer. Dropping it releases the gate.
#[must_use = "dropping the permit releases the serializer immediately"]
pub struct SerializerPermit {
    _permit: OwnedSemaphorePermit,
    held: Arc<AtomicUsize>,
}

impl Drop for SerializerPermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so the count
        // never shows two holders.
        self.held.fetch_sub(1, Ordering::SeqCst);
        debug!("serializer released");
    }
}

impl std::fmt::Debug for SerializerPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerPermit").finish_non_exhaustive()
    }
}

impl Default for RequestSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestSerializer {
    pub fn new() -> Self {
        Self {
            gate: Arc::new(Semaphore::new(1)),
            held: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for the gate. Fails only once the serializer has been closed.
    pub async fn acquire(&self) -> Result<SerializerPermit> {
        let permit = Arc::clone(&self.gate)
            .acquire_owned()
            .await
            .map_err(|_| PayBridgeError::Detached)?;
        let now = self.held.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        debug!("serializer acquired");
        Ok(SerializerPermit {
            _permit: permit,
            held: Arc::clone(&self.held),
        })
    }

    /// Give the gate back. Equivalent to dropping the permit.
    pub fn release(&self, permit: SerializerPermit) {
        drop(permit);
    }

    /// Run `op` while holding the gate; released on every exit path.
    pub async fn with_lock<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let _permit = self.acquire().await?;
        Ok(op())
    }

    /// Reject current and future waiters.
    pub fn close(&self) {
        self.gate.close();
    }

    /// Number of permits currently out (0 or 1).
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    /// Highest `held` ever observed.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

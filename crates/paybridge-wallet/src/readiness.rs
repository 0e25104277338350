// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Derived "wallet ready" signal and its de-duplicated broadcast.
//
// ready = initialised && configured && the current UI host can present.
// The notifier remembers only the last value it broadcast; the very first
// evaluation always broadcasts so a freshly attached listener learns the
// current state.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use paybridge_core::types::{BridgeEvent, WalletConfig};
use paybridge_native::traits::{EventSink, MainThreadExecutor, PresenterSource};

use crate::state::{StateSnapshot, StateStore};

pub struct ReadinessNotifier {
    presenters: Arc<dyn PresenterSource>,
    main: Arc<dyn MainThreadExecutor>,
    events: Arc<dyn EventSink>,
    last_broadcast: Mutex<Option<bool>>,
}

impl ReadinessNotifier {
    pub fn new(
        presenters: Arc<dyn PresenterSource>,
        main: Arc<dyn MainThreadExecutor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            presenters,
            main,
            events,
            last_broadcast: Mutex::new(None),
        }
    }

    /// Readiness for a given snapshot. Resolves the presenter afresh.
    pub fn compute(&self, snapshot: &StateSnapshot) -> bool {
        snapshot.initialized
            && snapshot
                .config
                .as_deref()
                .is_some_and(|config| self.platform_can_present(config))
    }

    fn platform_can_present(&self, config: &WalletConfig) -> bool {
        self.presenters
            .current()
            .is_some_and(|presenter| presenter.can_present(config))
    }

    /// Recompute from the store and broadcast if the value moved.
    ///
    /// Returns the value broadcast, if any. The store is read while the
    /// notifier lock is held, so concurrent mutations cannot leave an older
    /// verdict as the last one sent.
    pub fn on_state_changed(&self, store: &StateStore) -> Option<bool> {
        let mut last = self
            .last_broadcast
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let ready = self.compute(&store.snapshot());
        if *last == Some(ready) {
            debug!(ready, "readiness unchanged");
            return None;
        }
        *last = Some(ready);

        // Posting only enqueues; doing it under the lock keeps events in
        // transition order on the main thread.
        let events = Arc::clone(&self.events);
        let event = BridgeEvent::WalletReadyChanged { ready };
        let posted = self.main.post(Box::new(move || {
            if let Err(e) = events.emit(event) {
                warn!(error = %e, "walletReadyChanged not delivered");
            }
        }));
        match posted {
            Ok(()) => info!(ready, "wallet readiness changed"),
            Err(e) => warn!(ready, error = %e, "could not reach main thread for readiness event"),
        }
        Some(ready)
    }

    pub fn last_broadcast(&self) -> Option<bool> {
        *self
            .last_broadcast
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

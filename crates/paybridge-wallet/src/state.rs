// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SDK-initialised flag and published wallet config.
//
// Each field sits behind its own short-lived lock. Mutators drop their lock
// before handing control to the readiness notifier, which then re-reads the
// store itself so it always judges the latest state.

use std::sync::{Arc, Mutex};

use tracing::debug;

use paybridge_core::types::WalletConfig;

use crate::readiness::ReadinessNotifier;

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub initialized: bool,
    pub config: Option<Arc<WalletConfig>>,
}

/// Thread-safe holder of coordinator state.
pub struct StateStore {
    initialized: Mutex<bool>,
    config: Mutex<Option<Arc<WalletConfig>>>,
    notifier: ReadinessNotifier,
}

impl StateStore {
    pub fn new(notifier: ReadinessNotifier) -> Self {
        Self {
            initialized: Mutex::new(false),
            config: Mutex::new(None),
            notifier,
        }
    }

    pub fn initialized(&self) -> bool {
        *self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_initialized(&self, value: bool) {
        {
            let mut guard = self
                .initialized
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = value;
        }
        debug!(initialized = value, "sdk state updated");
        self.notifier.on_state_changed(self);
    }

    pub fn config(&self) -> Option<Arc<WalletConfig>> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Publish a config. The value is swapped in whole; callers validate first.
    pub fn set_config(&self, config: Option<Arc<WalletConfig>>) {
        let configured = config.is_some();
        {
            let mut guard = self
                .config
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = config;
        }
        debug!(configured, "wallet config updated");
        self.notifier.on_state_changed(self);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            initialized: self.initialized(),
            config: self.config(),
        }
    }

    /// Current derived readiness, without broadcasting anything.
    pub fn is_ready(&self) -> bool {
        self.notifier.compute(&self.snapshot())
    }

    /// Re-evaluate readiness after an outside change (device capability,
    /// UI host recreated) that did not go through a mutator.
    pub fn refresh(&self) {
        self.notifier.on_state_changed(self);
    }

    pub fn notifier(&self) -> &ReadinessNotifier {
        &self.notifier
    }
}

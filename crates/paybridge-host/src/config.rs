// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host configuration, read from the JSON file named by `PAYBRIDGE_CONFIG`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use paybridge_core::config::BridgeConfig;
use paybridge_core::error::Result;
use paybridge_native::simulator::SimulatorConfig;

pub const CONFIG_ENV: &str = "PAYBRIDGE_CONFIG";

/// Which native implementation sits under the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Scripted wallet that answers every session.
    #[default]
    Simulator,
    /// No wallet at all; the coordinator never becomes ready.
    Stub,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub backend: Backend,
    pub bridge: BridgeConfig,
    pub simulator: SimulatorConfig,
}

impl HostConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load from `PAYBRIDGE_CONFIG`, or fall back to defaults.
    pub fn load() -> Self {
        Self::load_or_default(std::env::var_os(CONFIG_ENV).as_deref().map(Path::new))
    }

    fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("{CONFIG_ENV} not set, using default configuration");
            return Self::default();
        };
        match Self::load_from(path) {
            Ok(config) => {
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load configuration, using defaults");
                Self::default()
            }
        }
    }
}

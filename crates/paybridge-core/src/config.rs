// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::types::{Platform, WalletEnvironment};

/// Settings fixed for the lifetime of one plugin attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Platform flavour; selects the wallet error-code spelling.
    pub platform: Platform,
    /// Environment used when `initialize` is called without `productionEnvironment`.
    pub default_production: bool,
    /// Thread name of the main execution context.
    pub main_loop_name: String,
}

impl BridgeConfig {
    pub fn environment_for(&self, production: Option<bool>) -> WalletEnvironment {
        WalletEnvironment::from_production(production.unwrap_or(self.default_production))
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Android,
            default_production: false,
            main_loop_name: "paybridge-main".into(),
        }
    }
}

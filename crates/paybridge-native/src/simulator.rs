// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted wallet for desktop hosts.
//
// Behaves like a device wallet from the coordinator's point of view: the
// sheet is "recreated" on every resolve, and the outcome arrives later on a
// different thread than the one that presented it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use paybridge_core::error::{PayBridgeError, Result};
use paybridge_core::types::{
    PaymentMethod, PaymentRequest, SessionOutcome, WalletConfig, WalletEnvironment,
};

use crate::traits::*;

/// Outcome the simulated sheet reports for every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptedOutcome {
    #[default]
    Completed,
    Canceled,
    Failed,
}

/// Simulator knobs, loaded alongside the bridge config by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatorConfig {
    pub outcome: ScriptedOutcome,
    /// How long the "user" takes to finish the sheet.
    pub delay_ms: u64,
    /// Whether the device supports a wallet at all.
    pub can_present: bool,
    /// Make the vendor SDK setup fail.
    pub fail_sdk: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            outcome: ScriptedOutcome::Completed,
            delay_ms: 250,
            can_present: true,
            fail_sdk: false,
        }
    }
}

/// Simulated vendor SDK plus wallet UI host.
pub struct SimulatedWallet {
    config: SimulatorConfig,
    sheets: AtomicU64,
    tokens: Arc<AtomicU64>,
}

impl SimulatedWallet {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            sheets: AtomicU64::new(0),
            tokens: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn services(config: SimulatorConfig) -> NativeServices {
        let wallet = Arc::new(Self::new(config));
        NativeServices {
            sdk: wallet.clone(),
            presenters: wallet,
        }
    }

    /// How many sheet hosts have been created so far.
    pub fn sheets_created(&self) -> u64 {
        self.sheets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentSdk for SimulatedWallet {
    async fn initialize(&self, environment: WalletEnvironment) -> Result<()> {
        debug!(?environment, "simulated SDK setup");
        if self.config.fail_sdk {
            return Err(PayBridgeError::Sdk("simulated setup failure".into()));
        }
        Ok(())
    }
}

impl PresenterSource for SimulatedWallet {
    fn current(&self) -> Option<Arc<dyn WalletPresenter>> {
        let generation = self.sheets.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Arc::new(SimulatedSheet {
            generation,
            config: self.config.clone(),
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

/// One incarnation of the wallet sheet host.
struct SimulatedSheet {
    generation: u64,
    config: SimulatorConfig,
    tokens: Arc<AtomicU64>,
}

impl WalletPresenter for SimulatedSheet {
    fn can_present(&self, _config: &WalletConfig) -> bool {
        self.config.can_present
    }

    fn present(
        &self,
        request: &PaymentRequest,
        config: &WalletConfig,
        completion: SessionCompletion,
    ) -> Result<()> {
        if !self.can_present(config) {
            return Err(PayBridgeError::WalletNotReady(
                "device cannot present a wallet sheet".into(),
            ));
        }

        info!(
            sheet = self.generation,
            session = %completion.session(),
            amount = %request.amount,
            currency = %request.currency_code,
            "simulated wallet sheet shown"
        );

        let outcome = match self.config.outcome {
            ScriptedOutcome::Completed => {
                let n = self.tokens.fetch_add(1, Ordering::SeqCst) + 1;
                SessionOutcome::Completed(PaymentMethod {
                    id: format!("pm_sim_{n:04}"),
                    card_brand: Some("visa".into()),
                    last4: Some("4242".into()),
                    billing_name: config.name_required.then(|| "Sim User".to_owned()),
                    email: config.email_required.then(|| "sim@example.com".to_owned()),
                })
            }
            ScriptedOutcome::Canceled => SessionOutcome::Canceled,
            ScriptedOutcome::Failed => SessionOutcome::Failed("simulated wallet error".into()),
        };

        let delay = Duration::from_millis(self.config.delay_ms);
        std::thread::Builder::new()
            .name(format!("sim-sheet-{}", self.generation))
            .spawn(move || {
                std::thread::sleep(delay);
                completion.resolve(outcome);
            })?;
        Ok(())
    }
}

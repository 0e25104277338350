// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub native services for desktop/CI builds where no wallet exists.
//
// The SDK refuses to initialise and no presenter is ever attached, so the
// coordinator reports `ready == false` and every wallet call fails cleanly.

use std::sync::Arc;

use async_trait::async_trait;

use paybridge_core::error::{PayBridgeError, Result};
use paybridge_core::types::{PaymentRequest, WalletConfig, WalletEnvironment};

use crate::traits::*;

/// No-op native side returned on non-mobile platforms.
pub struct StubPlatform;

impl StubPlatform {
    pub fn services() -> NativeServices {
        let stub = Arc::new(StubPlatform);
        NativeServices {
            sdk: stub.clone(),
            presenters: stub,
        }
    }
}

#[async_trait]
impl PaymentSdk for StubPlatform {
    async fn initialize(&self, _environment: WalletEnvironment) -> Result<()> {
        tracing::warn!("PaymentSdk::initialize called on stub platform");
        Err(PayBridgeError::PlatformUnavailable)
    }
}

impl PresenterSource for StubPlatform {
    fn current(&self) -> Option<Arc<dyn WalletPresenter>> {
        None
    }
}

impl WalletPresenter for StubPlatform {
    fn can_present(&self, _config: &WalletConfig) -> bool {
        false
    }

    fn present(
        &self,
        _request: &PaymentRequest,
        _config: &WalletConfig,
        _completion: SessionCompletion,
    ) -> Result<()> {
        tracing::warn!("WalletPresenter::present called on stub platform");
        Err(PayBridgeError::PlatformUnavailable)
    }
}

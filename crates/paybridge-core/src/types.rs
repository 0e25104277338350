// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the wallet coordinator.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PayBridgeError, Result};

/// Which native platform the plugin is running on.
///
/// Only affects how error codes are spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Android,
    Ios,
}

/// Vendor environment the SDK and wallet run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletEnvironment {
    #[default]
    Test,
    Production,
}

impl WalletEnvironment {
    pub fn from_production(production: bool) -> Self {
        if production {
            Self::Production
        } else {
            Self::Test
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Digital-wallet configuration.
///
/// Replaced wholesale on every (re)configuration and never mutated in place.
/// Build a candidate, run [`WalletConfig::validated`] and publish the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    pub environment: WalletEnvironment,
    /// Merchant / company name shown on the wallet sheet.
    pub merchant_name: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
    pub billing_address_required: bool,
    pub shipping_address_required: bool,
    pub email_required: bool,
    pub phone_required: bool,
    pub name_required: bool,
}

impl WalletConfig {
    /// Minimal config with every optional requirement switched off.
    pub fn new(
        environment: WalletEnvironment,
        merchant_name: impl Into<String>,
        country_code: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            merchant_name: merchant_name.into(),
            country_code: country_code.into(),
            currency_code: currency_code.into(),
            billing_address_required: false,
            shipping_address_required: false,
            email_required: false,
            phone_required: false,
            name_required: false,
        }
    }

    /// Validate a candidate and return the normalised config ready to publish.
    ///
    /// Country and currency codes are upper-cased; the merchant name is trimmed.
    pub fn validated(mut self) -> Result<Self> {
        self.merchant_name = self.merchant_name.trim().to_owned();
        if self.merchant_name.is_empty() {
            return Err(PayBridgeError::InvalidWalletSetup(
                "merchant name must not be empty".into(),
            ));
        }

        self.country_code = self.country_code.trim().to_ascii_uppercase();
        if !is_alpha_code(&self.country_code, 2) {
            return Err(PayBridgeError::InvalidWalletSetup(format!(
                "country code must be two letters, got {:?}",
                self.country_code
            )));
        }

        self.currency_code = self.currency_code.trim().to_ascii_uppercase();
        if !is_alpha_code(&self.currency_code, 3) {
            return Err(PayBridgeError::InvalidWalletSetup(format!(
                "currency code must be three letters, got {:?}",
                self.currency_code
            )));
        }

        Ok(self)
    }
}

fn is_alpha_code(code: &str, len: usize) -> bool {
    code.len() == len && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// One summary line on the wallet sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    pub amount: Decimal,
}

/// A request to present the wallet sheet and obtain a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency_code: String,
    #[serde(default)]
    pub itemization: Vec<LineItem>,
}

impl PaymentRequest {
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
            itemization: Vec::new(),
        }
    }

    pub fn with_item(mut self, label: impl Into<String>, amount: Decimal) -> Self {
        self.itemization.push(LineItem {
            label: label.into(),
            amount,
        });
        self
    }

    /// Synchronous checks run before any wallet UI is shown.
    pub fn validated(mut self) -> Result<Self> {
        if self.amount <= Decimal::ZERO {
            return Err(PayBridgeError::InvalidPaymentRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }

        self.currency_code = self.currency_code.trim().to_ascii_uppercase();
        if !is_alpha_code(&self.currency_code, 3) {
            return Err(PayBridgeError::InvalidPaymentRequest(format!(
                "currency code must be three letters, got {:?}",
                self.currency_code
            )));
        }

        for item in &self.itemization {
            if item.label.trim().is_empty() {
                return Err(PayBridgeError::InvalidPaymentRequest(
                    "line item label must not be empty".into(),
                ));
            }
            if item.amount < Decimal::ZERO {
                return Err(PayBridgeError::InvalidPaymentRequest(format!(
                    "line item {:?} has a negative amount",
                    item.label
                )));
            }
        }

        Ok(self)
    }
}

/// Tokenised payment method returned by the wallet sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Terminal result of one wallet session, as reported by the OS sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed(PaymentMethod),
    Canceled,
    Failed(String),
}

impl SessionOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Canceled => "canceled",
            Self::Failed(_) => "failed",
        }
    }
}

/// Unique identifier for a wallet session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bookkeeping for the session currently owned by the correlator.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub amount: Decimal,
    pub currency_code: String,
    pub item_count: usize,
    pub started_at: DateTime<Utc>,
}

impl SessionInfo {
    pub fn for_request(request: &PaymentRequest) -> Self {
        Self {
            id: SessionId::new(),
            amount: request.amount,
            currency_code: request.currency_code.clone(),
            item_count: request.itemization.len(),
            started_at: Utc::now(),
        }
    }
}

/// Events pushed from the plugin to the hybrid layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    WalletReadyChanged { ready: bool },
}

impl BridgeEvent {
    /// Channel name the hybrid layer subscribes to.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WalletReadyChanged { .. } => "walletReadyChanged",
        }
    }
}

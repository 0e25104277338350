// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for PayBridge, plus the structured `{code, message}`
// reply the hybrid layer receives.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Platform;

/// Top-level error type for all PayBridge operations.
#[derive(Debug, Error)]
pub enum PayBridgeError {
    // -- Preconditions --
    #[error("the payment SDK has not been initialized; call initialize() first")]
    SdkUninitialized,

    #[error("the digital wallet has not been configured; call initializeWallet() first")]
    WalletUninitialized,

    #[error("the digital wallet is not ready: {0}")]
    WalletNotReady(String),

    // -- Validation --
    #[error("invalid wallet setup: {0}")]
    InvalidWalletSetup(String),

    #[error("invalid payment request: {0}")]
    InvalidPaymentRequest(String),

    #[error("invalid arguments for {method}: {detail}")]
    InvalidArguments { method: String, detail: String },

    // -- Native side --
    #[error("payment SDK error: {0}")]
    Sdk(String),

    #[error("wallet sheet could not be presented: {0}")]
    Presentation(String),

    #[error("main thread is not running")]
    MainThreadUnavailable,

    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Lifecycle --
    #[error("the wallet plugin has been detached")]
    Detached,

    #[error("method not implemented: {0}")]
    NotImplemented(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PayBridgeError>;

/// Stable error codes reported to the hybrid layer.
///
/// The wallet-specific codes are spelled differently per platform, see
/// [`ErrorCode::wire_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SdkUninitialized,
    WalletUninitialized,
    WalletNotReady,
    InvalidGooglePaySetup,
    GeneralError,
    NotImplemented,
}

impl ErrorCode {
    /// Code string as the platform's plugin has always reported it.
    pub fn wire_name(self, platform: Platform) -> &'static str {
        match (self, platform) {
            (Self::SdkUninitialized, _) => "SdkUninitialized",
            (Self::WalletUninitialized, Platform::Android) => "GooglePayUninitialized",
            (Self::WalletUninitialized, Platform::Ios) => "DigitalWalletUninitialized",
            (Self::WalletNotReady, Platform::Android) => "GooglePayNotReady",
            (Self::WalletNotReady, Platform::Ios) => "DigitalWalletNotReady",
            (Self::InvalidGooglePaySetup, _) => "InvalidGooglePaySetup",
            (Self::GeneralError, _) => "GeneralError",
            (Self::NotImplemented, _) => "NotImplemented",
        }
    }
}

impl PayBridgeError {
    /// Map this error onto the code the hybrid layer switches on.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SdkUninitialized => ErrorCode::SdkUninitialized,
            Self::WalletUninitialized => ErrorCode::WalletUninitialized,
            Self::WalletNotReady(_) | Self::PlatformUnavailable => ErrorCode::WalletNotReady,
            Self::InvalidWalletSetup(_) => ErrorCode::InvalidGooglePaySetup,
            Self::NotImplemented(_) => ErrorCode::NotImplemented,
            Self::InvalidPaymentRequest(_)
            | Self::InvalidArguments { .. }
            | Self::Sdk(_)
            | Self::Presentation(_)
            | Self::MainThreadUnavailable
            | Self::Detached
            | Self::Io(_)
            | Self::Serialization(_) => ErrorCode::GeneralError,
        }
    }
}

/// Structured error delivered back to the caller in place of a success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

impl ErrorReply {
    pub fn from_error(err: &PayBridgeError, platform: Platform) -> Self {
        Self {
            code: err.code().wire_name(platform).to_owned(),
            message: err.to_string(),
        }
    }
}

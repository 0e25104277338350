// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PayBridge Wallet: readiness tracking, request serialisation and payment
// session correlation shared by the Android and iOS plugins. Native wallet
// access goes through the capability traits in `paybridge-native`.

pub mod coordinator;
pub mod plugin;
pub mod readiness;
pub mod serializer;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::WalletCoordinator;
pub use plugin::WalletPlugin;
pub use readiness::ReadinessNotifier;
pub use serializer::{RequestSerializer, SerializerPermit};
pub use session::{SessionCorrelator, SessionPhase};
pub use state::{StateSnapshot, StateStore};

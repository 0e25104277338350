// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// The coordinator never talks to Google Pay or Apple Pay directly. Each
// platform plugs an implementation of these traits underneath it, so the
// readiness and session logic exists exactly once.

use std::sync::Arc;

use async_trait::async_trait;

use paybridge_core::error::Result;
use paybridge_core::types::{
    BridgeEvent, PaymentMethod, PaymentRequest, SessionId, SessionOutcome, WalletConfig,
    WalletEnvironment,
};

/// Unit of work posted to the main execution context.
pub type MainTask = Box<dyn FnOnce() + Send + 'static>;

/// The platform's single designated UI thread.
///
/// Hybrid event channels and OS wallet sheets are main-thread-affine; the
/// coordinator posts every such interaction through this trait.
pub trait MainThreadExecutor: Send + Sync {
    /// Queue `task` to run on the main thread. Never runs it inline.
    fn post(&self, task: MainTask) -> Result<()>;

    /// Whether the calling thread is the main thread.
    fn is_main_thread(&self) -> bool;
}

/// Outbound channel to the hybrid layer.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Only ever called on the main thread.
    ///
    /// An error here is indistinguishable from "nobody is listening yet" and
    /// is logged, not propagated.
    fn emit(&self, event: BridgeEvent) -> Result<()>;
}

/// Vendor payment SDK lifecycle.
#[async_trait]
pub trait PaymentSdk: Send + Sync {
    /// Run the vendor's setup for the given environment.
    async fn initialize(&self, environment: WalletEnvironment) -> Result<()>;
}

/// The OS wallet sheet (Google Pay / Apple Pay).
pub trait WalletPresenter: Send + Sync {
    /// Whether this device can show a wallet sheet for `config`.
    fn can_present(&self, config: &WalletConfig) -> bool;

    /// Hand the sheet to the OS. Called on the main thread.
    ///
    /// `Ok(())` means the sheet is on its way; the outcome arrives later
    /// through `completion`, from whatever thread the OS chooses. `Err`
    /// means nothing was shown and `completion` will not be used.
    fn present(
        &self,
        request: &PaymentRequest,
        config: &WalletConfig,
        completion: SessionCompletion,
    ) -> Result<()>;
}

/// Resolves the presenter backing the current UI host.
///
/// Hosting fragments / view controllers can be recreated between sessions,
/// so callers must resolve afresh every time instead of caching the result.
pub trait PresenterSource: Send + Sync {
    /// `None` when no UI host is attached.
    fn current(&self) -> Option<Arc<dyn WalletPresenter>>;
}

/// Receiver side of a session's terminal callback.
pub trait CompletionSink: Send + Sync {
    fn resolve(&self, session: SessionId, outcome: SessionOutcome);
}

/// Callback handle handed to a [`WalletPresenter`] for one session.
///
/// Cheap to clone. Calling it more than once, or calling a handle from an
/// earlier session, is harmless: the coordinator only honours the first
/// terminal outcome for the live session.
#[derive(Clone)]
pub struct SessionCompletion {
    session: SessionId,
    sink: Arc<dyn CompletionSink>,
}

impl SessionCompletion {
    pub fn new(session: SessionId, sink: Arc<dyn CompletionSink>) -> Self {
        Self { session, sink }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn resolve(&self, outcome: SessionOutcome) {
        self.sink.resolve(self.session, outcome);
    }

    pub fn completed(&self, method: PaymentMethod) {
        self.resolve(SessionOutcome::Completed(method));
    }

    pub fn canceled(&self) {
        self.resolve(SessionOutcome::Canceled);
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.resolve(SessionOutcome::Failed(message.into()));
    }
}

impl std::fmt::Debug for SessionCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCompletion")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// The native collaborators one platform provides.
#[derive(Clone)]
pub struct NativeServices {
    pub sdk: Arc<dyn PaymentSdk>,
    pub presenters: Arc<dyn PresenterSource>,
}

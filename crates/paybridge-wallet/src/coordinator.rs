// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wallet coordinator: the one implementation behind both platform plugins.
//
// Configuration:  serializer (scoped) → validate candidate → state store → notifier
// Payment:        serializer (owned permit) → presenter on main thread
//                 → correlator waits for the sheet → caller resolved → permit released
//
// Precondition failures (SDK or wallet not set up) are reported before the
// serializer is touched. Everything that does take the serializer gives it
// back on every path, including presentation failures.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Span, info, instrument, warn};

use paybridge_core::config::BridgeConfig;
use paybridge_core::error::{PayBridgeError, Result};
use paybridge_core::types::{PaymentRequest, SessionInfo, SessionOutcome, WalletConfig};
use paybridge_native::main_loop::run_on_main;
use paybridge_native::traits::{
    EventSink, MainThreadExecutor, NativeServices, PaymentSdk, PresenterSource, WalletPresenter,
};

use crate::readiness::ReadinessNotifier;
use crate::serializer::RequestSerializer;
use crate::session::SessionCorrelator;
use crate::state::StateStore;

/// Reason given to a pending caller when the plugin is torn down.
pub const DETACHED_MESSAGE: &str = "plugin detached";

/// Owned by the plugin for one attach/detach cycle.
pub struct WalletCoordinator {
    config: BridgeConfig,
    sdk: Arc<dyn PaymentSdk>,
    presenters: Arc<dyn PresenterSource>,
    main: Arc<dyn MainThreadExecutor>,
    store: StateStore,
    serializer: RequestSerializer,
    sessions: Arc<SessionCorrelator>,
    /// Serialises (re)initialisation of the vendor SDK.
    init_lock: tokio::sync::Mutex<()>,
    detached: AtomicBool,
}

/// Everything a validated payment request needs to reach the presenter.
struct PreparedSession {
    request: PaymentRequest,
    config: Arc<WalletConfig>,
    presenter: Arc<dyn WalletPresenter>,
}

impl WalletCoordinator {
    pub fn new(
        config: BridgeConfig,
        native: NativeServices,
        main: Arc<dyn MainThreadExecutor>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let notifier =
            ReadinessNotifier::new(Arc::clone(&native.presenters), Arc::clone(&main), events);
        let coordinator = Self {
            config,
            sdk: native.sdk,
            presenters: native.presenters,
            main,
            store: StateStore::new(notifier),
            serializer: RequestSerializer::new(),
            sessions: Arc::new(SessionCorrelator::new()),
            init_lock: tokio::sync::Mutex::new(()),
            detached: AtomicBool::new(false),
        };
        // First evaluation: tells an already-listening hybrid layer "not ready".
        coordinator.store.set_initialized(false);
        coordinator
    }

    pub fn bridge_config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn serializer(&self) -> &RequestSerializer {
        &self.serializer
    }

    pub fn sessions(&self) -> &SessionCorrelator {
        &self.sessions
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.detached.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Detached);
        }
        Ok(())
    }

    // -- SDK lifecycle -------------------------------------------------------

    /// Run the vendor SDK setup. `production` falls back to the bridge default.
    ///
    /// The initialised flag drops to `false` for the duration of the attempt
    /// and only returns to `true` if setup succeeds.
    #[instrument(skip(self))]
    pub async fn initialize(&self, production: Option<bool>) -> Result<()> {
        self.ensure_attached()?;
        let _init = self.init_lock.lock().await;

        self.store.set_initialized(false);
        let environment = self.config.environment_for(production);
        match self.sdk.initialize(environment).await {
            Ok(()) => {
                self.store.set_initialized(true);
                info!(production = environment.is_production(), "payment SDK initialised");
                Ok(())
            }
            Err(e) => {
                warn!(?environment, error = %e, "payment SDK initialisation failed");
                Err(match e {
                    sdk @ PayBridgeError::Sdk(_) => sdk,
                    other => PayBridgeError::Sdk(other.to_string()),
                })
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.store.initialized()
    }

    // -- Wallet configuration ------------------------------------------------

    /// First-time (or repeated) wallet setup.
    #[instrument(skip_all, fields(merchant = %candidate.merchant_name, country = %candidate.country_code))]
    pub async fn initialize_wallet(&self, candidate: WalletConfig) -> Result<()> {
        self.configure(candidate, false).await
    }

    /// Replace an existing wallet config.
    #[instrument(skip_all, fields(merchant = %candidate.merchant_name, country = %candidate.country_code))]
    pub async fn update_wallet_configuration(&self, candidate: WalletConfig) -> Result<()> {
        self.configure(candidate, true).await
    }

    async fn configure(&self, candidate: WalletConfig, require_existing: bool) -> Result<()> {
        self.ensure_attached()?;
        if !self.store.initialized() {
            return Err(PayBridgeError::SdkUninitialized);
        }
        if require_existing && self.store.config().is_none() {
            return Err(PayBridgeError::WalletUninitialized);
        }

        self.serializer
            .with_lock(|| {
                // Re-check: a re-initialisation may have started while we queued.
                if !self.store.initialized() {
                    return Err(PayBridgeError::SdkUninitialized);
                }
                let config = candidate.validated()?;
                info!(
                    environment = ?config.environment,
                    currency = %config.currency_code,
                    "wallet configuration published"
                );
                self.store.set_config(Some(Arc::new(config)));
                Ok(())
            })
            .await?
    }

    /// Current derived readiness.
    pub fn is_wallet_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Re-evaluate readiness after the host reports a capability change.
    pub fn refresh_readiness(&self) {
        self.store.refresh();
    }

    // -- Payment sessions ----------------------------------------------------

    /// Present the wallet sheet and wait for the user.
    ///
    /// Cancellation and sheet-reported failures are normal outcomes, not
    /// errors. Errors mean the session never reached the user.
    #[instrument(skip_all, fields(amount = %request.amount, currency = %request.currency_code, session = tracing::field::Empty))]
    pub async fn create_wallet_payment_method(
        &self,
        request: PaymentRequest,
    ) -> Result<SessionOutcome> {
        self.ensure_attached()?;
        if !self.store.initialized() {
            return Err(PayBridgeError::SdkUninitialized);
        }
        if self.store.config().is_none() {
            return Err(PayBridgeError::WalletUninitialized);
        }

        let permit = self.serializer.acquire().await?;
        let prepared = match self.prepare_session(request) {
            Ok(prepared) => prepared,
            Err(e) => {
                self.serializer.release(permit);
                return Err(e);
            }
        };

        let info = SessionInfo::for_request(&prepared.request);
        let session = info.id;
        Span::current().record("session", tracing::field::display(session));

        let outcome = self.sessions.begin(info, permit)?;
        let completion = self.sessions.completion_for(session);

        let PreparedSession {
            request,
            config,
            presenter,
        } = prepared;
        let sessions = Arc::clone(&self.sessions);
        let presented = run_on_main(self.main.as_ref(), move || {
            // Detach may have ended the session while this task was queued.
            if sessions.live_session() != Some(session) {
                return Err(PayBridgeError::Detached);
            }
            presenter.present(&request, &config, completion)
        })
        .await
        .and_then(|result| result);

        match presented {
            Ok(()) => {
                self.sessions.presented(session);
            }
            Err(e) => {
                self.sessions.abort(session);
                return Err(presentation_error(e));
            }
        }

        outcome.await.map_err(|_| {
            PayBridgeError::Presentation("wallet session ended without an outcome".into())
        })
    }

    /// Checks made while holding the serializer, before any UI is shown.
    fn prepare_session(&self, request: PaymentRequest) -> Result<PreparedSession> {
        self.ensure_attached()?;
        if !self.store.initialized() {
            return Err(PayBridgeError::SdkUninitialized);
        }
        let config = self
            .store
            .config()
            .ok_or(PayBridgeError::WalletUninitialized)?;
        let request = request.validated()?;

        // Resolved per session: the UI host may have been recreated.
        let presenter = self.presenters.current().ok_or_else(|| {
            PayBridgeError::WalletNotReady("no wallet UI host is attached".into())
        })?;
        if !presenter.can_present(&config) {
            return Err(PayBridgeError::WalletNotReady(
                "this device cannot present a wallet sheet".into(),
            ));
        }

        Ok(PreparedSession {
            request,
            config,
            presenter,
        })
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Tear down: refuse new work, wake queued callers and fail the live session.
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        self.serializer.close();
        if self.sessions.close(DETACHED_MESSAGE) {
            info!("live wallet session failed on detach");
        }
        info!("wallet coordinator detached");
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

fn presentation_error(err: PayBridgeError) -> PayBridgeError {
    match err {
        e @ (PayBridgeError::WalletNotReady(_)
        | PayBridgeError::PlatformUnavailable
        | PayBridgeError::Presentation(_)
        | PayBridgeError::MainThreadUnavailable
        | PayBridgeError::Detached) => e,
        other => PayBridgeError::Presentation(other.to_string()),
    }
}

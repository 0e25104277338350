// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable native fakes and a ready-made coordinator for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use paybridge_core::config::BridgeConfig;
use paybridge_core::error::{PayBridgeError, Result};
use paybridge_core::types::{
    BridgeEvent, PaymentRequest, SessionOutcome, WalletConfig, WalletEnvironment,
};
use paybridge_native::main_loop::{MainLoop, run_on_main};
use paybridge_native::traits::{
    EventSink, NativeServices, PaymentSdk, PresenterSource, SessionCompletion, WalletPresenter,
};

use crate::coordinator::WalletCoordinator;

pub(crate) const TEST_MAIN: &str = "paybridge-test-main";

fn current_thread_name() -> Option<String> {
    std::thread::current().name().map(str::to_owned)
}

// -- Events ----------------------------------------------------------------

/// Records every event together with the thread it arrived on.
#[derive(Default)]
pub(crate) struct RecordingSink {
    received: Mutex<Vec<(BridgeEvent, Option<String>)>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn ready_values(&self) -> Vec<bool> {
        self.received
            .lock()
            .expect("events")
            .iter()
            .map(|(event, _)| match event {
                BridgeEvent::WalletReadyChanged { ready } => *ready,
            })
            .collect()
    }

    pub fn all_on_main(&self) -> bool {
        self.received
            .lock()
            .expect("events")
            .iter()
            .all(|(_, thread)| thread.as_deref() == Some(TEST_MAIN))
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BridgeEvent) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Presentation("no listener attached".into()));
        }
        self.received
            .lock()
            .expect("events")
            .push((event, current_thread_name()));
        Ok(())
    }
}

// -- Wallet ----------------------------------------------------------------

/// One call to `present` as seen by the fake sheet.
pub(crate) struct Presented {
    pub generation: usize,
    pub request: PaymentRequest,
    pub completion: Option<SessionCompletion>,
    pub thread: Option<String>,
    /// Callers that had their answer when this sheet was shown.
    pub callers_resolved: usize,
}

#[derive(Default)]
struct FakeState {
    cannot_present: AtomicBool,
    detached_host: AtomicBool,
    sdk_fails: AtomicBool,
    reject_present: AtomicBool,
    drop_completion: AtomicBool,
    auto_outcome: Mutex<Option<SessionOutcome>>,
    current_delay: Mutex<Duration>,
    present_delay: Mutex<Duration>,
    callers_resolved: AtomicUsize,
    generations: AtomicUsize,
    environments: Mutex<Vec<WalletEnvironment>>,
    presented: Mutex<Vec<Presented>>,
}

/// SDK plus presenter source whose behaviour each test dials in.
#[derive(Default)]
pub(crate) struct FakeWallet {
    state: Arc<FakeState>,
}

impl FakeWallet {
    pub fn set_can_present(&self, can: bool) {
        self.state.cannot_present.store(!can, Ordering::SeqCst);
    }

    /// Simulate the UI host going away (`false`) or coming back.
    pub fn set_attached(&self, attached: bool) {
        self.state.detached_host.store(!attached, Ordering::SeqCst);
    }

    pub fn set_sdk_fails(&self, fails: bool) {
        self.state.sdk_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_reject_present(&self, reject: bool) {
        self.state.reject_present.store(reject, Ordering::SeqCst);
    }

    /// Accept the sheet but throw the callback away.
    pub fn set_drop_completion(&self, drop_it: bool) {
        self.state.drop_completion.store(drop_it, Ordering::SeqCst);
    }

    /// Answer synchronously from inside `present`.
    pub fn set_auto_outcome(&self, outcome: Option<SessionOutcome>) {
        *self.state.auto_outcome.lock().expect("auto") = outcome;
    }

    /// Make resolving the sheet host slow, as when a UI fragment is recreated.
    pub fn set_current_delay(&self, delay: Duration) {
        *self.state.current_delay.lock().expect("delay") = delay;
    }

    /// Pause inside `present` before the sheet is recorded.
    pub fn set_present_delay(&self, delay: Duration) {
        *self.state.present_delay.lock().expect("delay") = delay;
    }

    /// Called by test callers once their request has returned.
    pub fn note_caller_resolved(&self) {
        self.state.callers_resolved.fetch_add(1, Ordering::SeqCst);
    }

    pub fn callers_resolved_when_presented(&self) -> Vec<usize> {
        self.state
            .presented
            .lock()
            .expect("presented")
            .iter()
            .map(|p| p.callers_resolved)
            .collect()
    }

    pub fn sdk_environments(&self) -> Vec<WalletEnvironment> {
        self.state.environments.lock().expect("envs").clone()
    }

    pub fn presented_count(&self) -> usize {
        self.state.presented.lock().expect("presented").len()
    }

    pub fn presented_generations(&self) -> Vec<usize> {
        self.state
            .presented
            .lock()
            .expect("presented")
            .iter()
            .map(|p| p.generation)
            .collect()
    }

    pub fn presented_on_main(&self, index: usize) -> bool {
        self.state.presented.lock().expect("presented")[index]
            .thread
            .as_deref()
            == Some(TEST_MAIN)
    }

    pub fn presented_request(&self, index: usize) -> PaymentRequest {
        self.state.presented.lock().expect("presented")[index]
            .request
            .clone()
    }

    /// Callback for the `index`-th sheet, in presentation order.
    pub fn completion(&self, index: usize) -> SessionCompletion {
        self.state.presented.lock().expect("presented")[index]
            .completion
            .clone()
            .expect("completion was kept")
    }

    pub async fn wait_for_presentations(&self, count: usize) {
        for _ in 0..1000 {
            if self.presented_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {count} presentations, saw {}", self.presented_count());
    }
}

#[async_trait]
impl PaymentSdk for FakeWallet {
    async fn initialize(&self, environment: WalletEnvironment) -> Result<()> {
        self.state
            .environments
            .lock()
            .expect("envs")
            .push(environment);
        if self.state.sdk_fails.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Sdk("vendor setup rejected".into()));
        }
        Ok(())
    }
}

impl PresenterSource for FakeWallet {
    fn current(&self) -> Option<Arc<dyn WalletPresenter>> {
        if self.state.detached_host.load(Ordering::SeqCst) {
            return None;
        }
        let delay = *self.state.current_delay.lock().expect("delay");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let generation = self.state.generations.fetch_add(1, Ordering::SeqCst);
        Some(Arc::new(FakeSheet {
            generation,
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeSheet {
    generation: usize,
    state: Arc<FakeState>,
}

impl WalletPresenter for FakeSheet {
    fn can_present(&self, _config: &WalletConfig) -> bool {
        !self.state.cannot_present.load(Ordering::SeqCst)
    }

    fn present(
        &self,
        request: &PaymentRequest,
        _config: &WalletConfig,
        completion: SessionCompletion,
    ) -> Result<()> {
        if self.state.reject_present.load(Ordering::SeqCst) {
            return Err(PayBridgeError::Presentation("host activity is finishing".into()));
        }

        let delay = *self.state.present_delay.lock().expect("delay");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        let auto = self.state.auto_outcome.lock().expect("auto").clone();
        if let Some(outcome) = auto {
            completion.resolve(outcome);
        }
        let kept = (!self.state.drop_completion.load(Ordering::SeqCst)).then_some(completion);

        self.state.presented.lock().expect("presented").push(Presented {
            generation: self.generation,
            request: request.clone(),
            completion: kept,
            thread: current_thread_name(),
            callers_resolved: self.state.callers_resolved.load(Ordering::SeqCst),
        });
        Ok(())
    }
}

// -- Harness ---------------------------------------------------------------

pub(crate) struct Harness {
    pub coordinator: Arc<WalletCoordinator>,
    pub wallet: Arc<FakeWallet>,
    pub events: Arc<RecordingSink>,
    pub main: Arc<MainLoop>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let main = Arc::new(MainLoop::spawn(TEST_MAIN).expect("main loop"));
        let wallet = Arc::new(FakeWallet::default());
        let events = Arc::new(RecordingSink::default());
        let services = NativeServices {
            sdk: wallet.clone(),
            presenters: wallet.clone(),
        };
        let coordinator = Arc::new(WalletCoordinator::new(
            config,
            services,
            main.clone(),
            events.clone(),
        ));
        Self {
            coordinator,
            wallet,
            events,
            main,
        }
    }

    pub fn acme(&self) -> WalletConfig {
        WalletConfig::new(WalletEnvironment::Test, "Acme", "US", "USD")
    }

    /// Wait until everything posted to the main loop so far has run.
    pub async fn flush(&self) {
        run_on_main(self.main.as_ref(), || ())
            .await
            .expect("main loop running");
    }

    /// SDK initialised and wallet configured.
    pub async fn make_ready(&self) {
        self.coordinator.initialize(None).await.expect("initialize");
        self.coordinator
            .initialize_wallet(self.acme())
            .await
            .expect("initialize wallet");
    }
}

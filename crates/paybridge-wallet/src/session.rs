// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wallet session correlator.
//
// Idle → AwaitingPresentation → AwaitingCompletion → Idle
//
// The live session owns both the caller's reply channel and the serializer
// permit. Leaving a live state resolves the caller first and only then drops
// the permit, so the next queued request cannot start before the previous
// caller has its answer. Terminal callbacks for anything other than the live
// session (duplicates, stale sheets) are ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use paybridge_core::error::{PayBridgeError, Result};
use paybridge_core::types::{SessionId, SessionInfo, SessionOutcome};
use paybridge_native::traits::{CompletionSink, SessionCompletion};

use crate::serializer::SerializerPermit;

/// Outcome reported when a sheet host goes away without calling back.
pub const ABANDONED_MESSAGE: &str = "wallet sheet closed without a result";

/// Observable correlator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingPresentation,
    AwaitingCompletion,
}

struct LiveSession {
    info: SessionInfo,
    responder: oneshot::Sender<SessionOutcome>,
    permit: SerializerPermit,
}

enum SessionState {
    Idle,
    AwaitingPresentation(LiveSession),
    AwaitingCompletion(LiveSession),
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::AwaitingPresentation(_) => SessionPhase::AwaitingPresentation,
            Self::AwaitingCompletion(_) => SessionPhase::AwaitingCompletion,
        }
    }

    fn live_id(&self) -> Option<SessionId> {
        match self {
            Self::Idle => None,
            Self::AwaitingPresentation(live) | Self::AwaitingCompletion(live) => {
                Some(live.info.id)
            }
        }
    }
}

/// Matches the OS sheet's terminal callback back to the waiting caller.
pub struct SessionCorrelator {
    state: Mutex<SessionState>,
    /// Only written while `state` is locked, so `begin` and `close` cannot interleave.
    closed: AtomicBool,
}

impl Default for SessionCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCorrelator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    pub fn live_session(&self) -> Option<SessionId> {
        self.lock().live_id()
    }

    /// `Idle → AwaitingPresentation`. Takes ownership of the permit.
    ///
    /// Returns the receiver the caller awaits for the terminal outcome.
    pub fn begin(
        &self,
        info: SessionInfo,
        permit: SerializerPermit,
    ) -> Result<oneshot::Receiver<SessionOutcome>> {
        let mut state = self.lock();
        if self.closed.load(Ordering::SeqCst) {
            debug!(session = %info.id, "session refused after close");
            return Err(PayBridgeError::Detached);
        }
        if let Some(existing) = state.live_id() {
            debug_assert!(
                false,
                "session {existing} still live while another caller held the serializer"
            );
            return Err(PayBridgeError::Presentation(format!(
                "session {existing} is still live"
            )));
        }

        let (responder, receiver) = oneshot::channel();
        info!(
            session = %info.id,
            amount = %info.amount,
            currency = %info.currency_code,
            items = info.item_count,
            "wallet session started"
        );
        *state = SessionState::AwaitingPresentation(LiveSession {
            info,
            responder,
            permit,
        });
        Ok(receiver)
    }

    /// `AwaitingPresentation → AwaitingCompletion` once the sheet is with the OS.
    ///
    /// Returns `false` if the session already finished (the sheet answered
    /// before `present` returned) or is not the live one.
    pub fn presented(&self, session: SessionId) -> bool {
        let mut state = self.lock();
        if state.phase() != SessionPhase::AwaitingPresentation || state.live_id() != Some(session)
        {
            debug!(%session, "presentation ack for a session that is no longer pending");
            return false;
        }
        match std::mem::replace(&mut *state, SessionState::Idle) {
            SessionState::AwaitingPresentation(live) => {
                *state = SessionState::AwaitingCompletion(live);
                debug!(%session, "wallet sheet handed to the OS");
                true
            }
            other => {
                *state = other;
                false
            }
        }
    }

    /// `AwaitingPresentation → Idle` when the sheet could not be shown.
    ///
    /// The caller reports the presentation error itself; the reply channel is
    /// dropped unused and the permit is released.
    pub fn abort(&self, session: SessionId) -> bool {
        let live = {
            let mut state = self.lock();
            if state.phase() != SessionPhase::AwaitingPresentation
                || state.live_id() != Some(session)
            {
                return false;
            }
            match std::mem::replace(&mut *state, SessionState::Idle) {
                SessionState::AwaitingPresentation(live) => live,
                other => {
                    *state = other;
                    return false;
                }
            }
        };
        warn!(%session, "wallet sheet could not be presented");
        drop(live.responder);
        drop(live.permit);
        true
    }

    /// Any live state `→ Idle` with a terminal outcome.
    ///
    /// Returns `false` (and does nothing) for stale or repeated callbacks.
    pub fn resolve(&self, session: SessionId, outcome: SessionOutcome) -> bool {
        let live = {
            let mut state = self.lock();
            if state.live_id() != Some(session) {
                return false;
            }
            match std::mem::replace(&mut *state, SessionState::Idle) {
                SessionState::AwaitingPresentation(live) | SessionState::AwaitingCompletion(live) => {
                    live
                }
                SessionState::Idle => return false,
            }
        };

        Self::finish(session, live, outcome);
        true
    }

    /// Reply to the caller, then give the serializer back.
    fn finish(session: SessionId, live: LiveSession, outcome: SessionOutcome) {
        let LiveSession {
            info,
            responder,
            permit,
        } = live;
        let label = outcome.label();
        if responder.send(outcome).is_err() {
            debug!(%session, "caller stopped waiting before the outcome arrived");
        }
        drop(permit);
        info!(
            session = %session,
            outcome = label,
            elapsed_ms = (chrono::Utc::now() - info.started_at).num_milliseconds(),
            "wallet session finished"
        );
    }

    /// Refuse every later `begin` and fail whatever session is live.
    ///
    /// Returns `true` if a live session was failed.
    pub fn close(&self, reason: &str) -> bool {
        let live = {
            let mut state = self.lock();
            self.closed.store(true, Ordering::SeqCst);
            match std::mem::replace(&mut *state, SessionState::Idle) {
                SessionState::Idle => None,
                SessionState::AwaitingPresentation(live)
                | SessionState::AwaitingCompletion(live) => Some(live),
            }
        };
        match live {
            Some(live) => {
                Self::finish(live.info.id, live, SessionOutcome::Failed(reason.to_owned()));
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Fresh callback identity for one session.
    pub fn completion_for(self: &Arc<Self>, session: SessionId) -> SessionCompletion {
        SessionCompletion::new(
            session,
            Arc::new(SessionCallback {
                session,
                correlator: Arc::clone(self),
            }),
        )
    }
}

/// Per-session callback registration handed to the presenter.
///
/// When the last clone is dropped without a terminal outcome the session is
/// failed, so a vanished sheet host cannot leave the serializer held.
struct SessionCallback {
    session: SessionId,
    correlator: Arc<SessionCorrelator>,
}

impl CompletionSink for SessionCallback {
    fn resolve(&self, session: SessionId, outcome: SessionOutcome) {
        if !self.correlator.resolve(session, outcome) {
            warn!(%session, "ignoring duplicate or stale wallet callback");
        }
    }
}

impl Drop for SessionCallback {
    fn drop(&mut self) {
        let abandoned = SessionOutcome::Failed(ABANDONED_MESSAGE.to_owned());
        if self.correlator.resolve(self.session, abandoned) {
            warn!(session = %self.session, "wallet sheet released without reporting an outcome");
        }
    }
}

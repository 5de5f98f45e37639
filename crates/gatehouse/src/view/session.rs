//! One login view: a guard, its countdown, and the submit flow.

use chrono::{DateTime, Utc};
use gatehouse_common::{Decision, GatehouseError, LoginStatus, Rejection};
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, watch};

use super::ticker::CooldownTicker;
use crate::auth::{AuthenticatedUser, Authenticator, Credentials};
use crate::clock::Clock;
use crate::guard::LoginGuard;

/// Login form as submitted by the client
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(flatten)]
    pub credentials: Credentials,

    /// Honeypot. Rendered hidden, so humans leave it empty.
    #[serde(default)]
    pub confirmation: String,

    /// Answer to the arithmetic challenge, when one is shown
    #[serde(default)]
    pub challenge_answer: String,
}

impl LoginForm {
    /// Both credential fields are required before anything else is looked at
    pub fn validate(&self) -> Result<(), GatehouseError> {
        if self.credentials.identifier.trim().is_empty() {
            return Err(GatehouseError::InvalidInput("identifier is required".to_string()));
        }
        if self.credentials.password.is_empty() {
            return Err(GatehouseError::InvalidInput("password is required".to_string()));
        }
        Ok(())
    }
}

struct ViewInner {
    guard: LoginGuard,
    ticker: Option<CooldownTicker>,
}

/// State owned by a single login view.
///
/// Every view has its own guard; two browser tabs never share counters.
pub struct LoginView {
    id: String,
    inner: Arc<Mutex<ViewInner>>,
    countdown: Arc<watch::Sender<u64>>,
    clock: Arc<dyn Clock>,
    last_seen_ms: AtomicI64,
}

impl std::fmt::Debug for LoginView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginView")
            .field("id", &self.id)
            .field("remaining_seconds", &*self.countdown.borrow())
            .finish_non_exhaustive()
    }
}

impl LoginView {
    pub fn new(id: String, guard: LoginGuard, clock: Arc<dyn Clock>) -> Self {
        let (countdown, _) = watch::channel(0);
        let last_seen_ms = AtomicI64::new(clock.now().timestamp_millis());
        Self {
            id,
            inner: Arc::new(Mutex::new(ViewInner { guard, ticker: None })),
            countdown: Arc::new(countdown),
            clock,
            last_seen_ms,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Live countdown, updated by the ticker while a cooldown runs
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.countdown.subscribe()
    }

    /// Milliseconds since the view was last used
    pub fn idle_ms(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis() - self.last_seen_ms.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.last_seen_ms
            .store(self.clock.now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Current snapshot
    pub async fn status(&self) -> LoginStatus {
        self.touch();
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        self.catch_up(&mut inner, now);
        self.snapshot(&inner.guard, now)
    }

    /// Screen a submission and, if it passes, forward it once.
    ///
    /// The view lock is held across the authentication call, so a view
    /// processes one submission at a time.
    pub async fn submit(
        &self,
        form: &LoginForm,
        authenticator: &dyn Authenticator,
    ) -> Result<AuthenticatedUser, GatehouseError> {
        form.validate()?;
        self.touch();

        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        self.catch_up(&mut inner, now);

        if let Decision::Reject(rejection) =
            inner
                .guard
                .evaluate(&form.confirmation, &form.challenge_answer, now)
        {
            match rejection {
                Rejection::Honeypot => {
                    tracing::warn!(
                        session_id = %self.id,
                        "Honeypot field filled, submission dropped"
                    );
                }
                Rejection::CooldownActive { remaining_seconds } => {
                    tracing::debug!(
                        session_id = %self.id,
                        remaining_seconds,
                        "Submission during cooldown"
                    );
                }
                Rejection::ChallengeFailed => {
                    tracing::debug!(session_id = %self.id, "Challenge answer rejected");
                }
            }
            return Err(rejection.into());
        }

        match authenticator.authenticate(&form.credentials).await {
            Ok(user) => {
                inner.guard.on_authentication_success();
                if let Some(ticker) = inner.ticker.take() {
                    ticker.cancel();
                }
                self.countdown.send_replace(0);
                tracing::info!(session_id = %self.id, "Login succeeded");
                Ok(user)
            }
            Err(failure) => {
                let outcome = inner.guard.on_authentication_failure(self.clock.now());

                if outcome.challenge_armed {
                    tracing::info!(
                        session_id = %self.id,
                        failed_attempts = outcome.failed_attempts,
                        "Challenge armed"
                    );
                }
                if let Some(penalty_secs) = outcome.penalty_secs {
                    tracing::warn!(
                        session_id = %self.id,
                        failed_attempts = outcome.failed_attempts,
                        penalty_secs,
                        "Cooldown started after repeated failures"
                    );
                    self.countdown.send_replace(penalty_secs);
                    self.start_ticker(&mut inner);
                } else {
                    tracing::debug!(
                        session_id = %self.id,
                        failed_attempts = outcome.failed_attempts,
                        "Login failed"
                    );
                }

                Err(GatehouseError::authentication_failed(failure.message))
            }
        }
    }

    /// Cancel the countdown. Called when the view is closed.
    pub async fn teardown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(ticker) = inner.ticker.take() {
            ticker.cancel();
        }
    }

    /// Apply an expiry the ticker has not seen yet
    fn catch_up(&self, inner: &mut ViewInner, now: DateTime<Utc>) -> u64 {
        let remaining = inner.guard.tick_cooldown(now);
        let stale = inner.ticker.as_ref().is_some_and(|t| t.is_finished());
        if remaining == 0 || stale {
            if let Some(ticker) = inner.ticker.take() {
                ticker.cancel();
            }
        }
        self.countdown.send_replace(remaining);
        remaining
    }

    fn start_ticker(&self, inner: &mut ViewInner) {
        let weak: Weak<Mutex<ViewInner>> = Arc::downgrade(&self.inner);
        let clock = self.clock.clone();
        let countdown = self.countdown.clone();
        let session_id = self.id.clone();
        let period = inner.guard.policy().tick_interval();

        let ticker = CooldownTicker::spawn(period, move || {
            let weak = weak.clone();
            let clock = clock.clone();
            let countdown = countdown.clone();
            let session_id = session_id.clone();
            async move {
                // View gone: nothing left to count down for
                let Some(shared) = weak.upgrade() else {
                    return false;
                };
                let mut state = shared.lock().await;
                let remaining = state.guard.tick_cooldown(clock.now());
                countdown.send_replace(remaining);
                if remaining == 0 {
                    tracing::info!(session_id = %session_id, "Cooldown elapsed, attempts forgiven");
                    return false;
                }
                true
            }
        });

        // Replacing an older ticker aborts it
        inner.ticker = Some(ticker);
    }

    fn snapshot(&self, guard: &LoginGuard, now: DateTime<Utc>) -> LoginStatus {
        let phase = guard.phase(now);
        let failed_attempts = guard.state().failed_attempts;
        let remaining_seconds = guard.remaining_seconds(now);
        LoginStatus {
            session_id: self.id.clone(),
            phase,
            failed_attempts,
            remaining_seconds,
            challenge: guard.challenge().map(|c| c.prompt()),
            notice: LoginStatus::notice_for(phase, failed_attempts, remaining_seconds),
        }
    }
}

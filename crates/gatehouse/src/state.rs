//! Application state and shared resources.

use gatehouse_common::{GatehouseError, MetricsSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::auth::Authenticator;
use crate::config::AppConfig;
use crate::view::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Open login views
    pub sessions: Arc<SessionRegistry>,

    /// Authentication collaborator
    pub authenticator: Arc<dyn Authenticator>,

    /// Login counters
    pub metrics: Arc<LoginMetrics>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        sessions: Arc<SessionRegistry>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            config,
            sessions,
            authenticator,
            metrics: Arc::new(LoginMetrics::default()),
        }
    }

    pub async fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.sessions.len().await as u64)
    }
}

/// Monotonic login counters
#[derive(Debug, Default)]
pub struct LoginMetrics {
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected_honeypot: AtomicU64,
    rejected_cooldown: AtomicU64,
    rejected_challenge: AtomicU64,
}

impl LoginMetrics {
    /// Count the outcome of one submission
    pub fn record<T>(&self, result: &Result<T, GatehouseError>) {
        let counter = match result {
            Ok(_) => &self.succeeded,
            Err(GatehouseError::AuthenticationFailed { .. }) => &self.failed,
            Err(GatehouseError::HoneypotTriggered) => &self.rejected_honeypot,
            Err(GatehouseError::CooldownActive { .. }) => &self.rejected_cooldown,
            Err(GatehouseError::ChallengeFailed) => &self.rejected_challenge,
            Err(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, active_sessions: u64) -> MetricsSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        MetricsSnapshot {
            active_sessions,
            forwarded: succeeded + failed,
            succeeded,
            failed,
            rejected_honeypot: self.rejected_honeypot.load(Ordering::Relaxed),
            rejected_cooldown: self.rejected_cooldown.load(Ordering::Relaxed),
            rejected_challenge: self.rejected_challenge.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_buckets() {
        let metrics = LoginMetrics::default();
        metrics.record::<()>(&Ok(()));
        metrics.record::<()>(&Err(GatehouseError::authentication_failed(None)));
        metrics.record::<()>(&Err(GatehouseError::HoneypotTriggered));
        metrics.record::<()>(&Err(GatehouseError::ChallengeFailed));
        metrics.record::<()>(&Err(GatehouseError::CooldownActive { remaining_seconds: 3 }));
        metrics.record::<()>(&Err(GatehouseError::InvalidInput("x".into())));

        let snapshot = metrics.snapshot(2);
        assert_eq!(snapshot.active_sessions, 2);
        assert_eq!(snapshot.forwarded, 2);
        assert_eq!(snapshot.succeeded, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.rejected_honeypot, 1);
        assert_eq!(snapshot.rejected_challenge, 1);
        assert_eq!(snapshot.rejected_cooldown, 1);
    }
}

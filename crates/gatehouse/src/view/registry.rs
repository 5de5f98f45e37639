//! Open login views, keyed by session id.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use gatehouse_common::GatehouseError;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

use super::session::LoginView;
use crate::clock::Clock;
use crate::guard::{GuardPolicy, LoginGuard, OperandSource, RngOperands};

/// Builds the operand source for each new guard
pub type OperandFactory = Arc<dyn Fn() -> Box<dyn OperandSource> + Send + Sync>;

/// OS-seeded operands for every view
pub fn random_operands() -> OperandFactory {
    Arc::new(|| Box::new(RngOperands::from_os_rng()) as Box<dyn OperandSource>)
}

/// Registry of open login views
pub struct SessionRegistry {
    views: RwLock<HashMap<String, Arc<LoginView>>>,
    policy: GuardPolicy,
    clock: Arc<dyn Clock>,
    operands: OperandFactory,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(
        policy: GuardPolicy,
        clock: Arc<dyn Clock>,
        operands: OperandFactory,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            views: RwLock::new(HashMap::new()),
            policy,
            clock,
            operands,
            idle_ttl,
        }
    }

    /// Open a fresh view with its own guard
    pub async fn open(&self) -> Arc<LoginView> {
        let guard = LoginGuard::new(self.policy, (self.operands)());

        let mut views = self.views.write().await;
        let mut id = generate_session_id();
        while views.contains_key(&id) {
            id = generate_session_id();
        }

        let view = Arc::new(LoginView::new(id.clone(), guard, self.clock.clone()));
        views.insert(id.clone(), view.clone());

        tracing::debug!(session_id = %id, open_sessions = views.len(), "Login view opened");

        view
    }

    pub async fn get(&self, id: &str) -> Result<Arc<LoginView>, GatehouseError> {
        self.views
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GatehouseError::SessionNotFound(id.to_string()))
    }

    /// Close a view and stop its countdown
    pub async fn close(&self, id: &str) -> Result<(), GatehouseError> {
        let view = self
            .views
            .write()
            .await
            .remove(id)
            .ok_or_else(|| GatehouseError::SessionNotFound(id.to_string()))?;

        view.teardown().await;
        tracing::debug!(session_id = %id, "Login view closed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.views.read().await.len()
    }

    /// Close every view idle for longer than the TTL. Returns how many.
    pub async fn sweep_idle(&self) -> usize {
        let now = self.clock.now();
        let ttl_ms = i64::try_from(self.idle_ttl.as_millis()).unwrap_or(i64::MAX);

        let expired: Vec<Arc<LoginView>> = {
            let mut views = self.views.write().await;
            let ids: Vec<String> = views
                .iter()
                .filter(|(_, view)| view.idle_ms(now) > ttl_ms)
                .map(|(id, _)| id.clone())
                .collect();
            ids.iter().filter_map(|id| views.remove(id)).collect()
        };

        for view in &expired {
            view.teardown().await;
        }

        expired.len()
    }
}

/// Background worker that evicts idle views until shutdown
pub async fn session_sweeper(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = registry.sweep_idle().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Evicted idle login views");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Session sweeper shutting down");
                break;
            }
        }
    }
}

/// Random URL-safe session id
fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, FakeAuthenticator};
    use crate::clock::ManualClock;
    use crate::guard::ScriptedOperands;
    use crate::view::LoginForm;

    fn registry(clock: Arc<ManualClock>) -> SessionRegistry {
        SessionRegistry::new(
            GuardPolicy::default(),
            clock,
            Arc::new(|| Box::new(ScriptedOperands::new(&[4, 5])) as Box<dyn OperandSource>),
            Duration::from_secs(60),
        )
    }

    fn wrong_password() -> LoginForm {
        LoginForm {
            credentials: Credentials {
                identifier: "admin".to_string(),
                password: "wrong".to_string(),
            },
            confirmation: String::new(),
            challenge_answer: String::new(),
        }
    }

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 22);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(id, generate_session_id());
    }

    #[tokio::test]
    async fn test_open_get_close() {
        let registry = registry(Arc::new(ManualClock::default()));
        let view = registry.open().await;
        assert_eq!(registry.len().await, 1);

        let fetched = registry.get(view.id()).await.unwrap();
        assert!(Arc::ptr_eq(&view, &fetched));

        registry.close(view.id()).await.unwrap();
        assert_eq!(registry.len().await, 0);
        assert!(matches!(
            registry.get(view.id()).await,
            Err(GatehouseError::SessionNotFound(id)) if id == view.id()
        ));
        assert!(registry.close(view.id()).await.is_err());
    }

    #[tokio::test]
    async fn test_views_do_not_share_attempts() {
        let registry = registry(Arc::new(ManualClock::default()));
        let auth = FakeAuthenticator::new("admin", "secret");
        let first = registry.open().await;
        let second = registry.open().await;

        for _ in 0..3 {
            let _ = first.submit(&wrong_password(), &auth).await;
        }

        assert_eq!(first.status().await.failed_attempts, 3);
        let other = second.status().await;
        assert_eq!(other.failed_attempts, 0);
        assert!(other.challenge.is_none());
    }

    #[tokio::test]
    async fn test_sweep_evicts_idle_views() {
        let clock = Arc::new(ManualClock::default());
        let registry = registry(clock.clone());
        let stale = registry.open().await;

        clock.advance(chrono::Duration::seconds(45));
        let fresh = registry.open().await;

        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(registry.sweep_idle().await, 1);
        assert!(registry.get(stale.id()).await.is_err());
        assert!(registry.get(fresh.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let registry = Arc::new(registry(Arc::new(ManualClock::default())));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let worker = tokio::spawn(session_sweeper(
            registry,
            Duration::from_millis(10),
            shutdown_rx,
        ));

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), worker)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}

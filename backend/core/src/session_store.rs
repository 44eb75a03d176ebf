//! In-memory session store with per-phone serialization.
//!
//! Each phone number maps to its own `Arc<Mutex<Session>>`. Holding the
//! guard for a whole dispatch pass serializes passes for the same user
//! (duplicate webhook deliveries queue behind each other) while passes for
//! other users proceed, even when a handler is suspended on I/O.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;

use crate::session::{Session, DEFAULT_HISTORY_LIMIT};

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
    history_limit: usize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            history_limit,
        }
    }

    /// Get the slot for a phone number, creating the session on first sight.
    async fn slot(&self, phone: &str) -> Arc<Mutex<Session>> {
        if let Some(slot) = self.sessions.read().await.get(phone) {
            return slot.clone();
        }
        let mut w = self.sessions.write().await;
        w.entry(phone.to_string())
            .or_insert_with(|| {
                debug!("[Sessions] Creating session for new sender");
                Arc::new(Mutex::new(
                    Session::new(phone).with_history_limit(self.history_limit),
                ))
            })
            .clone()
    }

    /// Acquire exclusive access to a user's session for one dispatch pass.
    ///
    /// Waits while another pass for the same phone holds the guard.
    pub async fn acquire(&self, phone: &str) -> OwnedMutexGuard<Session> {
        self.slot(phone).await.lock_owned().await
    }

    /// Copy of the current session state, if the phone has been seen.
    pub async fn snapshot(&self, phone: &str) -> Option<Session> {
        let slot = self.sessions.read().await.get(phone).cloned()?;
        let session = slot.lock().await;
        Some(session.clone())
    }

    /// Replace a session wholesale (e.g. restored by the persistence layer).
    pub async fn restore(&self, session: Session) {
        let phone = session.phone_number.clone();
        let slot = self.slot(&phone).await;
        *slot.lock().await = session;
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::session::ActiveFlow;

    #[tokio::test]
    async fn creates_session_on_first_acquire() {
        let store = SessionStore::new();
        assert!(store.is_empty().await);
        {
            let mut s = store.acquire("111").await;
            s.activate(ActiveFlow::PaymentPoints);
        }
        assert_eq!(store.len().await, 1);
        let snap = store.snapshot("111").await.unwrap();
        assert_eq!(snap.flow_active(), Some("paymentPoints"));
        assert!(store.snapshot("222").await.is_none());
    }

    #[tokio::test]
    async fn same_phone_is_serialized() {
        let store = SessionStore::new();
        let guard = store.acquire("111").await;

        let store2 = store.clone();
        let waiter = tokio::spawn(async move {
            let _g = store2.acquire("111").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn other_phones_are_not_blocked() {
        let store = SessionStore::new();
        let _guard = store.acquire("111").await;
        let other = tokio::time::timeout(Duration::from_millis(200), store.acquire("222")).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn restore_replaces_state() {
        let store = SessionStore::new();
        let mut s = Session::new("333");
        s.activate(ActiveFlow::Invoices);
        store.restore(s).await;
        assert_eq!(
            store.snapshot("333").await.unwrap().flow_active(),
            Some("invoices")
        );
    }
}

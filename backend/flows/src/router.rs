//! Entry point for inbound messages.
//!
//! The router owns the session store and a shared dispatcher. Each inbound
//! message holds its user's session for the whole pass, so two messages
//! from the same phone never interleave while different phones run
//! concurrently.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use deskflow_core::{SessionStore, User};
use logging::mask_phone;

use crate::dispatcher::{DispatchOutcome, FlowDispatcher};

#[derive(Clone)]
pub struct ConversationRouter {
    store: SessionStore,
    dispatcher: Arc<FlowDispatcher>,
}

impl ConversationRouter {
    pub fn new(store: SessionStore, dispatcher: FlowDispatcher) -> Self {
        Self {
            store,
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &FlowDispatcher {
        &self.dispatcher
    }

    pub async fn handle_inbound(&self, user: &User, raw: &str) -> DispatchOutcome {
        self.handle_inbound_at(user, raw, Utc::now()).await
    }

    /// Route one message as of `now`.
    #[instrument(skip_all, fields(phone = %mask_phone(&user.phone_number)))]
    pub async fn handle_inbound_at(
        &self,
        user: &User,
        raw: &str,
        now: DateTime<Utc>,
    ) -> DispatchOutcome {
        let mut session = self.store.acquire(&user.phone_number).await;
        session.last_activity = Some(now);
        self.dispatcher.dispatch_at(user, raw, &mut session, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use deskflow_core::fakes::RecordingSender;
    use deskflow_core::Session;

    use crate::flow::{Flow, FlowInput, FlowOutcome};

    /// Appends every message to history after a delay, so overlapping
    /// passes for one phone would show up as interleaved entries.
    struct SlowEcho;

    #[async_trait]
    impl Flow for SlowEcho {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn can_handle(&self, _input: &FlowInput, _session: &Session) -> bool {
            true
        }

        async fn handle(&self, input: &FlowInput, session: &mut Session) -> Result<FlowOutcome> {
            session.push_history(input.raw.clone(), "start", input.received_at);
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.push_history(input.raw.clone(), "end", input.received_at);
            Ok(FlowOutcome::Resolved)
        }
    }

    fn router() -> ConversationRouter {
        let mut dispatcher = FlowDispatcher::new(Arc::new(RecordingSender::new()));
        dispatcher.register(Arc::new(SlowEcho));
        ConversationRouter::new(SessionStore::new(), dispatcher)
    }

    #[tokio::test]
    async fn same_user_passes_do_not_interleave() {
        let router = router();
        let user = User::anonymous("573001112233");

        let a = {
            let (router, user) = (router.clone(), user.clone());
            tokio::spawn(async move { router.handle_inbound(&user, "uno").await })
        };
        let b = {
            let (router, user) = (router.clone(), user.clone());
            tokio::spawn(async move { router.handle_inbound(&user, "dos").await })
        };
        assert!(a.await.unwrap().is_handled());
        assert!(b.await.unwrap().is_handled());

        let session = router.store().snapshot("573001112233").await.unwrap();
        let turns: Vec<_> = session
            .history()
            .iter()
            .map(|h| (h.user_text.as_str(), h.reply_text.as_str()))
            .collect();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].0, turns[1].0);
        assert_eq!(turns[2].0, turns[3].0);
        assert_eq!((turns[0].1, turns[1].1), ("start", "end"));
    }

    #[tokio::test]
    async fn different_users_get_separate_sessions() {
        let router = router();
        let (first, second) = (User::anonymous("111"), User::anonymous("222"));
        let (a, b) = tokio::join!(
            router.handle_inbound(&first, "hola"),
            router.handle_inbound(&second, "hola"),
        );
        assert!(a.is_handled() && b.is_handled());
        assert_eq!(router.store().len().await, 2);
        assert_eq!(router.store().snapshot("111").await.unwrap().history().len(), 2);
    }

    #[tokio::test]
    async fn records_last_activity() {
        let router = router();
        let at = Utc::now();
        router
            .handle_inbound_at(&User::anonymous("111"), "hola", at)
            .await;
        assert_eq!(
            router.store().snapshot("111").await.unwrap().last_activity,
            Some(at)
        );
    }
}

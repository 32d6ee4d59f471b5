//! One chat conversation: the message log, the active mode, the session id
//! and the busy flag that blocks overlapping submissions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use courier_core::{AiMode, Message, MessageIdGenerator, Role, SessionId, SessionStore};

use crate::error::ChatError;
use crate::router::{RouteReply, Router};

pub struct Conversation {
    session: Mutex<SessionId>,
    mode: Mutex<AiMode>,
    messages: Mutex<Vec<Message>>,
    ids: MessageIdGenerator,
    busy: AtomicBool,
}

/// Clears the busy flag when a send finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Conversation {
    pub fn new(session: SessionId, mode: AiMode) -> Self {
        Self {
            session: Mutex::new(session),
            mode: Mutex::new(mode),
            messages: Mutex::new(Vec::new()),
            ids: MessageIdGenerator::new(),
            busy: AtomicBool::new(false),
        }
    }

    /// Submit `text`, route it, and record both sides of the exchange.
    ///
    /// Returns the model's reply message. Blank input and a submission
    /// while another is in flight are rejected without touching the log.
    pub async fn send(&self, router: &Router, text: &str) -> Result<Message, ChatError> {
        self.send_with_reply(router, text)
            .await
            .map(|(message, _)| message)
    }

    /// Like [`send`](Self::send), also returning the routing details.
    pub async fn send_with_reply(
        &self,
        router: &Router,
        text: &str,
    ) -> Result<(Message, RouteReply), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Rejected submission while busy");
            return Err(ChatError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let session = self.session();
        let mode = self.mode();
        lock(&self.messages).push(Message::new(&self.ids, Role::User, text));

        let reply = router.dispatch(text, mode, &session).await;
        if let Some(kind) = reply.error {
            tracing::info!(kind = %kind, path = ?reply.path, "Message resolved with error");
        }

        let message = Message::new(&self.ids, Role::Model, reply.text.clone());
        lock(&self.messages).push(message.clone());
        Ok((message, reply))
    }

    /// Snapshot of the log, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }

    /// Clear the log. The session id is kept.
    pub fn new_chat(&self) {
        lock(&self.messages).clear();
        tracing::info!(session = %self.session(), "Started new chat");
    }

    /// Replace the session id through `store` and adopt the new one.
    pub fn reset_session(&self, store: &SessionStore) -> courier_core::Result<SessionId> {
        let fresh = store.reset()?;
        self.set_session(fresh.clone());
        Ok(fresh)
    }

    pub fn set_session(&self, session: SessionId) {
        *lock(&self.session) = session;
    }

    pub fn session(&self) -> SessionId {
        lock(&self.session).clone()
    }

    pub fn set_mode(&self, mode: AiMode) {
        *lock(&self.mode) = mode;
        tracing::info!(mode = %mode, "Routing mode changed");
    }

    pub fn mode(&self) -> AiMode {
        *lock(&self.mode)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

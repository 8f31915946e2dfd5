//! Connection lifecycle management.
//!
//! A [`Session`] owns one store connection and its state transitions:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected
//!                      \-> Failed (terminal per attempt; retry re-enters
//!                          Connecting)
//! ```
//!
//! Transitions are serialized through a single write slot, so only one
//! connect or disconnect is ever in flight; data operations share the
//! read side concurrently once connected. Side effects are observable
//! [`SessionEvent`]s delivered to subscribers as a finite stream per
//! transition; the session performs no I/O formatting of its own, logging
//! consumers subscribe if they care.
//!
//! # Example
//!
//! ```ignore
//! use refstore::{memory::MemoryConnector, session::Session};
//!
//! let session = Session::new(MemoryConnector::new());
//! let mut events = session.subscribe().await;
//!
//! session.connect("memory://meal").await?;
//! session.disconnect().await?;
//! session.disconnect().await?; // idempotent no-op
//! ```

use futures::Stream;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use log::{debug, warn};
use mea::rwlock::RwLock;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::{
    backend::{StoreBackend, StoreConnector},
    error::{RefStoreError, RefStoreResult},
};

/// Observable connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection; the initial and terminal state.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The store is reachable; operations may be issued.
    Connected,
    /// The last connect attempt failed. A new `connect` call re-enters
    /// `Connecting`.
    Failed,
}

/// An event emitted on a session state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The connection was established.
    Connected,
    /// A connect attempt failed with the given reason.
    Error(String),
    /// The connection was taken down.
    Disconnected,
    /// The underlying store handle was released.
    Closed,
}

enum Conn<B> {
    Disconnected,
    Connecting,
    Connected(Arc<B>),
    Failed,
}

/// Owns a store connection shared by all operations issued through it.
pub struct Session<C: StoreConnector> {
    connector: C,
    conn: RwLock<Conn<C::Backend>>,
    subscribers: RwLock<Vec<UnboundedSender<SessionEvent>>>,
}

impl<C: StoreConnector> Session<C> {
    /// Creates a disconnected session over the given connector.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            conn: RwLock::new(Conn::Disconnected),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> SessionState {
        match &*self.conn.read().await {
            Conn::Disconnected => SessionState::Disconnected,
            Conn::Connecting => SessionState::Connecting,
            Conn::Connected(_) => SessionState::Connected,
            Conn::Failed => SessionState::Failed,
        }
    }

    /// Subscribes to session events. Each transition delivers a finite
    /// number of events; the stream ends when the session is dropped.
    pub async fn subscribe(&self) -> SessionEvents {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.write().await.push(sender);

        SessionEvents { receiver }
    }

    /// Opens the connection to `target`.
    ///
    /// # Errors
    ///
    /// Propagates the connector's failure, leaving the session in
    /// `Failed`; no automatic retry is performed. Connecting an already
    /// connected session is a [`RefStoreError::Connection`] error.
    pub async fn connect(&self, target: &str) -> RefStoreResult<()> {
        let mut conn = self.conn.write().await;

        if matches!(*conn, Conn::Connected(_)) {
            return Err(RefStoreError::Connection(
                "session is already connected".to_string(),
            ));
        }

        *conn = Conn::Connecting;
        debug!("connecting to {target}");

        match self.connector.open(target).await {
            Ok(backend) => {
                *conn = Conn::Connected(Arc::new(backend));
                drop(conn);
                debug!("connected to {target}");
                self.emit(SessionEvent::Connected).await;

                Ok(())
            }
            Err(err) => {
                *conn = Conn::Failed;
                drop(conn);
                warn!("connection to {target} failed: {err}");
                self.emit(SessionEvent::Error(err.to_string())).await;

                Err(err)
            }
        }
    }

    /// Takes the connection down and releases the store handle.
    ///
    /// Idempotent: disconnecting a session that is not connected is a
    /// no-op, not an error. Cleanup is attempted on every path.
    pub async fn disconnect(&self) -> RefStoreResult<()> {
        let mut conn = self.conn.write().await;

        match std::mem::replace(&mut *conn, Conn::Disconnected) {
            Conn::Connected(backend) => {
                drop(conn);
                debug!("disconnecting");
                self.emit(SessionEvent::Disconnected).await;

                let result = match Arc::try_unwrap(backend) {
                    Ok(backend) => backend.close().await,
                    // Operations still hold the handle; it is released when
                    // the last of them finishes.
                    Err(_) => Ok(()),
                };

                self.emit(SessionEvent::Closed).await;

                result
            }
            _ => Ok(()),
        }
    }

    /// Returns a shared handle to the connected backend.
    pub(crate) async fn backend(&self) -> RefStoreResult<Arc<C::Backend>> {
        match &*self.conn.read().await {
            Conn::Connected(backend) => Ok(Arc::clone(backend)),
            _ => Err(RefStoreError::NotConnected),
        }
    }

    async fn emit(&self, event: SessionEvent) {
        let mut subscribers = self.subscribers.write().await;
        subscribers.retain(|sender| sender.unbounded_send(event.clone()).is_ok());
    }
}

/// A finite stream of [`SessionEvent`]s for one subscriber.
pub struct SessionEvents {
    receiver: UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
    /// Returns the next already-delivered event without waiting.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.receiver.try_next().ok().flatten()
    }
}

impl Stream for SessionEvents {
    type Item = SessionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::document::{Document, Id, Value};
    use crate::query::Path;

    #[derive(Debug, Default)]
    struct NullStore;

    #[async_trait]
    impl StoreBackend for NullStore {
        async fn insert(&self, _: &str, _: Document) -> RefStoreResult<()> {
            Ok(())
        }

        async fn replace(&self, _: &str, _: Document) -> RefStoreResult<()> {
            Ok(())
        }

        async fn fetch_by_id(&self, _: &str, _: &Id) -> RefStoreResult<Option<Document>> {
            Ok(None)
        }

        async fn scan(&self, _: &str) -> RefStoreResult<Vec<Document>> {
            Ok(Vec::new())
        }

        async fn apply_update(
            &self,
            _: &str,
            _: &Id,
            _: &Path,
            _: Value,
        ) -> RefStoreResult<bool> {
            Ok(false)
        }

        async fn delete(&self, _: &str, _: &Id) -> RefStoreResult<bool> {
            Ok(false)
        }
    }

    struct FlakyConnector {
        fail_next: AtomicBool,
    }

    impl FlakyConnector {
        fn failing() -> Self {
            Self { fail_next: AtomicBool::new(true) }
        }

        fn healthy() -> Self {
            Self { fail_next: AtomicBool::new(false) }
        }
    }

    #[async_trait]
    impl StoreConnector for FlakyConnector {
        type Backend = NullStore;

        async fn open(&self, target: &str) -> RefStoreResult<NullStore> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(RefStoreError::Connection(format!("{target} unreachable")));
            }

            Ok(NullStore)
        }
    }

    #[tokio::test]
    async fn connect_and_disconnect_emit_events_in_order() {
        let session = Session::new(FlakyConnector::healthy());
        let mut events = session.subscribe().await;

        session.connect("store://meal").await.unwrap();
        assert_eq!(session.state().await, SessionState::Connected);

        session.disconnect().await.unwrap();
        assert_eq!(session.state().await, SessionState::Disconnected);

        assert_eq!(events.try_next(), Some(SessionEvent::Connected));
        assert_eq!(events.try_next(), Some(SessionEvent::Disconnected));
        assert_eq!(events.try_next(), Some(SessionEvent::Closed));
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn failed_connect_is_terminal_until_retried() {
        let session = Session::new(FlakyConnector::failing());
        let mut events = session.subscribe().await;

        let err = session.connect("store://meal").await.unwrap_err();
        assert!(matches!(err, RefStoreError::Connection(_)));
        assert_eq!(session.state().await, SessionState::Failed);
        assert!(matches!(events.try_next(), Some(SessionEvent::Error(_))));

        // A retry re-enters Connecting and may succeed.
        session.connect("store://meal").await.unwrap();
        assert_eq!(session.state().await, SessionState::Connected);
        assert_eq!(events.try_next(), Some(SessionEvent::Connected));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let session = Session::new(FlakyConnector::healthy());
        let mut events = session.subscribe().await;

        session.disconnect().await.unwrap();
        session.disconnect().await.unwrap();

        assert_eq!(session.state().await, SessionState::Disconnected);
        assert_eq!(events.try_next(), None);
    }

    #[tokio::test]
    async fn connecting_twice_without_disconnect_fails() {
        let session = Session::new(FlakyConnector::healthy());

        session.connect("store://meal").await.unwrap();
        let err = session.connect("store://meal").await.unwrap_err();

        assert!(matches!(err, RefStoreError::Connection(_)));
        assert_eq!(session.state().await, SessionState::Connected);
    }

    #[tokio::test]
    async fn operations_require_a_connected_session() {
        let session = Session::new(FlakyConnector::healthy());

        assert!(matches!(
            session.backend().await.unwrap_err(),
            RefStoreError::NotConnected
        ));
    }
}

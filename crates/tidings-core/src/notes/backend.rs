//! Backend seams for the notes client
//!
//! The auth service and the document store are injected into the session
//! and the sync manager as trait objects, so tests can substitute the
//! in-memory backend for the hosted one.
//!
//! A live query is exposed as a [`NoteSubscription`]: a stream of full
//! snapshots paired with a handle whose release runs exactly once, whether
//! it is cancelled explicitly or dropped.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::Stream;
use tokio::sync::mpsc;

use super::models::{Note, User};
use crate::error::{AuthError, StoreError};

/// One full result set pushed by a live query
pub type Snapshot = Result<Vec<Note>, StoreError>;

/// Email/password authentication
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Sign in to an existing account
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Sign out the current user
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The user the service currently considers signed in
    fn current_user(&self) -> Option<User>;
}

/// The notes collection of a document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Add a new document, returning its assigned ID
    async fn add_note(&self, note: &Note) -> Result<String, StoreError>;

    /// Overwrite the document with the note's ID
    async fn set_note(&self, note: &Note) -> Result<(), StoreError>;

    /// Delete the document with the given ID
    async fn delete_note(&self, id: &str) -> Result<(), StoreError>;

    /// Start a live query for notes owned by `owner_id`, ordered by title
    async fn subscribe(&self, owner_id: &str) -> Result<NoteSubscription, StoreError>;
}

/// Release side of a live query
pub struct SubscriptionHandle {
    active: Arc<AtomicBool>,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    /// Create a handle that runs `on_cancel` when released
    pub fn new(on_cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    /// Whether the subscription is still live
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Shared flag a backend can poll to notice cancellation
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }

    /// Release the subscription. Returns false if it was already released.
    pub fn cancel(&mut self) -> bool {
        match self.on_cancel.take() {
            Some(release) => {
                self.active.store(false, Ordering::SeqCst);
                release();
                true
            }
            None => false,
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A live query: a stream of snapshots plus its release handle
#[derive(Debug)]
pub struct NoteSubscription {
    rx: mpsc::UnboundedReceiver<Snapshot>,
    handle: SubscriptionHandle,
}

impl NoteSubscription {
    pub fn new(rx: mpsc::UnboundedReceiver<Snapshot>, handle: SubscriptionHandle) -> Self {
        Self { rx, handle }
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    /// Release the subscription; the stream ends afterwards
    pub fn cancel(&mut self) -> bool {
        let released = self.handle.cancel();
        self.rx.close();
        released
    }

    /// Separate the snapshot receiver from the release handle, so one task
    /// can drain snapshots while its owner keeps the ability to cancel
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Snapshot>, SubscriptionHandle) {
        (self.rx, self.handle)
    }
}

impl Stream for NoteSubscription {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.handle.is_active() {
            return Poll::Ready(None);
        }
        this.rx.poll_recv(cx)
    }
}

//! In-process auth service and document store
//!
//! Behaves like the hosted backend as far as the client can tell: accounts
//! are keyed by email, notes get generated IDs, and every open subscription
//! receives a fresh owner-filtered, title-ordered snapshot after each write.
//! Nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::backend::{AuthService, DocumentStore, NoteSubscription, Snapshot, SubscriptionHandle};
use super::models::{sort_by_title, Note, User};
use crate::error::{AuthError, StoreError};

/// Minimum password length accepted at sign-up
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    password: String,
}

struct Subscriber {
    id: u64,
    owner_id: String,
    tx: mpsc::UnboundedSender<Snapshot>,
}

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    current: Option<User>,
    notes: BTreeMap<String, Note>,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
    offline: bool,
}

impl Inner {
    fn snapshot_for(&self, owner_id: &str) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect();
        sort_by_title(&mut notes);
        notes
    }

    /// Push a snapshot to every open subscription, dropping closed ones
    fn publish(&mut self) {
        let snapshots: Vec<Vec<Note>> = self
            .subscribers
            .iter()
            .map(|s| self.snapshot_for(&s.owner_id))
            .collect();

        let mut open = Vec::with_capacity(self.subscribers.len());
        for (sub, snapshot) in self.subscribers.drain(..).zip(snapshots) {
            if sub.tx.send(Ok(snapshot)).is_ok() {
                open.push(sub);
            } else {
                debug!("Dropping closed subscription {}", sub.id);
            }
        }
        self.subscribers = open;
    }
}

/// In-memory backend implementing both [`AuthService`] and [`DocumentStore`]
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate losing connectivity: every call fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Push an error to every open subscription
    pub fn fail_subscriptions(&self, error: StoreError) {
        let inner = self.lock();
        for sub in &inner.subscribers {
            let _ = sub.tx.send(Err(error.clone()));
        }
    }

    /// Number of subscriptions that have not been released
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| !s.tx.is_closed())
            .count()
    }

    /// Number of stored notes across all owners
    pub fn note_count(&self) -> usize {
        self.lock().notes.len()
    }

    fn check_online_auth(inner: &Inner) -> Result<(), AuthError> {
        if inner.offline {
            return Err(AuthError::Network("backend is offline".to_string()));
        }
        Ok(())
    }

    fn check_online_store(inner: &Inner) -> Result<(), StoreError> {
        if inner.offline {
            return Err(StoreError::Network("backend is offline".to_string()));
        }
        Ok(())
    }
}

fn user_for(uid: &str, email: &str) -> User {
    User {
        uid: uid.to_string(),
        email: email.to_string(),
        id_token: String::new(),
    }
}

#[async_trait]
impl AuthService for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut inner = self.lock();
        Self::check_online_auth(&inner)?;

        if !email.contains('@') {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(format!(
                "must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        let key = email.to_lowercase();
        if inner.accounts.contains_key(&key) {
            return Err(AuthError::EmailInUse(email.to_string()));
        }

        let uid = Uuid::new_v4().simple().to_string();
        inner.accounts.insert(
            key,
            Account {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );

        let user = user_for(&uid, email);
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut inner = self.lock();
        Self::check_online_auth(&inner)?;

        let uid = match inner.accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => account.uid.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };

        let user = user_for(&uid, email);
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut inner = self.lock();
        Self::check_online_auth(&inner)?;
        inner.current = None;
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.lock().current.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn add_note(&self, note: &Note) -> Result<String, StoreError> {
        let mut inner = self.lock();
        Self::check_online_store(&inner)?;

        let id = Uuid::new_v4().simple().to_string();
        let stored = Note {
            id: Some(id.clone()),
            ..note.clone()
        };
        inner.notes.insert(id.clone(), stored);
        inner.publish();
        Ok(id)
    }

    async fn set_note(&self, note: &Note) -> Result<(), StoreError> {
        let id = note.id.clone().ok_or(StoreError::MissingId)?;
        let mut inner = self.lock();
        Self::check_online_store(&inner)?;

        inner.notes.insert(id, note.clone());
        inner.publish();
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        Self::check_online_store(&inner)?;

        // Deleting a missing document is not an error, matching the hosted store
        if inner.notes.remove(id).is_some() {
            inner.publish();
        }
        Ok(())
    }

    async fn subscribe(&self, owner_id: &str) -> Result<NoteSubscription, StoreError> {
        let mut inner = self.lock();
        Self::check_online_store(&inner)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;

        // Initial result set, as a snapshot listener delivers on attach
        let _ = tx.send(Ok(inner.snapshot_for(owner_id)));
        inner.subscribers.push(Subscriber {
            id,
            owner_id: owner_id.to_string(),
            tx,
        });
        debug!("Opened subscription {} for owner {}", id, owner_id);

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                inner.subscribers.retain(|s| s.id != id);
                debug!("Released subscription {}", id);
            }
        });

        Ok(NoteSubscription::new(rx, handle))
    }
}

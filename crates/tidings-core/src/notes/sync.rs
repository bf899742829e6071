//! Note sync manager
//!
//! Keeps exactly one live query open for the signed-in user and republishes
//! each snapshot it receives as the current note list. Writes go straight to
//! the document store; their effect shows up through the next snapshot.
//!
//! ## Usage
//!
//! ```ignore
//! let sync = NoteSync::new(store);
//! sync.subscribe(&user).await?;
//! let mut notes = sync.watch_notes();
//! notes.changed().await?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{DocumentStore, Snapshot, SubscriptionHandle};
use super::models::{Note, User};
use crate::error::StoreError;

/// The subscription currently feeding the published list
struct ActiveSubscription {
    owner_id: String,
    handle: SubscriptionHandle,
    pump: JoinHandle<()>,
}

impl ActiveSubscription {
    fn release(mut self) {
        self.handle.cancel();
        self.pump.abort();
    }
}

struct SyncState {
    /// Bumped on every teardown and install; a pump only publishes while
    /// its generation is current
    generation: u64,
    active: Option<ActiveSubscription>,
}

struct Shared {
    state: Mutex<SyncState>,
    notes_tx: watch::Sender<Vec<Note>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Publishes the signed-in user's notes and forwards edits to the store
pub struct NoteSync {
    store: Arc<dyn DocumentStore>,
    shared: Arc<Shared>,
}

impl NoteSync {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (notes_tx, _) = watch::channel(Vec::new());
        Self {
            store,
            shared: Arc::new(Shared {
                state: Mutex::new(SyncState {
                    generation: 0,
                    active: None,
                }),
                notes_tx,
            }),
        }
    }

    /// Current note list
    pub fn notes(&self) -> Vec<Note> {
        self.shared.notes_tx.borrow().clone()
    }

    /// Observe note list changes
    pub fn watch_notes(&self) -> watch::Receiver<Vec<Note>> {
        self.shared.notes_tx.subscribe()
    }

    /// Whether a live query is currently open
    pub fn is_subscribed(&self) -> bool {
        self.shared
            .lock()
            .active
            .as_ref()
            .is_some_and(|a| a.handle.is_active())
    }

    /// Start listening for `user`'s notes, replacing any previous listener
    ///
    /// Returns `StoreError::Cancelled` if `stop` or another `subscribe` ran
    /// while the store was opening the query; the new listener is released
    /// and nothing is installed.
    pub async fn subscribe(&self, user: &User) -> Result<(), StoreError> {
        // Remove any previous listener before attaching a new one
        let requested = {
            let mut state = self.shared.lock();
            state.generation += 1;
            if let Some(previous) = state.active.take() {
                debug!("Releasing subscription for {}", previous.owner_id);
                if previous.owner_id != user.uid {
                    self.shared.notes_tx.send_replace(Vec::new());
                }
                previous.release();
            }
            state.generation
        };

        let subscription = self.store.subscribe(&user.uid).await.map_err(|e| {
            warn!("Error getting notes: {}", e);
            e
        })?;
        let (rx, mut handle) = subscription.into_parts();

        let mut state = self.shared.lock();
        if state.generation != requested {
            debug!(
                "Discarding subscription for {} (superseded while opening)",
                user.uid
            );
            handle.cancel();
            return Err(StoreError::Cancelled);
        }
        state.generation += 1;
        let generation = state.generation;

        let pump = tokio::spawn(pump_snapshots(rx, generation, Arc::clone(&self.shared)));
        state.active = Some(ActiveSubscription {
            owner_id: user.uid.clone(),
            handle,
            pump,
        });
        info!("Listening for notes owned by {}", user.uid);
        Ok(())
    }

    /// Stop listening and clear the published list
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        state.generation += 1;
        if let Some(active) = state.active.take() {
            info!("Stopped listening for notes owned by {}", active.owner_id);
            active.release();
        }
        self.shared.notes_tx.send_replace(Vec::new());
    }

    /// Create a note owned by `owner`, returning its new ID
    pub async fn add_note(
        &self,
        owner: &User,
        title: &str,
        content: &str,
    ) -> Result<String, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        let note = Note::new(&owner.uid, title, content);
        self.store.add_note(&note).await.map_err(|e| {
            warn!("Error adding note: {}", e);
            e
        })
    }

    /// Overwrite a saved note
    pub async fn update_note(&self, note: &Note) -> Result<(), StoreError> {
        if note.id.is_none() {
            return Err(StoreError::MissingId);
        }
        if note.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }

        self.store.set_note(note).await.map_err(|e| {
            warn!("Error updating note: {}", e);
            e
        })
    }

    /// Delete a saved note
    pub async fn delete_note(&self, note: &Note) -> Result<(), StoreError> {
        let Some(ref id) = note.id else {
            return Err(StoreError::MissingId);
        };

        self.store.delete_note(id).await.map_err(|e| {
            warn!("Error deleting note: {}", e);
            e
        })
    }
}

impl Drop for NoteSync {
    fn drop(&mut self) {
        if let Some(active) = self.shared.lock().active.take() {
            active.release();
        }
    }
}

/// Forward snapshots into the published list until the stream ends or the
/// subscription is superseded
async fn pump_snapshots(
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    generation: u64,
    shared: Arc<Shared>,
) {
    while let Some(snapshot) = rx.recv().await {
        match snapshot {
            Ok(notes) => {
                let state = shared.lock();
                if state.generation != generation {
                    break;
                }
                debug!("Received {} notes", notes.len());
                shared.notes_tx.send_replace(notes);
            }
            Err(e) => warn!("Error getting notes: {}", e),
        }
    }
    debug!("Snapshot stream {} ended", generation);
}

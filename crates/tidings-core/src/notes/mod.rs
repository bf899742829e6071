//! Notes client
//!
//! ```text
//! Session ──sign in──▶ NoteSync ──subscribe(uid)──▶ DocumentStore
//!    │                    │ ◀──── full snapshots ─────┘
//!    └──sign out──▶ stop()│
//!                         ▼
//!                   watch::Receiver<Vec<Note>>
//! ```
//!
//! Backends are injected: [`MemoryBackend`] for tests and offline use,
//! [`FirebaseBackend`] for the hosted service.

pub mod backend;
pub mod firebase;
pub mod memory;
pub mod models;
pub mod session;
pub mod sync;

pub use backend::{AuthService, DocumentStore, NoteSubscription, Snapshot, SubscriptionHandle};
pub use firebase::{FirebaseBackend, FirebaseSettings};
pub use memory::MemoryBackend;
pub use models::{Note, SessionState, User};
pub use session::Session;
pub use sync::NoteSync;

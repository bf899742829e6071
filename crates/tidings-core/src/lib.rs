//! Tidings Core Library
//!
//! Client-side state for two small applications:
//!
//! - **Notes**: email/password sign-in, then a live, owner-scoped view of the
//!   user's notes in a hosted document store, with create/update/delete.
//! - **News**: top headlines for a selectable country from a REST API.
//!
//! Backends are passed in as trait objects, so every state holder can be
//! exercised against the in-memory backend or a scripted news source.
//!
//! # Quick Start
//!
//! ```text
//! let backend = MemoryBackend::new();
//! let sync = Arc::new(NoteSync::new(Arc::new(backend.clone())));
//! let session = Session::new(Arc::new(backend), sync);
//!
//! let user = session.sign_in("ada@example.com", "hunter22").await?;
//! session.notes().add_note(&user, "Groceries", "milk").await?;
//!
//! let headlines = Headlines::new(Arc::new(NewsApiClient::from_config(&config)?), Country::default());
//! headlines.change_country(Country::from_code("gb").unwrap());
//! ```
//!
//! # Modules
//!
//! - `notes`: session holder, note sync manager, backend seams
//! - `news`: headlines models, country list, API client, fetch-state holder
//! - `config`: Application configuration
//! - `error`: Typed errors for every async boundary

pub mod config;
pub mod error;
pub mod news;
pub mod notes;

pub use config::{BackendKind, Config};
pub use error::{AuthError, FetchError, StoreError};
pub use news::{Article, Country, FetchOutcome, FetchState, Headlines, NewsApiClient, NewsSource};
pub use notes::{
    AuthService, DocumentStore, FirebaseBackend, FirebaseSettings, MemoryBackend, Note,
    NoteSubscription, NoteSync, Session, SessionState, User,
};

//! Data models for the notes client

use serde::{Deserialize, Serialize};

/// A note owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Note {
    /// Backend-assigned identifier, absent until first persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Identifier of the owning user
    #[serde(rename = "uid")]
    pub owner_id: String,
    /// Note title
    pub title: String,
    /// Free-text body
    pub content: String,
}

impl Note {
    /// Create a note that has not been saved yet
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            owner_id: owner_id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Attach the backend-assigned identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether this note has been persisted
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

/// A signed-in user as reported by the auth service
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Stable user identifier, used as the owner filter
    pub uid: String,
    pub email: String,
    /// Bearer token for document store requests (empty for in-memory auth)
    pub id_token: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Who, if anyone, is signed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(User),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            SessionState::SignedOut => None,
        }
    }
}

/// Sort notes the way the live query orders them (title ascending)
pub fn sort_by_title(notes: &mut [Note]) {
    notes.sort_by(|a, b| a.title.cmp(&b.title));
}

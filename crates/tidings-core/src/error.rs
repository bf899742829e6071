//! Error types
//!
//! Every async boundary returns one of these instead of logging and carrying
//! on, so front ends can render failures uniformly.

use thiserror::Error;

/// Errors from the authentication service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email or password left blank
    #[error("Email and password are required")]
    MissingInput,

    /// Email address is malformed
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    /// Wrong email/password combination or unknown account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account
    #[error("An account already exists for '{0}'")]
    EmailInUse(String),

    /// Password rejected by the service
    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    /// Operation requires a signed-in user
    #[error("No user is signed in")]
    NotSignedIn,

    /// Could not reach the service
    #[error("Network error talking to auth service: {0}")]
    Network(String),

    /// Any other failure reported by the service
    #[error("Auth service error: {0}")]
    Service(String),

    /// Signed in, but the user's notes could not be opened
    #[error("Could not load notes: {0}")]
    Notes(#[from] StoreError),
}

impl AuthError {
    /// Whether trying again later might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Network(_) => true,
            AuthError::Notes(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Errors from the document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Update or delete on a note that was never persisted
    #[error("Note has no ID; it has not been saved yet")]
    MissingId,

    /// Notes must have a title
    #[error("Note title cannot be empty")]
    EmptyTitle,

    /// Write or query rejected by security rules
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Document does not exist
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Could not reach the store
    #[error("Network error talking to document store: {0}")]
    Network(String),

    /// A document could not be decoded into a note
    #[error("Invalid note document: {0}")]
    Decode(String),

    /// Any other failure reported by the store
    #[error("Document store error: {0}")]
    Service(String),

    /// Listener was stopped or replaced before it finished opening
    #[error("Subscription cancelled before it started")]
    Cancelled,
}

impl StoreError {
    /// Whether trying again later might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }
}

/// Errors from fetching headlines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// No API key configured
    #[error("News API key not configured")]
    MissingApiKey,

    /// The request URL could not be built
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Transport failure
    #[error("Failed to fetch articles: {0}")]
    Network(String),

    /// The API answered with an error status
    #[error("News API error ({code}): {message}")]
    Api { code: String, message: String },

    /// The body was not a valid headlines response
    #[error("Failed to decode articles: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether trying again later might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Api { code, .. } => code == "rateLimited",
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

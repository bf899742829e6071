//! Session holder
//!
//! Tracks who is signed in and drives the note sync manager: signing in
//! opens the user's live query, signing out closes it and clears the list so
//! nothing from one account is visible to the next.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::backend::AuthService;
use super::models::{SessionState, User};
use super::sync::NoteSync;
use crate::error::{AuthError, StoreError};

pub struct Session {
    auth: Arc<dyn AuthService>,
    sync: Arc<NoteSync>,
    state_tx: watch::Sender<SessionState>,
}

impl Session {
    /// Create a session, picking up a user the auth service already knows
    pub fn new(auth: Arc<dyn AuthService>, sync: Arc<NoteSync>) -> Self {
        let initial = match auth.current_user() {
            Some(user) => SessionState::SignedIn(user),
            None => SessionState::SignedOut,
        };
        let (state_tx, _) = watch::channel(initial);
        Self {
            auth,
            sync,
            state_tx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Observe sign-in/sign-out transitions
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state_tx.borrow().is_signed_in()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state_tx.borrow().user().cloned()
    }

    pub fn notes(&self) -> &Arc<NoteSync> {
        &self.sync
    }

    /// Open the note listener for a user restored at construction
    pub async fn resume(&self) -> Result<(), StoreError> {
        match self.current_user() {
            Some(user) => self.sync.subscribe(&user).await,
            None => Ok(()),
        }
    }

    /// Create an account and sign in as it
    ///
    /// Fails with `AuthError::Notes` if the account was created but its
    /// notes could not be opened; the session is signed out again.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate_credentials(email, password)?;
        let result = match self.auth.sign_up(email.trim(), password).await {
            Ok(user) => self.signed_in(user).await,
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            warn!("Sign up error: {}", e);
        }
        result
    }

    /// Sign in to an existing account
    ///
    /// Fails with `AuthError::Notes` if the user's notes could not be
    /// opened; the session is signed out again.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        validate_credentials(email, password)?;
        let result = match self.auth.sign_in(email.trim(), password).await {
            Ok(user) => self.signed_in(user).await,
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            warn!("Sign in error: {}", e);
        }
        result
    }

    /// Sign out, tearing down the note listener
    ///
    /// If the auth service refuses, the session stays signed in.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.auth.sign_out().await {
            warn!("Sign out error: {}", e);
            return Err(e);
        }

        self.sync.stop();
        self.state_tx.send_replace(SessionState::SignedOut);
        info!("Signed out");
        Ok(())
    }

    async fn signed_in(&self, user: User) -> Result<User, AuthError> {
        info!("Signed in as {}", user.email);
        self.state_tx
            .send_replace(SessionState::SignedIn(user.clone()));

        if let Err(e) = self.sync.subscribe(&user).await {
            self.roll_back(&user).await;
            return Err(AuthError::Notes(e));
        }
        Ok(user)
    }

    /// Undo a sign-in whose notes never opened, unless the session has
    /// already moved on
    async fn roll_back(&self, user: &User) {
        let still_current = self.state_tx.send_if_modified(|state| match state.user() {
            Some(current) if current.uid == user.uid => {
                *state = SessionState::SignedOut;
                true
            }
            _ => false,
        });
        if still_current {
            if let Err(e) = self.auth.sign_out().await {
                warn!("Sign out after failed sign in: {}", e);
            }
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AuthError::MissingInput);
    }
    Ok(())
}

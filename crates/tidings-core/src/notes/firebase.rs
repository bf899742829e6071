//! Firebase backend over REST
//!
//! Authentication uses the Identity Toolkit email/password endpoints and
//! notes live in a Cloud Firestore `notes` collection.
//!
//! The REST API has no push channel, so a live query is emulated: the
//! initial query runs inside `subscribe` (so permission problems surface as
//! an error), then a background task re-runs it every poll interval and
//! pushes a snapshot whenever the result set changes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::backend::{AuthService, DocumentStore, NoteSubscription, Snapshot, SubscriptionHandle};
use super::models::{Note, User};
use crate::config::Config;
use crate::error::{AuthError, StoreError};

const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firestore collection holding notes
const COLLECTION: &str = "notes";

/// Connection settings for a Firebase project
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub project_id: String,
    pub auth_url: String,
    pub firestore_url: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl FirebaseSettings {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            firestore_url: DEFAULT_FIRESTORE_URL.to_string(),
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }

    /// Point both services somewhere else (emulators, test servers)
    pub fn with_endpoints(mut self, auth_url: &str, firestore_url: &str) -> Self {
        self.auth_url = auth_url.trim_end_matches('/').to_string();
        self.firestore_url = firestore_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build settings from the application configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.firebase_api_key.clone().context(
            "Firebase API key not configured. Set it with:\n  \
             tidings config set firebase_api_key <key>",
        )?;
        let project_id = config.firebase_project_id.clone().context(
            "Firebase project not configured. Set it with:\n  \
             tidings config set firebase_project_id <project>",
        )?;

        let mut settings = Self::new(api_key, project_id);
        settings.poll_interval = config.poll_interval();
        settings.timeout = config.request_timeout();
        Ok(settings)
    }

    fn documents_path(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url, self.project_id
        )
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    email: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    string_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<FirestoreDocument>,
}

impl FirestoreDocument {
    fn into_note(mut self) -> Result<Note, StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("bad document name '{}'", self.name)))?
            .to_string();

        let mut field = |key: &str| {
            self.fields
                .remove(key)
                .and_then(|v| v.string_value)
                .ok_or_else(|| StoreError::Decode(format!("document {} has no '{}'", id, key)))
        };

        let owner_id = field("uid")?;
        let title = field("title")?;
        let content = field("content")?;
        Ok(Note {
            id: Some(id),
            owner_id,
            title,
            content,
        })
    }
}

fn note_fields(note: &Note) -> Value {
    json!({
        "fields": {
            "uid": { "stringValue": note.owner_id },
            "title": { "stringValue": note.title },
            "content": { "stringValue": note.content },
        }
    })
}

fn notes_query(owner_id: &str) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": COLLECTION }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": "uid" },
                    "op": "EQUAL",
                    "value": { "stringValue": owner_id }
                }
            },
            "orderBy": [{
                "field": { "fieldPath": "title" },
                "direction": "ASCENDING"
            }]
        }
    })
}

/// Read the service's error message out of a failed response
async fn error_detail(response: Response) -> (StatusCode, String, Option<String>) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => (status, parsed.error.message, parsed.error.status),
        Err(_) => (status, body, None),
    }
}

fn auth_error(message: &str, email: &str) -> AuthError {
    // Messages look like "WEAK_PASSWORD : Password should be at least 6 characters"
    let (code, detail) = match message.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse(email.to_string()),
        "INVALID_EMAIL" => AuthError::InvalidEmail(email.to_string()),
        "WEAK_PASSWORD" => AuthError::WeakPassword(detail.to_string()),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        "MISSING_PASSWORD" | "MISSING_EMAIL" => AuthError::MissingInput,
        _ => AuthError::Service(message.to_string()),
    }
}

fn store_error(status: StatusCode, message: String, code: Option<String>) -> StoreError {
    match (status, code.as_deref()) {
        (StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED, _) | (_, Some("PERMISSION_DENIED")) => {
            StoreError::PermissionDenied(message)
        }
        (StatusCode::NOT_FOUND, _) | (_, Some("NOT_FOUND")) => StoreError::NotFound(message),
        _ => StoreError::Service(format!("{} ({})", message, status)),
    }
}

// ============================================================================
// FirebaseBackend
// ============================================================================

/// Firebase Auth + Firestore, implementing [`AuthService`] and [`DocumentStore`]
#[derive(Clone)]
pub struct FirebaseBackend {
    http: Client,
    settings: Arc<FirebaseSettings>,
    user: Arc<RwLock<Option<User>>>,
}

impl FirebaseBackend {
    pub fn new(settings: FirebaseSettings) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            settings: Arc::new(settings),
            user: Arc::new(RwLock::new(None)),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let user = self.user.read().unwrap_or_else(|e| e.into_inner());
        match user.as_ref() {
            // TODO: refresh the ID token through securetoken.googleapis.com once it
            // expires (one hour after sign-in)
            Some(user) if !user.id_token.is_empty() => request.bearer_auth(&user.id_token),
            _ => request,
        }
    }

    async fn password_auth(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let url = format!("{}/accounts:{}", self.settings.auth_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let (_, message, _) = error_detail(response).await;
            return Err(auth_error(&message, email));
        }

        let body: AuthResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Service(format!("unexpected auth response: {}", e)))?;

        let user = User {
            uid: body.local_id,
            email: body.email,
            id_token: body.id_token,
        };
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());
        Ok(user)
    }

    /// Run the owner-filtered, title-ordered query once
    pub async fn query_notes(&self, owner_id: &str) -> Result<Vec<Note>, StoreError> {
        let url = format!("{}:runQuery", self.settings.documents_path());
        let response = self
            .authorized(self.http.post(&url))
            .json(&notes_query(owner_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, message, code) = error_detail(response).await;
            return Err(store_error(status, message, code));
        }

        let items: Vec<RunQueryItem> = response.json().await?;
        let notes = items
            .into_iter()
            .filter_map(|item| item.document)
            .filter_map(|doc| match doc.into_note() {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!("Skipping document: {}", e);
                    None
                }
            })
            .collect();
        Ok(notes)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let (status, message, code) = error_detail(response).await;
            Err(store_error(status, message, code))
        }
    }
}

#[async_trait]
impl AuthService for FirebaseBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self.password_auth("signUp", email, password).await?;
        info!("Created account {}", user.email);
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.password_auth("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // ID tokens are bearer tokens; signing out just forgets it
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl DocumentStore for FirebaseBackend {
    async fn add_note(&self, note: &Note) -> Result<String, StoreError> {
        let url = format!("{}/{}", self.settings.documents_path(), COLLECTION);
        let response = self
            .authorized(self.http.post(&url))
            .json(&note_fields(note))
            .send()
            .await?;

        let doc: FirestoreDocument = Self::check(response).await?.json().await?;
        let created = doc.into_note()?;
        created.id.ok_or(StoreError::MissingId)
    }

    async fn set_note(&self, note: &Note) -> Result<(), StoreError> {
        let id = note.id.as_deref().ok_or(StoreError::MissingId)?;
        let url = format!("{}/{}/{}", self.settings.documents_path(), COLLECTION, id);
        let response = self
            .authorized(self.http.patch(&url))
            .json(&note_fields(note))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_note(&self, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}/{}", self.settings.documents_path(), COLLECTION, id);
        let response = self.authorized(self.http.delete(&url)).send().await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn subscribe(&self, owner_id: &str) -> Result<NoteSubscription, StoreError> {
        let initial = self.query_notes(owner_id).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(Ok(initial.clone()));

        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(poll_notes(
            self.clone(),
            owner_id.to_string(),
            initial,
            tx,
            stop_rx,
        ));

        let handle = SubscriptionHandle::new(move || {
            let _ = stop_tx.send(());
        });
        Ok(NoteSubscription::new(rx, handle))
    }
}

/// Background task that re-runs the query until the subscription is released
async fn poll_notes(
    backend: FirebaseBackend,
    owner_id: String,
    mut last: Vec<Note>,
    tx: mpsc::UnboundedSender<Snapshot>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let interval = backend.settings.poll_interval;
    debug!("Polling notes for {} every {:?}", owner_id, interval);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = &mut stop_rx => break,
        }

        let result = tokio::select! {
            result = backend.query_notes(&owner_id) => result,
            _ = &mut stop_rx => break,
        };

        let sent = match result {
            Ok(notes) if notes == last => continue,
            Ok(notes) => {
                last = notes.clone();
                tx.send(Ok(notes))
            }
            Err(e) => tx.send(Err(e)),
        };
        if sent.is_err() {
            break;
        }
    }

    debug!("Stopped polling notes for {}", owner_id);
}

//! FirebaseBackend against mocked Identity Toolkit and Firestore endpoints

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

use tidings_core::{AuthError, AuthService, DocumentStore, Note, NoteSync, Session, StoreError};

use crate::common;

#[tokio::test]
async fn test_sign_in_stores_token() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("POST"))
        .and(path("/identity/accounts:signInWithPassword"))
        .and(query_param("key", common::API_KEY))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "returnSecureToken": true
        })))
        .respond_with(common::auth_success("uid-1", "ada@example.com", "tok-1"))
        .mount(&server)
        .await;

    let user = backend.sign_in("ada@example.com", "hunter22").await.unwrap();
    assert_eq!(user.uid, "uid-1");
    assert_eq!(backend.current_user(), Some(user));

    backend.sign_out().await.unwrap();
    assert!(backend.current_user().is_none());
}

#[tokio::test]
async fn test_auth_errors_are_typed() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("POST"))
        .and(path("/identity/accounts:signInWithPassword"))
        .respond_with(common::auth_failure("INVALID_LOGIN_CREDENTIALS"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/accounts:signUp"))
        .respond_with(common::auth_failure("EMAIL_EXISTS"))
        .mount(&server)
        .await;

    assert_eq!(
        backend.sign_in("ada@example.com", "wrong").await,
        Err(AuthError::InvalidCredentials)
    );
    assert_eq!(
        backend.sign_up("ada@example.com", "hunter22").await,
        Err(AuthError::EmailInUse("ada@example.com".to_string()))
    );
    assert!(backend.current_user().is_none());
}

#[tokio::test]
async fn test_add_note_returns_document_id() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents/notes$"))
        .and(body_partial_json(json!({
            "fields": { "title": { "stringValue": "Groceries" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::note_document(
            "new-id", "uid-1", "Groceries", "milk",
        )))
        .mount(&server)
        .await;

    let id = backend
        .add_note(&Note::new("uid-1", "Groceries", "milk"))
        .await
        .unwrap();
    assert_eq!(id, "new-id");
}

#[tokio::test]
async fn test_set_and_delete_use_document_path() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/notes/abc$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::note_document(
            "abc", "uid-1", "Edited", "",
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"/documents/notes/abc$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let note = Note::new("uid-1", "Edited", "").with_id("abc");
    backend.set_note(&note).await.unwrap();
    backend.delete_note("abc").await.unwrap();

    assert_eq!(
        backend.set_note(&Note::new("uid-1", "x", "")).await,
        Err(StoreError::MissingId)
    );
}

#[tokio::test]
async fn test_permission_denied_on_subscribe() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "Missing or insufficient permissions.",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&server)
        .await;

    let err = backend.subscribe("uid-1").await.unwrap_err();
    assert!(matches!(err, StoreError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_subscription_pushes_changes() {
    let (server, backend) = common::firebase_backend().await;
    // First query sees one note, every later poll sees two
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::query_result(vec![
            common::note_document("a", "uid-1", "alpha", ""),
        ])))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::query_result(vec![
            common::note_document("a", "uid-1", "alpha", ""),
            common::note_document("b", "uid-1", "beta", ""),
        ])))
        .mount(&server)
        .await;

    let mut sub = backend.subscribe("uid-1").await.unwrap();
    let first = sub.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);

    let second = tokio::time::timeout(Duration::from_secs(2), sub.next())
        .await
        .expect("no second snapshot")
        .unwrap()
        .unwrap();
    let titles: Vec<_> = second.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["alpha", "beta"]);

    assert!(sub.cancel());
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn test_session_over_firebase() {
    let (server, backend) = common::firebase_backend().await;
    Mock::given(method("POST"))
        .and(path("/identity/accounts:signInWithPassword"))
        .respond_with(common::auth_success("uid-1", "ada@example.com", "tok-1"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "where": { "fieldFilter": { "value": { "stringValue": "uid-1" } } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::query_result(vec![
            common::note_document("a", "uid-1", "alpha", "first"),
        ])))
        .mount(&server)
        .await;

    let sync = Arc::new(NoteSync::new(Arc::new(backend.clone())));
    let session = Session::new(Arc::new(backend), Arc::clone(&sync));

    session.sign_in("ada@example.com", "hunter22").await.unwrap();
    assert!(sync.is_subscribed());

    let mut rx = sync.watch_notes();
    tokio::time::timeout(Duration::from_secs(2), async {
        while rx.borrow_and_update().is_empty() {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("notes never arrived");
    assert_eq!(sync.notes()[0].content, "first");

    session.sign_out().await.unwrap();
    assert!(sync.notes().is_empty());
    assert!(!sync.is_subscribed());
}

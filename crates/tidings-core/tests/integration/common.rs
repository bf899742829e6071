//! Shared helpers for the integration tests

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tidings_core::{FirebaseBackend, FirebaseSettings, NewsApiClient};

pub const API_KEY: &str = "test-key";
pub const PROJECT: &str = "demo";

/// A well-formed article as the headlines API returns it
pub fn article_json(title: &str) -> Value {
    json!({
        "source": { "id": "the-verge", "name": "The Verge" },
        "author": "Jane Doe",
        "title": title,
        "description": "Something happened",
        "url": format!("https://example.com/{}", title.replace(' ', "-")),
        "urlToImage": null,
        "publishedAt": "2024-03-01T08:00:00Z"
    })
}

/// Mount a top-headlines response for one country
pub async fn mount_headlines(server: &MockServer, country: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("country", country))
        .and(query_param("apiKey", API_KEY))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn news_client() -> (MockServer, NewsApiClient) {
    let server = MockServer::start().await;
    let client = NewsApiClient::new(server.uri(), API_KEY, Duration::from_secs(5))
        .expect("client should build");
    (server, client)
}

/// Firebase backend pointed at a mock server
///
/// Auth endpoints live under `/identity`, Firestore under `/firestore`.
pub async fn firebase_backend() -> (MockServer, FirebaseBackend) {
    let server = MockServer::start().await;
    let settings = FirebaseSettings::new(API_KEY, PROJECT)
        .with_endpoints(
            &format!("{}/identity", server.uri()),
            &format!("{}/firestore", server.uri()),
        )
        .with_poll_interval(Duration::from_millis(50));
    let backend = FirebaseBackend::new(settings).expect("backend should build");
    (server, backend)
}

/// A Firestore document in REST form
pub fn note_document(id: &str, uid: &str, title: &str, content: &str) -> Value {
    json!({
        "name": format!("projects/{}/databases/(default)/documents/notes/{}", PROJECT, id),
        "fields": {
            "uid": { "stringValue": uid },
            "title": { "stringValue": title },
            "content": { "stringValue": content }
        },
        "createTime": "2024-03-01T08:00:00Z",
        "updateTime": "2024-03-01T08:00:00Z"
    })
}

/// A runQuery response body
pub fn query_result(documents: Vec<Value>) -> Value {
    if documents.is_empty() {
        return json!([{ "readTime": "2024-03-01T08:00:00Z" }]);
    }
    Value::Array(
        documents
            .into_iter()
            .map(|doc| json!({ "document": doc, "readTime": "2024-03-01T08:00:00Z" }))
            .collect(),
    )
}

pub fn auth_success(uid: &str, email: &str, token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "kind": "identitytoolkit#VerifyPasswordResponse",
        "localId": uid,
        "email": email,
        "idToken": token,
        "refreshToken": "refresh",
        "expiresIn": "3600"
    }))
}

pub fn auth_failure(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": { "code": 400, "message": message, "errors": [] }
    }))
}

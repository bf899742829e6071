//! NewsApiClient against a mocked headlines endpoint

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use tidings_core::{Country, FetchError, NewsApiClient, NewsSource};

use crate::common;

#[tokio::test]
async fn test_top_headlines_decodes_articles() {
    let (server, client) = common::news_client().await;
    common::mount_headlines(
        &server,
        "us",
        200,
        json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [common::article_json("first"), common::article_json("second")]
        }),
    )
    .await;

    let response = client
        .top_headlines(&Country::default())
        .await
        .expect("request should succeed");

    assert_eq!(response.total_results, 2);
    assert_eq!(response.articles.len(), 2);
    assert_eq!(response.articles[0].title, "first");
    assert_eq!(response.articles[0].source.id.as_deref(), Some("the-verge"));
    assert!(response.articles[0].url_to_image.is_none());
}

#[tokio::test]
async fn test_sends_fixed_search_term() {
    let (server, client) = common::news_client().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok", "totalResults": 0, "articles": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .with_query("rust")
        .top_headlines(&Country::default())
        .await
        .unwrap();
    assert!(response.articles.is_empty());
}

#[tokio::test]
async fn test_missing_title_is_decode_error() {
    let (server, client) = common::news_client().await;
    let mut broken = common::article_json("x");
    broken.as_object_mut().unwrap().remove("title");
    common::mount_headlines(
        &server,
        "us",
        200,
        json!({ "status": "ok", "totalResults": 1, "articles": [broken] }),
    )
    .await;

    let err = client.top_headlines(&Country::default()).await.unwrap_err();
    match err {
        FetchError::Decode(message) => assert!(message.contains("title")),
        other => panic!("expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_body_is_surfaced() {
    let (server, client) = common::news_client().await;
    common::mount_headlines(
        &server,
        "us",
        401,
        json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        }),
    )
    .await;

    let err = client.top_headlines(&Country::default()).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Api {
            code: "apiKeyInvalid".to_string(),
            message: "Your API key is invalid or incorrect.".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on port 1
    let client = NewsApiClient::new("http://127.0.0.1:1", common::API_KEY, Duration::from_secs(2))
        .unwrap();

    let err = client.top_headlines(&Country::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
    assert!(err.is_retryable());
}

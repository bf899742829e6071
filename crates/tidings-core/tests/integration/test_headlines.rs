//! Headlines state holder driven by the real client

use std::sync::Arc;

use serde_json::json;

use tidings_core::{Country, FetchOutcome, FetchState, Headlines};

use crate::common;

#[tokio::test]
async fn test_change_country_loads_that_country() {
    let (server, client) = common::news_client().await;
    common::mount_headlines(
        &server,
        "gb",
        200,
        json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [common::article_json("london")]
        }),
    )
    .await;

    let headlines = Headlines::new(Arc::new(client), Country::default());
    let gb = Country::from_code("gb").unwrap();

    let handle = headlines.change_country(gb);
    assert!(headlines.state().is_loading());

    assert_eq!(handle.await.unwrap(), Ok(FetchOutcome::Applied(1)));
    let state = headlines.state();
    assert_eq!(state.articles()[0].title, "london");
    assert_eq!(headlines.selected_country(), gb);
}

#[tokio::test]
async fn test_empty_result_has_no_error() {
    let (server, client) = common::news_client().await;
    common::mount_headlines(
        &server,
        "us",
        200,
        json!({ "status": "ok", "totalResults": 0, "articles": [] }),
    )
    .await;

    let headlines = Headlines::new(Arc::new(client), Country::default());
    headlines.refresh().await.unwrap().unwrap();

    assert_eq!(headlines.state(), FetchState::Loaded(Vec::new()));
}

#[tokio::test]
async fn test_malformed_response_fails_and_clears() {
    let (server, client) = common::news_client().await;
    common::mount_headlines(
        &server,
        "us",
        200,
        json!({ "status": "ok", "totalResults": 1, "articles": [common::article_json("fine")] }),
    )
    .await;
    let mut broken = common::article_json("broken");
    broken.as_object_mut().unwrap().remove("title");
    common::mount_headlines(
        &server,
        "de",
        200,
        json!({ "status": "ok", "totalResults": 1, "articles": [broken] }),
    )
    .await;

    let headlines = Headlines::new(Arc::new(client), Country::default());
    headlines.refresh().await.unwrap().unwrap();
    assert_eq!(headlines.state().articles().len(), 1);

    let result = headlines
        .change_country(Country::from_code("de").unwrap())
        .await
        .unwrap();
    assert!(result.is_err());

    let state = headlines.state();
    let message = state.error().expect("should be in error state");
    assert!(!message.is_empty());
    assert!(state.articles().is_empty());
}

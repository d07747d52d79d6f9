//! Integration tests for concurrent execution with partial failures.

use ebaysdk::{ConnectionOptions, EbayError, Parallel, auth::StaticToken, browse, finding};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn options(server: &ServerGuard) -> ConnectionOptions {
    ConnectionOptions::new()
        .without_config_file()
        .domain(server.host_with_port())
        .https(false)
}

#[tokio::test]
async fn test_one_failure_does_not_abort_the_others() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::UrlEncoded("q".into(), "ok".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total":1,"itemSummaries":[{"itemId":"v1|1|0"}]}"#)
        .expect(3)
        .create_async()
        .await;
    let failing = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::UrlEncoded("q".into(), "boom".into()))
        .with_status(500)
        .create_async()
        .await;

    let api = browse::Connection::new(options(&server))
        .expect("should build connection")
        .with_token_provider(StaticToken::new("app-token"));

    let mut parallel = Parallel::new().with_max_in_flight(2);
    for query in ["ok", "boom", "ok", "ok"] {
        parallel.add(&api, "search", &json!({ "q": query })).expect("params are valid");
    }
    assert_eq!(parallel.len(), 4);

    let results = parallel.wait().await;
    assert_eq!(results.len(), 4);
    assert_eq!(results.successes().count(), 3);

    let failures = results.failures().collect::<Vec<_>>();
    assert_eq!(failures.len(), 1);
    let (index, error) = failures[0];
    assert_eq!(index, 1);
    assert!(error.is_connection_error());
    assert_eq!(error.response().map(ebaysdk::Response::status_code), Some(500));
    assert_eq!(results.error().as_deref(), Some("search: Internal Server Error"));

    for slot in [0, 2, 3] {
        let response = results.get(slot).expect("slot exists").as_ref().expect("slot succeeded");
        assert_eq!(response.reply()["total"].as_i64(), Some(1));
    }

    ok.assert_async().await;
    failing.assert_async().await;
}

#[tokio::test]
async fn test_mixed_families_keep_input_order() {
    let mut server = Server::new_async().await;
    let _finding = server
        .mock("POST", "/services/search/FindingService/v1")
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(
            "<getVersionResponse><ack>Success</ack><version>1.13.0</version></getVersionResponse>",
        )
        .create_async()
        .await;
    let _browse = server
        .mock("GET", "/buy/browse/v1/item/get_item_by_legacy_id")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"itemId":"v1|9|0"}"#)
        .create_async()
        .await;

    let finding = finding::Connection::new(options(&server)).expect("should build connection");
    let browse = browse::Connection::new(options(&server))
        .expect("should build connection")
        .with_token_provider(StaticToken::new("app-token"));

    let mut parallel = Parallel::new();
    let first = parallel.add(&finding, "getVersion", &()).expect("valid");
    let second = parallel
        .add(&browse, "getItemByLegacyId", &json!({ "legacy_item_id": "9" }))
        .expect("valid");
    let third = parallel.add(&browse, "search", &json!({ "q": "x" })).expect("valid");
    assert_eq!((first, second, third), (0, 1, 2));

    let results = parallel.wait().await.into_inner();
    let verbs = results
        .iter()
        .map(|r| r.as_ref().map(|resp| resp.verb().to_owned()).ok())
        .collect::<Vec<_>>();
    assert_eq!(
        verbs,
        vec![Some("getVersion".to_owned()), Some("getItemByLegacyId".to_owned()), None]
    );
    // no mock matches the search query
    assert!(matches!(&results[2], Err(EbayError::ConnectionError { .. })));
}

#[tokio::test]
async fn test_request_errors_fill_their_slot() {
    let server = Server::new_async().await;
    let api = browse::Connection::new(options(&server)).expect("should build connection");

    let mut parallel = Parallel::new();
    parallel.add(&api, "search", &json!({ "q": "x" })).expect("valid");
    parallel.add(&api, "noSuchCall", &json!({})).expect("valid");

    let results = parallel.wait().await;
    assert!(matches!(results.get(0), Some(Err(EbayError::Auth(_)))));
    assert!(matches!(results.get(1), Some(Err(EbayError::UnsupportedCall { .. }))));
    assert_eq!(results.error().map(|e| e.lines().count()), Some(2));
}

#[tokio::test]
async fn test_invalid_params_rejected_on_add() {
    let server = Server::new_async().await;
    let api = finding::Connection::new(options(&server)).expect("should build connection");

    let mut parallel = Parallel::new();
    let err = parallel.add(&api, "getVersion", &json!("not a map")).expect_err("scalar params");
    assert!(matches!(err, EbayError::InvalidParameter(_)));
    assert!(parallel.is_empty());
    assert!(parallel.wait().await.is_empty());
}

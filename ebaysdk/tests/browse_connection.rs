//! Integration tests for the Browse API against a local mock server.

use ebaysdk::{ConnectionOptions, EbayError, auth::StaticToken, browse};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn connection(server: &ServerGuard) -> browse::Connection {
    let options = ConnectionOptions::new()
        .without_config_file()
        .domain(server.host_with_port())
        .https(false);
    browse::Connection::new(options)
        .expect("should build connection")
        .with_token_provider(StaticToken::new("app-token"))
}

#[tokio::test]
async fn test_search_returns_json_unchanged() {
    let mut server = Server::new_async().await;
    let body = json!({
        "href": "https://api.ebay.com/buy/browse/v1/item_summary/search?q=drone&limit=2",
        "total": 2,
        "itemSummaries": [
            {
                "itemId": "v1|1|0",
                "title": "Drone A",
                "price": { "value": "10.00", "currency": "USD" }
            },
            {
                "itemId": "v1|2|0",
                "title": "Drone B",
                "price": { "value": "12.50", "currency": "USD" }
            }
        ]
    });
    let mock = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "drone".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ]))
        .match_header("authorization", "Bearer app-token")
        .match_header("x-ebay-c-marketplace-id", "EBAY_US")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let mut api = connection(&server);
    let response = api
        .execute("search", &json!({ "q": "drone", "limit": 2 }))
        .await
        .expect("search should succeed");

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json().expect("body is JSON"), body);
    assert_eq!(response.reply()["itemSummaries"][1]["title"].as_str(), Some("Drone B"));
    assert_eq!(
        response.reply().get("itemSummaries.0.price.value").and_then(|v| v.as_str()),
        Some("10.00")
    );
    assert!(response.error().is_none());
    assert!(api.error().is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_item_uses_item_id_in_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex(r"^/buy/browse/v1/item/v1(\||%7C)42(\||%7C)0$".to_owned()))
        .match_query(Matcher::UrlEncoded("fieldgroups".into(), "PRODUCT".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"itemId":"v1|42|0","title":"Lego set"}"#)
        .create_async()
        .await;

    let mut api = connection(&server);
    let response = api
        .execute("getItem", &json!({ "item_id": "v1|42|0", "fieldgroups": "PRODUCT" }))
        .await
        .expect("getItem should succeed");

    assert_eq!(response.reply()["title"].as_str(), Some("Lego set"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_check_compatibility_posts_json_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/buy/browse/v1/item/123/check_compatibility")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "compatibilityProperties": [{ "name": "Year", "value": "2019" }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"compatibilityStatus":"COMPATIBLE"}"#)
        .create_async()
        .await;

    let mut api = connection(&server);
    let response = api
        .execute(
            "checkCompatibility",
            &json!({
                "item_id": 123,
                "compatibilityProperties": [{ "name": "Year", "value": "2019" }]
            }),
        )
        .await
        .expect("checkCompatibility should succeed");

    assert_eq!(response.reply()["compatibilityStatus"].as_str(), Some("COMPATIBLE"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_carries_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors":[{"errorId":11001,"category":"REQUEST","message":"Not found"}]}"#)
        .create_async()
        .await;

    let mut api = connection(&server);
    let err = api
        .execute("search", &json!({ "q": "nothing" }))
        .await
        .expect_err("404 should fail");

    assert!(err.is_connection_error());
    let response = err.response().expect("error should carry the response");
    assert_eq!(response.status_code(), 404);
    // body errors are only read from 200 responses
    assert!(response.errors().is_empty());
    assert_eq!(response.error().as_deref(), Some("search: Not Found"));

    let stored = api.response().expect("failed response is kept");
    assert_eq!(stored.status_code(), 404);
    assert_eq!(api.error().as_deref(), Some("search: Not Found"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_errors_disabled_returns_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("")
        .create_async()
        .await;

    let options = ConnectionOptions::new()
        .without_config_file()
        .domain(server.host_with_port())
        .https(false)
        .errors(false);
    let mut api = browse::Connection::new(options)
        .expect("should build connection")
        .with_token_provider(StaticToken::new("app-token"));

    let response = api.execute("search", &json!({ "q": "x" })).await.expect("errors are off");
    assert_eq!(response.status_code(), 500);
    assert_eq!(response.error().as_deref(), Some("search: Internal Server Error"));
}

#[tokio::test]
async fn test_body_errors_on_200() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/buy/browse/v1/item_summary/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"errors":[{"errorId":12001,"category":"REQUEST","message":"Invalid filter"}],
                "warnings":[{"errorId":12500,"category":"REQUEST","message":"Ignored field"}]}"#,
        )
        .create_async()
        .await;

    let mut api = connection(&server);
    let err = api.execute("search", &json!({ "q": "x" })).await.expect_err("body error fails");

    let response = err.response().expect("response attached");
    assert_eq!(response.errors(), ["Category: REQUEST, Code: 12001, Invalid filter"]);
    assert_eq!(response.warnings(), ["Category: REQUEST, Code: 12500, Ignored field"]);
    assert_eq!(response.response_codes(), ["12001", "12500"]);
    assert_eq!(
        err.to_string(),
        "search: Category: REQUEST, Code: 12001, Invalid filter"
    );
}

#[tokio::test]
async fn test_missing_token_fails_before_io() {
    let server = Server::new_async().await;
    let options = ConnectionOptions::new()
        .without_config_file()
        .domain(server.host_with_port())
        .https(false);
    let mut api = browse::Connection::new(options).expect("should build connection");

    let err = api.execute("search", &json!({ "q": "x" })).await.expect_err("no token");
    assert!(matches!(err, EbayError::Auth(_)));
    assert!(api.response().is_none());
}

#[tokio::test]
async fn test_unknown_call() {
    let server = Server::new_async().await;
    let options = ConnectionOptions::new().without_config_file().domain(server.host_with_port());
    let mut api = browse::Connection::new(options)
        .expect("should build connection")
        .with_token_provider(StaticToken::new("t"));

    let err = api.execute("findItemsAdvanced", &json!({})).await.expect_err("unknown call");
    assert!(matches!(err, EbayError::UnsupportedCall { api: "Browse", .. }));
}

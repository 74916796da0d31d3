//! Integration tests for the Kraken REST backfill against a mock server

use rust_decimal::dec;
use trades::kraken::KrakenRestClient;
use trades::TradeSource;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NANOS_PER_SEC: i64 = 1_000_000_000;

fn now_ns() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64
}

#[tokio::test]
async fn fetches_a_page_and_advances_the_cursor() {
    let server = MockServer::start().await;
    let now = now_ns();
    // Cursor one hour before now: the client should keep paging this pair.
    let mid_cursor = now - 3600 * NANOS_PER_SEC;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pair", "BTC/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": [],
            "result": {
                "BTC/USD": [
                    ["30243.4", "0.001", 1688669597.8, "b", "m", "", 1],
                    ["30244.1", "0.25", 1688669600.0, "s", "l", "", 2]
                ],
                "last": mid_cursor.to_string()
            }
        })))
        .mount(&server)
        .await;

    let mut client =
        KrakenRestClient::with_base_url(&server.uri(), vec!["BTC/USD".into()], 1, now);

    let trades = client.get_trades().await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].pair, "BTC/USD");
    assert_eq!(trades[0].price, dec!(30243.4));
    assert_eq!(trades[1].quantity, dec!(0.25));
    assert!(!client.is_done());
}

#[tokio::test]
async fn rotates_through_pairs_and_finishes() {
    let server = MockServer::start().await;
    let now = now_ns();
    // A cursor at `now` ends the current pair immediately.
    let caught_up = now.to_string();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": [],
            "result": {
                "BTC/USD": [["100.0", "1.0", 1688669597.8, "b", "m", "", 1]],
                "ETH/USD": [["200.0", "2.0", 1688669598.8, "s", "l", "", 2]],
                "last": caught_up
            }
        })))
        .mount(&server)
        .await;

    let mut client = KrakenRestClient::with_base_url(
        &server.uri(),
        vec!["BTC/USD".into(), "ETH/USD".into()],
        1,
        now,
    );

    let first = client.get_trades().await.unwrap();
    assert_eq!(first[0].pair, "BTC/USD");
    assert!(!client.is_done());

    let second = client.get_trades().await.unwrap();
    assert_eq!(second[0].pair, "ETH/USD");
    assert!(client.is_done());

    // A finished source keeps returning empty batches.
    assert!(client.get_trades().await.unwrap().is_empty());
}

#[tokio::test]
async fn api_error_payload_skips_the_round() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": ["EGeneral:Too many requests"],
            "result": {}
        })))
        .mount(&server)
        .await;

    let mut client =
        KrakenRestClient::with_base_url(&server.uri(), vec!["BTC/USD".into()], 1, now_ns());

    assert!(client.get_trades().await.unwrap().is_empty());
    assert!(!client.is_done());
}

#[tokio::test]
async fn http_error_status_skips_the_round() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(520))
        .mount(&server)
        .await;

    let mut client =
        KrakenRestClient::with_base_url(&server.uri(), vec!["BTC/USD".into()], 1, now_ns());

    assert!(client.get_trades().await.unwrap().is_empty());
    assert!(!client.is_done());
}

#[tokio::test]
async fn missing_pair_in_result_skips_the_round() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": [],
            "result": { "last": "1" }
        })))
        .mount(&server)
        .await;

    let mut client =
        KrakenRestClient::with_base_url(&server.uri(), vec!["BTC/USD".into()], 1, now_ns());

    assert!(client.get_trades().await.unwrap().is_empty());
}

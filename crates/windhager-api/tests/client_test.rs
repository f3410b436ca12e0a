#![allow(clippy::unwrap_used)]
// Integration tests for `WindhagerClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use windhager_api::{Error, WindhagerClient};

// ── Helpers ─────────────────────────────────────────────────────────

const CHALLENGE: &str =
    r#"Digest realm="Windhager", qop="auth", nonce="5f2a9c0e1b", opaque="0a1b2c", algorithm="MD5""#;

async fn setup() -> (MockServer, WindhagerClient) {
    let server = MockServer::start().await;
    let client = WindhagerClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "USER",
        SecretString::from("123".to_string()),
    );
    (server, client)
}

/// Answer requests without credentials with a digest challenge.
async fn mount_challenge(server: &MockServer, header: &str) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", header))
        .with_priority(10)
        .mount(server)
        .await;
}

fn authorization_headers(requests: &[wiremock::Request]) -> Vec<Option<String>> {
    requests
        .iter()
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_owned())
        })
        .collect()
}

fn nc_of(header: &str) -> &str {
    let start = header.find("nc=").unwrap() + 3;
    &header[start..start + 8]
}

// ── Digest negotiation ──────────────────────────────────────────────

#[tokio::test]
async fn test_challenge_is_answered_with_one_retry() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "nodeId": 7, "name": "BioWIN", "functions": [
                { "fctId": 2, "fctType": 14, "name": "Zone A", "lock": false }
            ]}
        ])))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_challenge(&server, CHALLENGE).await;

    let devices = client.devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].node_id, 7);

    let requests = server.received_requests().await.unwrap();
    let headers = authorization_headers(&requests);
    assert_eq!(headers.len(), 2);
    assert!(headers[0].is_none(), "first request must be unauthenticated");

    let auth = headers[1].as_deref().unwrap();
    assert!(auth.starts_with("Digest "));
    assert!(auth.contains(r#"username="USER""#));
    assert!(auth.contains(r#"realm="Windhager""#));
    assert!(auth.contains(r#"uri="/api/1.0/lookup/1""#));
    assert!(auth.contains(r#"opaque="0a1b2c""#));
    assert_eq!(nc_of(auth), "00000001");
}

#[tokio::test]
async fn test_cached_challenge_is_sent_preemptively() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "21.5" })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_challenge(&server, CHALLENGE).await;

    let _: serde_json::Value = client.lookup("/1/7/2/0/1/0").await.unwrap();
    let _: serde_json::Value = client.lookup("/1/7/2/1/1/0").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let headers = authorization_headers(&requests);
    // challenge + retry for the first lookup, a single request for the second
    assert_eq!(headers.len(), 3);
    assert_eq!(nc_of(headers[1].as_deref().unwrap()), "00000001");
    assert_eq!(nc_of(headers[2].as_deref().unwrap()), "00000002");
    assert_eq!(client.auth().nonce_count(), 2);
}

#[tokio::test]
async fn test_rejected_credentials_are_retried_once() {
    let (server, client) = setup().await;
    mount_challenge(&server, CHALLENGE).await;

    let result = client.devices().await;

    assert!(
        matches!(result, Err(ref e) if e.is_auth_failure()),
        "expected Authentication error, got: {result:?}"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_challenge_is_protocol_error() {
    let (server, client) = setup().await;
    mount_challenge(&server, r#"Digest realm="Windhager, nonce="abc"#).await;

    let result = client.devices().await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::DigestChallenge { .. }), "got: {err:?}");
    assert!(err.is_protocol());
}

#[tokio::test]
async fn test_unsupported_algorithm_returns_original_failure() {
    let (server, client) = setup().await;
    mount_challenge(
        &server,
        r#"Digest realm="Windhager", nonce="abc", algorithm="SHA-512-256""#,
    )
    .await;

    let result = client.devices().await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsupported_qop_fails_request() {
    let (server, client) = setup().await;
    mount_challenge(
        &server,
        r#"Digest realm="Windhager", nonce="abc", qop="auth-int""#,
    )
    .await;

    let result = client.devices().await;

    assert!(
        matches!(result, Err(Error::UnsupportedQop(ref q)) if q == "auth-int"),
        "expected UnsupportedQop, got: {result:?}"
    );
}

// ── Endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_datapoint_sends_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/1.0/datapoint"))
        .and(body_json(json!({ "OID": "/1/5/3/1/1/0", "value": "21.5" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.write_datapoint("/1/5/3/1/1/0", "21.5").await.unwrap();
}

#[tokio::test]
async fn test_write_datapoint_propagates_failure() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.write_datapoint("/1/5/3/1/1/0", "21.5").await;

    let err = result.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.devices().await;

    assert!(matches!(result, Err(Error::Deserialization { ref body, .. }) if body == "not json"));
}

#[tokio::test]
async fn test_preview_of_multibyte_body_is_char_aligned() {
    let (server, client) = setup().await;

    // Byte 200 falls inside the two-byte 'é'.
    let body = format!("{}é{}", "x".repeat(199), "y".repeat(50));
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1/15/0/0/45/0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let result = client.lookup::<serde_json::Value>("/1/15/0/0/45/0").await;

    match result {
        Err(Error::Deserialization { message, body: full }) => {
            assert_eq!(full, body);
            assert!(message.contains('é'), "preview should keep the whole char: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let client = WindhagerClient::with_client(
        reqwest::Client::new(),
        url,
        "USER",
        SecretString::from("123".to_string()),
    );

    let result = client.devices().await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}

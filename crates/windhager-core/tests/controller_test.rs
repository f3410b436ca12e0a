#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Integration tests for `Controller` against a wiremock appliance.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use windhager_core::{
    ClimateCommand, Controller, ControllerConfig, CoreError, DiscoveryPhase, FunctionPath,
    PointKind, PointValue,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    let controller = Controller::new(config(&server));
    (server, controller)
}

fn config(server: &MockServer) -> ControllerConfig {
    let mut config = ControllerConfig::new(
        Url::parse(&server.uri()).unwrap(),
        SecretString::from("secret".to_string()),
    );
    config.refresh_interval_secs = 0;
    config
}

async fn mount_root(server: &MockServer, devices: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices))
        .mount(server)
        .await;
}

/// Answer every point under `function` (e.g. `/1/7/2`) with `value`.
async fn mount_points(server: &MockServer, function: &str, value: &str) {
    let pattern = format!(r"^/api/1\.0/lookup{}/\d+/\d+/\d+$", regex_escape(function));
    Mock::given(method("GET"))
        .and(path_regex(pattern))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": value })))
        .mount(server)
        .await;
}

async fn mount_point(server: &MockServer, oid: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/1.0/lookup{oid}")))
        .respond_with(response)
        .with_priority(1)
        .mount(server)
        .await;
}

fn regex_escape(s: &str) -> String {
    s.replace('.', r"\.")
}

fn zone(node_id: u32, fct_id: u32, lock: bool) -> serde_json::Value {
    json!({
        "nodeId": node_id,
        "name": "InfoWIN Touch",
        "functions": [{ "fctId": fct_id, "fctType": 14, "lock": lock, "name": "Zone A" }]
    })
}

fn heater() -> serde_json::Value {
    json!({
        "nodeId": 15,
        "name": "BioWIN 2",
        "functions": [{ "fctId": 0, "fctType": 9, "lock": false, "name": "BioWIN" }]
    })
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_discovers_climate_zone() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "20.5").await;

    assert_eq!(controller.discovery_phase(), DiscoveryPhase::Uninitialized);
    let snapshot = controller.refresh().await.unwrap();
    assert_eq!(controller.discovery_phase(), DiscoveryPhase::Ready);

    let climate = &snapshot.devices[0];
    match &climate.kind {
        PointKind::Climate { prefix, oids } => {
            assert_eq!(prefix.to_string(), "/1/7/2");
            assert_eq!(
                oids,
                &["/2/0/1/0", "/2/1/1/0", "/2/3/50/0", "/2/2/10/0", "/2/3/58/0"]
            );
        }
        other => panic!("expected climate descriptor, got {other:?}"),
    }
    assert_eq!(snapshot.devices.len(), 7);

    assert_eq!(snapshot.oids.len(), 7);
    assert!(snapshot.oids.contains_key("/1/7/2/0/1/0"));
    assert!(snapshot.oids.contains_key("/1/7/2/1/1/0"));
    assert!(snapshot.oids.values().all(|v| v.as_ref() == Some(&PointValue::Number(20.5))));
    assert!(snapshot.is_complete());
}

#[tokio::test]
async fn locked_climate_functions_are_not_discovered() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, true)])).await;

    let snapshot = controller.refresh().await.unwrap();
    assert!(snapshot.devices.is_empty());
    assert!(snapshot.oids.is_empty());
}

#[tokio::test]
async fn discovery_runs_once_across_refreshes() {
    let (server, controller) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([zone(7, 2, false)])))
        .expect(1)
        .mount(&server)
        .await;
    mount_points(&server, "/1/7/2", "21").await;

    let first = controller.refresh().await.unwrap();
    let second = controller.refresh().await.unwrap();

    let first_oids: Vec<_> = first.oids.keys().collect();
    let second_oids: Vec<_> = second.oids.keys().collect();
    assert_eq!(first_oids, second_oids);
}

#[tokio::test]
async fn discovery_failure_propagates_and_is_retried() {
    let (server, controller) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "21").await;

    let err = controller.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    assert_eq!(controller.discovery_phase(), DiscoveryPhase::Uninitialized);
    assert!(controller.snapshot().is_none());

    let snapshot = controller.refresh().await.unwrap();
    assert_eq!(snapshot.oids.len(), 7);
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test]
async fn one_failing_oid_does_not_fail_the_cycle() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([heater()])).await;
    mount_points(&server, "/1/15/0", "42").await;
    mount_point(&server, "/1/15/0/0/45/0", ResponseTemplate::new(500)).await;

    let snapshot = controller.refresh().await.unwrap();

    assert_eq!(snapshot.oids.len(), 9);
    let nulls: Vec<&str> = snapshot
        .oids
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(nulls, ["/1/15/0/0/45/0"]);
    assert_eq!(snapshot.failed.len(), 1);
    assert_eq!(snapshot.failed[0].as_str(), "/1/15/0/0/45/0");
    assert_eq!(snapshot.number("/1/15/0/0/9/0"), Some(42.0));
}

#[tokio::test]
async fn timed_out_oid_does_not_fail_the_cycle() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.timeout = Duration::from_millis(200);
    cfg.poll_timeout = Duration::from_secs(10);
    let controller = Controller::new(cfg);

    mount_root(&server, json!([heater()])).await;
    mount_points(&server, "/1/15/0", "42").await;
    mount_point(
        &server,
        "/1/15/0/0/45/0",
        ResponseTemplate::new(200)
            .set_body_json(json!({ "value": "7" }))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let snapshot = controller.refresh().await.unwrap();

    assert_eq!(snapshot.oids.len(), 9);
    let nulls: Vec<&str> = snapshot
        .oids
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.as_str())
        .collect();
    assert_eq!(nulls, ["/1/15/0/0/45/0"]);
    assert_eq!(snapshot.failed.len(), 1);
    assert_eq!(snapshot.failed[0].as_str(), "/1/15/0/0/45/0");
    assert_eq!(controller.consecutive_timeouts(), 0);
}

#[tokio::test]
async fn no_data_sentinel_is_null_not_failure() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "21").await;
    mount_point(
        &server,
        "/1/7/2/0/0/0",
        ResponseTemplate::new(200).set_body_json(json!({ "value": "-.-" })),
    )
    .await;

    let snapshot = controller.refresh().await.unwrap();
    assert_eq!(snapshot.oids["/1/7/2/0/0/0"], None);
    assert!(snapshot.is_complete());
}

#[tokio::test]
async fn unexpected_body_shape_is_null() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "21").await;
    mount_point(
        &server,
        "/1/7/2/3/50/0",
        ResponseTemplate::new(200).set_body_json(json!({ "OID": "/1/7/2/3/50/0" })),
    )
    .await;

    let snapshot = controller.refresh().await.unwrap();
    assert_eq!(snapshot.oids["/1/7/2/3/50/0"], None);
    assert!(snapshot.is_complete());
}

#[tokio::test]
async fn write_then_refresh_reads_back_value() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(5, 3, false)])).await;
    mount_points(&server, "/1/5/3", "20").await;
    mount_point(
        &server,
        "/1/5/3/1/1/0",
        ResponseTemplate::new(200).set_body_json(json!({ "value": "21.5" })),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/api/1.0/datapoint"))
        .and(body_json(json!({ "OID": "/1/5/3/1/1/0", "value": "21.5" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let oid = "/1/5/3/1/1/0".parse().unwrap();
    controller.write_oid(&oid, "21.5").await.unwrap();
    let snapshot = controller.refresh().await.unwrap();

    assert_eq!(snapshot.number("/1/5/3/1/1/0"), Some(21.5));
}

#[tokio::test]
async fn read_oid_skips_discovery() {
    let (server, controller) = setup().await;
    mount_point(
        &server,
        "/1/15/0/0/9/0",
        ResponseTemplate::new(200).set_body_json(json!({ "value": "35" })),
    )
    .await;
    mount_point(
        &server,
        "/1/15/0/0/11/0",
        ResponseTemplate::new(200).set_body_json(json!({ "value": "-.-" })),
    )
    .await;

    let power = controller
        .read_oid(&"/1/15/0/0/9/0".parse().unwrap())
        .await
        .unwrap();
    let fumes = controller
        .read_oid(&"/1/15/0/0/11/0".parse().unwrap())
        .await
        .unwrap();

    assert_eq!(power, Some(PointValue::Number(35.0)));
    assert_eq!(fumes, None);
    assert_eq!(controller.discovery_phase(), DiscoveryPhase::Uninitialized);
}

#[tokio::test]
async fn write_failure_propagates() {
    let (server, controller) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/1.0/datapoint"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let oid = "/1/5/3/1/1/0".parse().unwrap();
    let err = controller.write_oid(&oid, "21.5").await.unwrap_err();
    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
}

// ── Timeouts ────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_cycle_times_out_and_keeps_last_snapshot() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.poll_timeout = Duration::from_millis(300);
    let controller = Controller::new(cfg);

    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "21").await;
    let first = controller.refresh().await.unwrap();

    server.reset().await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/1\.0/lookup/1/7/2/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": "22" }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = controller.refresh().await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(controller.consecutive_timeouts(), 1);

    let current = controller.snapshot().unwrap();
    assert_eq!(current.taken_at, first.taken_at);
    assert_eq!(current.number("/1/7/2/0/1/0"), Some(21.0));
}

#[tokio::test]
async fn timed_out_discovery_returns_to_uninitialized() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.poll_timeout = Duration::from_millis(200);
    let controller = Controller::new(cfg);

    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = controller.refresh().await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(controller.discovery_phase(), DiscoveryPhase::Uninitialized);
    assert!(controller.snapshot().is_none());
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn validate_counts_nodes() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, false), heater()])).await;

    assert_eq!(controller.validate().await.unwrap(), 2);
}

#[tokio::test]
async fn validate_reports_bad_credentials() {
    let (server, controller) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = controller.validate().await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn validate_reports_unreachable_host() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ControllerConfig::new(
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
        SecretString::from("secret".to_string()),
    );
    let controller = Controller::new(config);

    let err = controller.validate().await.unwrap_err();
    assert!(err.is_connection_failure());
}

// ── Digest ──────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_answers_digest_challenge() {
    let (server, controller) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).insert_header(
            "WWW-Authenticate",
            r#"Digest realm="Windhager", nonce="abc123", qop="auth", algorithm=MD5"#,
        ))
        .with_priority(10)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/lookup/1"))
        .and(wiremock::matchers::header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([zone(7, 2, false)])))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/1\.0/lookup/1/7/2/"))
        .and(wiremock::matchers::header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "19" })))
        .with_priority(1)
        .mount(&server)
        .await;

    let snapshot = controller.refresh().await.unwrap();
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.number("/1/7/2/0/1/0"), Some(19.0));
    // One bare request, then every request carries credentials.
    assert_eq!(controller.client().auth().nonce_count(), 1 + 7);
}

// ── Climate commands ────────────────────────────────────────────────

#[tokio::test]
async fn set_target_temperature_writes_setpoint_and_duration() {
    let (server, controller) = setup().await;
    for (oid, value) in [("/1/7/2/3/4/0", "21.5"), ("/1/7/2/2/10/0", "400")] {
        Mock::given(method("PUT"))
            .and(path("/api/1.0/datapoint"))
            .and(body_json(json!({ "OID": oid, "value": value })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    let prefix: FunctionPath = "/1/7/2".parse().unwrap();
    controller
        .climate(prefix, ClimateCommand::SetTargetTemperature { celsius: 21.5 })
        .await
        .unwrap();
}

#[tokio::test]
async fn set_preset_clears_custom_duration_seen_in_snapshot() {
    let (server, controller) = setup().await;
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "0").await;
    mount_point(
        &server,
        "/1/7/2/2/10/0",
        ResponseTemplate::new(200).set_body_json(json!({ "value": "95" })),
    )
    .await;
    for (oid, value) in [("/1/7/2/3/50/0", "2"), ("/1/7/2/2/10/0", "0")] {
        Mock::given(method("PUT"))
            .and(path("/api/1.0/datapoint"))
            .and(body_json(json!({ "OID": oid, "value": value })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
    }

    controller.refresh().await.unwrap();
    let prefix: FunctionPath = "/1/7/2".parse().unwrap();
    controller
        .climate(prefix, ClimateCommand::SetPresetMode { mode: 2 })
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_compensation_is_rejected_before_writing() {
    let (server, controller) = setup().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let prefix: FunctionPath = "/1/7/2".parse().unwrap();
    let err = controller
        .climate(prefix, ClimateCommand::SetComfortCompensation { kelvin: 4.0 })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn background_refresh_publishes_and_shuts_down() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.refresh_interval_secs = 1;
    let controller = Controller::new(cfg);
    mount_root(&server, json!([zone(7, 2, false)])).await;
    mount_points(&server, "/1/7/2", "21").await;

    controller.start().await;
    let mut published = false;
    for _ in 0..50 {
        if controller.snapshot().is_some() {
            published = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    controller.shutdown().await;

    assert!(published);
    assert!(!controller.client().is_open());
}

#[tokio::test]
async fn oneshot_releases_session() {
    let server = MockServer::start().await;
    mount_root(&server, json!([heater()])).await;

    let nodes = Controller::oneshot(config(&server), |c| async move { c.validate().await })
        .await
        .unwrap();
    assert_eq!(nodes, 1);
}

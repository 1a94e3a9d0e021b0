// Integration tests for the device endpoints, using wiremock.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use blueair_api::{
    ApiClient, CommandValue, Credentials, Error, RegionEndpoints, SessionManager,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;

    let base: url::Url = server.uri().parse().expect("mock server URL");
    let endpoints = RegionEndpoints {
        accounts_url: base.clone(),
        gateway_url: base,
        api_key: "test-api-key".into(),
    };
    let credentials =
        Credentials::new("user@example.com", SecretString::from("hunter2"), "us")
            .expect("valid region");
    let manager =
        SessionManager::with_endpoints(credentials, endpoints, &TransportConfig::default())
            .expect("client builds");
    let client = ApiClient::new(Arc::new(manager));

    mount_auth(&server).await;
    (server, client)
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/accounts.login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": 0,
            "sessionInfo": { "sessionToken": "st-1", "sessionSecret": "ss-1" }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/accounts.getJWT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorCode": 0,
            "id_token": "jwt-1",
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/prod/c/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 3600,
        })))
        .mount(server)
        .await;
}

fn info_record(uuid: &str) -> serde_json::Value {
    json!({
        "configuration": {
            "di": { "name": "Bedroom", "hw": "nb_m_1.0" }
        },
        "sensorData": [
            { "n": "pm2_5", "v": 4.0 },
            { "n": "tmp", "v": 21.5 },
        ],
        "states": [
            { "n": "fanspeed", "v": 30 },
            { "n": "standby", "vb": false },
            { "n": "nightmode", "vb": true },
        ],
        "id": uuid,
    })
}

// ── list_devices ────────────────────────────────────────────────────

#[tokio::test]
async fn list_devices_returns_summaries_in_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/prod/c/registered-devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                { "uuid": "uuid-a", "name": "bedroom", "mac": "aa:bb" },
                { "uuid": "uuid-b", "name": "office" },
            ]
        })))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.expect("list succeeds");

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].uuid, "uuid-a");
    assert_eq!(devices[0].name, "bedroom");
    assert_eq!(devices[0].mac.as_deref(), Some("aa:bb"));
    assert_eq!(devices[1].uuid, "uuid-b");
    assert_eq!(devices[1].mac, None);
}

#[tokio::test]
async fn list_devices_rejects_body_without_devices_field() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/prod/c/registered-devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "things": [] })))
        .mount(&server)
        .await;

    let err = client.list_devices().await.expect_err("must reject");
    assert!(
        matches!(err, Error::Deserialization { .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn list_devices_surfaces_http_failures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/prod/c/registered-devices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_devices().await.expect_err("must fail");
    match err {
        Error::Api { status, ref message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── get_device_info ─────────────────────────────────────────────────

#[tokio::test]
async fn get_device_info_parses_the_single_matching_record() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/bedroom/r/initial"))
        .and(body_partial_json(json!({
            "deviceconfigquery": [ { "id": "uuid-a" } ],
            "includestates": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceInfo": [ info_record("uuid-a") ]
        })))
        .mount(&server)
        .await;

    let record = client
        .get_device_info("bedroom", "uuid-a")
        .await
        .expect("info succeeds");

    assert_eq!(record.configuration.di.name.as_deref(), Some("Bedroom"));
    assert_eq!(record.configuration.di.hw.as_deref(), Some("nb_m_1.0"));
    assert_eq!(record.sensor_data.len(), 2);
    assert_eq!(record.sensor_data[0].n, "pm2_5");
    assert_eq!(record.states.len(), 3);
    assert_eq!(record.states[1].vb, Some(false));
}

#[tokio::test]
async fn get_device_info_with_zero_matches_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/bedroom/r/initial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deviceInfo": [] })))
        .mount(&server)
        .await;

    let err = client
        .get_device_info("bedroom", "uuid-gone")
        .await
        .expect_err("must be not found");

    assert!(err.is_not_found(), "got: {err:?}");
    assert!(
        matches!(err, Error::DeviceNotFound { ref uuid } if uuid == "uuid-gone"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn get_device_info_with_multiple_matches_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/bedroom/r/initial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceInfo": [ info_record("uuid-a"), info_record("uuid-b") ]
        })))
        .mount(&server)
        .await;

    let err = client
        .get_device_info("bedroom", "uuid-a")
        .await
        .expect_err("filter did not isolate one record");
    assert!(err.is_not_found(), "got: {err:?}");
}

// ── send_command ────────────────────────────────────────────────────

#[tokio::test]
async fn integer_command_is_keyed_v() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/uuid-a/a/fanspeed"))
        .and(body_json(json!({ "n": "fanspeed", "v": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_command("uuid-a", "fanspeed", CommandValue::Number(42))
        .await
        .expect("command succeeds");
}

#[tokio::test]
async fn boolean_command_is_keyed_vb() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/uuid-a/a/nightmode"))
        .and(body_json(json!({ "n": "nightmode", "vb": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_command("uuid-a", "nightmode", CommandValue::Bool(true))
        .await
        .expect("command succeeds");
}

#[tokio::test]
async fn failed_command_propagates_the_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/prod/c/uuid-a/a/fanspeed"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad value"))
        .mount(&server)
        .await;

    let err = client
        .send_command("uuid-a", "fanspeed", CommandValue::Number(999))
        .await
        .expect_err("must fail");

    assert!(
        matches!(err, Error::Api { status: 400, .. }),
        "got: {err:?}"
    );
}

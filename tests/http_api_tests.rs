// HTTP API tests against a live listener backed by the memory backend

mod common;

use common::{REFERENCE_CSV, REFERENCE_PAYLOAD};
use sensor_gateway::storage::MemoryBackend;
use sensor_gateway::{server, IngestionService, Record};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let service = Arc::new(IngestionService::new(Arc::new(MemoryBackend::new())));
    tokio::spawn(server::run(listener, service));
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_root_message() {
    let base = start_server().await;
    let body: Value = reqwest::get(&base).await.unwrap().json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("running"));
}

#[tokio::test]
async fn test_log_report_purge_flow() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/log", base))
        .header("Content-Type", "application/json")
        .body(REFERENCE_PAYLOAD)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Data logged successfully" }));

    let response = client.get(format!("{}/report", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/csv");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"report.csv\""
    );
    assert_eq!(response.text().await.unwrap(), REFERENCE_CSV);

    let records: Vec<Record> = client
        .get(format!("{}/records", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records, vec![Record::reference()]);

    // Both verbs purge
    let response = client.get(format!("{}/purge", base)).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let response = client.post(format!("{}/purge", base)).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Purge executed successfully" }));

    let report = client
        .get(format!("{}/report", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(report, "");
}

#[tokio::test]
async fn test_lenient_payload_is_normalized() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let payload = json!({
        "recorded": "1768570200",
        "location": "den",
        "sensor": "bmp280",
        "measurement": "temperature",
        "units": "C",
        "value": "22.34"
    });
    let response = client
        .post(format!("{}/log", base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let report = client
        .get(format!("{}/report", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(report, REFERENCE_CSV);
}

#[tokio::test]
async fn test_invalid_payloads_are_rejected() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    for body in ["", "not json", "[]", r#"{"recorded": 1, "location": "den"}"#] {
        let response = client
            .post(format!("{}/log", base))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "payload {:?}", body);
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }

    let records: Vec<Value> = client
        .get(format!("{}/records", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_out_of_range_value_is_rejected() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let payload = json!({
        "recorded": 1768570200,
        "location": "den",
        "sensor": "bmp280",
        "measurement": "temperature",
        "units": "C",
        "value": "12345678901234567.8"
    });
    let response = client
        .post(format!("{}/log", base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("value"));

    let records: Vec<Value> = client
        .get(format!("{}/records", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_echo_round_trip() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let payload = json!({ "sensor": "bmp280", "nested": { "values": [1, 2, 3] } });
    let response = client
        .post(format!("{}/echo", base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let echoed: Value = response.json().await.unwrap();
    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn test_health_reports_backend() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "healthy", "backend": "memory" }));
}

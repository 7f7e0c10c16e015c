//! Integration tests for HttpUpstream.
//!
//! Uses wiremock for HTTP mocking. Tests cover envelope decoding, null data,
//! status classification (400/401/403/404/429/5xx), and the transport retry budget.

use std::time::Duration;

use roster_core::client::UPSTREAM_USER_AGENT;
use roster_core::{ErrorKind, HttpUpstream, UpstreamClient, UpstreamConfig, UpstreamError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(mock_server: &MockServer, max_retries: u32) -> HttpUpstream {
    let config = UpstreamConfig {
        url: mock_server.uri(),
        timeout_secs: 5,
        max_retries,
    };
    HttpUpstream::new(&config).expect("failed to create client")
}

fn employee_json(id: i64, salary: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "employee_name": format!("Employee {id}"),
        "employee_age": 30,
        "employee_salary": salary,
        "profile_image": ""
    })
}

#[tokio::test]
async fn test_get_all_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .and(header("user-agent", UPSTREAM_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": [employee_json(1, 5000.0), employee_json(2, 6000.0)],
            "message": "Successfully! All records has been fetched."
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 0);
    let employees = client
        .get_all()
        .await
        .expect("fetch failed")
        .expect("expected data");

    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0].salary, Some(5000.0));
    assert_eq!(employees[1].name.as_deref(), Some("Employee 2"));
}

#[tokio::test]
async fn test_get_by_id_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employee/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": employee_json(7, 5000.0)
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 0);
    let employee = client.get_by_id(7).await.expect("fetch failed");
    assert_eq!(employee.map(|e| e.id), Some(7));
}

#[tokio::test]
async fn test_null_data_is_miss() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employee/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": null,
            "message": "Successfully! Record has been fetched."
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 0);
    let result = client.get_by_id(9).await.expect("fetch failed");
    assert!(result.is_none(), "expected None for null data");
}

#[tokio::test]
async fn test_status_classification() {
    let cases = [
        (400, ErrorKind::BadRequest),
        (401, ErrorKind::Unauthorized),
        (403, ErrorKind::Forbidden),
        (404, ErrorKind::NotFound),
        (418, ErrorKind::Generic),
        (503, ErrorKind::Generic),
    ];

    for (status, expected) in cases {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/employee/1"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, 3);
        let err = client.get_by_id(1).await.unwrap_err();
        assert_eq!(err.kind(), expected, "status {status}");
    }
}

#[tokio::test]
async fn test_not_found_names_resource() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employee/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 0);
    let err = client.get_by_id(404).await.unwrap_err();
    assert!(
        matches!(err, UpstreamError::NotFound { ref resource } if resource == "/employee/404"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after_and_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "60")
                .set_body_string("Too Many Requests"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 3);
    let err = client.get_all().await.unwrap_err();

    assert_eq!(
        err,
        UpstreamError::RateLimited {
            retry_after: Some(Duration::from_secs(60))
        }
    );
}

#[tokio::test]
async fn test_server_error_is_not_retried_with_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(ResponseTemplate::new(503).set_body_string("internal"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = UpstreamConfig {
        url: mock_server.uri(),
        ..UpstreamConfig::default()
    };
    let client = HttpUpstream::new(&config).unwrap();
    let err = client.get_all().await.unwrap_err();

    assert!(
        matches!(err, UpstreamError::Generic { status: Some(503), ref detail } if detail.contains("internal")),
        "unexpected error: {err:?}"
    );
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_retry_on_transport_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employee/3"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/employee/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": employee_json(3, 100.0)
        })))
        .mount(&mock_server)
        .await;

    let config = UpstreamConfig {
        url: mock_server.uri(),
        timeout_secs: 1,
        max_retries: 2,
    };
    let client = HttpUpstream::new(&config).unwrap();
    let employee = client.get_by_id(3).await.expect("should succeed after retry");

    assert_eq!(employee.map(|e| e.id), Some(3));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_default_budget_is_three_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = UpstreamConfig {
        url: mock_server.uri(),
        timeout_secs: 1,
        ..UpstreamConfig::default()
    };
    let client = HttpUpstream::new(&config).unwrap();
    let err = client.get_all().await.unwrap_err();

    assert!(matches!(err, UpstreamError::Generic { status: None, .. }));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_malformed_payload_is_generic() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, 0);
    let err = client.get_all().await.unwrap_err();
    assert!(
        matches!(err, UpstreamError::Generic { status: Some(200), .. }),
        "decode failures keep the received status: {err:?}"
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_generic_without_status() {
    let config = UpstreamConfig {
        url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        max_retries: 0,
    };
    let client = HttpUpstream::new(&config).unwrap();

    let err = client.get_all().await.unwrap_err();
    assert!(matches!(err, UpstreamError::Generic { status: None, .. }));
}

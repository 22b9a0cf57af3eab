//! Integration tests for the API client using wiremock
//!
//! These tests mock the audit management API to verify the client's HTTP
//! behavior and the search fan-out on top of it.

use auditdesk::config::ApiConfig;
use auditdesk::{
    bucketize, ApiClient, EntityKind, EntitySource, Error, OrganizationInput, SearchAggregator,
    TrendEvent,
};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    let config = ApiConfig {
        base_url: format!("{}/api/v1", server.uri()),
        token: token.map(str::to_string),
        ..ApiConfig::default()
    };
    ApiClient::new(&config).unwrap()
}

async fn mount_list(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_audits_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/audits/"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "ISO Annual",
                "description": "Yearly surveillance audit",
                "standard": "ISO 27001",
                "status": "in_progress",
                "project_id": 7
            },
            {"id": 2, "name": "SOC2 Type II", "standard": "SOC 2"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("test-token"));
    let audits = client.list_audits().await.unwrap();

    assert_eq!(audits.len(), 2);
    assert_eq!(audits[0].name, "ISO Annual");
    assert_eq!(audits[0].project_id, Some(7));
    assert_eq!(audits[1].description, None);
}

#[tokio::test]
async fn test_no_token_sends_no_authorization() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, "projects/", json!([{"id": 3, "name": "Cloud Migration"}])).await;

    let client = client_for(&mock_server, None);
    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects[0].name, "Cloud Migration");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_http_status_uses_detail_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/findings/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"detail": "Not enough permissions"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("test-token"));
    let err = client.list_findings().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(err.status(), Some(403));
    match err {
        Error::HttpStatus {
            endpoint, message, ..
        } => {
            assert_eq!(endpoint, "findings/");
            assert_eq!(message, "Not enough permissions");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_status_falls_back_to_raw_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/organizations/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client.list_organizations().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Internal Server Error"));
}

#[tokio::test]
async fn test_non_list_body_is_decode_error() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, "audits/", json!({"items": []})).await;

    let client = client_for(&mock_server, None);
    let err = client.list_audits().await.unwrap_err();

    assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9/api/v1".to_string(),
        connect_timeout_secs: 1,
        timeout_secs: 2,
        ..ApiConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();
    let err = client.list_projects().await.unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "got {err:?}");
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_list_audits_for_project_sends_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/audits/"))
        .and(query_param("project_id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "ISO Annual", "standard": "ISO 27001", "project_id": 7}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let audits = client.list_audits_for_project(7).await.unwrap();

    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].project_id, Some(7));
}

#[tokio::test]
async fn test_search_over_api() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "audits/",
        json!([{"id": 1, "name": "ISO Annual", "standard": "ISO 27001"}]),
    )
    .await;
    mount_list(
        &mock_server,
        "findings/",
        json!([
            {"id": 10, "title": "Missing ISO evidence", "severity": "high"},
            {"id": 11, "title": "Weak passwords", "severity": "critical"}
        ]),
    )
    .await;
    mount_list(
        &mock_server,
        "organizations/",
        json!([{"id": 20, "name": "Isotope Labs", "industry": "Biotech"}]),
    )
    .await;
    mount_list(&mock_server, "projects/", json!([])).await;

    let aggregator = SearchAggregator::new(client_for(&mock_server, None));
    let results = aggregator.search("  iso ").await.unwrap();

    let keys: Vec<(EntityKind, i64)> = results.iter().map(|r| (r.kind, r.id)).collect();
    assert_eq!(
        keys,
        vec![
            (EntityKind::Audit, 1),
            (EntityKind::Finding, 10),
            (EntityKind::Organization, 20),
        ]
    );
    assert_eq!(results[0].subtitle.as_deref(), Some("ISO 27001"));
    assert_eq!(results[1].subtitle.as_deref(), Some("high"));
    assert_eq!(results[2].subtitle.as_deref(), Some("Biotech"));
}

#[tokio::test]
async fn test_search_fails_when_one_endpoint_fails() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "audits/",
        json!([{"id": 1, "name": "ISO Annual", "standard": "ISO 27001"}]),
    )
    .await;
    mount_list(&mock_server, "findings/", json!([])).await;
    mount_list(&mock_server, "organizations/", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let aggregator = SearchAggregator::new(client_for(&mock_server, None));
    let err = aggregator.search("iso").await.unwrap_err();

    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_short_query_makes_no_requests() {
    let mock_server = MockServer::start().await;

    let aggregator = SearchAggregator::new(client_for(&mock_server, None));
    let results = aggregator.search(" i ").await.unwrap();

    assert!(results.is_empty());
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_trend_from_api_findings() {
    let mock_server = MockServer::start().await;
    mount_list(
        &mock_server,
        "findings/",
        json!([
            {"id": 1, "title": "a", "severity": "critical", "created_at": "2026-10-14T09:30:00Z"},
            {"id": 2, "title": "b", "severity": "low", "created_at": "2026-10-13T23:59:59"},
            {"id": 3, "title": "c", "severity": "informational", "created_at": "2026-10-14"},
            {"id": 4, "title": "d", "severity": "high"}
        ]),
    )
    .await;

    let client = client_for(&mock_server, None);
    let findings = client.list_findings().await.unwrap();
    let events: Vec<TrendEvent> = findings.iter().filter_map(TrendEvent::from_finding).collect();
    assert_eq!(events.len(), 3);

    let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
    let buckets = bucketize(&events, today, 14);

    assert_eq!(buckets.len(), 14);
    let last = &buckets[13];
    assert_eq!(last.date, today);
    assert_eq!(last.critical, 1);
    assert_eq!(last.total, 2);
    assert_eq!(buckets[12].low, 1);
    assert_eq!(buckets[12].total, 1);
}

#[tokio::test]
async fn test_create_organization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Acme", "description": "Banking group"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 42,
            "name": "Acme",
            "description": "Banking group",
            "is_active": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, Some("test-token"));
    let input = OrganizationInput {
        description: Some("Banking group".to_string()),
        ..OrganizationInput::named("Acme")
    };
    let created = client.create_organization(&input).await.unwrap();

    assert_eq!(created.id, 42);
    assert_eq!(created.is_active, Some(true));
}

#[tokio::test]
async fn test_update_organization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/organizations/5"))
        .and(body_json(json!({"name": "Acme Holdings", "logo_url": "https://acme.example/logo.png"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "Acme Holdings",
            "logo_url": "https://acme.example/logo.png"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let input = OrganizationInput {
        logo_url: Some("https://acme.example/logo.png".to_string()),
        ..OrganizationInput::named("Acme Holdings")
    };
    let updated = client.update_organization(5, &input).await.unwrap();

    assert_eq!(updated.name, "Acme Holdings");
    assert_eq!(updated.logo_url.as_deref(), Some("https://acme.example/logo.png"));
}

#[tokio::test]
async fn test_delete_organization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/organizations/5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    client.delete_organization(5).await.unwrap();
}

#[tokio::test]
async fn test_delete_organization_rejected_with_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/organizations/5"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Organization still has projects"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client.delete_organization(5).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    match err {
        Error::HttpStatus {
            endpoint, message, ..
        } => {
            assert_eq!(endpoint, "organizations/5");
            assert_eq!(message, "Organization still has projects");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_organization_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/organizations/"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, None);
    let err = client
        .create_organization(&OrganizationInput::named("Acme"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
}

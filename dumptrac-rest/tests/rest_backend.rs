//! Transport behaviour against a mocked backend.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use dumptrac_core::{
    BinId, BinPort, Command, DumptracService, Effect, GeoPoint, PortError, ReportId, ReportPort,
    ReportStatus,
    map::{MapMarkerProjector, MarkerState},
    model::NewBin,
    reconcile::DashboardReconciler,
    table::{PLACEHOLDER, TableProjector, TableRow},
};
use dumptrac_rest::RestBackend;
use mockito::{Matcher, Server, ServerGuard};
use reqwest::Client;

const REPORTS: &str = r#"[{"id": 1, "bin_id": 5, "status": "full", "created_at": "2024-03-01T10:00:00Z", "cleared_at": null}]"#;
const BINS: &str = r#"[{"id": 5, "location": "Gate A", "latitude": 6.5, "longitude": 3.3}]"#;

fn rest(server: &ServerGuard) -> Arc<RestBackend> {
    Arc::new(RestBackend::new(Client::new(), format!("{}/api", server.url())))
}

#[tokio::test]
async fn refresh_joins_reports_with_bins() {
    let mut server = Server::new_async().await;
    let reports = server
        .mock("GET", "/api/reports")
        .with_header("content-type", "application/json")
        .with_body(REPORTS)
        .create_async()
        .await;
    let bins = server
        .mock("GET", "/api/bins")
        .with_header("content-type", "application/json")
        .with_body(BINS)
        .create_async()
        .await;

    let backend = rest(&server);
    let view = DashboardReconciler::new(backend.clone(), backend)
        .refresh()
        .await
        .expect("refresh");

    reports.assert_async().await;
    bins.assert_async().await;

    let rows = TableProjector::default().project(&view);
    let [TableRow::Report(row)] = rows.as_slice() else {
        panic!("expected one row, got {rows:?}");
    };
    assert_eq!(row.location, "Gate A");
    assert_eq!(row.latitude, "6.5");
    assert_eq!(row.longitude, "3.3");
    assert_eq!(row.status, ReportStatus::Full);
    assert_eq!(
        view.entries[0].report.created_at,
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    );

    let markers = MapMarkerProjector::default().markers(&view);
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].state, MarkerState::Full);
    assert_eq!(markers[0].position, GeoPoint::new(6.5, 3.3));
}

#[tokio::test]
async fn dangling_report_renders_placeholder_row() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/reports")
        .with_body(REPORTS)
        .create_async()
        .await;
    server
        .mock("GET", "/api/bins")
        .with_body("[]")
        .create_async()
        .await;

    let backend = rest(&server);
    let view = DashboardReconciler::new(backend.clone(), backend)
        .refresh()
        .await
        .expect("refresh");

    let rows = TableProjector::default().project(&view);
    let [TableRow::Report(row)] = rows.as_slice() else {
        panic!("expected one row, got {rows:?}");
    };
    assert_eq!(row.location, PLACEHOLDER);
    assert_eq!(row.latitude, PLACEHOLDER);
    assert!(MapMarkerProjector::default().markers(&view).is_empty());
}

#[tokio::test]
async fn failed_bin_fetch_fails_refresh() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/reports")
        .with_body(REPORTS)
        .create_async()
        .await;
    server
        .mock("GET", "/api/bins")
        .with_status(500)
        .with_body(r#"{"detail": "database offline"}"#)
        .create_async()
        .await;

    let backend = rest(&server);
    let result = DashboardReconciler::new(backend.clone(), backend)
        .refresh()
        .await;

    match result {
        Err(PortError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database offline");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn upsert_posts_location_and_coordinates() {
    let mut server = Server::new_async().await;
    let upsert = server
        .mock("POST", "/api/bins")
        .match_body(Matcher::Json(serde_json::json!({
            "location": "Gate A",
            "latitude": 9.9,
            "longitude": 9.9,
        })))
        .with_body(r#"{"id": 5, "location": "Gate A", "latitude": "6.5", "longitude": "3.3"}"#)
        .create_async()
        .await;

    let bin = rest(&server)
        .upsert_bin(&NewBin {
            location: "Gate A".into(),
            latitude: Some(9.9),
            longitude: Some(9.9),
        })
        .await
        .expect("upsert");

    upsert.assert_async().await;
    assert_eq!(bin.id, BinId(5));
    assert_eq!(bin.latitude, Some(6.5));
    assert_eq!(bin.longitude, Some(3.3));
}

#[tokio::test]
async fn clear_of_unknown_report_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("PUT", "/api/reports/9/clear")
        .with_status(404)
        .with_body(r#"{"detail": "Report not found"}"#)
        .create_async()
        .await;

    let result = rest(&server).clear_report(ReportId(9)).await;

    match result {
        Err(PortError::NotFound(message)) => assert_eq!(message, "Report not found"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_success_body_is_an_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/reports")
        .with_body(r#"[{"id": 1, "bin_id": 5, "status": "full", "created_at": "yesterday"}]"#)
        .create_async()
        .await;

    let result = rest(&server).list_reports().await;

    match result {
        Err(PortError::InvalidResponse(message)) => assert!(message.contains("yesterday")),
        other => panic!("expected invalid response, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let backend = RestBackend::new(Client::new(), "http://127.0.0.1:9/api");

    let result = backend.list_reports().await;

    assert!(matches!(result, Err(PortError::Network(_))));
}

#[tokio::test]
async fn batch_clear_survives_a_failed_item() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/reports")
        .with_body(
            r#"[{"id": 1, "bin_id": 5, "status": "full", "created_at": "2024-03-01T10:00:00Z"},
                {"id": 2, "bin_id": 5, "status": "full", "created_at": "2024-03-01T10:05:00Z"}]"#,
        )
        .expect_at_least(1)
        .create_async()
        .await;
    server
        .mock("GET", "/api/bins")
        .with_body(BINS)
        .expect_at_least(1)
        .create_async()
        .await;
    let cleared = server
        .mock("PUT", "/api/reports/1/clear")
        .with_body(
            r#"{"id": 1, "bin_id": 5, "status": "done",
                "created_at": "2024-03-01T10:00:00Z", "cleared_at": "2024-03-01T11:00:00Z"}"#,
        )
        .create_async()
        .await;
    let rejected = server
        .mock("PUT", "/api/reports/2/clear")
        .with_status(500)
        .with_body(r#"{"detail": "write conflict"}"#)
        .create_async()
        .await;

    let service = DumptracService::new(dumptrac_rest::backend(
        Client::new(),
        format!("{}/api", server.url()),
    ));
    let outcome = service.dispatch(Command::ClearAll).await.expect("dispatch");

    cleared.assert_async().await;
    rejected.assert_async().await;

    let Effect::BatchCleared(batch) = &outcome.effect else {
        panic!("expected batch outcome, got {:?}", outcome.effect);
    };
    assert_eq!(batch.succeeded(), 1);
    assert_eq!(batch.failed(), 1);
    assert!(outcome.status_message().contains("write conflict"));
    assert!(outcome.refresh.is_some(), "a successful clear triggers a refresh");
}

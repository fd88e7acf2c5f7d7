use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use eventlog_server::{build_router, AppState, PageLimits};
use eventlog_store::Database;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    app_with_limits(PageLimits::default())
}

fn app_with_limits(limits: PageLimits) -> Router {
    build_router(AppState::new(Database::in_memory().unwrap(), limits))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn post_json(app: &Router, body: &Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

fn login_event() -> Value {
    json!({
        "timestamp": "2025-09-07T12:00:00",
        "event_type": "Login",
        "severity": "High",
        "source": "USA",
        "user_id": "user1",
        "status": "Open"
    })
}

#[tokio::test]
async fn get_events_on_empty_store_is_empty_array() {
    let app = app();
    let (status, body) = get(&app, "/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn post_event_returns_camel_case_with_generated_id() {
    let app = app();
    let (status, body) = post_json(&app, &login_event()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventType"], "Login");
    assert_eq!(body["userId"], "user1");
    assert_eq!(body["timestamp"], "2025-09-07T12:00:00");
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body.get("event_type").is_none());
}

#[tokio::test]
async fn post_event_accepts_camel_case_fields() {
    let app = app();
    let (status, body) = post_json(&app, &json!({"eventType": "Logout", "userId": "u9"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eventType"], "Logout");
    assert_eq!(body["userId"], "u9");
    assert!(body["timestamp"].is_null());
}

#[tokio::test]
async fn post_event_with_bad_timestamp_is_parse_error() {
    let app = app();
    let mut event = login_event();
    event["timestamp"] = json!("not-a-date");
    let (status, body) = post_json(&app, &event).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "parse_error");

    let (_, count) = get(&app, "/events/count").await;
    assert_eq!(count, json!({"totalEvents": 0}));
}

#[tokio::test]
async fn post_event_with_offset_is_stored_as_utc() {
    let app = app();
    let mut event = login_event();
    event["timestamp"] = json!("2025-09-07T14:00:00+02:00");
    let (status, body) = post_json(&app, &event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timestamp"], "2025-09-07T12:00:00");

    let (_, listed) = get(&app, "/events").await;
    assert_eq!(listed[0]["timestamp"], "2025-09-07T12:00:00");
}

#[tokio::test]
async fn post_event_accepts_basic_and_reduced_iso8601() {
    let app = app();
    for (input, stored) in [
        ("20250907T120000", "2025-09-07T12:00:00"),
        ("2025-09-07T12", "2025-09-07T12:00:00"),
        ("2025-09-07t12:00:00,5", "2025-09-07T12:00:00.500000"),
        ("2025-09-07T12:00Z", "2025-09-07T12:00:00"),
    ] {
        let (status, body) = post_json(&app, &json!({ "timestamp": input })).await;
        assert_eq!(status, StatusCode::OK, "for {input}");
        assert_eq!(body["timestamp"], stored, "for {input}");
    }
}

#[tokio::test]
async fn post_event_with_unknown_field_is_rejected() {
    let app = app();
    let mut event = login_event();
    event["colour"] = json!("red");
    let (status, body) = post_json(&app, &event).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_body");
}

#[tokio::test]
async fn post_event_with_malformed_json_is_bad_request() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_body");
}

#[tokio::test]
async fn post_event_without_content_type_is_unsupported() {
    let app = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/events")
        .body(Body::from(login_event().to_string()))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn count_on_empty_store_is_zero() {
    let app = app();
    let (status, body) = get(&app, "/events/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"totalEvents": 0}));
}

#[tokio::test]
async fn created_events_list_in_creation_order() {
    let app = app();
    let mut ids = Vec::new();
    for i in 0..5 {
        let mut event = login_event();
        event["user_id"] = json!(format!("user{i}"));
        let (_, body) = post_json(&app, &event).await;
        ids.push(body["id"].clone());
    }

    let (status, body) = get(&app, "/events?skip=0&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Value> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].clone())
        .collect();
    assert_eq!(listed, ids);

    let (_, count) = get(&app, "/events/count").await;
    assert_eq!(count["totalEvents"], 5);
}

#[tokio::test]
async fn skip_and_limit_slice_the_list() {
    let app = app();
    for i in 0..6 {
        let mut event = login_event();
        event["user_id"] = json!(format!("user{i}"));
        post_json(&app, &event).await;
    }
    let (_, body) = get(&app, "/events?skip=2&limit=3").await;
    let users: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["userId"].as_str().unwrap())
        .collect();
    assert_eq!(users, ["user2", "user3", "user4"]);
}

#[tokio::test]
async fn oversized_limit_is_clamped() {
    let app = app_with_limits(PageLimits {
        default_limit: 2,
        max_limit: 3,
    });
    for _ in 0..5 {
        post_json(&app, &login_event()).await;
    }
    let (_, default_page) = get(&app, "/events").await;
    assert_eq!(default_page.as_array().unwrap().len(), 2);
    let (status, clamped) = get(&app, "/events?limit=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(clamped.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_pagination_is_bad_request() {
    let app = app();
    for uri in ["/events?skip=-1", "/events?limit=0", "/events?limit=-5", "/events?skip=abc"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "for {uri}");
        assert_eq!(body["error"]["code"], "bad_request", "for {uri}");
    }
}

#[tokio::test]
async fn summary_aggregates_labels() {
    let app = app();
    post_json(&app, &login_event()).await;
    let mut closed = login_event();
    closed["status"] = json!("Closed");
    closed["user_id"] = json!("user2");
    post_json(&app, &closed).await;

    let (status, body) = get(&app, "/events/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalEvents"], 2);
    assert_eq!(body["usersAffected"], 2);
    assert_eq!(body["severityDistribution"]["High"], 2);
    assert_eq!(body["alertStatus"], json!({"Closed": 1, "Open": 1}));
}

async fn seed_mixed(app: &Router) {
    for (ts, event_type, severity, source, user) in [
        ("2025-09-07T10:15:00", "Login", "Critical", "USA", "alice"),
        ("2025-09-07T10:45:00", "Malware", "High", "USA", "alice"),
        ("2025-09-07T11:05:00", "Login", "Critical", "Germany", "bob"),
        ("2025-09-08T09:00:00", "Network", "Low", "Brazil", "carol"),
    ] {
        let (status, _) = post_json(
            app,
            &json!({
                "timestamp": ts,
                "eventType": event_type,
                "severity": severity,
                "source": source,
                "userId": user,
                "status": "Open",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

fn user_ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|e| e["userId"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn summary_includes_rankings_and_timelines() {
    let app = app();
    seed_mixed(&app).await;

    let (status, body) = get(&app, "/events/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["eventCountsByType"],
        json!({"Login": 2, "Malware": 1, "Network": 1})
    );
    assert_eq!(body["topSourceCountries"][0], json!({"country": "USA", "count": 2}));
    assert_eq!(
        body["topAffectedUsers"][0],
        json!({"userId": "alice", "events": 2, "severityScores": {"Critical": 1, "High": 1}})
    );
    assert_eq!(
        body["eventTimeline"],
        json!([
            {"hour": "2025-09-07T10:00", "count": 2},
            {"hour": "2025-09-07T11:00", "count": 1},
            {"hour": "2025-09-08T09:00", "count": 1},
        ])
    );
    assert_eq!(
        body["hourlyCriticalEvents"],
        json!([
            {"hour": "2025-09-07T10:00", "count": 1},
            {"hour": "2025-09-07T11:00", "count": 1},
        ])
    );
}

#[tokio::test]
async fn list_filters_by_labels() {
    let app = app();
    seed_mixed(&app).await;

    let (status, body) = get(&app, "/events?severity=Critical").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user_ids(&body), ["alice", "bob"]);

    let (_, body) = get(&app, "/events?eventType=Login&source=Germany").await;
    assert_eq!(user_ids(&body), ["bob"]);

    let (_, body) = get(&app, "/events?event_type=Malware").await;
    assert_eq!(user_ids(&body), ["alice"]);

    let (_, body) = get(&app, "/events?severity=&source=").await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn list_filters_by_date_range() {
    let app = app();
    seed_mixed(&app).await;

    let (_, body) = get(&app, "/events?startDate=2025-09-07T10:30:00&endDate=2025-09-07").await;
    assert_eq!(user_ids(&body), ["alice", "bob"]);

    let (_, body) = get(&app, "/events?startDate=2025-09-08").await;
    assert_eq!(user_ids(&body), ["carol"]);

    let (_, body) = get(&app, "/events?endDate=2025-09-07&skip=1&limit=1").await;
    assert_eq!(user_ids(&body), ["alice"]);
}

#[tokio::test]
async fn list_with_bad_date_bound_is_bad_request() {
    let app = app();
    let (status, body) = get(&app, "/events?startDate=last-week").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = app();
    let req = Request::builder()
        .uri("/events/count")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use event_finder_server::config::Config;
use event_finder_server::db::{Database, StorageOptions};
use event_finder_server::routes::create_routes;
use event_finder_server::AppState;

struct TestApp {
    router: Router,
    db: Database,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_full_text(true).await
    }

    async fn with_full_text(enabled: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database_path: dir.path().join("test.db"),
            full_text_search: enabled,
            ..Config::default()
        };
        let db = Database::open(&StorageOptions::from_config(&config))
            .await
            .unwrap();
        let router = create_routes(AppState::new(db.clone()), &config);
        Self {
            router,
            db,
            _dir: dir,
        }
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    async fn create(&self, body: Value) -> Value {
        let response = self.request(Method::POST, "/api/events/", Some(body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn total_count(response: &Response) -> i64 {
    response.headers()["x-total-count"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

fn event(title: &str, category: &str, date: &str) -> Value {
    json!({
        "title": title,
        "description": "A great event",
        "location": "Lagos",
        "category": category,
        "date": date,
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_ready_reports_storage_state() {
    let app = TestApp::new().await;

    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok", "db": "ok" }));

    app.db.close().await;
    let response = app.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_categories() {
    let app = TestApp::new().await;
    let response = app.get("/api/meta/categories").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!(["music", "tech", "sports", "arts", "business", "community"])
    );
}

#[tokio::test]
async fn test_create_get_and_list_event() {
    let app = TestApp::new().await;
    let created = app
        .create(json!({
            "title": "  PyCon Meetup ",
            "description": "A great Python event",
            "location": "Online",
            "category": "TECH",
            "date": "2025-06-01",
        }))
        .await;

    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["title"], "PyCon Meetup");
    assert_eq!(created["category"], "tech");
    assert_eq!(created["date"], "2025-06-01");
    assert!(created["created_at"].is_string());

    let detail = app.get(&format!("/api/events/{}", created["id"])).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert_eq!(json_body(detail).await, created);

    let list = app.get("/api/events/?limit=10&offset=0").await;
    assert_eq!(list.status(), StatusCode::OK);
    assert_eq!(total_count(&list), 1);
    let items = json_body(list).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["id"], created["id"]);
}

#[tokio::test]
async fn test_create_rejects_invalid_payloads() {
    let app = TestApp::new().await;
    let invalid = [
        json!({ "location": "Lagos", "category": "tech", "date": "2025-06-01" }),
        event("   ", "tech", "2025-06-01"),
        event("Title", "theatre", "2025-06-01"),
        event("Title", "tech", "01/06/2025"),
        event(&"x".repeat(201), "tech", "2025-06-01"),
    ];

    for body in invalid {
        let response = app.request(Method::POST, "/api/events/", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        let error = json_body(response).await;
        assert_eq!(error["success"], false);
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_update_event_partial() {
    let app = TestApp::new().await;
    let created = app.create(event("Original Title", "tech", "2025-06-01")).await;
    let uri = format!("/api/events/{}", created["id"]);

    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({ "title": "  Updated Title  ", "category": "MUSIC" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "Updated Title");
    assert_eq!(updated["category"], "music");
    assert_eq!(updated["description"], "A great event");
    assert_eq!(updated["created_at"], created["created_at"]);

    let fetched = json_body(app.get(&uri).await).await;
    assert_eq!(fetched, updated);

    let unchanged = app.request(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(unchanged.status(), StatusCode::OK);
    assert_eq!(json_body(unchanged).await, updated);

    let cleared = app
        .request(Method::PATCH, &uri, Some(json!({ "description": null })))
        .await;
    assert_eq!(json_body(cleared).await["description"], Value::Null);

    let rejected = app
        .request(Method::PATCH, &uri, Some(json!({ "title": null })))
        .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_event_and_404_after() {
    let app = TestApp::new().await;
    let created = app.create(event("To Delete", "community", "2025-06-01")).await;
    let uri = format!("/api/events/{}", created["id"]);

    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());

    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);

    let list = app.get("/api/events/?q=delete").await;
    assert_eq!(total_count(&list), 0);
}

#[tokio::test]
async fn test_update_delete_nonexistent_return_404() {
    let app = TestApp::new().await;

    let patch = app
        .request(Method::PATCH, "/api/events/999999", Some(json!({ "title": "Nope" })))
        .await;
    assert_eq!(patch.status(), StatusCode::NOT_FOUND);

    let delete = app.request(Method::DELETE, "/api/events/999999", None).await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(delete).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_non_numeric_id_is_rejected() {
    let app = TestApp::new().await;
    assert_eq!(
        app.get("/api/events/abc").await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_search_filters_and_total_count() {
    let app = TestApp::new().await;
    let meetup = app.create(event("Lagos Tech Meetup", "tech", "2025-06-01")).await;
    app.create(event("Lagos Marathon", "sports", "2025-07-01")).await;
    app.create(event("Afrobeats Night", "music", "2024-12-31")).await;

    let response = app
        .get("/api/events/?category=tech&start_date=2025-01-01&end_date=2025-12-31")
        .await;
    assert_eq!(total_count(&response), 1);
    let items = json_body(response).await;
    assert_eq!(items[0]["id"], meetup["id"]);

    let response = app.get("/api/events/?category=MUSIC&start_date=2025-01-01").await;
    assert_eq!(total_count(&response), 0);

    let response = app.get("/api/events/?q=lagos&limit=1").await;
    assert_eq!(total_count(&response), 2);
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = app.get("/api/events/?starts_with=a").await;
    assert_eq!(total_count(&response), 1);
}

#[tokio::test]
async fn test_sort_date_desc() {
    let app = TestApp::new().await;
    let first = app.create(event("First", "arts", "2025-01-01")).await;
    let second = app.create(event("Second", "arts", "2025-01-02")).await;

    let items = json_body(app.get("/api/events?sort=date_desc").await).await;
    assert_eq!(items[0]["id"], second["id"]);
    assert_eq!(items[1]["id"], first["id"]);
}

#[tokio::test]
async fn test_search_fallback_without_full_text_index() {
    let app = TestApp::with_full_text(false).await;
    let meetup = app.create(event("Lagos Tech Meetup", "tech", "2025-06-01")).await;
    app.create(event("Lagos Marathon", "sports", "2025-07-01")).await;

    let response = app.get("/api/events/?q=tech").await;
    assert_eq!(total_count(&response), 1);
    assert_eq!(json_body(response).await[0]["id"], meetup["id"]);
}

#[tokio::test]
async fn test_search_rejects_bad_parameters() {
    let app = TestApp::new().await;
    for query in [
        "limit=0",
        "limit=101",
        "offset=-1",
        "starts_with=ab",
        "starts_with=1",
        "sort=newest",
        "category=theatre",
        "date=2025-1-1",
        "start_date=yesterday",
    ] {
        let response = app.get(&format!("/api/events/?{query}")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{query}");
    }
}

#[tokio::test]
async fn test_cors_preflight_exposes_total_count() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/events/")
        .header(header::ORIGIN, "http://localhost:8000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:8000"
    );

    let request = Request::builder()
        .uri("/api/events/")
        .header(header::ORIGIN, "http://localhost:8000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let exposed = response.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("x-total-count"));
}

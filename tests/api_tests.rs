use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use flagd::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    bearer: String,
}

async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let state = flagd::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    let issued = state
        .token_service
        .issue("api-tests", "user-1")
        .await
        .expect("Failed to issue bootstrap token");

    TestApp {
        router: flagd::api::router(state),
        bearer: format!("Bearer {}", issued.secret.as_str()),
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", &self.bearer);

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send(method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, name: &str, resource_id: &str) -> Value {
        let (status, body) = self
            .json(
                "POST",
                "/api/features",
                Some(json!({ "name": name, "resourceId": resource_id, "active": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_auth_required() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/features")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/features")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].is_string());

    let (status, _) = app.json("GET", "/api/features", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_feature_crud() {
    let app = spawn_app().await;

    let (status, created) = app
        .json(
            "POST",
            "/api/features",
            Some(json!({
                "name": "dark-mode",
                "value": { "pct": 10, "cohorts": ["beta"] },
                "resourceId": "svc-a",
                "active": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["value"], json!({ "pct": 10, "cohorts": ["beta"] }));
    assert_eq!(created["resourceId"], "svc-a");
    assert!(created["createdAt"].is_string());

    let (status, fetched) = app.json("GET", &format!("/api/features/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = app
        .json(
            "PUT",
            &format!("/api/features/{id}"),
            Some(json!({
                "name": "dark-mode-v2",
                "value": "on",
                "resourceId": "svc-b",
                "active": true
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["name"], "dark-mode-v2");
    assert_eq!(updated["value"], "on");

    let (status, toggled) = app
        .json(
            "POST",
            &format!("/api/features/{id}/toggle"),
            Some(json!({ "active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["active"], false);
    assert_eq!(toggled["name"], "dark-mode-v2");
    assert_eq!(toggled["value"], "on");

    let (status, body) = app.send("DELETE", &format!("/api/features/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = app.json("GET", &format!("/api/features/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains(&id));

    let (_, list) = app.json("GET", "/api/features", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_absent_and_null_values() {
    let app = spawn_app().await;

    let created = app.create("no-value", "svc-a").await;
    assert!(created.get("value").is_none());

    let (status, created) = app
        .json(
            "POST",
            "/api/features",
            Some(json!({ "name": "null-value", "value": null, "resourceId": "svc-a" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.get("value"), Some(&Value::Null));
    assert_eq!(created["active"], false);
}

#[tokio::test]
async fn test_list_filters_by_resource() {
    let app = spawn_app().await;

    app.create("a", "resource-1").await;
    app.create("b", "resource-2").await;
    app.create("c", "resource-1").await;

    let (status, all) = app.json("GET", "/api/features", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, scoped) = app
        .json("GET", "/api/features?resource_id=resource-1", None)
        .await;
    let mut names: Vec<&str> = scoped
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "c"]);

    let (_, none) = app
        .json("GET", "/api/features?resource_id=unknown", None)
        .await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_validation_errors() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/features",
            Some(json!({ "name": "", "resourceId": "svc-a" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "feature name cannot be empty");

    let (status, body) = app
        .json("POST", "/api/features", Some(json!({ "name": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "resource ID cannot be empty");

    let (_, list) = app.json("GET", "/api/features", None).await;
    assert_eq!(list, json!([]));

    let created = app.create("keep", "svc-a").await;
    let id = created["id"].as_str().unwrap();
    let (status, _) = app
        .json(
            "PUT",
            &format!("/api/features/{id}"),
            Some(json!({ "name": "", "resourceId": "svc-a" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = app.json("GET", &format!("/api/features/{id}"), None).await;
    assert_eq!(fetched["name"], "keep");
}

#[tokio::test]
async fn test_undecodable_bodies_are_400() {
    let app = spawn_app().await;

    let (status, body) = app
        .json(
            "POST",
            "/api/features",
            Some(json!({ "name": 5, "resourceId": "svc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid request body")
    );

    let created = app.create("flip", "svc-a").await;
    let id = created["id"].as_str().unwrap();
    let (status, body) = app
        .json(
            "POST",
            &format!("/api/features/{id}/toggle"),
            Some(json!({ "active": "yes" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .json("POST", "/api/tokens", Some(json!({ "name": ["ci"] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/features")
                .header("Authorization", &app.bearer)
                .header("Content-Type", "application/json")
                .body(Body::from("{\"name\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, fetched) = app.json("GET", &format!("/api/features/{id}"), None).await;
    assert_eq!(fetched["active"], true);
}

#[tokio::test]
async fn test_whitespace_names_are_not_empty() {
    let app = spawn_app().await;

    let (status, created) = app
        .json(
            "POST",
            "/api/features",
            Some(json!({ "name": " ", "resourceId": "svc" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], " ");

    let (status, _) = app
        .json("POST", "/api/tokens", Some(json!({ "name": "  " })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_missing_features_are_404() {
    let app = spawn_app().await;

    let (status, _) = app.json("GET", "/api/features/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "PUT",
            "/api/features/missing",
            Some(json!({ "name": "x", "resourceId": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.json("DELETE", "/api/features/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            "POST",
            "/api/features/missing/toggle",
            Some(json!({ "active": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_lifecycle() {
    let app = spawn_app().await;

    let (status, issued) = app
        .json("POST", "/api/tokens", Some(json!({ "name": "token-a" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = issued["token"].as_str().unwrap().to_string();
    let id = issued["id"].as_str().unwrap().to_string();
    assert!(!secret.is_empty());
    assert_eq!(issued["name"], "token-a");
    assert!(
        issued["createdByPrincipal"]
            .as_str()
            .unwrap()
            .starts_with("token:")
    );

    let (status, raw) = app.send("GET", "/api/tokens", None).await;
    assert_eq!(status, StatusCode::OK);
    let listing = String::from_utf8(raw).unwrap();
    assert!(!listing.contains(&secret));
    assert!(!listing.to_lowercase().contains("hash"));

    let tokens: Value = serde_json::from_str(&listing).unwrap();
    let entry = tokens
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == id.as_str())
        .unwrap();
    assert!(entry.get("token").is_none());
    assert_eq!(entry["name"], "token-a");

    let new_bearer = TestApp {
        router: app.router.clone(),
        bearer: format!("Bearer {secret}"),
    };
    let (status, _) = new_bearer.json("GET", "/api/features", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json("POST", "/api/tokens", Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send("DELETE", &format!("/api/tokens/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = new_bearer.json("GET", "/api/features", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.json("DELETE", &format!("/api/tokens/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

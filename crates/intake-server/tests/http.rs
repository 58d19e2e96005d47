use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use intake_autosave::pipeline::AutosaveConfig;
use intake_core::models::client::Client;
use intake_server::config::{ServerConfig, StoreBackend};
use intake_server::state::AppState;
use intake_storage::memory::MemoryStore;

fn client(slug: &str, secret: &str, is_active: bool) -> Client {
    Client {
        id: uuid::Uuid::new_v4(),
        slug: slug.to_string(),
        company_name: format!("{slug} B.V."),
        password_hash: secret.to_string(),
        is_active,
        last_activity: None,
        created_at: jiff::Timestamp::now(),
    }
}

fn app(store: &MemoryStore) -> Router {
    let config = ServerConfig {
        bind_addr: ([127, 0, 0, 1], 0).into(),
        store: StoreBackend::Memory { seed_file: None },
        secure_cookies: true,
        autosave: AutosaveConfig::default(),
        session_ttl: Duration::from_secs(3600),
        workspace_idle: Duration::from_secs(1800),
    };
    intake_server::router(AppState::new(Arc::new(store.clone()), &config))
}

fn seeded() -> MemoryStore {
    MemoryStore::with_clients([
        client("acme", "hunter2", true),
        client("gone", "hunter2", false),
    ])
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// Log in and return the `name=value` pair to send back as a cookie.
async fn login(app: &Router, remember: bool) -> String {
    let (status, headers, _) = send(
        app,
        "POST",
        "/assess/acme/login",
        None,
        Some(json!({ "password": "hunter2", "remember_device": remember })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let app = app(&seeded());
    let (status, _, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_and_inactive_slugs_are_denied() {
    let app = app(&seeded());

    for slug in ["nobody", "gone"] {
        let (status, _, body) =
            send(&app, "GET", &format!("/assess/{slug}/access"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["destination"], "denied");

        let (status, _, body) = send(
            &app,
            "POST",
            &format!("/assess/{slug}/login"),
            None,
            Some(json!({ "password": "hunter2" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Deze link is niet (meer) geldig.");
    }
}

#[tokio::test]
async fn first_visit_asks_for_the_password() {
    let app = app(&seeded());
    let (_, _, body) = send(&app, "GET", "/assess/acme/access", None, None).await;
    assert_eq!(body["destination"], "login");
    assert_eq!(body["company_name"], "acme B.V.");
}

#[tokio::test]
async fn wrong_password_is_rejected_without_a_cookie() {
    let store = seeded();
    let app = app(&store);

    let (status, headers, body) = send(
        &app,
        "POST",
        "/assess/acme/login",
        None,
        Some(json!({ "password": "hunter3" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Onjuist wachtwoord");
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(store.devices().await.is_empty());
}

#[tokio::test]
async fn remembered_device_skips_the_password_next_time() {
    let store = seeded();
    let app = app(&store);

    let (_, headers, body) = send(
        &app,
        "POST",
        "/assess/acme/login",
        None,
        Some(json!({ "password": "hunter2", "remember_device": true })),
    )
    .await;
    assert_eq!(body["destination"], "workspace");
    let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("device_acme="));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("Max-Age=31536000"));
    assert_eq!(store.devices().await.len(), 1);

    let cookie = set_cookie.split(';').next().unwrap();
    let (_, _, body) = send(&app, "GET", "/assess/acme/access", Some(cookie), None).await;
    assert_eq!(body["destination"], "workspace");
}

#[tokio::test]
async fn session_credential_opens_the_workspace_but_is_not_remembered() {
    let store = seeded();
    let app = app(&store);

    let cookie = login(&app, false).await;
    assert!(store.devices().await.is_empty());

    let (status, _, _) = send(&app, "GET", "/assess/acme/draft", Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, "GET", "/assess/acme/access", Some(cookie.as_str()), None).await;
    assert_eq!(body["destination"], "login");
}

#[tokio::test]
async fn workspace_requires_a_credential() {
    let app = app(&seeded());

    let (status, _, body) = send(&app, "GET", "/assess/acme/draft", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["destination"], "login");

    let (status, _, body) = send(
        &app,
        "GET",
        "/assess/acme/draft",
        Some("device_acme=not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["destination"], "login");

    let (status, _, body) = send(&app, "GET", "/assess/gone/draft", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["destination"], "denied");
}

#[tokio::test]
async fn credential_for_one_slug_does_not_open_another() {
    let store = seeded();
    store.insert_client(client("globex", "swordfish", true)).await;
    let app = app(&store);

    let cookie = login(&app, true).await;
    let token = cookie.trim_start_matches("device_acme=");

    let (status, _, _) = send(
        &app,
        "GET",
        "/assess/globex/draft",
        Some(format!("device_globex={token}").as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_workspace_starts_with_one_process() {
    let app = app(&seeded());
    let cookie = login(&app, true).await;

    let (status, _, body) = send(&app, "GET", "/assess/acme/draft", Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processes"].as_array().unwrap().len(), 1);
    assert_eq!(body["processes"][0]["id"], "1");
    assert_eq!(body["tabs"][0]["label"], "Proces 1");
    assert_eq!(body["status"], "idle");
}

#[tokio::test(start_paused = true)]
async fn edits_are_autosaved_after_the_quiet_period() {
    let store = seeded();
    let app = app(&store);
    let cookie = login(&app, true).await;

    let (status, _, body) =
        send(&app, "POST", "/assess/acme/processes", Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "2");

    let (status, _, _) = send(
        &app,
        "PATCH",
        "/assess/acme/processes/2",
        Some(cookie.as_str()),
        Some(json!({ "field": "taskName", "value": "Facturatie" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.draft("acme").await.is_none());

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let draft = store.draft("acme").await.unwrap();
    assert_eq!(draft.process_data.len(), 2);
    assert_eq!(draft.process_data[1].task_name, "Facturatie");

    let (_, _, body) = send(&app, "GET", "/assess/acme/status", Some(cookie.as_str()), None).await;
    assert_eq!(body["status"], "saved");

    let (_, _, body) = send(&app, "GET", "/assess/acme/draft", Some(cookie.as_str()), None).await;
    assert_eq!(body["tabs"][1]["label"], "Facturatie");
}

#[tokio::test(start_paused = true)]
async fn put_replaces_the_whole_process_list() {
    let store = seeded();
    let app = app(&store);
    let cookie = login(&app, true).await;

    let processes = json!([
        { "id": "3", "taskName": "Inkoop" },
        { "id": "1", "taskName": "Verkoop" },
    ]);
    let (status, _, _) = send(
        &app,
        "PUT",
        "/assess/acme/draft",
        Some(cookie.as_str()),
        Some(processes),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let ids: Vec<_> = store
        .draft("acme")
        .await
        .unwrap()
        .process_data
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, ["3", "1"]);

    let (status, _, _) = send(
        &app,
        "PUT",
        "/assess/acme/draft",
        Some(cookie.as_str()),
        Some(json!([])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_process_edits_are_rejected() {
    let app = app(&seeded());
    let cookie = login(&app, true).await;

    let (status, _, _) = send(
        &app,
        "DELETE",
        "/assess/acme/processes/1",
        Some(cookie.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "PATCH",
        "/assess/acme/processes/1",
        Some(cookie.as_str()),
        Some(json!({ "field": "favouriteColour", "value": "blauw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "PATCH",
        "/assess/acme/processes/9",
        Some(cookie.as_str()),
        Some(json!({ "field": "taskName", "value": "Inkoop" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn removing_a_process_keeps_the_rest() {
    let app = app(&seeded());
    let cookie = login(&app, true).await;

    send(&app, "POST", "/assess/acme/processes", Some(cookie.as_str()), None).await;
    let (status, _, _) = send(
        &app,
        "DELETE",
        "/assess/acme/processes/1",
        Some(cookie.as_str()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, body) = send(&app, "GET", "/assess/acme/draft", Some(cookie.as_str()), None).await;
    assert_eq!(body["processes"].as_array().unwrap().len(), 1);
    assert_eq!(body["processes"][0]["id"], "2");
}

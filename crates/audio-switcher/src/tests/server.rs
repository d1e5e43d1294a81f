use crate::{Dispatcher, server, tests::support::harness};

use audio_switcher_core::Config;

use std::{fs, path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Router with a front-end directory that does not exist.
fn router(dispatcher: Arc<Dispatcher>) -> Router {
    server::router(dispatcher, &std::env::temp_dir().join("audio-switcher-no-ui"))
}

#[allow(clippy::unwrap_used)]
async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[allow(clippy::unwrap_used)]
async fn post_invoke(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/invoke")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[allow(clippy::unwrap_used)]
async fn get_health(app: Router) -> Value {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    send(app, request).await.1
}

/// WHAT: Successful calls answer 200 with an ok envelope
/// WHY: The front end branches on the ok/error key
#[tokio::test]
async fn given_ready_registry_when_listing_devices_then_ok_envelope() {
    // Given: A ready registry behind the router
    let h = harness(true);

    // When: Invoking get_audio_devices
    let (status, body) = post_invoke(
        router(h.dispatcher),
        json!({ "cmd": "get_audio_devices" }),
    )
    .await;

    // Then: Devices are wrapped in "ok"
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "ok": [
            { "id": "A", "name": "Speakers", "is_default": true },
            { "id": "B", "name": "Headset", "is_default": false },
        ]})
    );
}

/// WHAT: Calls without output answer ok null
/// WHY: Distinguishes success from an absent body
#[tokio::test]
async fn given_known_device_when_selecting_then_ok_null() {
    // Given: A ready registry
    let h = harness(true);

    // When: Selecting B
    let (status, body) = post_invoke(
        router(h.dispatcher),
        json!({ "cmd": "set_active_device", "args": { "id": "B" } }),
    )
    .await;

    // Then: ok is null
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": null }));
}

/// WHAT: Registry errors map to status codes and stable kinds
/// WHY: The front end shows different messages per failure kind
#[tokio::test]
async fn given_failing_calls_when_invoking_then_error_envelopes() {
    // Given: A ready registry with B excluded
    let h = harness(true);
    let app = router(h.dispatcher);
    let (status, _) = post_invoke(
        app.clone(),
        json!({ "cmd": "set_excluded_devices", "args": { "ids": ["B"] } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // When: Selecting an unknown device, an excluded device, and saving a bad hotkey
    let (unknown_status, unknown) = post_invoke(
        app.clone(),
        json!({ "cmd": "set_active_device", "args": { "id": "Z" } }),
    )
    .await;
    let (excluded_status, excluded) = post_invoke(
        app.clone(),
        json!({ "cmd": "set_active_device", "args": { "id": "B" } }),
    )
    .await;
    let (hotkey_status, hotkey) = post_invoke(
        app,
        json!({
            "cmd": "save_config",
            "args": { "config": { "excluded_device_ids": [], "hotkey": "Ctrl+Banana" } }
        }),
    )
    .await;

    // Then: Each error carries its own status and kind
    assert_eq!(unknown_status, StatusCode::NOT_FOUND);
    assert_eq!(unknown["error"]["kind"], "unknown_device");
    assert_eq!(excluded_status, StatusCode::CONFLICT);
    assert_eq!(excluded["error"]["kind"], "device_excluded");
    assert_eq!(excluded["error"]["retryable"], false);
    assert_eq!(hotkey_status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(hotkey["error"]["kind"], "invalid_hotkey");
    assert!(
        hotkey["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("Ctrl+Banana"))
    );
}

/// WHAT: Transient failures answer 503 and are marked retryable
/// WHY: The front end retries while the registry loads or the OS is busy
#[tokio::test]
async fn given_transient_failures_when_invoking_then_service_unavailable() {
    // Given: One uninitialized registry and one whose device query fails
    let starting = harness(false);
    let unreachable = harness(true);
    unreachable.provider.set_unreachable(true);

    // When: Reading config before init, and listing devices while unreachable
    let (not_ready_status, not_ready) =
        post_invoke(router(starting.dispatcher), json!({ "cmd": "get_config" })).await;
    let (query_status, query) = post_invoke(
        router(unreachable.dispatcher),
        json!({ "cmd": "get_audio_devices" }),
    )
    .await;

    // Then: Both are 503 and retryable
    assert_eq!(not_ready_status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(not_ready["error"]["kind"], "not_ready");
    assert_eq!(not_ready["error"]["retryable"], true);
    assert_eq!(query_status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(query["error"]["kind"], "device_query");
    assert_eq!(query["error"]["retryable"], true);
}

/// WHAT: Unknown call names are rejected before dispatch
/// WHY: Only the five declared calls are routable
#[tokio::test]
async fn given_unknown_call_when_invoking_then_client_error() {
    // Given: A ready registry
    let h = harness(true);

    // When: Invoking a call that does not exist
    let (status, _) = post_invoke(router(h.dispatcher), json!({ "cmd": "reboot" })).await;

    // Then: The JSON extractor rejects it
    assert!(status.is_client_error());
}

/// WHAT: Health reports starting until the registry is loaded
/// WHY: Lets the front end wait instead of surfacing NotReady errors
#[tokio::test]
async fn given_registry_lifecycle_when_checking_health_then_status_follows() {
    // Given: An uninitialized registry
    let h = harness(false);
    let app = router(h.dispatcher);

    // When: Checking health before and after initialize
    let before = get_health(app.clone()).await;
    h.registry.initialize();
    let after = get_health(app).await;

    // Then: Status flips from starting to ready
    assert_eq!(before["status"], "starting");
    assert_eq!(after["status"], "ready");
}

/// WHAT: Health carries the suggested hotkey
/// WHY: The settings page offers it on a fresh install with no binding
#[tokio::test]
async fn given_fresh_install_when_checking_health_then_default_hotkey_offered() {
    // Given: A ready registry with no hotkey configured
    let h = harness(true);
    assert_eq!(h.registry.get_config().map(|c| c.hotkey).ok(), Some(None));

    // When: Checking health
    let body = get_health(router(h.dispatcher)).await;

    // Then: The suggested binding is reported
    assert_eq!(
        body,
        json!({ "status": "ready", "default_hotkey": Config::DEFAULT_HOTKEY })
    );
}

/// WHAT: Paths outside the API serve the front-end files
/// WHY: The tray's Settings item opens the boundary's root URL
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_ui_dir_when_getting_root_then_index_served() {
    // Given: A front-end directory holding index.html
    let ui_dir: PathBuf =
        std::env::temp_dir().join(format!("audio-switcher-ui-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&ui_dir).unwrap();
    fs::write(ui_dir.join("index.html"), "<h1>Audio-Switcher</h1>").unwrap();
    let h = harness(true);
    let app = server::router(h.dispatcher, &ui_dir);

    // When: Requesting the root and a missing asset
    let root = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let missing = app
        .oneshot(
            Request::builder()
                .uri("/missing.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Then: index.html is returned for the root, the missing asset is 404
    assert_eq!(root.status(), StatusCode::OK);
    let bytes = to_bytes(root.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>Audio-Switcher</h1>");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let _ = fs::remove_dir_all(&ui_dir);
}

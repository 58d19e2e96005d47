//! HTTP surface for the client intake app: device-trust access checks, the
//! shared-password login and the autosaving assessment workspace.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod workspaces;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Everything under the workspace requires a trusted device or a session
    // credential for the slug.
    let workspace = Router::new()
        .route(
            "/assess/{slug}/draft",
            get(routes::drafts::get_draft).put(routes::drafts::put_draft),
        )
        .route("/assess/{slug}/processes", post(routes::drafts::add_process))
        .route(
            "/assess/{slug}/processes/{id}",
            patch(routes::drafts::update_process).delete(routes::drafts::remove_process),
        )
        .route("/assess/{slug}/status", get(routes::drafts::get_status))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::device::require_device,
        ));

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        .route("/assess/{slug}/access", get(routes::access::check_access))
        .route("/assess/{slug}/login", post(routes::access::login))
        .merge(workspace)
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}

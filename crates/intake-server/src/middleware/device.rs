use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use intake_auth::cookie;
use intake_auth::trust::Access;
use intake_core::models::client::Client;

use crate::state::AppState;

/// The client whose workspace the request was authorized for.
#[derive(Clone, Debug)]
pub struct AuthorizedClient(pub Client);

/// Where the frontend should send a visitor who was turned away.
#[derive(Serialize)]
struct Redirect {
    destination: &'static str,
}

/// Workspace guard.
///
/// Reads the `device_{slug}` cookie and lets the request through only when
/// it carries a trusted device or a session credential for that slug. On
/// success, inserts [`AuthorizedClient`] into request extensions.
pub async fn require_device(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(slug) = params.get("slug") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let credential = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| cookie::read_device_cookie(cookies, slug));

    match state.trust.authorize(slug, credential.as_deref()).await {
        Access::Authorized(client) => {
            req.extensions_mut().insert(AuthorizedClient(client));
            next.run(req).await
        }
        Access::RequiresPassword(_) => (
            StatusCode::UNAUTHORIZED,
            Json(Redirect {
                destination: "login",
            }),
        )
            .into_response(),
        Access::NoSuchActiveClient => (
            StatusCode::NOT_FOUND,
            Json(Redirect {
                destination: "denied",
            }),
        )
            .into_response(),
    }
}

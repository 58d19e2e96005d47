use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::{AppendHeaders, IntoResponse};
use serde::{Deserialize, Serialize};

use intake_auth::cookie;
use intake_auth::trust::Access;

use crate::error::ApiError;
use crate::state::AppState;

/// Which view the frontend should show next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Workspace,
    Login,
    Denied,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub destination: Destination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl From<Access> for AccessResponse {
    fn from(access: Access) -> Self {
        match access {
            Access::Authorized(client) => Self {
                destination: Destination::Workspace,
                company_name: Some(client.company_name),
            },
            Access::RequiresPassword(client) => Self {
                destination: Destination::Login,
                company_name: client.map(|c| c.company_name),
            },
            Access::NoSuchActiveClient => Self {
                destination: Destination::Denied,
                company_name: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
    #[serde(default = "remember_by_default")]
    pub remember_device: bool,
}

fn remember_by_default() -> bool {
    true
}

fn device_credential(headers: &HeaderMap, slug: &str) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| cookie::read_device_cookie(cookies, slug))
}

pub async fn check_access(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Json<AccessResponse> {
    let credential = device_credential(&headers, &slug);
    let access = state.trust.check_access(&slug, credential.as_deref()).await;
    Json(access.into())
}

pub async fn login(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let issued = state
        .trust
        .login(&slug, &request.password, request.remember_device, user_agent)
        .await?;

    let set_cookie = issued.set_cookie_header(state.secure_cookies);
    Ok((
        AppendHeaders([(header::SET_COOKIE, set_cookie)]),
        Json(AccessResponse {
            destination: Destination::Workspace,
            company_name: Some(issued.client.company_name),
        }),
    ))
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use intake_autosave::status::SaveStatus;
use intake_core::models::process::{self, ProcessRecord};

use crate::error::ApiError;
use crate::middleware::device::AuthorizedClient;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Tab {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub processes: Vec<ProcessRecord>,
    pub tabs: Vec<Tab>,
    pub status: SaveStatus,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: SaveStatus,
}

#[derive(Debug, Serialize)]
pub struct CreatedProcess {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

pub async fn get_draft(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
) -> Result<Json<DraftResponse>, ApiError> {
    let workspace = state.workspaces.open(&client.slug).await?;
    let processes = workspace.current();
    let tabs = processes
        .iter()
        .enumerate()
        .map(|(index, p)| Tab {
            id: p.id.clone(),
            label: p.tab_label(index),
        })
        .collect();

    Ok(Json(DraftResponse {
        processes,
        tabs,
        status: workspace.status(),
    }))
}

/// Replace the whole process list; the save happens in the background.
pub async fn put_draft(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
    Json(processes): Json<Vec<ProcessRecord>>,
) -> Result<StatusCode, ApiError> {
    if processes.is_empty() {
        return Err(ApiError::BadRequest(
            "a draft needs at least one process".to_string(),
        ));
    }

    state.workspaces.open(&client.slug).await?.edit(processes);
    Ok(StatusCode::ACCEPTED)
}

pub async fn add_process(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
) -> Result<(StatusCode, Json<CreatedProcess>), ApiError> {
    let workspace = state.workspaces.open(&client.slug).await?;
    let id = workspace.modify(|processes| Ok(process::add_process(processes)))?;
    Ok((StatusCode::CREATED, Json(CreatedProcess { id })))
}

pub async fn update_process(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
    Path((_, id)): Path<(String, String)>,
    Json(update): Json<FieldUpdate>,
) -> Result<StatusCode, ApiError> {
    let workspace = state.workspaces.open(&client.slug).await?;
    workspace.modify(|processes| {
        process::update_field(processes, &id, &update.field, update.value)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_process(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
    Path((_, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let workspace = state.workspaces.open(&client.slug).await?;
    workspace.modify(|processes| process::remove_process(processes, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_status(
    State(state): State<AppState>,
    Extension(AuthorizedClient(client)): Extension<AuthorizedClient>,
) -> Result<Json<StatusResponse>, ApiError> {
    let workspace = state.workspaces.open(&client.slug).await?;
    Ok(Json(StatusResponse {
        status: workspace.status(),
    }))
}

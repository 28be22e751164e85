// HTTP request handlers
use crate::application::alert_dispatcher::AlertError;
use crate::application::commands::{Action, ActionOutcome, CommandError};
use crate::domain::alert::AlertRecord;
use crate::domain::contact::{ContactError, EmergencyContact};
use crate::domain::location::{AddressSummary, PositionSample};
use crate::domain::settings::TrackerSettings;
use crate::infrastructure::asset_cache::background_sync;
use crate::infrastructure::event_stream::event_stream_response;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Error body: `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        let status = match &e {
            CommandError::UnknownAction(_) => StatusCode::NOT_FOUND,
            CommandError::Location(_) | CommandError::Alert(AlertError::Location(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CommandError::NoLocation => StatusCode::CONFLICT,
            CommandError::Tracking(_) => StatusCode::BAD_REQUEST,
            CommandError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<ContactError> for ApiError {
    fn from(e: ContactError) -> Self {
        let status = match &e {
            ContactError::MissingField => StatusCode::BAD_REQUEST,
            ContactError::Duplicate(_) => StatusCode::CONFLICT,
            ContactError::NotFound(_) => StatusCode::NOT_FOUND,
            ContactError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub active: bool,
    pub interval_ms: u64,
    pub current: Option<PositionSample>,
    pub address: Option<AddressSummary>,
}

#[derive(Deserialize)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        active: state.tracker.is_active(),
        interval_ms: state.tracker.interval().as_millis() as u64,
        current: state.tracker.current(),
        address: state.tracker.latest_address(),
    })
}

/// Newest first
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<Vec<PositionSample>> {
    Json(state.tracker.history())
}

pub async fn get_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertRecord>> {
    Json(state.alert_log.records())
}

pub async fn list_contacts(State(state): State<Arc<AppState>>) -> Json<Vec<EmergencyContact>> {
    Json(state.contacts.list())
}

pub async fn add_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewContact>,
) -> Result<(StatusCode, Json<EmergencyContact>), ApiError> {
    let contact = EmergencyContact::new(&body.name, &body.phone)?;
    state.contacts.add(contact.clone())?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn remove_contact(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<EmergencyContact>, ApiError> {
    Ok(Json(state.contacts.remove_by_name(&name)?))
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<TrackerSettings> {
    Json(state.commands.settings())
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<TrackerSettings>,
) -> Result<Json<TrackerSettings>, ApiError> {
    Ok(Json(state.commands.apply_settings(settings)?))
}

/// Runs one of the closed set of actions, e.g. `POST /actions/send-alert`.
pub async fn run_action(
    Path(action): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let action: Action = action.parse()?;
    Ok(Json(state.commands.dispatch(action).await?))
}

pub async fn run_sync(Path(tag): Path<String>) -> StatusCode {
    if background_sync(&tag).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Newline-delimited JSON stream of UI events
pub async fn stream_events(State(state): State<Arc<AppState>>) -> Response {
    match event_stream_response(state.events.subscribe()) {
        Ok(response) => response.into_response(),
        Err(status) => status.into_response(),
    }
}

/// Offline shell assets, cache first
pub async fn serve_asset(uri: Uri, State(state): State<Arc<AppState>>) -> Response {
    match state.assets.fetch(uri.path()).await {
        Ok(Some(asset)) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::warn!("Asset fetch failed for {}: {}", uri.path(), e);
            ApiError::new(StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

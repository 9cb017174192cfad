// HTTP request handlers
use crate::application::selection::SelectionEffect;
use crate::domain::error::TrackingError;
use crate::domain::rental::NewRental;
use crate::domain::session::{Credentials, Session};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::view_stream::{stream_broadcast, stream_on_change};
use crate::presentation::app_state::AppState;
use crate::presentation::view_composer::{compose, TrackingView};
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ViewQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct SelectionResponse {
    pub effect: SelectionEffect,
    pub view: TrackingView,
}

/// Session as exposed to the browser; the token stays server-side.
#[derive(Serialize)]
pub struct SessionView {
    pub authenticated: bool,
    pub email: Option<String>,
    pub greeting: String,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            email: session.user.as_ref().map(|u| u.email.clone()),
            greeting: session.greeting(),
        }
    }
}

pub struct ApiError(pub TrackingError);

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            TrackingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TrackingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TrackingError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TrackingError::Network(_) | TrackingError::Timeout(_) | TrackingError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, headers: &HeaderMap) -> Response<Body> {
    match json_response(status, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current tracking view, optionally narrowed by a search query
pub async fn get_view(
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let view = compose(&state.tracking.snapshot(), query.q.as_deref());
    respond(StatusCode::OK, &view, &headers).await
}

/// Reload the rental directory. A failure keeps the old list and shows a banner.
pub async fn refresh_directory(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = match state.tracking.refresh().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::BAD_GATEWAY,
    };
    let view = compose(&state.tracking.snapshot(), None);
    respond(status, &view, &headers).await
}

pub async fn select_rental(
    Path(rental_id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response<Body>, ApiError> {
    let effect = state.tracking.select(&rental_id)?;
    let view = compose(&state.tracking.snapshot(), None);
    Ok(respond(StatusCode::OK, &SelectionResponse { effect, view }, &headers).await)
}

pub async fn clear_selection(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.tracking.clear_selection();
    let view = compose(&state.tracking.snapshot(), None);
    respond(StatusCode::OK, &view, &headers).await
}

/// Stream a fresh view on every tracking state change
pub async fn stream_view(Query(query): Query<ViewQuery>, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tracking = state.tracking.clone();
    let changes = tracking.subscribe_changes();
    let shutdown = tracking.subscribe_shutdown();
    stream_on_change(changes, shutdown, move || compose(&tracking.snapshot(), query.q.as_deref()))
}

/// One-time notices (blocked rental, missing telemetry, failures) as they happen
pub async fn stream_advisories(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_broadcast(state.tracking.subscribe_advisories(), state.tracking.subscribe_shutdown())
}

pub async fn create_rental(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(rental): Json<NewRental>,
) -> Result<Response<Body>, ApiError> {
    let created = state.bookings.create(rental).await?;
    Ok(respond(StatusCode::CREATED, &created, &headers).await)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.sessions.login(&credentials).await?;
    Ok(Json(SessionView::from(&session)))
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(SessionView::from(&state.sessions.current()))
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.sessions.logout()?;
    Ok(StatusCode::NO_CONTENT)
}

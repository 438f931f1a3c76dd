//! HTTP endpoint handlers. These are thin wrappers that forward to `AppState`.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::QuizError;
use crate::protocol::*;
use crate::state::{AnswerOutcome, AppState, StateError};

/// JSON error body with a status derived from the failure kind.
pub struct ApiError(StateError);

impl From<StateError> for ApiError {
  fn from(e: StateError) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = match &self.0 {
      StateError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
      StateError::Quiz(q) => match q {
        QuizError::InvalidParticipant(_) => (StatusCode::BAD_REQUEST, "invalid_participant"),
        QuizError::SessionAlreadyComplete | QuizError::SessionComplete => (StatusCode::CONFLICT, "session_complete"),
        QuizError::SessionIncomplete { .. } => (StatusCode::CONFLICT, "session_incomplete"),
        QuizError::InsufficientPool { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_pool"),
        QuizError::UnknownCategory { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "unknown_category"),
        QuizError::EmptySession => (StatusCode::UNPROCESSABLE_ENTITY, "empty_session"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "quiz_error"),
      },
      StateError::Persistence(_) => (StatusCode::BAD_GATEWAY, "persistence"),
      StateError::Pool(_) => (StatusCode::INTERNAL_SERVER_ERROR, "pool_scan"),
    };
    (status, Json(ErrorOut { error: code, message: self.0.to_string() })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, pool_size: state.pool_size().await })
}

#[instrument(level = "info", skip(state, body), fields(age = body.age, consent = body.consent))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> Result<Json<StartOut>, ApiError> {
  let (session_id, total, item) = state.start_session(&body.name, body.age, body.consent).await?;
  info!(target: "quiz", %session_id, total, "HTTP session started");
  Ok(Json(StartOut { session_id, total, item: to_item_out(&item) }))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_current_item(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CurrentOut>, ApiError> {
  let (position, total, item) = state.current(id).await?;
  Ok(Json(CurrentOut { position, total, item: to_item_out(&item) }))
}

#[instrument(level = "info", skip(state, body), fields(%id, answer = body.answer))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<AnswerOut>, ApiError> {
  let out = match state.answer(id, body.answer).await? {
    AnswerOutcome::Next { position, total, item } => AnswerOut::Next { position, total, item: to_item_out(&item) },
    AnswerOutcome::Finished { summary, saved } => {
      info!(target: "quiz", session_id = %id, score = summary.score, saved = saved.is_ok(), "HTTP session finished");
      AnswerOut::Complete {
        summary: to_summary_out(&summary),
        saved: saved.is_ok(),
        save_error: saved.err().map(|e| e.to_string()),
      }
    }
  };
  Ok(Json(out))
}

#[instrument(level = "info", skip(state), fields(n = ?q.n))]
pub async fn http_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardOut>, ApiError> {
  let entries = state.leaderboard(q.n).await?;
  Ok(Json(LeaderboardOut { entries }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reload_pool(State(state): State<Arc<AppState>>) -> Result<Json<PoolOut>, ApiError> {
  let pool_size = state.reload_pool().await?;
  Ok(Json(PoolOut { pool_size }))
}

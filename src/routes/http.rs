//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures render as `{ "error": ... }` via `AppError`.

use std::sync::Arc;
use axum::{extract::{rejection::JsonRejection, State}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::logic::{run_course_generation, run_evaluation};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, llm: state.llm_enabled() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_catalog(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(CatalogOut { sections: state.catalog.sections(), checkpoints: state.catalog.checkpoints() }).into_response()
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_evaluate(
  State(state): State<Arc<AppState>>,
  body: Result<Json<EvaluateIn>, JsonRejection>,
) -> Result<Json<EvaluateOut>, AppError> {
  let Json(body) = body?;
  let result = run_evaluation(
    &state,
    body.checkpoint_id.as_deref(),
    body.section_id.as_deref(),
    body.answers.as_ref(),
  ).await?;
  info!(target: "checkpoint", id = %result.checkpoint_id, passed = result.passed, "HTTP evaluate served");
  Ok(Json(EvaluateOut { result }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  body: Result<Json<GenerateIn>, JsonRejection>,
) -> Result<Json<GenerateOut>, AppError> {
  let Json(body) = body?;
  let course = run_course_generation(&state, body.answers.as_ref(), &body.checkpoint_results, body.mode).await?;
  info!(target: "course_wizard", modules = course.modules.len(), "HTTP generate served");
  Ok(Json(GenerateOut { course }))
}

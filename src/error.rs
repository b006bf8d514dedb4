//! Error types and their mapping to HTTP responses.
//!
//! Every failure is scoped to one request or one wizard action; nothing here is
//! fatal to the process.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures at the evaluation service boundary.
#[derive(Debug, Error)]
pub enum LlmError {
  #[error("evaluation service is not configured (set OPENAI_API_KEY)")]
  NotConfigured,
  #[error("evaluation service transport error: {0}")]
  Transport(String),
  #[error("evaluation service HTTP {status}: {message}")]
  Upstream { status: u16, message: String },
  #[error("malformed evaluation response: {0}")]
  MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
  fn from(e: reqwest::Error) -> Self { LlmError::Transport(e.to_string()) }
}

/// HTTP-facing error. Serialized as `{ "error": "<message>" }`.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  BadRequest(String),
  #[error("{0}")]
  NotFound(String),
  #[error(transparent)]
  Evaluation(#[from] LlmError),
  #[error("{0}")]
  Internal(String),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Evaluation(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "course_wizard", error = %self, "Request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    AppError::BadRequest(rejection.body_text())
  }
}

//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - the checkpoint evaluation pipeline (prompt -> evaluation service -> normalizer)
//!   - course document generation from the collected answers

use std::collections::BTreeMap;

use tracing::{info, instrument, warn};

use crate::course::{generate, GenerationMode};
use crate::domain::{Answers, EvaluationResult, GeneratedCourse};
use crate::error::AppError;
use crate::evaluation::evaluate;
use crate::normalize::normalize;
use crate::prompts::evaluation_prompts;
use crate::state::AppState;

/// Evaluate `answers` against one checkpoint.
///
/// 400 for missing or blank fields, 404 for an unknown checkpoint, 500 for anything the
/// evaluation service does wrong. A `section_id` that disagrees with the
/// checkpoint is logged; the checkpoint's own section decides which answers count.
#[instrument(level = "info", skip(state, answers), fields(checkpoint_id = ?checkpoint_id, section_id = ?section_id, answers = answers.as_ref().map(|a| a.len())))]
pub async fn run_evaluation(
  state: &AppState,
  checkpoint_id: Option<&str>,
  section_id: Option<&str>,
  answers: Option<&Answers>,
) -> Result<EvaluationResult, AppError> {
  let (Some(checkpoint_id), Some(section_id), Some(answers)) = (present(checkpoint_id), present(section_id), answers) else {
    return Err(AppError::BadRequest("Missing required fields: checkpointId, sectionId, answers".into()));
  };

  let checkpoint = state
    .catalog
    .checkpoint(checkpoint_id)
    .ok_or_else(|| AppError::NotFound(format!("Checkpoint not found: {}", checkpoint_id)))?;

  if section_id != checkpoint.after_section_id {
    warn!(target: "checkpoint", %checkpoint_id, %section_id, expected = %checkpoint.after_section_id, "sectionId does not match checkpoint; using the checkpoint's section");
  }
  let section = state
    .catalog
    .section(&checkpoint.after_section_id)
    .ok_or_else(|| AppError::Internal(format!("Checkpoint {} follows a missing section", checkpoint.id)))?;

  let generator = state.generator()?;
  let prompts = evaluation_prompts(&state.prompts, checkpoint, section, answers);
  let raw = evaluate(generator, &prompts).await?;
  let result = normalize(&raw, checkpoint)?;

  info!(
    target: "checkpoint",
    %checkpoint_id,
    score = result.overall_score,
    passed = result.passed,
    criteria = result.criteria_results.len(),
    "Checkpoint evaluated"
  );
  Ok(result)
}

/// Blank ids are treated like absent ones.
fn present(id: Option<&str>) -> Option<&str> {
  id.filter(|s| !s.trim().is_empty())
}

#[instrument(level = "info", skip_all, fields(answers = answers.map(|a| a.len()), ?mode))]
pub async fn run_course_generation(
  state: &AppState,
  answers: Option<&Answers>,
  checkpoint_results: &BTreeMap<String, EvaluationResult>,
  mode: GenerationMode,
) -> Result<GeneratedCourse, AppError> {
  let answers = answers.ok_or_else(|| AppError::BadRequest("Missing required field: answers".into()))?;
  let generator = state.generator()?;
  Ok(generate(generator, &state.prompts, answers, checkpoint_results, mode).await?)
}

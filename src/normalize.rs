//! Maps the evaluation service's loosely-typed JSON reply onto a canonical
//! `EvaluationResult`.
//!
//! The reply is read as an untyped `serde_json::Value` tree and every field has
//! a defined repair: scores are clamped into [0, 1], missing flags and texts get
//! defaults, and a missing or out-of-range overall score is recomputed from the
//! rubric weights. Only a structurally absent `criteriaResults` list fails.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{Checkpoint, CriterionResult, EvaluationResult};
use crate::error::LlmError;

/// Reply field names. The evaluation prompt's schema is built from these.
pub mod fields {
  pub const OVERALL_SCORE: &str = "overallScore";
  pub const OVERALL_FEEDBACK: &str = "overallFeedback";
  pub const CRITERIA_RESULTS: &str = "criteriaResults";
  pub const CRITERION_ID: &str = "criterionId";
  pub const PASSED: &str = "passed";
  pub const SCORE: &str = "score";
  pub const FEEDBACK: &str = "feedback";
  pub const SUGGESTIONS: &str = "suggestions";
}

/// A criterion passes on its own when the reply does not say otherwise.
pub const CRITERION_PASS_SCORE: f64 = 0.7;
pub const NO_FEEDBACK: &str = "No feedback provided";
pub const PASSED_FEEDBACK: &str = "Good work!";
pub const FAILED_FEEDBACK: &str = "Needs improvement.";

/// The reply's criteria list, or `MalformedResponse` when it is absent or not a list.
pub fn criteria_list(raw: &Value) -> Result<&Vec<Value>, LlmError> {
  let obj = raw
    .as_object()
    .ok_or_else(|| LlmError::MalformedResponse("reply is not a JSON object".into()))?;
  match obj.get(fields::CRITERIA_RESULTS) {
    Some(Value::Array(list)) => Ok(list),
    Some(_) => Err(LlmError::MalformedResponse(format!("'{}' is not a list", fields::CRITERIA_RESULTS))),
    None => Err(LlmError::MalformedResponse(format!("missing '{}'", fields::CRITERIA_RESULTS))),
  }
}

pub fn normalize(raw: &Value, checkpoint: &Checkpoint) -> Result<EvaluationResult, LlmError> {
  normalize_at(raw, checkpoint, Utc::now())
}

/// Pure form of `normalize`: the timestamp is an input.
pub fn normalize_at(raw: &Value, checkpoint: &Checkpoint, timestamp: DateTime<Utc>) -> Result<EvaluationResult, LlmError> {
  let list = criteria_list(raw)?;
  let empty = Map::new();

  let mut criteria: Vec<CriterionResult> = list
    .iter()
    .map(|entry| normalize_criterion(entry.as_object().unwrap_or(&empty)))
    .collect();

  // Rubric order first; entries the rubric doesn't know keep reply order after them.
  criteria.sort_by_key(|cr| {
    checkpoint
      .rubric
      .iter()
      .position(|c| c.id == cr.criterion_id)
      .unwrap_or(checkpoint.rubric.len())
  });

  let reported = raw.get(fields::OVERALL_SCORE).and_then(Value::as_f64);
  let overall_score = match reported {
    Some(s) if (0.0..=1.0).contains(&s) => s,
    _ => weighted_score(&criteria, checkpoint),
  };

  let passed = checkpoint.admits(overall_score);
  let overall_feedback = non_empty_str(raw.get(fields::OVERALL_FEEDBACK))
    .unwrap_or(if passed { PASSED_FEEDBACK } else { FAILED_FEEDBACK })
    .to_string();

  Ok(EvaluationResult {
    checkpoint_id: checkpoint.id.clone(),
    passed,
    overall_score,
    criteria_results: criteria,
    overall_feedback,
    timestamp,
  })
}

fn normalize_criterion(entry: &Map<String, Value>) -> CriterionResult {
  let criterion_id = match entry.get(fields::CRITERION_ID) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  };
  let score = entry.get(fields::SCORE).and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 1.0);
  let passed = entry
    .get(fields::PASSED)
    .and_then(Value::as_bool)
    .unwrap_or(score >= CRITERION_PASS_SCORE);
  let feedback = non_empty_str(entry.get(fields::FEEDBACK)).unwrap_or(NO_FEEDBACK).to_string();
  // Non-string entries keep their JSON text; only nulls are dropped.
  let suggestions = entry.get(fields::SUGGESTIONS).and_then(Value::as_array).map(|list| {
    list
      .iter()
      .filter_map(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
      })
      .collect()
  });

  CriterionResult { criterion_id, passed, score, feedback, suggestions }
}

/// Weighted mean of criterion scores.
///
/// Criteria missing from the rubric weigh 1. The denominator is the total rubric
/// weight even when the reply covers only some criteria, so partial replies
/// score lower. The result is clamped because unmatched extras can push it past 1.
pub fn weighted_score(criteria: &[CriterionResult], checkpoint: &Checkpoint) -> f64 {
  let total_weight = checkpoint.total_weight();
  if total_weight <= 0.0 {
    return 0.0;
  }
  let sum: f64 = criteria
    .iter()
    .map(|cr| {
      let weight = checkpoint.criterion(&cr.criterion_id).map(|c| c.weight).unwrap_or(1.0);
      cr.score * weight / total_weight
    })
    .sum();
  sum.clamp(0.0, 1.0)
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
  v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

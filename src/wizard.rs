//! Wizard state machine.
//!
//! One `Wizard` value is owned by each session handler and mutated only through
//! the action methods below. The persisted part (`WizardState`) is what the
//! session store saves; the phase and validation errors belong to the live
//! session and start fresh on restore.
//!
//! Per section visit:
//!
//! ```text
//! Answering --advance--> (validate) --errors--> Answering
//!                                   --gated, not passed--> CheckpointPending / Evaluated{failed}
//!                                   --otherwise--> next Answering | Complete
//! CheckpointPending --record_evaluation--> Evaluated{passed|failed}
//! Evaluated --proceed (Passed or SoftFail)--> next Answering | Complete
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::domain::{AnswerValue, Answers, Checkpoint, EvaluationResult, GeneratedCourse, Question, QuestionKind, Section};
use crate::util::display_percent;

/// Question id -> message.
pub type ValidationErrors = BTreeMap<String, String>;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WizardState {
  pub current_section_index: usize,
  #[serde(default)] pub answers: Answers,
  #[serde(default)] pub checkpoint_results: BTreeMap<String, EvaluationResult>,
  /// Grows only; order of completion.
  #[serde(default)] pub completed_section_ids: Vec<String>,
  #[serde(default)] pub generated_course: Option<GeneratedCourse>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
  Answering,
  CheckpointPending,
  Evaluated { passed: bool },
  Complete,
}

impl Phase {
  pub fn gate_open(self) -> bool {
    matches!(self, Phase::CheckpointPending | Phase::Evaluated { .. })
  }
}

/// What the checkpoint gate allows after an evaluation.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
  Passed,
  /// Not passed, but the displayed percentage reaches threshold x 100:
  /// the user may continue anyway.
  SoftFail,
  Failed,
}

/// Absorbs float noise in `threshold * 100.0` (0.07 * 100 is 7.000000000000001).
const PERCENT_TOLERANCE: f64 = 1e-9;

/// The single rule for leaving a checkpoint gate.
pub fn gate_decision(result: &EvaluationResult, checkpoint: &Checkpoint) -> GateDecision {
  if result.passed {
    GateDecision::Passed
  } else if f64::from(result.score_percent()) + PERCENT_TOLERANCE >= checkpoint.passing_threshold * 100.0 {
    GateDecision::SoftFail
  } else {
    GateDecision::Failed
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
  /// Validation failed; see `Wizard::errors`.
  Invalid,
  CheckpointRequired,
  Moved { from: usize, to: usize },
  Completed,
}

#[derive(Debug, Error, PartialEq)]
pub enum WizardError {
  #[error("unknown question '{0}'")]
  UnknownQuestion(String),
  #[error("section {0} is not reachable yet")]
  SectionLocked(usize),
  #[error("the checkpoint gate is open; revise or proceed first")]
  GateOpen,
  #[error("no checkpoint gate is open")]
  GateClosed,
  #[error("this checkpoint has not been evaluated yet")]
  NotEvaluated,
  #[error("evaluation is for checkpoint '{got}', expected '{expected}'")]
  WrongCheckpoint { expected: String, got: String },
  #[error("score {score_percent}% is below the required {required_percent}%")]
  GateBlocked { score_percent: u32, required_percent: u32 },
  #[error("all sections must be completed first")]
  NotComplete,
}

/// Checkpoint gate summary for the presentation layer.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GateView {
  pub checkpoint_id: String,
  pub required_percent: u32,
  pub decision: Option<GateDecision>,
  pub score_percent: Option<u32>,
  pub passed_count: usize,
  pub total_count: usize,
}

#[derive(Clone, Debug)]
pub struct Wizard {
  state: WizardState,
  phase: Phase,
  errors: ValidationErrors,
}

impl Default for Wizard {
  fn default() -> Self { Self::new() }
}

impl Wizard {
  pub fn new() -> Self {
    Self { state: WizardState::default(), phase: Phase::Answering, errors: ValidationErrors::new() }
  }

  /// Resume from a saved state. An out-of-range index is pulled back to the last section.
  pub fn restore(mut state: WizardState, catalog: &Catalog) -> Self {
    let last = catalog.section_count().saturating_sub(1);
    if state.current_section_index > last {
      state.current_section_index = last;
    }
    Self { state, phase: Phase::Answering, errors: ValidationErrors::new() }
  }

  pub fn state(&self) -> &WizardState { &self.state }
  pub fn phase(&self) -> Phase { self.phase }
  pub fn errors(&self) -> &ValidationErrors { &self.errors }

  pub fn current_section<'c>(&self, catalog: &'c Catalog) -> Option<&'c Section> {
    catalog.section_at(self.state.current_section_index)
  }

  pub fn current_checkpoint<'c>(&self, catalog: &'c Catalog) -> Option<&'c Checkpoint> {
    self.current_section(catalog).and_then(|s| catalog.checkpoint_for_section(&s.id))
  }

  /// Stored answers for one section's questions only.
  pub fn section_answers(&self, section: &Section) -> Answers {
    section
      .questions
      .iter()
      .filter_map(|q| self.state.answers.get(&q.id).map(|v| (q.id.clone(), v.clone())))
      .collect()
  }

  /// Store an answer and drop any validation error shown for that question.
  pub fn set_answer(&mut self, catalog: &Catalog, question_id: &str, value: AnswerValue) -> Result<(), WizardError> {
    if catalog.question(question_id).is_none() {
      return Err(WizardError::UnknownQuestion(question_id.to_string()));
    }
    if self.phase.gate_open() {
      return Err(WizardError::GateOpen);
    }
    self.state.answers.insert(question_id.to_string(), value.deduplicated());
    self.errors.remove(question_id);
    Ok(())
  }

  /// The "continue" action: validate, then either open the gate or move on.
  pub fn advance(&mut self, catalog: &Catalog) -> Result<Transition, WizardError> {
    match self.phase {
      Phase::Answering => {}
      Phase::Complete => return Ok(Transition::Completed),
      Phase::CheckpointPending | Phase::Evaluated { .. } => return Err(WizardError::GateOpen),
    }
    let Some(section) = self.current_section(catalog) else {
      return Ok(Transition::Completed);
    };

    let errors = validate_section(section, &self.state.answers);
    if !errors.is_empty() {
      debug!(target: "wizard", section = %section.id, errors = errors.len(), "Section validation failed");
      self.errors = errors;
      return Ok(Transition::Invalid);
    }
    self.errors.clear();

    if let Some(checkpoint) = catalog.checkpoint_for_section(&section.id) {
      match self.state.checkpoint_results.get(&checkpoint.id) {
        Some(r) if r.passed => {}
        Some(_) => {
          self.phase = Phase::Evaluated { passed: false };
          return Ok(Transition::CheckpointRequired);
        }
        None => {
          self.phase = Phase::CheckpointPending;
          info!(target: "wizard", section = %section.id, checkpoint = %checkpoint.id, "Checkpoint gate opened");
          return Ok(Transition::CheckpointRequired);
        }
      }
    }

    Ok(self.complete_and_move(catalog))
  }

  /// The checkpoint the open gate is waiting on.
  pub fn pending_checkpoint<'c>(&self, catalog: &'c Catalog) -> Result<&'c Checkpoint, WizardError> {
    if !self.phase.gate_open() {
      return Err(WizardError::GateClosed);
    }
    self.current_checkpoint(catalog).ok_or(WizardError::GateClosed)
  }

  /// Store a fresh evaluation, replacing any earlier one for the checkpoint.
  pub fn record_evaluation(&mut self, catalog: &Catalog, result: EvaluationResult) -> Result<GateDecision, WizardError> {
    let checkpoint = self.pending_checkpoint(catalog)?;
    if result.checkpoint_id != checkpoint.id {
      return Err(WizardError::WrongCheckpoint { expected: checkpoint.id.clone(), got: result.checkpoint_id });
    }
    let decision = gate_decision(&result, checkpoint);
    self.phase = Phase::Evaluated { passed: result.passed };
    info!(target: "wizard", checkpoint = %checkpoint.id, score = result.overall_score, ?decision, "Evaluation recorded");
    self.state.checkpoint_results.insert(checkpoint.id.clone(), result);
    Ok(decision)
  }

  /// Leave the gate after a pass, or after a soft fail ("continue anyway").
  pub fn proceed(&mut self, catalog: &Catalog) -> Result<Transition, WizardError> {
    let checkpoint = self.pending_checkpoint(catalog)?;
    let result = self.state.checkpoint_results.get(&checkpoint.id).ok_or(WizardError::NotEvaluated)?;
    let decision = gate_decision(result, checkpoint);
    let score_percent = result.score_percent();
    match decision {
      GateDecision::Passed | GateDecision::SoftFail => Ok(self.complete_and_move(catalog)),
      GateDecision::Failed => Err(WizardError::GateBlocked {
        score_percent,
        required_percent: display_percent(checkpoint.passing_threshold),
      }),
    }
  }

  /// Close the gate and return to the section's questions.
  pub fn revise(&mut self) {
    if self.phase.gate_open() {
      self.phase = Phase::Answering;
    }
  }

  /// Hide the gate if shown; otherwise step back one section.
  pub fn back(&mut self) {
    match self.phase {
      Phase::CheckpointPending | Phase::Evaluated { .. } | Phase::Complete => self.phase = Phase::Answering,
      Phase::Answering => {
        if self.state.current_section_index > 0 {
          self.state.current_section_index -= 1;
          self.errors.clear();
        }
      }
    }
  }

  /// Jump to a section at or before the current one, or to any completed one.
  pub fn go_to_section(&mut self, catalog: &Catalog, index: usize) -> Result<(), WizardError> {
    let section = catalog.section_at(index).ok_or(WizardError::SectionLocked(index))?;
    let reachable = index <= self.state.current_section_index || self.is_completed(&section.id);
    if !reachable {
      return Err(WizardError::SectionLocked(index));
    }
    self.state.current_section_index = index;
    self.phase = Phase::Answering;
    self.errors.clear();
    Ok(())
  }

  pub fn set_generated_course(&mut self, course: GeneratedCourse) -> Result<(), WizardError> {
    if self.phase != Phase::Complete {
      return Err(WizardError::NotComplete);
    }
    self.state.generated_course = Some(course);
    Ok(())
  }

  pub fn reset(&mut self) {
    *self = Self::new();
  }

  pub fn is_completed(&self, section_id: &str) -> bool {
    self.state.completed_section_ids.iter().any(|id| id == section_id)
  }

  pub fn gate(&self, catalog: &Catalog) -> Option<GateView> {
    let checkpoint = self.current_checkpoint(catalog)?;
    let result = self.state.checkpoint_results.get(&checkpoint.id);
    Some(GateView {
      checkpoint_id: checkpoint.id.clone(),
      required_percent: display_percent(checkpoint.passing_threshold),
      decision: result.map(|r| gate_decision(r, checkpoint)),
      score_percent: result.map(EvaluationResult::score_percent),
      passed_count: result.map(EvaluationResult::passed_count).unwrap_or(0),
      total_count: result.map(|r| r.criteria_results.len()).unwrap_or(checkpoint.rubric.len()),
    })
  }

  fn complete_and_move(&mut self, catalog: &Catalog) -> Transition {
    let from = self.state.current_section_index;
    if let Some(section) = catalog.section_at(from) {
      if !self.is_completed(&section.id) {
        self.state.completed_section_ids.push(section.id.clone());
      }
    }
    if from + 1 < catalog.section_count() {
      self.state.current_section_index = from + 1;
      self.phase = Phase::Answering;
      info!(target: "wizard", from, to = from + 1, "Advanced to next section");
      Transition::Moved { from, to: from + 1 }
    } else {
      self.phase = Phase::Complete;
      info!(target: "wizard", "All sections complete");
      Transition::Completed
    }
  }
}

pub fn validate_section(section: &Section, answers: &Answers) -> ValidationErrors {
  section
    .questions
    .iter()
    .filter_map(|q| validate_answer(q, answers.get(&q.id)).map(|msg| (q.id.clone(), msg)))
    .collect()
}

/// First rule the answer breaks, if any. Multi-select values are concatenated
/// before the required and length checks, and length limits apply even to an
/// empty optional answer.
pub fn validate_answer(question: &Question, value: Option<&AnswerValue>) -> Option<String> {
  let joined = value.map(AnswerValue::concatenated).unwrap_or_default();

  if question.required && joined.trim().is_empty() {
    return Some("This field is required".into());
  }

  if let Some(rules) = &question.validation {
    let len = joined.chars().count();
    if let Some(min) = rules.min_length.filter(|min| *min > 0 && len < *min) {
      return Some(format!("Minimum {} characters required", min));
    }
    if let Some(max) = rules.max_length.filter(|max| *max > 0 && len > *max) {
      return Some(format!("Maximum {} characters allowed", max));
    }
  }

  if question.kind == QuestionKind::Multiselect && question.required {
    match value {
      Some(AnswerValue::Multiple(values)) if !values.is_empty() => {}
      _ => return Some("Please select at least one option".into()),
    }
  }

  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CriterionResult, QuestionOption, RubricCriterion, Validation};
  use chrono::Utc;

  fn q(id: &str, required: bool) -> Question {
    Question {
      id: id.into(),
      kind: QuestionKind::Text,
      label: id.to_uppercase(),
      description: None,
      placeholder: None,
      required,
      options: Vec::new(),
      validation: None,
    }
  }

  /// intro (gated by cp-intro) -> notes (ungated) -> outro (ungated)
  fn catalog() -> Catalog {
    let section = |id: &str, questions: Vec<Question>, checkpoint: Option<&str>| Section {
      id: id.into(),
      title: id.into(),
      description: String::new(),
      questions,
      checkpoint_id: checkpoint.map(str::to_string),
    };
    let mut topics = q("topics", false);
    topics.kind = QuestionKind::Multiselect;
    topics.options = vec![
      QuestionOption { value: "a".into(), label: "A".into() },
      QuestionOption { value: "b".into(), label: "B".into() },
    ];
    Catalog::new(
      vec![
        section("intro", vec![q("title", true), q("summary", false)], Some("cp-intro")),
        section("notes", vec![q("notes", false), topics], None),
        section("outro", vec![q("closing", true)], None),
      ],
      vec![Checkpoint {
        id: "cp-intro".into(),
        name: "Intro review".into(),
        description: String::new(),
        after_section_id: "intro".into(),
        passing_threshold: 0.75,
        rubric: vec![RubricCriterion {
          id: "clarity".into(),
          name: "Clarity".into(),
          description: String::new(),
          evaluation_prompt: "clear?".into(),
          weight: 1.0,
        }],
      }],
    )
    .expect("catalog")
  }

  fn result(score: f64, passed: bool) -> EvaluationResult {
    EvaluationResult {
      checkpoint_id: "cp-intro".into(),
      passed,
      overall_score: score,
      criteria_results: vec![CriterionResult {
        criterion_id: "clarity".into(),
        passed,
        score,
        feedback: "fb".into(),
        suggestions: None,
      }],
      overall_feedback: "overall".into(),
      timestamp: Utc::now(),
    }
  }

  fn single(s: &str) -> AnswerValue { AnswerValue::Single(s.into()) }

  fn at_gate(cat: &Catalog) -> Wizard {
    let mut w = Wizard::new();
    w.set_answer(cat, "title", single("My course")).expect("answer");
    assert_eq!(w.advance(cat), Ok(Transition::CheckpointRequired));
    w
  }

  #[test]
  fn blank_required_question_blocks_until_edited() {
    let cat = catalog();
    let mut w = Wizard::new();
    assert_eq!(w.advance(&cat), Ok(Transition::Invalid));
    assert_eq!(w.errors().get("title").map(String::as_str), Some("This field is required"));
    assert_eq!(w.state().current_section_index, 0);
    assert_eq!(w.phase(), Phase::Answering);

    w.set_answer(&cat, "title", single("Data ethics")).expect("answer");
    assert!(w.errors().is_empty());
  }

  #[test]
  fn gated_section_opens_checkpoint_instead_of_advancing() {
    let cat = catalog();
    let w = at_gate(&cat);
    assert_eq!(w.phase(), Phase::CheckpointPending);
    assert_eq!(w.state().current_section_index, 0);
    assert!(w.state().completed_section_ids.is_empty());
    assert_eq!(w.pending_checkpoint(&cat).map(|c| c.id.as_str()), Ok("cp-intro"));
  }

  #[test]
  fn passing_evaluation_lets_the_user_proceed() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    assert_eq!(w.record_evaluation(&cat, result(0.9, true)), Ok(GateDecision::Passed));
    assert_eq!(w.phase(), Phase::Evaluated { passed: true });
    assert_eq!(w.proceed(&cat), Ok(Transition::Moved { from: 0, to: 1 }));
    assert_eq!(w.state().completed_section_ids, vec!["intro".to_string()]);
    assert_eq!(w.phase(), Phase::Answering);
  }

  #[test]
  fn hard_fail_blocks_and_soft_fail_allows_override() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    assert_eq!(w.record_evaluation(&cat, result(0.5, false)), Ok(GateDecision::Failed));
    assert_eq!(w.proceed(&cat), Err(WizardError::GateBlocked { score_percent: 50, required_percent: 75 }));

    // 0.745 shows as 75%, which meets the displayed threshold.
    assert_eq!(w.record_evaluation(&cat, result(0.745, false)), Ok(GateDecision::SoftFail));
    assert_eq!(w.state().checkpoint_results["cp-intro"].overall_score, 0.745);
    assert_eq!(w.proceed(&cat), Ok(Transition::Moved { from: 0, to: 1 }));
  }

  #[test]
  fn revisiting_a_failed_gate_reopens_it_with_the_old_result() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.4, false)).expect("record");
    w.revise();
    assert_eq!(w.phase(), Phase::Answering);
    w.set_answer(&cat, "summary", single("more detail")).expect("answer");
    assert_eq!(w.advance(&cat), Ok(Transition::CheckpointRequired));
    assert_eq!(w.phase(), Phase::Evaluated { passed: false });
    assert_eq!(w.gate(&cat).and_then(|g| g.score_percent), Some(40));
  }

  #[test]
  fn re_evaluation_replaces_the_stored_result() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.4, false)).expect("first");
    let mut second = result(0.8, true);
    second.criteria_results.clear();
    w.record_evaluation(&cat, second).expect("second");
    let stored = &w.state().checkpoint_results["cp-intro"];
    assert!(stored.passed);
    assert!(stored.criteria_results.is_empty());
    assert_eq!(w.state().checkpoint_results.len(), 1);
  }

  #[test]
  fn ungated_section_advances_directly() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.9, true)).expect("record");
    w.proceed(&cat).expect("proceed");

    assert_eq!(w.advance(&cat), Ok(Transition::Moved { from: 1, to: 2 }));
    assert_eq!(w.phase(), Phase::Answering);
    assert_eq!(w.state().completed_section_ids, vec!["intro".to_string(), "notes".to_string()]);
  }

  #[test]
  fn passed_checkpoint_is_not_asked_again() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.9, true)).expect("record");
    w.proceed(&cat).expect("proceed");
    w.go_to_section(&cat, 0).expect("back to intro");
    assert_eq!(w.advance(&cat), Ok(Transition::Moved { from: 0, to: 1 }));
  }

  #[test]
  fn final_section_completes_the_wizard() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.9, true)).expect("record");
    w.proceed(&cat).expect("proceed");
    w.advance(&cat).expect("notes");
    w.set_answer(&cat, "closing", single("Thanks")).expect("answer");
    assert_eq!(w.advance(&cat), Ok(Transition::Completed));
    assert_eq!(w.phase(), Phase::Complete);
    assert_eq!(w.state().completed_section_ids.len(), 3);

    w.back();
    assert_eq!(w.phase(), Phase::Answering);
    assert_eq!(w.state().current_section_index, 2);
  }

  #[test]
  fn navigation_is_bounded_by_progress() {
    let cat = catalog();
    let mut w = Wizard::new();
    assert_eq!(w.go_to_section(&cat, 1), Err(WizardError::SectionLocked(1)));
    assert_eq!(w.go_to_section(&cat, 9), Err(WizardError::SectionLocked(9)));

    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.9, true)).expect("record");
    w.proceed(&cat).expect("proceed");
    assert_eq!(w.go_to_section(&cat, 2), Err(WizardError::SectionLocked(2)));
    w.go_to_section(&cat, 0).expect("backward is fine");
    assert_eq!(w.go_to_section(&cat, 1), Err(WizardError::SectionLocked(1)));
    assert_eq!(w.advance(&cat), Ok(Transition::Moved { from: 0, to: 1 }));

    w.back();
    assert_eq!(w.state().current_section_index, 0);
    w.back();
    assert_eq!(w.state().current_section_index, 0);
  }

  #[test]
  fn gate_rejects_edits_and_foreign_results() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    assert_eq!(w.set_answer(&cat, "title", single("x")), Err(WizardError::GateOpen));
    assert_eq!(w.set_answer(&cat, "nope", single("x")), Err(WizardError::UnknownQuestion("nope".into())));
    let mut other = result(0.9, true);
    other.checkpoint_id = "cp-other".into();
    assert!(matches!(w.record_evaluation(&cat, other), Err(WizardError::WrongCheckpoint { .. })));
    assert_eq!(w.proceed(&cat), Err(WizardError::NotEvaluated));

    let mut fresh = Wizard::new();
    assert_eq!(fresh.record_evaluation(&cat, result(0.9, true)), Err(WizardError::GateClosed));
  }

  #[test]
  fn reset_clears_everything_and_restore_clamps_index() {
    let cat = catalog();
    let mut w = at_gate(&cat);
    w.record_evaluation(&cat, result(0.9, true)).expect("record");
    w.reset();
    assert_eq!(w.state(), &WizardState::default());
    assert_eq!(w.phase(), Phase::Answering);

    let saved = WizardState { current_section_index: 42, ..WizardState::default() };
    assert_eq!(Wizard::restore(saved, &cat).state().current_section_index, 2);
  }

  #[test]
  fn section_answers_only_cover_that_section() {
    let cat = catalog();
    let mut w = Wizard::new();
    w.set_answer(&cat, "title", single("T")).expect("answer");
    w.set_answer(&cat, "closing", single("C")).expect("answer");
    let intro = cat.section("intro").expect("intro");
    let answers = w.section_answers(intro);
    assert_eq!(answers.len(), 1);
    assert!(answers.contains_key("title"));
  }

  #[test]
  fn soft_fail_compares_display_percent_with_raw_threshold() {
    let cat = catalog();
    let mut cp = cat.checkpoint("cp-intro").expect("checkpoint").clone();

    cp.passing_threshold = 0.07;
    assert_eq!(gate_decision(&result(0.066, false), &cp), GateDecision::SoftFail);
    assert_eq!(gate_decision(&result(0.064, false), &cp), GateDecision::Failed);

    // 75% shown, 75.5% required
    cp.passing_threshold = 0.755;
    assert_eq!(gate_decision(&result(0.752, false), &cp), GateDecision::Failed);
    assert_eq!(gate_decision(&result(0.756, false), &cp), GateDecision::SoftFail);
    assert_eq!(gate_decision(&result(0.2, true), &cp), GateDecision::Passed);
  }

  #[test]
  fn validation_rules() {
    let mut long = q("long", false);
    long.validation = Some(Validation { min_length: Some(5), max_length: Some(8) });
    assert_eq!(validate_answer(&long, Some(&single("abc"))).as_deref(), Some("Minimum 5 characters required"));
    assert_eq!(validate_answer(&long, Some(&single("abcdefghi"))).as_deref(), Some("Maximum 8 characters allowed"));
    assert_eq!(validate_answer(&long, Some(&single("abcdef"))), None);
    assert_eq!(validate_answer(&q("r", true), Some(&single("   "))).as_deref(), Some("This field is required"));
    assert_eq!(validate_answer(&q("r", true), None).as_deref(), Some("This field is required"));
    assert_eq!(validate_answer(&q("o", false), None), None);
  }

  #[test]
  fn length_rules_apply_to_empty_optional_answers() {
    let mut long = q("long", false);
    long.validation = Some(Validation { min_length: Some(5), max_length: None });
    assert_eq!(validate_answer(&long, None).as_deref(), Some("Minimum 5 characters required"));
    assert_eq!(validate_answer(&long, Some(&single(""))).as_deref(), Some("Minimum 5 characters required"));

    let cat = catalog();
    let mut w = Wizard::new();
    w.set_answer(&cat, "title", single("T")).expect("answer");
    let mut section = cat.section("intro").expect("intro").clone();
    section.questions[1].validation = Some(Validation { min_length: Some(3), max_length: None });
    let errors = validate_section(&section, &w.state().answers);
    assert_eq!(errors.get("summary").map(String::as_str), Some("Minimum 3 characters required"));
  }

  #[test]
  fn multiselect_rules() {
    let cat = catalog();
    let topics = cat.question("topics").expect("topics").clone();
    let multi = |v: &[&str]| AnswerValue::Multiple(v.iter().map(|s| s.to_string()).collect());
    // optional: anything goes, including values outside the listed options
    assert_eq!(validate_answer(&topics, Some(&multi(&["a", "b"]))), None);
    assert_eq!(validate_answer(&topics, Some(&multi(&["z"]))), None);
    assert_eq!(validate_answer(&topics, Some(&single("a"))), None);
    assert_eq!(validate_answer(&topics, None), None);

    let mut required_topics = topics.clone();
    required_topics.required = true;
    assert_eq!(validate_answer(&required_topics, Some(&multi(&[]))).as_deref(), Some("This field is required"));
    assert_eq!(validate_answer(&required_topics, Some(&single("a"))).as_deref(), Some("Please select at least one option"));
    assert_eq!(validate_answer(&required_topics, Some(&multi(&["a"]))), None);
  }

  #[test]
  fn select_and_number_answers_are_not_range_checked() {
    let mut level = q("level", true);
    level.kind = QuestionKind::Select;
    level.options = vec![QuestionOption { value: "intro".into(), label: "Intro".into() }];
    assert_eq!(validate_answer(&level, Some(&single("advanced"))), None);

    let mut hours = q("hours", false);
    hours.kind = QuestionKind::Number;
    assert_eq!(validate_answer(&hours, Some(&single("three"))), None);
    assert_eq!(validate_answer(&hours, Some(&single("40"))), None);
  }

}

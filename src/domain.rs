//! Domain models: the question catalog (sections, questions, checkpoints with
//! weighted rubrics), user answers, and evaluation results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a question is answered in the wizard.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
  Text,
  Textarea,
  Select,
  Multiselect,
  Number,
}
impl Default for QuestionKind {
  fn default() -> Self { QuestionKind::Text }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionOption {
  pub value: String,
  pub label: String,
}

/// Optional per-question constraints, checked when the user tries to advance.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
  #[serde(default, skip_serializing_if = "Option::is_none")] pub min_length: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub max_length: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id: String,
  #[serde(rename = "type", default)]
  pub kind: QuestionKind,
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub placeholder: Option<String>,
  #[serde(default)] pub required: bool,
  #[serde(default, skip_serializing_if = "Vec::is_empty")] pub options: Vec<QuestionOption>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub validation: Option<Validation>,
}

/// An ordered group of questions shown together.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub questions: Vec<Question>,
  /// Checkpoint gating progress past this section, if any.
  #[serde(default, alias = "checkpoint_id", skip_serializing_if = "Option::is_none")] pub checkpoint_id: Option<String>,
}

impl Section {
  pub fn question(&self, id: &str) -> Option<&Question> {
    self.questions.iter().find(|q| q.id == id)
  }
}

/// One weighted, independently scored dimension of a checkpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RubricCriterion {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: String,
  /// Free text handed verbatim to the evaluator.
  #[serde(alias = "evaluation_prompt")]
  pub evaluation_prompt: String,
  /// Relative weight, not normalized.
  pub weight: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
  pub id: String,
  pub name: String,
  #[serde(default)] pub description: String,
  #[serde(alias = "after_section_id")]
  pub after_section_id: String,
  pub rubric: Vec<RubricCriterion>,
  /// 0..=1, e.g. 0.75.
  #[serde(alias = "passing_threshold")]
  pub passing_threshold: f64,
}

impl Checkpoint {
  pub fn criterion(&self, id: &str) -> Option<&RubricCriterion> {
    self.rubric.iter().find(|c| c.id == id)
  }

  pub fn total_weight(&self) -> f64 {
    self.rubric.iter().map(|c| c.weight).sum()
  }

  /// The one comparison that decides whether a score clears this checkpoint.
  pub fn admits(&self, overall_score: f64) -> bool {
    overall_score >= self.passing_threshold
  }
}

/// A stored answer: free text / single choice, or a multi-select.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
  Single(String),
  Multiple(Vec<String>),
}

impl AnswerValue {
  /// Display form used in prompts: multi-select values joined with ", ".
  pub fn display(&self) -> String {
    match self {
      AnswerValue::Single(s) => s.clone(),
      AnswerValue::Multiple(v) => v.join(", "),
    }
  }

  /// Concatenated form used for length checks.
  pub fn concatenated(&self) -> String {
    match self {
      AnswerValue::Single(s) => s.clone(),
      AnswerValue::Multiple(v) => v.concat(),
    }
  }

  pub fn is_blank(&self) -> bool {
    match self {
      AnswerValue::Single(s) => s.trim().is_empty(),
      AnswerValue::Multiple(v) => v.iter().all(|s| s.trim().is_empty()),
    }
  }

  /// Multi-selects are ordered sets: drop repeated values, keep first occurrence.
  pub fn deduplicated(self) -> Self {
    match self {
      AnswerValue::Multiple(v) => {
        let mut out: Vec<String> = Vec::with_capacity(v.len());
        for s in v {
          if !out.contains(&s) { out.push(s); }
        }
        AnswerValue::Multiple(out)
      }
      single => single,
    }
  }
}

/// Answers keyed by question id.
pub type Answers = BTreeMap<String, AnswerValue>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CriterionResult {
  pub criterion_id: String,
  pub passed: bool,
  pub score: f64,
  pub feedback: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggestions: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
  pub checkpoint_id: String,
  pub passed: bool,
  pub overall_score: f64,
  pub criteria_results: Vec<CriterionResult>,
  pub overall_feedback: String,
  pub timestamp: DateTime<Utc>,
}

impl EvaluationResult {
  /// Percentage as shown to the user (rounded).
  pub fn score_percent(&self) -> u32 {
    crate::util::display_percent(self.overall_score)
  }

  pub fn passed_count(&self) -> usize {
    self.criteria_results.iter().filter(|c| c.passed).count()
  }
}

// -------- Generated course document --------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCourse {
  pub title: String,
  pub description: String,
  pub welcome_message: String,
  pub modules: Vec<CourseModule>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
  #[serde(default)] pub id: String,
  #[serde(default)] pub name: String,
  #[serde(default)] pub position: u32,
  #[serde(default)] pub items: Vec<CourseItem>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CourseItemKind {
  Assignment,
  Discussion,
  Quiz,
  File,
  Header,
  /// Also used for any type the generator invents.
  #[serde(other)]
  Page,
}
impl Default for CourseItemKind {
  fn default() -> Self { CourseItemKind::Page }
}

impl CourseItemKind {
  pub fn as_str(self) -> &'static str {
    match self {
      CourseItemKind::Assignment => "assignment",
      CourseItemKind::Discussion => "discussion",
      CourseItemKind::Quiz => "quiz",
      CourseItemKind::File => "file",
      CourseItemKind::Header => "header",
      CourseItemKind::Page => "page",
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseItem {
  #[serde(default)] pub id: String,
  #[serde(rename = "type", default)] pub kind: CourseItemKind,
  #[serde(default)] pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub content: Option<String>,
  #[serde(default)] pub position: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub points: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub due_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub rubric: Option<CourseRubric>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub questions: Option<Vec<QuizQuestion>>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub prompt: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CourseRubric {
  #[serde(default)] pub title: String,
  #[serde(default)] pub criteria: Vec<CourseRubricCriterion>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CourseRubricCriterion {
  #[serde(default)] pub description: String,
  #[serde(default)] pub points: f64,
  #[serde(default)] pub ratings: Vec<RubricRating>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RubricRating {
  #[serde(default)] pub description: String,
  #[serde(default)] pub points: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizQuestionKind {
  MultipleChoice,
  ShortAnswer,
  #[serde(other)]
  Essay,
}
impl Default for QuizQuestionKind {
  fn default() -> Self { QuizQuestionKind::Essay }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
  #[serde(rename = "type", default)]
  pub kind: QuizQuestionKind,
  #[serde(default)] pub text: String,
  #[serde(default)] pub points: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub answers: Option<Vec<QuizAnswer>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizAnswer {
  #[serde(default)] pub text: String,
  #[serde(default)] pub correct: bool,
}

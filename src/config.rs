//! Loading wizard configuration (prompts + optional catalog) from TOML.
//!
//! See `WizardConfig` and `Prompts` for the expected schema. Catalog entries use
//! the same camelCase keys as the JSON API, e.g.:
//!
//! ```toml
//! [prompts]
//! evaluation_system = "You are a strict reviewer..."
//!
//! [[sections]]
//! id = "overview"
//! title = "Overview"
//! checkpointId = "cp-1"
//! questions = [{ id = "title", type = "text", label = "Title", required = true }]
//!
//! [[checkpoints]]
//! id = "cp-1"
//! name = "Overview Review"
//! afterSectionId = "overview"
//! passingThreshold = 0.75
//! rubric = [{ id = "clear", name = "Clarity", evaluationPrompt = "Is it clear?", weight = 1.0 }]
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::domain::{Checkpoint, Section};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid catalog: {0}")]
  InvalidCatalog(String),
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct WizardConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub sections: Vec<Section>,
  #[serde(default)]
  pub checkpoints: Vec<Checkpoint>,
}

impl WizardConfig {
  /// The configured catalog, or the built-in one when the file defines no sections.
  pub fn catalog(&self) -> Result<Catalog, ConfigError> {
    if self.sections.is_empty() {
      if !self.checkpoints.is_empty() {
        return Err(ConfigError::InvalidCatalog("checkpoints given without sections".into()));
      }
      return Ok(Catalog::builtin());
    }
    Catalog::new(self.sections.clone(), self.checkpoints.clone())
  }
}

/// System prompts sent to the evaluation service. The user prompts (and the
/// output schemas they carry) are built in `prompts.rs` and are not configurable.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub evaluation_system: String,
  pub course_system: String,
  /// Chunked generation: skeleton call.
  pub structure_system: String,
  /// Chunked generation: one call per module.
  pub module_system: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      evaluation_system: DEFAULT_EVALUATION_SYSTEM.trim().into(),
      course_system: DEFAULT_COURSE_SYSTEM.trim().into(),
      structure_system: DEFAULT_STRUCTURE_SYSTEM.trim().into(),
      module_system: DEFAULT_MODULE_SYSTEM.trim().into(),
    }
  }
}

const DEFAULT_EVALUATION_SYSTEM: &str = r#"
You are an expert instructional designer and course evaluator. Your role is to evaluate course design elements against established rubric criteria.

When evaluating, consider:
- Best practices in instructional design
- Bloom's taxonomy for learning objectives
- Alignment between objectives, content, and assessments
- Clarity and specificity of descriptions
- Feasibility and appropriateness for the stated context

Be constructive in your feedback. When something doesn't meet criteria, explain why and provide specific suggestions for improvement.

CRITICAL: You must respond with raw JSON only. Do NOT wrap your response in markdown code blocks. Do NOT include any text before or after the JSON. Start your response with { and end with }.
"#;

const DEFAULT_COURSE_SYSTEM: &str = r#"
You are an expert instructional designer specializing in Canvas LMS course development. Your role is to generate complete, ready-to-use course content based on the instructor's design specifications.

When generating content:
- Create professional, engaging content appropriate for the course level
- Ensure all content aligns with stated learning objectives
- Use clear, accessible language
- Include relevant examples and explanations
- Create detailed rubrics with clear criteria
- Design assessment items that measure learning objectives

CRITICAL: You must respond with raw JSON only. Do NOT wrap your response in markdown code blocks. Do NOT include any text before or after the JSON. Start your response with { and end with }.
"#;

const DEFAULT_STRUCTURE_SYSTEM: &str = r#"
You are an expert instructional designer. Your role is to design the structure of a Canvas LMS course based on instructor specifications.

CRITICAL: You must respond with raw JSON only. Do NOT wrap your response in markdown code blocks. Do NOT include any text before or after the JSON. Start your response with { and end with }.
"#;

const DEFAULT_MODULE_SYSTEM: &str = r#"
You are an expert instructional designer. Your role is to generate detailed content for a specific module in a Canvas LMS course.

When generating content:
- Create professional, engaging content appropriate for the course level
- Ensure content aligns with learning objectives
- Use clear, accessible language
- Include relevant examples
- Use semantic section headings and callout boxes for important notes, tips, and warnings

CRITICAL: You must respond with raw JSON only. Do NOT wrap your response in markdown code blocks. Do NOT include any text before or after the JSON. Start your response with { and end with }.
"#;

/// Attempt to load `WizardConfig` from WIZARD_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_wizard_config_from_env() -> Option<WizardConfig> {
  let path = std::env::var("WIZARD_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<WizardConfig>(&s) {
      Ok(cfg) => {
        info!(target: "course_wizard", %path, sections = cfg.sections.len(), checkpoints = cfg.checkpoints.len(), "Loaded wizard config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "course_wizard", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "course_wizard", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

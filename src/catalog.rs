//! Read-only lookup over the static catalog (sections, questions, checkpoints).

use std::collections::HashSet;

use crate::config::ConfigError;
use crate::domain::{Checkpoint, Question, QuestionKind, Section};
use crate::seeds::{seed_checkpoints, seed_sections};

#[derive(Clone, Debug)]
pub struct Catalog {
  sections: Vec<Section>,
  checkpoints: Vec<Checkpoint>,
}

impl Catalog {
  /// Build and validate a catalog. Sections keep the given order.
  pub fn new(sections: Vec<Section>, checkpoints: Vec<Checkpoint>) -> Result<Self, ConfigError> {
    let catalog = Self { sections, checkpoints };
    catalog.validate()?;
    Ok(catalog)
  }

  pub fn builtin() -> Self {
    Self { sections: seed_sections(), checkpoints: seed_checkpoints() }
  }

  pub fn sections(&self) -> &[Section] { &self.sections }
  pub fn checkpoints(&self) -> &[Checkpoint] { &self.checkpoints }
  pub fn section_count(&self) -> usize { self.sections.len() }

  pub fn section(&self, id: &str) -> Option<&Section> {
    self.sections.iter().find(|s| s.id == id)
  }

  pub fn section_at(&self, index: usize) -> Option<&Section> {
    self.sections.get(index)
  }

  pub fn checkpoint(&self, id: &str) -> Option<&Checkpoint> {
    self.checkpoints.iter().find(|c| c.id == id)
  }

  pub fn checkpoint_for_section(&self, section_id: &str) -> Option<&Checkpoint> {
    self.checkpoints.iter().find(|c| c.after_section_id == section_id)
  }

  /// Question lookup across all sections.
  pub fn question(&self, id: &str) -> Option<&Question> {
    self.sections.iter().find_map(|s| s.question(id))
  }

  fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::InvalidCatalog(msg));

    if self.sections.is_empty() {
      return invalid("catalog has no sections".into());
    }

    let mut section_ids = HashSet::new();
    let mut question_ids = HashSet::new();
    for s in &self.sections {
      if !section_ids.insert(s.id.as_str()) {
        return invalid(format!("duplicate section id '{}'", s.id));
      }
      for q in &s.questions {
        if !question_ids.insert(q.id.as_str()) {
          return invalid(format!("duplicate question id '{}'", q.id));
        }
        let is_choice = matches!(q.kind, QuestionKind::Select | QuestionKind::Multiselect);
        if is_choice && q.options.is_empty() {
          return invalid(format!("question '{}' is a select without options", q.id));
        }
      }
    }

    let mut checkpoint_ids = HashSet::new();
    let mut gated_sections = HashSet::new();
    for c in &self.checkpoints {
      if !checkpoint_ids.insert(c.id.as_str()) {
        return invalid(format!("duplicate checkpoint id '{}'", c.id));
      }
      if !section_ids.contains(c.after_section_id.as_str()) {
        return invalid(format!("checkpoint '{}' follows unknown section '{}'", c.id, c.after_section_id));
      }
      if !gated_sections.insert(c.after_section_id.as_str()) {
        return invalid(format!("section '{}' has more than one checkpoint", c.after_section_id));
      }
      if !(0.0..=1.0).contains(&c.passing_threshold) {
        return invalid(format!("checkpoint '{}' threshold {} is outside [0, 1]", c.id, c.passing_threshold));
      }
      if c.rubric.is_empty() {
        return invalid(format!("checkpoint '{}' has an empty rubric", c.id));
      }
      let mut criterion_ids = HashSet::new();
      for r in &c.rubric {
        if !criterion_ids.insert(r.id.as_str()) {
          return invalid(format!("checkpoint '{}' repeats criterion '{}'", c.id, r.id));
        }
        if !(r.weight > 0.0) {
          return invalid(format!("criterion '{}' must have a positive weight", r.id));
        }
      }
    }

    for s in &self.sections {
      let Some(declared) = &s.checkpoint_id else { continue };
      match self.checkpoint(declared) {
        Some(c) if c.after_section_id == s.id => {}
        Some(c) => {
          return invalid(format!("section '{}' names checkpoint '{}' which follows '{}'", s.id, c.id, c.after_section_id));
        }
        None => return invalid(format!("section '{}' names unknown checkpoint '{}'", s.id, declared)),
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_catalog_is_consistent() {
    let c = Catalog::builtin();
    c.validate().expect("builtin catalog validates");
    assert_eq!(c.checkpoints().len(), 3);
    assert_eq!(c.checkpoint_for_section("module-structure").map(|c| c.id.as_str()), Some("checkpoint-2"));
    assert!(c.checkpoint_for_section("course-design").is_none());
    assert!(c.checkpoint("checkpoint-99").is_none());
    assert_eq!(c.question("late-policy").map(|q| q.label.as_str()), Some("Late Work Policy"));
  }

  #[test]
  fn rejects_checkpoint_after_unknown_section() {
    let mut checkpoints = seed_checkpoints();
    checkpoints[0].after_section_id = "nowhere".into();
    let err = Catalog::new(seed_sections(), checkpoints).unwrap_err();
    assert!(err.to_string().contains("nowhere"), "{err}");
  }

  #[test]
  fn rejects_non_positive_weight() {
    let mut checkpoints = seed_checkpoints();
    checkpoints[1].rubric[0].weight = 0.0;
    assert!(Catalog::new(seed_sections(), checkpoints).is_err());
  }

  #[test]
  fn rejects_mismatched_section_checkpoint_reference() {
    let mut sections = seed_sections();
    sections[0].checkpoint_id = Some("checkpoint-2".into());
    assert!(Catalog::new(sections, seed_checkpoints()).is_err());
  }
}

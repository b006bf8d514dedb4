//! Course document generation: assembles the collected answers into a
//! structured course via the evaluation service, then repairs the reply.
//!
//! Two modes:
//!   - single: one call returns the whole course
//!   - chunked: one call for the skeleton, then one call per module whose items
//!     are merged back into the skeleton by id (or title)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Answers, CourseItem, CourseModule, EvaluationResult, GeneratedCourse};
use crate::error::LlmError;
use crate::openai::{ChatMessage, GenerationOptions, TextGenerator};
use crate::prompts::{answer_text, course_prompts, course_structure_prompts, module_content_prompts, PromptPair};
use crate::config::Prompts;

pub const COURSE_OPTIONS: GenerationOptions = GenerationOptions { temperature: 0.7, max_tokens: 8000 };
pub const STRUCTURE_OPTIONS: GenerationOptions = GenerationOptions { temperature: 0.7, max_tokens: 4000 };
pub const MODULE_OPTIONS: GenerationOptions = GenerationOptions { temperature: 0.7, max_tokens: 4000 };

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
  #[default]
  Single,
  Chunked,
}

/// Generate in the requested mode. Checkpoint review notes only feed the
/// single-call prompt.
pub async fn generate(
  generator: &dyn TextGenerator,
  prompts: &Prompts,
  answers: &Answers,
  checkpoint_results: &BTreeMap<String, EvaluationResult>,
  mode: GenerationMode,
) -> Result<GeneratedCourse, LlmError> {
  match mode {
    GenerationMode::Single => generate_course(generator, prompts, answers, checkpoint_results).await,
    GenerationMode::Chunked => generate_course_chunked(generator, prompts, answers).await,
  }
}

async fn ask(generator: &dyn TextGenerator, pair: PromptPair, options: GenerationOptions) -> Result<Value, LlmError> {
  let messages = [ChatMessage::system(pair.system), ChatMessage::user(pair.user)];
  generator.generate_json(&messages, options).await
}

#[instrument(level = "info", skip_all, fields(model = %generator.model(), answers = answers.len(), reviews = checkpoint_results.len()))]
pub async fn generate_course(
  generator: &dyn TextGenerator,
  prompts: &Prompts,
  answers: &Answers,
  checkpoint_results: &BTreeMap<String, EvaluationResult>,
) -> Result<GeneratedCourse, LlmError> {
  let reply = ask(generator, course_prompts(prompts, answers, checkpoint_results), COURSE_OPTIONS).await?;
  let course = normalize_course(&reply, answers)?;
  info!(target: "course_wizard", modules = course.modules.len(), items = course.modules.iter().map(|m| m.items.len()).sum::<usize>(), "Course generated");
  Ok(course)
}

/// Skeleton first, then content module by module. Any failed call fails the
/// whole generation; a module reply that matches no skeleton item leaves
/// that item without content.
#[instrument(level = "info", skip_all, fields(model = %generator.model(), answers = answers.len()))]
pub async fn generate_course_chunked(
  generator: &dyn TextGenerator,
  prompts: &Prompts,
  answers: &Answers,
) -> Result<GeneratedCourse, LlmError> {
  let reply = ask(generator, course_structure_prompts(prompts, answers), STRUCTURE_OPTIONS).await?;
  let mut course = normalize_course(&reply, answers)?;
  info!(target: "course_wizard", modules = course.modules.len(), "Course skeleton generated");

  for module in course.modules.iter_mut() {
    let pair = module_content_prompts(prompts, answers, module, &course.title);
    let reply = ask(generator, pair, MODULE_OPTIONS).await?;
    let merged = merge_module_content(module, &reply)?;
    debug!(target: "course_wizard", module = %module.id, merged, items = module.items.len(), "Module content merged");
  }

  info!(target: "course_wizard", modules = course.modules.len(), items = course.modules.iter().map(|m| m.items.len()).sum::<usize>(), "Course generated (chunked)");
  Ok(course)
}

/// Fold one module reply into its skeleton module and return how many items
/// received content. Items match by id, then by title (case-insensitive).
/// The skeleton keeps its ids, types and positions.
pub fn merge_module_content(module: &mut CourseModule, raw: &Value) -> Result<usize, LlmError> {
  let obj = raw
    .as_object()
    .ok_or_else(|| LlmError::MalformedResponse("module reply is not a JSON object".into()))?;
  if let Some(id) = obj.get("moduleId").and_then(Value::as_str) {
    if id != module.id {
      warn!(target: "course_wizard", expected = %module.id, got = %id, "Module reply names another module; merging anyway");
    }
  }
  let generated = match obj.get("items") {
    Some(v @ Value::Array(_)) => serde_json::from_value::<Vec<CourseItem>>(v.clone())
      .map_err(|e| LlmError::MalformedResponse(format!("invalid module items: {}", e)))?,
    _ => return Err(LlmError::MalformedResponse("missing 'items' list".into())),
  };

  let mut merged = 0;
  for item in generated {
    let by_id = (!item.id.trim().is_empty())
      .then(|| module.items.iter().position(|s| s.id == item.id))
      .flatten();
    let title = item.title.trim();
    let slot = by_id.or_else(|| {
      (!title.is_empty())
        .then(|| module.items.iter().position(|s| s.title.trim().eq_ignore_ascii_case(title)))
        .flatten()
    });
    match slot {
      Some(i) => {
        fill_item(&mut module.items[i], item);
        merged += 1;
      }
      None => warn!(target: "course_wizard", module = %module.id, item = %item.id, title = %item.title, "Generated item matches no skeleton item; dropped"),
    }
  }
  Ok(merged)
}

fn fill_item(slot: &mut CourseItem, generated: CourseItem) {
  if slot.title.trim().is_empty() { slot.title = generated.title; }
  if generated.content.is_some() { slot.content = generated.content; }
  if generated.points.is_some() { slot.points = generated.points; }
  if generated.due_date.is_some() { slot.due_date = generated.due_date; }
  if generated.rubric.is_some() { slot.rubric = generated.rubric; }
  if generated.questions.is_some() { slot.questions = generated.questions; }
  if generated.prompt.is_some() { slot.prompt = generated.prompt; }
}

/// Map the raw reply onto a `GeneratedCourse`.
///
/// `modules` must be a list; everything else is repaired: the title falls back
/// to the `course-title` answer, ids and positions are filled from order.
pub fn normalize_course(raw: &Value, answers: &Answers) -> Result<GeneratedCourse, LlmError> {
  let obj = raw
    .as_object()
    .ok_or_else(|| LlmError::MalformedResponse("course reply is not a JSON object".into()))?;
  let modules = match obj.get("modules") {
    Some(v @ Value::Array(_)) => serde_json::from_value::<Vec<CourseModule>>(v.clone())
      .map_err(|e| LlmError::MalformedResponse(format!("invalid modules: {}", e)))?,
    _ => return Err(LlmError::MalformedResponse("missing 'modules' list".into())),
  };

  let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::trim).unwrap_or_default().to_string();
  let title = match text("title") {
    t if t.is_empty() => answer_text(answers, "course-title"),
    t => t,
  };
  let description = match text("description") {
    d if d.is_empty() => answer_text(answers, "course-description"),
    d => d,
  };

  let modules = modules
    .into_iter()
    .enumerate()
    .map(|(mi, mut m)| {
      let module_no = mi + 1;
      if m.id.trim().is_empty() { m.id = format!("module-{}", module_no); }
      if m.position == 0 { m.position = module_no as u32; }
      if m.name.trim().is_empty() { m.name = format!("Module {}", module_no); }
      for (ii, item) in m.items.iter_mut().enumerate() {
        if item.id.trim().is_empty() { item.id = format!("item-{}-{}", module_no, ii + 1); }
        if item.position == 0 { item.position = (ii + 1) as u32; }
      }
      m
    })
    .collect();

  Ok(GeneratedCourse { title, description, welcome_message: text("welcomeMessage"), modules })
}

//! Prompt builders for checkpoint evaluation and course generation.
//!
//! Pure functions: same inputs, same strings. The output-schema text in the
//! evaluation prompt names exactly the fields `normalize` reads back.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::config::Prompts;
use crate::domain::{Answers, Checkpoint, CourseModule, EvaluationResult, Section};
use crate::normalize::fields;
use crate::util::display_percent;

/// System + user message for one evaluation service call.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptPair {
  pub system: String,
  pub user: String,
}

pub fn evaluation_prompts(prompts: &Prompts, checkpoint: &Checkpoint, section: &Section, answers: &Answers) -> PromptPair {
  PromptPair {
    system: prompts.evaluation_system.clone(),
    user: evaluation_user_prompt(checkpoint, section, answers),
  }
}

/// Rubric criteria (rubric order), then the section's answered questions
/// (section order), then the output schema with the passing threshold.
/// Questions without a stored, non-blank answer are left out entirely.
pub fn evaluation_user_prompt(checkpoint: &Checkpoint, section: &Section, answers: &Answers) -> String {
  let criteria_list = checkpoint
    .rubric
    .iter()
    .enumerate()
    .map(|(i, c)| {
      format!(
        "{}. **{}** (id: {}, weight: {})\n   {}\n   Evaluation focus: {}",
        i + 1, c.name, c.id, c.weight, c.description, c.evaluation_prompt
      )
    })
    .collect::<Vec<_>>()
    .join("\n\n");

  let formatted_answers = section
    .questions
    .iter()
    .filter_map(|q| {
      let value = answers.get(&q.id)?;
      if value.is_blank() { return None; }
      Some(format!("**{}:**\n{}", q.label, value.display()))
    })
    .collect::<Vec<_>>();
  let formatted_answers = if formatted_answers.is_empty() {
    "(no responses provided)".to_string()
  } else {
    formatted_answers.join("\n\n")
  };

  format!(
    r#"## Evaluation Task

Evaluate the following course design responses for "{section_title}" against the rubric criteria below.

### Rubric Criteria:

{criteria_list}

### Submitted Responses:

{formatted_answers}

### Required Output Format:

Provide your evaluation as a JSON object with this exact structure:

{{
  "{overall_score}": <number between 0 and 1>,
  "{overall_feedback}": "<2-3 sentence summary of the evaluation>",
  "{criteria_results}": [
    {{
      "{criterion_id}": "<criterion id from rubric>",
      "{passed}": <true or false>,
      "{score}": <number between 0 and 1>,
      "{feedback}": "<specific feedback for this criterion>",
      "{suggestions}": ["<suggestion 1>", "<suggestion 2>"]
    }}
  ]
}}

Include one entry in "{criteria_results}" per rubric criterion, in rubric order. Include "{suggestions}" only when a criterion did not pass.
The {overall_score} should be the weighted average of individual criterion scores.
A criterion passes if its score is >= 0.7.
The passing threshold for the checkpoint is {threshold}%."#,
    section_title = section.title,
    overall_score = fields::OVERALL_SCORE,
    overall_feedback = fields::OVERALL_FEEDBACK,
    criteria_results = fields::CRITERIA_RESULTS,
    criterion_id = fields::CRITERION_ID,
    passed = fields::PASSED,
    score = fields::SCORE,
    feedback = fields::FEEDBACK,
    suggestions = fields::SUGGESTIONS,
    threshold = display_percent(checkpoint.passing_threshold),
  )
}

/// Headings and the question ids they draw from, in prompt order.
const COURSE_OVERVIEW_FIELDS: &[(&str, &str)] = &[
  ("Title", "course-title"),
  ("Code", "course-code"),
  ("Description", "course-description"),
  ("Target Audience", "target-audience"),
  ("Delivery Format", "delivery-format"),
  ("Duration", "course-duration"),
  ("Credit Hours", "credit-hours"),
];

const COURSE_DETAIL_FIELDS: &[(&str, &str)] = &[
  ("Learning Objectives", "learning-objectives"),
  ("Module Structure", "module-details"),
  ("Pacing", "module-pacing"),
  ("Resources", "key-resources"),
  ("Assessment Types", "assignment-types"),
  ("Major Assignments", "assignment-details"),
  ("Quiz Structure", "quiz-structure"),
  ("Discussion Strategy", "discussion-prompts"),
  ("Grading", "grading-weights"),
  ("Rubric Criteria", "rubric-criteria"),
  ("Welcome Message Draft", "welcome-message"),
  ("Instructor Introduction", "instructor-intro"),
  ("Communication Policy", "communication-policy"),
  ("Support Resources", "support-resources"),
  ("Late Policy", "late-policy"),
  ("Accessibility Statement", "accessibility-statement"),
];

/// Display value of an answer, empty when absent.
pub fn answer_text(answers: &Answers, id: &str) -> String {
  answers.get(id).map(|v| v.display()).unwrap_or_default()
}

pub fn course_prompts(
  prompts: &Prompts,
  answers: &Answers,
  checkpoint_results: &BTreeMap<String, EvaluationResult>,
) -> PromptPair {
  PromptPair {
    system: prompts.course_system.clone(),
    user: course_user_prompt(answers, checkpoint_results),
  }
}

pub fn course_user_prompt(answers: &Answers, checkpoint_results: &BTreeMap<String, EvaluationResult>) -> String {
  let mut out = String::from(
    "## Course Generation Task\n\nBased on the following course design specifications, generate a complete Canvas course structure with full content.\n\n### Course Overview:\n",
  );
  for (heading, id) in COURSE_OVERVIEW_FIELDS {
    let _ = writeln!(out, "- **{}:** {}", heading, answer_text(answers, id));
  }
  for (heading, id) in COURSE_DETAIL_FIELDS {
    let _ = write!(out, "\n### {}:\n{}\n", heading, answer_text(answers, id));
  }

  let theme = match answer_text(answers, "design-theme") {
    t if t.trim().is_empty() => "dp-flat-sections-2".to_string(),
    t => t,
  };
  let _ = write!(out, "\n### Page Design Theme:\n{}\n", theme);

  if !checkpoint_results.is_empty() {
    out.push_str("\n### Review Notes From Checkpoints:\n");
    for (id, r) in checkpoint_results {
      let _ = writeln!(out, "- {} ({}%): {}", id, r.score_percent(), r.overall_feedback);
    }
  }

  out.push_str(COURSE_OUTPUT_FORMAT);
  out
}

const COURSE_OUTPUT_FORMAT: &str = r#"
---

## Required Output Format:

Generate a JSON object with this structure:

{
  "title": "<course title>",
  "description": "<course description for Canvas>",
  "welcomeMessage": "<complete welcome message HTML>",
  "modules": [
    {
      "id": "<unique id>",
      "name": "<module name>",
      "position": <number>,
      "items": [
        {
          "id": "<unique id>",
          "type": "page" | "assignment" | "discussion" | "quiz",
          "title": "<item title>",
          "content": "<full HTML content for pages, or instructions for assignments>",
          "position": <number>,
          "points": <number for assignments/quizzes>,
          "rubric": {
            "title": "<rubric title>",
            "criteria": [
              {
                "description": "<criterion description>",
                "points": <max points>,
                "ratings": [{"description": "<rating level>", "points": <points>}]
              }
            ]
          },
          "questions": [
            {
              "type": "multiple_choice" | "short_answer" | "essay",
              "text": "<question text>",
              "points": <points>,
              "answers": [{"text": "<answer>", "correct": true|false}]
            }
          ],
          "prompt": "<discussion prompt for discussion items>"
        }
      ]
    }
  ]
}

Generate complete, substantive content for each item:
- For pages: clear lesson content (200-300 words)
- For assignments: clear instructions and a rubric with 3-4 criteria
- For discussions: an engaging prompt with 2-3 guiding questions
- For quizzes: 3-5 questions with answers

Keep the JSON response concise to avoid truncation. Focus on quality over quantity."#;

// -------- Chunked generation: skeleton first, then one call per module --------

/// CSS class set for the page design wrapper. Unknown themes get flat sections.
pub fn theme_class(answers: &Answers) -> &'static str {
  match answer_text(answers, "design-theme").trim() {
    "dp-rounded-headings" => "dp-rounded-headings",
    "dp-circle-left" => "dp-circle-left",
    _ => "dp-flat-sections variation-2",
  }
}

const STRUCTURE_OVERVIEW_FIELDS: &[(&str, &str)] = &[
  ("Title", "course-title"),
  ("Code", "course-code"),
  ("Description", "course-description"),
  ("Target Audience", "target-audience"),
  ("Duration", "course-duration"),
];

const STRUCTURE_DETAIL_FIELDS: &[(&str, &str)] = &[
  ("Learning Objectives", "learning-objectives"),
  ("Module Structure", "module-details"),
  ("Assessment Types", "assignment-types"),
  ("Welcome Message Draft", "welcome-message"),
];

pub fn course_structure_prompts(prompts: &Prompts, answers: &Answers) -> PromptPair {
  PromptPair {
    system: prompts.structure_system.clone(),
    user: course_structure_user_prompt(answers),
  }
}

/// Skeleton request: modules and typed, titled items, plus the welcome page.
/// No item content is asked for here.
pub fn course_structure_user_prompt(answers: &Answers) -> String {
  let mut out = String::from(
    "## Course Structure Generation\n\nBased on the following specifications, generate ONLY the course structure (no detailed content yet).\n\n### Course Overview:\n",
  );
  for (heading, id) in STRUCTURE_OVERVIEW_FIELDS {
    let _ = writeln!(out, "- **{}:** {}", heading, answer_text(answers, id));
  }
  for (heading, id) in STRUCTURE_DETAIL_FIELDS {
    let _ = write!(out, "\n### {}:\n{}\n", heading, answer_text(answers, id));
  }

  let theme = theme_class(answers);
  let _ = write!(
    out,
    r#"
---

## Required Output Format:

Generate a JSON object with this structure (NO detailed content, just structure):

{{
  "title": "<course title>",
  "description": "<course description>",
  "welcomeMessage": "<welcome page HTML in the format below>",
  "modules": [
    {{
      "id": "module-1",
      "name": "<module name>",
      "position": 1,
      "items": [
        {{
          "id": "item-1-1",
          "type": "page" | "assignment" | "discussion" | "quiz",
          "title": "<item title>",
          "position": 1
        }}
      ]
    }}
  ]
}}

### Welcome Message Format:

<div id="dp-wrapper" class="dp-wrapper {theme}">
    <header class="dp-header {theme}">
        <h2 class="dp-heading"><span class="dp-header-title">Welcome to {{Course Title}}</span></h2>
    </header>
    <div class="dp-content-block">
        <p>{{Welcome message content}}</p>
    </div>
    <div class="dp-content-block">
        <h3 class="dp-has-icon">Course Objectives</h3>
        <ul><li>{{Objective 1}}</li><li>{{Objective 2}}</li></ul>
    </div>
</div>

Create a logical structure with appropriate item types for each module. Do NOT include page content, rubrics, or questions yet."#
  );
  out
}

pub fn module_content_prompts(prompts: &Prompts, answers: &Answers, module: &CourseModule, course_title: &str) -> PromptPair {
  PromptPair {
    system: prompts.module_system.clone(),
    user: module_content_user_prompt(answers, module, course_title),
  }
}

/// Content request for one skeleton module. The reply must echo the item ids
/// so content can be merged back into the skeleton.
pub fn module_content_user_prompt(answers: &Answers, module: &CourseModule, course_title: &str) -> String {
  let items_list = module
    .items
    .iter()
    .map(|i| format!("- {} ({}, id: {})", i.title, i.kind.as_str(), i.id))
    .collect::<Vec<_>>()
    .join("\n");

  format!(
    r#"## Module Content Generation

Generate detailed content for Module {position}: "{name}" in the course "{course_title}".

### Course Context:
- **Learning Objectives:** {objectives}
- **Target Audience:** {audience}
- **Assessment Approach:** {assessment}
- **Rubric Criteria:** {rubric}
- **Module Number:** {position}

### Module Items to Generate Content For:
{items_list}

### Page Design:
Wrap page HTML in <div id="dp-wrapper" class="dp-wrapper {theme}"> with a dp-header showing module number {position}, dp-content-block sections with dp-has-icon headings, and callout boxes for important notes.

---

## Required Output Format:

Generate a JSON object with detailed content for each item:

{{
  "moduleId": "{module_id}",
  "items": [
    {{
      "id": "<item id from the list above>",
      "type": "page" | "assignment" | "discussion" | "quiz",
      "title": "<item title>",
      "content": "<full HTML content for pages, or instructions for assignments>",
      "position": <number>,
      "points": <number for assignments/quizzes, omit for pages>,
      "rubric": {{
        "title": "<rubric title>",
        "criteria": [
          {{
            "description": "<criterion>",
            "points": <max points>,
            "ratings": [{{"description": "<level>", "points": <points>}}]
          }}
        ]
      }},
      "questions": [
        {{
          "type": "multiple_choice" | "short_answer" | "essay",
          "text": "<question>",
          "points": <points>,
          "answers": [{{"text": "<answer>", "correct": true|false}}]
        }}
      ],
      "prompt": "<discussion prompt if type is discussion>"
    }}
  ]
}}

Content guidelines:
- Pages: 200-300 words covering key concepts
- Assignments: clear instructions and a rubric with 3-4 criteria
- Discussions: an engaging prompt with 2-3 guiding questions
- Quizzes: 3-5 questions with answers"#,
    position = module.position,
    name = module.name,
    objectives = answer_text(answers, "learning-objectives"),
    audience = answer_text(answers, "target-audience"),
    assessment = answer_text(answers, "assignment-types"),
    rubric = answer_text(answers, "rubric-criteria"),
    theme = theme_class(answers),
    module_id = module.id,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Catalog;
  use crate::domain::AnswerValue;

  fn overview() -> (Checkpoint, Section) {
    let catalog = Catalog::builtin();
    let cp = catalog.checkpoint("checkpoint-1").cloned().expect("checkpoint");
    let section = catalog.section("course-overview").cloned().expect("section");
    (cp, section)
  }

  fn partial_answers() -> Answers {
    let mut a = Answers::new();
    a.insert("course-title".into(), AnswerValue::Single("Intro to Data Ethics".into()));
    a.insert("learning-objectives".into(), AnswerValue::Single("Analyze bias in datasets.".into()));
    a.insert("course-code".into(), AnswerValue::Single("   ".into()));
    a
  }

  #[test]
  fn every_criterion_name_appears_once() {
    let (cp, section) = overview();
    let user = evaluation_user_prompt(&cp, &section, &partial_answers());
    for c in &cp.rubric {
      assert_eq!(user.matches(c.name.as_str()).count(), 1, "criterion {}", c.name);
      assert!(user.contains(&format!("id: {}", c.id)));
    }
  }

  #[test]
  fn only_answered_questions_are_rendered() {
    let (cp, section) = overview();
    let user = evaluation_user_prompt(&cp, &section, &partial_answers());
    assert_eq!(user.matches("**Course Title:**").count(), 1);
    assert_eq!(user.matches("**Learning Objectives:**").count(), 1);
    assert!(user.contains("Intro to Data Ethics"));
    // blank and missing answers are omitted, not rendered empty
    assert!(!user.contains("**Course Code:**"));
    assert!(!user.contains("**Target Audience & Prerequisites:**"));
  }

  #[test]
  fn criteria_precede_answers_and_schema_comes_last() {
    let (cp, section) = overview();
    let user = evaluation_user_prompt(&cp, &section, &partial_answers());
    let rubric_at = user.find("### Rubric Criteria:").expect("rubric");
    let answers_at = user.find("### Submitted Responses:").expect("answers");
    let schema_at = user.find("### Required Output Format:").expect("schema");
    assert!(rubric_at < answers_at && answers_at < schema_at);
    assert!(user.ends_with("The passing threshold for the checkpoint is 75%."));
  }

  #[test]
  fn schema_names_every_normalized_field() {
    let (cp, section) = overview();
    let user = evaluation_user_prompt(&cp, &section, &Answers::new());
    for f in [
      fields::OVERALL_SCORE, fields::OVERALL_FEEDBACK, fields::CRITERIA_RESULTS, fields::CRITERION_ID,
      fields::PASSED, fields::SCORE, fields::FEEDBACK, fields::SUGGESTIONS,
    ] {
      assert!(user.contains(&format!("\"{f}\"")), "missing field {f}");
    }
    assert!(user.contains("(no responses provided)"));
  }

  #[test]
  fn multiselect_answers_are_joined_for_display() {
    let catalog = Catalog::builtin();
    let cp = catalog.checkpoint("checkpoint-3").expect("checkpoint");
    let section = catalog.section("assessment-strategy").expect("section");
    let mut a = Answers::new();
    a.insert("assignment-types".into(), AnswerValue::Multiple(vec!["quizzes".into(), "projects".into()]));
    let user = evaluation_user_prompt(cp, section, &a);
    assert!(user.contains("**Assessment Types:**\nquizzes, projects"));
  }

  #[test]
  fn prompts_are_deterministic() {
    let (cp, section) = overview();
    let p = Prompts::default();
    let a = evaluation_prompts(&p, &cp, &section, &partial_answers());
    let b = evaluation_prompts(&p, &cp, &section, &partial_answers());
    assert_eq!(a, b);
    assert!(a.system.contains("raw JSON only"));
  }

  #[test]
  fn course_prompt_uses_answers_and_default_theme() {
    let user = course_user_prompt(&partial_answers(), &BTreeMap::new());
    assert!(user.contains("- **Title:** Intro to Data Ethics"));
    assert!(user.contains("### Learning Objectives:\nAnalyze bias in datasets."));
    assert!(user.contains("dp-flat-sections-2"));
    assert!(!user.contains("Review Notes From Checkpoints"));
  }

  #[test]
  fn structure_prompt_asks_for_skeleton_only() {
    let mut a = partial_answers();
    a.insert("design-theme".into(), AnswerValue::Single("dp-circle-left".into()));
    let user = course_structure_user_prompt(&a);
    assert!(user.contains("- **Title:** Intro to Data Ethics"));
    assert!(user.contains("### Learning Objectives:\nAnalyze bias in datasets."));
    assert!(user.contains("class=\"dp-wrapper dp-circle-left\""));
    assert!(user.contains("\"id\": \"item-1-1\""));
    assert!(!user.contains("\"rubric\""));
    assert!(!user.contains("Credit Hours"));
  }

  #[test]
  fn unknown_theme_falls_back_to_flat_sections() {
    assert_eq!(theme_class(&Answers::new()), "dp-flat-sections variation-2");
    let mut a = Answers::new();
    a.insert("design-theme".into(), AnswerValue::Single("neon".into()));
    assert_eq!(theme_class(&a), "dp-flat-sections variation-2");
  }

  #[test]
  fn module_prompt_lists_items_and_echoes_module_id() {
    use crate::domain::{CourseItem, CourseItemKind};
    let item = |id: &str, kind, title: &str| CourseItem {
      id: id.into(), kind, title: title.into(), content: None, position: 1, points: None,
      due_date: None, rubric: None, questions: None, prompt: None,
    };
    let module = CourseModule {
      id: "module-2".into(),
      name: "Bias".into(),
      position: 2,
      items: vec![item("item-2-1", CourseItemKind::Page, "Reading"), item("item-2-2", CourseItemKind::Quiz, "Check")],
    };
    let p = module_content_prompts(&Prompts::default(), &partial_answers(), &module, "Data Ethics");
    assert!(p.system.contains("raw JSON only"));
    assert!(p.user.contains("Module 2: \"Bias\" in the course \"Data Ethics\""));
    assert!(p.user.contains("- Reading (page, id: item-2-1)\n- Check (quiz, id: item-2-2)"));
    assert!(p.user.contains("\"moduleId\": \"module-2\""));
    assert!(p.user.contains("**Learning Objectives:** Analyze bias in datasets."));
  }
}

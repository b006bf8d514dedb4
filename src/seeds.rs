//! Built-in course-design catalog: the questionnaire sections and the three
//! rubric checkpoints. Used whenever the TOML config supplies no sections.

use crate::domain::{Checkpoint, Question, QuestionKind, QuestionOption, RubricCriterion, Section, Validation};

fn question(id: &str, kind: QuestionKind, label: &str, required: bool) -> Question {
  Question {
    id: id.into(),
    kind,
    label: label.into(),
    description: None,
    placeholder: None,
    required,
    options: Vec::new(),
    validation: None,
  }
}

fn with_length(mut q: Question, min: Option<usize>, max: Option<usize>) -> Question {
  q.validation = Some(Validation { min_length: min, max_length: max });
  q
}

fn with_options(mut q: Question, options: &[(&str, &str)]) -> Question {
  q.options = options
    .iter()
    .map(|(value, label)| QuestionOption { value: (*value).into(), label: (*label).into() })
    .collect();
  q
}

fn criterion(id: &str, name: &str, description: &str, evaluation_prompt: &str, weight: f64) -> RubricCriterion {
  RubricCriterion {
    id: id.into(),
    name: name.into(),
    description: description.into(),
    evaluation_prompt: evaluation_prompt.trim().into(),
    weight,
  }
}

pub fn seed_sections() -> Vec<Section> {
  use QuestionKind::*;

  vec![
    Section {
      id: "course-overview".into(),
      title: "Course Overview".into(),
      description: "Describe the course, who it is for, and what students will be able to do.".into(),
      questions: vec![
        with_length(question("course-title", Text, "Course Title", true), Some(3), Some(120)),
        question("course-code", Text, "Course Code", false),
        with_length(question("course-description", Textarea, "Course Description", true), Some(50), Some(2000)),
        with_length(question("target-audience", Textarea, "Target Audience & Prerequisites", true), Some(20), None),
        with_options(
          question("delivery-format", Select, "Delivery Format", true),
          &[("online-async", "Fully online (asynchronous)"), ("online-sync", "Fully online (synchronous)"), ("hybrid", "Hybrid"), ("in-person", "In person with Canvas support")],
        ),
        question("course-duration", Text, "Course Duration", true),
        question("credit-hours", Number, "Credit Hours", false),
        with_length(question("learning-objectives", Textarea, "Learning Objectives", true), Some(50), None),
      ],
      checkpoint_id: Some("checkpoint-1".into()),
    },
    Section {
      id: "module-structure".into(),
      title: "Module Structure".into(),
      description: "Lay out the modules, their sequence, and the pacing.".into(),
      questions: vec![
        with_length(question("module-details", Textarea, "Modules and Topics", true), Some(50), None),
        with_length(question("module-pacing", Textarea, "Pacing", true), Some(20), None),
        question("key-resources", Textarea, "Key Resources", false),
      ],
      checkpoint_id: Some("checkpoint-2".into()),
    },
    Section {
      id: "assessment-strategy".into(),
      title: "Assessment Strategy".into(),
      description: "Explain how learning is measured and graded.".into(),
      questions: vec![
        with_options(
          question("assignment-types", Multiselect, "Assessment Types", true),
          &[("quizzes", "Quizzes"), ("essays", "Essays / papers"), ("projects", "Projects"), ("discussions", "Discussions"), ("exams", "Exams"), ("peer-review", "Peer review"), ("presentations", "Presentations")],
        ),
        with_length(question("assignment-details", Textarea, "Major Assignments", true), Some(30), None),
        question("quiz-structure", Textarea, "Quiz Structure", false),
        question("discussion-prompts", Textarea, "Discussion Strategy", false),
        with_length(question("grading-weights", Textarea, "Grading Weights", true), Some(10), None),
        question("rubric-criteria", Textarea, "Rubric Criteria", false),
      ],
      checkpoint_id: Some("checkpoint-3".into()),
    },
    Section {
      id: "course-communication".into(),
      title: "Communication & Policies".into(),
      description: "Welcome students and set expectations.".into(),
      questions: vec![
        with_length(question("welcome-message", Textarea, "Welcome Message", true), Some(30), None),
        question("instructor-intro", Textarea, "Instructor Introduction", false),
        question("communication-policy", Textarea, "Communication Policy", false),
        question("support-resources", Textarea, "Support Resources", false),
        question("late-policy", Textarea, "Late Work Policy", false),
        question("accessibility-statement", Textarea, "Accessibility Statement", false),
      ],
      checkpoint_id: None,
    },
    Section {
      id: "course-design".into(),
      title: "Page Design".into(),
      description: "Pick the visual theme for generated pages.".into(),
      questions: vec![with_options(
        question("design-theme", Select, "Design Theme", false),
        &[("dp-flat-sections-2", "Flat sections"), ("dp-rounded-headings", "Rounded headings"), ("dp-circle-left", "Circle left")],
      )],
      checkpoint_id: None,
    },
  ]
}

pub fn seed_checkpoints() -> Vec<Checkpoint> {
  vec![
    Checkpoint {
      id: "checkpoint-1".into(),
      name: "Course Foundation Review".into(),
      description: "Evaluating your course overview, objectives, and target audience.".into(),
      after_section_id: "course-overview".into(),
      passing_threshold: 0.75,
      rubric: vec![
        criterion(
          "objectives-measurable",
          "Measurable Learning Objectives",
          "Learning objectives are specific, measurable, and use action verbs.",
          r#"
Evaluate whether the learning objectives are well-written:
- Do they start with measurable action verbs (Bloom's taxonomy)?
- Are they specific enough to assess?
- Are there 4-6 objectives appropriate for the course scope?
- Do they avoid vague terms like "understand" or "know"?
"#,
          1.5,
        ),
        criterion(
          "objectives-achievable",
          "Achievable Objectives",
          "Objectives are realistic given the course duration and student level.",
          r#"
Evaluate whether the learning objectives are achievable:
- Are they appropriate for the target audience level?
- Can they reasonably be achieved in the stated course duration?
- Is the scope appropriate for the credit hours?
"#,
          1.0,
        ),
        criterion(
          "audience-clarity",
          "Clear Target Audience",
          "Target audience is clearly defined with prerequisites stated.",
          r#"
Evaluate the target audience definition:
- Is the intended student clearly described?
- Are prerequisites clearly stated?
- Is the expected background knowledge specified?
"#,
          1.0,
        ),
        criterion(
          "description-compelling",
          "Compelling Course Description",
          "Course description clearly explains value and content.",
          r#"
Evaluate the course description:
- Does it clearly explain what the course covers?
- Does it communicate why this matters to students?
- Is it engaging and professional?
"#,
          0.75,
        ),
        criterion(
          "format-appropriate",
          "Appropriate Delivery Format",
          "The delivery format matches the content and objectives.",
          r#"
Evaluate whether the delivery format is appropriate:
- Does the format support the stated learning objectives?
- Is it appropriate for the course content?
"#,
          0.75,
        ),
      ],
    },
    Checkpoint {
      id: "checkpoint-2".into(),
      name: "Module Structure Review".into(),
      description: "Evaluating your module organization, content, and pacing.".into(),
      after_section_id: "module-structure".into(),
      passing_threshold: 0.75,
      rubric: vec![
        criterion(
          "logical-sequence",
          "Logical Sequencing",
          "Modules follow a logical progression that builds knowledge incrementally.",
          r#"
Evaluate the module sequence:
- Do modules build on each other logically?
- Is there a clear progression from foundational to advanced?
- Are prerequisites between modules clear?
"#,
          1.5,
        ),
        criterion(
          "objective-alignment",
          "Alignment with Objectives",
          "Module content maps to and supports the learning objectives.",
          r#"
Evaluate alignment with learning objectives:
- Does each module contribute to one or more learning objectives?
- Are all objectives covered by the end of the course?
- Is there appropriate depth for each objective?
"#,
          1.5,
        ),
        criterion(
          "appropriate-depth",
          "Appropriate Depth",
          "Each module has sufficient depth without being overwhelming.",
          r#"
Evaluate module depth:
- Does each module have enough topics to be substantive?
- Are any modules too overloaded?
- Is the workload balanced across modules?
"#,
          1.0,
        ),
        criterion(
          "pacing-realistic",
          "Realistic Pacing",
          "The pacing is realistic for the course duration.",
          r#"
Evaluate the pacing:
- Can the content be covered in the stated timeframe?
- Is there time for practice and assessment?
- Is the weekly workload reasonable?
"#,
          1.0,
        ),
        criterion(
          "resources-adequate",
          "Adequate Resources",
          "Resources are specified and appropriate for each module.",
          r#"
Evaluate the resources:
- Are resources specified for each module?
- Are they appropriate for the content?
- Is there variety in resource types?
"#,
          0.75,
        ),
      ],
    },
    Checkpoint {
      id: "checkpoint-3".into(),
      name: "Assessment Strategy Review".into(),
      description: "Evaluating your assessment approach, grading, and alignment with objectives.".into(),
      after_section_id: "assessment-strategy".into(),
      passing_threshold: 0.75,
      rubric: vec![
        criterion(
          "assessment-objective-alignment",
          "Assessment-Objective Alignment",
          "Assessments directly measure the stated learning objectives.",
          r#"
Evaluate assessment alignment:
- Do assessments measure the learning objectives?
- Is each objective assessed at least once?
- Are assessment types appropriate for the objectives?
"#,
          1.5,
        ),
        criterion(
          "assessment-variety",
          "Assessment Variety",
          "Multiple assessment types accommodate different learning styles.",
          r#"
Evaluate assessment variety:
- Are there multiple types of assessments?
- Do they address different levels of Bloom's taxonomy?
- Is there a mix of formative and summative assessments?
"#,
          1.0,
        ),
        criterion(
          "grading-clarity",
          "Grading Clarity",
          "Grading weights and criteria are clear and fair.",
          r#"
Evaluate grading clarity:
- Do grading weights add up to 100%?
- Is the weight distribution appropriate?
- Are rubric criteria clear and measurable?
"#,
          1.0,
        ),
        criterion(
          "appropriate-rigor",
          "Appropriate Rigor",
          "Assessments are rigorous but achievable.",
          r#"
Evaluate assessment rigor:
- Are assessments challenging enough for the course level?
- Are expectations realistic?
- Is there scaffolding for complex assignments?
"#,
          1.0,
        ),
        criterion(
          "feedback-opportunities",
          "Feedback Opportunities",
          "Students have opportunities for feedback before high-stakes assessments.",
          r#"
Evaluate feedback structure:
- Are there low-stakes assessments early in the course?
- Do students receive feedback before major assignments?
- Are discussions or peer review included?
"#,
          0.75,
        ),
      ],
    },
  ]
}

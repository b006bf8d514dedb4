//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::course::GenerationMode;
use crate::domain::{AnswerValue, Answers, Checkpoint, EvaluationResult, GeneratedCourse, Section};
use crate::wizard::{GateView, Phase, ValidationErrors, Wizard, WizardState};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Snapshot,
    SetAnswer {
        #[serde(rename = "questionId")]
        question_id: String,
        value: AnswerValue,
    },
    Continue,
    Back,
    GoToSection {
        index: usize,
    },
    Evaluate,
    Proceed,
    Revise,
    GenerateCourse {
        #[serde(default)]
        mode: GenerationMode,
    },
    Reset,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    State(WizardView),
    Evaluation { result: EvaluationResult },
    Course { course: GeneratedCourse },
    Error { message: String },
}

/// Snapshot of one wizard session for the presentation layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub session_id: String,
    pub phase: Phase,
    pub current_section_index: usize,
    pub current_section_id: Option<String>,
    pub section_count: usize,
    pub errors: ValidationErrors,
    /// Present while the checkpoint gate is shown.
    pub gate: Option<GateView>,
    pub wizard: WizardState,
}

impl WizardView {
    pub fn new(session_id: &str, wizard: &Wizard, catalog: &Catalog) -> Self {
        Self {
            session_id: session_id.to_string(),
            phase: wizard.phase(),
            current_section_index: wizard.state().current_section_index,
            current_section_id: wizard.current_section(catalog).map(|s| s.id.clone()),
            section_count: catalog.section_count(),
            errors: wizard.errors().clone(),
            gate: wizard
                .phase()
                .gate_open()
                .then(|| wizard.gate(catalog))
                .flatten(),
            wizard: wizard.state().clone(),
        }
    }
}

//
// HTTP request/response DTOs
//

/// Every field is optional at the serde level so a missing one becomes a 400
/// with a readable message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateIn {
    pub checkpoint_id: Option<String>,
    pub section_id: Option<String>,
    pub answers: Option<Answers>,
}
#[derive(Debug, Serialize)]
pub struct EvaluateOut {
    pub result: EvaluationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIn {
    pub answers: Option<Answers>,
    #[serde(default)]
    pub checkpoint_results: BTreeMap<String, EvaluationResult>,
    #[serde(default)]
    pub mode: GenerationMode,
}
#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub course: GeneratedCourse,
}

#[derive(Serialize)]
pub struct CatalogOut<'a> {
    pub sections: &'a [Section],
    pub checkpoints: &'a [Checkpoint],
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub llm: bool,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session: Option<String>,
}

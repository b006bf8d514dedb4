//! WebSocket upgrade + wizard session loop.
//!
//! Each connection owns one `Wizard`, restored from the session store when the
//! `session` query parameter names a saved session. Every client message is one
//! wizard action; the reply is one or more JSON messages, ending with the new
//! `state` when the action succeeded. State is saved after each action and
//! again on disconnect, unless the session never got past the initial state.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    Query, State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::logic::{run_course_generation, run_evaluation};
use crate::protocol::{ClientWsMessage, ServerWsMessage, WizardView, WsQuery};
use crate::state::AppState;
use crate::wizard::{Phase, Wizard, WizardError, WizardState};

/// One live wizard session.
pub struct Session {
  pub id: String,
  pub wizard: Wizard,
}

impl Session {
  fn view(&self, state: &AppState) -> ServerWsMessage {
    ServerWsMessage::State(WizardView::new(&self.id, &self.wizard, &state.catalog))
  }
}

#[derive(Debug, Error)]
enum ActionError {
  #[error(transparent)]
  Wizard(#[from] WizardError),
  #[error(transparent)]
  App(#[from] AppError),
}

#[instrument(level = "info", skip(state, ws), fields(session = ?q.session))]
pub async fn ws_upgrade(
  ws: WebSocketUpgrade,
  State(state): State<Arc<AppState>>,
  Query(q): Query<WsQuery>,
) -> impl IntoResponse {
  info!(target: "course_wizard", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state, q.session))
}

/// Restore a saved session, or start a fresh one under a new id.
pub async fn open_session(state: &AppState, requested: Option<String>) -> Session {
  if let Some(id) = requested.filter(|s| !s.trim().is_empty()) {
    if let Some(saved) = state.sessions.load(&id).await {
      info!(target: "wizard", session = %id, section = saved.current_section_index, "Session restored");
      return Session { wizard: Wizard::restore(saved, &state.catalog), id };
    }
    warn!(target: "wizard", session = %id, "Unknown session; starting a new one");
  }
  let id = Uuid::new_v4().to_string();
  info!(target: "wizard", session = %id, "Session started");
  Session { id, wizard: Wizard::new() }
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, requested: Option<String>) {
  let mut session = open_session(&state, requested).await;
  info!(target: "course_wizard", session = %session.id, "WebSocket connected");

  if send_json(&mut socket, &session.view(&state)).await.is_err() {
    return;
  }

  'conn: while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let replies = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "course_wizard", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &mut session, &state).await
          }
          Err(e) => vec![ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }],
        };

        for reply in &replies {
          if send_json(&mut socket, reply).await.is_err() {
            break 'conn;
          }
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  save_on_disconnect(&state, &session).await;
  info!(target: "course_wizard", session = %session.id, "WebSocket disconnected");
}

/// Untouched sessions are not stored, so idle connects do not pile up entries.
async fn save_on_disconnect(state: &AppState, session: &Session) {
  if *session.wizard.state() == WizardState::default() {
    debug!(target: "wizard", session = %session.id, "Pristine session not saved");
    return;
  }
  state.sessions.save(&session.id, session.wizard.state()).await;
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "course_wizard", error = %e, "WS send error");
    e
  })
}

/// Apply one client action to the session and build the replies.
#[instrument(level = "info", skip(session, state), fields(session = %session.id))]
pub async fn handle_client_ws(msg: ClientWsMessage, session: &mut Session, state: &AppState) -> Vec<ServerWsMessage> {
  let mutates = !matches!(msg, ClientWsMessage::Snapshot | ClientWsMessage::Reset);
  match apply(msg, session, state).await {
    Ok(mut replies) => {
      if mutates {
        state.sessions.save(&session.id, session.wizard.state()).await;
      }
      replies.push(session.view(state));
      replies
    }
    Err(e) => {
      warn!(target: "wizard", session = %session.id, error = %e, "Action refused");
      vec![ServerWsMessage::Error { message: e.to_string() }]
    }
  }
}

async fn apply(msg: ClientWsMessage, session: &mut Session, state: &AppState) -> Result<Vec<ServerWsMessage>, ActionError> {
  let catalog = &state.catalog;
  let wizard = &mut session.wizard;

  match msg {
    ClientWsMessage::Snapshot => {}

    ClientWsMessage::SetAnswer { question_id, value } => wizard.set_answer(catalog, &question_id, value)?,

    ClientWsMessage::Continue => {
      let transition = wizard.advance(catalog)?;
      debug!(target: "wizard", ?transition, "Continue");
    }

    ClientWsMessage::Back => wizard.back(),

    ClientWsMessage::GoToSection { index } => wizard.go_to_section(catalog, index)?,

    ClientWsMessage::Evaluate => {
      let checkpoint = wizard.pending_checkpoint(catalog)?;
      let section = catalog
        .section(&checkpoint.after_section_id)
        .ok_or_else(|| AppError::Internal(format!("Checkpoint {} follows a missing section", checkpoint.id)))?;
      let answers = wizard.section_answers(section);
      let result = run_evaluation(state, Some(&checkpoint.id), Some(&section.id), Some(&answers)).await?;
      wizard.record_evaluation(catalog, result.clone())?;
      return Ok(vec![ServerWsMessage::Evaluation { result }]);
    }

    ClientWsMessage::Proceed => {
      wizard.proceed(catalog)?;
    }

    ClientWsMessage::Revise => wizard.revise(),

    ClientWsMessage::GenerateCourse { mode } => {
      if wizard.phase() != Phase::Complete {
        return Err(WizardError::NotComplete.into());
      }
      let course = run_course_generation(state, Some(&wizard.state().answers), &wizard.state().checkpoint_results, mode).await?;
      wizard.set_generated_course(course.clone())?;
      return Ok(vec![ServerWsMessage::Course { course }]);
    }

    ClientWsMessage::Reset => {
      wizard.reset();
      state.sessions.clear(&session.id).await;
      info!(target: "wizard", session = %session.id, "Session reset");
    }
  }

  Ok(Vec::new())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Catalog;
  use crate::config::Prompts;
  use crate::course::GenerationMode;
  use crate::domain::{AnswerValue, Checkpoint, Question, QuestionKind, RubricCriterion, Section};
  use crate::error::LlmError;
  use crate::openai::{ChatMessage, GenerationOptions, TextGenerator};
  use async_trait::async_trait;
  use serde_json::{json, Value};

  struct Scripted(Value);

  #[async_trait]
  impl TextGenerator for Scripted {
    async fn generate_json(&self, _messages: &[ChatMessage], _options: GenerationOptions) -> Result<Value, LlmError> {
      Ok(self.0.clone())
    }
    fn model(&self) -> &str { "scripted" }
  }

  fn catalog() -> Catalog {
    let question = |id: &str| Question {
      id: id.into(),
      kind: QuestionKind::Text,
      label: id.into(),
      description: None,
      placeholder: None,
      required: true,
      options: Vec::new(),
      validation: None,
    };
    Catalog::new(
      vec![
        Section { id: "one".into(), title: "One".into(), description: String::new(), questions: vec![question("q1")], checkpoint_id: Some("cp-1".into()) },
        Section { id: "two".into(), title: "Two".into(), description: String::new(), questions: vec![question("q2")], checkpoint_id: None },
      ],
      vec![Checkpoint {
        id: "cp-1".into(),
        name: "Review".into(),
        description: String::new(),
        after_section_id: "one".into(),
        passing_threshold: 0.75,
        rubric: vec![RubricCriterion { id: "c".into(), name: "C".into(), description: String::new(), evaluation_prompt: "?".into(), weight: 1.0 }],
      }],
    )
    .expect("catalog")
  }

  fn app(reply: Option<Value>) -> AppState {
    let generator = reply.map(|v| Arc::new(Scripted(v)) as Arc<dyn TextGenerator>);
    AppState::with_parts(catalog(), Prompts::default(), generator)
  }

  fn state_view(replies: &[ServerWsMessage]) -> &WizardView {
    match replies.last() {
      Some(ServerWsMessage::State(view)) => view,
      other => panic!("expected trailing state, got {:?}", other),
    }
  }

  fn answer(id: &str, v: &str) -> ClientWsMessage {
    ClientWsMessage::SetAnswer { question_id: id.into(), value: AnswerValue::Single(v.into()) }
  }

  #[tokio::test]
  async fn unknown_session_starts_fresh_and_saved_session_restores() {
    let state = app(None);
    let fresh = open_session(&state, Some("nope".into())).await;
    assert_ne!(fresh.id, "nope");

    let mut session = open_session(&state, None).await;
    handle_client_ws(answer("q1", "hello"), &mut session, &state).await;
    let restored = open_session(&state, Some(session.id.clone())).await;
    assert_eq!(restored.id, session.id);
    assert_eq!(restored.wizard.state().answers.get("q1"), Some(&AnswerValue::Single("hello".into())));
  }

  #[tokio::test]
  async fn full_flow_through_gate_to_completion() {
    let state = app(Some(json!({
      "overallScore": 0.9,
      "overallFeedback": "Great.",
      "criteriaResults": [{ "criterionId": "c", "score": 0.9, "passed": true, "feedback": "ok" }]
    })));
    let mut session = open_session(&state, None).await;

    let replies = handle_client_ws(ClientWsMessage::Continue, &mut session, &state).await;
    assert!(state_view(&replies).errors.contains_key("q1"));

    handle_client_ws(answer("q1", "My answer"), &mut session, &state).await;
    let replies = handle_client_ws(ClientWsMessage::Continue, &mut session, &state).await;
    let view = state_view(&replies);
    assert_eq!(view.phase, Phase::CheckpointPending);
    assert_eq!(view.gate.as_ref().map(|g| g.checkpoint_id.as_str()), Some("cp-1"));

    let replies = handle_client_ws(ClientWsMessage::Evaluate, &mut session, &state).await;
    assert!(matches!(&replies[0], ServerWsMessage::Evaluation { result } if result.passed));
    assert_eq!(state_view(&replies).phase, Phase::Evaluated { passed: true });

    let replies = handle_client_ws(ClientWsMessage::Proceed, &mut session, &state).await;
    assert_eq!(state_view(&replies).current_section_index, 1);

    handle_client_ws(answer("q2", "done"), &mut session, &state).await;
    let replies = handle_client_ws(ClientWsMessage::Continue, &mut session, &state).await;
    assert_eq!(state_view(&replies).phase, Phase::Complete);

    let saved = state.sessions.load(&session.id).await.expect("saved");
    assert_eq!(saved.completed_section_ids, vec!["one".to_string(), "two".to_string()]);
    assert!(saved.checkpoint_results.contains_key("cp-1"));
  }

  #[tokio::test]
  async fn evaluation_failure_leaves_state_unchanged() {
    let state = app(None);
    let mut session = open_session(&state, None).await;
    handle_client_ws(answer("q1", "x"), &mut session, &state).await;
    handle_client_ws(ClientWsMessage::Continue, &mut session, &state).await;

    let replies = handle_client_ws(ClientWsMessage::Evaluate, &mut session, &state).await;
    assert!(matches!(&replies[..], [ServerWsMessage::Error { message }] if message.contains("not configured")));
    assert_eq!(session.wizard.phase(), Phase::CheckpointPending);
    assert!(session.wizard.state().checkpoint_results.is_empty());
  }

  #[tokio::test]
  async fn refusals_come_back_as_errors() {
    let state = app(None);
    let mut session = open_session(&state, None).await;
    let replies = handle_client_ws(ClientWsMessage::GoToSection { index: 1 }, &mut session, &state).await;
    assert!(matches!(&replies[..], [ServerWsMessage::Error { .. }]));
    let replies = handle_client_ws(ClientWsMessage::GenerateCourse { mode: GenerationMode::Single }, &mut session, &state).await;
    assert!(matches!(&replies[..], [ServerWsMessage::Error { message }] if message.contains("completed")));
    let replies = handle_client_ws(ClientWsMessage::Proceed, &mut session, &state).await;
    assert!(matches!(&replies[..], [ServerWsMessage::Error { .. }]));
  }

  #[tokio::test]
  async fn reset_clears_wizard_and_store() {
    let state = app(None);
    let mut session = open_session(&state, None).await;
    handle_client_ws(answer("q1", "x"), &mut session, &state).await;
    assert!(state.sessions.load(&session.id).await.is_some());

    let replies = handle_client_ws(ClientWsMessage::Reset, &mut session, &state).await;
    assert!(state_view(&replies).wizard.answers.is_empty());
    assert!(state.sessions.load(&session.id).await.is_none());
  }

  #[tokio::test]
  async fn disconnect_skips_pristine_sessions() {
    let state = app(None);
    let idle = open_session(&state, None).await;
    save_on_disconnect(&state, &idle).await;
    assert!(state.sessions.load(&idle.id).await.is_none());
    assert_eq!(state.sessions.session_count().await, 0);

    let mut busy = open_session(&state, None).await;
    busy.wizard.set_answer(&state.catalog, "q1", AnswerValue::Single("x".into())).expect("answer");
    save_on_disconnect(&state, &busy).await;
    assert!(state.sessions.load(&busy.id).await.is_some());
  }
}

//! Course design wizard backend.
//!
//! A guided questionnaire about a course design. Sections of questions are
//! answered in order; some sections are followed by a checkpoint whose rubric is
//! scored by an OpenAI-compatible evaluation service before the user may move
//! on. Once every section is done the answers are assembled into a structured
//! course document.

pub mod catalog;
pub mod config;
pub mod course;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod logic;
pub mod normalize;
pub mod openai;
pub mod prompts;
pub mod protocol;
pub mod routes;
pub mod seeds;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod wizard;

pub use routes::build_router;
pub use state::AppState;

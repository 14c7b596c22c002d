use thiserror::Error;

use crate::llm_client::LlmError;
use crate::pipeline::Stage;

/// Pipeline-level error type.
/// Every variant except `Operator` and `Llm` originates inside the pipeline itself;
/// all of them abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage}: required state key '{key}' is missing")]
    MissingInput { stage: Stage, key: &'static str },

    #[error("{stage}: model response did not match the expected schema: {reason}\nResponse: {raw}")]
    SchemaParse {
        stage: Stage,
        reason: String,
        raw: String,
    },

    #[error("No question styles were liked. At least one style must be liked to continue.")]
    EmptySelection,

    #[error("{stage}: LLM call failed: {source}")]
    Llm {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("Operator input failed: {0}")]
    Operator(#[from] std::io::Error),

    #[error("State value under '{key}' is malformed: {source}")]
    State {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Stable machine-readable code, logged at the process boundary.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MissingInput { .. } => "MISSING_INPUT",
            PipelineError::SchemaParse { .. } => "SCHEMA_PARSE",
            PipelineError::EmptySelection => "EMPTY_SELECTION",
            PipelineError::Llm { .. } => "LLM_ERROR",
            PipelineError::Operator(_) => "OPERATOR_ERROR",
            PipelineError::State { .. } => "STATE_ERROR",
        }
    }

    pub(crate) fn schema(stage: Stage, reason: impl Into<String>, raw: &str) -> Self {
        PipelineError::SchemaParse {
            stage,
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

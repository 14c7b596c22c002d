//! The accumulating key-value context threaded through every pipeline stage.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::PipelineError;
use crate::pipeline::Stage;

pub const JOB_DESCRIPTION: &str = "job_description";
pub const KEY_RESPONSIBILITIES: &str = "key_responsibilities";
pub const TOPICS: &str = "topics";
pub const CATEGORIZED_TOPICS: &str = "categorized_topics";
pub const DIVERSIFIED_QUESTIONS: &str = "diversified_questions";
pub const LIKED_QUESTION_STYLES: &str = "liked_question_styles";
pub const DISLIKED_QUESTION_STYLES: &str = "disliked_question_styles";
pub const INTERLINKING_QUESTIONS: &str = "interlinking_questions";
pub const FINAL_ASSESSMENT: &str = "final_assessment";

/// Insertion-ordered state for a single run.
///
/// Stages take the state by value and hand back the augmented state, so no
/// two stages ever hold it at once. Keys are only ever added or overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    values: Map<String, Value>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state holding only the seed key.
    pub fn seeded(job_description: impl Into<String>) -> Self {
        Self::new().with_text(JOB_DESCRIPTION, job_description)
    }

    pub fn with_text(mut self, key: &str, text: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), Value::String(text.into()));
        self
    }

    /// Serializes `record` to pretty JSON and stores it as a string value.
    pub fn with_json<T: Serialize>(self, key: &'static str, record: &T) -> Result<Self, PipelineError> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|source| PipelineError::State { key, source })?;
        Ok(self.with_text(key, json))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Keys in the order they were first introduced.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reads a text value, failing the stage if the key is absent.
    /// Non-string values are rendered as compact JSON.
    pub fn require_text(&self, stage: Stage, key: &'static str) -> Result<String, PipelineError> {
        match self.get(key) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(PipelineError::MissingInput { stage, key }),
        }
    }

    /// Reads a JSON-string value written by an upstream stage back into its record type.
    pub fn require_json<T: DeserializeOwned>(
        &self,
        stage: Stage,
        key: &'static str,
    ) -> Result<T, PipelineError> {
        let result = match self.get(key) {
            Some(Value::String(text)) => serde_json::from_str(text),
            Some(other) => serde_json::from_value(other.clone()),
            None => return Err(PipelineError::MissingInput { stage, key }),
        };
        result.map_err(|source| PipelineError::State { key, source })
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

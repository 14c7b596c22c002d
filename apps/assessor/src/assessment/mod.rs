// Assessment stages: one module per pipeline stage, plus the shared record helpers below.
// All model calls go through `LanguageModel`; every structured reply is validated
// here before it reaches the state.

pub mod categorize;
pub mod compile;
pub mod extract;
pub mod feedback;
pub mod interlink;
pub mod prompts;
pub mod styles;
pub mod topics;

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::llm_client::{strip_json_fences, LanguageModel};
use crate::pipeline::Stage;

/// Priority tag the model attaches to subtopics and topic pairings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(serde::de::Error::custom(format!(
                "unknown priority '{other}' (expected high, medium or low)"
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accepts either a JSON array of strings or a single string. Models sometimes
/// collapse a list into one string; an empty string becomes an empty list.
pub(crate) fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

/// Case- and whitespace-insensitive key for comparing topic names.
pub(crate) fn topic_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Sends one prompt and returns the raw completion text.
pub(crate) async fn complete_text(
    llm: &dyn LanguageModel,
    stage: Stage,
    prompt: &str,
    system: &str,
) -> Result<String, PipelineError> {
    debug!("{stage}: sending prompt ({} chars)", prompt.len());
    llm.complete(prompt, system)
        .await
        .map_err(|source| PipelineError::Llm { stage, source })
}

/// Sends one prompt and parses the reply as `T`. The raw reply is returned
/// alongside so later validation failures can quote it.
pub(crate) async fn complete_structured<T: DeserializeOwned>(
    llm: &dyn LanguageModel,
    stage: Stage,
    prompt: &str,
    system: &str,
) -> Result<(T, String), PipelineError> {
    let raw = complete_text(llm, stage, prompt, system).await?;
    let record = serde_json::from_str(strip_json_fences(&raw))
        .map_err(|e| PipelineError::schema(stage, e.to_string(), &raw))?;
    Ok((record, raw))
}

/// Compares an item count with the requested size. Strict mode rejects a
/// mismatch; lenient mode only logs it.
pub(crate) fn enforce_count(
    strict: bool,
    stage: Stage,
    what: &str,
    expected: usize,
    actual: usize,
) -> Result<(), String> {
    if expected == actual {
        return Ok(());
    }
    let reason = format!("expected exactly {expected} {what}, got {actual}");
    if strict {
        Err(reason)
    } else {
        warn!("{stage}: {reason}");
        Ok(())
    }
}

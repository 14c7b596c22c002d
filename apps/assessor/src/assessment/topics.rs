//! Topic Generation — N broader topics × M prioritized subtopics, checked for exact counts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assessment::prompts::TOPIC_GENERATION_PROMPT_TEMPLATE;
use crate::assessment::{complete_structured, enforce_count, topic_key, Priority};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, JSON_RESPONSE_NOTES};
use crate::llm_client::LanguageModel;
use crate::pipeline::{PipelineSettings, Stage};
use crate::state::{PipelineState, KEY_RESPONSIBILITIES, TOPICS};

const STAGE: Stage = Stage::TopicGeneration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtopic {
    pub name: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroaderTopic {
    pub broader_topic: String,
    pub subtopics: Vec<Subtopic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSet {
    pub broader_topics: Vec<BroaderTopic>,
}

impl TopicSet {
    pub fn broader_topic_names(&self) -> Vec<&str> {
        self.broader_topics
            .iter()
            .map(|t| t.broader_topic.as_str())
            .collect()
    }

    pub fn subtopic_count(&self) -> usize {
        self.broader_topics.iter().map(|t| t.subtopics.len()).sum()
    }

    /// Checks shape and, depending on `settings.strict_counts`, the exact counts.
    pub fn validate(&self, settings: &PipelineSettings) -> Result<(), String> {
        let strict = settings.strict_counts;
        if self.broader_topics.is_empty() {
            return Err("no broader topics returned".to_string());
        }
        enforce_count(
            strict,
            STAGE,
            "broader topics",
            settings.broader_topics,
            self.broader_topics.len(),
        )?;

        let mut names = HashSet::new();
        for topic in &self.broader_topics {
            if topic.broader_topic.trim().is_empty() {
                return Err("a broader topic has an empty name".to_string());
            }
            if !names.insert(topic_key(&topic.broader_topic)) {
                return Err(format!(
                    "broader topic '{}' appears more than once",
                    topic.broader_topic.trim()
                ));
            }
            if topic.subtopics.is_empty() {
                return Err(format!("broader topic '{}' has no subtopics", topic.broader_topic));
            }
            if topic.subtopics.iter().any(|s| s.name.trim().is_empty()) {
                return Err(format!(
                    "broader topic '{}' has a subtopic with an empty name",
                    topic.broader_topic
                ));
            }
            enforce_count(
                strict,
                STAGE,
                &format!("subtopics under '{}'", topic.broader_topic),
                settings.subtopics_per_topic,
                topic.subtopics.len(),
            )?;
        }
        Ok(())
    }
}

pub fn build_topic_prompt(key_responsibilities: &str, settings: &PipelineSettings) -> String {
    TOPIC_GENERATION_PROMPT_TEMPLATE
        .replace("{num_broader_topics}", &settings.broader_topics.to_string())
        .replace("{num_subtopics}", &settings.subtopics_per_topic.to_string())
        .replace("{json_notes}", JSON_RESPONSE_NOTES)
        .replace("{key_responsibilities}", key_responsibilities)
}

pub async fn generate_topics(
    state: PipelineState,
    llm: &dyn LanguageModel,
    settings: &PipelineSettings,
) -> Result<PipelineState, PipelineError> {
    let summary = state.require_text(STAGE, KEY_RESPONSIBILITIES)?;
    let prompt = build_topic_prompt(&summary, settings);

    let (topics, raw) = complete_structured::<TopicSet>(llm, STAGE, &prompt, JSON_ONLY_SYSTEM).await?;
    topics
        .validate(settings)
        .map_err(|reason| PipelineError::schema(STAGE, reason, &raw))?;

    info!(
        "Generated {} broader topics with {} subtopics: {:?}",
        topics.broader_topics.len(),
        topics.subtopic_count(),
        topics.broader_topic_names()
    );

    state.with_json(TOPICS, &topics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{topic_set, topic_set_json, StubModel};

    fn seeded() -> PipelineState {
        PipelineState::seeded("JD").with_text(KEY_RESPONSIBILITIES, "Design heat exchangers")
    }

    #[test]
    fn test_wire_format_uses_camel_case_fields() {
        let json = r#"{
            "broaderTopics": [
                {"broaderTopic": "Process Design", "subtopics": [
                    {"name": "Material Balance", "priority": "high"},
                    {"name": "PFD Preparation", "priority": "Medium"}
                ]}
            ]
        }"#;
        let topics: TopicSet = serde_json::from_str(json).unwrap();
        assert_eq!(topics.broader_topic_names(), vec!["Process Design"]);
        assert_eq!(topics.broader_topics[0].subtopics[1].priority, Priority::Medium);
    }

    #[test]
    fn test_prompt_states_requested_counts() {
        let prompt = build_topic_prompt("Design heat exchangers", &PipelineSettings::default());
        assert!(prompt.contains("exactly 2 broader topics"));
        assert!(prompt.contains("exactly 20 subtopics"));
        assert!(prompt.contains("Design heat exchangers"));
        assert!(!prompt.contains("{json_notes}"));
    }

    #[test]
    fn test_validate_accepts_two_by_twenty() {
        assert!(topic_set(2, 20).validate(&PipelineSettings::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_subtopic_counts() {
        let settings = PipelineSettings::default();
        for subtopics in [1, 19, 21] {
            let reason = topic_set(2, subtopics).validate(&settings).unwrap_err();
            assert!(reason.contains(&format!("got {subtopics}")), "{reason}");
        }
    }

    #[test]
    fn test_validate_rejects_wrong_topic_count() {
        let reason = topic_set(3, 20)
            .validate(&PipelineSettings::default())
            .unwrap_err();
        assert_eq!(reason, "expected exactly 2 broader topics, got 3");
    }

    #[test]
    fn test_validate_rejects_names_differing_only_in_case_or_whitespace() {
        let mut topics = topic_set(2, 20);
        topics.broader_topics[1].broader_topic = "process design 0 ".to_string();

        let reason = topics.validate(&PipelineSettings::default()).unwrap_err();
        assert_eq!(reason, "broader topic 'process design 0' appears more than once");

        let lenient = PipelineSettings {
            strict_counts: false,
            ..PipelineSettings::default()
        };
        assert!(topics.validate(&lenient).is_err());
    }

    #[tokio::test]
    async fn test_generate_topics_rejects_duplicate_broader_topics() {
        let mut topics = topic_set(2, 20);
        topics.broader_topics[1].broader_topic = "PROCESS DESIGN 0".to_string();
        let stub = StubModel::new(vec![topic_set_json(&topics)]);

        let err = generate_topics(seeded(), &stub, &PipelineSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaParse { stage: STAGE, .. }));
    }

    #[test]
    fn test_lenient_mode_accepts_count_mismatch_but_not_empty_topics() {
        let settings = PipelineSettings {
            strict_counts: false,
            ..PipelineSettings::default()
        };
        assert!(topic_set(1, 21).validate(&settings).is_ok());
        assert!(topic_set(0, 20).validate(&settings).is_err());
        assert!(topic_set(2, 0).validate(&settings).is_err());
    }

    #[tokio::test]
    async fn test_generate_topics_stores_validated_json() {
        let stub = StubModel::new(vec![topic_set_json(&topic_set(2, 20))]);
        let state = generate_topics(seeded(), &stub, &PipelineSettings::default())
            .await
            .unwrap();

        let stored: TopicSet = state.require_json(Stage::TopicCategorization, TOPICS).unwrap();
        assert_eq!(stored, topic_set(2, 20));
    }

    #[tokio::test]
    async fn test_generate_topics_rejects_21_subtopics_with_raw_text() {
        let raw = topic_set_json(&topic_set(2, 21));
        let stub = StubModel::new(vec![raw.clone()]);
        let err = generate_topics(seeded(), &stub, &PipelineSettings::default())
            .await
            .unwrap_err();

        match err {
            PipelineError::SchemaParse { stage, raw: got, .. } => {
                assert_eq!(stage, STAGE);
                assert_eq!(got, raw);
            }
            other => panic!("expected SchemaParse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_topics_missing_summary_skips_model() {
        let stub = StubModel::new(vec![]);
        let err = generate_topics(PipelineState::seeded("JD"), &stub, &PipelineSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { key: KEY_RESPONSIBILITIES, .. }));
        assert_eq!(stub.calls(), 0);
    }
}

//! Topic Categorization — places every broader topic in exactly one of four difficulty tiers.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assessment::prompts::CATEGORIZATION_PROMPT_TEMPLATE;
use crate::assessment::topics::TopicSet;
use crate::assessment::{complete_structured, topic_key};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, JSON_RESPONSE_NOTES};
use crate::llm_client::LanguageModel;
use crate::pipeline::Stage;
use crate::state::{PipelineState, CATEGORIZED_TOPICS, TOPICS};

const STAGE: Stage = Stage::TopicCategorization;

/// Difficulty tiers, hardest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyTier {
    VeryHard,
    Hard,
    Medium,
    Easy,
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DifficultyTier::VeryHard => "very hard",
            DifficultyTier::Hard => "hard",
            DifficultyTier::Medium => "medium",
            DifficultyTier::Easy => "easy",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyCategories {
    #[serde(default)]
    pub very_hard: Vec<String>,
    #[serde(default)]
    pub hard: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub easy: Vec<String>,
}

impl DifficultyCategories {
    /// Tiers in order, hardest first.
    pub fn tiers(&self) -> [(DifficultyTier, &[String]); 4] {
        [
            (DifficultyTier::VeryHard, self.very_hard.as_slice()),
            (DifficultyTier::Hard, self.hard.as_slice()),
            (DifficultyTier::Medium, self.medium.as_slice()),
            (DifficultyTier::Easy, self.easy.as_slice()),
        ]
    }

    pub fn total(&self) -> usize {
        self.tiers().iter().map(|(_, names)| names.len()).sum()
    }

    /// The tiers together must name every broader topic exactly once and nothing else.
    pub fn validate_coverage(&self, topics: &TopicSet) -> Result<(), String> {
        let expected: HashSet<String> = topics
            .broader_topic_names()
            .into_iter()
            .map(topic_key)
            .collect();

        let mut seen: HashMap<String, DifficultyTier> = HashMap::new();
        for (tier, names) in self.tiers() {
            for name in names {
                let key = topic_key(name);
                if !expected.contains(&key) {
                    return Err(format!("'{name}' ({tier}) is not one of the broader topics"));
                }
                if let Some(previous) = seen.insert(key, tier) {
                    return Err(format!(
                        "'{name}' is categorized more than once ({previous} and {tier})"
                    ));
                }
            }
        }

        let missing: Vec<&str> = topics
            .broader_topic_names()
            .into_iter()
            .filter(|name| !seen.contains_key(&topic_key(name)))
            .collect();
        if !missing.is_empty() {
            return Err(format!("broader topics not categorized: {}", missing.join(", ")));
        }
        Ok(())
    }
}

pub async fn categorize_topics(
    state: PipelineState,
    llm: &dyn LanguageModel,
) -> Result<PipelineState, PipelineError> {
    let topics_json = state.require_text(STAGE, TOPICS)?;
    let topics: TopicSet = state.require_json(STAGE, TOPICS)?;

    let prompt = CATEGORIZATION_PROMPT_TEMPLATE
        .replace("{json_notes}", JSON_RESPONSE_NOTES)
        .replace("{topics}", &topics_json);

    let (categories, raw) =
        complete_structured::<DifficultyCategories>(llm, STAGE, &prompt, JSON_ONLY_SYSTEM).await?;
    categories
        .validate_coverage(&topics)
        .map_err(|reason| PipelineError::schema(STAGE, reason, &raw))?;

    info!("Categorized {} broader topics", categories.total());
    for (tier, names) in categories.tiers() {
        info!("{tier}: {names:?}");
    }

    state.with_json(CATEGORIZED_TOPICS, &categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{categories_json, topic_set, StubModel};

    fn categories(very_hard: &[&str], hard: &[&str], medium: &[&str], easy: &[&str]) -> DifficultyCategories {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        DifficultyCategories {
            very_hard: owned(very_hard),
            hard: owned(hard),
            medium: owned(medium),
            easy: owned(easy),
        }
    }

    #[test]
    fn test_wire_format_uses_very_hard_key() {
        let parsed: DifficultyCategories = serde_json::from_str(
            r#"{"veryHard": ["Process Design 0"], "hard": [], "medium": ["Process Design 1"], "easy": []}"#,
        )
        .unwrap();
        assert_eq!(parsed.very_hard, vec!["Process Design 0".to_string()]);
        assert_eq!(parsed.medium, vec!["Process Design 1".to_string()]);
        assert!(parsed.hard.is_empty());
    }

    #[test]
    fn test_union_covers_every_topic_exactly_once() {
        let topics = topic_set(4, 3);
        let names = topics.broader_topic_names();
        let result = categories(&[names[0]], &[names[1]], &[], &[names[2], names[3]]);

        assert!(result.validate_coverage(&topics).is_ok());
        assert_eq!(result.total(), names.len());
        let union: HashSet<String> = result
            .tiers()
            .iter()
            .flat_map(|(_, n)| n.iter().cloned())
            .collect();
        assert_eq!(union.len(), names.len());
    }

    #[test]
    fn test_duplicate_across_tiers_is_rejected() {
        let topics = topic_set(2, 3);
        let names = topics.broader_topic_names();
        let result = categories(&[names[0]], &[names[1]], &[names[0]], &[]);
        let reason = result.validate_coverage(&topics).unwrap_err();
        assert!(reason.contains("more than once"), "{reason}");
    }

    #[test]
    fn test_omitted_topic_is_rejected() {
        let topics = topic_set(2, 3);
        let names = topics.broader_topic_names();
        let result = categories(&[names[0]], &[], &[], &[]);
        let reason = result.validate_coverage(&topics).unwrap_err();
        assert!(reason.contains(names[1]), "{reason}");
    }

    #[test]
    fn test_subtopic_or_unknown_name_is_rejected() {
        let topics = topic_set(1, 3);
        let names = topics.broader_topic_names();
        let subtopic = topics.broader_topics[0].subtopics[0].name.clone();
        let result = categories(&[names[0]], &[subtopic.as_str()], &[], &[]);
        let reason = result.validate_coverage(&topics).unwrap_err();
        assert!(reason.contains("is not one of the broader topics"), "{reason}");
    }

    #[tokio::test]
    async fn test_categorize_topics_stores_tiers() {
        let topics = topic_set(2, 20);
        let state = PipelineState::new().with_json(TOPICS, &topics).unwrap();
        let stub = StubModel::new(vec![categories_json(&topics)]);

        let state = categorize_topics(state, &stub).await.unwrap();
        let stored: DifficultyCategories = state
            .require_json(Stage::StyleDiversification, CATEGORIZED_TOPICS)
            .unwrap();
        assert!(stored.validate_coverage(&topics).is_ok());
        assert!(stub.prompts()[0].contains("\"broaderTopics\""));
    }
}

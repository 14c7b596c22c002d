//! Interlinking — groups of topics to be assessed together in a single question.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assessment::prompts::INTERLINKING_PROMPT_TEMPLATE;
use crate::assessment::topics::TopicSet;
use crate::assessment::{complete_structured, one_or_many, topic_key, Priority};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, JSON_RESPONSE_NOTES};
use crate::llm_client::LanguageModel;
use crate::pipeline::{PipelineSettings, Stage};
use crate::state::{PipelineState, INTERLINKING_QUESTIONS, JOB_DESCRIPTION, TOPICS};

const STAGE: Stage = Stage::Interlinking;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPair {
    #[serde(deserialize_with = "one_or_many")]
    pub topics: Vec<String>,
    pub rationale: String,
    pub assessment_example: String,
    pub job_relevance: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPairs {
    pub topic_pairs: Vec<TopicPair>,
}

/// How well the pairings cover the topic set. Only logged; the model is asked
/// to satisfy these but a shortfall does not fail the run.
#[derive(Debug, Default, PartialEq)]
pub struct Coverage {
    /// Broader topics where neither the topic nor any of its subtopics is paired.
    pub uncovered: Vec<String>,
    /// High-priority subtopics that appear in fewer than two pairings.
    pub underused_high_priority: Vec<String>,
    /// Safety-related topics or subtopics that appear in no pairing.
    pub missing_safety: Vec<String>,
}

impl TopicPairs {
    pub fn validate(&self, settings: &PipelineSettings) -> Result<(), String> {
        if self.topic_pairs.is_empty() {
            return Err("no topic pairs returned".to_string());
        }
        if self.topic_pairs.len() > settings.max_topic_pairs {
            return Err(format!(
                "expected at most {} topic pairs, got {}",
                settings.max_topic_pairs,
                self.topic_pairs.len()
            ));
        }
        for (idx, pair) in self.topic_pairs.iter().enumerate() {
            let named = pair.topics.iter().filter(|t| !t.trim().is_empty()).count();
            if named < 2 {
                return Err(format!(
                    "topic pair #{} must combine at least two topics, got {:?}",
                    idx + 1,
                    pair.topics
                ));
            }
        }
        Ok(())
    }

    /// Number of pairings each topic name appears in, keyed by `topic_key`.
    fn usage(&self) -> HashMap<String, usize> {
        let mut usage = HashMap::new();
        for pair in &self.topic_pairs {
            for topic in &pair.topics {
                *usage.entry(topic_key(topic)).or_insert(0) += 1;
            }
        }
        usage
    }

    pub fn coverage(&self, topics: &TopicSet) -> Coverage {
        let usage = self.usage();
        let used = |name: &str| usage.get(&topic_key(name)).copied().unwrap_or(0);
        let mut coverage = Coverage::default();

        for broader in &topics.broader_topics {
            let covered = used(&broader.broader_topic) > 0
                || broader.subtopics.iter().any(|s| used(&s.name) > 0);
            if !covered {
                coverage.uncovered.push(broader.broader_topic.clone());
            }
            if is_safety_related(&broader.broader_topic) && used(&broader.broader_topic) == 0 {
                coverage.missing_safety.push(broader.broader_topic.clone());
            }

            for subtopic in &broader.subtopics {
                if subtopic.priority == Priority::High && used(&subtopic.name) < 2 {
                    coverage.underused_high_priority.push(subtopic.name.clone());
                }
                if is_safety_related(&subtopic.name) && used(&subtopic.name) == 0 {
                    coverage.missing_safety.push(subtopic.name.clone());
                }
            }
        }
        coverage
    }
}

fn is_safety_related(name: &str) -> bool {
    let lower = name.to_lowercase();
    ["safety", "hazard", "hazop"].iter().any(|k| lower.contains(k))
}

pub fn build_interlinking_prompt(job_description: &str, topics_json: &str, settings: &PipelineSettings) -> String {
    // The job description is embedded in a JSON-shaped block, so quote it as a JSON string.
    let quoted_jd = serde_json::Value::String(job_description.to_string()).to_string();
    INTERLINKING_PROMPT_TEMPLATE
        .replace("{max_pairs}", &settings.max_topic_pairs.to_string())
        .replace("{json_notes}", JSON_RESPONSE_NOTES)
        .replace("{topics}", topics_json)
        .replace("{job_description}", &quoted_jd)
}

pub async fn interlink_topics(
    state: PipelineState,
    llm: &dyn LanguageModel,
    settings: &PipelineSettings,
) -> Result<PipelineState, PipelineError> {
    let job_description = state.require_text(STAGE, JOB_DESCRIPTION)?;
    let topics_json = state.require_text(STAGE, TOPICS)?;
    let topics: TopicSet = state.require_json(STAGE, TOPICS)?;
    let prompt = build_interlinking_prompt(&job_description, &topics_json, settings);

    let (pairs, raw) = complete_structured::<TopicPairs>(llm, STAGE, &prompt, JSON_ONLY_SYSTEM).await?;
    pairs
        .validate(settings)
        .map_err(|reason| PipelineError::schema(STAGE, reason, &raw))?;

    let coverage = pairs.coverage(&topics);
    if !coverage.uncovered.is_empty() {
        warn!("Topics not covered by any pairing: {:?}", coverage.uncovered);
    }
    if !coverage.underused_high_priority.is_empty() {
        warn!(
            "High-priority subtopics in fewer than two pairings: {:?}",
            coverage.underused_high_priority
        );
    }
    if !coverage.missing_safety.is_empty() {
        warn!("Safety topics missing from pairings: {:?}", coverage.missing_safety);
    }

    info!("Created {} topic pairings", pairs.topic_pairs.len());

    state.with_json(INTERLINKING_QUESTIONS, &pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::topics::{BroaderTopic, Subtopic};
    use crate::pipeline::testing::{topic_pairs, topic_pairs_json, topic_set, StubModel};

    fn pair(topics: &[&str], priority: Priority) -> TopicPair {
        TopicPair {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            rationale: "Combines design and operations".to_string(),
            assessment_example: "Debottleneck a distillation train".to_string(),
            job_relevance: "Troubleshooting responsibilities".to_string(),
            priority,
        }
    }

    #[test]
    fn test_wire_format_accepts_example_shape() {
        let parsed: TopicPairs = serde_json::from_str(
            r#"{"topicPairs": [{
                "topics": ["Reactor Design", "Heat Exchanger Design"],
                "rationale": "Thermal management in reaction systems",
                "assessmentExample": "Design cooling for an exothermic batch reactor",
                "jobRelevance": "Responsibilities #2 and #4",
                "priority": "high"
            }]}"#,
        )
        .unwrap();
        assert_eq!(parsed.topic_pairs[0].topics.len(), 2);
        assert_eq!(parsed.topic_pairs[0].priority, Priority::High);
    }

    #[test]
    fn test_validate_rejects_more_than_max_pairs() {
        let topics = topic_set(2, 20);
        let settings = PipelineSettings::default();
        assert!(topic_pairs(&topics, 10).validate(&settings).is_ok());
        let reason = topic_pairs(&topics, 11).validate(&settings).unwrap_err();
        assert_eq!(reason, "expected at most 10 topic pairs, got 11");
    }

    #[test]
    fn test_validate_rejects_single_topic_pairing() {
        let pairs = TopicPairs {
            topic_pairs: vec![pair(&["Reactor Design", ""], Priority::Low)],
        };
        let reason = pairs.validate(&PipelineSettings::default()).unwrap_err();
        assert!(reason.contains("at least two topics"), "{reason}");
    }

    #[test]
    fn test_coverage_counts_subtopics_toward_their_broader_topic() {
        let topics = TopicSet {
            broader_topics: vec![
                BroaderTopic {
                    broader_topic: "Equipment Design".to_string(),
                    subtopics: vec![
                        Subtopic { name: "Heat Exchanger Design".to_string(), priority: Priority::High },
                        Subtopic { name: "Pump Sizing".to_string(), priority: Priority::Low },
                    ],
                },
                BroaderTopic {
                    broader_topic: "Plant Safety".to_string(),
                    subtopics: vec![Subtopic { name: "HAZOP Studies".to_string(), priority: Priority::High }],
                },
                BroaderTopic {
                    broader_topic: "Communication".to_string(),
                    subtopics: vec![Subtopic { name: "Report Writing".to_string(), priority: Priority::Medium }],
                },
            ],
        };
        let pairs = TopicPairs {
            topic_pairs: vec![
                pair(&["heat exchanger design", "Pump Sizing"], Priority::High),
                pair(&["Heat Exchanger Design", "HAZOP Studies"], Priority::High),
            ],
        };

        let coverage = pairs.coverage(&topics);
        assert_eq!(coverage.uncovered, vec!["Communication".to_string()]);
        assert_eq!(coverage.underused_high_priority, vec!["HAZOP Studies".to_string()]);
        assert_eq!(coverage.missing_safety, vec!["Plant Safety".to_string()]);
    }

    #[test]
    fn test_prompt_quotes_job_description() {
        let prompt = build_interlinking_prompt("Line one\n\"Quoted\"", "{}", &PipelineSettings::default());
        assert!(prompt.contains(r#""jobDescription": "Line one\n\"Quoted\"""#));
        assert!(prompt.contains("At most 10 topic groups"));
    }

    #[tokio::test]
    async fn test_interlink_topics_stores_every_pair() {
        let topics = topic_set(2, 20);
        let state = PipelineState::seeded("JD").with_json(TOPICS, &topics).unwrap();
        let stub = StubModel::new(vec![topic_pairs_json(&topics, 10)]);

        let state = interlink_topics(state, &stub, &PipelineSettings::default())
            .await
            .unwrap();
        let stored: TopicPairs = state.require_json(Stage::Compilation, INTERLINKING_QUESTIONS).unwrap();
        assert_eq!(stored, topic_pairs(&topics, 10));
        assert!(stored.coverage(&topics).uncovered.is_empty());
    }

    #[tokio::test]
    async fn test_interlink_topics_over_limit_fails() {
        let topics = topic_set(2, 20);
        let state = PipelineState::seeded("JD").with_json(TOPICS, &topics).unwrap();
        let stub = StubModel::new(vec![topic_pairs_json(&topics, 12)]);

        let err = interlink_topics(state, &stub, &PipelineSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaParse { stage: STAGE, .. }));
    }
}

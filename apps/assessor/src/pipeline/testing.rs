//! Test doubles and fixture builders shared by the stage and pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::assessment::categorize::DifficultyCategories;
use crate::assessment::compile::{Assessment, Question};
use crate::assessment::interlink::{TopicPair, TopicPairs};
use crate::assessment::styles::{QuestionStyle, StyleSet};
use crate::assessment::topics::{BroaderTopic, Subtopic, TopicSet};
use crate::assessment::Priority;
use crate::llm_client::{LanguageModel, LlmError};

pub const SAMPLE_JD: &str = "Process Engineer, specialty chemicals plant. \
    Perform material and energy balances, size heat exchangers and batch reactors, \
    troubleshoot distillation columns, and support plant safety reviews.";

pub const EXTRACT_RESPONSE: &str = "Responsibilities: material and energy balances; \
    equipment sizing; distillation troubleshooting; safety reviews. \
    Skills: Aspen, Excel, communication.";

pub const STYLE_COUNT: usize = 15;

/// Returns canned completions in order and records every prompt it receives.
/// Running out of responses is reported as `EmptyContent`.
pub struct StubModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub fn topic_set(broader: usize, subtopics: usize) -> TopicSet {
    TopicSet {
        broader_topics: (0..broader)
            .map(|i| BroaderTopic {
                broader_topic: format!("Process Design {i}"),
                subtopics: (0..subtopics)
                    .map(|j| Subtopic {
                        name: format!("Process Design {i} Skill {j}"),
                        priority: match j % 3 {
                            0 => Priority::High,
                            1 => Priority::Medium,
                            _ => Priority::Low,
                        },
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn topic_set_json(topics: &TopicSet) -> String {
    serde_json::to_string_pretty(topics).unwrap()
}

/// Spreads the broader topics round-robin over the four tiers.
pub fn categories_json(topics: &TopicSet) -> String {
    let mut categories = DifficultyCategories::default();
    for (i, name) in topics.broader_topic_names().into_iter().enumerate() {
        let tier = match i % 4 {
            0 => &mut categories.very_hard,
            1 => &mut categories.hard,
            2 => &mut categories.medium,
            _ => &mut categories.easy,
        };
        tier.push(name.to_string());
    }
    serde_json::to_string(&categories).unwrap()
}

pub fn style_set(n: usize) -> StyleSet {
    StyleSet {
        question_styles: (0..n)
            .map(|i| QuestionStyle {
                style_name: format!("Scenario Analysis - Process Design {i}"),
                definition: format!("Candidate resolves plant scenario {i}"),
                example: format!("Reactor {i} overheats during start-up. What do you check first?"),
                assessment_goal: "Applied troubleshooting".to_string(),
                suitable_for_topics: vec![format!("Process Design {} Skill 0", i % 2)],
            })
            .collect(),
    }
}

pub fn style_set_json(n: usize) -> String {
    serde_json::to_string(&style_set(n)).unwrap()
}

/// Pairs consecutive broader topics so every broader topic is covered.
pub fn topic_pairs(topics: &TopicSet, n: usize) -> TopicPairs {
    let names = topics.broader_topic_names();
    TopicPairs {
        topic_pairs: (0..n)
            .map(|k| TopicPair {
                topics: vec![
                    names[k % names.len()].to_string(),
                    names[(k + 1) % names.len()].to_string(),
                ],
                rationale: format!("Combination {k} links design with operations"),
                assessment_example: format!("Debottleneck unit {k}"),
                job_relevance: "Troubleshooting and debottlenecking".to_string(),
                priority: if k < 3 { Priority::High } else { Priority::Medium },
            })
            .collect(),
    }
}

pub fn topic_pairs_json(topics: &TopicSet, n: usize) -> String {
    serde_json::to_string(&topic_pairs(topics, n)).unwrap()
}

/// `n` complete questions cycling through `styles`.
pub fn assessment(n: usize, styles: &[QuestionStyle]) -> Assessment {
    Assessment {
        questions: (0..n)
            .map(|i| Question {
                question: format!("Question {i}: which change most reduces reboiler duty?"),
                options: vec![
                    "A) Raise reflux ratio".to_string(),
                    "B) Preheat the feed".to_string(),
                    "C) Increase column pressure".to_string(),
                    "D) Add trays above the feed".to_string(),
                ],
                correct_answer: "B) Preheat the feed".to_string(),
                style: styles[i % styles.len()].style_name.clone(),
                topics: vec!["Process Design 0".to_string(), "Process Design 1".to_string()],
            })
            .collect(),
    }
}

pub fn assessment_json(n: usize, styles: &[QuestionStyle]) -> String {
    serde_json::to_string(&assessment(n, styles)).unwrap()
}

/// One schema-valid completion per model-backed stage, in pipeline order.
pub fn canned_responses() -> Vec<String> {
    let topics = topic_set(2, 20);
    let styles = style_set(STYLE_COUNT);
    vec![
        EXTRACT_RESPONSE.to_string(),
        // Fenced on purpose: the client must strip it.
        format!("```json\n{}\n```", topic_set_json(&topics)),
        categories_json(&topics),
        style_set_json(STYLE_COUNT),
        topic_pairs_json(&topics, 10),
        assessment_json(10, &styles.question_styles),
    ]
}

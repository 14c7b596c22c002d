//! Style Diversification — named assessment styles derived from the topics and job description.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assessment::prompts::STYLE_PROMPT_TEMPLATE;
use crate::assessment::{complete_structured, enforce_count, one_or_many, topic_key};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, JSON_RESPONSE_NOTES};
use crate::llm_client::LanguageModel;
use crate::pipeline::{PipelineSettings, Stage};
use crate::state::{PipelineState, DIVERSIFIED_QUESTIONS, JOB_DESCRIPTION, TOPICS};

const STAGE: Stage = Stage::StyleDiversification;

/// A named assessment approach, e.g. "Scenario Analysis - Heat Transfer".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStyle {
    pub style_name: String,
    pub definition: String,
    pub example: String,
    pub assessment_goal: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub suitable_for_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSet {
    pub question_styles: Vec<QuestionStyle>,
}

impl StyleSet {
    pub fn validate(&self, settings: &PipelineSettings) -> Result<(), String> {
        if self.question_styles.is_empty() {
            return Err("no question styles returned".to_string());
        }

        let mut names = HashSet::new();
        for (idx, style) in self.question_styles.iter().enumerate() {
            if style.style_name.trim().is_empty() {
                return Err(format!("question style #{} has an empty style_name", idx + 1));
            }
            if !names.insert(topic_key(&style.style_name)) {
                warn!("{STAGE}: duplicate style name '{}'", style.style_name);
            }
        }

        enforce_count(
            settings.strict_counts,
            STAGE,
            "question styles",
            settings.question_styles,
            self.question_styles.len(),
        )
    }
}

pub fn build_style_prompt(job_description: &str, topics_json: &str, settings: &PipelineSettings) -> String {
    STYLE_PROMPT_TEMPLATE
        .replace("{num_styles}", &settings.question_styles.to_string())
        .replace("{json_notes}", JSON_RESPONSE_NOTES)
        .replace("{topics}", topics_json)
        .replace("{job_description}", job_description)
}

pub async fn diversify_styles(
    state: PipelineState,
    llm: &dyn LanguageModel,
    settings: &PipelineSettings,
) -> Result<PipelineState, PipelineError> {
    let topics_json = state.require_text(STAGE, TOPICS)?;
    let job_description = state.require_text(STAGE, JOB_DESCRIPTION)?;
    let prompt = build_style_prompt(&job_description, &topics_json, settings);

    let (styles, raw) = complete_structured::<StyleSet>(llm, STAGE, &prompt, JSON_ONLY_SYSTEM).await?;
    styles
        .validate(settings)
        .map_err(|reason| PipelineError::schema(STAGE, reason, &raw))?;

    info!("Generated {} question styles", styles.question_styles.len());

    state.with_json(DIVERSIFIED_QUESTIONS, &styles)
}

//! Assessment Compilation — the final multiple-choice questions, built from the
//! liked styles and the topic pairings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assessment::prompts::COMPILATION_PROMPT_TEMPLATE;
use crate::assessment::styles::QuestionStyle;
use crate::assessment::{complete_structured, enforce_count, one_or_many, topic_key};
use crate::errors::PipelineError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, JSON_RESPONSE_NOTES};
use crate::llm_client::LanguageModel;
use crate::pipeline::{PipelineSettings, Stage};
use crate::state::{
    PipelineState, FINAL_ASSESSMENT, INTERLINKING_QUESTIONS, JOB_DESCRIPTION, LIKED_QUESTION_STYLES,
};

const STAGE: Stage = Stage::Compilation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(deserialize_with = "one_or_many")]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub style: String,
    #[serde(deserialize_with = "one_or_many")]
    pub topics: Vec<String>,
}

impl Question {
    /// Name of the first empty field, if any.
    fn first_empty_field(&self) -> Option<&'static str> {
        fn blank(s: &str) -> bool {
            s.trim().is_empty()
        }
        if blank(&self.question) {
            Some("question")
        } else if self.options.iter().all(|o| blank(o)) {
            Some("options")
        } else if blank(&self.correct_answer) {
            Some("correct_answer")
        } else if blank(&self.style) {
            Some("style")
        } else if self.topics.iter().all(|t| blank(t)) {
            Some("topics")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub questions: Vec<Question>,
}

impl Assessment {
    pub fn validate(&self, settings: &PipelineSettings) -> Result<(), String> {
        if self.questions.is_empty() {
            return Err("no questions returned".to_string());
        }
        for (idx, question) in self.questions.iter().enumerate() {
            if let Some(field) = question.first_empty_field() {
                return Err(format!("question #{} has an empty '{field}'", idx + 1));
            }
        }
        enforce_count(
            settings.strict_counts,
            STAGE,
            "questions",
            settings.questions,
            self.questions.len(),
        )
    }

    /// Questions whose `style` does not name one of the liked styles.
    pub fn unknown_styles<'a>(&'a self, liked: &[QuestionStyle]) -> Vec<&'a str> {
        let known: HashSet<String> = liked.iter().map(|s| topic_key(&s.style_name)).collect();
        self.questions
            .iter()
            .filter(|q| !known.contains(&topic_key(&q.style)))
            .map(|q| q.style.as_str())
            .collect()
    }
}

pub fn build_compilation_prompt(
    liked_styles_json: &str,
    topic_pairs_json: &str,
    job_description: &str,
    settings: &PipelineSettings,
) -> String {
    COMPILATION_PROMPT_TEMPLATE
        .replace("{num_questions}", &settings.questions.to_string())
        .replace("{json_notes}", JSON_RESPONSE_NOTES)
        .replace("{liked_styles}", liked_styles_json)
        .replace("{topic_pairs}", topic_pairs_json)
        .replace("{job_description}", job_description)
}

pub async fn compile_assessment(
    state: PipelineState,
    llm: &dyn LanguageModel,
    settings: &PipelineSettings,
) -> Result<PipelineState, PipelineError> {
    let liked: Vec<QuestionStyle> = state.require_json(STAGE, LIKED_QUESTION_STYLES)?;
    let liked_json = state.require_text(STAGE, LIKED_QUESTION_STYLES)?;
    let pairs_json = state.require_text(STAGE, INTERLINKING_QUESTIONS)?;
    let job_description = state.require_text(STAGE, JOB_DESCRIPTION)?;
    let prompt = build_compilation_prompt(&liked_json, &pairs_json, &job_description, settings);

    let (assessment, raw) = complete_structured::<Assessment>(llm, STAGE, &prompt, JSON_ONLY_SYSTEM).await?;
    assessment
        .validate(settings)
        .map_err(|reason| PipelineError::schema(STAGE, reason, &raw))?;

    let unknown = assessment.unknown_styles(&liked);
    if !unknown.is_empty() {
        warn!("Questions use styles that were not liked: {unknown:?}");
    }

    info!("Compiled assessment with {} questions", assessment.questions.len());

    state.with_json(FINAL_ASSESSMENT, &assessment)
}

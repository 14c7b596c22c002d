use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_API_URL;
use crate::pipeline::PipelineSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub rust_log: String,
    /// Overrides the built-in sample job description.
    pub job_description: Option<String>,
    /// Comma-separated like/dislike answers; replaces the interactive prompt when set.
    pub feedback_answers: Option<Vec<String>>,
    pub pipeline: PipelineSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PipelineSettings::default();

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            job_description: optional_env("JOB_DESCRIPTION"),
            feedback_answers: optional_env("FEEDBACK_ANSWERS").map(|raw| split_answers(&raw)),
            pipeline: PipelineSettings {
                broader_topics: count_env("NUM_BROADER_TOPICS", defaults.broader_topics)?,
                subtopics_per_topic: count_env("NUM_SUBTOPICS", defaults.subtopics_per_topic)?,
                question_styles: count_env("NUM_QUESTION_STYLES", defaults.question_styles)?,
                max_topic_pairs: count_env("MAX_TOPIC_PAIRS", defaults.max_topic_pairs)?,
                questions: count_env("NUM_QUESTIONS", defaults.questions)?,
                strict_counts: parse_env("STRICT_COUNTS", defaults.strict_counts)?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

fn count_env(key: &str, default: usize) -> Result<usize> {
    let count = parse_env(key, default)?;
    check_count(key, count)
}

fn check_count(key: &str, count: usize) -> Result<usize> {
    if count == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(count)
}

fn split_answers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

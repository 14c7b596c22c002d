//! Assessment pipeline — runs the seven stages in a fixed order against one state.
//!
//! Flow: extract → topic generation → topic categorization → style diversification →
//!       operator feedback → interlinking → assessment compilation.
//!
//! There is no branching and no retry. The first failing stage ends the run and
//! its error is returned unchanged; no partial state escapes.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::assessment::feedback::DecisionSource;
use crate::assessment::{categorize, compile, extract, feedback, interlink, styles, topics};
use crate::errors::PipelineError;
use crate::llm_client::LanguageModel;
use crate::state::{self, PipelineState};

#[cfg(test)]
pub mod testing;

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

/// One registered pipeline stage. Order of `Stage::ORDER` is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    TopicGeneration,
    TopicCategorization,
    StyleDiversification,
    Feedback,
    Interlinking,
    Compilation,
}

impl Stage {
    pub const ORDER: [Stage; 7] = [
        Stage::Extract,
        Stage::TopicGeneration,
        Stage::TopicCategorization,
        Stage::StyleDiversification,
        Stage::Feedback,
        Stage::Interlinking,
        Stage::Compilation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Extract => "Extract",
            Stage::TopicGeneration => "Topic Generation",
            Stage::TopicCategorization => "Topic Categorization",
            Stage::StyleDiversification => "Style Diversification",
            Stage::Feedback => "Human Feedback Gate",
            Stage::Interlinking => "Interlinking",
            Stage::Compilation => "Assessment Compilation",
        }
    }

    /// State keys that must be present before the stage may run.
    pub fn requires(self) -> &'static [&'static str] {
        match self {
            Stage::Extract => &[state::JOB_DESCRIPTION],
            Stage::TopicGeneration => &[state::KEY_RESPONSIBILITIES],
            Stage::TopicCategorization => &[state::TOPICS],
            Stage::StyleDiversification => &[state::TOPICS, state::JOB_DESCRIPTION],
            Stage::Feedback => &[state::DIVERSIFIED_QUESTIONS],
            Stage::Interlinking => &[state::JOB_DESCRIPTION, state::TOPICS],
            Stage::Compilation => &[
                state::LIKED_QUESTION_STYLES,
                state::INTERLINKING_QUESTIONS,
                state::JOB_DESCRIPTION,
            ],
        }
    }

    /// State keys the stage writes.
    pub fn produces(self) -> &'static [&'static str] {
        match self {
            Stage::Extract => &[state::KEY_RESPONSIBILITIES],
            Stage::TopicGeneration => &[state::TOPICS],
            Stage::TopicCategorization => &[state::CATEGORIZED_TOPICS],
            Stage::StyleDiversification => &[state::DIVERSIFIED_QUESTIONS],
            Stage::Feedback => &[state::LIKED_QUESTION_STYLES, state::DISLIKED_QUESTION_STYLES],
            Stage::Interlinking => &[state::INTERLINKING_QUESTIONS],
            Stage::Compilation => &[state::FINAL_ASSESSMENT],
        }
    }

    /// Whether the stage calls the model. The feedback gate is the only one that doesn't.
    pub fn calls_model(self) -> bool {
        !matches!(self, Stage::Feedback)
    }

    /// The run phase reached once this stage completes.
    pub fn completes(self) -> RunPhase {
        match self {
            Stage::Extract => RunPhase::Extracted,
            Stage::TopicGeneration => RunPhase::TopicsGenerated,
            Stage::TopicCategorization => RunPhase::TopicsCategorized,
            Stage::StyleDiversification => RunPhase::StylesDiversified,
            Stage::Feedback => RunPhase::FeedbackCollected,
            Stage::Interlinking => RunPhase::Interlinked,
            Stage::Compilation => RunPhase::Compiled,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Straight-line run phases. `Compiled` is the only successful terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Seeded,
    Extracted,
    TopicsGenerated,
    TopicsCategorized,
    StylesDiversified,
    FeedbackCollected,
    Interlinked,
    Compiled,
    Failed,
}

// ────────────────────────────────────────────────────────────────────────────
// Settings and run report
// ────────────────────────────────────────────────────────────────────────────

/// Sizes requested from the model and how strictly they are enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub broader_topics: usize,
    pub subtopics_per_topic: usize,
    pub question_styles: usize,
    pub max_topic_pairs: usize,
    pub questions: usize,
    /// When false, count mismatches are logged instead of failing the run.
    pub strict_counts: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            broader_topics: 2,
            subtopics_per_topic: 20,
            question_styles: 15,
            max_topic_pairs: 10,
            questions: 10,
            strict_counts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: u64,
}

/// Timing summary for one successful run. Logged, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phase: RunPhase,
    pub stages: Vec<StageTiming>,
}

#[derive(Debug)]
pub struct CompletedRun {
    pub state: PipelineState,
    pub report: RunReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Driver
// ────────────────────────────────────────────────────────────────────────────

/// The pipeline driver. Collaborators are injected so tests can script both
/// the model and the operator.
pub struct Pipeline {
    llm: Arc<dyn LanguageModel>,
    operator: Arc<dyn DecisionSource>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        operator: Arc<dyn DecisionSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm,
            operator,
            settings,
        }
    }

    /// Runs every stage in order and returns the final state.
    /// The binary uses `run_with_report` so it can log stage timings.
    #[allow(dead_code)]
    pub async fn run(&self, initial: PipelineState) -> Result<PipelineState, PipelineError> {
        self.run_with_report(initial).await.map(|run| run.state)
    }

    /// Runs every stage in order, returning the final state and per-stage timings.
    pub async fn run_with_report(&self, initial: PipelineState) -> Result<CompletedRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.execute(run_id, initial).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, initial: PipelineState) -> Result<CompletedRun, PipelineError> {
        let started_at = Utc::now();
        let mut phase = RunPhase::Seeded;
        let mut timings = Vec::with_capacity(Stage::ORDER.len());
        let mut state = initial;

        info!("Pipeline started with {} seed key(s)", state.len());

        for stage in Stage::ORDER {
            let started = Instant::now();
            info!("Stage '{stage}' starting (phase {phase:?})");
            if !stage.calls_model() {
                info!("Stage '{stage}' waits for operator input");
            }

            state = match self.run_stage(stage, state).await {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Stage '{stage}' failed [{}]; run is {:?}", e.code(), RunPhase::Failed);
                    return Err(e);
                }
            };

            debug_assert!(stage.produces().iter().all(|key| state.contains(key)));

            let elapsed_ms = started.elapsed().as_millis() as u64;
            phase = stage.completes();
            info!("Stage '{stage}' completed in {elapsed_ms}ms → {phase:?}");
            timings.push(StageTiming { stage, elapsed_ms });
        }

        Ok(CompletedRun {
            state,
            report: RunReport {
                run_id,
                started_at,
                finished_at: Utc::now(),
                phase,
                stages: timings,
            },
        })
    }

    async fn run_stage(&self, stage: Stage, state: PipelineState) -> Result<PipelineState, PipelineError> {
        // Checked here so a missing key never reaches the model.
        if let Some(&key) = stage.requires().iter().find(|key| !state.contains(key)) {
            return Err(PipelineError::MissingInput { stage, key });
        }

        let llm = self.llm.as_ref();
        let settings = &self.settings;

        match stage {
            Stage::Extract => extract::extract_responsibilities(state, llm).await,
            Stage::TopicGeneration => topics::generate_topics(state, llm, settings).await,
            Stage::TopicCategorization => categorize::categorize_topics(state, llm).await,
            Stage::StyleDiversification => styles::diversify_styles(state, llm, settings).await,
            Stage::Feedback => feedback::collect_style_feedback(state, self.operator.as_ref()),
            Stage::Interlinking => interlink::interlink_topics(state, llm, settings).await,
            Stage::Compilation => compile::compile_assessment(state, llm, settings).await,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

mod assessment;
mod config;
mod errors;
mod llm_client;
mod pipeline;
mod sample;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assessment::feedback::{DecisionSource, ScriptedOperator, TerminalOperator};
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::Pipeline;
use crate::sample::SAMPLE_JOB_DESCRIPTION;
use crate::state::PipelineState;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging. stdout is reserved for the final state.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting assessor v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let operator: Arc<dyn DecisionSource> = match &config.feedback_answers {
        Some(answers) => {
            info!("Using {} scripted feedback answers", answers.len());
            Arc::new(ScriptedOperator::new(answers.clone()))
        }
        None => Arc::new(TerminalOperator),
    };

    let job_description = config
        .job_description
        .clone()
        .unwrap_or_else(|| SAMPLE_JOB_DESCRIPTION.trim().to_string());

    let pipeline = Pipeline::new(Arc::new(llm), operator, config.pipeline.clone());

    let run = match pipeline
        .run_with_report(PipelineState::seeded(job_description))
        .await
    {
        Ok(run) => run,
        Err(e) => {
            error!("Assessment run failed [{}]", e.code());
            return Err(e.into());
        }
    };

    info!(
        "Run {} finished in {}ms: {}",
        run.report.run_id,
        (run.report.finished_at - run.report.started_at).num_milliseconds(),
        serde_json::to_string(&run.report.stages)?
    );

    info!(
        "Final state keys: {}",
        run.state.keys().collect::<Vec<_>>().join(", ")
    );

    println!("{}", serde_json::to_string_pretty(&run.state.into_value())?);

    Ok(())
}

//! Extract — free-text summary of responsibilities and skills from the raw job description.

use tracing::info;

use crate::assessment::complete_text;
use crate::assessment::prompts::EXTRACT_PROMPT_TEMPLATE;
use crate::errors::PipelineError;
use crate::llm_client::prompts::ANALYST_SYSTEM;
use crate::llm_client::LanguageModel;
use crate::pipeline::Stage;
use crate::state::{PipelineState, JOB_DESCRIPTION, KEY_RESPONSIBILITIES};

const STAGE: Stage = Stage::Extract;

pub async fn extract_responsibilities(
    state: PipelineState,
    llm: &dyn LanguageModel,
) -> Result<PipelineState, PipelineError> {
    let job_description = state.require_text(STAGE, JOB_DESCRIPTION)?;
    let prompt = EXTRACT_PROMPT_TEMPLATE.replace("{job_description}", &job_description);

    let summary = complete_text(llm, STAGE, &prompt, ANALYST_SYSTEM).await?;
    info!("Extracted responsibilities summary ({} chars)", summary.len());

    Ok(state.with_text(KEY_RESPONSIBILITIES, summary))
}

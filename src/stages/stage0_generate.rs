use tracing::info;

use crate::error::GenerationError;
use crate::llm::{
    RAW_HTML_SYSTEM_PROMPT, TextGenerator, analysis_system_prompt, build_analysis_prompt,
    build_raw_html_prompt,
};
use crate::models::{AnalysisRequest, RawGenerationResult};

/// Ask the generation service for a structured analysis of the requested company.
///
/// Called once per run; failures are returned as-is.
pub async fn generate_analysis<G: TextGenerator>(
    generator: &G,
    request: &AnalysisRequest,
) -> Result<RawGenerationResult, GenerationError> {
    let framework = request.framework();
    let prompt = build_analysis_prompt(request.company(), framework);

    info!(
        company = request.company(),
        "Requesting {} from generation service", framework
    );

    let text = generator
        .generate(analysis_system_prompt(framework), &prompt)
        .await?;

    info!("Received {} bytes of analysis text", text.len());
    Ok(RawGenerationResult::new(text))
}

/// Ask the generation service to write a complete slide, using the template as a sample
pub async fn generate_raw_html<G: TextGenerator>(
    generator: &G,
    request: &AnalysisRequest,
    sample_html: &str,
) -> Result<RawGenerationResult, GenerationError> {
    let prompt = build_raw_html_prompt(request.company(), request.framework(), sample_html);
    let text = generator.generate(RAW_HTML_SYSTEM_PROMPT, &prompt).await?;
    Ok(RawGenerationResult::new(text))
}

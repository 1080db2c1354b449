use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};

use crate::error::{NormalizeError, PipelineError, RenderError};
use crate::llm::TextGenerator;
use crate::models::{
    AnalysisRequest, PipelineState, RunReport, SlideDocument, StructuredAnalysis,
    TemplateSpec,
};
use crate::stages::{
    SlideHeader, generate_analysis, generate_raw_html, normalize, render, strip_code_fence,
    summarize,
};

/// Configuration for the document pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Generate a strategic summary header for frameworks that support it
    pub generate_summary: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generate_summary: true,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub analysis: StructuredAnalysis,
    pub header: Option<SlideHeader>,
    pub document: SlideDocument,
}

/// Orchestrates one request from generation to rendered slide.
///
/// The template is shared read-only; each run owns its own request,
/// analysis and document. Nothing is retried.
pub struct DocumentPipeline<G> {
    generator: G,
    template: Arc<TemplateSpec>,
    config: PipelineConfig,
}

impl<G: TextGenerator> DocumentPipeline<G> {
    pub fn new(generator: G, template: Arc<TemplateSpec>, config: PipelineConfig) -> Self {
        Self {
            generator,
            template,
            config,
        }
    }

    /// Run the pipeline, recording visited states into `report`
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        report: &mut RunReport,
    ) -> Result<PipelineOutput, PipelineError> {
        let span = info_span!(
            "pipeline",
            run_id = %report.run_id,
            company = request.company(),
            framework = %request.framework()
        );

        let result = self.execute(request, report).instrument(span).await;
        match &result {
            Ok(_) => report.enter(PipelineState::Done),
            Err(e) => {
                warn!(run_id = %report.run_id, "Pipeline failed: {}", e);
                report.enter(PipelineState::Failed);
            }
        }
        result
    }

    async fn execute(
        &self,
        request: &AnalysisRequest,
        report: &mut RunReport,
    ) -> Result<PipelineOutput, PipelineError> {
        self.check_framework(request)?;

        // Generating
        report.enter(PipelineState::Generating);
        let raw = generate_analysis(&self.generator, request).await?;

        // Normalizing
        report.enter(PipelineState::Normalizing);
        let analysis = normalize(&raw.text, request.framework())
            .map_err(|source| normalize_failure(source, raw.text))?;
        report.section_counts = analysis.item_counts();
        info!("Normalized analysis: {:?}", report.section_counts);

        // Summarizing
        let header = if self.config.generate_summary && request.framework().supports_summary() {
            report.enter(PipelineState::Summarizing);
            Some(summarize(&self.generator, request.company(), &analysis).await)
        } else {
            None
        };
        if let Some(header) = &header {
            report.header = Some(header.text.clone());
            report.header_source = header.source;
        }

        // Rendering
        report.enter(PipelineState::Rendering);
        let document = render(
            &self.template,
            &analysis,
            header.as_ref().map(|h| h.text.as_str()),
        )?;

        info!("Rendered slide ({} bytes)", document.html().len());

        Ok(PipelineOutput {
            analysis,
            header,
            document,
        })
    }

    /// Degraded mode: let the generation service write the whole slide.
    ///
    /// The template is only used as a sample; the reply is fence-stripped and
    /// checked for emptiness but otherwise not validated.
    pub async fn run_raw_html(
        &self,
        request: &AnalysisRequest,
        report: &mut RunReport,
    ) -> Result<SlideDocument, PipelineError> {
        report.degraded = true;
        warn!("Raw HTML mode: generated slide is not validated against the template");

        let result = self.execute_raw_html(request, report).await;
        match &result {
            Ok(_) => report.enter(PipelineState::Done),
            Err(_) => report.enter(PipelineState::Failed),
        }
        result
    }

    async fn execute_raw_html(
        &self,
        request: &AnalysisRequest,
        report: &mut RunReport,
    ) -> Result<SlideDocument, PipelineError> {
        self.check_framework(request)?;

        report.enter(PipelineState::Generating);
        let raw = generate_raw_html(&self.generator, request, self.template.html()).await?;

        report.enter(PipelineState::Normalizing);
        let html = strip_code_fence(&raw.text);
        if html.is_empty() {
            return Err(normalize_failure(NormalizeError::EmptyResponse, raw.text));
        }
        Ok(SlideDocument::new(html.to_string()))
    }

    fn check_framework(&self, request: &AnalysisRequest) -> Result<(), PipelineError> {
        if request.framework() != self.template.framework() {
            return Err(RenderError::FrameworkMismatch {
                template: self.template.framework(),
                analysis: request.framework(),
            }
            .into());
        }
        Ok(())
    }
}

fn normalize_failure(source: NormalizeError, raw: String) -> PipelineError {
    warn!("Could not normalize generation output: {}", source);
    warn!("Raw generation output:\n{}", raw);
    PipelineError::Normalize { source, raw }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert!(config.generate_summary);
    }
}

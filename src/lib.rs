pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::{
    GenerationError, NormalizeError, PdfExportError, PipelineError, RegionProblem, RenderError,
    RequestError,
};
pub use io::{
    AnalysisSummary, CommandPdfExporter, PdfExporter, default_output_paths, load_analysis,
    load_template, publish, write_pdf, write_preview,
};
pub use llm::{LlmClient, LlmConfig, Provider, TextGenerator};
pub use models::{
    AnalysisRequest, Framework, HeaderSource, PipelineState, RawGenerationResult, RunReport,
    SlideDocument, StructuredAnalysis, TemplateSpec,
};
pub use pipeline::{DocumentPipeline, PipelineConfig, PipelineOutput};
pub use stages::{fallback_header, normalize, render, strip_code_fence};

use std::fmt;

use thiserror::Error;

use crate::models::Framework;

/// Invalid user input for a new request
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("company name must not be empty")]
    EmptyCompany,
}

/// Failure turning raw generation text into a structured analysis
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("generation service returned an empty response")]
    EmptyResponse,

    #[error("response is not valid JSON: {reason}")]
    MalformedData { text: String, reason: String },

    #[error("response is missing sections: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("section '{key}' is invalid: {reason}")]
    InvalidSection { key: String, reason: String },
}

/// What is wrong with a template region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionProblem {
    Missing,
    Duplicated,
    Misordered,
    Overlapping,
}

impl fmt::Display for RegionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionProblem::Missing => f.write_str("marker not found"),
            RegionProblem::Duplicated => f.write_str("marker appears more than once"),
            RegionProblem::Misordered => f.write_str("closing marker precedes opening marker"),
            RegionProblem::Overlapping => f.write_str("region overlaps another region"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template region '{region}': {problem}")]
    TemplateMismatch {
        region: String,
        problem: RegionProblem,
    },

    #[error("{template} template cannot render a {analysis}")]
    FrameworkMismatch {
        template: Framework,
        analysis: Framework,
    },
}

/// Failure talking to the text-generation service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to {provider} failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error: {status} - {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no text content in {0} response")]
    NoContent(&'static str),

    #[error("generation failed: {0}")]
    Other(String),
}

/// Failure converting HTML to PDF
#[derive(Debug, Error)]
pub enum PdfExportError {
    #[error("failed to run PDF converter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("PDF converter produced no output")]
    EmptyOutput,
}

/// Terminal failure of a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Carries the raw generation text for diagnostics
    #[error("{source}")]
    Normalize {
        #[source]
        source: NormalizeError,
        raw: String,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Raw generation text behind a normalization failure
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            PipelineError::Normalize { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_keys() {
        let err = NormalizeError::Schema {
            missing: vec!["price".to_string(), "place".to_string()],
        };
        assert_eq!(err.to_string(), "response is missing sections: price, place");
    }

    #[test]
    fn test_template_mismatch_message() {
        let err = RenderError::TemplateMismatch {
            region: "product".to_string(),
            problem: RegionProblem::Missing,
        };
        assert_eq!(err.to_string(), "template region 'product': marker not found");
    }

    #[test]
    fn test_pipeline_error_exposes_raw_text() {
        let err = PipelineError::Normalize {
            source: NormalizeError::EmptyResponse,
            raw: "```\n```".to_string(),
        };
        assert_eq!(err.raw_text(), Some("```\n```"));
        assert!(PipelineError::Generation(GenerationError::NoContent("OpenAI")).raw_text().is_none());
    }
}

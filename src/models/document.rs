use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Framework;

/// Fully rendered slide, ready for PDF export and preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDocument {
    html: String,
}

impl SlideDocument {
    pub fn new(html: String) -> Self {
        Self { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// States of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Generating,
    Normalizing,
    Summarizing,
    Rendering,
    Done,
    Failed,
}

/// Where the slide header came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSource {
    /// Template default left in place
    Template,
    /// Generated strategic summary
    Summary,
    /// Deterministic header used after a failed summary
    Fallback,
}

/// Machine-readable record of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub company: String,
    pub framework: Framework,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// States in the order they were entered
    pub states: Vec<PipelineState>,
    pub header: Option<String>,
    pub header_source: HeaderSource,
    pub section_counts: BTreeMap<String, usize>,
    /// Set by the caller once PDF export has been attempted
    pub pdf_exported: Option<bool>,
    /// Raw HTML mode skips validation entirely
    pub degraded: bool,
}

impl RunReport {
    pub fn start(company: &str, framework: Framework) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            company: company.to_string(),
            framework,
            started_at: Utc::now(),
            finished_at: None,
            states: vec![PipelineState::Idle],
            header: None,
            header_source: HeaderSource::Template,
            section_counts: BTreeMap::new(),
            pdf_exported: None,
            degraded: false,
        }
    }

    pub fn enter(&mut self, state: PipelineState) {
        self.states.push(state);
        if matches!(state, PipelineState::Done | PipelineState::Failed) {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn current_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_starts_idle() {
        let report = RunReport::start("Acme", Framework::FourP);
        assert_eq!(report.current_state(), PipelineState::Idle);
        assert!(report.finished_at.is_none());
    }

    #[test]
    fn test_terminal_state_sets_finish_time() {
        let mut report = RunReport::start("Acme", Framework::FourP);
        report.enter(PipelineState::Generating);
        assert!(report.finished_at.is_none());
        report.enter(PipelineState::Failed);
        assert!(report.finished_at.is_some());
        assert_eq!(report.current_state(), PipelineState::Failed);
    }

    #[test]
    fn test_report_serializes_states_snake_case() {
        let mut report = RunReport::start("Acme", Framework::FiveForces);
        report.enter(PipelineState::Generating);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["states"], serde_json::json!(["idle", "generating"]));
        assert_eq!(json["framework"], "five_forces");
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{Framework, StructuredAnalysis, TemplateSpec};
use crate::stages::normalize;

/// Load a template from disk, or the built-in one, and validate its regions.
///
/// Fails if any required region is missing or duplicated.
pub fn load_template(path: Option<&Path>, framework: Framework) -> Result<TemplateSpec> {
    let template = match path {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;
            info!("Loaded template from {:?}", path);
            TemplateSpec::new(html, framework)
        }
        None => TemplateSpec::builtin(framework),
    };

    let problems = template.check();
    if !problems.is_empty() {
        let details: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
        anyhow::bail!(
            "Template does not match the {} layout:\n  {}",
            framework,
            details.join("\n  ")
        );
    }

    Ok(template)
}

/// Load a previously saved analysis (JSON, optionally code-fenced)
pub fn load_analysis(path: &Path, framework: Framework) -> Result<StructuredAnalysis> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    normalize(&content, framework).with_context(|| format!("Invalid analysis in {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_builtin_template() {
        let template = load_template(None, Framework::FiveForces).unwrap();
        assert_eq!(template.framework(), Framework::FiveForces);
    }

    #[test]
    fn test_load_template_rejects_drift() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html><!-- slide:header -->x<!-- /slide:header --></html>").unwrap();

        let err = load_template(Some(file.path()), Framework::FourP).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("product"));
        assert!(message.contains("promotion"));
    }

    #[test]
    fn test_load_analysis_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "```json\n{{\"product\": [\"A\"], \"price\": [\"B\"], \"place\": [\"C\"], \"promotion\": [\"D\"]}}\n```"
        )
        .unwrap();

        let analysis = load_analysis(file.path(), Framework::FourP).unwrap();
        assert_eq!(analysis.section("place").unwrap(), &["C".to_string()]);
    }

    #[test]
    fn test_load_analysis_missing_file() {
        assert!(load_analysis(Path::new("/nonexistent/analysis.json"), Framework::FourP).is_err());
    }
}

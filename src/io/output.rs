use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::PdfExportError;
use crate::models::{Framework, SlideDocument, StructuredAnalysis};

/// HTML-to-PDF converter
pub trait PdfExporter {
    fn export(&self, html: &str) -> impl Future<Output = Result<Vec<u8>, PdfExportError>> + Send;
}

/// Runs an external converter that reads HTML on stdin and writes PDF to stdout
#[derive(Debug, Clone)]
pub struct CommandPdfExporter {
    program: String,
    args: Vec<String>,
}

impl Default for CommandPdfExporter {
    /// `weasyprint - -`
    fn default() -> Self {
        Self::new("weasyprint", vec!["-".to_string(), "-".to_string()])
    }
}

impl CommandPdfExporter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a command line such as `wkhtmltopdf --quiet - -`
    pub fn from_command_line(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl PdfExporter for CommandPdfExporter {
    async fn export(&self, html: &str) -> Result<Vec<u8>, PdfExportError> {
        let spawn_error = |source| PdfExportError::Spawn {
            program: self.program.clone(),
            source,
        };

        debug!("Running PDF converter: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        // Feed stdin while collecting stdout so large documents cannot fill the pipe
        let stdin = child.stdin.take();
        let input = html.as_bytes().to_vec();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&input).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(spawn_error)?;

        if !output.status.success() {
            return Err(PdfExportError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed.map_err(spawn_error)?;
        if output.stdout.is_empty() {
            return Err(PdfExportError::EmptyOutput);
        }

        info!("PDF converter produced {} bytes", output.stdout.len());
        Ok(output.stdout)
    }
}

/// File-system-safe stem such as `Acme_Corp_4P_analysis`
pub fn output_stem(company: &str, framework: Framework) -> String {
    let safe: String = company
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Collapse runs of underscores
    let mut collapsed = String::with_capacity(safe.len());
    for c in safe.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    let collapsed = collapsed.trim_matches('_');

    let name = if collapsed.is_empty() { "slide" } else { collapsed };
    format!("{}_{}", name, framework.file_tag())
}

/// Default PDF and preview paths for a company
pub fn default_output_paths(company: &str, framework: Framework) -> (PathBuf, PathBuf) {
    let stem = output_stem(company, framework);
    (
        PathBuf::from(format!("{}.pdf", stem)),
        PathBuf::from(format!("{}.html", stem)),
    )
}

/// Write the slide HTML for previewing in a browser
pub fn write_preview(document: &SlideDocument, path: &Path) -> Result<()> {
    std::fs::write(path, document.html())
        .with_context(|| format!("Failed to write preview: {:?}", path))
}

pub fn write_pdf(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write PDF: {:?}", path))
}

/// Write the preview, then try PDF export when `pdf_path` is set.
///
/// Export failure is only a warning. Returns whether a PDF was written.
pub async fn publish<E: PdfExporter>(
    document: &SlideDocument,
    preview_path: &Path,
    pdf_path: Option<&Path>,
    exporter: &E,
) -> Result<bool> {
    write_preview(document, preview_path)?;
    info!("Preview written to {:?}", preview_path);

    let Some(pdf_path) = pdf_path else {
        return Ok(false);
    };

    match exporter.export(document.html()).await {
        Ok(bytes) => {
            write_pdf(&bytes, pdf_path)?;
            info!("PDF written to {:?}", pdf_path);
            Ok(true)
        }
        Err(e) => {
            warn!("PDF export failed, preview is still available: {}", e);
            Ok(false)
        }
    }
}

/// Plain-text view of an analysis for the terminal
pub struct AnalysisSummary<'a> {
    company: &'a str,
    analysis: &'a StructuredAnalysis,
    header: Option<&'a str>,
}

impl<'a> AnalysisSummary<'a> {
    pub fn new(company: &'a str, analysis: &'a StructuredAnalysis, header: Option<&'a str>) -> Self {
        Self {
            company,
            analysis,
            header,
        }
    }

    pub fn format(&self) -> String {
        let framework = self.analysis.framework();
        let title = format!("{}: {}", self.company, framework.title());

        let mut output = String::new();
        output.push_str(&title);
        output.push('\n');
        output.push_str(&"=".repeat(title.chars().count()));
        output.push_str("\n\n");

        if let Some(header) = self.header {
            output.push_str("Strategic summary:\n");
            output.push_str(&wrap_text(header, 78));
            output.push_str("\n\n");
        }

        for (key, items) in self.analysis.iter() {
            let label = framework.section(key).map(|s| s.label).unwrap_or(key);
            output.push_str(label);
            output.push('\n');
            for item in items {
                let wrapped = wrap_text(item, 76);
                for (i, line) in wrapped.lines().enumerate() {
                    output.push_str(if i == 0 { "  • " } else { "    " });
                    output.push_str(line);
                    output.push('\n');
                }
            }
            output.push('\n');
        }

        output
    }
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::normalize;

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem("Acme", Framework::FourP), "Acme_4P_analysis");
        assert_eq!(
            output_stem(" Acme Corp / Ltd. ", Framework::FiveForces),
            "Acme_Corp_Ltd_five_forces_analysis"
        );
        assert_eq!(output_stem("///", Framework::FourP), "slide_4P_analysis");
    }

    #[test]
    fn test_default_output_paths() {
        let (pdf, html) = default_output_paths("Acme", Framework::FourP);
        assert_eq!(pdf, PathBuf::from("Acme_4P_analysis.pdf"));
        assert_eq!(html, PathBuf::from("Acme_4P_analysis.html"));
    }

    #[test]
    fn test_write_preview() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slide.html");
        write_preview(&SlideDocument::new("<html></html>".to_string()), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_analysis_summary_format() {
        let analysis = normalize(
            r#"{"product": ["Widget A"], "price": ["Low cost"], "place": ["Online"], "promotion": ["Social media"]}"#,
            Framework::FourP,
        )
        .unwrap();
        let text = AnalysisSummary::new("Acme", &analysis, Some("Acme wins on cost.")).format();

        assert!(text.starts_with("Acme: 4P Analysis\n=================\n"));
        assert!(text.contains("Strategic summary:\nAcme wins on cost.\n"));
        assert!(text.contains("Price\n  • Low cost\n"));
    }

    #[test]
    fn test_wrap_text() {
        let text = "This is a test of the text wrapping function that should wrap at 20 chars";
        let wrapped = wrap_text(text, 20);
        for line in wrapped.lines() {
            assert!(line.len() <= 25); // Allow some slack for long words
        }
    }

    #[test]
    fn test_command_line_parsing() {
        assert!(CommandPdfExporter::from_command_line(&[]).is_none());
        let exporter = CommandPdfExporter::from_command_line(&[
            "wkhtmltopdf".to_string(),
            "-".to_string(),
            "-".to_string(),
        ])
        .unwrap();
        assert_eq!(exporter.program, "wkhtmltopdf");
        assert_eq!(exporter.args.len(), 2);
    }

    /// Exporter returning a fixed result
    struct FixedExporter(Option<Vec<u8>>);

    impl PdfExporter for FixedExporter {
        async fn export(&self, _html: &str) -> Result<Vec<u8>, PdfExportError> {
            self.0.clone().ok_or(PdfExportError::EmptyOutput)
        }
    }

    #[tokio::test]
    async fn test_publish_keeps_preview_when_export_fails() {
        let dir = tempfile::tempdir().unwrap();
        let preview = dir.path().join("slide.html");
        let pdf = dir.path().join("slide.pdf");
        let document = SlideDocument::new("<html>slide</html>".to_string());

        let exporter = FixedExporter(None);

        let exported = publish(&document, &preview, Some(pdf.as_path()), &exporter)
            .await
            .unwrap();

        assert!(!exported);
        assert_eq!(std::fs::read_to_string(&preview).unwrap(), "<html>slide</html>");
        assert!(!pdf.exists());
    }

    #[tokio::test]
    async fn test_publish_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let preview = dir.path().join("slide.html");
        let pdf = dir.path().join("slide.pdf");
        let document = SlideDocument::new("<html>slide</html>".to_string());
        let exporter = FixedExporter(Some(b"%PDF-1.7".to_vec()));

        let exported = publish(&document, &preview, Some(pdf.as_path()), &exporter)
            .await
            .unwrap();

        assert!(exported);
        assert!(preview.exists());
        assert_eq!(std::fs::read(&pdf).unwrap(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_publish_without_pdf_path_skips_export() {
        let dir = tempfile::tempdir().unwrap();
        let preview = dir.path().join("slide.html");
        let document = SlideDocument::new("<html></html>".to_string());
        let exporter = FixedExporter(Some(b"%PDF".to_vec()));

        assert!(!publish(&document, &preview, None, &exporter).await.unwrap());
        assert!(preview.exists());
    }

    #[tokio::test]
    async fn test_missing_converter_is_spawn_error() {
        let exporter = CommandPdfExporter::new("slidewright-no-such-converter", vec![]);
        let err = exporter.export("<html></html>").await.unwrap_err();
        assert!(matches!(err, PdfExportError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_is_returned() {
        // `cat` echoes the HTML back, standing in for a converter
        let exporter = CommandPdfExporter::new("cat", vec![]);
        let bytes = exporter.export("<html>x</html>").await.unwrap();
        assert_eq!(bytes, b"<html>x</html>");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_reported() {
        let exporter = CommandPdfExporter::new(
            "sh",
            vec!["-c".to_string(), "cat > /dev/null; exit 3".to_string()],
        );
        assert!(matches!(
            exporter.export("<html></html>").await,
            Err(PdfExportError::Failed { .. })
        ));
    }
}

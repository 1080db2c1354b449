use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use slidewright::{
    AnalysisRequest, AnalysisSummary, CommandPdfExporter, DocumentPipeline, Framework, LlmClient,
    LlmConfig, PipelineConfig, Provider, RunReport, SlideDocument, default_output_paths,
    load_analysis, load_template, publish, render,
};

#[derive(Parser)]
#[command(name = "slidewright")]
#[command(author, version, about = "Generate strategy analysis slides with an LLM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an analysis slide for a company
    Generate {
        /// Company to analyze
        #[arg(short, long)]
        company: String,

        /// Analysis framework
        #[arg(short, long, value_enum, default_value = "four-p")]
        framework: Framework,

        /// Generation service
        #[arg(long, value_enum, default_value = "openai")]
        provider: Provider,

        /// Model name (defaults to the provider's default)
        #[arg(long)]
        model: Option<String>,

        /// HTML template with slide regions (defaults to the built-in template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Output PDF file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output HTML preview file
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Keep the template header instead of generating a strategic summary
        #[arg(long)]
        no_summary: bool,

        /// Let the model write the whole slide (no validation)
        #[arg(long)]
        raw_html: bool,

        /// Skip PDF export and only write the preview
        #[arg(long)]
        no_pdf: bool,

        /// HTML-to-PDF command reading stdin and writing stdout
        #[arg(long, num_args = 1.., value_delimiter = ' ', default_value = "weasyprint - -")]
        pdf_command: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render a saved analysis JSON file without calling the generation service
    Render {
        /// Analysis JSON file
        #[arg(short, long)]
        analysis: PathBuf,

        /// Company the analysis is about
        #[arg(short, long)]
        company: String,

        /// Analysis framework
        #[arg(short, long, value_enum, default_value = "four-p")]
        framework: Framework,

        /// HTML template with slide regions
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Replace the template header with this text
        #[arg(long)]
        header: Option<String>,

        /// Output PDF file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output HTML preview file
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Skip PDF export and only write the preview
        #[arg(long)]
        no_pdf: bool,

        /// HTML-to-PDF command reading stdin and writing stdout
        #[arg(long, num_args = 1.., value_delimiter = ' ', default_value = "weasyprint - -")]
        pdf_command: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check that a template defines every slide region
    CheckTemplate {
        /// Analysis framework
        #[arg(short, long, value_enum, default_value = "four-p")]
        framework: Framework,

        /// Template file (defaults to the built-in template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Where finished slides go
struct OutputTargets {
    pdf: Option<PathBuf>,
    preview: PathBuf,
    exporter: CommandPdfExporter,
}

impl OutputTargets {
    fn new(
        company: &str,
        framework: Framework,
        output: Option<PathBuf>,
        preview: Option<PathBuf>,
        no_pdf: bool,
        pdf_command: &[String],
    ) -> Self {
        let (default_pdf, default_preview) = default_output_paths(company, framework);
        Self {
            pdf: if no_pdf {
                None
            } else {
                Some(output.unwrap_or(default_pdf))
            },
            preview: preview.unwrap_or(default_preview),
            exporter: CommandPdfExporter::from_command_line(pdf_command).unwrap_or_default(),
        }
    }

    async fn publish(&self, document: &SlideDocument) -> Result<bool> {
        publish(document, &self.preview, self.pdf.as_deref(), &self.exporter).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            company,
            framework,
            provider,
            model,
            template,
            output,
            preview,
            report,
            no_summary,
            raw_html,
            no_pdf,
            pdf_command,
            verbose,
        } => {
            setup_logging(verbose);
            let targets =
                OutputTargets::new(&company, framework, output, preview, no_pdf, &pdf_command);
            generate_slide(
                &company,
                framework,
                provider,
                model,
                template.as_deref(),
                targets,
                report.as_deref(),
                !no_summary,
                raw_html,
            )
            .await
        }
        Commands::Render {
            analysis,
            company,
            framework,
            template,
            header,
            output,
            preview,
            no_pdf,
            pdf_command,
            verbose,
        } => {
            setup_logging(verbose);
            let targets =
                OutputTargets::new(&company, framework, output, preview, no_pdf, &pdf_command);
            // A blank header keeps the template default
            let header = header.filter(|h| !h.trim().is_empty());
            render_saved_analysis(
                &analysis,
                &company,
                framework,
                template.as_deref(),
                header.as_deref(),
                targets,
            )
            .await
        }
        Commands::CheckTemplate {
            framework,
            template,
            verbose,
        } => {
            setup_logging(verbose);
            check_template(framework, template.as_deref())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,slidewright={}", level.as_str().to_lowercase()))
    });
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[allow(clippy::too_many_arguments)]
async fn generate_slide(
    company: &str,
    framework: Framework,
    provider: Provider,
    model: Option<String>,
    template: Option<&Path>,
    targets: OutputTargets,
    report_path: Option<&Path>,
    generate_summary: bool,
    raw_html: bool,
) -> Result<()> {
    let request = AnalysisRequest::new(company, framework)?;

    // Fail fast on configuration before any request is made
    let template = Arc::new(load_template(template, framework)?);
    let mut llm_config = LlmConfig::from_env(provider)?;
    if let Some(model) = model {
        llm_config = llm_config.with_model(model);
    }
    info!("Using {:?} model {}", provider, llm_config.model);

    let client = LlmClient::new(llm_config)?;
    let pipeline = DocumentPipeline::new(client, template, PipelineConfig { generate_summary });

    let mut report = RunReport::start(request.company(), framework);

    let document = if raw_html {
        pipeline.run_raw_html(&request, &mut report).await
    } else {
        pipeline.run(&request, &mut report).await.map(|output| {
            let header = output.header.as_ref().map(|h| h.text.as_str());
            print!(
                "{}",
                AnalysisSummary::new(request.company(), &output.analysis, header).format()
            );
            output.document
        })
    };

    let document = match document {
        Ok(document) => document,
        Err(e) => {
            if let Some(raw) = e.raw_text() {
                eprintln!("--- raw generation output ---\n{}\n-----------------------------", raw);
            }
            if let Some(path) = report_path {
                report.write_json(path)?;
            }
            return Err(e).context(format!("Slide generation failed for {}", request.company()));
        }
    };

    let exported = targets.publish(&document).await?;
    report.pdf_exported = Some(exported);

    if let Some(path) = report_path {
        report.write_json(path)?;
        info!("Run report written to {:?}", path);
    }

    info!(
        "Complete: run {} finished in state {:?}",
        report.run_id,
        report.current_state()
    );
    Ok(())
}

async fn render_saved_analysis(
    analysis_path: &Path,
    company: &str,
    framework: Framework,
    template: Option<&Path>,
    header: Option<&str>,
    targets: OutputTargets,
) -> Result<()> {
    let request = AnalysisRequest::new(company, framework)?;
    let template = load_template(template, framework)?;

    let analysis = load_analysis(analysis_path, framework)?;
    let document = render(&template, &analysis, header)?;

    print!(
        "{}",
        AnalysisSummary::new(request.company(), &analysis, header).format()
    );

    targets.publish(&document).await?;
    Ok(())
}

fn check_template(framework: Framework, template: Option<&Path>) -> Result<()> {
    let template = load_template(template, framework).context("Template check failed")?;
    println!("{}", template);
    println!("All {} regions found exactly once", template.required_regions().len());
    Ok(())
}

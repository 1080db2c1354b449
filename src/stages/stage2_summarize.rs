use tracing::{info, warn};

use crate::llm::{SUMMARY_MAX_CHARS, SUMMARY_SYSTEM_PROMPT, TextGenerator, build_summary_prompt};
use crate::models::{HeaderSource, StructuredAnalysis};

/// Header chosen for the slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideHeader {
    pub text: String,
    pub source: HeaderSource,
}

/// Deterministic header used when no summary could be generated
pub fn fallback_header(company: &str, analysis: &StructuredAnalysis) -> String {
    let framework = analysis.framework();
    let labels: Vec<&str> = framework.sections().iter().map(|s| s.label).collect();
    format!(
        "{}'s {} ({}) - Strategic business framework for market positioning and competitive advantage",
        company,
        framework.title(),
        labels.join(", ")
    )
}

/// Generate a one-line strategic summary for the slide header.
///
/// Never fails: any service error or empty reply falls back to
/// [`fallback_header`].
pub async fn summarize<G: TextGenerator>(
    generator: &G,
    company: &str,
    analysis: &StructuredAnalysis,
) -> SlideHeader {
    let prompt = build_summary_prompt(company, analysis);

    match generator.generate(SUMMARY_SYSTEM_PROMPT, &prompt).await {
        Ok(reply) => {
            let text = clean_summary(&reply);
            if text.is_empty() {
                warn!("Strategic summary was empty, using fallback header");
                return SlideHeader {
                    text: fallback_header(company, analysis),
                    source: HeaderSource::Fallback,
                };
            }
            if text.chars().count() > SUMMARY_MAX_CHARS {
                warn!(
                    "Strategic summary is {} characters (asked for at most {})",
                    text.chars().count(),
                    SUMMARY_MAX_CHARS
                );
            }
            info!("Strategic summary: {}", text);
            SlideHeader {
                text,
                source: HeaderSource::Summary,
            }
        }
        Err(e) => {
            warn!("Strategic summary generation failed: {}", e);
            SlideHeader {
                text: fallback_header(company, analysis),
                source: HeaderSource::Fallback,
            }
        }
    }
}

/// Trim whitespace and one pair of surrounding quotes
fn clean_summary(reply: &str) -> String {
    let trimmed = reply.trim();
    let unquoted = ['"', '\'', '“']
        .iter()
        .find_map(|&q| {
            let close = if q == '“' { '”' } else { q };
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(close))
        })
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

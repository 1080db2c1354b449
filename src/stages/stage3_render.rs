use std::ops::Range;

use tracing::debug;

use crate::error::{RegionProblem, RenderError};
use crate::models::{HEADER_REGION, SlideDocument, StructuredAnalysis, TemplateSpec};

/// Indentation of generated list items, matching the bundled templates
const ITEM_INDENT: &str = "                ";

/// Render an analysis into the template.
///
/// Each section region is replaced with one `<li>` per item, in order. The
/// header region is replaced verbatim, and only when `header_override` is
/// given. All regions are located before anything is written, so a template
/// mismatch never yields partial output.
pub fn render(
    template: &TemplateSpec,
    analysis: &StructuredAnalysis,
    header_override: Option<&str>,
) -> Result<SlideDocument, RenderError> {
    if analysis.framework() != template.framework() {
        return Err(RenderError::FrameworkMismatch {
            template: template.framework(),
            analysis: analysis.framework(),
        });
    }

    let html = template.html();
    let escape = !template.trusted_content();

    let mut replacements: Vec<(&str, Range<usize>, String)> = Vec::new();

    // Header region must exist even when left untouched
    let header_range = template.locate(HEADER_REGION)?;
    if let Some(header) = header_override {
        replacements.push((HEADER_REGION, header_range, prepare(header, escape)));
    }

    for key in template.framework().section_keys() {
        let range = template.locate(key)?;
        let items = analysis.section(key).unwrap_or_default();
        replacements.push((key, range, render_items(items, escape)));
    }

    replacements.sort_by_key(|(_, range, _)| range.start);

    let mut output = String::with_capacity(html.len());
    let mut cursor = 0;
    for (name, range, fragment) in replacements {
        if range.start < cursor {
            return Err(RenderError::TemplateMismatch {
                region: name.to_string(),
                problem: RegionProblem::Overlapping,
            });
        }
        output.push_str(&html[cursor..range.start]);
        output.push_str(&fragment);
        cursor = range.end;
    }
    output.push_str(&html[cursor..]);

    debug!(
        "Rendered {} sections into {} bytes of HTML",
        analysis.iter().count(),
        output.len()
    );

    Ok(SlideDocument::new(output))
}

/// List-item fragment for one section
fn render_items(items: &[String], escape: bool) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| format!("{}<li>{}</li>", ITEM_INDENT, prepare(item, escape)))
        .collect();
    format!("\n{}\n{}", lines.join("\n"), &ITEM_INDENT[4..])
}

fn prepare(text: &str, escape: bool) -> String {
    if escape {
        escape_html(text)
    } else {
        text.to_string()
    }
}

/// Escape text for inclusion in HTML element content or attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

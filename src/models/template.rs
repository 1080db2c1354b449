use std::fmt;
use std::ops::Range;

use crate::error::{RegionProblem, RenderError};
use crate::models::Framework;

/// Region holding the slide's title/subtitle text
pub const HEADER_REGION: &str = "header";

const FOUR_P_TEMPLATE: &str = include_str!("../../templates/four_p.html");
const FIVE_FORCES_TEMPLATE: &str = include_str!("../../templates/five_forces.html");

/// Opening marker of a named region
pub fn open_marker(name: &str) -> String {
    format!("<!-- slide:{} -->", name)
}

/// Closing marker of a named region
pub fn close_marker(name: &str) -> String {
    format!("<!-- /slide:{} -->", name)
}

/// HTML slide template with named placeholder regions.
///
/// A region is the text between `<!-- slide:NAME -->` and
/// `<!-- /slide:NAME -->`. The template must define a `header` region and one
/// region per section of its framework, each exactly once. Whatever sits
/// between the markers is the default content shown when nothing replaces it.
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    html: String,
    framework: Framework,
    trusted_content: bool,
}

impl TemplateSpec {
    pub fn new(html: impl Into<String>, framework: Framework) -> Self {
        Self {
            html: html.into(),
            framework,
            trusted_content: false,
        }
    }

    /// Template compiled into the binary for a framework
    pub fn builtin(framework: Framework) -> Self {
        let html = match framework {
            Framework::FourP => FOUR_P_TEMPLATE,
            Framework::FiveForces => FIVE_FORCES_TEMPLATE,
        };
        Self::new(html, framework)
    }

    /// Insert generated text without HTML escaping
    pub fn with_trusted_content(mut self, trusted: bool) -> Self {
        self.trusted_content = trusted;
        self
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    pub fn trusted_content(&self) -> bool {
        self.trusted_content
    }

    /// Every region the template must define, header first
    pub fn required_regions(&self) -> Vec<&'static str> {
        std::iter::once(HEADER_REGION)
            .chain(self.framework.section_keys())
            .collect()
    }

    /// Byte range of a region's content, between its markers
    pub fn locate(&self, name: &str) -> Result<Range<usize>, RenderError> {
        let open = open_marker(name);
        let close = close_marker(name);
        let mismatch = |problem| RenderError::TemplateMismatch {
            region: name.to_string(),
            problem,
        };

        let open_at = single_match(&self.html, &open).map_err(mismatch)?;
        let close_at = single_match(&self.html, &close).map_err(mismatch)?;

        let content_start = open_at + open.len();
        if close_at < content_start {
            return Err(mismatch(RegionProblem::Misordered));
        }
        Ok(content_start..close_at)
    }

    /// Default content of a region
    pub fn region_content(&self, name: &str) -> Result<&str, RenderError> {
        let range = self.locate(name)?;
        Ok(&self.html[range])
    }

    /// Check every required region, reporting all problems at once
    pub fn check(&self) -> Vec<RenderError> {
        self.required_regions()
            .into_iter()
            .filter_map(|name| self.locate(name).err())
            .collect()
    }
}

fn single_match(haystack: &str, marker: &str) -> Result<usize, RegionProblem> {
    let mut matches = haystack.match_indices(marker).map(|(i, _)| i);
    match (matches.next(), matches.next()) {
        (None, _) => Err(RegionProblem::Missing),
        (Some(at), None) => Ok(at),
        (Some(_), Some(_)) => Err(RegionProblem::Duplicated),
    }
}

impl fmt::Display for TemplateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} template ({} bytes, regions: {})",
            self.framework,
            self.html.len(),
            self.required_regions().join(", ")
        )
    }
}

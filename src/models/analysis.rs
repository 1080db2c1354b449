use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::RequestError;
use crate::models::Framework;

/// A single user request for an analysis slide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    company: String,
    framework: Framework,
}

impl AnalysisRequest {
    /// Create a request, rejecting blank company names
    pub fn new(company: &str, framework: Framework) -> Result<Self, RequestError> {
        let company = company.trim();
        if company.is_empty() {
            return Err(RequestError::EmptyCompany);
        }
        Ok(Self {
            company: company.to_string(),
            framework,
        })
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }
}

/// Unprocessed text returned by the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGenerationResult {
    pub text: String,
}

impl RawGenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Validated analysis: every framework section maps to a non-empty list of
/// trimmed, non-empty bullet points.
///
/// Only the normalizer constructs this type, so holding one means the
/// invariant has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAnalysis {
    framework: Framework,
    sections: BTreeMap<&'static str, Vec<String>>,
}

impl StructuredAnalysis {
    pub(crate) fn from_validated(
        framework: Framework,
        sections: BTreeMap<&'static str, Vec<String>>,
    ) -> Self {
        debug_assert!(framework.section_keys().all(|k| sections.contains_key(k)));
        Self { framework, sections }
    }

    pub fn framework(&self) -> Framework {
        self.framework
    }

    /// Bullet points for a section, in generation order
    pub fn section(&self, key: &str) -> Option<&[String]> {
        self.sections.get(key).map(Vec::as_slice)
    }

    /// Sections in framework order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        self.framework
            .section_keys()
            .filter_map(|key| self.sections.get(key).map(|items| (key, items.as_slice())))
    }

    pub fn item_counts(&self) -> BTreeMap<String, usize> {
        self.iter()
            .map(|(key, items)| (key.to_string(), items.len()))
            .collect()
    }

    /// JSON object of `section key -> [items]`
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .iter()
            .map(|(key, items)| {
                (
                    key.to_string(),
                    serde_json::Value::Array(
                        items
                            .iter()
                            .map(|item| serde_json::Value::String(item.clone()))
                            .collect(),
                    ),
                )
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

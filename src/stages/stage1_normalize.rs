use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::NormalizeError;
use crate::models::{Framework, StructuredAnalysis};

const FENCE: &str = "```";

/// Strip a surrounding code fence, with or without a language tag.
///
/// Text without a leading fence is returned trimmed but otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Language tag, e.g. ```json, ``` html
    let rest = rest.trim_start_matches([' ', '\t']);
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];

    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

/// Normalize raw generation text into a structured analysis.
///
/// Steps:
/// 1. Strip a surrounding code fence
/// 2. Reject empty text
/// 3. Parse strictly as a JSON object
/// 4. Require every framework section, trimming items and dropping blank ones
pub fn normalize(raw: &str, framework: Framework) -> Result<StructuredAnalysis, NormalizeError> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(NormalizeError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(text).map_err(|e| NormalizeError::MalformedData {
        text: text.to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(mut object) = value else {
        return Err(NormalizeError::MalformedData {
            text: text.to_string(),
            reason: "expected a JSON object at the top level".to_string(),
        });
    };

    let missing: Vec<String> = framework
        .section_keys()
        .filter(|key| !object.contains_key(*key))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(NormalizeError::Schema { missing });
    }

    let mut sections = BTreeMap::new();
    for key in framework.section_keys() {
        let value = object.remove(key).unwrap_or(Value::Null);
        sections.insert(key, clean_section(key, value)?);
    }

    if !object.is_empty() {
        let extra: Vec<&String> = object.keys().collect();
        debug!("Ignoring unexpected sections: {:?}", extra);
    }

    Ok(StructuredAnalysis::from_validated(framework, sections))
}

fn clean_section(key: &str, value: Value) -> Result<Vec<String>, NormalizeError> {
    let invalid = |reason: &str| NormalizeError::InvalidSection {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let Value::Array(entries) = value else {
        return Err(invalid("expected a list of strings"));
    };

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::String(item) = entry else {
            return Err(invalid("expected a list of strings"));
        };
        let item = item.trim();
        if !item.is_empty() {
            items.push(item.to_string());
        }
    }

    if items.is_empty() {
        return Err(invalid("no non-empty items"));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FOUR_P_JSON: &str = r#"{
        "product": ["Widget A", "Widget B"],
        "price": ["Low cost"],
        "place": ["Online"],
        "promotion": ["Social media"]
    }"#;

    #[test]
    fn test_normalize_plain_json() {
        let analysis = normalize(FOUR_P_JSON, Framework::FourP).unwrap();
        assert_eq!(
            analysis.section("product").unwrap(),
            &["Widget A".to_string(), "Widget B".to_string()]
        );
        assert_eq!(analysis.section("promotion").unwrap(), &["Social media".to_string()]);
    }

    #[test]
    fn test_fenced_with_language_tag_matches_plain() {
        let fenced = format!("```json\n{}\n```", FOUR_P_JSON);
        assert_eq!(
            normalize(&fenced, Framework::FourP).unwrap(),
            normalize(FOUR_P_JSON, Framework::FourP).unwrap()
        );
    }

    #[test]
    fn test_fenced_without_tag_matches_plain() {
        let fenced = format!("  ```\n{}```  \n", FOUR_P_JSON);
        assert_eq!(
            normalize(&fenced, Framework::FourP).unwrap(),
            normalize(FOUR_P_JSON, Framework::FourP).unwrap()
        );
    }

    #[test]
    fn test_strip_code_fence_single_line() {
        assert_eq!(strip_code_fence("```json{\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("<html></html>"), "<html></html>");
    }

    #[test]
    fn test_space_before_language_tag() {
        assert_eq!(strip_code_fence("``` json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\t html\n<p>x</p>\n```"), "<p>x</p>");

        let fenced = format!("``` json\n{}\n```", FOUR_P_JSON);
        assert_eq!(
            normalize(&fenced, Framework::FourP).unwrap(),
            normalize(FOUR_P_JSON, Framework::FourP).unwrap()
        );
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        for raw in ["", "   \n\t", "```json\n```", "```\n  \n```"] {
            assert!(
                matches!(normalize(raw, Framework::FourP), Err(NormalizeError::EmptyResponse)),
                "expected EmptyResponse for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = normalize("{\"product\": [\"A\",", Framework::FourP).unwrap_err();
        match err {
            NormalizeError::MalformedData { text, .. } => assert!(text.starts_with("{\"product\"")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_object_is_malformed() {
        assert!(matches!(
            normalize("[\"product\"]", Framework::FourP),
            Err(NormalizeError::MalformedData { .. })
        ));
    }

    #[test]
    fn test_missing_key_named() {
        let raw = r#"{"product": ["A"], "price": ["B"], "promotion": ["D"]}"#;
        match normalize(raw, Framework::FourP) {
            Err(NormalizeError::Schema { missing }) => assert_eq!(missing, vec!["place"]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_items_trimmed_and_blanks_dropped() {
        let raw = r#"{"product": ["  A  ", "", "   "], "price": ["B"], "place": ["C"], "promotion": ["D"]}"#;
        let analysis = normalize(raw, Framework::FourP).unwrap();
        assert_eq!(analysis.section("product").unwrap(), &["A".to_string()]);
    }

    #[test]
    fn test_blank_only_section_invalid() {
        let raw = r#"{"product": [" "], "price": ["B"], "place": ["C"], "promotion": ["D"]}"#;
        assert!(matches!(
            normalize(raw, Framework::FourP),
            Err(NormalizeError::InvalidSection { key, .. }) if key == "product"
        ));
    }

    #[test]
    fn test_non_string_items_invalid() {
        let raw = r#"{"product": "A", "price": [1], "place": ["C"], "promotion": ["D"]}"#;
        assert!(matches!(
            normalize(raw, Framework::FourP),
            Err(NormalizeError::InvalidSection { key, .. }) if key == "product"
        ));
    }

    #[test]
    fn test_extra_keys_ignored() {
        let raw = r#"{"product": ["A"], "price": ["B"], "place": ["C"], "promotion": ["D"], "notes": "x"}"#;
        assert!(normalize(raw, Framework::FourP).is_ok());
    }

    #[test]
    fn test_five_forces_keys() {
        let raw = r#"{
            "new_entrants": ["High capital needs"],
            "supplier_power": ["Few suppliers"],
            "buyer_power": ["Fragmented buyers"],
            "substitutes": ["Streaming"],
            "rivalry": ["Intense"]
        }"#;
        let analysis = normalize(raw, Framework::FiveForces).unwrap();
        assert_eq!(analysis.iter().count(), 5);
        assert!(matches!(
            normalize(FOUR_P_JSON, Framework::FiveForces),
            Err(NormalizeError::Schema { missing }) if missing.len() == 5
        ));
    }

    fn item() -> impl Strategy<Value = String> {
        "[A-Za-z0-9][A-Za-z0-9 ,.%-]{0,40}[A-Za-z0-9.]"
    }

    fn section() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(item(), 1..5)
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_sections(
            product in section(),
            price in section(),
            place in section(),
            promotion in section(),
        ) {
            let raw = serde_json::json!({
                "product": product,
                "price": price,
                "place": place,
                "promotion": promotion,
            })
            .to_string();

            let analysis = normalize(&raw, Framework::FourP).unwrap();
            prop_assert_eq!(analysis.section("product").unwrap(), product.as_slice());
            prop_assert_eq!(analysis.section("promotion").unwrap(), promotion.as_slice());

            let again = normalize(&analysis.to_json().to_string(), Framework::FourP).unwrap();
            prop_assert_eq!(again, analysis);
        }

        #[test]
        fn prop_fence_does_not_change_result(
            product in section(),
            tag in prop::sample::select(vec!["json", "JSON", ""]),
        ) {
            let raw = serde_json::json!({
                "product": product,
                "price": ["p"],
                "place": ["q"],
                "promotion": ["r"],
            })
            .to_string();
            let fenced = format!("```{}\n{}\n```", tag, raw);

            prop_assert_eq!(
                normalize(&fenced, Framework::FourP).unwrap(),
                normalize(&raw, Framework::FourP).unwrap()
            );
        }
    }
}

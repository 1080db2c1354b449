use crate::models::{Framework, StructuredAnalysis};

/// System prompt for the 4P analysis request
pub const FOUR_P_SYSTEM_PROMPT: &str = "You are a marketing analysis expert. Respond only in JSON format. \
Each point should be detailed and specific within 125 characters, including concrete examples.";

/// System prompt for the Five Forces analysis request
pub const FIVE_FORCES_SYSTEM_PROMPT: &str = "You are a financial analyst. Respond only in JSON format. \
Each point should be specific and within 125 characters.";

/// System prompt for the strategic summary request
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a business strategy consultant. Create concise, professional strategic summaries.";

/// System prompt for the raw HTML slide request
pub const RAW_HTML_SYSTEM_PROMPT: &str = "You are a financial analyst and HTML designer.";

/// Maximum summary length requested from the model
pub const SUMMARY_MAX_CHARS: usize = 150;

pub fn analysis_system_prompt(framework: Framework) -> &'static str {
    match framework {
        Framework::FourP => FOUR_P_SYSTEM_PROMPT,
        Framework::FiveForces => FIVE_FORCES_SYSTEM_PROMPT,
    }
}

/// Build the user prompt asking for a structured analysis of a company
pub fn build_analysis_prompt(company: &str, framework: Framework) -> String {
    let mut prompt = String::new();

    match framework {
        Framework::FourP => {
            prompt.push_str("You are a marketing analysis expert.\n");
            prompt.push_str(&format!("Company: {}\n\n", company));
            prompt.push_str(
                "Please conduct a 4P analysis (Product, Price, Place, Promotion) for this company and\n\
                 return 3-4 detailed points for each element (within 125 characters per point) in a list format.\n\n\
                 Include specific, practical, and detailed content with concrete examples and strategic insights.\n\
                 Make each point informative for business decision-making while keeping content concise.\n\n",
            );
        }
        Framework::FiveForces => {
            prompt.push_str("You are helping to create a Porter 5 Forces slide.\n");
            prompt.push_str(&format!("Company: {}\n\n", company));
            prompt.push_str(
                "Assess each of the five competitive forces for this company and\n\
                 return 3-4 points for each force (within 125 characters per point) in a list format.\n\n",
            );
        }
    }

    prompt.push_str("Return only in the following JSON format (no additional explanations needed):\n");
    prompt.push_str(&schema_example(framework));
    prompt.push('\n');

    prompt
}

/// JSON skeleton listing each section key with placeholder items
fn schema_example(framework: Framework) -> String {
    let lines: Vec<String> = framework
        .sections()
        .iter()
        .map(|section| {
            let items: Vec<String> = (1..=3)
                .map(|n| format!("\"{} point {}\"", section.label, n))
                .collect();
            format!("  \"{}\": [{}]", section.key, items.join(", "))
        })
        .collect();

    format!("{{\n{}\n}}", lines.join(",\n"))
}

/// Build the prompt asking for a one-line strategic summary of an analysis
pub fn build_summary_prompt(company: &str, analysis: &StructuredAnalysis) -> String {
    let framework = analysis.framework();
    let mut prompt = format!(
        "Based on the following {} results for {}, please write a concise strategic summary comment \
         (within {} characters) that captures the key business strategy and competitive positioning.\n\n",
        framework.title(),
        company,
        SUMMARY_MAX_CHARS
    );

    for (key, items) in analysis.iter() {
        let label = framework.section(key).map(|s| s.label).unwrap_or(key);
        prompt.push_str(&format!("{}: {}\n", label, items.join(" / ")));
    }

    prompt.push_str(
        "\nPlease provide a professional business summary that highlights the company's strategic focus \
         and market positioning. The comment should be suitable for a business presentation slide header.\n\n\
         Return only the summary comment, no additional explanations.",
    );

    prompt
}

/// Build the prompt asking the model to write a whole slide from a sample
pub fn build_raw_html_prompt(company: &str, framework: Framework, sample_html: &str) -> String {
    format!(
        "You are helping to create a {} slide.\n\
         Company: {}\n\
         Below is a sample slide design in HTML. Please use this as a reference and generate a new slide \
         for the company above. Return only the HTML code.\n\n\
         ---\n{}\n---\n",
        framework.title(),
        company,
        sample_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::normalize;

    #[test]
    fn test_analysis_prompt_names_company_and_keys() {
        let prompt = build_analysis_prompt("Acme", Framework::FourP);
        assert!(prompt.contains("Company: Acme"));
        for key in Framework::FourP.section_keys() {
            assert!(prompt.contains(&format!("\"{}\":", key)));
        }
    }

    #[test]
    fn test_schema_example_is_valid_json() {
        for framework in [Framework::FourP, Framework::FiveForces] {
            let example = schema_example(framework);
            let analysis = normalize(&example, framework).unwrap();
            assert_eq!(analysis.iter().count(), framework.sections().len());
        }
    }

    #[test]
    fn test_summary_prompt_joins_items() {
        let analysis = normalize(
            r#"{"product": ["A", "B"], "price": ["Low"], "place": ["Online"], "promotion": ["Ads"]}"#,
            Framework::FourP,
        )
        .unwrap();
        let prompt = build_summary_prompt("Acme", &analysis);
        assert!(prompt.contains("Product: A / B\n"));
        assert!(prompt.contains("Promotion: Ads\n"));
    }

    #[test]
    fn test_raw_html_prompt_embeds_sample() {
        let prompt = build_raw_html_prompt("Acme", Framework::FiveForces, "<html>sample</html>");
        assert!(prompt.contains("---\n<html>sample</html>\n---"));
        assert!(prompt.contains("Five Forces Analysis"));
    }
}

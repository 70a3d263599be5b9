//! Narrative layer: prompt construction and reply parsing for the LLM pass.
//!
//! Prompts are built from aggregated statistics only. Raw cell values never
//! leave the process through this path.

use tabula_core::Profile;

/// Build the narrative prompt for one chart from its deterministic findings
/// and the dataset profile.
pub fn build_prompt(chart_title: &str, findings: &[String], profile: &Profile) -> String {
    let mut prompt = String::new();
    prompt.push_str("You are a data analyst. A dataset has ");
    prompt.push_str(&format!(
        "{} rows and {} columns (health score {:.0}/100, {:.1}% complete).\n",
        profile.rows, profile.cols, profile.data_health_score, profile.completeness_percentage
    ));
    prompt.push_str(&format!("Chart under discussion: {}\n", chart_title));
    prompt.push_str("Computed statistics:\n");
    for finding in findings {
        prompt.push_str("- ");
        prompt.push_str(finding);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nWrite two sections. Under the header FINDINGS: give up to 3 short bullet \
         points interpreting these statistics. Under the header RECOMMENDATIONS: give \
         up to 2 short actionable bullet points. Use plain language. Do not invent \
         numbers that are not given above.",
    );
    prompt
}

/// Split an LLM reply into findings and recommendations.
///
/// Tolerant of markdown decoration and missing headers; with no headers at
/// all, every bullet counts as a finding.
pub fn parse_reply(reply: &str) -> (Vec<String>, Vec<String>) {
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();
    let mut in_recommendations = false;

    for line in reply.lines() {
        let trimmed = line.trim().trim_start_matches(['#', '*']).trim();
        if trimmed.is_empty() {
            continue;
        }
        let upper = trimmed.to_uppercase();
        if upper.starts_with("RECOMMENDATION") {
            in_recommendations = true;
            continue;
        }
        if upper.starts_with("FINDING") {
            in_recommendations = false;
            continue;
        }
        if let Some(bullet) = strip_bullet(trimmed) {
            if in_recommendations {
                recommendations.push(bullet);
            } else {
                findings.push(bullet);
            }
        }
    }
    (findings, recommendations)
}

/// Strip list markers from a line, returning the content if it was a bullet.
fn strip_bullet(line: &str) -> Option<String> {
    let stripped = line
        .trim_start_matches(['-', '*', '•'])
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')'])
        .trim();
    if stripped.is_empty() || stripped == line {
        // Not a list item; take plain sentences too, they are common in
        // model output.
        if line.len() > 3 && !line.ends_with(':') {
            return Some(line.to_string());
        }
        return None;
    }
    Some(stripped.to_string())
}

use crate::models::report::ResumeReport;

/// Renders the match analysis of a stored report as a markdown hiring report.
/// Returns `None` when the report carries no match analysis.
pub fn render_hiring_report(report: &ResumeReport, job_title: &str) -> Option<String> {
    let analysis = report.job_match.as_ref()?;
    let job_title = match job_title.trim() {
        "" => "Position",
        title => title,
    };
    let candidate = report
        .profile
        .as_ref()
        .map(|p| p.personal_information.name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown candidate");

    let mut md = format!("# Hiring Analysis Report\n## Position: {job_title}\n");
    md.push_str(&format!("**Candidate**: {candidate} ({})\n\n", report.filename));

    md.push_str("### Overall Match Assessment\n");
    md.push_str(&format!("- **Match Score**: {}/100\n", analysis.score));
    md.push_str(&format!("- **Match Level**: {}\n", analysis.label.as_str()));
    let summary = match analysis.summary.trim() {
        "" => "No summary available",
        s => s,
    };
    md.push_str(&format!("- **Overall Assessment**: {summary}\n"));

    push_numbered(&mut md, "Key Strengths", &analysis.strengths);
    push_numbered(&mut md, "Areas of Concern", &analysis.gaps);

    if !analysis.dimensions.is_empty() {
        md.push_str("\n### Detailed Breakdown\n");
        for dimension in &analysis.dimensions {
            let score = dimension
                .score
                .map(|s| format!("{s}/100"))
                .unwrap_or_else(|| "N/A".to_string());
            let assessment = match dimension.assessment.trim() {
                "" => "No assessment",
                a => a,
            };
            md.push_str(&format!(
                "- **{}**: {score} - {assessment}\n",
                title_case(&dimension.dimension)
            ));
        }
    }

    push_numbered(&mut md, "Recommendations", &analysis.recommendations);
    push_numbered(&mut md, "Interview Focus Areas", &analysis.interview_focus_areas);

    Some(md)
}

fn push_numbered(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("\n### {heading}\n"));
    for (i, item) in items.iter().enumerate() {
        md.push_str(&format!("{}. {item}\n", i + 1));
    }
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

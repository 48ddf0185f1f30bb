//! Markdown rendering of a completed report
//!
//! Sections, in order: overview (with scraping notes), search intent, top
//! pages, common patterns, content origin, target page (with structured data
//! validation and health), critical gaps, recommendations grouped
//! HIGH → MEDIUM → LOW, quick wins, content strategy, technical SEO, and
//! finally any stage diagnostics.

use crate::models::{AnalysisReport, Priority, SignalImpact};
use crate::services::serpapi_client::TOP_RESULTS;
use std::fmt::{self, Write};

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn bullets(out: &mut String, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(out, "- {item}")?;
    }
    Ok(())
}

fn or_placeholder<'a>(items: &[String], placeholder: &'a str) -> std::borrow::Cow<'a, str> {
    if items.is_empty() {
        placeholder.into()
    } else {
        items.join(", ").into()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn overview(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let analyzed = report.competitor_analyses.len();

    writeln!(out, "# SEO Intent Analysis: {}\n", report.keyword)?;
    writeln!(out, "## Analysis Overview\n")?;
    writeln!(out, "- **Keyword:** {}", report.keyword)?;
    writeln!(out, "- **Target URL:** {}", report.target_url)?;
    writeln!(
        out,
        "- **Analysis Date:** {}",
        report.analyzed_at.format("%B %-d, %Y %H:%M UTC")
    )?;
    writeln!(out, "- **Model:** {}", report.model)?;
    writeln!(
        out,
        "- **Competitors Analyzed:** {analyzed}/{TOP_RESULTS} successfully scraped"
    )?;

    if report.target_page_incomplete || analyzed < TOP_RESULTS {
        writeln!(out, "\n> **Scraping Notes:**")?;
        if report.target_page_incomplete {
            writeln!(
                out,
                "> - Target page could not be scraped (403/404). Recommendations based on competitor patterns."
            )?;
        }
        if analyzed < TOP_RESULTS {
            writeln!(
                out,
                "> - Only {analyzed} of {TOP_RESULTS} competitor pages could be analyzed. Some sites block automated access."
            )?;
        }
    }
    writeln!(out)
}

fn intent(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let intent = &report.intent_analysis;
    writeln!(out, "## Search Intent Analysis\n")?;
    writeln!(
        out,
        "- **Primary Intent:** {} ({}% confidence)",
        capitalize(&intent.intent),
        intent.confidence
    )?;
    writeln!(out, "- **User Goal:** {}", intent.user_goal)?;
    writeln!(out, "- **Buyer Journey Stage:** {}\n", capitalize(&intent.buyer_stage))?;
    writeln!(out, "**Reasoning:** {}\n", intent.reasoning)
}

fn top_pages(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    writeln!(out, "## Top Ranking Pages\n")?;
    for analysis in &report.competitor_analyses {
        let assessment = &analysis.assessment;
        writeln!(out, "### #{}: {}\n", analysis.position, analysis.title)?;
        writeln!(out, "- **URL:** {}", analysis.url)?;
        writeln!(out, "- **Content Type:** {}", assessment.content_type)?;
        writeln!(out, "- **Content Depth:** {}", assessment.content_depth)?;
        writeln!(out, "- **Word Count:** {}", analysis.page_data.word_count)?;
        writeln!(out, "- **Target Audience:** {}\n", assessment.target_audience)?;

        writeln!(out, "**Strengths:**")?;
        for strength in &assessment.strengths {
            writeln!(out, "- {}", strength.description())?;
        }
        writeln!(out, "\n**Key Elements:**")?;
        bullets(out, &assessment.key_elements)?;
        if !assessment.notes.is_empty() {
            writeln!(out, "\n**Notes:** {}", assessment.notes)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn patterns(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let patterns = &report.pattern_analysis;
    writeln!(out, "## Common Patterns Across Top Rankers\n")?;

    writeln!(out, "### Content Length\n")?;
    writeln!(out, "- **Average:** {} words", patterns.content_length.average)?;
    writeln!(out, "- **Range:** {}", patterns.content_length.range)?;
    writeln!(
        out,
        "- **Recommendation:** {}\n",
        patterns.content_length.recommendation
    )?;

    writeln!(out, "### Patterns Found (3+ pages)\n")?;
    for pattern in &patterns.common_patterns {
        writeln!(
            out,
            "#### [{}] {}\n",
            pattern.importance.as_str().to_uppercase(),
            pattern.pattern
        )?;
        writeln!(out, "- **Frequency:** {}", pattern.frequency)?;
        writeln!(out, "- **Examples:**")?;
        for example in &pattern.examples {
            writeln!(out, "  - {example}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "### Must-Have Elements\n")?;
    bullets(out, &patterns.must_have_elements)?;
    writeln!(out, "\n### Content Structure\n")?;
    writeln!(out, "{}\n", patterns.content_structure)?;
    writeln!(out, "### Common Elements\n")?;
    bullets(out, &patterns.common_elements)?;
    writeln!(out)
}

fn content_origin(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let origin = &report.content_origin_analysis;
    let verdict = if origin.is_likely_ai_generated {
        "Likely AI-Generated"
    } else {
        "Likely Human-Written"
    };
    let level = match origin.confidence_score {
        80.. => "High",
        60..=79 => "Moderate",
        _ => "Low",
    };

    writeln!(out, "## AI Content Detection\n")?;
    writeln!(out, "### Overall Assessment\n")?;
    writeln!(out, "**Verdict:** {verdict}")?;
    writeln!(out, "**Confidence:** {}% ({level})\n", origin.confidence_score)?;
    writeln!(out, "**Summary:** {}\n", origin.summary)?;

    if !origin.indicators.is_empty() {
        writeln!(out, "### Key Indicators\n")?;
        for (impact, heading) in [
            (SignalImpact::Strong, "Strong Signals"),
            (SignalImpact::Moderate, "Moderate Signals"),
            (SignalImpact::Weak, "Weak Signals"),
        ] {
            let matching: Vec<_> = origin
                .indicators
                .iter()
                .filter(|i| i.impact == impact)
                .collect();
            if matching.is_empty() {
                continue;
            }
            writeln!(out, "#### {heading}\n")?;
            for indicator in matching {
                writeln!(out, "- **{}:** {}", indicator.category, indicator.signal)?;
            }
            writeln!(out)?;
        }
    }

    if !origin.human_like_qualities.is_empty() {
        writeln!(out, "### Human-Like Qualities\n")?;
        bullets(out, &origin.human_like_qualities)?;
        writeln!(out)?;
    }
    if !origin.ai_like_qualities.is_empty() {
        writeln!(out, "### AI-Like Qualities\n")?;
        bullets(out, &origin.ai_like_qualities)?;
        writeln!(out)?;
    }

    writeln!(out, "### Recommendation\n")?;
    writeln!(out, "{}\n", origin.recommendation)
}

fn target_page(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let page = &report.target_page_data;
    writeln!(out, "## Your Page Analysis\n")?;

    if report.target_page_incomplete {
        writeln!(
            out,
            "> **Warning:** Your target page could not be scraped (403 Forbidden or 404 Not Found). \
             The analysis below is based only on competitor patterns. Consider:"
        )?;
        writeln!(out, "> - Using a different URL that's publicly accessible")?;
        writeln!(out, "> - Checking if the URL is correct and publicly available")?;
        writeln!(out, "> - The recommendations are still valid based on competitor analysis\n")?;
    }

    let meta = if page.meta_description.is_empty() {
        "Missing"
    } else {
        page.meta_description.as_str()
    };

    writeln!(out, "### Current State\n")?;
    writeln!(out, "- **Title:** {}", page.title)?;
    writeln!(out, "- **Meta Description:** {meta}")?;
    writeln!(out, "- **Word Count:** {}", page.word_count)?;
    writeln!(out, "- **H1 Tags:** {}", or_placeholder(&page.h1_tags, "None"))?;
    writeln!(out, "- **Images:** {}", page.image_count)?;
    writeln!(out, "- **Has Video:** {}", yes_no(page.has_video))?;
    writeln!(out, "- **Has FAQ:** {}", yes_no(page.has_faq))?;
    writeln!(out, "- **Has Tables:** {}", yes_no(page.has_tables))?;
    writeln!(out, "- **Schema Types:** {}", or_placeholder(&page.schema_types, "None"))?;

    if let Some(validation) = page.schema_validation.as_ref().filter(|v| v.total_schemas > 0) {
        writeln!(out, "\n#### Schema Validation\n")?;
        writeln!(out, "- **Total Schemas:** {}", validation.total_schemas)?;
        writeln!(out, "- **Valid:** {}", validation.valid_schemas)?;
        writeln!(out, "- **Invalid:** {}", validation.invalid_schemas)?;
        writeln!(out, "- **Errors:** {}", validation.total_errors)?;
        writeln!(out, "- **Warnings:** {}", validation.total_warnings)?;

        if validation.total_errors > 0 || validation.total_warnings > 0 {
            writeln!(out, "\n**Validation Details:**\n")?;
            for (index, result) in validation.results.iter().enumerate() {
                if result.errors.is_empty() && result.warnings.is_empty() {
                    continue;
                }
                writeln!(out, "**Schema {}: {}**", index + 1, result.schema_type)?;
                if !result.errors.is_empty() {
                    writeln!(out, "- Errors:")?;
                    for issue in &result.errors {
                        writeln!(out, "  - {}", issue.message)?;
                    }
                }
                if !result.warnings.is_empty() {
                    writeln!(out, "- Warnings:")?;
                    for issue in &result.warnings {
                        writeln!(out, "  - {}", issue.message)?;
                    }
                }
                writeln!(out)?;
            }
        }
    }

    let health = &report.schema_health;
    writeln!(
        out,
        "\n#### Schema Health: {} ({}/100)\n",
        capitalize(health.status.as_str()),
        health.score
    )?;
    bullets(out, &health.issues)?;
    for recommendation in &health.recommendations {
        writeln!(out, "- Suggestion: {recommendation}")?;
    }

    let comparison = &report.competitor_schema_comparison;
    if !comparison.best_implementation.is_empty() {
        writeln!(out, "\n#### Competitor Structured Data\n")?;
        writeln!(out, "- **Average Schemas per Page:** {:.1}", comparison.average_schema_count)?;
        writeln!(out, "- **Average Valid:** {:.1}", comparison.average_valid_schemas)?;
        writeln!(out, "- **Average Errors:** {:.1}", comparison.average_error_count)?;
        writeln!(
            out,
            "- **Common Types:** {}",
            or_placeholder(&comparison.common_schema_types, "None")
        )?;
        writeln!(out, "- **Best Implementation:** {}", comparison.best_implementation)?;
        writeln!(out, "- **Weakest Implementation:** {}", comparison.worst_implementation)?;
    }

    writeln!(out, "\n### Critical Gaps\n")?;
    bullets(out, &report.recommendations.critical_gaps)?;
    writeln!(out)
}

fn recommendations(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let recs = &report.recommendations;
    writeln!(out, "## Recommendations (Priority Order)\n")?;

    let ordered = [Priority::High, Priority::Medium, Priority::Low]
        .into_iter()
        .flat_map(|priority| recs.recommendations.iter().filter(move |r| r.priority == priority));
    for (counter, rec) in ordered.enumerate() {
        writeln!(out, "### {}. [{}] {}\n", counter + 1, rec.priority.as_str(), rec.title)?;
        writeln!(out, "**Category:** {} | **Effort:** {}\n", rec.category, rec.effort)?;
        writeln!(out, "{}\n", rec.description)?;
        writeln!(out, "**Why this matters:** {}\n", rec.reasoning)?;
    }

    writeln!(out, "## Quick Wins\n")?;
    writeln!(out, "These are easy improvements that can be implemented quickly:\n")?;
    bullets(out, &recs.quick_wins)?;
    writeln!(out, "\n## Content Strategy\n")?;
    writeln!(out, "{}\n", recs.content_strategy)?;
    writeln!(out, "## Technical SEO\n")?;
    bullets(out, &recs.technical_seo)?;
    writeln!(out)
}

fn diagnostics(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    if report.diagnostics.is_empty() {
        return Ok(());
    }
    writeln!(out, "## Analysis Notes\n")?;
    writeln!(out, "Parts of this report were produced with reduced confidence:\n")?;
    for diagnostic in &report.diagnostics {
        writeln!(out, "- **{}:** {}", diagnostic.stage, diagnostic.reason)?;
    }
    writeln!(out)
}

fn write_report(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    overview(out, report)?;
    intent(out, report)?;
    top_pages(out, report)?;
    patterns(out, report)?;
    content_origin(out, report)?;
    target_page(out, report)?;
    recommendations(out, report)?;
    diagnostics(out, report)
}

/// Render the full markdown report
pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::with_capacity(8 * 1024);
    if let Err(e) = write_report(&mut out, report) {
        tracing::warn!(error = %e, "Report rendering stopped early");
    }
    out
}

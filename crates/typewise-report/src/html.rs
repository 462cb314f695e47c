//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use std::path::Path;

use anyhow::{Context, Result};

use typewise_core::report::AssessmentReport;
use typewise_core::result::DimensionResult;

/// Number of entries shown in the type-probability table.
const TOP_TYPES: usize = 5;

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report for a finished assessment.
pub fn generate_html(report: &AssessmentReport) -> String {
    let result = &report.result;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>typewise report: {}</title>\n",
        html_escape(&result.type_code)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>typewise report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Item bank: <strong>{}</strong> | {} items answered | {}</p>\n",
        html_escape(&report.item_bank.name),
        result.total_items,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Type and confidence
    let validity_class = if report.is_valid { "valid" } else { "invalid" };
    html.push_str("<section class=\"summary\">\n");
    html.push_str(&format!(
        "<p class=\"type-code\">{}</p>\n",
        html_escape(&result.type_code)
    ));
    html.push_str(&format!(
        "<p>Overall confidence: <strong>{:.0}%</strong> | <span class=\"{}\">{}</span></p>\n",
        result.overall_confidence * 100.0,
        validity_class,
        if report.is_valid {
            "valid"
        } else {
            "flagged as not fully trustworthy"
        }
    ));
    html.push_str("</section>\n");

    // Per-dimension preferences
    html.push_str("<section class=\"dimensions\">\n");
    html.push_str("<h2>Preferences</h2>\n");
    html.push_str(&generate_preference_chart(&result.dimensions));
    html.push_str("<table>\n");
    html.push_str("<thead><tr><th>Dimension</th><th>Preference</th><th>Clarity</th><th>θ</th><th>SE</th><th>Confidence</th><th>Items</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for d in &result.dimensions {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:+.2}</td><td>{:.2}</td><td>{:.0}%</td><td>{}</td></tr>\n",
            d.dimension.label(),
            d.preferred_pole,
            d.clarity,
            d.theta,
            d.standard_error,
            d.confidence * 100.0,
            d.items_administered
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Type probabilities
    html.push_str("<section class=\"types\">\n");
    html.push_str("<h2>Most likely types</h2>\n");
    html.push_str("<table>\n<thead><tr><th>Type</th><th>Probability</th></tr></thead>\n<tbody>\n");
    for t in result.top_types(TOP_TYPES) {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{:.1}%</td></tr>\n",
            html_escape(&t.type_code),
            t.probability * 100.0
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    // Cognitive stack
    if !result.cognitive_stack.is_empty() {
        html.push_str("<section class=\"stack\">\n");
        html.push_str("<h2>Cognitive functions</h2>\n<ol>\n");
        for f in &result.cognitive_stack {
            html.push_str(&format!(
                "<li><strong>{}</strong> {} ({}, strength {:.2})</li>\n",
                f.function,
                f.function.label(),
                f.role,
                f.score
            ));
        }
        html.push_str("</ol>\n</section>\n");
    }

    // Validity and warnings
    if !report.warnings.is_empty() || !result.validity.flags.is_empty() {
        html.push_str("<section class=\"warnings\">\n");
        html.push_str("<h2>Warnings</h2>\n<ul>\n");
        for w in &report.warnings {
            html.push_str(&format!("<li>{}</li>\n", html_escape(&w.to_string())));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Response log
    html.push_str("<section class=\"responses\">\n");
    html.push_str("<details>\n<summary>Response log</summary>\n");
    html.push_str("<table>\n<thead><tr><th>#</th><th>Item</th><th>Dimension</th><th>Choice</th><th>θ after</th><th>SE after</th><th>Latency</th></tr></thead>\n<tbody>\n");
    for r in &report.responses {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:+.2}</td><td>{:.2}</td><td>{}ms</td></tr>\n",
            r.presentation_order,
            html_escape(&r.item_id),
            r.dimension,
            r.choice,
            r.theta_after,
            r.se_after,
            r.latency_ms
        ));
    }
    html.push_str("</tbody></table>\n</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Diverging bars: second pole to the left of centre, first pole to the right.
fn generate_preference_chart(dimensions: &[DimensionResult]) -> String {
    let bar_height = 26;
    let padding = 12;
    let label_width = 40;
    let half_width = 200.0;
    let theta_range = 3.0;

    let center = label_width as f64 + half_width;
    let total_height = dimensions.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width * 2 + (half_width * 2.0) as usize,
        total_height
    );
    svg.push_str(&format!(
        "  <line x1=\"{center}\" y1=\"0\" x2=\"{center}\" y2=\"{total_height}\" stroke=\"currentColor\" stroke-width=\"1\"/>\n"
    ));

    for (i, d) in dimensions.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let mid = y + bar_height / 2;
        let length = (d.theta.clamp(-theta_range, theta_range) / theta_range * half_width).abs();
        let x = if d.theta >= 0.0 { center } else { center - length };
        let color = if d.theta >= 0.0 { "#2563eb" } else { "#9333ea" };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 8,
            mid,
            d.dimension.second_pole()
        ));
        svg.push_str(&format!(
            "  <rect x=\"{x:.1}\" y=\"{y}\" width=\"{length:.1}\" height=\"{bar_height}\" fill=\"{color}\" rx=\"4\"><title>{} {}</title></rect>\n",
            d.preferred_pole, d.clarity
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            center + half_width + 8.0,
            mid,
            d.dimension.first_pole()
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --ok: #dcfce7; --bad: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --ok: #064e3b; --bad: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.type-code { font-size: 3rem; font-weight: bold; letter-spacing: 0.3rem; margin: 0.5rem 0; }
.valid { background: var(--ok); padding: 0.1rem 0.4rem; border-radius: 4px; }
.invalid { background: var(--bad); padding: 0.1rem 0.4rem; border-radius: 4px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

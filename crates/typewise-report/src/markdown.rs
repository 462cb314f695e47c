//! Markdown report generator.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use typewise_core::report::AssessmentReport;

/// Generate a Markdown summary of a finished assessment.
pub fn generate_markdown(report: &AssessmentReport) -> String {
    let result = &report.result;
    let mut md = String::new();

    let _ = writeln!(md, "# typewise report: {}\n", result.type_code);
    let _ = writeln!(
        md,
        "Item bank **{}** · {} items answered · {}\n",
        report.item_bank.name,
        result.total_items,
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        md,
        "Overall confidence: **{:.0}%**{}\n",
        result.overall_confidence * 100.0,
        if report.is_valid {
            ""
        } else {
            " (flagged: interpret with caution)"
        }
    );

    md.push_str("## Preferences\n\n");
    md.push_str("| Dimension | Preference | Clarity | θ | SE | Items |\n");
    md.push_str("|---|---|---|---|---|---|\n");
    for d in &result.dimensions {
        let _ = writeln!(
            md,
            "| {} | {} ({:.0}%) | {} | {:+.2} | {:.2} | {} |",
            d.dimension,
            d.preferred_pole,
            d.pole_probability(d.preferred_pole) * 100.0,
            d.clarity,
            d.theta,
            d.standard_error,
            d.items_administered
        );
    }

    md.push_str("\n## Most likely types\n\n");
    for t in result.top_types(3) {
        let _ = writeln!(md, "- {} ({:.1}%)", t.type_code, t.probability * 100.0);
    }

    if !result.cognitive_stack.is_empty() {
        md.push_str("\n## Cognitive functions\n\n");
        for f in &result.cognitive_stack {
            let _ = writeln!(
                md,
                "1. **{}** {}: {} ({:.2})",
                f.function,
                f.function.label(),
                f.role,
                f.score
            );
        }
    }

    if !report.warnings.is_empty() {
        md.push_str("\n## Warnings\n\n");
        for w in &report.warnings {
            let _ = writeln!(md, "- {w}");
        }
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))
        .with_context(|| format!("failed to write Markdown report to {}", path.display()))?;
    Ok(())
}

//! The `typewise report` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use typewise_core::report::AssessmentReport;
use typewise_report::html::generate_html;
use typewise_report::markdown::generate_markdown;

pub fn execute(input: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let report = AssessmentReport::load_json(&input)?;

    let rendered = match format.as_str() {
        "html" => generate_html(&report),
        "markdown" | "md" => generate_markdown(&report),
        "json" => serde_json::to_string_pretty(&report)?,
        other => anyhow::bail!("unknown format '{other}': expected html, markdown or json"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

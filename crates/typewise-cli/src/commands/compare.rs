//! The `typewise compare` command.

use std::path::PathBuf;

use anyhow::Result;

use typewise_core::report::AssessmentReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_change: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = AssessmentReport::load_json(&baseline_path)?;
    let current = AssessmentReport::load_json(&current_path)?;

    let comparison = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            if comparison.type_changed {
                println!(
                    "Type changed: {} -> {}",
                    comparison.baseline_type, comparison.current_type
                );
            } else {
                println!("Type unchanged: {}", comparison.current_type);
            }
            println!(
                "{} dimension(s) shifted, {} stable (threshold {:.2})",
                comparison.shifts.len() - comparison.stable_count(),
                comparison.stable_count(),
                threshold
            );

            for s in comparison.shifts.iter().filter(|s| s.shifted) {
                let flip = if s.pole_flipped {
                    format!(", {} -> {}", s.baseline_pole, s.current_pole)
                } else {
                    String::new()
                };
                println!(
                    "  {} {:+.2} -> {:+.2} ({:+.2}{flip})",
                    s.dimension, s.baseline_theta, s.current_theta, s.delta
                );
            }
        }
    }

    if fail_on_change && comparison.type_changed {
        std::process::exit(1);
    }

    Ok(())
}

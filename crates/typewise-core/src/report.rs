//! Assessment report with JSON persistence and retest comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::FinalizedAssessment;
use crate::model::{Dimension, ItemBank, Pole};
use crate::result::{AssessmentResult, AssessmentWarning};
use crate::session::{AdaptiveResponse, AdaptiveSession};

/// A finished assessment with everything needed to re-render or audit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub item_bank: ItemBankSummary,
    pub session: AdaptiveSession,
    pub result: AssessmentResult,
    pub is_valid: bool,
    #[serde(default)]
    pub warnings: Vec<AssessmentWarning>,
    /// Responses in presentation order.
    pub responses: Vec<AdaptiveResponse>,
}

/// Summary of the bank an assessment drew from (without the items).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBankSummary {
    pub id: String,
    pub name: String,
    pub item_count: usize,
}

impl From<&ItemBank> for ItemBankSummary {
    fn from(bank: &ItemBank) -> Self {
        Self {
            id: bank.id.clone(),
            name: bank.name.clone(),
            item_count: bank.items.len(),
        }
    }
}

impl AssessmentReport {
    pub fn new(
        session: AdaptiveSession,
        finalized: FinalizedAssessment,
        mut responses: Vec<AdaptiveResponse>,
        bank: &ItemBank,
    ) -> Self {
        responses.sort_by_key(|r| r.presentation_order);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            item_bank: bank.into(),
            session,
            result: finalized.result,
            is_valid: finalized.is_valid,
            warnings: finalized.warnings,
            responses,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this (retest) report against a baseline. Dimensions whose
    /// theta moved by more than `threshold` count as shifted.
    pub fn compare(&self, baseline: &AssessmentReport, threshold: f64) -> RetestComparison {
        let shifts = Dimension::ALL
            .into_iter()
            .filter_map(|dimension| {
                let before = baseline.result.dimension(dimension)?;
                let after = self.result.dimension(dimension)?;
                let delta = after.theta - before.theta;
                Some(DimensionShift {
                    dimension,
                    baseline_theta: before.theta,
                    current_theta: after.theta,
                    delta,
                    baseline_pole: before.preferred_pole,
                    current_pole: after.preferred_pole,
                    pole_flipped: before.preferred_pole != after.preferred_pole,
                    shifted: delta.abs() > threshold,
                })
            })
            .collect();

        RetestComparison {
            baseline_type: baseline.result.type_code.clone(),
            current_type: self.result.type_code.clone(),
            type_changed: baseline.result.type_code != self.result.type_code,
            threshold,
            shifts,
        }
    }
}

/// Result of comparing two assessments of the same person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetestComparison {
    pub baseline_type: String,
    pub current_type: String,
    pub type_changed: bool,
    pub threshold: f64,
    pub shifts: Vec<DimensionShift>,
}

/// Movement on one dimension between two assessments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionShift {
    pub dimension: Dimension,
    pub baseline_theta: f64,
    pub current_theta: f64,
    /// current − baseline.
    pub delta: f64,
    pub baseline_pole: Pole,
    pub current_pole: Pole,
    pub pole_flipped: bool,
    /// |delta| exceeded the comparison threshold.
    pub shifted: bool,
}

impl RetestComparison {
    pub fn has_shifts(&self) -> bool {
        self.shifts.iter().any(|s| s.shifted)
    }

    pub fn stable_count(&self) -> usize {
        self.shifts.iter().filter(|s| !s.shifted).count()
    }

    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        if self.type_changed {
            md.push_str(&format!(
                "**Type changed:** {} → {}\n\n",
                self.baseline_type, self.current_type
            ));
        } else {
            md.push_str(&format!("**Type unchanged:** {}\n\n", self.current_type));
        }

        md.push_str(&format!(
            "**Summary:** {} shifted, {} stable (threshold {:.2})\n\n",
            self.shifts.len() - self.stable_count(),
            self.stable_count(),
            self.threshold
        ));

        md.push_str("| Dimension | Baseline θ | Current θ | Δ | Pole | Status |\n");
        md.push_str("|-----------|-----------|-----------|---|------|--------|\n");
        for s in &self.shifts {
            let pole = if s.pole_flipped {
                format!("{} → {}", s.baseline_pole, s.current_pole)
            } else {
                s.current_pole.to_string()
            };
            let status = if s.shifted { "shifted" } else { "stable" };
            md.push_str(&format!(
                "| {} | {:+.2} | {:+.2} | {:+.2} | {} | {} |\n",
                s.dimension, s.baseline_theta, s.current_theta, s.delta, pole, status
            ));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::ThetaEstimate;
    use crate::model::DimensionMap;
    use crate::result::calculate_result;
    use crate::session::DimensionProgress;
    use crate::validity::AssessmentValidity;

    fn make_report(thetas: [f64; 4]) -> AssessmentReport {
        let session = AdaptiveSession::new("user", "tenant", Utc::now());
        let progress = DimensionMap::from_fn(|d| DimensionProgress {
            estimate: ThetaEstimate {
                theta: thetas[d.index()],
                standard_error: 0.3,
                information: 10.0,
            },
            items_administered: 8,
        });
        let result = calculate_result(
            session.id,
            &progress,
            &[],
            AssessmentValidity::default(),
            session.started_at,
        );
        let bank = ItemBank {
            id: "bank".into(),
            name: "Bank".into(),
            description: String::new(),
            items: vec![],
        };
        AssessmentReport::new(
            session,
            FinalizedAssessment {
                result,
                is_valid: true,
                warnings: vec![],
            },
            vec![],
            &bank,
        )
    }

    #[test]
    fn compare_identical_reports() {
        let report = make_report([-1.0, -0.6, 0.4, 1.2]);
        let comparison = report.compare(&report, 0.3);
        assert!(!comparison.type_changed);
        assert!(!comparison.has_shifts());
        assert_eq!(comparison.stable_count(), 4);
    }

    #[test]
    fn compare_with_pole_flip() {
        let baseline = make_report([-1.0, -0.6, 0.4, 1.2]);
        let current = make_report([-1.1, -0.5, -0.3, 1.2]);
        let comparison = current.compare(&baseline, 0.3);

        assert_eq!(comparison.baseline_type, "INTJ");
        assert_eq!(comparison.current_type, "INFJ");
        assert!(comparison.type_changed);

        let tf = &comparison.shifts[Dimension::TF.index()];
        assert!(tf.pole_flipped);
        assert!(tf.shifted);
        assert!((tf.delta + 0.7).abs() < 1e-12);
        assert_eq!(comparison.stable_count(), 3);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report([0.5, 0.5, 0.5, 0.5]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = AssessmentReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.result.type_code, report.result.type_code);
        assert_eq!(loaded.result.type_probabilities.len(), 16);
        assert_eq!(loaded.item_bank.id, "bank");
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report([-1.0, -0.6, 0.4, 1.2]);
        let current = make_report([-1.1, -0.5, -0.3, 1.2]);
        let md = current.compare(&baseline, 0.3).to_markdown();
        assert!(md.contains("INTJ → INFJ"));
        assert!(md.contains("T → F"));
        assert!(md.contains("| TF |"));
    }
}

//! Numeric helpers and parameter-recovery statistics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::Dimension;

/// Error function, Abramowitz & Stegun 7.1.26 (max error < 1.5×10⁻⁷).
fn erf(x: f64) -> f64 {
    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592 + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF Φ(z).
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_infinite() {
        return if z > 0.0 { 1.0 } else { 0.0 };
    }
    (0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Standard deviation divided by mean. `None` for empty input or zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m.abs() < f64::EPSILON {
        return None;
    }
    Some(std_dev(values)? / m)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// A true-versus-estimated theta pair from one simulated session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoverySample {
    pub dimension: Dimension,
    pub true_theta: f64,
    pub estimated_theta: f64,
    pub standard_error: f64,
    pub items_used: u32,
}

/// Recovery statistics for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRecovery {
    pub dimension: Dimension,
    pub sessions: usize,
    /// Mean of (estimate − truth).
    pub bias: f64,
    pub mean_absolute_error: f64,
    pub rmse: f64,
    pub mean_standard_error: f64,
    pub mean_items: f64,
}

/// Aggregate recovery across many simulated sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub per_dimension: HashMap<Dimension, DimensionRecovery>,
    /// Fraction of sessions whose estimated type equals the true type.
    pub type_hit_rate: f64,
}

/// Summarise recovery samples. `type_hits` counts sessions whose four-letter
/// type was recovered exactly, out of `sessions`.
pub fn compute_recovery_stats(samples: &[RecoverySample], type_hits: usize, sessions: usize) -> RecoveryStats {
    let mut grouped: HashMap<Dimension, Vec<&RecoverySample>> = HashMap::new();
    for s in samples {
        grouped.entry(s.dimension).or_default().push(s);
    }

    let per_dimension = grouped
        .into_iter()
        .map(|(dimension, group)| {
            let n = group.len() as f64;
            let errors: Vec<f64> = group
                .iter()
                .map(|s| s.estimated_theta - s.true_theta)
                .collect();
            let bias = errors.iter().sum::<f64>() / n;
            let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
            let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
            let mean_se = group.iter().map(|s| s.standard_error).sum::<f64>() / n;
            let mean_items = group.iter().map(|s| s.items_used as f64).sum::<f64>() / n;
            (
                dimension,
                DimensionRecovery {
                    dimension,
                    sessions: group.len(),
                    bias,
                    mean_absolute_error: mae,
                    rmse,
                    mean_standard_error: mean_se,
                    mean_items,
                },
            )
        })
        .collect();

    RecoveryStats {
        per_dimension,
        type_hit_rate: if sessions == 0 {
            0.0
        } else {
            type_hits as f64 / sessions as f64
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_cdf_reference_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((normal_cdf(-1.0) - 0.158_655).abs() < 1e-5);
        assert_eq!(normal_cdf(f64::INFINITY), 1.0);
        assert_eq!(normal_cdf(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn dispersion_helpers() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(std_dev(&values), Some(2.0));
        assert_eq!(coefficient_of_variation(&values), Some(0.4));
        assert_eq!(median(&values), Some(4.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(coefficient_of_variation(&[0.0, 0.0]), None);
    }

    #[test]
    fn recovery_stats_per_dimension() {
        let samples = [
            RecoverySample {
                dimension: Dimension::EI,
                true_theta: 1.0,
                estimated_theta: 1.2,
                standard_error: 0.3,
                items_used: 10,
            },
            RecoverySample {
                dimension: Dimension::EI,
                true_theta: 1.0,
                estimated_theta: 0.6,
                standard_error: 0.4,
                items_used: 12,
            },
        ];
        let stats = compute_recovery_stats(&samples, 1, 2);
        let ei = &stats.per_dimension[&Dimension::EI];
        assert!((ei.bias - (-0.1)).abs() < 1e-12);
        assert!((ei.mean_absolute_error - 0.3).abs() < 1e-12);
        assert!((ei.mean_items - 11.0).abs() < 1e-12);
        assert_eq!(stats.type_hit_rate, 0.5);
        assert!(!stats.per_dimension.contains_key(&Dimension::JP));
    }
}

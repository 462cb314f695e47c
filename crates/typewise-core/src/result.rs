//! Final scoring: pole preferences, clarity, type probabilities and the
//! cognitive-function stack.
//!
//! Everything here is a pure function of the final estimates, the response
//! history and the validity verdict. Calling it twice yields identical output.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cognitive::{all_types, stack_for, CognitiveFunction, StackRole};
use crate::model::{Dimension, DimensionMap, Pole};
use crate::session::{AdaptiveResponse, DimensionProgress};
use crate::statistics::normal_cdf;
use crate::validity::{AssessmentValidity, ValidityFlag};

/// How strongly a respondent favours one pole, banded on |θ|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clarity {
    Slight,
    Moderate,
    Clear,
    VeryClear,
}

impl Clarity {
    pub fn from_theta(theta: f64) -> Self {
        let magnitude = theta.abs();
        if magnitude < 0.5 {
            Clarity::Slight
        } else if magnitude < 1.0 {
            Clarity::Moderate
        } else if magnitude < 1.5 {
            Clarity::Clear
        } else {
            Clarity::VeryClear
        }
    }
}

impl fmt::Display for Clarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clarity::Slight => write!(f, "slight"),
            Clarity::Moderate => write!(f, "moderate"),
            Clarity::Clear => write!(f, "clear"),
            Clarity::VeryClear => write!(f, "very clear"),
        }
    }
}

/// Scored outcome for one dichotomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub dimension: Dimension,
    pub theta: f64,
    pub standard_error: f64,
    pub preferred_pole: Pole,
    pub clarity: Clarity,
    /// Reliability of the estimate, 1 − SE², in [0, 1].
    pub confidence: f64,
    /// Posterior probability (normal approximation) that θ > 0.
    pub first_pole_probability: f64,
    pub items_administered: u32,
}

impl DimensionResult {
    pub fn from_progress(dimension: Dimension, progress: &DimensionProgress) -> Self {
        let theta = progress.estimate.theta;
        let se = progress.estimate.standard_error;
        let preferred_pole = if theta >= 0.0 {
            dimension.first_pole()
        } else {
            dimension.second_pole()
        };
        let first_pole_probability = if se > 0.0 {
            normal_cdf(theta / se)
        } else if theta >= 0.0 {
            1.0
        } else {
            0.0
        };
        Self {
            dimension,
            theta,
            standard_error: se,
            preferred_pole,
            clarity: Clarity::from_theta(theta),
            confidence: (1.0 - se * se).clamp(0.0, 1.0),
            first_pole_probability,
            items_administered: progress.items_administered,
        }
    }

    /// Probability mass on `pole`, which must belong to this dimension.
    pub fn pole_probability(&self, pole: Pole) -> f64 {
        if pole.is_first() {
            self.first_pole_probability
        } else {
            1.0 - self.first_pole_probability
        }
    }
}

/// Probability of one of the 16 types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeProbability {
    pub type_code: String,
    pub probability: f64,
}

/// One entry of the respondent's cognitive stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveFunctionScore {
    pub function: CognitiveFunction,
    pub role: StackRole,
    /// Role-weighted strength summed over the type distribution, in [0, 1].
    pub score: f64,
}

/// The complete scored assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub session_id: Uuid,
    pub type_code: String,
    pub dimensions: Vec<DimensionResult>,
    /// All 16 types, most probable first.
    pub type_probabilities: Vec<TypeProbability>,
    pub cognitive_stack: Vec<CognitiveFunctionScore>,
    /// Minimum of the per-dimension confidences.
    pub overall_confidence: f64,
    pub total_items: u32,
    pub started_at: DateTime<Utc>,
    /// Timestamp of the last response, if any.
    pub last_response_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub validity: AssessmentValidity,
}

impl AssessmentResult {
    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionResult> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }

    pub fn top_types(&self, n: usize) -> &[TypeProbability] {
        &self.type_probabilities[..n.min(self.type_probabilities.len())]
    }
}

/// A non-fatal caveat attached to a finalised assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentWarning {
    /// The bank ran out before the precision target was met.
    InsufficientItems {
        dimension: Dimension,
        standard_error: f64,
        threshold: f64,
    },
    /// A validity check raised a flag.
    ValiditySuspect { flag: ValidityFlag },
    /// The estimate sits on the edge of the integration grid.
    BoundaryEstimate { dimension: Dimension, theta: f64 },
    /// Finalised while dimensions were still below target.
    Incomplete { dimension: Dimension, items_administered: u32 },
}

impl fmt::Display for AssessmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentWarning::InsufficientItems {
                dimension,
                standard_error,
                threshold,
            } => write!(
                f,
                "{dimension}: item bank exhausted at SE {standard_error:.3} (target {threshold:.3}); uncertainty is wider than intended"
            ),
            AssessmentWarning::ValiditySuspect { flag } => {
                write!(f, "validity: {}", flag.description())
            }
            AssessmentWarning::BoundaryEstimate { dimension, theta } => write!(
                f,
                "{dimension}: estimate {theta:.2} is at the edge of the measurable range"
            ),
            AssessmentWarning::Incomplete {
                dimension,
                items_administered,
            } => write!(
                f,
                "{dimension}: finalised after {items_administered} item(s) before reaching a stopping rule"
            ),
        }
    }
}

/// Compose per-dimension poles into a four-letter type string.
pub fn compose_type(dimensions: &[DimensionResult]) -> String {
    Dimension::ALL
        .iter()
        .map(|d| {
            dimensions
                .iter()
                .find(|r| r.dimension == *d)
                .map(|r| r.preferred_pole.letter())
                .unwrap_or_else(|| d.first_pole().letter())
        })
        .collect()
}

/// Probability of each of the 16 types, treating dimensions as independent.
/// Normalised to sum to 1 and sorted descending, ties by type code.
pub fn type_distribution(dimensions: &[DimensionResult]) -> Vec<TypeProbability> {
    let mut probabilities: Vec<TypeProbability> = all_types()
        .map(|code| {
            let probability = code
                .chars()
                .filter_map(|letter| letter.to_string().parse::<Pole>().ok())
                .map(|pole| {
                    dimensions
                        .iter()
                        .find(|r| r.dimension == pole.dimension())
                        .map(|r| r.pole_probability(pole))
                        .unwrap_or(0.5)
                })
                .product::<f64>();
            TypeProbability {
                type_code: code.to_string(),
                probability,
            }
        })
        .collect();

    let total: f64 = probabilities.iter().map(|t| t.probability).sum();
    if total > 0.0 {
        for t in &mut probabilities {
            t.probability /= total;
        }
    } else {
        let uniform = 1.0 / probabilities.len() as f64;
        for t in &mut probabilities {
            t.probability = uniform;
        }
    }

    probabilities.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.type_code.cmp(&b.type_code))
    });
    probabilities
}

/// Score the stack of `type_code`: each function's role weights summed over
/// the type distribution.
pub fn cognitive_stack(type_code: &str, distribution: &[TypeProbability]) -> Vec<CognitiveFunctionScore> {
    let Some(stack) = stack_for(type_code) else {
        return Vec::new();
    };

    let strength = |function: CognitiveFunction| -> f64 {
        distribution
            .iter()
            .filter_map(|t| {
                let other = stack_for(&t.type_code)?;
                let position = other.iter().position(|f| *f == function)?;
                Some(t.probability * StackRole::ALL[position].weight())
            })
            .sum()
    };

    stack
        .iter()
        .zip(StackRole::ALL)
        .map(|(function, role)| CognitiveFunctionScore {
            function: *function,
            role,
            score: strength(*function),
        })
        .collect()
}

/// Build the full result from final per-dimension progress.
pub fn calculate_result(
    session_id: Uuid,
    progress: &DimensionMap<DimensionProgress>,
    responses: &[AdaptiveResponse],
    validity: AssessmentValidity,
    started_at: DateTime<Utc>,
) -> AssessmentResult {
    let dimensions: Vec<DimensionResult> = progress
        .iter()
        .map(|(dimension, p)| DimensionResult::from_progress(dimension, p))
        .collect();

    let type_code = compose_type(&dimensions);
    let type_probabilities = type_distribution(&dimensions);
    let cognitive_stack = cognitive_stack(&type_code, &type_probabilities);

    let overall_confidence = dimensions
        .iter()
        .map(|d| d.confidence)
        .fold(f64::INFINITY, f64::min)
        .min(1.0);

    let last_response_at = responses.iter().map(|r| r.answered_at).max();
    let duration_secs = last_response_at.map(|end| (end - started_at).num_seconds().max(0));

    AssessmentResult {
        session_id,
        type_code,
        dimensions,
        type_probabilities,
        cognitive_stack,
        overall_confidence,
        total_items: responses.len() as u32,
        started_at,
        last_response_at,
        duration_secs,
        validity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::ThetaEstimate;

    fn progress(theta: f64, se: f64) -> DimensionProgress {
        DimensionProgress {
            estimate: ThetaEstimate {
                theta,
                standard_error: se,
                information: 1.0 / (se * se) - 1.0,
            },
            items_administered: 10,
        }
    }

    /// EI = I (clear), SN = N (moderate), TF = T (slight), JP = J (very clear).
    fn intj_progress() -> DimensionMap<DimensionProgress> {
        DimensionMap {
            ei: progress(-1.2, 0.3),
            sn: progress(-0.7, 0.3),
            tf: progress(0.2, 0.3),
            jp: progress(1.8, 0.3),
        }
    }

    #[test]
    fn clarity_bands() {
        assert_eq!(Clarity::from_theta(0.0), Clarity::Slight);
        assert_eq!(Clarity::from_theta(-0.49), Clarity::Slight);
        assert_eq!(Clarity::from_theta(0.5), Clarity::Moderate);
        assert_eq!(Clarity::from_theta(-1.2), Clarity::Clear);
        assert_eq!(Clarity::from_theta(1.5), Clarity::VeryClear);
    }

    #[test]
    fn intj_composition_and_stack() {
        let result = calculate_result(
            Uuid::nil(),
            &intj_progress(),
            &[],
            AssessmentValidity::default(),
            Utc::now(),
        );
        let clarities: Vec<_> = result.dimensions.iter().map(|d| d.clarity).collect();
        assert_eq!(
            clarities,
            vec![Clarity::Clear, Clarity::Moderate, Clarity::Slight, Clarity::VeryClear]
        );
        assert_eq!(result.type_code, "INTJ");
        let stack: Vec<_> = result
            .cognitive_stack
            .iter()
            .map(|s| (s.function, s.role))
            .collect();
        assert_eq!(
            stack,
            vec![
                (CognitiveFunction::Ni, StackRole::Dominant),
                (CognitiveFunction::Te, StackRole::Auxiliary),
                (CognitiveFunction::Fi, StackRole::Tertiary),
                (CognitiveFunction::Se, StackRole::Inferior),
            ]
        );
    }

    #[test]
    fn type_distribution_sums_to_one_and_ranks_the_type_first() {
        let dims: Vec<_> = intj_progress()
            .iter()
            .map(|(d, p)| DimensionResult::from_progress(d, p))
            .collect();
        let dist = type_distribution(&dims);
        assert_eq!(dist.len(), 16);
        let total: f64 = dist.iter().map(|t| t.probability).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(dist[0].type_code, "INTJ");
        // TF is the least certain dimension, so INFJ is the runner-up.
        assert_eq!(dist[1].type_code, "INFJ");
    }

    #[test]
    fn neutral_estimates_spread_probability_evenly() {
        let neutral = DimensionMap::from_fn(|_| DimensionProgress::default());
        let result = calculate_result(Uuid::nil(), &neutral, &[], AssessmentValidity::default(), Utc::now());
        assert_eq!(result.type_code, "ESTJ");
        for t in &result.type_probabilities {
            assert!((t.probability - 1.0 / 16.0).abs() < 1e-6);
        }
        assert_eq!(result.overall_confidence, 0.0);
    }

    #[test]
    fn confidence_is_reliability_and_overall_is_minimum() {
        let mut p = intj_progress();
        p.tf = progress(0.2, 0.5);
        let result = calculate_result(Uuid::nil(), &p, &[], AssessmentValidity::default(), Utc::now());
        let tf = result.dimension(Dimension::TF).unwrap();
        assert!((tf.confidence - 0.75).abs() < 1e-12);
        assert!((result.overall_confidence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn stack_scores_favour_the_dominant_function() {
        let result = calculate_result(
            Uuid::nil(),
            &intj_progress(),
            &[],
            AssessmentValidity::default(),
            Utc::now(),
        );
        let scores: Vec<f64> = result.cognitive_stack.iter().map(|s| s.score).collect();
        assert!(scores[0] > scores[3]);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn warning_display_mentions_dimension() {
        let w = AssessmentWarning::InsufficientItems {
            dimension: Dimension::JP,
            standard_error: 0.41,
            threshold: 0.35,
        };
        assert!(w.to_string().starts_with("JP:"));
    }
}

//! Seeded respondent simulation for parameter-recovery checks.
//!
//! Randomness comes only from the `Rng` the caller passes in, so a fixed
//! seed reproduces a run exactly. Production scoring never touches this
//! module.

use chrono::Duration;
use rand::Rng;

use crate::engine::{administered_ids, AdaptiveEngine, FinalizedAssessment, ResponseSubmission};
use crate::error::EngineError;
use crate::irt::item_probability;
use crate::model::{Dimension, DimensionMap, ItemBank, PsychometricItem, ResponseChoice};
use crate::session::{AdaptiveResponse, AdaptiveSession};
use crate::statistics::{compute_recovery_stats, RecoverySample, RecoveryStats};

/// Uniform response latency between `min_ms` and `max_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyModel {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for LatencyModel {
    fn default() -> Self {
        Self {
            min_ms: 1_500,
            max_ms: 6_000,
        }
    }
}

impl LatencyModel {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        if self.max_ms <= self.min_ms {
            self.min_ms
        } else {
            rng.gen_range(self.min_ms..=self.max_ms)
        }
    }
}

/// A synthetic respondent who answers according to the 2PL model at fixed
/// true trait levels.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedRespondent {
    pub true_theta: DimensionMap<f64>,
    pub latency: LatencyModel,
}

impl SimulatedRespondent {
    pub fn new(true_theta: DimensionMap<f64>) -> Self {
        Self {
            true_theta,
            latency: LatencyModel::default(),
        }
    }

    /// A respondent with every true theta drawn uniformly from `[-spread, spread]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, spread: f64) -> Self {
        let spread = spread.abs().max(f64::EPSILON);
        Self::new(DimensionMap::from_fn(|_| rng.gen_range(-spread..=spread)))
    }

    pub fn with_latency(mut self, latency: LatencyModel) -> Self {
        self.latency = latency;
        self
    }

    /// The type implied by the true thetas.
    pub fn true_type(&self) -> String {
        Dimension::ALL
            .iter()
            .map(|d| {
                if *self.true_theta.get(*d) >= 0.0 {
                    d.first_pole().letter()
                } else {
                    d.second_pole().letter()
                }
            })
            .collect()
    }

    /// Draw an answer to `item`.
    pub fn answer<R: Rng + ?Sized>(&self, item: &PsychometricItem, rng: &mut R) -> ResponseChoice {
        let p_first = item_probability(item, *self.true_theta.get(item.dimension));
        let endorses_first = rng.gen::<f64>() < p_first;
        if endorses_first == item.option_a_pole.is_first() {
            ResponseChoice::A
        } else {
            ResponseChoice::B
        }
    }
}

/// Everything produced by one simulated session.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub respondent: SimulatedRespondent,
    pub session: AdaptiveSession,
    pub responses: Vec<AdaptiveResponse>,
    pub finalized: FinalizedAssessment,
}

impl SimulationOutcome {
    /// Estimated minus true theta.
    pub fn error(&self, dimension: Dimension) -> f64 {
        self.session.estimate(dimension).theta - self.respondent.true_theta.get(dimension)
    }

    pub fn type_recovered(&self) -> bool {
        self.finalized.result.type_code == self.respondent.true_type()
    }

    pub fn samples(&self) -> impl Iterator<Item = RecoverySample> + '_ {
        Dimension::ALL.into_iter().map(|dimension| {
            let estimate = self.session.estimate(dimension);
            RecoverySample {
                dimension,
                true_theta: *self.respondent.true_theta.get(dimension),
                estimated_theta: estimate.theta,
                standard_error: estimate.standard_error,
                items_used: self.session.items_administered(dimension),
            }
        })
    }
}

/// Drive one complete session through the public engine API.
pub fn run_simulated_session<R: Rng + ?Sized>(
    engine: &AdaptiveEngine,
    bank: &ItemBank,
    respondent: &SimulatedRespondent,
    rng: &mut R,
) -> Result<SimulationOutcome, EngineError> {
    let mut session = engine.initialize_session("simulated", "simulation");
    let mut responses: Vec<AdaptiveResponse> = Vec::new();
    let mut administered = administered_ids(&responses);
    let mut clock = session.started_at;

    while let Some((item, dimension)) = engine.next_item(&session, bank, &administered) {
        let choice = respondent.answer(item, rng);
        let latency_ms = respondent.latency.sample(rng);
        clock += Duration::milliseconds(latency_ms as i64);

        let processed = engine.process_response(
            &session,
            bank,
            ResponseSubmission {
                item_id: item.id.clone(),
                dimension,
                choice,
                latency_ms,
                answered_at: clock,
            },
            &responses,
        )?;
        administered.insert(item.id.clone());
        responses.push(processed.response);
        session = processed.session;
    }

    let finalized = engine.finalize(&session, &responses, bank)?;
    let session = session.complete(finalized.result.validity.clone(), clock)?;

    Ok(SimulationOutcome {
        respondent: respondent.clone(),
        session,
        responses,
        finalized,
    })
}

/// Aggregate recovery statistics over many outcomes.
pub fn summarize(outcomes: &[SimulationOutcome]) -> RecoveryStats {
    let samples: Vec<RecoverySample> = outcomes.iter().flat_map(|o| o.samples()).collect();
    let hits = outcomes.iter().filter(|o| o.type_recovered()).count();
    compute_recovery_stats(&samples, hits, outcomes.len())
}

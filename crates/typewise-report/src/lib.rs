//! Rendering of finished assessments into human-readable reports.

pub mod html;
pub mod markdown;

#[cfg(test)]
pub(crate) mod test_support {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use typewise_core::engine::AdaptiveEngine;
    use typewise_core::model::{Dimension, DimensionMap, ItemBank, PsychometricItem};
    use typewise_core::report::AssessmentReport;
    use typewise_core::simulation::{run_simulated_session, LatencyModel, SimulatedRespondent};

    fn bank() -> ItemBank {
        let items = Dimension::ALL
            .into_iter()
            .flat_map(|dimension| {
                (0..10).map(move |i| PsychometricItem {
                    id: format!("{}-{i}", dimension.to_string().to_lowercase()),
                    dimension,
                    discrimination: 1.3 + 0.05 * i as f64,
                    difficulty: -2.0 + 0.45 * i as f64,
                    option_a: format!("{} statement {i}", dimension.first_pole()),
                    option_b: format!("{} statement {i}", dimension.second_pole()),
                    option_a_pole: dimension.first_pole(),
                    desirable_pole: None,
                })
            })
            .collect();
        ItemBank {
            id: "report-test".into(),
            name: "Bank <script>alert(1)</script>".into(),
            description: String::new(),
            items,
        }
    }

    /// A report from a simulated respondent who answers far too quickly.
    pub fn make_test_report() -> AssessmentReport {
        let bank = bank();
        let engine = AdaptiveEngine::default();
        let respondent = SimulatedRespondent::new(DimensionMap {
            ei: -1.2,
            sn: -0.8,
            tf: 1.0,
            jp: 0.6,
        })
        .with_latency(LatencyModel {
            min_ms: 100,
            max_ms: 200,
        });
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = run_simulated_session(&engine, &bank, &respondent, &mut rng).unwrap();
        AssessmentReport::new(outcome.session, outcome.finalized, outcome.responses, &bank)
    }
}

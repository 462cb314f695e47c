//! The `typewise simulate` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Semaphore;

use typewise_core::engine::AdaptiveEngine;
use typewise_core::model::{Dimension, DimensionMap};
use typewise_core::simulation::{run_simulated_session, summarize, SimulatedRespondent, SimulationOutcome};
use typewise_core::statistics::RecoveryStats;
use typewise_core::traits::ItemBankProvider;
use typewise_store::bank::TomlItemBankProvider;
use typewise_store::config::load_config_from;

use super::resolve_item_bank;

pub async fn execute(
    item_bank: Option<PathBuf>,
    sessions: usize,
    seed: u64,
    parallelism: Option<usize>,
    theta: Option<String>,
    spread: f64,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(sessions >= 1, "sessions must be at least 1");
    anyhow::ensure!(spread > 0.0, "spread must be positive");

    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let bank_path = resolve_item_bank(item_bank, &config)?;
    let bank = Arc::new(TomlItemBankProvider::new(&bank_path).load_bank().await?);
    let engine = Arc::new(AdaptiveEngine::new(config.engine.clone()));
    let fixed_theta = theta.as_deref().map(parse_thetas).transpose()?;

    eprintln!(
        "typewise v{}: simulating {sessions} sessions on '{}' ({} items, parallelism {parallelism})",
        env!("CARGO_PKG_VERSION"),
        bank.name,
        bank.items.len()
    );

    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut futures = FuturesUnordered::new();

    for index in 0..sessions {
        let semaphore = Arc::clone(&semaphore);
        let engine = Arc::clone(&engine);
        let bank = Arc::clone(&bank);

        futures.push(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| anyhow::anyhow!("semaphore closed"))?;

            let outcome = tokio::task::spawn_blocking(move || {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                let respondent = match fixed_theta {
                    Some(theta) => SimulatedRespondent::new(theta),
                    None => SimulatedRespondent::random(&mut rng, spread),
                };
                run_simulated_session(&engine, &bank, &respondent, &mut rng)
            })
            .await
            .context("simulation task panicked")??;

            Ok::<_, anyhow::Error>((index, outcome))
        });
    }

    let mut outcomes: Vec<(usize, SimulationOutcome)> = Vec::with_capacity(sessions);
    while let Some(result) = futures.next().await {
        outcomes.push(result?);
    }
    outcomes.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<SimulationOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();

    let stats = summarize(&outcomes);
    print_summary(&stats);

    let invalid = outcomes.iter().filter(|o| !o.finalized.is_valid).count();
    let total_items: u32 = outcomes.iter().map(|o| o.finalized.result.total_items).sum();
    println!(
        "Type recovered in {:.1}% of sessions; {:.1} items per session on average; {invalid} flagged invalid",
        stats.type_hit_rate * 100.0,
        total_items as f64 / outcomes.len() as f64
    );
    eprintln!("Completed in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

/// Parse "EI,SN,TF,JP" true thetas.
fn parse_thetas(raw: &str) -> Result<DimensionMap<f64>> {
    let values = raw
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("invalid theta value: '{}'", s.trim()))
        })
        .collect::<Result<Vec<_>>>()?;
    let &[ei, sn, tf, jp] = values.as_slice() else {
        anyhow::bail!("--theta needs four comma-separated values (EI,SN,TF,JP), got {}", values.len());
    };
    Ok(DimensionMap { ei, sn, tf, jp })
}

fn print_summary(stats: &RecoveryStats) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Dimension",
        "Sessions",
        "Bias",
        "MAE",
        "RMSE",
        "Mean SE",
        "Mean items",
    ]);

    for dimension in Dimension::ALL {
        let Some(d) = stats.per_dimension.get(&dimension) else {
            continue;
        };
        table.add_row(vec![
            Cell::new(dimension),
            Cell::new(d.sessions),
            Cell::new(format!("{:+.3}", d.bias)),
            Cell::new(format!("{:.3}", d.mean_absolute_error)),
            Cell::new(format!("{:.3}", d.rmse)),
            Cell::new(format!("{:.3}", d.mean_standard_error)),
            Cell::new(format!("{:.1}", d.mean_items)),
        ]);
    }

    println!("{table}");
}

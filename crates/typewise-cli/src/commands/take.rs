//! The `typewise take` command: a console presentation layer over
//! [`AssessmentService`].

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};

use typewise_core::engine::AdaptiveEngine;
use typewise_core::error::EngineError;
use typewise_core::parser::validate_item_bank;
use typewise_core::report::AssessmentReport;
use typewise_core::result::AssessmentResult;
use typewise_core::service::AssessmentService;
use typewise_store::bank::TomlItemBankProvider;
use typewise_store::config::{create_store, load_config_from};

use super::resolve_item_bank;

pub async fn execute(
    item_bank: Option<PathBuf>,
    user: String,
    tenant: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank_path = resolve_item_bank(item_bank, &config)?;
    let repository = create_store(&config.store)?;
    let provider = TomlItemBankProvider::new(&bank_path);
    let service = AssessmentService::from_provider(
        AdaptiveEngine::new(config.engine.clone()),
        repository,
        &provider,
    )
    .await?;

    let bank_warnings = validate_item_bank(service.bank());
    if !bank_warnings.is_empty() {
        eprintln!(
            "Warning: item bank has {} validation warning(s); run `typewise validate` for details",
            bank_warnings.len()
        );
    }

    let session = service.start(&user, &tenant).await?;
    let session_id = session.id;
    println!("{}", service.bank().name);
    println!("For each pair, choose the statement that fits you better: A or B (q to quit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(question) = service.next_question(session_id).await? {
        println!("\n{}.", question.position);
        println!("  A) {}", question.option_a);
        println!("  B) {}", question.option_b);
        let shown = Instant::now();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                service.abandon(session_id, Utc::now()).await?;
                anyhow::bail!("input ended before the assessment was complete; session {session_id} abandoned");
            };
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                service.abandon(session_id, Utc::now()).await?;
                println!("Assessment abandoned.");
                return Ok(());
            }

            let latency_ms = shown.elapsed().as_millis() as u64;
            match service
                .answer(session_id, &question.item_id, line, latency_ms, Utc::now())
                .await
            {
                Ok(_) => break,
                Err(e) if e.downcast_ref::<EngineError>().is_some_and(EngineError::is_recoverable) => {
                    println!("{e}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    let finalized = service.finish(session_id).await?;
    let session = service.session(session_id).await?;
    let responses = service.responses(session_id).await?;
    let report = AssessmentReport::new(session, finalized, responses, service.bank());

    print_result(&report.result);
    for w in &report.warnings {
        println!("Note: {w}");
    }

    let output = output.unwrap_or(config.output_dir);
    let path = output.join(format!("assessment-{session_id}.json"));
    report.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}

fn print_result(result: &AssessmentResult) {
    use comfy_table::{Cell, Table};

    println!("\nYour type: {}", result.type_code);
    println!(
        "Overall confidence: {:.0}% ({} items)",
        result.overall_confidence * 100.0,
        result.total_items
    );

    let mut table = Table::new();
    table.set_header(vec!["Dimension", "Preference", "Clarity", "θ", "SE"]);
    for d in &result.dimensions {
        table.add_row(vec![
            Cell::new(d.dimension),
            Cell::new(format!(
                "{} ({:.0}%)",
                d.preferred_pole,
                d.pole_probability(d.preferred_pole) * 100.0
            )),
            Cell::new(d.clarity),
            Cell::new(format!("{:+.2}", d.theta)),
            Cell::new(format!("{:.2}", d.standard_error)),
        ]);
    }
    println!("{table}");

    if let Some(runner_up) = result.type_probabilities.get(1) {
        println!(
            "Next most likely: {} ({:.1}%)",
            runner_up.type_code,
            runner_up.probability * 100.0
        );
    }
}

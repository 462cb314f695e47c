//! typewise CLI: take, simulate and report adaptive type assessments.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "typewise", version, about = "Adaptive IRT personality-type assessment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an assessment interactively on the console
    Take {
        /// Item bank TOML file (defaults to `item_bank` in the config)
        #[arg(long)]
        item_bank: Option<PathBuf>,

        /// Respondent identifier
        #[arg(long, default_value = "local")]
        user: String,

        /// Tenant identifier
        #[arg(long, default_value = "default")]
        tenant: String,

        /// Output directory for the JSON report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run simulated respondents and report how well traits are recovered
    Simulate {
        /// Item bank TOML file (defaults to `item_bank` in the config)
        #[arg(long)]
        item_bank: Option<PathBuf>,

        /// Number of simulated sessions
        #[arg(long, default_value = "100")]
        sessions: usize,

        /// Base RNG seed; session i uses seed + i
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Max concurrent sessions (defaults to `parallelism` in the config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Fixed true thetas as "EI,SN,TF,JP" (random per session if omitted)
        #[arg(long)]
        theta: Option<String>,

        /// Spread of randomly drawn true thetas
        #[arg(long, default_value = "1.0")]
        spread: f64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a saved assessment report
    Report {
        /// Report JSON written by `typewise take`
        #[arg(long)]
        input: PathBuf,

        /// Output format: html, markdown, json
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare a retest against a baseline assessment
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Theta shift above which a dimension counts as changed
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Exit code 1 if the type changed
        #[arg(long)]
        fail_on_change: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        item_bank: PathBuf,

        /// Minimum items expected per dimension
        #[arg(long, default_value = "6")]
        min_items: usize,
    },

    /// Create starter config and example item bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("typewise=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            item_bank,
            user,
            tenant,
            output,
            config,
        } => commands::take::execute(item_bank, user, tenant, output, config).await,
        Commands::Simulate {
            item_bank,
            sessions,
            seed,
            parallelism,
            theta,
            spread,
            config,
        } => {
            commands::simulate::execute(
                item_bank,
                sessions,
                seed,
                parallelism,
                theta,
                spread,
                config,
            )
            .await
        }
        Commands::Report {
            input,
            format,
            output,
        } => commands::report::execute(input, format, output),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_change,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_change, format),
        Commands::Validate {
            item_bank,
            min_items,
        } => commands::validate::execute(item_bank, min_items),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

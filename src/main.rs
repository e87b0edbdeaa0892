//! stanceflow - drive persona stances from the command line
//!
//! Usage:
//!   stanceflow new --out conv.json                 → create a conversation
//!   stanceflow apply conv.json '{"frame":"poetic"}' → apply a delta
//!   stanceflow diff a.json b.json                  → structural diff
//!   stanceflow decay conv.json --hours 48          → decay projection
//!   stanceflow rollback history.json --steps 2     → roll a history back
//!   stanceflow dump-config                         → effective config as TOML

use clap::{Parser, Subcommand};
use serde::Serialize;
use stanceflow::{StanceflowConfig, Workspace};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "stanceflow",
    about = "Persona stance controller with drift budgets, decay, diff, and rollback",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML)
    #[arg(long, global = true, default_value = "stanceflow.toml")]
    config: PathBuf,

    /// Conversation store directory
    #[arg(long, global = true, default_value = ".stanceflow")]
    store: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a conversation from the configured mode
    New {
        /// Write the conversation here instead of the store
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Apply a stance delta to a conversation
    Apply {
        /// Conversation file or stored conversation id
        conversation: String,
        /// Delta as inline JSON or a path to a JSON file
        delta: String,
        /// Commit the resulting stance to this history file
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Checkpoint message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Diff two stance or conversation files
    Diff { left: PathBuf, right: PathBuf },
    /// Project a stance forward in time and report decay risk
    Decay {
        stance: PathBuf,
        /// Hours to project ahead
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
    },
    /// Roll a history file back along its current branch
    Rollback {
        history: PathBuf,
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
    /// Print the effective configuration as TOML
    DumpConfig,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = StanceflowConfig::load(&cli.config);

    match cli.command {
        Commands::Version => {
            println!("stanceflow v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::DumpConfig => {
            print!("{}", config.to_toml());
        }
        command => {
            let workspace = Workspace::open(config, &cli.store)?;
            run(&workspace, command)?;
        }
    }

    Ok(())
}

fn run(workspace: &Workspace, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::New { out } => {
            let (conversation, path) = workspace.new_conversation(out.as_deref())?;
            println!("{}", conversation.id);
            tracing::info!("Wrote {}", path.display());
        }
        Commands::Apply {
            conversation,
            delta,
            checkpoint,
            message,
        } => {
            let outcome = workspace.apply(
                &conversation,
                &delta,
                checkpoint.as_deref(),
                message.as_deref(),
            )?;
            tracing::info!("Saved {}", outcome.saved_to.display());
            print_json(&outcome)?;
        }
        Commands::Diff { left, right } => print_json(&workspace.diff(&left, &right)?)?,
        Commands::Decay { stance, hours } => print_json(&workspace.decay(&stance, hours)?)?,
        Commands::Rollback { history, steps } => {
            print_json(&workspace.rollback(&history, steps)?)?
        }
        Commands::DumpConfig | Commands::Version => {}
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stanceflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

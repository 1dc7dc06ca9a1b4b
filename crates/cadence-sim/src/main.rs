mod cmd;
mod output;
mod plant;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cmd::config::ConfigSubcommand;

#[derive(Parser)]
#[command(
    name = "cadence",
    about = "Tick-loop simulator for the behavior arbitration core — run routines, inspect bindings and field geometry",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (defaults are used when the file does not exist)
    #[arg(long, global = true, env = "CADENCE_CONFIG", default_value = "cadence.yaml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an autonomous routine against a first-order plant
    Run {
        /// Routine: center, left, or right
        #[arg(long, default_value = "center")]
        routine: String,

        /// Alliance: blue or red (omit to exercise the assumed-blue path)
        #[arg(long)]
        alliance: Option<String>,

        /// Simulated wall-clock limit in seconds
        #[arg(long, default_value = "30.0")]
        max_s: f64,

        /// Drop the game-piece sensor for the whole run
        #[arg(long)]
        drop_piece_sensor: bool,
    },

    /// List the available autonomous routines
    Routines,

    /// Print every reef waypoint pose for an alliance
    Field {
        /// Alliance: blue or red
        #[arg(long, default_value = "blue")]
        alliance: String,
    },

    /// Print the standard binding table
    Bindings,

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            routine,
            alliance,
            max_s,
            drop_piece_sensor,
        } => cmd::run::run(
            &cli.config,
            &routine,
            alliance.as_deref(),
            max_s,
            drop_piece_sensor,
            cli.json,
        ),
        Commands::Routines => cmd::routines::run(cli.json),
        Commands::Field { alliance } => cmd::field::run(&cli.config, &alliance, cli.json),
        Commands::Bindings => cmd::bindings::run(&cli.config, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&cli.config, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

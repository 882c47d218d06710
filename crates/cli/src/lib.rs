pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::analyze::Screen;

#[derive(Debug, Parser)]
#[command(
    name = "valvey",
    about = "Valve procurement pricing CLI",
    long_about = "Run contract-price recommendation, quote assessment and market-lag analysis \
                  over a directory of JSON tables, and inspect runtime readiness.",
    after_help = "Examples:\n  valvey recommend --data-dir data\n  valvey market-lag\n  \
                  valvey doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend a contract price for each ordered valve type")]
    Recommend {
        #[arg(long, help = "Directory holding the JSON tables (overrides data.dir)")]
        data_dir: Option<PathBuf>,
    },
    #[command(about = "Assess vendor quotes against contract and historical prices")]
    Assess {
        #[arg(long, help = "Directory holding the JSON tables (overrides data.dir)")]
        data_dir: Option<PathBuf>,
    },
    #[command(about = "Correlate vendor prices with lagged copper/tin prices")]
    MarketLag {
        #[arg(long, help = "Directory holding the JSON tables (overrides data.dir)")]
        data_dir: Option<PathBuf>,
    },
    #[command(about = "Write the demo dataset into the data directory")]
    Seed {
        #[arg(long, help = "Target directory (overrides data.dir)")]
        data_dir: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, data tables and narrative readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Recommend { data_dir } => commands::analyze::run(Screen::Recommend, data_dir),
        Command::Assess { data_dir } => commands::analyze::run(Screen::Assess, data_dir),
        Command::MarketLag { data_dir } => commands::analyze::run(Screen::MarketLag, data_dir),
        Command::Seed { data_dir } => commands::seed::run(data_dir),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

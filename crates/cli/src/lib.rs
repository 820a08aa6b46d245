pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use homeworth_core::pricing::PredictionInput;

#[derive(Debug, Parser)]
#[command(
    name = "homeworth",
    about = "Homeworth house-price assistant CLI",
    long_about = "Chat with the house-price assistant locally, run one-shot estimates, inspect configuration, and check runtime readiness.",
    after_help = "Examples:\n  homeworth chat\n  homeworth predict --area 30x50 --bedrooms 3 --full-bath 2 --bsmt-full-bath 1 --bsmt-half-bath 0 --half-bath 1\n  homeworth doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation on stdin/stdout")]
    Chat,
    #[command(about = "Estimate a price directly from the six model features")]
    Predict {
        #[arg(long, value_parser = parse_area_arg, help = "Living area as square feet or WIDTHxLENGTH")]
        area: u64,
        #[arg(long)]
        bedrooms: u32,
        #[arg(long)]
        full_bath: u32,
        #[arg(long, default_value_t = 0)]
        bsmt_full_bath: u32,
        #[arg(long, default_value_t = 0)]
        bsmt_half_bath: u32,
        #[arg(long, default_value_t = 0)]
        half_bath: u32,
    },
    #[command(about = "Apply pending session-store migrations")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, price model, and session store readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn parse_area_arg(value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .or_else(|| homeworth_core::flows::parse_area(&value.to_ascii_lowercase()))
        .ok_or_else(|| format!("`{value}` is neither a square footage nor WIDTHxLENGTH"))
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat => commands::chat::run(),
        Command::Predict {
            area,
            bedrooms,
            full_bath,
            bsmt_full_bath,
            bsmt_half_bath,
            half_bath,
        } => commands::predict::run(PredictionInput {
            gr_liv_area: area,
            bedroom_abv_gr: bedrooms,
            full_bath,
            bsmt_full_bath,
            bsmt_half_bath,
            half_bath,
        }),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

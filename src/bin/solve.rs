//! One-shot solve of a demo preset.
//!
//! Run with: cargo run --release --bin solve -- [preset] [time-limit-seconds]

use facility_location::demo_data::{available_datasets, generate_by_name};
use facility_location::solver::{solve_instance, HighsBackend, SolverConfig};
use facility_location::console;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("facility_location=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let preset = args.next().unwrap_or_else(|| "default".to_string());

    let mut config = SolverConfig::default();
    if let Some(arg) = args.next() {
        match arg.parse::<f64>().ok().and_then(SolverConfig::with_time_limit_secs) {
            Some(parsed) => config = parsed,
            None => {
                eprintln!("invalid time limit '{}': expected positive seconds", arg);
                return ExitCode::FAILURE;
            }
        }
    }

    let instance = match generate_by_name(&preset) {
        Some(Ok(instance)) => instance,
        Some(Err(err)) => {
            eprintln!("failed to generate '{}': {}", preset, err);
            return ExitCode::FAILURE;
        }
        None => {
            eprintln!(
                "unknown preset '{}', expected one of: {}",
                preset,
                available_datasets().join(", ")
            );
            return ExitCode::FAILURE;
        }
    };

    console::print_banner();
    console::print_config(
        instance.customers().len(),
        instance.sites().len(),
        instance.total_demand(),
        instance.total_capacity(),
    );

    match solve_instance(Arc::new(instance), &HighsBackend::default(), &config) {
        Ok(solution) => {
            console::print_solving_ended(&solution);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("solve failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

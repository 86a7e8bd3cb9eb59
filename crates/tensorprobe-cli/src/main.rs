mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use tensorprobe_backend_ort::OrtBackend;
use tensorprobe_runtime::{millis, run_probe, ProbeError, ProbeOutcome};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.to_config() {
        Ok(config) => config,
        Err(err) => {
            let err = ProbeError::Config(format!("{err:#}"));
            println!("ERROR {}: {err}", err.name());
            return ExitCode::from(err.exit_code());
        }
    };

    println!("model: {}", config.model_path.display());
    println!("input: {}", config.input_path.display());

    let result = run_probe(&config, OrtBackend::new(), |iteration, latency| {
        println!("invoke #{iteration} took {:.3} ms", millis(latency));
    });

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, code = err.exit_code(), "probe failed");
            println!("ERROR {}: {err}", err.name());
            ExitCode::from(err.exit_code())
        }
    }
}

fn print_outcome(outcome: &ProbeOutcome) {
    println!(
        "latency over {} runs: min {:.3} ms, mean {:.3} ms, max {:.3} ms",
        outcome.latencies.len(),
        millis(outcome.min),
        millis(outcome.mean),
        millis(outcome.max)
    );
    println!("output size: {} bytes", outcome.output_bytes);
    println!(">>> RESULT LABEL NUMBER: {}", outcome.label);
}

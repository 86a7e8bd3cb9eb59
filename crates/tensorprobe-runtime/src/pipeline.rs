use std::time::Duration;

use tensorprobe_core::Backend;
use tracing::info;

use crate::{
    bind, load_raw_buffer, run_timed, top1_label, InferenceSession, Label, ProbeConfig,
    ProbeError, Stage,
};

/// What a successful probe run produced.
#[derive(Clone, Debug)]
pub struct ProbeOutcome {
    pub latencies: Vec<Duration>,
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
    pub output_bytes: usize,
    pub label: Label,
}

/// Loads the input, opens the model, times `config.iterations` invokes and
/// reduces the last output to a top-1 label.
///
/// Every resource acquired along the way is released before returning,
/// whichever step fails.
pub fn run_probe<B: Backend>(
    config: &ProbeConfig,
    backend: B,
    on_iteration: impl FnMut(usize, Duration),
) -> Result<ProbeOutcome, ProbeError> {
    config.validate()?;
    for path in [&config.model_path, &config.input_path] {
        if !path.exists() {
            return Err(ProbeError::MissingFile { path: path.clone() });
        }
    }

    let raw = load_raw_buffer(&config.input_path, config.input_byte_len()?)?;

    let mut session = InferenceSession::new(backend);
    session.open(&config.artifact(), config.device)?;
    let inputs = bind(session.input_info()?, raw)?;

    let report = run_timed(
        &mut session,
        &inputs,
        config.iterations,
        config.timeout,
        on_iteration,
    )?;
    let scores = report.output.get(0).ok_or_else(|| {
        ProbeError::engine(Stage::Output, anyhow::anyhow!("model produced no outputs"))
    })?;
    let label = top1_label(scores, config.label_count)?;

    info!(
        label = label.as_i64(),
        mean_ms = crate::millis(report.mean()),
        "probe finished"
    );

    let outcome = ProbeOutcome {
        min: report.min(),
        mean: report.mean(),
        max: report.max(),
        output_bytes: report.output.byte_len(),
        latencies: report.latencies,
        label,
    };
    drop(inputs);
    session.close();
    Ok(outcome)
}

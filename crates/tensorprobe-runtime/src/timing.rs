use std::time::{Duration, Instant};

use tensorprobe_core::Backend;
use tracing::{error, info};

use crate::{InferenceSession, InputTensors, InvokeError, OutputTensors, ProbeError, Stage};

/// Latencies of a completed run plus the output of its last invoke.
#[derive(Debug)]
pub struct BenchReport {
    pub latencies: Vec<Duration>,
    pub output: OutputTensors,
}

impl BenchReport {
    pub fn min(&self) -> Duration {
        self.latencies.iter().copied().min().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.latencies.iter().copied().max().unwrap_or_default()
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.latencies.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.latencies.iter().sum::<Duration>() / n,
        }
    }
}

pub fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

/// Invokes the session `iterations` times back to back over the same inputs.
///
/// The timeout is re-applied before every call. The first failure aborts the
/// run; timeouts are not retried. `on_iteration` sees each 1-based iteration
/// number with its latency as soon as it completes.
pub fn run_timed<B: Backend>(
    session: &mut InferenceSession<B>,
    inputs: &InputTensors,
    iterations: usize,
    timeout: Option<Duration>,
    mut on_iteration: impl FnMut(usize, Duration),
) -> Result<BenchReport, ProbeError> {
    let mut latencies = Vec::with_capacity(iterations);
    let mut latest: Option<OutputTensors> = None;

    for iteration in 1..=iterations {
        session.set_timeout(timeout);
        // Only the newest output is kept.
        drop(latest.take());

        let start = Instant::now();
        let result = session.invoke(inputs);
        let elapsed = start.elapsed();

        let output = result.map_err(|err| {
            error!(iteration, error = %err, "invoke failed");
            match err {
                InvokeError::Timeout(t) => ProbeError::Timeout {
                    iteration,
                    limit: t.limit,
                },
                other => ProbeError::engine(Stage::Invoke, other),
            }
        })?;

        info!(iteration, latency_ms = millis(elapsed), "invoke finished");
        on_iteration(iteration, elapsed);
        latencies.push(elapsed);
        latest = Some(output);
    }

    let output = latest.ok_or_else(|| ProbeError::Config("iterations must be at least 1".into()))?;
    Ok(BenchReport { latencies, output })
}

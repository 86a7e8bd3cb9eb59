use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tensorprobe_core::Device;
use tensorprobe_runtime::{
    InputGeometry, ProbeConfig, DEFAULT_CHANNELS, DEFAULT_HEIGHT, DEFAULT_ITERATIONS,
    DEFAULT_LABEL_COUNT, DEFAULT_WIDTH,
};

#[derive(Parser, Debug)]
#[command(
    name = "tensorprobe",
    version,
    about = "Time a single-model image classification and print the top-1 label"
)]
pub struct Cli {
    /// Path to the model file
    pub model_path: PathBuf,

    /// Path to the raw interleaved byte image
    pub input_path: PathBuf,

    /// Input image width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: usize,

    /// Input image height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: usize,

    /// Interleaved channels per pixel
    #[arg(long, default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,

    /// Number of scores considered for the top-1 label
    #[arg(long = "labels", default_value_t = DEFAULT_LABEL_COUNT)]
    pub label_count: usize,

    /// Timed invocations to run
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Per-invoke timeout in milliseconds (0 disables it)
    #[arg(long, default_value_t = 20_000)]
    pub timeout_ms: u64,

    /// Hardware target (any, cpu or cuda:N)
    #[arg(long, default_value = "any")]
    pub device: String,

    /// Log level (RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Cli {
    pub fn to_config(&self) -> Result<ProbeConfig> {
        let mut config = ProbeConfig::new(&self.model_path, &self.input_path);
        config.geometry = InputGeometry {
            width: self.width,
            height: self.height,
            channels: self.channels,
        };
        config.label_count = self.label_count;
        config.iterations = self.iterations;
        config.timeout = (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms));
        config.device = parse_device(&self.device)?;
        Ok(config)
    }
}

pub fn parse_device(raw: &str) -> Result<Device> {
    if raw.eq_ignore_ascii_case("any") {
        return Ok(Device::Any);
    }

    if raw.eq_ignore_ascii_case("cpu") {
        return Ok(Device::Cpu);
    }

    if let Some(rest) = raw.strip_prefix("cuda:") {
        let device_id: u32 = rest.parse().context("invalid cuda device id")?;
        return Ok(Device::Cuda { device_id });
    }

    anyhow::bail!("unsupported device: {raw} (expected any, cpu or cuda:N)");
}

use std::path::PathBuf;
use std::time::Duration;

use tensorprobe_core::{Device, ModelArtifact};

use crate::ProbeError;

pub const DEFAULT_WIDTH: usize = 299;
pub const DEFAULT_HEIGHT: usize = 299;
pub const DEFAULT_CHANNELS: usize = 3;
pub const DEFAULT_LABEL_COUNT: usize = 5;
pub const DEFAULT_ITERATIONS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Geometry of the interleaved byte image fed to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputGeometry {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl InputGeometry {
    /// `width * height * channels`, or `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.channels)
    }
}

impl Default for InputGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            channels: DEFAULT_CHANNELS,
        }
    }
}

/// Everything one probe run needs. Passed explicitly to every stage.
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    pub model_path: PathBuf,
    pub input_path: PathBuf,
    pub geometry: InputGeometry,
    pub label_count: usize,
    pub iterations: usize,
    /// `None` lets an invoke run for as long as it takes.
    pub timeout: Option<Duration>,
    pub device: Device,
}

impl ProbeConfig {
    pub fn new(model_path: impl Into<PathBuf>, input_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_path: input_path.into(),
            geometry: InputGeometry::default(),
            label_count: DEFAULT_LABEL_COUNT,
            iterations: DEFAULT_ITERATIONS,
            timeout: Some(DEFAULT_TIMEOUT),
            device: Device::Any,
        }
    }

    pub fn artifact(&self) -> ModelArtifact {
        ModelArtifact::from_path(&self.model_path)
    }

    /// Bytes the raw input file must hold.
    pub fn input_byte_len(&self) -> Result<usize, ProbeError> {
        self.geometry
            .byte_len()
            .ok_or_else(|| ProbeError::Config("input geometry overflows usize".into()))
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        let InputGeometry {
            width,
            height,
            channels,
        } = self.geometry;
        if width == 0 || height == 0 || channels == 0 {
            return Err(ProbeError::Config(format!(
                "input geometry must be non-zero, got {width}x{height}x{channels}"
            )));
        }
        self.input_byte_len()?;
        if self.iterations == 0 {
            return Err(ProbeError::Config("iterations must be at least 1".into()));
        }
        if self.label_count == 0 {
            return Err(ProbeError::Config("label count must be at least 1".into()));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ProbeError::Config("timeout must be positive".into()));
        }
        Ok(())
    }
}

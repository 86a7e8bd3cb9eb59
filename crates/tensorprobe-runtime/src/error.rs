use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Engine call a failure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Open,
    InputInfo,
    Bind,
    Invoke,
    Output,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Open => "OPEN_FAILED",
            Stage::InputInfo => "INPUT_INFO_FAILED",
            Stage::Bind => "BIND_FAILED",
            Stage::Invoke => "INVOKE_FAILED",
            Stage::Output => "OUTPUT_FAILED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} holds {actual} bytes, expected exactly {expected}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        actual: u64,
    },
    #[error("failed reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("model declares {0} input tensors, only single-input models are supported")]
    InputCount(usize),
    #[error("input `{slot}` declares a byte capacity that overflows usize")]
    CapacityOverflow { slot: String },
    #[error("input `{slot}` takes {expected} bytes, buffer has {actual}")]
    SizeMismatch {
        slot: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{} does not exist", .path.display())]
    MissingFile { path: PathBuf },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Read(#[from] LoadError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("{stage}: {source:#}")]
    Engine {
        stage: Stage,
        source: anyhow::Error,
    },
    #[error("invoke #{iteration} timed out after {}ms", .limit.as_millis())]
    Timeout { iteration: usize, limit: Duration },
}

impl ProbeError {
    pub fn engine(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self::Engine {
            stage,
            source: source.into(),
        }
    }

    /// Stable diagnostic name of the failure class.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeError::MissingFile { .. } => "MISSING_FILE",
            ProbeError::Config(_) => "INVALID_CONFIG",
            ProbeError::Read(LoadError::SizeMismatch { .. }) => "SIZE_MISMATCH",
            ProbeError::Read(_) => "READ_ERROR",
            ProbeError::Bind(_) => Stage::Bind.name(),
            ProbeError::Engine { stage, .. } => stage.name(),
            ProbeError::Timeout { .. } => "TIMED_OUT",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ProbeError::MissingFile { .. } => 3,
            ProbeError::Read(_) => 4,
            ProbeError::Bind(_) => 5,
            ProbeError::Engine { .. } => 6,
            ProbeError::Timeout { .. } => 7,
            // 2 stays with clap's usage errors
            ProbeError::Config(_) => 8,
        }
    }
}

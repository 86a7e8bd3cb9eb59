use std::path::{Path, PathBuf};

/// A model file together with the format its backend must understand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelArtifact {
    OnnxPath(PathBuf),
    TfLitePath(PathBuf),
}

impl ModelArtifact {
    /// Picks the format from the file extension. Anything unrecognised is
    /// treated as ONNX and left for the backend to reject.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tflite") => Self::TfLitePath(path.to_path_buf()),
            _ => Self::OnnxPath(path.to_path_buf()),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::OnnxPath(p) | Self::TfLitePath(p) => p,
        }
    }

    pub fn format(&self) -> &'static str {
        match self {
            Self::OnnxPath(_) => "onnx",
            Self::TfLitePath(_) => "tflite",
        }
    }
}

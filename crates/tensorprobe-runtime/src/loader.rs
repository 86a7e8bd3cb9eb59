use std::fs::File;
use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::LoadError;

/// Reads the whole file, which must be exactly `expected` bytes long.
pub fn load_raw_buffer(path: &Path, expected: usize) -> Result<Bytes, LoadError> {
    let mut file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let actual = file.metadata().map_err(io_err)?.len();
    if actual != expected as u64 {
        return Err(LoadError::SizeMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    let mut buf = vec![0u8; expected];
    file.read_exact(&mut buf).map_err(io_err)?;
    debug!(path = %path.display(), bytes = expected, "raw input loaded");
    Ok(Bytes::from(buf))
}

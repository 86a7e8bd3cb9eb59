use anyhow::Result;
use tensorprobe_runtime::{load_raw_buffer, LoadError};

mod support;
use support::IMAGE_BYTES;

#[test]
fn loads_exact_size_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("input.raw");
    let data: Vec<u8> = (0..IMAGE_BYTES).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data)?;

    let buf = load_raw_buffer(&path, IMAGE_BYTES)?;
    assert_eq!(&buf[..], &data[..]);
    Ok(())
}

#[test]
fn shorter_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("short.raw");
    std::fs::write(&path, vec![0u8; IMAGE_BYTES - 1])?;

    match load_raw_buffer(&path, IMAGE_BYTES) {
        Err(LoadError::SizeMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, IMAGE_BYTES);
            assert_eq!(actual, (IMAGE_BYTES - 1) as u64);
        }
        other => panic!("expected size mismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn longer_file_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("long.raw");
    std::fs::write(&path, vec![0u8; IMAGE_BYTES + 1])?;

    assert!(matches!(
        load_raw_buffer(&path, IMAGE_BYTES),
        Err(LoadError::SizeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn unopenable_path_is_an_open_error() -> Result<()> {
    let dir = tempfile::tempdir()?;

    assert!(matches!(
        load_raw_buffer(&dir.path().join("absent.raw"), IMAGE_BYTES),
        Err(LoadError::Open { .. })
    ));
    Ok(())
}

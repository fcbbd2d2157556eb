//! File helpers for encoding checks: write text to disk in a chosen charset and read the raw bytes
//! back.
//!
//! Encoding happens before anything touches the filesystem, so an unmappable character never
//! leaves a partial file behind. The bytes then go to a temp file in the destination directory,
//! which is synced and persisted over the destination.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use textguard_charset::{Charset, CharsetError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteEncodedError {
    #[error(transparent)]
    Encode(#[from] CharsetError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Encode `text` in `charset` and atomically write it to `dest`, creating parent directories.
///
/// Returns `dest` as an owned path so fixtures can be handed straight to an assertion.
pub fn write_encoded(
    dest: impl AsRef<Path>,
    text: &str,
    charset: Charset,
) -> Result<PathBuf, WriteEncodedError> {
    let dest = dest.as_ref();
    let bytes = charset.encode(text)?;
    write_atomically(dest, |file| file.write_all(&bytes)).map_err(|source| {
        WriteEncodedError::Io {
            path: dest.to_path_buf(),
            source,
        }
    })?;
    Ok(dest.to_path_buf())
}

/// Read the full contents of `path`.
pub fn read_bytes(path: impl AsRef<Path>) -> io::Result<Vec<u8>> {
    fs::read(path)
}

fn fixture_dir(dest: &Path) -> &Path {
    // `Path::parent` is `Some("")` for a bare name like `fixture.txt`.
    match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Replace `dest` with whatever `fill` writes. On error `dest` is untouched and the temp file is
/// removed when it drops.
fn write_atomically(dest: &Path, fill: impl FnOnce(&mut File) -> io::Result<()>) -> io::Result<()> {
    let dir = fixture_dir(dest);
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    fill(tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| err.error)?;

    // Directory metadata sync is best-effort; the file is already in place.
    if let Ok(dir) = File::open(dir) {
        let _ = dir.sync_all();
    }
    Ok(())
}

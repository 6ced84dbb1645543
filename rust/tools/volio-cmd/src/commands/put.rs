//! Put command implementation

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use volio_io::{FileSystem, OpenMode};

pub fn run(fs: &FileSystem, path: &Path, append: bool) -> Result<()> {
    let written = put(fs, path, append, &mut std::io::stdin().lock())?;
    log::debug!("wrote {written} bytes to '{}'", path.display());
    Ok(())
}

/// Reads `input` to the end into a buffered commit file, then writes it to
/// `path` in one go. Returns the number of bytes committed.
pub fn put(fs: &FileSystem, path: &Path, append: bool, input: &mut impl Read) -> Result<u64> {
    let mode = if append {
        OpenMode::Append
    } else {
        OpenMode::Write
    };
    let mut file = fs.open_mfile(path, mode)?;
    let written = std::io::copy(input, &mut file)
        .with_context(|| format!("buffering input for '{}'", path.display()))?;
    file.close()?;
    Ok(written)
}

//! Ls command implementation

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use volio_io::{DirScanner, FileSystem};

use crate::utils::format_size;

pub fn run(fs: &FileSystem, dir: &Path, long: bool) -> Result<()> {
    list(fs, dir, long, &mut std::io::stdout().lock())
}

/// Writes the sorted entry names of `dir`, one per line.
pub fn list(fs: &FileSystem, dir: &Path, long: bool, out: &mut impl Write) -> Result<()> {
    let scanner = DirScanner::open(dir)?;
    let mut names: Vec<_> = scanner.entries().collect();
    names.sort();

    for name in names {
        let path = dir.join(&name);
        if !long {
            writeln!(out, "{}", name.to_string_lossy())?;
        } else if fs.is_dir(&path) {
            writeln!(out, "{:>12}  {}/", "-", name.to_string_lossy())?;
        } else {
            let size = fs.file_size(&path).unwrap_or_default();
            writeln!(out, "{:>12}  {}", format_size(size), name.to_string_lossy())?;
        }
    }
    out.flush()
        .with_context(|| format!("listing '{}'", dir.display()))
}

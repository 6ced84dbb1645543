//! Du command implementation

use std::path::Path;

use anyhow::{Context, Result};
use volio_io::FileSystem;

use crate::utils::display_size;

pub fn run(fs: &FileSystem, dir: &Path, recurse: bool, bytes: bool) -> Result<()> {
    let size = fs
        .dir_size(dir, recurse)
        .with_context(|| format!("measuring '{}'", dir.display()))?;
    println!("{}\t{}", display_size(size, bytes), dir.display());
    Ok(())
}

//! Df command implementation

use std::path::Path;

use anyhow::Result;
use volio_io::FileSystem;

use crate::utils::format_size;

pub fn run(fs: &FileSystem, path: &Path) -> Result<()> {
    let info = fs.filesystem_info(path)?;
    println!("Total: {}", format_size(info.total));
    println!("Free:  {}", format_size(info.free));
    println!("Used:  {}", format_size(info.total.saturating_sub(info.free)));
    Ok(())
}

//! Lock command implementation

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use volio_io::FileLock;

pub fn run(path: &Path, hold: Duration, keep: bool) -> Result<()> {
    let lock = FileLock::lock(path)
        .with_context(|| format!("another process may hold '{}'", path.display()))?;
    println!("locked {}", lock.path().display());
    std::thread::sleep(hold);
    if keep {
        drop(lock);
    } else {
        lock.unlock()?;
    }
    Ok(())
}

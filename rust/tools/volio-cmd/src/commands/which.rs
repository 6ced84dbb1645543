//! Which command implementation

use anyhow::Result;

pub fn run(name: &str) -> Result<()> {
    let dir = volio_io::filesys::get_file_dir(name)?;
    println!("{}", dir.display());
    Ok(())
}

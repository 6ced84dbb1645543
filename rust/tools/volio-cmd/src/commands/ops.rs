//! Single-operation commands: rm, rmdir, mv, cp, mkdir, touch, truncate.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use volio_io::FileSystem;

/// Deletes each path. Directories need `recursive`.
pub fn rm(fs: &FileSystem, paths: &[PathBuf], recursive: bool) -> Result<()> {
    for path in paths {
        if fs.is_dir(path) && !fs.is_symlink(path) {
            if !recursive {
                bail!("'{}' is a directory (use --recursive)", path.display());
            }
            fs.remove_dir_all(path)?;
        } else {
            fs.delete_file(path)?;
        }
    }
    Ok(())
}

pub fn rmdir(fs: &FileSystem, dir: &Path, contents_only: bool) -> Result<()> {
    if contents_only {
        fs.clean_out_dir(dir)?;
    } else {
        fs.rmdir(dir)?;
    }
    Ok(())
}

pub fn mv(fs: &FileSystem, from: &Path, to: &Path) -> Result<()> {
    Ok(fs.rename(from, to)?)
}

pub fn cp(fs: &FileSystem, from: &Path, to: &Path) -> Result<()> {
    Ok(fs.copy(from, to)?)
}

/// Creates `path`, or with `base` creates the directories leading to the
/// file `path` below `base`.
pub fn mkdir(fs: &FileSystem, base: Option<&Path>, path: &Path) -> Result<()> {
    match base {
        Some(base) => fs.make_dirs(base, path)?,
        None => fs.mkdir(path)?,
    }
    Ok(())
}

pub fn touch(fs: &FileSystem, path: &Path) -> Result<()> {
    Ok(fs.touch_file(path)?)
}

pub fn truncate(fs: &FileSystem, path: &Path, size: u64) -> Result<()> {
    Ok(fs.truncate(path, size)?)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use volio_io::FileSystem;

    use super::{mkdir, rm, rmdir};

    #[test]
    fn test_rm_directory_needs_recursive() {
        let dir = TempDir::new().unwrap();
        let slot = dir.path().join("slots/0");
        std::fs::create_dir_all(&slot).unwrap();
        std::fs::write(slot.join("init_data.xml"), b"").unwrap();
        let fs = <FileSystem>::default();

        let target = vec![dir.path().join("slots")];
        assert!(rm(&fs, &target, false).is_err());
        rm(&fs, &target, true).unwrap();
        assert!(!dir.path().join("slots").exists());

        rm(&fs, &[dir.path().join("never_existed")], false).unwrap();
    }

    #[test]
    fn test_rmdir_contents() {
        let dir = TempDir::new().unwrap();
        let projects = dir.path().join("projects");
        std::fs::create_dir(&projects).unwrap();
        std::fs::write(projects.join("app"), b"x").unwrap();
        let fs = <FileSystem>::default();

        assert!(rmdir(&fs, &projects, false).is_err());
        rmdir(&fs, &projects, true).unwrap();
        assert!(projects.exists());
        rmdir(&fs, &projects, false).unwrap();
        assert!(!projects.exists());
    }

    #[test]
    fn test_mkdir_with_base() {
        let dir = TempDir::new().unwrap();
        let fs = <FileSystem>::default();
        mkdir(&fs, Some(dir.path()), "a/b/file.dat".as_ref()).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        mkdir(&fs, None, &dir.path().join("c")).unwrap();
        assert!(dir.path().join("c").is_dir());
    }
}

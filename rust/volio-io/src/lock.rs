//! Cross-process exclusive lock held through a lock file.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use volio_common::{Error, ErrorKind, Result};

use crate::{filesys::FileSystem, fs::platform};

/// An exclusive lock on a lock file, held until [`unlock`](FileLock::unlock)
/// or drop.
///
/// On unix this is an advisory `fcntl` write lock; on Windows the file is
/// held open without sharing. Dropping a `FileLock` releases the lock but
/// leaves the file in place, so a crashed holder never strands a lock.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Creates the lock file if needed and takes the lock without waiting.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::LockFailed`] if another process holds the lock.
    /// * [`ErrorKind::OpenFailed`] if the lock file can't be opened.
    pub fn lock(path: impl AsRef<Path>) -> Result<FileLock> {
        let path = path.as_ref();
        let file = platform::open_lock_file(path).map_err(|e| {
            if platform::is_lock_contention(&e) {
                lock_failed(path, e)
            } else {
                Error::open_failed(path, e)
            }
        })?;
        platform::lock_exclusive(&file).map_err(|e| lock_failed(path, e))?;
        log::debug!("locked '{}'", path.display());
        Ok(FileLock {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock and deletes the lock file.
    pub fn unlock(self) -> Result<()> {
        let FileLock { file, path } = self;
        drop(file);
        log::debug!("unlocked '{}'", path.display());
        <FileSystem>::default().delete_file(&path)
    }
}

fn lock_failed(path: &Path, source: std::io::Error) -> Error {
    ErrorKind::LockFailed {
        path: path.to_path_buf(),
        source,
    }
    .into()
}

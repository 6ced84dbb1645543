//! File operations with bounded retry on transient failure.
//!
//! Consumer machines run virus scanners, indexers and backup tools that
//! briefly hold files open. Deleting, renaming or opening such a file fails
//! for a moment and then works again. [`FileSystem`] reattempts those
//! operations under a [`RetryPolicy`]; permanent failures are reported at
//! once. Every error carries the path that failed.
//!
//! The free functions at the bottom of this module operate through
//! `<FileSystem>::default()`: the native platform and a five second window.

use std::{
    fs::File,
    path::{Path, PathBuf},
    time::SystemTime,
};

use volio_common::{Error, ErrorKind, Result, verify_arg};

use crate::{
    dir_scan::{DirScanner, open_error},
    fs::{FilesystemInfo, NativeFs, OpenMode, PlatformFs},
    mfile::MFile,
    retry::RetryPolicy,
};

#[derive(Debug, Clone)]
pub struct FileSystem<P: PlatformFs = NativeFs> {
    platform: P,
    retry: RetryPolicy,
}

impl FileSystem<NativeFs> {
    pub fn new(retry: RetryPolicy) -> FileSystem<NativeFs> {
        FileSystem::with_platform(NativeFs, retry)
    }
}

impl<P: PlatformFs + Clone + Send + 'static> FileSystem<P> {
    /// Opens `path` as a buffered commit file. The file's commits are
    /// forced to disk through this file system's platform.
    pub fn open_mfile(&self, path: impl AsRef<Path>, mode: OpenMode) -> Result<MFile> {
        let path = path.as_ref();
        let file = self.fopen(path, mode)?;
        let platform = self.platform.clone();
        Ok(MFile::from_file(
            file,
            path.to_path_buf(),
            Box::new(move |file: &File| platform.sync(file)),
        ))
    }
}

impl Default for FileSystem<NativeFs> {
    fn default() -> FileSystem<NativeFs> {
        FileSystem::new(RetryPolicy::default())
    }
}

impl<P: PlatformFs> FileSystem<P> {
    pub fn with_platform(platform: P, retry: RetryPolicy) -> FileSystem<P> {
        FileSystem { platform, retry }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns `true` if `path` exists, following symbolic links.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.platform.metadata(path.as_ref()).is_ok()
    }

    /// Returns `true` if `path` exists, including dangling symbolic links.
    pub fn file_or_symlink_exists(&self, path: impl AsRef<Path>) -> bool {
        self.platform.symlink_metadata(path.as_ref()).is_ok()
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.platform
            .metadata(path.as_ref())
            .is_ok_and(|meta| meta.is_file())
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.platform
            .metadata(path.as_ref())
            .is_ok_and(|meta| meta.is_dir())
    }

    pub fn is_symlink(&self, path: impl AsRef<Path>) -> bool {
        self.platform
            .symlink_metadata(path.as_ref())
            .is_ok_and(|meta| meta.file_type().is_symlink())
    }

    pub fn file_size(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        self.platform
            .metadata(path)
            .map(|meta| meta.len())
            .map_err(|e| Error::stat_failed(path, e))
    }

    /// Opens `path`, retrying while the failure is transient.
    pub fn fopen(&self, path: impl AsRef<Path>, mode: OpenMode) -> Result<File> {
        let path = path.as_ref();
        self.retry
            .run(
                "open",
                path,
                |e| self.platform.is_transient(e),
                || self.platform.open(path, mode),
            )
            .map_err(|e| Error::open_failed(path, e))
    }

    /// Deletes a file or symbolic link.
    ///
    /// Deleting a path that does not exist succeeds without touching the
    /// retry machinery.
    pub fn delete_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if !self.file_or_symlink_exists(path) {
            return Ok(());
        }
        self.retry
            .run(
                "delete",
                path,
                |e| self.platform.is_transient(e),
                || self.platform.remove_file(path),
            )
            .map_err(|source| {
                ErrorKind::UnlinkFailed {
                    path: path.to_path_buf(),
                    source,
                }
                .into()
            })
    }

    /// Renames `old` to `new`, replacing `new` if it exists, on every
    /// platform.
    pub fn rename(&self, old: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<()> {
        let (old, new) = (old.as_ref(), new.as_ref());
        self.retry
            .run(
                "rename",
                old,
                |e| self.platform.is_transient(e),
                || self.platform.rename(old, new),
            )
            .map_err(|source| {
                ErrorKind::RenameFailed {
                    from: old.to_path_buf(),
                    to: new.to_path_buf(),
                    source,
                }
                .into()
            })
    }

    /// Copies `orig` to `dest`, overwriting `dest`. Not retried.
    pub fn copy(&self, orig: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
        let (orig, dest) = (orig.as_ref(), dest.as_ref());
        self.platform.copy(orig, dest).map_err(|source| {
            ErrorKind::CopyFailed {
                from: orig.to_path_buf(),
                to: dest.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Creates a directory; succeeds if it already exists.
    pub fn mkdir(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.is_dir(path) {
            return Ok(());
        }
        self.platform.create_dir(path).map_err(|source| {
            ErrorKind::MkdirFailed {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Creates every missing directory on the way to the file `rel_path`
    /// below `base`. The last component of `rel_path` names a file and is
    /// not created.
    pub fn make_dirs(&self, base: impl AsRef<Path>, rel_path: impl AsRef<Path>) -> Result<()> {
        let rel_path = rel_path.as_ref();
        verify_arg!(rel_path, rel_path.is_relative());
        let Some(parent) = rel_path.parent() else {
            return Ok(());
        };
        let mut current = base.as_ref().to_path_buf();
        for component in parent.components() {
            current.push(component);
            self.mkdir(&current)?;
        }
        Ok(())
    }

    /// Removes an empty directory, retrying while the failure is transient.
    pub fn rmdir(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.retry
            .run(
                "rmdir",
                path,
                |e| self.platform.is_transient(e),
                || self.platform.remove_dir(path),
            )
            .map_err(|source| {
                ErrorKind::RmdirFailed {
                    path: path.to_path_buf(),
                    source,
                }
                .into()
            })
    }

    /// Deletes everything below `path`, leaving `path` itself in place.
    ///
    /// A directory that can't be opened is treated as empty. Symbolic links
    /// are deleted, never followed.
    pub fn clean_out_dir(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let Ok(dir) = self.platform.open_dir(path) else {
            return Ok(());
        };
        for name in DirScanner::from_raw(path, dir).entries() {
            let child = path.join(&name);
            if self.is_real_dir(&child) {
                self.clean_out_dir(&child)?;
                self.rmdir(&child)?;
            } else {
                self.delete_file(&child)?;
            }
        }
        Ok(())
    }

    /// Deletes `path` and everything below it.
    pub fn remove_dir_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.clean_out_dir(path)?;
        self.rmdir(path)
    }

    /// Total size of the regular files in `path`, descending into
    /// subdirectories when `recurse` is set. Symbolic links are not
    /// followed or counted.
    pub fn dir_size(&self, path: impl AsRef<Path>, recurse: bool) -> Result<u64> {
        let path = path.as_ref();
        let dir = self
            .platform
            .open_dir(path)
            .map_err(|e| open_error(path, e))?;
        let mut scanner = DirScanner::from_raw(path, dir);
        let mut size = 0u64;
        while let Some(name) = scanner.try_scan()? {
            let child = path.join(&name);
            let Ok(meta) = self.platform.symlink_metadata(&child) else {
                // Deleted while scanning.
                continue;
            };
            if meta.is_dir() {
                if recurse {
                    size += self.dir_size(&child, true)?;
                }
            } else if meta.is_file() {
                size += meta.len();
            }
        }
        Ok(size)
    }

    /// Creates `path` if it is missing, otherwise sets its modification
    /// time to now.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::OpenFailed`] if the file can't be opened for writing or
    /// its modification time can't be updated.
    pub fn touch_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = self.fopen(path, OpenMode::Append)?;
        file.set_modified(SystemTime::now())
            .map_err(|e| Error::open_failed(path, e))
    }

    /// Truncates or extends the file at `path` to `size` bytes.
    pub fn truncate(&self, path: impl AsRef<Path>, size: u64) -> Result<()> {
        let path = path.as_ref();
        let file = self
            .platform
            .open(path, OpenMode::Update)
            .map_err(|e| Error::open_failed(path, e))?;
        file.set_len(size).map_err(|source| {
            ErrorKind::TruncateFailed {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Total and free space of the file system holding `path`.
    pub fn filesystem_info(&self, path: impl AsRef<Path>) -> Result<FilesystemInfo> {
        let path = path.as_ref();
        self.platform
            .filesystem_info(path)
            .map_err(|e| Error::stat_failed(path, e))
    }

    fn is_real_dir(&self, path: &Path) -> bool {
        self.platform
            .symlink_metadata(path)
            .is_ok_and(|meta| meta.is_dir())
    }
}

pub fn file_exists(path: impl AsRef<Path>) -> bool {
    <FileSystem>::default().file_exists(path)
}

pub fn file_or_symlink_exists(path: impl AsRef<Path>) -> bool {
    <FileSystem>::default().file_or_symlink_exists(path)
}

pub fn is_file(path: impl AsRef<Path>) -> bool {
    <FileSystem>::default().is_file(path)
}

pub fn is_dir(path: impl AsRef<Path>) -> bool {
    <FileSystem>::default().is_dir(path)
}

pub fn is_symlink(path: impl AsRef<Path>) -> bool {
    <FileSystem>::default().is_symlink(path)
}

pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
    <FileSystem>::default().file_size(path)
}

pub fn fopen(path: impl AsRef<Path>, mode: OpenMode) -> Result<File> {
    <FileSystem>::default().fopen(path, mode)
}

pub fn delete_file(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().delete_file(path)
}

pub fn rename(old: impl AsRef<Path>, new: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().rename(old, new)
}

pub fn copy(orig: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().copy(orig, dest)
}

pub fn mkdir(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().mkdir(path)
}

pub fn make_dirs(base: impl AsRef<Path>, rel_path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().make_dirs(base, rel_path)
}

pub fn rmdir(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().rmdir(path)
}

pub fn clean_out_dir(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().clean_out_dir(path)
}

pub fn remove_dir_all(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().remove_dir_all(path)
}

pub fn dir_size(path: impl AsRef<Path>, recurse: bool) -> Result<u64> {
    <FileSystem>::default().dir_size(path, recurse)
}

pub fn touch_file(path: impl AsRef<Path>) -> Result<()> {
    <FileSystem>::default().touch_file(path)
}

pub fn truncate(path: impl AsRef<Path>, size: u64) -> Result<()> {
    <FileSystem>::default().truncate(path, size)
}

pub fn filesystem_info(path: impl AsRef<Path>) -> Result<FilesystemInfo> {
    <FileSystem>::default().filesystem_info(path)
}

/// Makes `path` absolute against the current directory. Absolute paths are
/// returned unchanged.
pub fn relative_to_absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    std::path::absolute(path).map_err(|e| Error::stat_failed(path, e))
}

/// Returns the first directory in `PATH` that holds an executable file
/// called `name`.
///
/// # Errors
///
/// [`ErrorKind::NotFound`] if `PATH` is unset or no directory matches.
#[cfg(unix)]
pub fn get_file_dir(name: impl AsRef<std::ffi::OsStr>) -> Result<PathBuf> {
    let name = name.as_ref();
    let search_path = std::env::var_os("PATH");
    crate::fs::platform::find_in_search_path(name, search_path.as_deref())
        .ok_or_else(|| Error::not_found(name.to_string_lossy()))
}

/// Changes the group of `path` to `gid`, keeping its owner.
#[cfg(unix)]
pub fn chown(path: impl AsRef<Path>, gid: u32) -> Result<()> {
    let path = path.as_ref();
    crate::fs::platform::chown_group(path, gid).map_err(|source| {
        ErrorKind::ChownFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        fs::{File, Metadata},
        path::Path,
        time::Duration,
    };

    use tempfile::TempDir;
    use volio_common::ErrorCode;

    use super::FileSystem;
    use crate::{
        fs::{FilesystemInfo, NativeDir, NativeFs, OpenMode, PlatformFs},
        retry::RetryPolicy,
    };

    /// Native platform whose delete, rename and rmdir fail with a transient
    /// error a given number of times before reaching the real file system.
    #[derive(Default)]
    struct FlakyFs {
        failures: Cell<u32>,
        permanent: bool,
        calls: Cell<u32>,
    }

    impl FlakyFs {
        fn failing(times: u32) -> FlakyFs {
            FlakyFs {
                failures: Cell::new(times),
                ..Default::default()
            }
        }

        fn denied() -> FlakyFs {
            FlakyFs {
                failures: Cell::new(u32::MAX),
                permanent: true,
                ..Default::default()
            }
        }

        fn attempt(&self, op: impl FnOnce() -> std::io::Result<()>) -> std::io::Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                let kind = if self.permanent {
                    std::io::ErrorKind::PermissionDenied
                } else {
                    std::io::ErrorKind::WouldBlock
                };
                return Err(std::io::Error::from(kind));
            }
            op()
        }
    }

    impl PlatformFs for FlakyFs {
        type Dir = NativeDir;

        fn open(&self, path: &Path, mode: OpenMode) -> std::io::Result<File> {
            NativeFs.open(path, mode)
        }

        fn remove_file(&self, path: &Path) -> std::io::Result<()> {
            self.attempt(|| NativeFs.remove_file(path))
        }

        fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
            self.attempt(|| NativeFs.rename(from, to))
        }

        fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()> {
            NativeFs.copy(from, to)
        }

        fn create_dir(&self, path: &Path) -> std::io::Result<()> {
            NativeFs.create_dir(path)
        }

        fn remove_dir(&self, path: &Path) -> std::io::Result<()> {
            self.attempt(|| NativeFs.remove_dir(path))
        }

        fn metadata(&self, path: &Path) -> std::io::Result<Metadata> {
            NativeFs.metadata(path)
        }

        fn symlink_metadata(&self, path: &Path) -> std::io::Result<Metadata> {
            NativeFs.symlink_metadata(path)
        }

        fn sync(&self, file: &File) -> std::io::Result<()> {
            NativeFs.sync(file)
        }

        fn filesystem_info(&self, path: &Path) -> std::io::Result<FilesystemInfo> {
            NativeFs.filesystem_info(path)
        }

        fn open_dir(&self, path: &Path) -> std::io::Result<NativeDir> {
            NativeFs.open_dir(path)
        }

        fn is_transient(&self, err: &std::io::Error) -> bool {
            err.kind() == std::io::ErrorKind::WouldBlock
        }
    }

    fn flaky(platform: FlakyFs, window_ms: u64) -> FileSystem<FlakyFs> {
        FileSystem::with_platform(
            platform,
            RetryPolicy::new(Duration::from_millis(window_ms))
                .with_max_backoff(Duration::from_millis(2)),
        )
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let dir = TempDir::new().unwrap();
        let fs = flaky(FlakyFs::failing(u32::MAX), 5_000);
        fs.delete_file(dir.path().join("missing")).unwrap();
        assert_eq!(fs.platform().calls.get(), 0);
    }

    #[test]
    fn test_delete_retries_transient_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result_0.out");
        std::fs::write(&path, b"done").unwrap();

        let fs = flaky(FlakyFs::failing(3), 5_000);
        fs.delete_file(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(fs.platform().calls.get(), 4);
    }

    #[test]
    fn test_delete_gives_up_after_window() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.dat");
        std::fs::write(&path, b"x").unwrap();

        let fs = flaky(FlakyFs::failing(u32::MAX), 40);
        let err = fs.delete_file(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnlinkFailed);
        assert_eq!(err.path(), Some(path.as_path()));
        assert!(fs.platform().calls.get() > 1);
        assert!(path.exists());
    }

    #[test]
    fn test_delete_permanent_failure_not_retried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readonly.dat");
        std::fs::write(&path, b"x").unwrap();

        let fs = flaky(FlakyFs::denied(), 5_000);
        let err = fs.delete_file(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnlinkFailed);
        assert_eq!(fs.platform().calls.get(), 1);
    }

    #[test]
    fn test_rename_retries_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("client_state_next.xml");
        let b = dir.path().join("client_state.xml");
        std::fs::write(&a, b"new").unwrap();
        std::fs::write(&b, b"old").unwrap();

        let fs = flaky(FlakyFs::failing(2), 5_000);
        fs.rename(&a, &b).unwrap();
        assert!(!a.exists());
        assert_eq!(std::fs::read(&b).unwrap(), b"new");
        assert_eq!(fs.platform().calls.get(), 3);
    }

    #[test]
    fn test_rename_failure_reports_source() {
        let dir = TempDir::new().unwrap();
        let fs = <FileSystem>::default();
        let err = fs
            .rename(dir.path().join("missing"), dir.path().join("dest"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RenameFailed);
        assert_eq!(err.path(), Some(dir.path().join("missing").as_path()));
    }

    #[test]
    fn test_rmdir_retries() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("slot");
        std::fs::create_dir(&sub).unwrap();

        let fs = flaky(FlakyFs::failing(1), 5_000);
        fs.rmdir(&sub).unwrap();
        assert!(!sub.exists());
    }

    #[test]
    fn test_mkdir_twice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects");
        let fs = <FileSystem>::default();
        fs.mkdir(&path).unwrap();
        fs.mkdir(&path).unwrap();
        assert!(fs.is_dir(&path));
    }

    #[test]
    fn test_mkdir_over_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken");
        std::fs::write(&path, b"").unwrap();
        let err = <FileSystem>::default().mkdir(&path).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MkdirFailed);
    }

    #[test]
    fn test_make_dirs() {
        let dir = TempDir::new().unwrap();
        let fs = <FileSystem>::default();
        fs.make_dirs(dir.path(), "projects/example.org/input.dat")
            .unwrap();
        assert!(fs.is_dir(dir.path().join("projects/example.org")));
        assert!(!fs.file_exists(dir.path().join("projects/example.org/input.dat")));

        fs.make_dirs(dir.path(), "top_level.xml").unwrap();
        let err = fs.make_dirs(dir.path(), dir.path().join("abs/file")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_copy() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("app");
        let dst = dir.path().join("app_copy");
        std::fs::write(&src, b"binary").unwrap();
        std::fs::write(&dst, b"stale contents").unwrap();

        let fs = <FileSystem>::default();
        fs.copy(&src, &dst).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"binary");
        assert!(src.exists());

        let err = fs.copy(dir.path().join("missing"), &dst).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CopyFailed);
    }

    #[test]
    fn test_truncate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        std::fs::write(&path, b"0123456789").unwrap();

        let fs = <FileSystem>::default();
        fs.truncate(&path, 4).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"0123");
        fs.truncate(&path, 6).unwrap();
        assert_eq!(fs.file_size(&path).unwrap(), 6);

        let err = fs.truncate(dir.path().join("missing"), 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenFailed);
    }

    #[test]
    fn test_touch_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("boinc_finish_called");
        let fs = <FileSystem>::default();
        fs.touch_file(&path).unwrap();
        assert!(fs.is_file(&path));
        assert_eq!(fs.file_size(&path).unwrap(), 0);

        std::fs::write(&path, b"keep").unwrap();
        fs.touch_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn test_touch_file_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/boinc_lockfile");
        let err = FileSystem::new(RetryPolicy::none())
            .touch_file(&path)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenFailed);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_truncate_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        std::fs::write(&path, b"0123").unwrap();

        // Larger than any representable file offset.
        let err = <FileSystem>::default().truncate(&path, u64::MAX).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TruncateFailed);
        assert_eq!(err.path(), Some(path.as_path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"0123");
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_out_dir_keeps_link_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("project");
        let slot = dir.path().join("slot");
        std::fs::create_dir(&target).unwrap();
        std::fs::create_dir(&slot).unwrap();
        std::fs::write(target.join("app.exe"), b"x").unwrap();
        std::os::unix::fs::symlink(&target, slot.join("project_link")).unwrap();

        let fs = <FileSystem>::default();
        assert!(fs.is_symlink(slot.join("project_link")));
        fs.clean_out_dir(&slot).unwrap();
        assert!(!fs.file_or_symlink_exists(slot.join("project_link")));
        assert!(fs.is_file(target.join("app.exe")));
    }

    #[test]
    fn test_file_size_missing() {
        let dir = TempDir::new().unwrap();
        let err = <FileSystem>::default()
            .file_size(dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StatFailed);
    }

    #[cfg(unix)]
    #[test]
    fn test_existence_and_symlinks() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = <FileSystem>::default();
        assert!(!fs.file_exists(&link));
        assert!(fs.file_or_symlink_exists(&link));
        assert!(fs.is_symlink(&link));

        std::fs::write(&target, b"x").unwrap();
        assert!(fs.file_exists(&link));
        assert!(fs.is_file(&link));
        assert!(!fs.is_symlink(&target));

        std::fs::remove_file(&target).unwrap();
        fs.delete_file(&link).unwrap();
        assert!(!fs.file_or_symlink_exists(&link));
    }

    fn build_tree(root: &Path) {
        std::fs::create_dir_all(root.join("a/b")).unwrap();
        std::fs::write(root.join("top.txt"), vec![0u8; 10]).unwrap();
        std::fs::write(root.join("a/mid.txt"), vec![0u8; 20]).unwrap();
        std::fs::write(root.join("a/b/leaf.txt"), vec![0u8; 30]).unwrap();
    }

    #[test]
    fn test_dir_size() {
        let dir = TempDir::new().unwrap();
        build_tree(dir.path());
        let fs = <FileSystem>::default();
        assert_eq!(fs.dir_size(dir.path(), false).unwrap(), 10);
        assert_eq!(fs.dir_size(dir.path(), true).unwrap(), 60);
        assert_eq!(fs.dir_size(dir.path().join("a"), true).unwrap(), 50);

        let err = fs.dir_size(dir.path().join("missing"), true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_clean_out_dir() {
        let dir = TempDir::new().unwrap();
        build_tree(dir.path());
        let fs = <FileSystem>::default();
        fs.clean_out_dir(dir.path()).unwrap();
        assert!(fs.is_dir(dir.path()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        fs.clean_out_dir(dir.path().join("missing")).unwrap();
    }

    #[test]
    fn test_remove_dir_all() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("slots");
        build_tree(&root);
        <FileSystem>::default().remove_dir_all(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_fopen_and_mfile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stderr.txt");
        let fs = FileSystem::new(RetryPolicy::none());

        let mut f = fs.open_mfile(&path, OpenMode::Write).unwrap();
        f.puts("ok").unwrap();
        f.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"ok");

        let err = fs
            .fopen(dir.path().join("missing"), OpenMode::Read)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::OpenFailed);
    }

    #[test]
    fn test_filesystem_info() {
        let dir = TempDir::new().unwrap();
        let info = super::filesystem_info(dir.path()).unwrap();
        assert!(info.total >= info.free);
        assert!(info.total > 0);
    }

    #[test]
    fn test_relative_to_absolute() {
        let abs = super::relative_to_absolute("slots/0").unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("slots/0"));

        let dir = TempDir::new().unwrap();
        assert_eq!(super::relative_to_absolute(dir.path()).unwrap(), dir.path());
    }

    #[cfg(unix)]
    #[test]
    fn test_get_file_dir_missing() {
        let err = super::get_file_dir("volio-no-such-executable").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_chown_keeps_group() {
        use std::os::unix::fs::MetadataExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shared");
        std::fs::write(&path, b"").unwrap();
        let gid = std::fs::metadata(&path).unwrap().gid();
        super::chown(&path, gid).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().gid(), gid);

        let err = super::chown(dir.path().join("missing"), gid).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ChownFailed);
    }
}

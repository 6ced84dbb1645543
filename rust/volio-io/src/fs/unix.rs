//! Unix-specific file system operations.
//!
//! `rename` maps to `rename(2)`, which atomically replaces an existing
//! destination, and every committed write is followed by `fsync(2)`.
//! Directory iteration goes through `opendir`/`readdir` as wrapped by
//! `std::fs::ReadDir`; free space comes from `statvfs(3)`.

use std::{
    ffi::{CString, OsStr, OsString},
    fs::{DirBuilder, File, Metadata, OpenOptions},
    os::unix::{
        ffi::OsStrExt,
        fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt},
    },
    path::{Path, PathBuf},
};

use crate::fs::{FilesystemInfo, OpenMode, PlatformFs, RawDir};

/// Owner and group get full access, everyone else none.
const DIR_MODE: u32 = 0o770;

const LOCK_FILE_MODE: u32 = 0o664;

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

impl PlatformFs for NativeFs {
    type Dir = NativeDir;

    fn open(&self, path: &Path, mode: OpenMode) -> std::io::Result<File> {
        mode.options().open(path)
    }

    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        DirBuilder::new().mode(DIR_MODE).create(path)
    }

    fn remove_dir(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn metadata(&self, path: &Path) -> std::io::Result<Metadata> {
        std::fs::metadata(path)
    }

    fn symlink_metadata(&self, path: &Path) -> std::io::Result<Metadata> {
        std::fs::symlink_metadata(path)
    }

    fn sync(&self, file: &File) -> std::io::Result<()> {
        file.sync_all()
    }

    fn filesystem_info(&self, path: &Path) -> std::io::Result<FilesystemInfo> {
        let c_path = path_to_cstring(path)?;
        let mut stat = std::mem::MaybeUninit::<libc::statvfs>::zeroed();
        // SAFETY: `c_path` is NUL-terminated and `stat` points to writable
        // storage of the right type.
        let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
        if ret != 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: statvfs succeeded and filled in the structure.
        let stat = unsafe { stat.assume_init() };
        let block_size = if stat.f_frsize != 0 {
            stat.f_frsize as u64
        } else {
            stat.f_bsize as u64
        };
        Ok(FilesystemInfo {
            total: (stat.f_blocks as u64).saturating_mul(block_size),
            free: (stat.f_bavail as u64).saturating_mul(block_size),
        })
    }

    fn open_dir(&self, path: &Path) -> std::io::Result<NativeDir> {
        NativeDir::open(path)
    }

    fn is_transient(&self, err: &std::io::Error) -> bool {
        if err.kind() == std::io::ErrorKind::Interrupted {
            return true;
        }
        matches!(
            err.raw_os_error(),
            Some(libc::EINTR | libc::EAGAIN | libc::EBUSY | libc::ETXTBSY)
        )
    }
}

/// An open `readdir` stream.
pub struct NativeDir {
    entries: std::fs::ReadDir,
}

impl NativeDir {
    pub fn open(path: &Path) -> std::io::Result<NativeDir> {
        Ok(NativeDir {
            entries: std::fs::read_dir(path)?,
        })
    }
}

impl RawDir for NativeDir {
    fn read_name(&mut self) -> std::io::Result<Option<OsString>> {
        self.entries
            .next()
            .transpose()
            .map(|entry| entry.map(|entry| entry.file_name()))
    }
}

/// Opens (creating if needed) the file backing a [`crate::FileLock`].
pub fn open_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(LOCK_FILE_MODE)
        .open(path)
}

/// Takes a non-blocking exclusive `fcntl` write lock over the whole file.
///
/// The lock is released when the last descriptor of `file` is closed.
pub fn lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    // SAFETY: an all-zero `flock` is a valid value; the relevant fields are
    // set below.
    let mut fl: libc::flock = unsafe { std::mem::zeroed() };
    fl.l_type = libc::F_WRLCK as libc::c_short;
    fl.l_whence = libc::SEEK_SET as libc::c_short;
    fl.l_start = 0;
    fl.l_len = 0;
    // SAFETY: the descriptor is owned by `file` and `fl` outlives the call.
    let ret = unsafe {
        libc::fcntl(
            file.as_raw_fd(),
            libc::F_SETLK,
            &fl as *const libc::flock,
        )
    };
    if ret == -1 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Open failures never indicate lock contention here; contention shows up
/// in [`lock_exclusive`].
pub fn is_lock_contention(_err: &std::io::Error) -> bool {
    false
}

/// Changes the group of `path`, keeping its owner.
pub fn chown_group(path: &Path, gid: u32) -> std::io::Result<()> {
    std::os::unix::fs::chown(path, None, Some(gid))
}

/// Finds the first directory in `search_path` (a `PATH`-style list) that
/// contains an executable regular file called `name`.
pub fn find_in_search_path(name: &OsStr, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find(|dir| is_executable_file(&dir.join(name)))
}

fn is_executable_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn path_to_cstring(path: &Path) -> std::io::Result<CString> {
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

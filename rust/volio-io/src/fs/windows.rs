//! Windows-specific file system operations.
//!
//! Differences from the unix implementation:
//! - `MoveFile` refuses to replace an existing destination, so `rename`
//!   deletes the destination first.
//! - Committed writes are not followed by an explicit flush to disk.
//! - Directory iteration uses `FindFirstFileW`/`FindNextFileW`. The first
//!   call both opens the search and returns the first entry, so it is
//!   deferred until the first [`RawDir::read_name`].
//! - Directory symlinks and junctions must be removed with `RemoveDirectory`,
//!   so `remove_file` dispatches on the link type.
//! - Sharing and lock violations, typically caused by virus scanners and
//!   indexers holding a file open, are treated as transient.

use std::{
    ffi::{OsStr, OsString},
    fs::{File, Metadata, OpenOptions},
    os::windows::{
        ffi::{OsStrExt, OsStringExt},
        fs::{FileTypeExt, OpenOptionsExt},
    },
    path::Path,
};

use windows_sys::Win32::{
    Foundation::{
        ERROR_ACCESS_DENIED, ERROR_FILE_NOT_FOUND, ERROR_LOCK_VIOLATION, ERROR_NO_MORE_FILES,
        ERROR_SHARING_VIOLATION, HANDLE, INVALID_HANDLE_VALUE,
    },
    Storage::FileSystem::{
        FindClose, FindFirstFileW, FindNextFileW, GetDiskFreeSpaceExW, WIN32_FIND_DATAW,
    },
};

use crate::fs::{FilesystemInfo, OpenMode, PlatformFs, RawDir};

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

impl PlatformFs for NativeFs {
    type Dir = NativeDir;

    fn open(&self, path: &Path, mode: OpenMode) -> std::io::Result<File> {
        mode.options().open(path)
    }

    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        // Directory symlinks and junctions are removed as directories.
        if std::fs::symlink_metadata(path)?.file_type().is_symlink_dir() {
            return std::fs::remove_dir(path);
        }
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        if std::fs::symlink_metadata(to).is_ok() {
            std::fs::remove_file(to)?;
        }
        std::fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir(path)
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

    fn sync(&self, _file: &File) -> std::io::Result<()> {
        Ok(())
    }

    fn filesystem_info(&self, path: &Path) -> std::io::Result<FilesystemInfo> {
        let wide = to_wide(path.as_os_str());
        let mut free_to_caller = 0u64;
        let mut total = 0u64;
        let mut total_free = 0u64;
        // SAFETY: `wide` is NUL-terminated; the out pointers refer to live
        // locals.
        let ok = unsafe {
            GetDiskFreeSpaceExW(
                wide.as_ptr(),
                &mut free_to_caller,
                &mut total,
                &mut total_free,
            )
        };
        if ok == 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(FilesystemInfo {
            total,
            free: free_to_caller,
        })
    }

    fn open_dir(&self, path: &Path) -> std::io::Result<NativeDir> {
        NativeDir::open(path)
    }

    fn is_transient(&self, err: &std::io::Error) -> bool {
        if err.kind() == std::io::ErrorKind::Interrupted {
            return true;
        }
        match err.raw_os_error() {
            Some(code) => matches!(
                code as u32,
                ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION | ERROR_ACCESS_DENIED
            ),
            None => false,
        }
    }
}

/// A `FindFirstFileW` search over `<dir>\*`.
pub struct NativeDir {
    pattern: Vec<u16>,
    handle: HANDLE,
    first: bool,
}

// SAFETY: the search handle is owned exclusively by this value and is only
// used through `&mut self`; FindNextFileW/FindClose may run on any thread.
unsafe impl Send for NativeDir {}

impl NativeDir {
    pub fn open(path: &Path) -> std::io::Result<NativeDir> {
        if !std::fs::metadata(path)?.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("'{}' is not a directory", path.display()),
            ));
        }
        Ok(NativeDir {
            pattern: to_wide(path.join("*").as_os_str()),
            handle: INVALID_HANDLE_VALUE,
            first: true,
        })
    }

    fn release(&mut self) {
        if self.handle != INVALID_HANDLE_VALUE {
            // SAFETY: the handle came from FindFirstFileW and is closed once.
            unsafe { FindClose(self.handle) };
            self.handle = INVALID_HANDLE_VALUE;
        }
    }
}

impl RawDir for NativeDir {
    fn read_name(&mut self) -> std::io::Result<Option<OsString>> {
        // SAFETY: WIN32_FIND_DATAW is plain data; all-zero is valid.
        let mut data: WIN32_FIND_DATAW = unsafe { std::mem::zeroed() };
        if self.first {
            self.first = false;
            // SAFETY: `pattern` is NUL-terminated and `data` is writable.
            let handle = unsafe { FindFirstFileW(self.pattern.as_ptr(), &mut data) };
            if handle == INVALID_HANDLE_VALUE {
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() == Some(ERROR_FILE_NOT_FOUND as i32) {
                    return Ok(None);
                }
                return Err(err);
            }
            self.handle = handle;
        } else {
            if self.handle == INVALID_HANDLE_VALUE {
                return Ok(None);
            }
            // SAFETY: the handle is a live search handle.
            let ok = unsafe { FindNextFileW(self.handle, &mut data) };
            if ok == 0 {
                let err = std::io::Error::last_os_error();
                self.release();
                if err.raw_os_error() == Some(ERROR_NO_MORE_FILES as i32) {
                    return Ok(None);
                }
                return Err(err);
            }
        }
        let len = data
            .cFileName
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(data.cFileName.len());
        Ok(Some(OsString::from_wide(&data.cFileName[..len])))
    }
}

impl Drop for NativeDir {
    fn drop(&mut self) {
        self.release();
    }
}

/// Opens the file backing a [`crate::FileLock`] with no sharing; a second
/// opener gets a sharing violation until this handle is closed.
pub fn open_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .share_mode(0)
        .open(path)
}

/// Exclusive access is already held through the share mode of the handle.
pub fn lock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}

pub fn is_lock_contention(err: &std::io::Error) -> bool {
    matches!(
        err.raw_os_error().map(|code| code as u32),
        Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
    )
}

fn to_wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

#[cfg(test)]
mod tests {
    use super::NativeDir;

    fn assert_send<T: Send>() {}

    #[test]
    fn test_native_dir_is_send() {
        assert_send::<NativeDir>();
        assert_send::<crate::DirScanner<NativeDir>>();
    }

    #[test]
    fn test_symlink_metadata_sees_link() {
        use crate::fs::PlatformFs;

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep.txt"), b"x").unwrap();
        // Creating symlinks needs developer mode or elevation.
        if std::os::windows::fs::symlink_dir(&target, &link).is_err() {
            return;
        }

        let meta = super::NativeFs.symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        super::NativeFs.remove_file(&link).unwrap();
        assert!(target.join("keep.txt").exists());
    }
}

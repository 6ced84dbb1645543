//! Platform file and directory operations.
//!
//! Everything above this module talks to the host file system through the
//! [`PlatformFs`] capability trait. The concrete implementation, [`NativeFs`],
//! is selected at build time from `unix.rs` or `windows.rs`.

use std::{
    ffi::OsString,
    fs::{File, Metadata, OpenOptions},
    path::Path,
    str::FromStr,
};

use volio_common::{Error, Result};

#[cfg_attr(unix, path = "unix.rs")]
#[cfg_attr(windows, path = "windows.rs")]
pub(crate) mod platform;

pub(crate) mod shared;

pub use platform::{NativeDir, NativeFs};

/// Capability interface over the host file-system calls the rest of the
/// crate depends on.
///
/// Methods return raw `std::io::Error`s; mapping them to the closed error
/// vocabulary happens one level up, where the failing operation is known.
pub trait PlatformFs {
    /// Directory iteration handle produced by [`open_dir`](PlatformFs::open_dir).
    type Dir: RawDir;

    fn open(&self, path: &Path, mode: OpenMode) -> std::io::Result<File>;

    fn remove_file(&self, path: &Path) -> std::io::Result<()>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()>;

    /// Copies `from` to `to`, overwriting `to` and keeping permissions.
    fn copy(&self, from: &Path, to: &Path) -> std::io::Result<()>;

    fn create_dir(&self, path: &Path) -> std::io::Result<()>;

    fn remove_dir(&self, path: &Path) -> std::io::Result<()>;

    /// Metadata following symbolic links.
    fn metadata(&self, path: &Path) -> std::io::Result<Metadata>;

    /// Metadata of the link itself where the platform has symbolic links.
    fn symlink_metadata(&self, path: &Path) -> std::io::Result<Metadata>;

    /// Forces written data of `file` to stable storage where the platform
    /// requires it.
    fn sync(&self, file: &File) -> std::io::Result<()>;

    fn filesystem_info(&self, path: &Path) -> std::io::Result<FilesystemInfo>;

    fn open_dir(&self, path: &Path) -> std::io::Result<Self::Dir>;

    /// Returns `true` for failures caused by another process momentarily
    /// holding the file (virus scanners, indexers, backup tools).
    fn is_transient(&self, err: &std::io::Error) -> bool;
}

/// A platform directory iteration handle.
pub trait RawDir {
    /// Returns the next raw entry name, `None` at the end of the directory.
    ///
    /// Implementations may return `.` and `..`; callers filter them.
    fn read_name(&mut self) -> std::io::Result<Option<OsString>>;
}

/// Total and free space of a file system, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilesystemInfo {
    pub total: u64,
    /// Space available to the calling user.
    pub free: u64,
}

/// How a file is opened, mirroring the stdio mode strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// `"r"`: read an existing file.
    Read,
    /// `"r+"`: read and write an existing file.
    Update,
    /// `"w"`: create or truncate, then write.
    Write,
    /// `"a"`: create if missing, append.
    Append,
}

impl OpenMode {
    pub fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            OpenMode::Read => options.read(true),
            OpenMode::Update => options.read(true).write(true),
            OpenMode::Write => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        options
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<OpenMode> {
        match s {
            "r" | "rb" => Ok(OpenMode::Read),
            "r+" | "rb+" | "r+b" => Ok(OpenMode::Update),
            "w" | "wb" => Ok(OpenMode::Write),
            "a" | "ab" => Ok(OpenMode::Append),
            _ => Err(Error::invalid_arg(
                "mode",
                format!("unsupported open mode '{s}'"),
            )),
        }
    }
}

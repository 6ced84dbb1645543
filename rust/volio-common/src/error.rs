use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the closed error code for this error.
    pub fn code(&self) -> ErrorCode {
        self.kind().code()
    }

    /// Returns the path of the file operation that failed, if any.
    ///
    /// For two-path operations (rename, copy) this is the source path.
    pub fn path(&self) -> Option<&Path> {
        self.kind().path()
    }

    /// Returns the underlying OS error, if any.
    pub fn io_source(&self) -> Option<&std::io::Error> {
        self.kind().io_source()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn not_found(name: impl Into<String>) -> Error {
        Error(ErrorKind::NotFound { name: name.into() }.into())
    }

    pub fn out_of_memory(requested: usize) -> Error {
        Error(ErrorKind::OutOfMemory { requested }.into())
    }

    pub fn buffer_overflow(limit: usize) -> Error {
        Error(ErrorKind::BufferOverflow { limit }.into())
    }

    pub fn open_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::OpenFailed {
                path: path.into(),
                source,
            }
            .into(),
        )
    }

    pub fn stat_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::StatFailed {
                path: path.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("failed to open '{}': {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("short write to '{}': {written} of {expected} bytes", path.display())]
    WriteFailed {
        path: PathBuf,
        written: usize,
        expected: usize,
        source: Option<std::io::Error>,
    },

    #[error("failed to flush '{}': {source}", path.display())]
    FlushFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to fsync '{}': {source}", path.display())]
    FsyncFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete '{}': {source}", path.display())]
    UnlinkFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to rename '{}' to '{}': {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove directory '{}': {source}", path.display())]
    RmdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to truncate '{}': {source}", path.display())]
    TruncateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to change owner of '{}': {source}", path.display())]
    ChownFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("formatted output exceeds the {limit} byte scratch buffer")]
    BufferOverflow { limit: usize },

    #[error("not found: {name}")]
    NotFound { name: String },

    #[error("failed to read directory '{}': {source}", path.display())]
    ReaddirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create directory '{}': {source}", path.display())]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to copy '{}' to '{}': {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to stat '{}': {source}", path.display())]
    StatFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to lock '{}': {source}", path.display())]
    LockFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },
}

impl ErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::OpenFailed { .. } => ErrorCode::OpenFailed,
            ErrorKind::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            ErrorKind::WriteFailed { .. } => ErrorCode::WriteFailed,
            ErrorKind::FlushFailed { .. } => ErrorCode::FlushFailed,
            ErrorKind::FsyncFailed { .. } => ErrorCode::FsyncFailed,
            ErrorKind::UnlinkFailed { .. } => ErrorCode::UnlinkFailed,
            ErrorKind::RenameFailed { .. } => ErrorCode::RenameFailed,
            ErrorKind::RmdirFailed { .. } => ErrorCode::RmdirFailed,
            ErrorKind::TruncateFailed { .. } => ErrorCode::TruncateFailed,
            ErrorKind::ChownFailed { .. } => ErrorCode::ChownFailed,
            ErrorKind::BufferOverflow { .. } => ErrorCode::BufferOverflow,
            ErrorKind::NotFound { .. } => ErrorCode::NotFound,
            ErrorKind::ReaddirFailed { .. } => ErrorCode::ReaddirFailed,
            ErrorKind::MkdirFailed { .. } => ErrorCode::MkdirFailed,
            ErrorKind::CopyFailed { .. } => ErrorCode::CopyFailed,
            ErrorKind::StatFailed { .. } => ErrorCode::StatFailed,
            ErrorKind::LockFailed { .. } => ErrorCode::LockFailed,
            ErrorKind::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            ErrorKind::InvalidOperation { .. } => ErrorCode::InvalidOperation,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ErrorKind::OpenFailed { path, .. }
            | ErrorKind::WriteFailed { path, .. }
            | ErrorKind::FlushFailed { path, .. }
            | ErrorKind::FsyncFailed { path, .. }
            | ErrorKind::UnlinkFailed { path, .. }
            | ErrorKind::RmdirFailed { path, .. }
            | ErrorKind::TruncateFailed { path, .. }
            | ErrorKind::ChownFailed { path, .. }
            | ErrorKind::ReaddirFailed { path, .. }
            | ErrorKind::MkdirFailed { path, .. }
            | ErrorKind::StatFailed { path, .. }
            | ErrorKind::LockFailed { path, .. } => Some(path),
            ErrorKind::RenameFailed { from, .. } | ErrorKind::CopyFailed { from, .. } => {
                Some(from)
            }
            ErrorKind::OutOfMemory { .. }
            | ErrorKind::BufferOverflow { .. }
            | ErrorKind::NotFound { .. }
            | ErrorKind::InvalidArgument { .. }
            | ErrorKind::InvalidOperation { .. } => None,
        }
    }

    pub fn io_source(&self) -> Option<&std::io::Error> {
        match self {
            ErrorKind::OpenFailed { source, .. }
            | ErrorKind::FlushFailed { source, .. }
            | ErrorKind::FsyncFailed { source, .. }
            | ErrorKind::UnlinkFailed { source, .. }
            | ErrorKind::RenameFailed { source, .. }
            | ErrorKind::RmdirFailed { source, .. }
            | ErrorKind::TruncateFailed { source, .. }
            | ErrorKind::ChownFailed { source, .. }
            | ErrorKind::ReaddirFailed { source, .. }
            | ErrorKind::MkdirFailed { source, .. }
            | ErrorKind::CopyFailed { source, .. }
            | ErrorKind::StatFailed { source, .. }
            | ErrorKind::LockFailed { source, .. } => Some(source),
            ErrorKind::WriteFailed { source, .. } => source.as_ref(),
            ErrorKind::OutOfMemory { .. }
            | ErrorKind::BufferOverflow { .. }
            | ErrorKind::NotFound { .. }
            | ErrorKind::InvalidArgument { .. }
            | ErrorKind::InvalidOperation { .. } => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

/// Closed set of failure categories, stable across platforms.
///
/// Callers map these to user-facing messages without looking at the
/// OS-specific error number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    OpenFailed = -101,
    OutOfMemory = -102,
    WriteFailed = -103,
    FlushFailed = -104,
    FsyncFailed = -105,
    UnlinkFailed = -106,
    RenameFailed = -107,
    RmdirFailed = -108,
    TruncateFailed = -109,
    ChownFailed = -110,
    BufferOverflow = -111,
    NotFound = -112,
    ReaddirFailed = -113,
    MkdirFailed = -114,
    CopyFailed = -115,
    StatFailed = -116,
    LockFailed = -117,
    InvalidArgument = -118,
    InvalidOperation = -119,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?} ({})", self.as_i32())
    }
}

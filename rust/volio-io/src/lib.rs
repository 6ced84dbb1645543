//! File-system plumbing for the volunteer-computing client.
//!
//! * [`filesys`]: delete, rename, open and friends, retried while another
//!   process briefly holds the file.
//! * [`MFile`]: an in-memory file committed to disk in one write.
//! * [`DirScanner`]: one-entry-at-a-time directory listing.
//! * [`FileLock`]: a cross-process lock held through a lock file.

pub mod dir_scan;
pub mod filesys;
pub mod fs;
pub mod lock;
pub mod mfile;
pub mod retry;

pub use dir_scan::{DirScanner, Entries};
pub use filesys::FileSystem;
pub use fs::{FilesystemInfo, NativeFs, OpenMode, PlatformFs, RawDir};
pub use lock::FileLock;
pub use mfile::{MFILE_SCRATCH_SIZE, MFile};
pub use retry::RetryPolicy;

pub use volio_common::{Error, ErrorCode, ErrorKind, Result};

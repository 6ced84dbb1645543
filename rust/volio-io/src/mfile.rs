//! Buffered commit files.
//!
//! An [`MFile`] collects an entire output (a checkpoint, a state file, an
//! RPC reply) in memory and writes it to disk in a single write followed by
//! a flush and, where the platform requires it, an `fsync`. This keeps the
//! window in which a crash leaves a half-written file as small as possible.

use std::{
    fmt,
    fs::File,
    io::{Seek, Write},
    path::{Path, PathBuf},
};

use volio_common::{Error, ErrorKind, Result, verify_arg};

use crate::{filesys::FileSystem, fs::OpenMode};

/// Size of the [`MFile::printf`] scratch buffer. A single call formats at
/// most `MFILE_SCRATCH_SIZE - 1` bytes; the last byte is reserved for the
/// terminator.
pub const MFILE_SCRATCH_SIZE: usize = 100_000;

/// Forces written data to stable storage through the platform that opened
/// the file.
pub(crate) type SyncFn = Box<dyn Fn(&File) -> std::io::Result<()> + Send>;

/// Appends formatted text to an [`MFile`], like `fprintf`.
///
/// Expands to a call to [`MFile::printf`] and evaluates to its result.
#[macro_export]
macro_rules! mfprintf {
    ($mfile:expr, $($arg:tt)*) => {
        $mfile.printf(::std::format_args!($($arg)*))
    };
}

/// A write-only file whose contents are held in memory until
/// [`flush`](MFile::flush) or [`close`](MFile::close).
///
/// The in-memory buffer always carries a trailing NUL byte after the logical
/// contents, so it can be handed to C-string consumers via
/// [`as_bytes_with_nul`](MFile::as_bytes_with_nul). The terminator is not
/// part of [`len`](MFile::len).
///
/// Dropping an `MFile` closes the underlying file without writing pending
/// bytes.
#[derive(Default)]
pub struct MFile {
    file: Option<File>,
    path: Option<PathBuf>,
    /// Contents plus NUL terminator; empty when nothing is pending.
    buf: Vec<u8>,
    /// Reused between `printf` calls.
    scratch: String,
    sync: Option<SyncFn>,
}

impl MFile {
    /// Creates an in-memory instance with no underlying file.
    ///
    /// The accumulated bytes can only be retrieved with
    /// [`take_buffer`](MFile::take_buffer).
    pub fn new() -> MFile {
        MFile::default()
    }

    /// Opens `path` through the retrying [`FileSystem::fopen`] with the
    /// default retry policy.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<MFile> {
        <FileSystem>::default().open_mfile(path, mode)
    }

    pub(crate) fn from_file(file: File, path: PathBuf, sync: SyncFn) -> MFile {
        MFile {
            file: Some(file),
            path: Some(path),
            buf: Vec::new(),
            scratch: String::new(),
            sync: Some(sync),
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of pending bytes, not counting the terminator.
    pub fn len(&self) -> usize {
        self.buf.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pending bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Pending bytes followed by the NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        if self.buf.is_empty() {
            b"\0".as_slice()
        } else {
            self.buf.as_slice()
        }
    }

    /// Formats `args` and appends the result.
    ///
    /// The output of a single call is limited to `MFILE_SCRATCH_SIZE - 1`
    /// bytes. Longer output is rejected with
    /// [`ErrorKind::BufferOverflow`] and nothing is appended.
    ///
    /// # Returns
    ///
    /// The number of bytes appended.
    pub fn printf(&mut self, args: fmt::Arguments<'_>) -> Result<usize> {
        self.scratch.clear();
        let mut scratch = BoundedWriter {
            out: &mut self.scratch,
            limit: MFILE_SCRATCH_SIZE,
        };
        if fmt::write(&mut scratch, args).is_err() {
            log::error!(
                "MFile::printf: output exceeds the {MFILE_SCRATCH_SIZE} byte buffer (format: {:?})",
                args.as_str().unwrap_or("<with arguments>")
            );
            self.scratch.clear();
            return Err(Error::buffer_overflow(MFILE_SCRATCH_SIZE));
        }
        let scratch = std::mem::take(&mut self.scratch);
        let result = self.append(scratch.as_bytes()).map(|()| scratch.len());
        self.scratch = scratch;
        result
    }

    /// Appends `count` elements of `size` bytes each, taken from the start
    /// of `data`.
    ///
    /// # Returns
    ///
    /// `count`, the number of complete elements appended.
    pub fn write(&mut self, data: &[u8], size: usize, count: usize) -> Result<usize> {
        let total = size.checked_mul(count);
        verify_arg!(count, total.is_some_and(|total| total <= data.len()));
        let total = total.unwrap_or_default();
        self.append(&data[..total])?;
        Ok(count)
    }

    pub fn put_char(&mut self, c: u8) -> Result<()> {
        self.append(&[c])
    }

    pub fn puts(&mut self, s: &str) -> Result<()> {
        self.append(s.as_bytes())
    }

    /// Writes all pending bytes to the file, then flushes it and forces it
    /// to disk.
    ///
    /// The pending length is reset to zero even if the write fails; the
    /// buffer's capacity is kept for reuse.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::InvalidOperation`] if no file is open.
    /// * [`ErrorKind::WriteFailed`] on a short or failed write.
    /// * [`ErrorKind::FlushFailed`] if flushing the stream fails.
    /// * [`ErrorKind::FsyncFailed`] if forcing the data to disk fails.
    pub fn flush(&mut self) -> Result<()> {
        let len = self.len();
        let path = self.path.clone().unwrap_or_default();
        let Some(file) = self.file.as_mut() else {
            return Err(Error::invalid_operation("flush of an unopened MFile"));
        };

        let (written, write_err) = write_counting(file, &self.buf[..len]);
        self.buf.clear();
        if written != len {
            return Err(ErrorKind::WriteFailed {
                path,
                written,
                expected: len,
                source: write_err,
            }
            .into());
        }

        if let Err(source) = file.flush() {
            return Err(ErrorKind::FlushFailed { path, source }.into());
        }
        let synced = self.sync.as_ref().map_or(Ok(()), |sync| sync(&*file));
        if let Err(source) = synced {
            return Err(ErrorKind::FsyncFailed { path, source }.into());
        }
        Ok(())
    }

    /// Flushes, then closes the file and releases the buffer regardless of
    /// the flush outcome.
    ///
    /// # Returns
    ///
    /// The result of the flush. Closing an in-memory instance just drops
    /// the buffer.
    pub fn close(mut self) -> Result<()> {
        let result = if self.file.is_some() {
            self.flush()
        } else {
            Ok(())
        };
        self.file = None;
        self.buf = Vec::new();
        result
    }

    /// Current position of the underlying file, `None` if no file is open.
    ///
    /// Pending bytes are not counted.
    pub fn tell(&mut self) -> Option<u64> {
        self.file.as_mut()?.stream_position().ok()
    }

    /// Moves the pending bytes out, leaving the instance empty.
    ///
    /// The returned vector does not include the terminator.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        let mut buf = std::mem::take(&mut self.buf);
        buf.pop();
        buf
    }

    fn append(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let additional = data.len() + usize::from(self.buf.is_empty());
        if self.buf.try_reserve(additional).is_err() {
            return Err(Error::out_of_memory(self.len() + data.len() + 1));
        }
        self.buf.pop();
        self.buf.extend_from_slice(data);
        self.buf.push(0);
        Ok(())
    }
}

impl Write for MFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf).map_err(std::io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        MFile::flush(self).map_err(std::io::Error::other)
    }
}

impl fmt::Debug for MFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .field("len", &self.len())
            .finish()
    }
}

impl Drop for MFile {
    fn drop(&mut self) {
        if self.file.is_some() && !self.is_empty() {
            log::warn!(
                "MFile '{}' dropped with {} unwritten bytes",
                self.path.as_deref().unwrap_or(Path::new("")).display(),
                self.len()
            );
        }
    }
}

/// `fmt::Write` sink that refuses to grow past `limit` bytes.
struct BoundedWriter<'a> {
    out: &'a mut String,
    limit: usize,
}

impl fmt::Write for BoundedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.out.len() + s.len() >= self.limit {
            return Err(fmt::Error);
        }
        self.out.push_str(s);
        Ok(())
    }
}

fn write_counting(file: &mut File, mut data: &[u8]) -> (usize, Option<std::io::Error>) {
    let mut written = 0;
    while !data.is_empty() {
        match file.write(data) {
            Ok(0) => {
                return (
                    written,
                    Some(std::io::Error::from(std::io::ErrorKind::WriteZero)),
                );
            }
            Ok(n) => {
                written += n;
                data = &data[n..];
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Some(e)),
        }
    }
    (written, None)
}

//! Directory scanning with the `scan()` / "no more entries" idiom.
//!
//! A [`DirScanner`] moves through three states: unopened (the directory
//! could not be opened), scanning, and exhausted. An unopened scanner
//! behaves exactly like an exhausted one, so callers can loop on
//! [`DirScanner::scan`] without checking validity first. Callers that need
//! to tell a missing directory from an empty one use [`DirScanner::open`].
//! There is no rewind; construct a new scanner to scan again.
//! [`DirScanner::entries`] adapts a scanner into an [`Iterator`].

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use volio_common::{Error, ErrorKind, Result};

use crate::fs::{NativeDir, RawDir, shared};

pub struct DirScanner<D: RawDir = NativeDir> {
    path: PathBuf,
    dir: Option<D>,
}

impl DirScanner<NativeDir> {
    /// Starts scanning `path`.
    ///
    /// A directory that can't be opened yields a scanner whose first
    /// [`scan`](DirScanner::scan) returns `None`.
    pub fn new(path: impl AsRef<Path>) -> DirScanner<NativeDir> {
        let path = path.as_ref();
        let dir = match NativeDir::open(path) {
            Ok(dir) => Some(dir),
            Err(e) => {
                log::debug!("cannot scan '{}': {e}", path.display());
                None
            }
        };
        DirScanner {
            path: path.to_path_buf(),
            dir,
        }
    }

    /// Starts scanning `path`, reporting a directory that can't be opened.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::NotFound`] if `path` does not exist.
    /// * [`ErrorKind::OpenFailed`] for any other failure (not a directory,
    ///   permission denied, ...).
    pub fn open(path: impl AsRef<Path>) -> Result<DirScanner<NativeDir>> {
        let path = path.as_ref();
        let dir = NativeDir::open(path).map_err(|e| open_error(path, e))?;
        Ok(DirScanner::from_raw(path, dir))
    }
}

impl<D: RawDir> DirScanner<D> {
    /// Wraps an already opened platform directory handle.
    pub fn from_raw(path: impl Into<PathBuf>, dir: D) -> DirScanner<D> {
        DirScanner {
            path: path.into(),
            dir: Some(dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` while the directory handle is held, i.e. before
    /// exhaustion or [`close`](DirScanner::close).
    pub fn is_open(&self) -> bool {
        self.dir.is_some()
    }

    /// Returns the bare name of the next entry, skipping `.` and `..`.
    ///
    /// Returns `None` once the directory is exhausted, and on every call
    /// after that. A read failure in the middle of the scan also ends it.
    pub fn scan(&mut self) -> Option<OsString> {
        match self.try_scan() {
            Ok(name) => name,
            Err(e) => {
                log::debug!("{e}");
                None
            }
        }
    }

    /// Like [`scan`](DirScanner::scan), but a read failure in the middle of
    /// the scan is returned as [`ErrorKind::ReaddirFailed`]. The scanner is
    /// exhausted afterwards either way.
    pub fn try_scan(&mut self) -> Result<Option<OsString>> {
        loop {
            let Some(dir) = self.dir.as_mut() else {
                return Ok(None);
            };
            match dir.read_name() {
                Ok(Some(name)) if shared::is_dot_entry(&name) => continue,
                Ok(Some(name)) => return Ok(Some(name)),
                Ok(None) => {
                    // Release the handle now rather than on drop.
                    self.dir = None;
                    return Ok(None);
                }
                Err(source) => {
                    self.dir = None;
                    return Err(ErrorKind::ReaddirFailed {
                        path: self.path.clone(),
                        source,
                    }
                    .into());
                }
            }
        }
    }

    /// Releases the directory handle before the scan is complete.
    pub fn close(&mut self) {
        self.dir = None;
    }

    /// Turns the scanner into an iterator over the remaining entry names.
    pub fn entries(self) -> Entries<D> {
        Entries { scanner: self }
    }
}

/// Iterator returned by [`DirScanner::entries`].
pub struct Entries<D: RawDir = NativeDir> {
    scanner: DirScanner<D>,
}

impl<D: RawDir> Iterator for Entries<D> {
    type Item = OsString;

    fn next(&mut self) -> Option<OsString> {
        self.scanner.scan()
    }
}

pub(crate) fn open_error(path: &Path, source: std::io::Error) -> Error {
    if source.kind() == std::io::ErrorKind::NotFound {
        Error::not_found(path.display().to_string())
    } else {
        Error::open_failed(path, source)
    }
}

//! Size-capped log file.
//!
//! `SizeCappedFile` is a plain `Write` sink appending to a file.  Before a write would take the
//! file over its cap, the current file is renamed to `<file>.1` (replacing any previous backup)
//! and a fresh file is started, so at most twice the cap is ever kept on disk.
//!

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

/// Default cap for log files (10 MiB).
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug)]
pub struct SizeCappedFile {
    /// Live file
    path: PathBuf,
    /// Cap in bytes
    max: u64,
    /// Current size of the live file
    size: u64,
    file: File,
}

impl SizeCappedFile {
    /// Open (or create) `path` in append mode, creating the parent directory if needed.
    ///
    #[tracing::instrument]
    pub fn open(path: &Path, max: u64) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                trace!("create log directory: {dir:?}");
                fs::create_dir_all(dir)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(SizeCappedFile {
            path: path.to_path_buf(),
            max,
            size,
            file,
        })
    }

    /// Where the previous generation goes
    ///
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".1");
        PathBuf::from(name)
    }

    /// Current size of the live file
    ///
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        fs::rename(&self.path, self.backup_path())?;
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.size = 0;
        Ok(())
    }
}

impl Write for SizeCappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A single record larger than the cap still lands in a fresh file.
        //
        if self.size > 0 && self.size + buf.len() as u64 > self.max {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

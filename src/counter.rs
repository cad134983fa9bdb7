//! Persisted lifetime click total.
//!
//! The counter is best-effort: a malformed file is rejected at startup, but
//! once a run is underway write failures only warn and the in-memory total
//! keeps counting. Flushes are batched to bound I/O frequency.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::AppError;

/// Clicks between periodic flushes. A crash loses at most one batch.
pub const FLUSH_EVERY: u64 = 50;

pub struct LifetimeCounter {
    path: PathBuf,
    total: u64,
    unflushed: u64,
}

impl LifetimeCounter {
    /// Reads the stored total. Absent or empty file means 0; anything that
    /// does not parse as a non-negative integer is a startup error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let total = match fs::read_to_string(&path) {
            Ok(contents) => parse_total(&path, &contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => 0,
            Err(err) => {
                return Err(AppError::Counter {
                    path,
                    message: err.to_string(),
                })
            }
        };
        Ok(Self {
            path,
            total,
            unflushed: 0,
        })
    }

    /// `<data_dir>/pulseclick/lifetime_clicks`, falling back to the current
    /// directory when the platform has no data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pulseclick")
            .join("lifetime_clicks")
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Adds one click, flushing every [`FLUSH_EVERY`] clicks.
    pub fn record_click(&mut self) {
        self.total += 1;
        self.unflushed += 1;
        if self.unflushed >= FLUSH_EVERY {
            self.flush();
        }
    }

    /// Writes the total out. Failures warn; the run goes on.
    pub fn flush(&mut self) {
        self.unflushed = 0;
        if let Err(err) = self.write_total() {
            warn!(path = %self.path.display(), error = %err, "failed to persist lifetime click count");
        }
    }

    fn write_total(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", self.total))
    }
}

fn parse_total(path: &Path, contents: &str) -> Result<u64, AppError> {
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let value: i64 = trimmed.parse().map_err(|_| AppError::Counter {
        path: path.to_path_buf(),
        message: format!("malformed count {trimmed:?}"),
    })?;
    u64::try_from(value).map_err(|_| AppError::Counter {
        path: path.to_path_buf(),
        message: format!("negative count {value}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_zero() {
        let dir = tempdir().unwrap();
        let counter = LifetimeCounter::load(dir.path().join("lifetime_clicks")).unwrap();
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn empty_file_loads_as_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifetime_clicks");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(LifetimeCounter::load(path).unwrap().total(), 0);
    }

    #[test]
    fn stored_total_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifetime_clicks");

        let mut counter = LifetimeCounter::load(&path).unwrap();
        counter.record_click();
        counter.record_click();
        counter.flush();

        assert_eq!(LifetimeCounter::load(&path).unwrap().total(), 2);
    }

    #[test]
    fn malformed_content_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifetime_clicks");
        fs::write(&path, "not-a-number").unwrap();
        assert!(matches!(
            LifetimeCounter::load(&path),
            Err(AppError::Counter { .. })
        ));
    }

    #[test]
    fn negative_content_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifetime_clicks");
        fs::write(&path, "-7\n").unwrap();
        assert!(matches!(
            LifetimeCounter::load(&path),
            Err(AppError::Counter { .. })
        ));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join("lifetime_clicks");
        let mut counter = LifetimeCounter::load(&path).unwrap();
        counter.record_click();
        counter.flush();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "1");
    }

    #[test]
    fn flush_happens_every_fifty_clicks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifetime_clicks");
        let mut counter = LifetimeCounter::load(&path).unwrap();

        for _ in 0..(FLUSH_EVERY - 1) {
            counter.record_click();
        }
        assert!(!path.exists(), "no flush before the batch fills");

        counter.record_click();
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim(),
            FLUSH_EVERY.to_string()
        );
    }
}

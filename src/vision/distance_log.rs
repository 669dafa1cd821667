//! CSV log of per-face distances, one row per detection.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const HEADER: &str = "Timestamp,Distance (cm)\n";
const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Appends `Timestamp,Distance (cm)` rows to a CSV file, truncating back to
/// a fresh header once the file grows past its size budget.
pub struct DistanceLog {
    path: PathBuf,
    file: fs::File,
    bytes_written: u64,
}

impl DistanceLog {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to open distance log '{}'", path.display()))?;
        file.write_all(HEADER.as_bytes())
            .context("failed to write distance log header")?;
        Ok(Self {
            path,
            file,
            bytes_written: HEADER.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one detection. Timestamps are wall-clock seconds since the
    /// epoch; the gate keeps its own monotonic clock, this file is for
    /// humans correlating sessions after the fact.
    pub fn record(&mut self, distance_cm: f32) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let line = format!("{timestamp},{distance_cm:.2}\n");
        self.rotate_if_needed(line.len())?;
        self.file
            .write_all(line.as_bytes())
            .context("failed to append distance log row")?;
        self.bytes_written = self.bytes_written.saturating_add(line.len() as u64);
        Ok(())
    }

    fn rotate_if_needed(&mut self, next_len: usize) -> Result<()> {
        if self.bytes_written.saturating_add(next_len as u64) <= LOG_MAX_BYTES {
            return Ok(());
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("failed to rotate distance log '{}'", self.path.display()))?;
        file.write_all(HEADER.as_bytes())
            .context("failed to rewrite distance log header")?;
        self.file = file;
        self.bytes_written = HEADER.len() as u64;
        Ok(())
    }
}

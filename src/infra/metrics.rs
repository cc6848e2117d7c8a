// ============================================================
// Layer 6 - Loss Curve CSV
// ============================================================
// One row per finished epoch in <checkpoint_dir>/metrics.csv:
//
//   epoch,train_loss,val_loss
//   1,5.123400,4.876500
//   2,4.201100,4.010200
//
// Rows are appended, so a re-run into the same directory keeps
// extending the file under the original header.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "epoch,train_loss,val_loss";

/// Mean losses for a single epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// NaN never counts as better.
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }

    fn to_row(&self) -> String {
        format!("{},{:.6},{:.6}", self.epoch, self.train_loss, self.val_loss)
    }

    fn from_row(line: &str) -> Result<Self> {
        let cols: Vec<&str> = line.split(',').collect();
        let [epoch, train, val] = cols.as_slice() else {
            bail!("expected 3 columns, found {} in '{line}'", cols.len());
        };
        Ok(Self::new(epoch.parse()?, train.parse()?, val.parse()?))
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            fs::write(&csv_path, format!("{HEADER}\n"))
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            tracing::debug!("Started loss log at '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;
        writeln!(f, "{}", m.to_row())?;

        tracing::debug!(epoch = m.epoch, train_loss = m.train_loss, val_loss = m.val_loss, "epoch logged");
        Ok(())
    }

    /// Every row written so far, oldest first.
    pub fn read_history(&self) -> Result<Vec<EpochMetrics>> {
        read_csv(&self.csv_path)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn read_csv(path: &Path) -> Result<Vec<EpochMetrics>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let mut lines = text.lines();
    match lines.next() {
        Some(HEADER) => {}
        other => bail!("'{}' has unexpected header {:?}", path.display(), other),
    }
    lines
        .filter(|l| !l.trim().is_empty())
        .map(EpochMetrics::from_row)
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_never_an_improvement() {
        assert!(EpochMetrics::new(1, 3.0, 2.9).is_improvement(f64::INFINITY));
        assert!(!EpochMetrics::new(1, 3.0, f64::NAN).is_improvement(f64::INFINITY));
        assert!(!EpochMetrics::new(2, 1.0, 2.5).is_improvement(2.0));
    }

    #[test]
    fn test_rows_follow_single_header() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path()).unwrap()
            .log(&EpochMetrics::new(1, 3.5, 3.25)).unwrap();

        let reopened = MetricsLogger::new(dir.path()).unwrap();
        reopened.log(&EpochMetrics::new(2, 2.0, 2.5)).unwrap();

        let csv = fs::read_to_string(reopened.csv_path()).unwrap();
        assert_eq!(
            csv,
            "epoch,train_loss,val_loss\n1,3.500000,3.250000\n2,2.000000,2.500000\n"
        );
        assert_eq!(
            reopened.read_history().unwrap(),
            vec![EpochMetrics::new(1, 3.5, 3.25), EpochMetrics::new(2, 2.0, 2.5)]
        );
    }

    #[test]
    fn test_malformed_row_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        fs::write(logger.csv_path(), "epoch,train_loss,val_loss\n1,2.0\n").unwrap();
        assert!(logger.read_history().is_err());
    }
}

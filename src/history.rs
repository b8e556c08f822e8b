//! Flat-file briefing history
//!
//! Each completed run is written as one pretty-printed JSON file named after
//! its timestamp. The store assumes a single writer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::workflow::RunState;
use crate::{HealthGuardError, Result};

const FILE_PREFIX: &str = "briefing_";
const FILE_SUFFIX: &str = ".json";

/// Summary of a past run as persisted on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingRecord {
    #[serde(default)]
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_score: f64,
    pub risk_level: String,
    #[serde(default)]
    pub confidence: String,
    pub briefing_text: String,
}

impl From<&RunState> for BriefingRecord {
    fn from(state: &RunState) -> Self {
        Self {
            run_id: state.run_id.clone(),
            timestamp: state.timestamp,
            risk_score: state.risk_score,
            risk_level: state.risk_level_label().to_string(),
            confidence: state.confidence_label().to_string(),
            briefing_text: state.briefing_text.clone(),
        }
    }
}

/// Simple aggregates over a set of records
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryStats {
    pub count: usize,
    pub average_score: Option<f64>,
}

impl HistoryStats {
    #[must_use]
    pub fn from_records(records: &[BriefingRecord]) -> Self {
        let count = records.len();
        let average_score = (count > 0)
            .then(|| records.iter().map(|r| r.risk_score).sum::<f64>() / count as f64);
        Self {
            count,
            average_score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BriefingHistory {
    directory: PathBuf,
}

impl BriefingHistory {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist a finished run and return the file it was written to
    pub fn save(&self, state: &RunState) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            HealthGuardError::history(format!(
                "cannot create {}: {e}",
                self.directory.display()
            ))
        })?;

        let record = BriefingRecord::from(state);
        let path = self.directory.join(file_name(record.timestamp));
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json)?;

        info!("Saved briefing {} to {}", record.run_id, path.display());
        Ok(path)
    }

    /// Records from the last `days` days, newest first
    pub fn get_recent(&self, days: u32) -> Result<Vec<BriefingRecord>> {
        self.recent_since(cutoff_for(Utc::now(), days))
    }

    fn recent_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<BriefingRecord>> {
        if !self.directory.exists() {
            debug!("History directory {} does not exist yet", self.directory.display());
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if !is_briefing_file(&path) {
                continue;
            }
            match read_record(&path) {
                Ok(record) if record.timestamp >= cutoff => records.push(record),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable briefing {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

/// Start of a `days`-long window ending at `now`; windows reaching past the
/// representable range include everything
fn cutoff_for(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn file_name(timestamp: DateTime<Utc>) -> String {
    format!(
        "{FILE_PREFIX}{}{FILE_SUFFIX}",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

fn is_briefing_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX))
}

fn read_record(path: &Path) -> Result<BriefingRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

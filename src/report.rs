use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::utils::error::Result;

/// One observation of the form, appended to the report file each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub timestamp: DateTime<Utc>,
    pub available: bool,
    pub shifts: Vec<String>,
    #[serde(default)]
    pub new_shifts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    pub fn success(shifts: Vec<String>, new_shifts: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            available: !shifts.is_empty(),
            shifts,
            new_shifts,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            available: false,
            shifts: Vec::new(),
            new_shifts: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Append-only JSON report: the file holds one array, read fully and
/// rewritten wholesale on every append. Unreadable content starts over as
/// an empty array rather than failing the cycle.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, entry: ReportEntry) -> Result<()> {
        let mut entries = self.read_entries();
        entries.push(entry);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Self-healing read: a missing file, corrupt JSON, or non-array
    /// content all come back as an empty list.
    pub fn read_entries(&self) -> Vec<ReportEntry> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }
}

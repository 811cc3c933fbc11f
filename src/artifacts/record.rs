use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Tag carried by every config record.
pub const TASK_TYPE: &str = "web_scraper";

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected task_type {found:?}, expected \"web_scraper\"")]
    TaskType { found: String },
}

/// One scrape task request as handed to the crawler notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub task_type: String,
    pub prompt: String,
    pub url: String,
    /// Comma-separated attribute names, kept exactly as entered.
    pub filters: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ConfigRecord {
    pub fn new(
        prompt: impl Into<String>,
        url: impl Into<String>,
        filters: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            task_type: TASK_TYPE.to_string(),
            prompt: prompt.into(),
            url: url.into(),
            filters: filters.into(),
            timestamp,
        }
    }

    /// Individual filter names, trimmed, with empty entries dropped.
    pub fn filter_list(&self) -> Vec<&str> {
        self.filters
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, RecordError> {
        let record: ConfigRecord = serde_json::from_slice(bytes)?;
        if record.task_type != TASK_TYPE {
            return Err(RecordError::TaskType {
                found: record.task_type,
            });
        }
        Ok(record)
    }
}

// Older configs carry a naive local timestamp with no offset; those are read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

//! Snapshots of long-running import and scrape jobs owned by the job backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FreightError, FreightResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    #[default]
    Import,
    Scrape,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Scrape => write!(f, "scrape"),
        }
    }
}

/// Job lifecycle; accepts the spellings the job backend has used over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[serde(alias = "pending")]
    Queued,
    #[serde(alias = "processing", alias = "in_progress")]
    Running,
    #[serde(alias = "success", alias = "completed")]
    Succeeded,
    #[serde(alias = "error")]
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(alias = "id")]
    pub job_id: String,
    #[serde(default)]
    pub kind: JobKind,
    #[serde(alias = "status")]
    pub state: JobState,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn new(job_id: impl Into<String>, kind: JobKind, state: JobState) -> Self {
        Self {
            job_id: job_id.into(),
            kind,
            state,
            progress: 0,
            counters: BTreeMap::new(),
            updated_at: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Second-phase configuration chained after a successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filter_mode: String,
}

impl ScrapeConfig {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        filter_mode: impl Into<String>,
    ) -> FreightResult<Self> {
        let filter_mode = filter_mode.into();
        if end_date < start_date {
            return Err(FreightError::ValidationError(
                "The end date must not be before the start date.".to_string(),
            ));
        }
        if filter_mode.trim().is_empty() {
            return Err(FreightError::ValidationError(
                "A filter mode is required.".to_string(),
            ));
        }
        Ok(Self {
            start_date,
            end_date,
            filter_mode,
        })
    }
}

use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Messages longer than this are truncated before they are recorded
pub const MAX_MESSAGE_LEN: usize = 1000;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogStatus {
    Started,
    InProgress,
    Completed,
    Failed,
    Warning,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogCategory {
    System,
    Remote,
    Ai,
    User,
    Error,
    Warning,
    Info,
}

/// One append-only progress record. Entries are immutable once written;
/// only the retention cleanup removes them, and failure entries are exempt.
#[derive(Clone, Debug, Deserialize, Serialize, TypedBuilder)]
pub struct ExecutionLogEntry {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,
    pub job_id: Uuid,
    pub status: LogStatus,
    #[builder(default = LogCategory::Info)]
    pub category: LogCategory,
    #[builder(setter(into))]
    pub message: String,
    #[builder(default)]
    pub progress: u8,
    #[builder(default, setter(strip_option))]
    pub details: Option<serde_json::Value>,
    #[builder(default = Timestamp::now_utc())]
    pub timestamp: Timestamp,
}

/// Query shape for log listings; results are always newest-first
#[derive(Clone, Debug, TypedBuilder)]
pub struct LogFilter {
    #[builder(default, setter(strip_option))]
    pub category: Option<LogCategory>,
    #[builder(default, setter(strip_option))]
    pub status: Option<LogStatus>,
    #[builder(default = 100)]
    pub limit: usize,
    #[builder(default)]
    pub skip: usize,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::builder().build()
    }
}

use crate::{
    model::execution_log::{ExecutionLogEntry, LogFilter, LogStatus},
    Db,
};
use iso8601_timestamp::Timestamp;
use uuid::Uuid;

impl Db {
    pub fn append_log(&self, entry: ExecutionLogEntry) {
        self.inner.logs.write().push(entry);
    }

    /// Entries for one job, newest first, filtered and paginated
    #[must_use]
    pub fn logs_for_job(&self, job_id: Uuid, filter: &LogFilter) -> Vec<ExecutionLogEntry> {
        self.inner
            .logs
            .read()
            .iter()
            .rev()
            .filter(|entry| entry.job_id == job_id)
            .filter(|entry| filter.category.map_or(true, |wanted| wanted == entry.category))
            .filter(|entry| filter.status.map_or(true, |wanted| wanted == entry.status))
            .skip(filter.skip)
            .take(filter.limit)
            .cloned()
            .collect()
    }

    /// Drop entries older than the cutoff. Failure entries are kept so
    /// post-mortems stay possible after the regular retention window.
    pub fn purge_logs_older_than(&self, cutoff: Timestamp) -> usize {
        let mut logs = self.inner.logs.write();
        let before = logs.len();

        logs.retain(|entry| entry.timestamp >= cutoff || entry.status == LogStatus::Failed);

        before - logs.len()
    }
}

use fieldsmith_db::{
    model::execution_log::{
        ExecutionLogEntry, LogCategory, LogFilter, LogStatus, MAX_MESSAGE_LEN,
    },
    Db,
};
use iso8601_timestamp::{Duration, Timestamp};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// One progress event to append to a job's trail
#[derive(Debug, TypedBuilder)]
pub struct LogEvent {
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
}

/// Append-only sink for per-job progress events. The log trail is the only
/// failure-visibility channel a caller gets, so recording never fails and
/// never interrupts a run.
#[derive(Clone, TypedBuilder)]
pub struct ExecutionLogService {
    db: Db,
}

impl ExecutionLogService {
    pub fn record(&self, event: LogEvent) {
        let mut message = event.message;
        if message.len() > MAX_MESSAGE_LEN {
            let mut cut = MAX_MESSAGE_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }

        let entry = ExecutionLogEntry::builder()
            .job_id(event.job_id)
            .status(event.status)
            .category(event.category)
            .message(message);
        let entry = match event.details {
            Some(details) => entry.details(details).progress(event.progress).build(),
            None => entry.progress(event.progress).build(),
        };

        self.db.append_log(entry);
    }

    #[must_use]
    pub fn logs_for_job(&self, job_id: Uuid, filter: &LogFilter) -> Vec<ExecutionLogEntry> {
        self.db.logs_for_job(job_id, filter)
    }

    /// Age-based retention sweep; failure entries are exempt
    pub fn purge_older_than(&self, days: u32) -> usize {
        let cutoff = Timestamp::now_utc() - Duration::days(i64::from(days));
        self.db.purge_logs_older_than(cutoff)
    }
}

#[cfg(test)]
mod test {
    use super::{ExecutionLogService, LogEvent};
    use fieldsmith_db::{
        model::execution_log::{
            ExecutionLogEntry, LogCategory, LogFilter, LogStatus, MAX_MESSAGE_LEN,
        },
        Db,
    };
    use iso8601_timestamp::{Duration, Timestamp};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn service() -> (ExecutionLogService, Db) {
        let db = Db::default();
        (ExecutionLogService::builder().db(db.clone()).build(), db)
    }

    fn event(job_id: Uuid, status: LogStatus, message: &str) -> LogEvent {
        LogEvent::builder()
            .job_id(job_id)
            .status(status)
            .message(message)
            .build()
    }

    #[test]
    fn entries_come_back_newest_first() {
        let (service, _db) = service();
        let job_id = Uuid::now_v7();

        service.record(event(job_id, LogStatus::Started, "first"));
        service.record(event(job_id, LogStatus::InProgress, "second"));
        service.record(event(job_id, LogStatus::Completed, "third"));

        let messages: Vec<String> = service
            .logs_for_job(job_id, &LogFilter::default())
            .into_iter()
            .map(|entry| entry.message)
            .collect();

        assert_eq!(messages, vec!["third", "second", "first"]);
    }

    #[test]
    fn filters_and_pagination_apply() {
        let (service, _db) = service();
        let job_id = Uuid::now_v7();
        let other_job = Uuid::now_v7();

        for i in 0..5 {
            service.record(event(job_id, LogStatus::InProgress, &format!("step {i}")));
        }
        service.record(event(job_id, LogStatus::Warning, "field skipped"));
        service.record(event(other_job, LogStatus::Started, "unrelated"));

        let warnings = service.logs_for_job(
            job_id,
            &LogFilter::builder().status(LogStatus::Warning).build(),
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].message, "field skipped");

        let page = service.logs_for_job(job_id, &LogFilter::builder().limit(2).skip(1).build());
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].message, "step 4");
        assert_eq!(page[1].message, "step 3");
    }

    #[test]
    fn long_messages_are_truncated() {
        let (service, _db) = service();
        let job_id = Uuid::now_v7();

        service.record(event(job_id, LogStatus::InProgress, &"x".repeat(4000)));

        let entries = service.logs_for_job(job_id, &LogFilter::default());
        assert_eq!(entries[0].message.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn retention_keeps_failure_entries() {
        let (service, db) = service();
        let job_id = Uuid::now_v7();
        let stale = Timestamp::now_utc() - Duration::days(40);

        db.append_log(
            ExecutionLogEntry::builder()
                .job_id(job_id)
                .status(LogStatus::InProgress)
                .message("old progress")
                .timestamp(stale)
                .build(),
        );
        db.append_log(
            ExecutionLogEntry::builder()
                .job_id(job_id)
                .status(LogStatus::Failed)
                .message("old failure")
                .timestamp(stale)
                .build(),
        );
        service.record(event(job_id, LogStatus::InProgress, "fresh"));

        let purged = service.purge_older_than(30);
        assert_eq!(purged, 1);

        let remaining = service.logs_for_job(job_id, &LogFilter::default());
        let messages: Vec<&str> = remaining.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["fresh", "old failure"]);
    }
}

use ahash::AHashMap;
use fieldsmith_db::{
    model::two_factor::{TwoFactorRequest, TwoFactorStatus},
    Db,
};
use fieldsmith_error::{bail, ErrorType, Result};
use iso8601_timestamp::Timestamp;
use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Notify, time::Instant};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Hand-off channel for out-of-band security codes.
///
/// An executor opens a mailbox when the remote challenges the login and then
/// suspends on it; any authenticated caller holding the job id deposits the
/// code, which wakes the executor. The wait is signal-driven with a single
/// absolute deadline, after which the entry expires and the run fails.
#[derive(Clone, TypedBuilder)]
pub struct TwoFactorRelay {
    db: Db,
    #[builder(default, setter(skip))]
    wakers: Arc<Mutex<AHashMap<Uuid, Arc<Notify>>>>,
}

impl TwoFactorRelay {
    /// Create the mailbox for a job and return its expiry
    pub fn open(&self, job_id: Uuid, email: &str, timeout: Duration) -> Timestamp {
        let now = Timestamp::now_utc();
        let expires_at = now + timeout;

        self.db.upsert_two_factor(TwoFactorRequest {
            job_id,
            email: email.to_owned(),
            status: TwoFactorStatus::Waiting,
            code: None,
            expires_at,
            created_at: now,
        });
        self.wakers.lock().entry(job_id).or_default();

        expires_at
    }

    /// Deposit a code and wake the waiting executor. Fire-and-forget for the
    /// caller; consumption happens on the executor side.
    pub fn deposit(&self, job_id: Uuid, code: &str) -> Result<()> {
        let updated = self.db.update_two_factor(job_id, |entry| {
            if entry.status == TwoFactorStatus::Expired {
                return false;
            }

            entry.status = TwoFactorStatus::Received;
            entry.code = Some(code.to_owned());
            true
        });

        match updated {
            None => bail!(
                type = ErrorType::NotFound,
                format!("no code request open for job {job_id}")
            ),
            Some(false) => bail!(
                type = ErrorType::InvalidState(Some("expired".into())),
                "the code request has expired"
            ),
            Some(true) => {}
        }

        let _ = self
            .db
            .update_job(job_id, |job| job.two_factor_code = Some(code.to_owned()));

        if let Some(notify) = self.wakers.lock().get(&job_id) {
            notify.notify_one();
        }

        Ok(())
    }

    /// Suspend until a code is delivered or the absolute deadline passes.
    /// `None` means the deadline elapsed and the entry is now expired.
    pub async fn wait_for_code(&self, job_id: Uuid, deadline: Instant) -> Option<String> {
        let notify = self.waker(job_id);

        loop {
            if let Some(code) = self.take_delivered(job_id) {
                return Some(code);
            }

            tokio::select! {
                () = notify.notified() => {}
                () = tokio::time::sleep_until(deadline) => {
                    self.db
                        .update_two_factor(job_id, |entry| entry.status = TwoFactorStatus::Expired);
                    return None;
                }
            }
        }
    }

    /// The remote rejected the delivered code; arm the mailbox again.
    /// The original expiry stays in force.
    pub fn reopen(&self, job_id: Uuid) {
        self.db.update_two_factor(job_id, |entry| {
            entry.status = TwoFactorStatus::Waiting;
            entry.code = None;
        });
        let _ = self.db.update_job(job_id, |job| job.two_factor_code = None);
    }

    /// Tear the mailbox down once the run no longer needs it
    pub fn close(&self, job_id: Uuid) {
        self.wakers.lock().remove(&job_id);
        self.db.remove_two_factor(job_id);
    }

    fn take_delivered(&self, job_id: Uuid) -> Option<String> {
        let code = self
            .db
            .update_two_factor(job_id, |entry| {
                if entry.status == TwoFactorStatus::Received {
                    entry.code.take()
                } else {
                    None
                }
            })
            .flatten();

        if code.is_some() {
            let _ = self.db.update_job(job_id, |job| job.two_factor_code = None);
        }

        code
    }

    fn waker(&self, job_id: Uuid) -> Arc<Notify> {
        Arc::clone(self.wakers.lock().entry(job_id).or_default())
    }
}

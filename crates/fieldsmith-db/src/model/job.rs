use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
pub enum JobState {
    #[serde(rename = "PENDING")]
    #[strum(serialize = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    #[strum(serialize = "RUNNING")]
    Running,
    #[serde(rename = "WAITING_2FA")]
    #[strum(serialize = "WAITING_2FA")]
    WaitingTwoFactor,
    #[serde(rename = "REENTER_2FA")]
    #[strum(serialize = "REENTER_2FA")]
    ReenterTwoFactor,
    #[serde(rename = "COMPLETED")]
    #[strum(serialize = "COMPLETED")]
    Completed,
    #[serde(rename = "FAILED")]
    #[strum(serialize = "FAILED")]
    Failed,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Waiting on a security code, either the first one or a re-entry
    #[must_use]
    pub fn awaits_code(self) -> bool {
        matches!(self, Self::WaitingTwoFactor | Self::ReenterTwoFactor)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum StateError {
    #[error("job can only start from PENDING, found {0}")]
    NotPending(JobState),

    #[error("invalid transition {from} -> {to}")]
    Invalid { from: JobState, to: JobState },
}

#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Free-form company metadata attached to a submission.
///
/// The set fields are merged into the custom-value map under their public
/// field names before the job is created.
#[derive(Clone, Debug, Default, Deserialize, Serialize, TypedBuilder)]
pub struct CompanyProfile {
    #[builder(default, setter(strip_option, into))]
    pub name: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub owner_first_name: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub email: Option<String>,
    /// Raw 10-digit phone number; formatted renderings are derived from it
    #[builder(default, setter(strip_option, into))]
    pub phone: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub global_button_colors: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub broad_service_name: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub sub_headline_text: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub gmb_link: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub facebook_link: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub google_map_embed: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub gmb_review_link: Option<String>,
    #[builder(default, setter(strip_option, into))]
    pub instagram_link: Option<String>,
    /// Ask the content backend to derive "Broad Service Name"
    #[builder(default)]
    pub generate_broad_service: bool,
    /// Ask the content backend to derive "Sub Headline Text"
    #[builder(default)]
    pub generate_sub_headline: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, TypedBuilder)]
pub struct Job {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub created_by: Uuid,
    #[builder(setter(into))]
    pub name: String,
    pub credentials: Credentials,
    #[builder(setter(into))]
    pub subaccount_id: String,
    #[builder(default)]
    pub custom_values: BTreeMap<String, String>,
    #[builder(default)]
    pub company: CompanyProfile,
    #[builder(default)]
    pub service_text: Option<String>,

    #[builder(default = JobState::Pending)]
    pub state: JobState,
    #[builder(default)]
    pub progress: u8,
    /// Delivered security code, cleared once the run consumes it
    #[builder(default, setter(skip))]
    pub two_factor_code: Option<String>,

    #[builder(default = Timestamp::now_utc())]
    pub created_at: Timestamp,
    #[builder(default, setter(skip))]
    pub started_at: Option<Timestamp>,
    #[builder(default, setter(skip))]
    pub completed_at: Option<Timestamp>,
    #[builder(default, setter(skip))]
    pub failed_at: Option<Timestamp>,
    #[builder(default, setter(skip))]
    pub error_message: Option<String>,
}

impl Job {
    /// Begin execution. Resets progress and stamps `started_at`.
    pub fn start(&mut self) -> Result<(), StateError> {
        if self.state != JobState::Pending {
            return Err(StateError::NotPending(self.state));
        }

        self.state = JobState::Running;
        self.progress = 0;
        self.started_at = Some(Timestamp::now_utc());

        Ok(())
    }

    /// Progress is clamped to 0..=100 and never decreases outside of
    /// `start()`. Reaching 100 while running completes the job.
    pub fn update_progress(&mut self, progress: u8) {
        if self.state.is_terminal() {
            return;
        }

        self.progress = progress.min(100).max(self.progress);

        if self.progress == 100 && self.state == JobState::Running {
            self.state = JobState::Completed;
            self.completed_at = Some(Timestamp::now_utc());
        }
    }

    /// Mark the job failed. The first failure wins; later calls are no-ops.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }

        self.state = JobState::Failed;
        self.failed_at = Some(Timestamp::now_utc());
        self.error_message = Some(message.into());
    }

    /// The remote challenged the login; suspend until a code arrives
    pub fn await_two_factor(&mut self) -> Result<(), StateError> {
        if self.state != JobState::Running {
            return Err(StateError::Invalid {
                from: self.state,
                to: JobState::WaitingTwoFactor,
            });
        }

        self.state = JobState::WaitingTwoFactor;
        Ok(())
    }

    /// The remote rejected the delivered code; a fresh one is required
    pub fn reject_two_factor(&mut self) -> Result<(), StateError> {
        if !self.state.awaits_code() {
            return Err(StateError::Invalid {
                from: self.state,
                to: JobState::ReenterTwoFactor,
            });
        }

        self.state = JobState::ReenterTwoFactor;
        Ok(())
    }

    /// A code was accepted by the remote; execution continues
    pub fn resume(&mut self) -> Result<(), StateError> {
        if !self.state.awaits_code() {
            return Err(StateError::Invalid {
                from: self.state,
                to: JobState::Running,
            });
        }

        self.state = JobState::Running;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{Credentials, Job, JobState, StateError};
    use uuid::Uuid;

    fn job() -> Job {
        Job::builder()
            .workspace_id(Uuid::now_v7())
            .created_by(Uuid::now_v7())
            .name("test run")
            .credentials(Credentials {
                email: "owner@example.com".into(),
                password: "hunter2".into(),
            })
            .subaccount_id("sub-1")
            .build()
    }

    #[test]
    fn start_only_from_pending() {
        let mut job = job();
        assert_eq!(job.state, JobState::Pending);

        job.start().unwrap();
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.progress, 0);
        assert!(job.started_at.is_some());

        assert_eq!(job.start(), Err(StateError::NotPending(JobState::Running)));
    }

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let mut job = job();
        job.start().unwrap();

        job.update_progress(40);
        assert_eq!(job.progress, 40);

        job.update_progress(10);
        assert_eq!(job.progress, 40);

        job.update_progress(250);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn full_progress_completes_the_job() {
        let mut job = job();
        job.start().unwrap();

        job.update_progress(100);
        assert_eq!(job.state, JobState::Completed);
        assert!(job.completed_at.is_some());

        // terminal states never transition out
        job.fail("too late");
        assert_eq!(job.state, JobState::Completed);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn fail_keeps_the_first_error() {
        let mut job = job();
        job.start().unwrap();

        job.fail("first");
        let failed_at = job.failed_at;

        job.fail("second");
        assert_eq!(job.error_message.as_deref(), Some("first"));
        assert_eq!(job.failed_at, failed_at);
    }

    #[test]
    fn two_factor_round_trip() {
        let mut job = job();
        job.start().unwrap();

        job.await_two_factor().unwrap();
        assert_eq!(job.state, JobState::WaitingTwoFactor);

        job.reject_two_factor().unwrap();
        assert_eq!(job.state, JobState::ReenterTwoFactor);

        // a second rejection keeps the job waiting for re-entry
        job.reject_two_factor().unwrap();
        assert_eq!(job.state, JobState::ReenterTwoFactor);

        job.resume().unwrap();
        assert_eq!(job.state, JobState::Running);

        assert!(job.resume().is_err());
        assert!(job.await_two_factor().is_ok());
    }

    #[test]
    fn fail_from_waiting_states() {
        let mut job = job();
        job.start().unwrap();
        job.await_two_factor().unwrap();

        job.fail("no code arrived");
        assert_eq!(job.state, JobState::Failed);
        assert!(job.failed_at.is_some());
    }
}

use crate::{schema, JobRunnerContext};
use fieldsmith_core::{
    consts::{custom_values_url, selectors},
    traits::{RemoteDriver, RemoteSession, SessionError},
};
use fieldsmith_db::model::{
    execution_log::{LogCategory, LogStatus},
    job::Job as JobRecord,
};
use fieldsmith_error::{bail, fieldsmith_error, Error, ErrorType, Result};
use fieldsmith_service::execution_log::LogEvent;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Drive one subaccount through the full field-population workflow:
/// log in, clear the security-code challenge if one comes up, then walk
/// the field plan and report progress per field.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ProvisionSubaccount {
    pub job_id: Uuid,
}

impl ProvisionSubaccount {
    #[instrument(skip_all, fields(job_id = %self.job_id))]
    pub async fn run<D>(&self, ctx: &JobRunnerContext<D>) -> Result<()>
    where
        D: RemoteDriver,
    {
        let record = ctx.db.job(self.job_id).ok_or_else(
            || fieldsmith_error!(type = ErrorType::NotFound, format!("job {} not found", self.job_id)),
        )?;

        ctx.db.update_job(record.id, JobRecord::start)??;
        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::Started)
                .category(LogCategory::System)
                .message("Provisioning run started")
                .build(),
        );

        let mut session = match ctx.driver.open().await {
            Ok(session) => session,
            Err(error) => {
                let message = format!("remote session could not be opened: {error}");
                ctx.db
                    .update_job(record.id, |job| job.fail(message.as_str()))?;
                ctx.logs.record(
                    LogEvent::builder()
                        .job_id(record.id)
                        .status(LogStatus::Failed)
                        .category(LogCategory::Error)
                        .message(message.clone())
                        .build(),
                );
                bail!(message);
            }
        };

        let outcome = self.execute(ctx, &mut session, &record).await;

        // the session must be gone before the queue advances behind us
        session.close().await;

        match outcome {
            Ok(()) => {
                ctx.db
                    .update_job(record.id, |job| job.update_progress(100))?;
                ctx.logs.record(
                    LogEvent::builder()
                        .job_id(record.id)
                        .status(LogStatus::Completed)
                        .category(LogCategory::System)
                        .message("Provisioning completed successfully")
                        .progress(100)
                        .build(),
                );
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                ctx.relay.close(record.id);
                ctx.db
                    .update_job(record.id, |job| job.fail(message.as_str()))?;
                ctx.logs.record(
                    LogEvent::builder()
                        .job_id(record.id)
                        .status(LogStatus::Failed)
                        .category(LogCategory::Error)
                        .message(format!("Provisioning failed: {message}"))
                        .build(),
                );
                Err(error)
            }
        }
    }

    async fn execute<D>(
        &self,
        ctx: &JobRunnerContext<D>,
        session: &mut D::Session,
        record: &JobRecord,
    ) -> Result<()>
    where
        D: RemoteDriver,
    {
        self.login(ctx, session, record).await?;
        self.populate(ctx, session, record).await
    }

    async fn login<D>(
        &self,
        ctx: &JobRunnerContext<D>,
        session: &mut D::Session,
        record: &JobRecord,
    ) -> Result<()>
    where
        D: RemoteDriver,
    {
        let remote = &ctx.config.remote;

        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::InProgress)
                .category(LogCategory::Remote)
                .message("Starting remote login")
                .build(),
        );

        session
            .navigate(remote.base_url.as_str())
            .await
            .map_err(auth_failure)?;

        let form_loaded = session
            .wait_for(
                selectors::EMAIL_INPUT,
                Duration::from_secs(remote.page_load_secs),
            )
            .await
            .map_err(auth_failure)?;
        if !form_loaded {
            bail!(type = ErrorType::Authentication, "login form did not load");
        }

        session
            .fill(selectors::EMAIL_INPUT, &record.credentials.email)
            .await
            .map_err(auth_failure)?;
        session
            .fill(selectors::PASSWORD_INPUT, &record.credentials.password)
            .await
            .map_err(auth_failure)?;
        session
            .click(selectors::LOGIN_BUTTON)
            .await
            .map_err(auth_failure)?;

        let challenged = session
            .wait_for(
                selectors::SEND_SECURITY_CODE_BUTTON,
                Duration::from_secs(remote.challenge_wait_secs),
            )
            .await
            .map_err(auth_failure)?;

        if challenged {
            session
                .click(selectors::SEND_SECURITY_CODE_BUTTON)
                .await
                .map_err(auth_failure)?;
            self.pass_two_factor(ctx, session, record).await?;
        } else {
            let logged_in = session
                .wait_for(
                    selectors::DASHBOARD_MARKER,
                    Duration::from_secs(remote.element_wait_secs),
                )
                .await
                .map_err(auth_failure)?;
            if !logged_in {
                bail!(type = ErrorType::Authentication, "remote login was rejected");
            }
        }

        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::InProgress)
                .category(LogCategory::Remote)
                .message("Remote login succeeded")
                .build(),
        );

        Ok(())
    }

    /// Suspend on the relay until a code clears the challenge or the
    /// absolute deadline passes. Rejected codes re-arm the mailbox; there is
    /// no attempt ceiling, only the deadline.
    async fn pass_two_factor<D>(
        &self,
        ctx: &JobRunnerContext<D>,
        session: &mut D::Session,
        record: &JobRecord,
    ) -> Result<()>
    where
        D: RemoteDriver,
    {
        let timeout = Duration::from_secs(ctx.config.two_factor.timeout_secs);
        let deadline = Instant::now() + timeout;

        ctx.relay.open(record.id, &record.credentials.email, timeout);
        ctx.db.update_job(record.id, JobRecord::await_two_factor)??;
        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::InProgress)
                .category(LogCategory::User)
                .message("Waiting for the security code")
                .build(),
        );

        loop {
            let Some(code) = ctx.relay.wait_for_code(record.id, deadline).await else {
                ctx.relay.close(record.id);
                bail!(
                    type = ErrorType::TwoFactorTimeout,
                    "no valid security code arrived within the deadline"
                );
            };

            for (position, digit) in code.chars().enumerate() {
                session
                    .fill(&selectors::code_digit(position), &digit.to_string())
                    .await
                    .map_err(auth_failure)?;
            }
            session.press("Enter").await.map_err(auth_failure)?;

            if self.code_accepted(ctx, session).await? {
                ctx.db.update_job(record.id, JobRecord::resume)??;
                ctx.relay.close(record.id);
                ctx.logs.record(
                    LogEvent::builder()
                        .job_id(record.id)
                        .status(LogStatus::InProgress)
                        .category(LogCategory::User)
                        .message("Security code accepted")
                        .build(),
                );
                return Ok(());
            }

            ctx.db
                .update_job(record.id, JobRecord::reject_two_factor)??;
            ctx.relay.reopen(record.id);
            ctx.logs.record(
                LogEvent::builder()
                    .job_id(record.id)
                    .status(LogStatus::Warning)
                    .category(LogCategory::User)
                    .message("Security code rejected, waiting for a new one")
                    .build(),
            );
        }
    }

    /// Re-read the post-submission login state until one of the outcome
    /// markers shows up
    async fn code_accepted<D>(
        &self,
        ctx: &JobRunnerContext<D>,
        session: &mut D::Session,
    ) -> Result<bool>
    where
        D: RemoteDriver,
    {
        let config = &ctx.config.two_factor;

        for _ in 0..config.verify_attempts {
            if session
                .is_visible(selectors::INVALID_CODE_MARKER)
                .await
                .map_err(auth_failure)?
            {
                return Ok(false);
            }
            if session
                .is_visible(selectors::DASHBOARD_MARKER)
                .await
                .map_err(auth_failure)?
            {
                return Ok(true);
            }

            tokio::time::sleep(Duration::from_secs(config.verify_interval_secs)).await;
        }

        Ok(false)
    }

    async fn populate<D>(
        &self,
        ctx: &JobRunnerContext<D>,
        session: &mut D::Session,
        record: &JobRecord,
    ) -> Result<()>
    where
        D: RemoteDriver,
    {
        let url = custom_values_url(ctx.config.remote.base_url.as_str(), &record.subaccount_id);
        session
            .navigate(&url)
            .await
            .map_err(|error| Error::msg(format!("navigation to the settings surface failed: {error}")))?;
        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::InProgress)
                .category(LogCategory::Remote)
                .message(format!("Navigated to custom values: {url}"))
                .build(),
        );

        let plan = schema::field_plan(&record.custom_values);
        if plan.is_empty() {
            ctx.logs.record(
                LogEvent::builder()
                    .job_id(record.id)
                    .status(LogStatus::InProgress)
                    .category(LogCategory::Remote)
                    .message("No custom values to process")
                    .build(),
            );
            return Ok(());
        }

        let element_wait = Duration::from_secs(ctx.config.remote.element_wait_secs);
        let total = plan.len();
        let mut processed = 0_usize;

        for field in &plan {
            processed += 1;
            let progress = ((processed * 100) / total) as u8;

            match write_field(session, field, element_wait).await {
                Ok(()) => {
                    ctx.db
                        .update_job(record.id, |job| job.update_progress(progress))?;
                    ctx.logs.record(
                        LogEvent::builder()
                            .job_id(record.id)
                            .status(LogStatus::InProgress)
                            .category(LogCategory::Remote)
                            .message(format!("Processing field: {}", field.label))
                            .progress(progress)
                            .build(),
                    );
                }
                Err(error) => {
                    // best-effort population: a single field never sinks the run
                    warn!(field = %field.label, %error, "field write failed");
                    ctx.db
                        .update_job(record.id, |job| job.update_progress(progress))?;
                    ctx.logs.record(
                        LogEvent::builder()
                            .job_id(record.id)
                            .status(LogStatus::Warning)
                            .category(LogCategory::Remote)
                            .message(format!("Failed to set field {}: {error}", field.label))
                            .progress(progress)
                            .details(serde_json::json!({ "field": field.label }))
                            .build(),
                    );
                }
            }
        }

        ctx.logs.record(
            LogEvent::builder()
                .job_id(record.id)
                .status(LogStatus::InProgress)
                .category(LogCategory::Remote)
                .message(format!("Processed {processed} custom values"))
                .build(),
        );

        Ok(())
    }
}

/// Create the custom value, look its row up (falling back to the
/// category-qualified name), set the value, and confirm the row settled
async fn write_field<S>(
    session: &mut S,
    field: &schema::PlannedField,
    element_wait: Duration,
) -> Result<(), SessionError>
where
    S: RemoteSession,
{
    session.click(selectors::NEW_CUSTOM_VALUE_BUTTON).await?;
    session.fill(selectors::NAME_INPUT, &field.label).await?;
    session.click(selectors::CREATE_BUTTON).await?;
    session
        .fill(selectors::SEARCH_INPUT, &field.remote_label)
        .await?;

    let row = selectors::custom_value_row(&field.remote_label);
    if session.click(&row).await.is_err() {
        let fallback = selectors::categorised_custom_value_row(
            &field.remote_label,
            field.category.remote_name(),
        );
        session.click(&fallback).await?;
    }

    session.click(selectors::EDIT_CUSTOM_VALUE).await?;
    session.fill(selectors::VALUE_INPUT, &field.value).await?;
    session.click(selectors::UPDATE_BUTTON).await?;

    if !session.wait_for(&row, element_wait).await? {
        return Err(SessionError::Timeout { marker: row });
    }

    Ok(())
}

fn auth_failure(error: SessionError) -> Error {
    Error::new(ErrorType::Authentication, error)
}

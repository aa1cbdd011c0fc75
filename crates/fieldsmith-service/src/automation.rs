use crate::{
    dispatch::DispatchHandle,
    queue::{Enqueued, QueueStatus, TenantQueue},
    relay::TwoFactorRelay,
};
use fieldsmith_core::traits::TextGenerator;
use fieldsmith_db::{
    model::job::{CompanyProfile, Credentials, Job, JobState},
    Db,
};
use fieldsmith_error::{bail, fieldsmith_error, ErrorType, Result};
use iso8601_timestamp::Timestamp;
use std::collections::BTreeMap;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// Company-profile fields and the public custom-value keys they land under.
/// The keys are a contract with upstream content generation; renaming any of
/// them requires a migration.
const COMPANY_VALUE_KEYS: [&str; 11] = [
    "Company Name",
    "Company Owner First Name",
    "Company Email",
    "Global Button Colors",
    "Broad Service Name",
    "Sub Headline Text",
    "Company GMB Link",
    "Company Facebook Link",
    "Google Map Embed",
    "GMB Review Link",
    "Company Instagram Link",
];

#[derive(Clone, Debug, TypedBuilder)]
pub struct SubmitAutomation {
    pub workspace_id: Uuid,
    pub caller_id: Uuid,
    #[builder(setter(into))]
    pub email: String,
    #[builder(setter(into))]
    pub password: String,
    #[builder(setter(into))]
    pub subaccount_id: String,
    #[builder(default)]
    pub custom_values: BTreeMap<String, String>,
    #[builder(default)]
    pub company: CompanyProfile,
    #[builder(default)]
    pub service_text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SubmissionReceipt {
    pub job: Job,
    /// 1-based position behind the running job; 0 when execution began
    pub position: usize,
    pub started_immediately: bool,
}

/// Glue between admission and execution. The only component that mutates
/// the tenant queue or hands jobs to the dispatcher.
#[derive(Clone, TypedBuilder)]
pub struct AutomationService<G> {
    db: Db,
    queue: TenantQueue,
    relay: TwoFactorRelay,
    dispatch: DispatchHandle,
    text_generator: G,
}

impl<G> AutomationService<G>
where
    G: TextGenerator,
{
    /// Validate, persist, and enqueue a submission. The receipt is returned
    /// as soon as the job is admitted; execution proceeds independently and
    /// is observed through the job record and its execution log.
    pub async fn submit(&self, request: SubmitAutomation) -> Result<SubmissionReceipt> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            bail!(
                type = ErrorType::Validation(Some("credentials".into())),
                "account credentials are required"
            );
        }
        if request.subaccount_id.trim().is_empty() {
            bail!(
                type = ErrorType::Validation(Some("subaccount-id".into())),
                "a target subaccount is required"
            );
        }

        let Some(workspace) = self.db.workspace(request.workspace_id) else {
            bail!(
                type = ErrorType::Entitlement(None),
                "workspace does not exist or is not accessible"
            );
        };
        if !workspace.subscription_active {
            bail!(
                type = ErrorType::Entitlement(None),
                "workspace subscription is not active"
            );
        }

        let mut company = request.company;
        self.supplement_company_fields(&mut company).await;

        let custom_values = merge_custom_values(request.custom_values, &company);

        let job = Job::builder()
            .workspace_id(workspace.id)
            .created_by(request.caller_id)
            .name(format!("Subaccount provisioning {}", Timestamp::now_utc()))
            .credentials(Credentials {
                email: request.email,
                password: request.password,
            })
            .subaccount_id(request.subaccount_id)
            .custom_values(custom_values)
            .company(company)
            .service_text(request.service_text)
            .build();

        self.db.insert_job(job.clone());

        let Enqueued {
            position,
            started_immediately,
        } = self.queue.enqueue(workspace.id, job.id);

        if started_immediately {
            self.dispatch.start(job.id);
        }

        debug!(job_id = %job.id, position, started_immediately, "job admitted");

        Ok(SubmissionReceipt {
            job,
            position,
            started_immediately,
        })
    }

    /// Deposit a security code for a waiting job. Returns as soon as the
    /// code is in the mailbox; the suspended run consumes it on its own.
    pub fn submit_two_factor_code(&self, job_id: Uuid, code: &str) -> Result<()> {
        let job = self
            .db
            .job(job_id)
            .ok_or_else(|| fieldsmith_error!(type = ErrorType::NotFound, format!("job {job_id} not found")))?;

        if !job.state.awaits_code() {
            bail!(
                type = ErrorType::InvalidState(Some(job.state.to_string())),
                "job is not waiting for a security code"
            );
        }

        self.relay.deposit(job_id, code)?;
        debug!(%job_id, "security code deposited");

        Ok(())
    }

    /// Guaranteed post-run path, invoked exactly once per run regardless of
    /// outcome. The session is already released by the time this runs; the
    /// queue advances and the next pending job, if any, is dispatched.
    pub fn on_job_finished(&self, job_id: Uuid) -> Result<()> {
        let job = self.db.job(job_id).ok_or_else(
            || fieldsmith_error!(type = ErrorType::InvariantViolation, format!("finished job {job_id} has no record")),
        )?;

        let next = self.queue.advance(job.workspace_id, job_id)?;

        if let Some(next_id) = next {
            match self.db.job(next_id).map(|job| job.state) {
                Some(JobState::Pending) => self.dispatch.start(next_id),
                state => {
                    warn!(job_id = %next_id, ?state, "queue head is not pending, not dispatching");
                }
            }
        }

        Ok(())
    }

    /// Remove a job that has not started yet. Running jobs cannot be
    /// cancelled; they run to completion or failure.
    pub fn cancel(&self, workspace_id: Uuid, job_id: Uuid) -> bool {
        self.queue.cancel(workspace_id, job_id)
    }

    pub fn job(&self, id: Uuid) -> Result<Job> {
        self.db
            .job(id)
            .ok_or_else(|| fieldsmith_error!(type = ErrorType::NotFound, format!("job {id} not found")))
    }

    #[must_use]
    pub fn jobs_for_workspace(&self, workspace_id: Uuid) -> Vec<Job> {
        self.db.jobs_for_workspace(workspace_id)
    }

    #[must_use]
    pub fn queue_status(&self, workspace_id: Uuid) -> QueueStatus {
        self.queue.status(workspace_id)
    }

    /// Fill in the AI-derived profile fields when the submission asks for
    /// them. Generation failures are logged and skipped; they never block
    /// the submission.
    async fn supplement_company_fields(&self, company: &mut CompanyProfile) {
        let Some(name) = company.name.clone() else {
            return;
        };

        if company.generate_broad_service && company.broad_service_name.is_none() {
            let prompt = format!(
                "Generate a broad service name (1-3 words) for a company called \"{name}\". \
                 This should be a general category that describes what type of business this is."
            );
            match self.text_generator.generate(&prompt).await {
                Ok(text) => company.broad_service_name = Some(text.trim().to_owned()),
                Err(error) => warn!(?error, "broad service name generation failed"),
            }
        }

        if company.generate_sub_headline && company.sub_headline_text.is_none() {
            let prompt = format!(
                "Generate a catchy sub-headline (one sentence, 8-12 words) for a company called \
                 \"{name}\". This will appear beneath the company name on the homepage hero \
                 section. Make it compelling and describe what they do."
            );
            match self.text_generator.generate(&prompt).await {
                Ok(text) => company.sub_headline_text = Some(text.trim().to_owned()),
                Err(error) => warn!(?error, "sub headline generation failed"),
            }
        }
    }
}

/// Merge the explicit custom values with the company-profile fields and the
/// derived phone renderings. Profile fields only land when they carry a
/// value, so an explicit custom value is never blanked by an empty profile.
fn merge_custom_values(
    mut values: BTreeMap<String, String>,
    company: &CompanyProfile,
) -> BTreeMap<String, String> {
    let profile_values = [
        &company.name,
        &company.owner_first_name,
        &company.email,
        &company.global_button_colors,
        &company.broad_service_name,
        &company.sub_headline_text,
        &company.gmb_link,
        &company.facebook_link,
        &company.google_map_embed,
        &company.gmb_review_link,
        &company.instagram_link,
    ];

    for (key, value) in COMPANY_VALUE_KEYS.iter().zip(profile_values) {
        if let Some(value) = value {
            if !value.is_empty() {
                values.insert((*key).to_owned(), value.clone());
            }
        }
    }

    if let Some((aesthetic, functional)) = company.phone.as_deref().and_then(format_phone) {
        values.insert("Company Phone (Aesthetic)".to_owned(), aesthetic);
        values.insert("Company Phone (Functional)".to_owned(), functional);
    }

    values
}

/// Derive the two phone renderings from a raw 10-digit number
fn format_phone(raw: &str) -> Option<(String, String)> {
    if raw.len() != 10 || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let aesthetic = format!("({}) {}-{}", &raw[..3], &raw[3..6], &raw[6..]);
    let functional = format!("1{raw}");

    Some((aesthetic, functional))
}

use crate::{model::job::Job, Db};
use fieldsmith_error::{fieldsmith_error, ErrorType, Result};
use uuid::Uuid;

impl Db {
    pub fn insert_job(&self, job: Job) {
        self.inner.jobs.write().insert(job.id, job);
    }

    #[must_use]
    pub fn job(&self, id: Uuid) -> Option<Job> {
        self.inner.jobs.read().get(&id).cloned()
    }

    /// All jobs of one workspace, newest first
    #[must_use]
    pub fn jobs_for_workspace(&self, workspace_id: Uuid) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .inner
            .jobs
            .read()
            .values()
            .filter(|job| job.workspace_id == workspace_id)
            .cloned()
            .collect();

        jobs.sort_by(|lhs, rhs| rhs.created_at.cmp(&lhs.created_at));
        jobs
    }

    /// Run a mutation against a job while the table lock is held, so state
    /// transitions are atomic with respect to concurrent readers
    pub fn update_job<R>(&self, id: Uuid, update: impl FnOnce(&mut Job) -> R) -> Result<R> {
        let mut jobs = self.inner.jobs.write();
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| fieldsmith_error!(type = ErrorType::NotFound, format!("job {id} not found")))?;

        Ok(update(job))
    }
}

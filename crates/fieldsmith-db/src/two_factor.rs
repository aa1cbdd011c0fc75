use crate::{model::two_factor::TwoFactorRequest, Db};
use uuid::Uuid;

impl Db {
    pub fn upsert_two_factor(&self, request: TwoFactorRequest) {
        self.inner
            .two_factor
            .write()
            .insert(request.job_id, request);
    }

    #[must_use]
    pub fn two_factor(&self, job_id: Uuid) -> Option<TwoFactorRequest> {
        self.inner.two_factor.read().get(&job_id).cloned()
    }

    pub fn update_two_factor<R>(
        &self,
        job_id: Uuid,
        update: impl FnOnce(&mut TwoFactorRequest) -> R,
    ) -> Option<R> {
        self.inner
            .two_factor
            .write()
            .get_mut(&job_id)
            .map(update)
    }

    pub fn remove_two_factor(&self, job_id: Uuid) -> Option<TwoFactorRequest> {
        self.inner.two_factor.write().remove(&job_id)
    }
}

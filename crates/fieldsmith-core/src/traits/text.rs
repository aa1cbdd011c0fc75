use crate::error::BoxError;
use std::future::Future;

/// Narrow "generate text for a field" capability.
///
/// The content backend is an external collaborator; deployments without one
/// inject [`NoGeneration`] and the coordinator skips the derived fields.
pub trait TextGenerator: Send + Sync + 'static {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, BoxError>> + Send;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoGeneration;

impl TextGenerator for NoGeneration {
    async fn generate(&self, _prompt: &str) -> Result<String, BoxError> {
        Err("text generation is not configured".into())
    }
}

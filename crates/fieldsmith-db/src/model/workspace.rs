use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// The tenant that owns a queue of provisioning jobs
#[derive(Clone, Debug, Deserialize, Serialize, TypedBuilder)]
pub struct Workspace {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,
    #[builder(setter(into))]
    pub name: SmolStr,
    /// Submissions are rejected while this is off
    #[builder(default)]
    pub subscription_active: bool,
    #[builder(default = Timestamp::now_utc())]
    pub created_at: Timestamp,
}

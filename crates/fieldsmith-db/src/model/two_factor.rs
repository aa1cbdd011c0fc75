use iso8601_timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TwoFactorStatus {
    Waiting,
    Received,
    Expired,
}

/// Mailbox entry for one job waiting on an out-of-band security code.
/// One-to-one with the waiting job; removed once the run is over.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TwoFactorRequest {
    pub job_id: Uuid,
    pub email: String,
    pub status: TwoFactorStatus,
    pub code: Option<String>,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Absolute deadline for the whole code exchange, re-submissions included
    pub timeout_secs: u64,
    /// How often the post-submission login state is re-read
    pub verify_interval_secs: u64,
    /// How many re-reads before a submitted code counts as rejected
    pub verify_attempts: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            timeout_secs: 10 * 60,
            verify_interval_secs: 2,
            verify_attempts: 20,
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Execution log entries older than this are purged; failure entries are kept
    pub log_retention_days: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            log_retention_days: 30,
        }
    }
}

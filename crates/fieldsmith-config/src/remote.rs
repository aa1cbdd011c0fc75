use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// Base URL of the remote application, without a trailing slash
    pub base_url: SmolStr,
    #[serde(default = "default_element_wait_secs")]
    pub element_wait_secs: u64,
    #[serde(default = "default_page_load_secs")]
    pub page_load_secs: u64,
    /// How long to wait for the security-code challenge to show up
    /// before assuming the login went straight through
    #[serde(default = "default_challenge_wait_secs")]
    pub challenge_wait_secs: u64,
}

fn default_element_wait_secs() -> u64 {
    30
}

fn default_page_load_secs() -> u64 {
    60
}

fn default_challenge_wait_secs() -> u64 {
    15
}

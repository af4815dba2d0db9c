//! Tunable service parameters.

use serde::{Deserialize, Serialize};

/// Parameters governing the verification and session flows.
///
/// Loaded from config; `Default` gives the production values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceParams {
    /// How long an issued verification code stays valid, in seconds.
    #[serde(default = "default_code_ttl_secs")]
    pub code_ttl_secs: u64,

    /// Mismatched submissions allowed per issued code before the
    /// pending registration is dropped.
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,

    /// Authenticated session validity window, in seconds.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_code_ttl_secs() -> u64 {
    15 * 60
}

fn default_max_code_attempts() -> u32 {
    5
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl_secs(),
            max_code_attempts: default_max_code_attempts(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

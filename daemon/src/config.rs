//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wellspring_types::ServiceParams;

/// Configuration for the Wellspring service.
///
/// Can be loaded from a TOML file or built programmatically (e.g. for
/// tests). CLI flags and environment variables override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Data directory for the identity collection.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Port for the HTTP API.
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Mail provider endpoint (transactional-send URL).
    #[serde(default = "default_mail_endpoint")]
    pub mail_endpoint: String,

    /// Mail provider API key.
    #[serde(default)]
    pub mail_api_key: String,

    /// Sender address on outgoing mail.
    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    /// Sender display name on outgoing mail.
    #[serde(default = "default_mail_from_name")]
    pub mail_from_name: String,

    /// Hex-encoded 32-byte session-signing secret. When empty, a random
    /// per-process secret is used and sessions do not survive restarts.
    #[serde(default)]
    pub session_secret: String,

    /// Verification and session flow parameters.
    #[serde(default)]
    pub params: ServiceParams,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./wellspring_data")
}

fn default_api_port() -> u16 {
    3000
}

fn default_mail_endpoint() -> String {
    "https://api.brevo.com/v3/smtp/email".to_string()
}

fn default_mail_from() -> String {
    "no-reply@wellspring-water.example".to_string()
}

fn default_mail_from_name() -> String {
    "Wellspring Water Solutions".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api_port: default_api_port(),
            mail_endpoint: default_mail_endpoint(),
            mail_api_key: String::new(),
            mail_from: default_mail_from(),
            mail_from_name: default_mail_from_name(),
            session_secret: String::new(),
            params: ServiceParams::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_port, 3000);
        assert_eq!(config.params.session_ttl_secs, 30 * 60);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: ServiceConfig = toml::from_str(
            r#"
            api_port = 8080

            [params]
            max_code_attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.params.max_code_attempts, 3);
        assert_eq!(config.params.session_ttl_secs, 30 * 60);
        assert_eq!(config.log_level, "info");
    }
}

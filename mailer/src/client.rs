//! HTTP mail-provider client.
//!
//! Speaks the common transactional-mail JSON shape: one POST per
//! message with sender, recipient, subject, and html/text bodies, with
//! the API key in a header.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use wellspring_types::EmailAddress;

use crate::{MailMessage, Mailer, MailerError};

/// Default timeout for mail API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Party {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: Party,
    to: Vec<Party>,
    subject: String,
    html_content: String,
    text_content: String,
}

/// Mail delivery over a provider's HTTP API.
pub struct HttpMailer {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl HttpMailer {
    /// Create a mailer for the given provider endpoint and credentials.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            from_email: from_email.into(),
            from_name: from_name.into(),
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, to: &EmailAddress, message: &MailMessage) -> Result<(), MailerError> {
        let body = SendEmailBody {
            sender: Party {
                email: self.from_email.clone(),
                name: Some(self.from_name.clone()),
            },
            to: vec![Party {
                email: to.to_string(),
                name: None,
            }],
            subject: message.subject.clone(),
            html_content: message.html.clone(),
            text_content: message.text.clone(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailerError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    MailerError::Unreachable(format!("connection failed: {e}"))
                } else {
                    MailerError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, %to, "mail provider rejected message");
            return Err(MailerError::Rejected(format!("HTTP {status}: {detail}")));
        }

        debug!(%to, subject = %message.subject, "mail accepted by provider");
        Ok(())
    }
}

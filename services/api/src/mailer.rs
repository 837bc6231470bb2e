//! Mailgun delivery adapter and the object-storage attachment fetcher.
//! Both are best-effort collaborators: errors are returned to the
//! dispatcher, which logs and swallows them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::info;

use erights::config::MailConfig;
use erights::notify::{AttachmentFetcher, EmailError, EmailGateway, EmailMessage};

const MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";

/// Sends through the Mailgun messages API with HTTP basic auth
/// (username "api", the account API key as password).
pub struct MailgunMailer {
    http: reqwest::Client,
    api_key: String,
    domain: String,
    from: String,
}

impl MailgunMailer {
    pub fn new(config: &MailConfig, api_key: String) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| EmailError::Transport(err.to_string()))?;

        Ok(Self {
            http,
            api_key,
            domain: config.domain.clone(),
            from: config.from_header(),
        })
    }
}

#[async_trait]
impl EmailGateway for MailgunMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let mut form = Form::new()
            .text("from", self.from.clone())
            .text("to", message.to.clone())
            .text("subject", message.subject.clone())
            .text("html", message.html);

        if let Some(attachment) = message.attachment {
            let part = Part::bytes(attachment.content)
                .file_name(attachment.filename)
                .mime_str("application/pdf")
                .map_err(|err| EmailError::Transport(err.to_string()))?;
            form = form.part("attachment", part);
        }

        let response = self
            .http
            .post(format!("{MAILGUN_API_BASE}/{}/messages", self.domain))
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|err| EmailError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Transport(format!(
                "mailgun responded {status}: {body}"
            )));
        }

        info!(to = %message.to, "email delivered via mailgun");
        Ok(())
    }
}

/// Fetches previously uploaded documents from object storage over HTTP.
/// The client timeout bounds the whole fetch; exceeding it surfaces as an
/// attachment error the dispatcher degrades on.
pub struct HttpAttachmentFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAttachmentFetcher {
    pub fn new(base_url: String, timeout_secs: u64) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| EmailError::Attachment(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, EmailError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| EmailError::Attachment(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmailError::Attachment(format!(
                "storage responded {status} for {url}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| EmailError::Attachment(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

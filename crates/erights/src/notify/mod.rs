//! Templated transactional email: an alert to the administrator and a
//! confirmation to the submitting shareholder, fired after a successful
//! submission. Dispatch is best-effort by design: every failure is caught,
//! logged, and folded into a [`DispatchOutcome`] so submission creation is
//! never failed by a notification problem.

pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::submissions::Submission;

/// Outbound message handed to the delivery gateway.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment: Option<EmailAttachment>,
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Delivery contract implemented by the Mailgun adapter (and by log-only /
/// recording gateways in development and tests).
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Fetch contract for previously uploaded documents living in object
/// storage. Implementations must bound the fetch with a timeout.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, EmailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email transport failed: {0}")]
    Transport(String),
    #[error("attachment fetch failed: {0}")]
    Attachment(String),
}

/// Caught result of one notification attempt; never propagated as an error.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: EmailError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Builds and dispatches the two post-submission notifications.
pub struct NotificationDispatcher {
    gateway: Arc<dyn EmailGateway>,
    attachments: Arc<dyn AttachmentFetcher>,
    admin_email: String,
}

impl NotificationDispatcher {
    pub fn new(
        gateway: Arc<dyn EmailGateway>,
        attachments: Arc<dyn AttachmentFetcher>,
        admin_email: String,
    ) -> Self {
        Self {
            gateway,
            attachments,
            admin_email,
        }
    }

    /// Fire both notifications without blocking the caller. The spawned
    /// task runs to completion even if the triggering request is aborted.
    pub fn dispatch_detached(self: Arc<Self>, submission: Submission) {
        tokio::spawn(async move {
            self.dispatch(&submission).await;
        });
    }

    /// Send the admin alert and the shareholder confirmation, returning the
    /// caught outcome of each.
    pub async fn dispatch(&self, submission: &Submission) -> (DispatchOutcome, DispatchOutcome) {
        let admin = self.notify_admin(submission).await;
        if let Some(error) = admin.error.as_deref() {
            warn!(submission_id = submission.id, error, "admin alert failed");
        }

        let holder = self.confirm_shareholder(submission).await;
        if let Some(error) = holder.error.as_deref() {
            warn!(
                submission_id = submission.id,
                error, "shareholder confirmation failed"
            );
        }

        (admin, holder)
    }

    async fn notify_admin(&self, submission: &Submission) -> DispatchOutcome {
        let message = EmailMessage {
            to: self.admin_email.clone(),
            subject: "New Rights Issue Form Submission".to_string(),
            html: templates::admin_alert_html(submission),
            attachment: None,
        };

        match self.gateway.send(message).await {
            Ok(()) => DispatchOutcome::ok(),
            Err(error) => DispatchOutcome::failed(error),
        }
    }

    async fn confirm_shareholder(&self, submission: &Submission) -> DispatchOutcome {
        let attachment = self.fetch_filled_form(submission).await;
        let message = EmailMessage {
            to: submission.email.clone(),
            subject: "Your Rights Issue Form Submission Confirmation".to_string(),
            html: templates::confirmation_html(submission),
            attachment,
        };

        match self.gateway.send(message).await {
            Ok(()) => DispatchOutcome::ok(),
            Err(error) => DispatchOutcome::failed(error),
        }
    }

    /// Attachment fetch failures degrade to sending without the attachment.
    async fn fetch_filled_form(&self, submission: &Submission) -> Option<EmailAttachment> {
        let path = submission.filled_form_path.as_deref()?;
        match self.attachments.fetch(path).await {
            Ok(content) => {
                info!(submission_id = submission.id, "filled form attached");
                Some(EmailAttachment {
                    filename: format!(
                        "Rights_Issue_Form_{}.pdf",
                        submission.reg_account_number
                    ),
                    content,
                })
            }
            Err(error) => {
                warn!(
                    submission_id = submission.id,
                    error = %error,
                    "sending confirmation without attachment"
                );
                None
            }
        }
    }
}

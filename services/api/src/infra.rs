use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use erights::notify::{AttachmentFetcher, EmailError, EmailGateway, EmailMessage};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stands in for Mailgun when no API key is configured: logs the send and
/// reports success so local runs behave like delivery worked.
pub(crate) struct LogOnlyGateway;

#[async_trait]
impl EmailGateway for LogOnlyGateway {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachment = message.attachment.is_some(),
            "mail delivery disabled; logging instead"
        );
        Ok(())
    }
}

/// Stands in for object storage when no asset base URL is configured. Every
/// fetch fails, which the dispatcher degrades to sending without the
/// attachment.
pub(crate) struct DisabledAttachmentFetcher;

#[async_trait]
impl AttachmentFetcher for DisabledAttachmentFetcher {
    async fn fetch(&self, _path: &str) -> Result<Vec<u8>, EmailError> {
        Err(EmailError::Attachment(
            "no asset base URL configured".to_string(),
        ))
    }
}

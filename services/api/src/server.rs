use crate::cli::ServeArgs;
use crate::infra::{AppState, DisabledAttachmentFetcher, LogOnlyGateway};
use crate::mailer::{HttpAttachmentFetcher, MailgunMailer};
use crate::postgres::{
    self, PostgresAdminDirectory, PostgresShareholderDirectory, PostgresSubmissionStore,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

use erights::auth::{AdminDirectory, AuthService, InMemoryAdminDirectory, SessionStore};
use erights::config::AppConfig;
use erights::error::AppError;
use erights::notify::{AttachmentFetcher, EmailGateway, NotificationDispatcher};
use erights::registry::{import, InMemoryShareholderDirectory, ShareholderDirectory};
use erights::router::ApiContext;
use erights::submissions::{InMemorySubmissionStore, SubmissionService, SubmissionStore};
use erights::telemetry;

use crate::routes::with_api_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let register = match args.register_csv.take() {
        Some(path) => {
            let records = import::load_from_path(&path).map_err(AppError::store)?;
            info!(count = records.len(), path = %path.display(), "register import loaded");
            Some(records)
        }
        None => None,
    };

    let (store, registry, admins): (
        Arc<dyn SubmissionStore>,
        Arc<dyn ShareholderDirectory>,
        Arc<dyn AdminDirectory>,
    ) = match config.database.url.as_deref() {
        Some(url) => {
            let pool = postgres::connect(url, config.database.max_connections)
                .await
                .map_err(AppError::store)?;
            postgres::init_schema(&pool).await.map_err(AppError::store)?;

            let directory = PostgresShareholderDirectory::new(pool.clone());
            if let Some(records) = register {
                let imported = directory.import(records).await.map_err(AppError::store)?;
                info!(imported, "register rows inserted");
            }

            (
                Arc::new(PostgresSubmissionStore::new(pool.clone())),
                Arc::new(directory),
                Arc::new(PostgresAdminDirectory::new(pool)),
            )
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store (development only)");
            let directory = InMemoryShareholderDirectory::new();
            if let Some(records) = register {
                directory.load(records);
            }

            (
                Arc::new(InMemorySubmissionStore::new()),
                Arc::new(directory),
                Arc::new(InMemoryAdminDirectory::new()),
            )
        }
    };

    let gateway: Arc<dyn EmailGateway> = match config.mail.api_key.clone() {
        Some(api_key) => Arc::new(MailgunMailer::new(&config.mail, api_key).map_err(AppError::store)?),
        None => {
            warn!("MAILGUN_API_KEY not set; notifications will only be logged");
            Arc::new(LogOnlyGateway)
        }
    };

    let attachments: Arc<dyn AttachmentFetcher> = match config.mail.asset_base_url.clone() {
        Some(base_url) => Arc::new(
            HttpAttachmentFetcher::new(base_url, config.mail.attachment_timeout_secs)
                .map_err(AppError::store)?,
        ),
        None => Arc::new(DisabledAttachmentFetcher),
    };

    let notifications = Arc::new(NotificationDispatcher::new(
        gateway,
        attachments,
        config.mail.admin_email.clone(),
    ));

    let submissions = Arc::new(SubmissionService::new(store, registry, notifications));
    let sessions = Arc::new(SessionStore::new(config.auth.session_ttl_minutes));
    let auth = Arc::new(AuthService::new(admins, sessions));

    let ctx = Arc::new(ApiContext {
        submissions,
        auth,
        environment: config.environment,
    });

    let app = with_api_routes(ctx)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rights issue backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}

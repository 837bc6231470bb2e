mod cli;
mod infra;
mod mailer;
mod postgres;
mod routes;
mod server;

use erights::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

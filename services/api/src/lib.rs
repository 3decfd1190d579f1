mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use energy_community::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

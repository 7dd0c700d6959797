use schmatch_backend::error::AppError;
use schmatch_backend::{run_server, setup_logging};
use schmatch_config::get_config;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_logging();

    let config = get_config()?;
    let server = run_server(&config).await?;
    server.await
}

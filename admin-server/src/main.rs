use admin_server::{Config, Server, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before reading any configuration
    dotenv::dotenv().ok();

    let config = Config::from_env();

    admin_server::init_logger_with_file(
        Some(&config.log_level),
        config.log_dir.as_deref(),
    );

    tracing::info!("Montura admin server starting...");

    let state = ServerState::initialize(&config).await?;

    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

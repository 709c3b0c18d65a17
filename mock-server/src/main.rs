use mock_server::ServerConfig;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let api_key = std::env::var("MOCK_API_KEY").unwrap_or_else(|_| "dev-key".to_string());
    let mut config = ServerConfig::new(api_key);
    if let Some(credits) = std::env::var("MOCK_API_CREDITS")
        .ok()
        .and_then(|value| value.parse().ok())
    {
        config = config.with_credits(credits);
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, credits = ?config.credits, "mock todo API listening");
    mock_server::run(listener, config).await
}

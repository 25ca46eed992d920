use mock_server::{Provider, Zone, API_PREFIX};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    let provider = Provider::with_zones(vec![
        Zone {
            name: "Barcelona".to_string(),
            lat: 41.3874,
            lng: 2.1686,
        },
        Zone {
            name: "Madrid".to_string(),
            lat: 40.4168,
            lng: -3.7038,
        },
    ]);
    info!("listening on http://{addr}{API_PREFIX}/");
    mock_server::run(listener, provider).await
}

#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use programme_interchange::{EngineConfig, InterchangeEngine, http_api};
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = EngineConfig::from_env()?;
    let addr: SocketAddr = config.http_addr.parse()?;
    let store = config.open_store()?;
    let engine = InterchangeEngine::new(store, config);

    println!("programme-interchange HTTP API listening on http://{addr}");
    http_api::serve(addr, engine).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}

use std::sync::Arc;

use hybi_core::config::Config;
use hybi_core::demo::connection::handle_connection;
use hybi_core::error::ServerResult;
use tokio::net::TcpListener;
use tracing::error;

#[tokio::main]
async fn main() -> ServerResult<()> {
    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::default());
    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!(address = %config.address, "ws-demo listening");

    loop {
        let (socket, _) = listener.accept().await?;
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, &config).await {
                error!(%err, "connection ended with an error");
            }
        });
    }
}

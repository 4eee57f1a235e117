//! TCP transport implementation.
//!
//! Raw TCP socket transport with JSON-RPC messages (line-delimited).
//! Every accepted connection is its own session.

use rmcp::ServiceExt;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::{TransportError, TransportResult, config::TcpConfig, run_rmcp_session};
use crate::core::McpServer;

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    /// Create a new TCP transport with the given config.
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the TCP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!("Ready - listening on {} (JSON-RPC over TCP)", addr);

        // Accept multiple connections in a loop
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("Accepted connection from {}", peer_addr);

                    // Set TCP_NODELAY to disable Nagle's algorithm
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
                    }

                    let server = server.clone();
                    tokio::spawn(async move {
                        match Self::handle_connection(server, stream, peer_addr).await {
                            Ok(()) => debug!("Connection from {} closed", peer_addr),
                            Err(e) => warn!("Connection from {} failed: {}", peer_addr, e),
                        }
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    // Small delay to avoid spinning on persistent errors
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Serve a single TCP connection until the client goes away.
    async fn handle_connection(
        server: McpServer,
        stream: tokio::net::TcpStream,
        peer_addr: std::net::SocketAddr,
    ) -> TransportResult<()> {
        let service = server
            .serve(stream)
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        run_rmcp_session(service, &peer_addr.to_string()).await
    }
}

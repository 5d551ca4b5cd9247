use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::files::FileHandler;
use crate::http::connection::Connection;

const BACKLOG: u32 = 10;

/// The bound listening socket plus the shared request handler.
pub struct Server {
    listener: TcpListener,
    handler: Arc<FileHandler>,
}

impl Server {
    /// Binds the configured address. `SO_REUSEADDR` and `SO_REUSEPORT`
    /// failures are downgraded to warnings; the bind itself is fatal.
    pub fn bind(cfg: &Config) -> Result<Self> {
        let addr: SocketAddr = cfg
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", cfg.server.listen_addr))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .context("creating socket")?;

        if let Err(e) = socket.set_reuseaddr(true) {
            warn!(error = %e, "Can't set SO_REUSEADDR");
        }
        if let Err(e) = socket.set_reuseport(true) {
            warn!(error = %e, "Can't set SO_REUSEPORT");
        }

        socket
            .bind(addr)
            .with_context(|| format!("binding {addr}"))?;
        let listener = socket.listen(BACKLOG).context("listening")?;

        let handler = Arc::new(FileHandler::new(
            cfg.server.root.clone(),
            cfg.auth.build(),
            cfg.server.read_timeout(),
        ));

        Ok(Self { listener, handler })
    }

    /// The address actually bound; useful when configured with port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` resolves, then closes the
    /// listener and lets in-flight connections run to completion.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let Server { listener, handler } = self;
        info!(addr = %listener.local_addr()?, root = %handler.root().display(), "Listening");

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "Accepted connection");
                            let handler = Arc::clone(&handler);
                            connections.spawn(async move {
                                if let Err(e) = Connection::new(stream, handler).run().await {
                                    error!(peer = %peer, error = %e, "Connection failed");
                                }
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "Could not accept connection");
                        }
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown requested, draining connections");
                    break;
                }
            }
        }

        // Stop accepting before the drain so shutdown is visible to peers.
        drop(listener);
        while connections.join_next().await.is_some() {}

        Ok(())
    }
}

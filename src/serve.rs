use crate::logi;
use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// Serves a directory over HTTP until shut down.
pub struct StaticServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl StaticServer {
    /// Binds `127.0.0.1:port`; port 0 picks a free one.
    pub async fn start(dir: &Path, port: u16) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind static server on port {port}"))?;
        let addr = listener.local_addr().context("static server has no local address")?;

        let app = Router::new().fallback_service(ServeDir::new(dir));
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
        });

        logi(format!("Video server is running at http://{addr}"));
        Ok(Self {
            addr,
            shutdown: Some(tx),
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("http://{}/{}", self.addr, file_name)
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.handle)
            .await
            .context("static server task panicked")?
            .context("static server failed")
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

//! Local static file server
//!
//! Serves the source directory while the crawl runs. Any path that does not
//! match a file gets the root document, so client-side routing can resolve it.

use crate::output::ROOT_DOCUMENT;
use crate::{PrerenderError, Result};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

/// A running file server bound to the loopback interface
pub struct FileServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl FileServer {
    /// Binds `127.0.0.1:port` and starts serving `directory`
    ///
    /// Port 0 picks a free port; see [`FileServer::addr`].
    ///
    /// # Returns
    ///
    /// * `Ok(FileServer)` - The server is accepting connections
    /// * `Err(PrerenderError::Bind)` - The port could not be bound
    pub async fn start(directory: &Path, port: u16) -> Result<Self> {
        let index = directory.join(ROOT_DOCUMENT);
        let files = ServeDir::new(directory).fallback(ServeFile::new(index));
        let app = Router::new().fallback_service(files);

        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| PrerenderError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let addr = listener.local_addr()?;

        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stopped.await;
                })
                .await
        });

        tracing::info!("Serving {} on http://{}", directory.display(), addr);
        Ok(Self { addr, stop, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Origin every crawled URL lives under
    pub fn origin(&self) -> Result<Url> {
        Ok(Url::parse(&format!("http://{}", self.addr))?)
    }

    /// Stops accepting connections and waits for the server task
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.stop.send(());
        match self.task.await {
            Ok(result) => result.map_err(|e| PrerenderError::Server(e.to_string()))?,
            Err(e) => return Err(PrerenderError::Server(e.to_string())),
        }
        tracing::debug!("File server on {} stopped", self.addr);
        Ok(())
    }
}

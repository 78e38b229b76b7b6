// Server module entry point
// File server lifecycle: bind, accept loop, graceful stop

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::wait_for_shutdown;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::handler::FileResolver;
use crate::logger;
use crate::storage::{FileEntry, LocalEntry};

/// Handles owned while the accept loop runs
struct Running {
    local_addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<GracefulShutdown>,
}

/// HTTP file server over one root entry
///
/// Created stopped; [`start`](Self::start) binds and spawns the accept loop on the
/// current tokio runtime, [`stop`](Self::stop) tears it down. A stopped server can be
/// started again.
pub struct FileServer {
    state: Arc<AppState>,
    running: Option<Running>,
}

impl FileServer {
    pub fn new(config: Config, root: Arc<dyn FileEntry>) -> Self {
        Self {
            state: Arc::new(AppState::new(config, root)),
            running: None,
        }
    }

    /// Serve the local directory or file named by `storage.root`
    pub fn from_config(config: Config) -> Result<Self, ServerError> {
        let root = LocalEntry::open_root(&config.storage.root).map_err(|source| {
            ServerError::Root {
                path: config.storage.root.clone(),
                source,
            }
        })?;
        Ok(Self::new(config, Arc::new(root)))
    }

    /// Bind the listener and start accepting connections
    ///
    /// Returns the bound address, which carries the real port when 0 was configured.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if let Some(running) = &self.running {
            return Err(ServerError::AlreadyRunning(running.local_addr));
        }

        let addr = self.state.config.bind_addr()?;
        let listener =
            create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        self.state.resolver.cache().reopen();

        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&self.state),
            Arc::clone(&shutdown),
        ));

        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stop the server
    ///
    /// The file cache is cleared and closed before anything else, then the listener
    /// is closed and in-flight connections get `shutdown_grace_period` seconds to
    /// finish. Does nothing when the server is not running.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        self.state.resolver.shutdown();
        running.shutdown.notify_one();

        match running.task.await {
            Ok(graceful) => {
                let grace =
                    Duration::from_secs(self.state.config.performance.shutdown_grace_period);
                if tokio::time::timeout(grace, graceful.shutdown()).await.is_err() {
                    logger::log_warning(&format!(
                        "Connections still open after {}s grace period, abandoning them",
                        grace.as_secs()
                    ));
                }
            }
            Err(e) => logger::log_error(&format!("Accept loop ended abnormally: {e}")),
        }

        logger::log_server_stop(&running.local_addr);
    }

    /// `http://<host>:<port>/`, using the listening port once started
    pub fn base_url(&self) -> String {
        let port = self
            .running
            .as_ref()
            .map_or(self.state.config.server.port, |r| r.local_addr.port());
        self.state.config.base_url(port)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn resolver(&self) -> &Arc<FileResolver> {
        &self.state.resolver
    }

    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl std::fmt::Debug for FileServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileServer")
            .field("state", &self.state)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl Drop for FileServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            self.state.resolver.shutdown();
            running.shutdown.notify_one();
        }
    }
}

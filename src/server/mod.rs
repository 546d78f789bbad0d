// Server module entry point
// Binds the listener, runs the accept loop, and handles shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), so use server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::logger;

pub use listener::create_listener;
pub use server_loop::start_server_loop;

/// A bound file server, ready to run.
///
/// The listener is bound in [`Server::bind`] and released when
/// [`Server::run_until`] returns.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Resolve the serving root and bind the configured address.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &Config) -> io::Result<Self> {
        let addr = config
            .get_socket_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let state = AppState::new(config).map_err(|e| {
            logger::log_error(&format!(
                "Cannot serve '{}': {e}",
                config.http.root.display()
            ));
            e
        })?;

        let listener = create_listener(addr).map_err(|e| {
            logger::log_bind_failed(&addr, &e);
            e
        })?;

        Ok(Self {
            listener,
            state: Arc::new(state),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until SIGINT/SIGTERM
    pub async fn run(self) {
        self.run_until(signal::shutdown_signal()).await;
    }

    /// Serve until `shutdown` resolves, then close the listener
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        start_server_loop(
            self.listener,
            self.state,
            self.active_connections,
            shutdown,
        )
        .await;
    }
}

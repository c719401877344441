use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionContext};
use crate::http::handler::RequestHandler;
use crate::server::state::{Registry, Signal};

/// How often the drain loop re-checks for still-busy connections.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Future returned by a lifecycle hook.
pub type HookFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

type Hook = Box<dyn FnOnce() -> HookFuture + Send>;

/// The server loop: owns the listening socket, spawns one connection task
/// per accepted transport, and runs the graceful shutdown protocol.
///
/// # Example
///
/// ```no_run
/// # use gale::config::Config;
/// # use gale::http::handler::Responder;
/// # use gale::http::request::Request;
/// # use gale::http::response::Response;
/// # use gale::server::listener::Server;
/// async fn hello(_request: Request, responder: Responder) {
///     responder.send(Response::ok("hi"));
/// }
///
/// # async fn example() -> anyhow::Result<()> {
/// Server::new(Config::default(), hello).run().await
/// # }
/// ```
pub struct Server<H> {
    config: Config,
    handler: H,
    after_start: Option<Hook>,
    before_stop: Option<Hook>,
}

impl<H: RequestHandler> Server<H> {
    pub fn new(config: Config, handler: H) -> Self {
        Self {
            config,
            handler,
            after_start: None,
            before_stop: None,
        }
    }

    /// Hook invoked once the socket is listening, before connections are
    /// accepted. An error here aborts startup.
    pub fn after_start<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.after_start = Some(Box::new(move || -> HookFuture { Box::pin(hook()) }));
        self
    }

    /// Hook invoked when shutdown is requested, before the drain begins.
    /// Errors are logged; the drain still runs.
    pub fn before_stop<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.before_stop = Some(Box::new(move || -> HookFuture { Box::pin(hook()) }));
        self
    }

    /// Binds the listening socket. Nothing is left running on failure.
    pub async fn bind(self) -> Result<BoundServer<H>> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Unable to start server on {}", addr))?;
        info!("Listening on {}", addr);
        Ok(BoundServer {
            listener,
            server: self,
        })
    }

    /// Binds and runs until SIGINT or SIGTERM requests shutdown.
    pub async fn run(self) -> Result<()> {
        self.bind().await?.run().await
    }
}

/// A server whose socket is already listening.
pub struct BoundServer<H> {
    listener: TcpListener,
    server: Server<H>,
}

impl<H: RequestHandler> BoundServer<H> {
    /// The actual bound address, useful when the configured port was 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until SIGINT or SIGTERM requests shutdown, then drains.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs until `shutdown` resolves, then drains.
    ///
    /// The drain refuses new connections, flips the shared signal so
    /// in-flight responses are written with keep-alive off, closes idle
    /// connections, and polls until every connection has torn itself down.
    /// Shutdown latency is bounded by the slowest in-flight request.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let signal = Arc::new(Signal::default());
        let registry = Registry::new();
        let ctx = Arc::new(ConnectionContext {
            handler: self.server.handler,
            signal: signal.clone(),
            registry: registry.clone(),
            request_timeout: Duration::from_secs(self.server.config.request_timeout),
            request_max_size: self.server.config.request_max_size,
        });

        if let Some(hook) = self.server.after_start {
            hook().await.context("after_start hook failed")?;
        }

        tokio::select! {
            res = accept_loop(&self.listener, &ctx) => res?,
            _ = shutdown => {}
        }

        info!("Stop requested, draining connections...");

        if let Some(hook) = self.server.before_stop {
            if let Err(e) = hook().await {
                error!("before_stop hook failed: {:#}", e);
            }
        }

        // Refuse new work before telling live connections to wind down.
        drop(self.listener);
        signal.stop();
        registry.close_idle();

        while !registry.is_empty() {
            sleep(DRAIN_POLL_INTERVAL).await;
            // Connections that finished a response after the first pass sit
            // idle again; keep asking until the registry empties out.
            registry.close_idle();
        }

        info!("Server stopped");
        Ok(())
    }
}

async fn accept_loop<H: RequestHandler>(
    listener: &TcpListener,
    ctx: &Arc<ConnectionContext<H>>,
) -> Result<()> {
    loop {
        let (socket, peer) = listener.accept().await.context("Accept failed")?;
        debug!("Accepted connection from {}", peer);
        tokio::spawn(Connection::new(socket, peer, ctx.clone()).run());
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received"),
        _ = terminate => info!("Termination signal received"),
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::http::handler::{RequestHandler, Responder};
use crate::http::parser::{HttpParser, ParseError, ParseSink};
use crate::http::request::{Method, Request};
use crate::server::state::{ConnectionGuard, Registry, Signal};

/// Shared context handed to every connection at accept time.
pub struct ConnectionContext<H> {
    pub handler: H,
    pub signal: Arc<Signal>,
    pub registry: Registry,
    pub request_timeout: Duration,
    pub request_max_size: usize,
}

/// Per-request accumulation state, fed by parser events.
#[derive(Default)]
struct Cycle {
    max_size: usize,
    url: Vec<u8>,
    headers: Vec<(String, String)>,
    request: Option<Request>,
    complete: bool,
}

impl Cycle {
    fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Default::default()
        }
    }

    fn reset(&mut self) {
        self.url.clear();
        self.headers.clear();
        self.request = None;
        self.complete = false;
    }
}

impl ParseSink for Cycle {
    fn on_url(&mut self, url: &[u8]) -> Result<(), ParseError> {
        self.url = url.to_vec();
        Ok(())
    }

    fn on_header(&mut self, name: &str, value: &str) -> Result<(), ParseError> {
        // Reject bodies announced to exceed the limit before a single body
        // byte is buffered.
        if name.eq_ignore_ascii_case("content-length") {
            let declared: usize = value.parse().map_err(|_| ParseError::InvalidContentLength)?;
            if declared > self.max_size {
                return Err(ParseError::BodyTooLarge(declared));
            }
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn on_headers_complete(&mut self, method: Method, version: &str) -> Result<(), ParseError> {
        let url = String::from_utf8(std::mem::take(&mut self.url))
            .map_err(|_| ParseError::InvalidRequest)?;
        let headers = std::mem::take(&mut self.headers);
        self.request = Some(Request::new(method, url, version.to_string(), headers));
        Ok(())
    }

    fn on_body(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        if let Some(request) = self.request.as_mut() {
            request.body.extend_from_slice(chunk);
        }
        Ok(())
    }

    fn on_message_complete(&mut self) -> Result<(), ParseError> {
        self.complete = true;
        Ok(())
    }
}

/// State machine for one TCP connection.
///
/// Reads and parses requests one at a time, dispatches each completed
/// request to the handler, writes the response, and either recycles itself
/// for the next request (keep-alive) or closes. All failures abort only
/// this connection.
pub struct Connection<H> {
    stream: TcpStream,
    peer: SocketAddr,
    ctx: Arc<ConnectionContext<H>>,
    inbuf: BytesMut,
    parser: Option<HttpParser>,
    cycle: Cycle,
    total_request_size: usize,
}

impl<H: RequestHandler> Connection<H> {
    pub fn new(stream: TcpStream, peer: SocketAddr, ctx: Arc<ConnectionContext<H>>) -> Self {
        let max_size = ctx.request_max_size;
        Self {
            stream,
            peer,
            ctx,
            inbuf: BytesMut::with_capacity(4096),
            parser: None,
            cycle: Cycle::new(max_size),
            total_request_size: 0,
        }
    }

    /// Drives the connection to completion, then tears down.
    ///
    /// One timeout covers the whole connection lifetime; when it fires the
    /// connection is aborted regardless of handler progress. Registry
    /// removal happens on every exit path via the guard, and the transport
    /// closes when the stream is dropped.
    pub async fn run(mut self) {
        let peer = self.peer;
        let guard = self.ctx.registry.register();
        let limit = self.ctx.request_timeout;

        match timeout(limit, self.drive(&guard)).await {
            Ok(Ok(())) => tracing::debug!(peer = %peer, "Connection closed"),
            Ok(Err(e)) => tracing::error!(peer = %peer, "{:#}, connection closed", e),
            Err(_) => tracing::error!(peer = %peer, "Request timed out, connection closed"),
        }
    }

    async fn drive(&mut self, guard: &ConnectionGuard) -> Result<()> {
        loop {
            let Some(request) = self.read_request(guard).await? else {
                return Ok(());
            };

            let version = request.version.clone();
            let reusable = self
                .parser
                .as_ref()
                .is_some_and(|parser| parser.should_keep_alive());

            // Dispatch: the handler runs as its own task and answers through
            // a one-shot channel owned by this connection. Dropping the
            // receiver on abort makes a late response a no-op.
            let (tx, rx) = oneshot::channel();
            tokio::spawn(self.ctx.handler.call(request, Responder::new(tx)));
            let response = match rx.await {
                Ok(response) => response,
                Err(_) => anyhow::bail!("Handler dropped the response channel"),
            };

            let keep_alive = reusable && !self.ctx.signal.stopped();
            let wire = response.output(&version, keep_alive, self.ctx.request_timeout.as_secs());
            self.stream
                .write_all(&wire)
                .await
                .context("Writing response failed")?;

            if !keep_alive {
                return Ok(());
            }
            self.cleanup(guard);
        }
    }

    /// Reads and parses one complete request.
    ///
    /// Returns None when the connection should close without dispatching:
    /// the peer went away, or the drain protocol closed us while idle.
    async fn read_request(&mut self, guard: &ConnectionGuard) -> Result<Option<Request>> {
        loop {
            // Drain whatever is already buffered first; keep-alive cycles
            // may start with bytes left over from the previous read.
            if !self.inbuf.is_empty() {
                if self.parser.is_none() {
                    self.parser = Some(HttpParser::new());
                    guard.set_busy(true);
                }
                if let Some(parser) = self.parser.as_mut() {
                    if let Err(e) = parser.feed(&mut self.inbuf, &mut self.cycle) {
                        match e {
                            ParseError::BodyTooLarge(declared) => {
                                anyhow::bail!("Request body too large ({})", declared)
                            }
                            other => anyhow::bail!("Invalid request data ({:?})", other),
                        }
                    }
                }
                if self.cycle.complete {
                    let request = self
                        .cycle
                        .request
                        .take()
                        .context("Parser completed without a request")?;
                    return Ok(Some(request));
                }
            }

            // Idle connections (no parser active) are the ones the drain
            // protocol may close from under us; busy ones read on.
            let idle = self.parser.is_none();
            let n = tokio::select! {
                res = self.stream.read_buf(&mut self.inbuf) => {
                    res.context("Reading request failed")?
                }
                _ = guard.closed(), if idle => return Ok(None),
            };
            if n == 0 {
                return Ok(None);
            }

            self.total_request_size += n;
            if self.total_request_size > self.ctx.request_max_size {
                anyhow::bail!("Request too large ({})", self.total_request_size);
            }
        }
    }

    /// Resets per-request state so the next request can arrive on the same
    /// transport.
    fn cleanup(&mut self, guard: &ConnectionGuard) {
        self.parser = None;
        self.cycle.reset();
        self.total_request_size = 0;
        guard.set_busy(false);
    }
}

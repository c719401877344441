use std::future::Future;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::http::request::Request;
use crate::http::response::Response;

/// Future returned by a request handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The external collaborator the engine dispatches completed requests to.
///
/// Invoked once per request as an independent task. The handler must
/// eventually pass a response to its [`Responder`]; a handler that never
/// does leaves the connection open until its timeout fires.
///
/// Blanket-implemented for async closures:
///
/// ```
/// # use gale::http::request::Request;
/// # use gale::http::response::Response;
/// # use gale::http::handler::{RequestHandler, Responder};
/// async fn hello(_request: Request, responder: Responder) {
///     responder.send(Response::ok("hi"));
/// }
/// fn assert_handler(_: impl RequestHandler) {}
/// assert_handler(hello);
/// ```
pub trait RequestHandler: Send + Sync + 'static {
    fn call(&self, request: Request, responder: Responder) -> HandlerFuture;
}

impl<F, Fut> RequestHandler for F
where
    F: Fn(Request, Responder) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, request: Request, responder: Responder) -> HandlerFuture {
        Box::pin(self(request, responder))
    }
}

/// Write-callback handed to the handler along with the request.
///
/// Consuming `send` enforces the once-per-request contract at the type
/// level. The channel back to the connection is dropped when the
/// connection aborts, so a late response is silently discarded.
pub struct Responder {
    tx: oneshot::Sender<Response>,
}

impl Responder {
    pub(crate) fn new(tx: oneshot::Sender<Response>) -> Self {
        Self { tx }
    }

    /// Delivers the response to the connection that issued the request.
    pub fn send(self, response: Response) {
        let _ = self.tx.send(response);
    }
}

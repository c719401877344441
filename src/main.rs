use gale::config::Config;
use gale::http::handler::Responder;
use gale::http::request::Request;
use gale::http::response::Response;
use gale::server::listener::Server;

async fn hello(request: Request, responder: Responder) {
    tracing::debug!(method = ?request.method, url = %request.url, "Handling request");
    responder.send(Response::text("Hello from gale\n"));
}

fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if cfg.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    // One thread of control; connections and handler tasks are multiplexed
    // cooperatively on it.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(
        Server::new(cfg, hello)
            .after_start(|| async {
                tracing::info!("Server started");
                Ok(())
            })
            .run(),
    )
}

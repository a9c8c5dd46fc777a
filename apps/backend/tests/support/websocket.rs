// WebSocket test utilities

use std::net::TcpListener;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use arena_backend::routes;
use arena_backend::state::app_state::AppState;
use arena_backend::ws::WsRegistry;
use arena_backend::{RequestTrace, StructuredLogger, TraceSpan};

pub async fn wait_for_connections(
    registry: &WsRegistry,
    expected: usize,
    timeout: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = tokio::time::Instant::now();
    loop {
        if registry.connection_count() == expected {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(format!(
                "timeout waiting for connection_count == {expected} (got {})",
                registry.connection_count()
            )
            .into());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Start a real HTTP server on a random port so tests can connect with a
/// websocket client.
///
/// Returns the server handle (for graceful stop), the bound address and the
/// join handle of the server task.
pub async fn start_test_server(
    state: AppState,
) -> Result<
    (
        actix_web::dev::ServerHandle,
        std::net::SocketAddr,
        tokio::task::JoinHandle<Result<(), std::io::Error>>,
    ),
    Box<dyn std::error::Error>,
> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let state_data = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .configure(routes::configure)
    })
    .workers(1)
    .disable_signals()
    .listen(listener)?
    .run();

    let server_handle = server.handle();
    let join = tokio::spawn(server);

    Ok((server_handle, addr, join))
}

pub fn ws_url(addr: std::net::SocketAddr, session_id: &str, name: &str) -> String {
    format!("ws://{addr}/ws?session_id={session_id}&name={name}")
}

// Server loop module
// Accepts connections until shutdown, then drains in-flight ones

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain checks the connection counter
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop until `state.shutdown` fires.
///
/// After shutdown the listener is closed right away, and the loop waits up
/// to `performance.shutdown_grace` seconds for active connections to finish.
pub async fn run_server(listener: TcpListener, state: Arc<AppState>) {
    let shutdown = Arc::clone(&state.shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    drain_connections(&state).await;
}

async fn drain_connections(state: &AppState) {
    logger::log_shutdown_started(state.active_connections());

    let deadline = Instant::now() + Duration::from_secs(state.config.performance.shutdown_grace);
    while state.active_connections() > 0 && Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL).await;
    }

    logger::log_shutdown_complete(state.active_connections());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::message::SUCCESS_BODY;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn test_state(max_connections: Option<u64>) -> Arc<AppState> {
        let mut config = Config::default();
        config.logging.access_log = false;
        config.performance.shutdown_grace = 1;
        config.performance.max_connections = max_connections;
        Arc::new(AppState::new(config))
    }

    async fn round_trip(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_requests_then_shuts_down() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = test_state(None);
        let server = tokio::spawn(run_server(listener, Arc::clone(&state)));

        let body = "user=alice&msg=hello&cate=general";
        let request = format!(
            "POST /msg HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: application/x-www-form-urlencoded\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let response = round_trip(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response
            .to_ascii_lowercase()
            .contains("access-control-allow-origin: *"));
        assert!(response.ends_with(SUCCESS_BODY), "{response}");

        let response = round_trip(
            addr,
            "OPTIONS /whatever HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response
            .to_ascii_lowercase()
            .contains("access-control-max-age: 86400"));

        state.shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejects_over_connection_limit() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = test_state(Some(0));
        let server = tokio::spawn(run_server(listener, Arc::clone(&state)));

        // Rejected before any request is read: the peer just sees EOF
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert!(buf.is_empty());
        assert_eq!(state.active_connections(), 0);

        state.shutdown.notify_one();
        server.await.unwrap();
    }
}

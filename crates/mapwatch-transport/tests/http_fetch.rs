//! Integration tests for the HTTP fetcher against a real socket.
//!
//! A one-shot TCP task plays the server: it reads the request, writes a
//! canned HTTP/1.1 response, and closes. No mocking framework needed.

use mapwatch_transport::{Fetch, HttpFetch, TransportError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawns a server that answers exactly one request with the given
/// status line and body, then returns the base URL to hit.
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        // Drain the request head; we don't care about its contents.
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).await.unwrap();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_fetch_text_returns_body() {
    let base = serve_once("200 OK", "configuration: '/up/configuration'").await;
    let fetch = HttpFetch::new();

    let body = fetch.fetch_text(&base).await.unwrap();

    assert_eq!(body, "configuration: '/up/configuration'");
}

#[tokio::test]
async fn test_fetch_json_parses_body() {
    let base = serve_once("200 OK", r#"{"servertime":12345,"players":[]}"#).await;
    let fetch = HttpFetch::new();

    let value = fetch.fetch_json(&base).await.unwrap();

    assert_eq!(value["servertime"], 12345);
    assert!(value["players"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_json_rejects_non_json_body() {
    let base = serve_once("200 OK", "<html>not json</html>").await;
    let fetch = HttpFetch::new();

    let err = fetch.fetch_json(&base).await.unwrap_err();

    assert!(matches!(err, TransportError::InvalidBody { .. }));
}

#[tokio::test]
async fn test_fetch_rejects_error_status() {
    let base = serve_once("503 Service Unavailable", "busy").await;
    let fetch = HttpFetch::new();

    let err = fetch.fetch_text(&base).await.unwrap_err();

    match err {
        TransportError::Status { code, url } => {
            assert_eq!(code, 503);
            assert!(url.starts_with("http://127.0.0.1"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_unreachable_server_fails() {
    // Bind then immediately drop the listener so the port is closed.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetch = HttpFetch::new();
    let result = fetch.fetch_text(&format!("http://{addr}/")).await;

    assert!(result.is_err());
}

//! Connection handling: split frames, worker limit, shutdown.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

use common::{local_config, send_raw, split_response, start_server};

#[tokio::test]
async fn test_request_split_across_writes() {
    let server = start_server(local_config()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"POST /echo/split HTTP/1.1\r\nContent-")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream.write_all(b"Length: 0\r\n\r\n").await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(body, b"split");

    server.stop().await;
}

#[tokio::test]
async fn test_incomplete_request_answered_after_read_timeout() {
    let mut config = local_config();
    config.timeouts.read_secs = 1;
    let server = start_server(config).await;

    // No blank line: the server waits for the read timeout, then answers anyway.
    let response = send_raw(server.addr, b"GET /echo/late HTTP/1.1\r\n").await;
    let (_, body) = split_response(&response);
    assert_eq!(body, b"late");

    server.stop().await;
}

#[tokio::test]
async fn test_max_connections_limit() {
    let mut config = local_config();
    config.listener.max_connections = 1;
    config.timeouts.read_secs = 5;
    let server = start_server(config).await;

    // First client holds the only slot by not finishing its request.
    let mut first = TcpStream::connect(server.addr).await.unwrap();
    first.write_all(b"GET /echo/first HTTP/1.1\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut second = TcpStream::connect(server.addr).await.unwrap();
    second
        .write_all(b"GET /echo/second HTTP/1.1\r\n\r\n")
        .await
        .unwrap();

    let mut buf = [0u8; 64];
    let blocked = tokio::time::timeout(Duration::from_millis(300), second.read(&mut buf)).await;
    assert!(blocked.is_err(), "second connection must wait for a free slot");

    first.write_all(b"\r\n").await.unwrap();
    let mut first_response = Vec::new();
    first.read_to_end(&mut first_response).await.unwrap();
    assert!(first_response.ends_with(b"first"));

    let mut second_response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), second.read_to_end(&mut second_response))
        .await
        .unwrap()
        .unwrap();
    assert!(second_response.ends_with(b"second"));

    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_requests() {
    let server = start_server(local_config()).await;

    let tasks: Vec<_> = (0..32)
        .map(|i| {
            let addr = server.addr;
            tokio::spawn(async move {
                let request = format!("GET /echo/{} HTTP/1.1\r\n\r\n", i);
                let response = send_raw(addr, request.as_bytes()).await;
                let (_, body) = split_response(&response);
                assert_eq!(body, i.to_string().as_bytes());
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = start_server(local_config()).await;
    let addr = server.addr;

    let response = send_raw(addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with(b"HTTP/1.1 200 OK"));

    server.stop().await;

    // The listener is dropped once the server task ends.
    assert!(TcpStream::connect(addr).await.is_err());
}

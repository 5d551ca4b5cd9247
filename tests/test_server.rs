//! End-to-end tests over a real socket.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use microserve::config::Config;
use microserve::server::Server;

/// Binds a server on an ephemeral port serving `root`, with the fixed
/// credential pair user/pass gating mutations.
fn start(root: &Path) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
    let mut cfg = Config::default();
    cfg.server.listen_addr = "127.0.0.1:0".to_string();
    cfg.server.root = root.to_path_buf();
    cfg.auth.username = Some("user".to_string());
    cfg.auth.password = Some("pass".to_string());

    let server = Server::bind(&cfg).unwrap();
    let addr = server.local_addr().unwrap();

    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        server
            .run(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    (addr, tx, handle)
}

async fn stop(tx: oneshot::Sender<()>, handle: JoinHandle<()>) {
    let _ = tx.send(());
    handle.await.unwrap();
}

async fn send_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn auth_line(username: &str, password: &str) -> String {
    format!(
        "Authorization: Basic {}\r\n",
        STANDARD.encode(format!("{username}:{password}"))
    )
}

fn content_length(response: &str) -> usize {
    let (head, _) = response.split_once("\r\n\r\n").unwrap();
    head.lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_get_serves_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "GET /hello.txt HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: application/octet-stream\r\n"));
    assert!(response.contains("Content-Length: 5\r\n"));
    assert!(response.ends_with("\r\n\r\nhello"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_get_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "GET /absent HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.contains("Connection: closed\r\n"));
    assert!(response.contains("Server: microserve\r\n"));
    // Header-only responses do not declare a length
    assert!(!response.contains("Content-Length"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_get_directory_listing() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "GET / HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Type: text/html\r\n"));
    assert!(response.contains(r#"<a href="a.txt">a.txt</a><br>"#));
    assert!(response.contains(r#"<a href="sub/">sub/</a><br>"#));

    let (_, body) = response.split_once("\r\n\r\n").unwrap();
    assert_eq!(content_length(&response), body.len());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_get_dot_path_lists_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "GET /. HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains(r#"<a href="a.txt">a.txt</a><br>"#));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_unknown_method() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "FOO / HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_unsupported_version() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "GET / HTTP/9.9\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 505 HTTP Version Not Supported\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_overlong_uri() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(600));
    let response = send_request(addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 414 Request-URI Too Long\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_too_many_headers() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let mut request = String::from("GET / HTTP/1.1\r\n");
    for _ in 0..65 {
        request.push_str("A: x\r\n");
    }
    request.push_str("\r\n");

    let response = send_request(addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 431 Request Header Fields Too Large\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_truncated_request() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HT").await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response);
    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response =
        send_request(addr, "PUT /up.txt HTTP/1.1\r\nContent-Length: 4\r\n\r\ntest").await;

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(!dir.path().join("up.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_rejects_wrong_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 4\r\n\r\ntest",
        auth_line("user", "wrong")
    );
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(!dir.path().join("up.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 4\r\n\r\ntest",
        auth_line("user", "pass")
    );
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
    assert_eq!(std::fs::read(dir.path().join("up.txt")).unwrap(), b"test");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("up.txt"), b"old old old").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 4\r\n\r\nnew!",
        auth_line("user", "pass")
    );
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
    assert_eq!(std::fs::read(dir.path().join("up.txt")).unwrap(), b"new!");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_without_length() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("PUT /up.txt HTTP/1.1\r\n{}\r\n", auth_line("user", "pass"));
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 411 Length Required\r\n"));
    assert!(response.ends_with("\r\n\r\nExpected Content-Length header"));
    // The rejection happens before the file is created
    assert!(!dir.path().join("up.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_ignores_bytes_past_declared_length() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 4\r\n\r\ntestEXTRA",
        auth_line("user", "pass")
    );
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 201 Created\r\n"));
    assert_eq!(std::fs::read(dir.path().join("up.txt")).unwrap(), b"test");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_accepts_fragmented_writes() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let head = format!(
        "PUT /frag.txt HTTP/1.1\r\n{}Content-Length: 4\r\n\r\n",
        auth_line("user", "pass")
    );
    let (first, second) = head.split_at(10);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(first.as_bytes()).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    stream.write_all(second.as_bytes()).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    stream.write_all(b"te").await.unwrap();
    sleep(Duration::from_millis(50)).await;
    stream.write_all(b"st").await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response);

    assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
    assert_eq!(std::fs::read(dir.path().join("frag.txt")).unwrap(), b"test");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_expect_continue() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let head = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 4\r\nExpect: 100-continue\r\n\r\n",
        auth_line("user", "pass")
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(head.as_bytes()).await.unwrap();

    // Wait for the interim response before sending the body
    let mut seen = Vec::new();
    let mut buf = [0u8; 256];
    while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before 100 Continue");
        seen.extend_from_slice(&buf[..n]);
    }
    let interim = String::from_utf8_lossy(&seen);
    assert!(interim.starts_with("HTTP/1.1 100 Continue\r\n"));

    stream.write_all(b"test").await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response);

    assert!(text.contains("HTTP/1.1 201 Created\r\n"));
    assert_eq!(std::fs::read(dir.path().join("up.txt")).unwrap(), b"test");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_put_short_body_keeps_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!(
        "PUT /up.txt HTTP/1.1\r\n{}Content-Length: 10\r\n\r\n1234",
        auth_line("user", "pass")
    );

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response);

    assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    // Whatever arrived stays on disk
    assert_eq!(std::fs::read(dir.path().join("up.txt")).unwrap(), b"1234");

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_delete_requires_credentials() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("f.txt"), b"data").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let response = send_request(addr, "DELETE /f.txt HTTP/1.1\r\n\r\n").await;

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(dir.path().join("f.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_delete_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("f.txt"), b"data").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("DELETE /f.txt HTTP/1.1\r\n{}\r\n", auth_line("user", "pass"));
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 204 No Content\r\n"));
    assert!(!dir.path().join("f.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_delete_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("DELETE /absent HTTP/1.1\r\n{}\r\n", auth_line("user", "pass"));
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_delete_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("DELETE /sub HTTP/1.1\r\n{}\r\n", auth_line("user", "pass"));
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 204 No Content\r\n"));
    assert!(!dir.path().join("sub").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_delete_nonempty_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub/inner.txt"), b"data").unwrap();
    let (addr, tx, handle) = start(dir.path());

    let request = format!("DELETE /sub HTTP/1.1\r\n{}\r\n", auth_line("user", "pass"));
    let response = send_request(addr, &request).await;

    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(dir.path().join("sub/inner.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_path_traversal_is_rejected() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("root");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
    let (addr, tx, handle) = start(&root);

    let response = send_request(addr, "GET /../secret.txt HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));

    let request = format!(
        "PUT /../evil.txt HTTP/1.1\r\n{}Content-Length: 1\r\n\r\nx",
        auth_line("user", "pass")
    );
    let response = send_request(addr, &request).await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(!outer.path().join("evil.txt").exists());

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_silent_disconnect_does_not_disturb_serving() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
    let (addr, tx, handle) = start(dir.path());

    // Connect and hang up without sending anything
    drop(TcpStream::connect(addr).await.unwrap());
    sleep(Duration::from_millis(50)).await;

    let response = send_request(addr, "GET /hello.txt HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));

    stop(tx, handle).await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, tx, handle) = start(dir.path());

    tx.send(()).unwrap();
    handle.await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

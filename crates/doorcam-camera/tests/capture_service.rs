//! Integration tests for CaptureService
//!
//! Uploads go to a fake remote service on an ephemeral localhost port.

use std::net::SocketAddr;
use std::time::Duration;

use doorcam_camera::CaptureService;
use doorcam_hardware::mock::MockCamera;
use doorcam_network::{HttpListener, HttpResponse, RemoteClient};
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

const JPEG: &[u8] = b"\xFF\xD8capture-frame\xFF\xD9";

/// What the fake remote saw.
struct Upload {
    head: String,
    body: Vec<u8>,
}

/// Fake upload service answering one request.
async fn fake_remote(status_line: &str, body: &[u8]) -> (SocketAddr, JoinHandle<Upload>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut reply = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    reply.extend_from_slice(body);

    let task = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let head_end = loop {
            let mut chunk = [0u8; 1024];
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0);
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
        let length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        let mut body = buf[head_end..].to_vec();
        while body.len() < length {
            let mut chunk = [0u8; 1024];
            let n = stream.read(&mut chunk).await.unwrap();
            body.extend_from_slice(&chunk[..n]);
        }

        stream.write_all(&reply).await.unwrap();
        stream.shutdown().await.unwrap();
        Upload { head, body }
    });

    (addr, task)
}

fn service(addr: SocketAddr) -> CaptureService {
    CaptureService::new(
        RemoteClient::new(Duration::from_secs(2)).unwrap(),
        format!("http://{addr}/api/upload"),
    )
}

fn header<'a>(response: &'a HttpResponse, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_successful_capture_relays_remote_answer() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_frame(JPEG.to_vec());
    let (addr, remote) = fake_remote("200 OK", br#"{"ok":true}"#).await;

    let response = service(addr).handle(&mut camera).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&response.body_bytes()[..], br#"{"ok":true}"#);
    assert_eq!(header(&response, "Content-Type"), Some("application/json"));
    assert_eq!(header(&response, "Access-Control-Allow-Origin"), Some("*"));

    let upload = remote.await.unwrap();
    assert!(upload.head.starts_with("post /api/upload "));
    assert!(upload.head.contains("content-type: application/octet-stream"));
    assert_eq!(upload.body, JPEG);

    assert_eq!(handle.captured(), 1);
    assert_eq!(handle.released(), 1);
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn test_remote_error_status_is_relayed() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_frame(JPEG.to_vec());
    let (addr, remote) = fake_remote("503 Service Unavailable", br#"{"error":"busy"}"#).await;

    let response = service(addr).handle(&mut camera).await;
    remote.await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&response.body_bytes()[..], br#"{"error":"busy"}"#);
    assert_eq!(handle.released(), 1);
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn test_non_utf8_remote_body_is_relayed_verbatim() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_frame(JPEG.to_vec());
    let body: &[u8] = b"{\"name\":\"\xE9\"}";
    let (addr, remote) = fake_remote("200 OK", body).await;

    let response = service(addr).handle(&mut camera).await;
    remote.await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&response.body_bytes()[..], body);
    assert!(response.encode().ends_with(body));
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn test_unreachable_remote_relays_empty_answer() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_frame(JPEG.to_vec());
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let response = service(addr).handle(&mut camera).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body_bytes().is_empty());
    assert_eq!(header(&response, "Content-Type"), Some("application/json"));
    assert_eq!(header(&response, "Access-Control-Allow-Origin"), Some("*"));
    assert_eq!(handle.captured(), 1);
    assert_eq!(handle.released(), 1);
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn test_capture_failure_skips_upload() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_failure();

    let remote = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = remote.local_addr().unwrap();

    let response = service(addr).handle(&mut camera).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&response.body_bytes()[..], b"Camera capture failed");
    assert_eq!(header(&response, "Content-Type"), Some("text/plain"));
    assert!(
        timeout(Duration::from_millis(200), remote.accept()).await.is_err(),
        "upload attempted after a failed capture"
    );
    assert_eq!(handle.captured(), 0);
    assert_eq!(handle.outstanding(), 0);
}

#[tokio::test]
async fn test_serve_over_connection() {
    let (mut camera, handle) = MockCamera::new();
    handle.push_frame(JPEG.to_vec());
    let (remote_addr, remote) = fake_remote("200 OK", br#"{"ok":true}"#).await;

    let listener = HttpListener::bind("127.0.0.1:0".parse().unwrap(), "capture")
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /capture HTTP/1.1\r\nHost: cam\r\n\r\n")
            .await
            .unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).await.unwrap();
        String::from_utf8(reply).unwrap()
    });

    let mut connection = listener.accept().await.unwrap();
    connection.read_head(Duration::from_secs(1)).await.unwrap();
    service(remote_addr).serve(&mut camera, connection).await;
    remote.await.unwrap();

    let reply = timeout(Duration::from_secs(5), client)
        .await
        .expect("client timeout")
        .unwrap();
    assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(reply.contains("\r\ncontent-type: application/json\r\n"));
    assert!(reply.contains("\r\naccess-control-allow-origin: *\r\n"));
    assert!(reply.ends_with("\r\n\r\n{\"ok\":true}"));
    assert_eq!(handle.outstanding(), 0);
}

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::{Request, Response, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use volserve::config::{AppState, Config};
use volserve::handler::handle_request;
use volserve::http::ServeBody;
use volserve::storage::{FileEntry, LocalEntry, MemoryEntry};
use volserve::FileServer;

const VIDEO_LEN: usize = 2_000_000;

fn peer() -> SocketAddr {
    "192.168.0.10:51000".parse().unwrap()
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.logging.access_log = false;
    config
}

fn video_bytes() -> Vec<u8> {
    (0..VIDEO_LEN).map(|i| (i % 251) as u8).collect()
}

fn volume_state() -> Arc<AppState> {
    let root = MemoryEntry::directory(
        "usb",
        vec![
            MemoryEntry::file("video.mp4", video_bytes()),
            MemoryEntry::directory("folder", vec![MemoryEntry::file("inner.txt", "inner")]),
        ],
    );
    Arc::new(AppState::new(quiet_config(), Arc::new(root)))
}

async fn get(state: &Arc<AppState>, uri: &str, range: Option<&str>) -> Response<ServeBody> {
    let mut builder = Request::builder().uri(uri);
    if let Some(range) = range {
        builder = builder.header("Range", range);
    }
    handle_request(builder.body(()).unwrap(), Arc::clone(state), peer())
        .await
        .unwrap()
}

async fn body_bytes(resp: Response<ServeBody>) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn full_file_without_range() {
    let state = volume_state();
    let resp = get(&state, "/video.mp4", None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["accept-ranges"], "bytes");
    assert_eq!(resp.headers()["content-length"], "2000000");
    assert_eq!(resp.headers()["content-type"], "video/mp4");

    let body = body_bytes(resp).await;
    assert_eq!(body.len(), VIDEO_LEN);
    assert_eq!(body, video_bytes());
}

#[tokio::test]
async fn partial_content_for_range() {
    let state = volume_state();
    let resp = get(&state, "/video.mp4", Some("bytes=100-199")).await;

    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()["content-range"], "bytes 100-199/2000000");
    assert_eq!(resp.headers()["content-length"], "100");
    assert_eq!(resp.headers()["accept-ranges"], "bytes");

    let body = body_bytes(resp).await;
    assert_eq!(body, &video_bytes()[100..200]);
}

#[tokio::test]
async fn open_ended_range_runs_to_end_of_file() {
    let state = volume_state();
    let resp = get(&state, "/video.mp4", Some("bytes=1999990-")).await;

    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()["content-range"], "bytes 1999990-1999999/2000000");
    assert_eq!(body_bytes(resp).await, &video_bytes()[1_999_990..]);
}

#[tokio::test]
async fn range_past_end_is_unsatisfiable() {
    let state = volume_state();
    let resp = get(&state, "/video.mp4", Some("bytes=1999999-2000000")).await;

    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(body_bytes(resp).await, b"Start < 0 or end >= actual length");
}

#[tokio::test]
async fn range_without_bytes_unit_is_bad_request() {
    let state = volume_state();
    let resp = get(&state, "/video.mp4", Some("items=0-1")).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, b"Range header invalid");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let state = volume_state();
    let resp = get(&state, "/missing.txt", None).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()["content-type"], "text/html");
}

#[tokio::test]
async fn directory_is_bad_request() {
    let state = volume_state();
    let resp = get(&state, "/folder", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = get(&state, "/folder/inner.txt", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"inner");
}

#[tokio::test]
async fn undecodable_path_is_bad_request() {
    let state = volume_state();
    let resp = get(&state, "/%C3%28.mp4", None).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, b"Unable to decode URL");
}

#[tokio::test]
async fn single_file_root() {
    let root = MemoryEntry::file("movie.mkv", vec![7u8; 4096]);
    let state = Arc::new(AppState::new(quiet_config(), Arc::new(root)));

    let resp = get(&state, "/movie.mkv", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "video/x-matroska");
    assert_eq!(body_bytes(resp).await.len(), 4096);

    let resp = get(&state, "/", Some("bytes=0-9")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()["content-range"], "bytes 0-9/4096");

    let resp = get(&state, "/other", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_requests_hit_cache() {
    let state = volume_state();
    get(&state, "/video.mp4", Some("bytes=0-0")).await;
    let first = state.resolver.resolve("/video.mp4").unwrap();
    get(&state, "/video.mp4", None).await;
    let second = state.resolver.resolve("/video.mp4").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(state.resolver.cache().contains("/video.mp4"));
}

#[tokio::test]
async fn local_volume_with_encoded_names() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("My Music")).unwrap();
    std::fs::write(dir.path().join("My Music").join("track 01.mp3"), b"ID3 tag data").unwrap();

    let root = LocalEntry::open_root(dir.path()).unwrap();
    assert!(root.is_directory());
    let state = Arc::new(AppState::new(quiet_config(), Arc::new(root)));

    let resp = get(&state, "/My%20Music/track%2001.mp3", Some("bytes=4-6")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()["content-type"], "audio/mpeg");
    assert_eq!(body_bytes(resp).await, b"tag");

    let resp = get(&state, "/../etc/passwd", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn local_volume_nul_in_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"plain").unwrap();
    let root = LocalEntry::open_root(dir.path()).unwrap();
    let state = Arc::new(AppState::new(quiet_config(), Arc::new(root)));

    let resp = get(&state, "/a%00.txt", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = get(&state, "/a.txt", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn raw_request(addr: SocketAddr, request: &str) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn serves_over_tcp() {
    let mut config = quiet_config();
    config.server.host = Some("127.0.0.1".into());
    config.server.port = 0;
    let root = MemoryEntry::directory("usb", vec![MemoryEntry::file("hello.txt", "hello, volume")]);

    let mut server = FileServer::new(config, Arc::new(root));
    let addr = server.start().await.unwrap();
    assert_eq!(server.base_url(), format!("http://127.0.0.1:{}/", addr.port()));

    let response = raw_request(
        addr,
        "GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nRange: bytes=7-12\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 206 Partial Content\r\n"));
    assert!(response.contains("content-range: bytes 7-12/13\r\n"));
    assert!(response.contains("accept-ranges: bytes\r\n"));
    assert!(response.ends_with("\r\n\r\nvolume"));

    let response = raw_request(
        addr,
        "GET /nope HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));

    assert!(server.resolver().cache().contains("/hello.txt"));
    server.stop().await;
    assert!(!server.resolver().cache().contains("/hello.txt"));
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

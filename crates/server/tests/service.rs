//! End-to-end tests driving the service over a real socket.
//!
//! Each test binds a server on an ephemeral loopback port and talks to it
//! with a plain HTTP client. Remote-fetch tests serve their fixture from a
//! second loopback listener, so nothing leaves the machine.

use meshpreview_server::{PreviewServer, ServiceConfig};
use preview::RenderConfig;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a server with test-sized settings; returns its base URL.
async fn start_server() -> String {
    let config = ServiceConfig {
        render: RenderConfig::with_resolution(96, 96),
        fetch_timeout: Duration::from_secs(5),
        render_concurrency: 2,
        ..ServiceConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = PreviewServer::new(config).unwrap();
    tokio::spawn(async move {
        let _ = server.run_on(listener).await;
    });
    format!("http://{addr}")
}

/// Serve `payload` as an HTTP 200 to every connection, counting hits.
async fn start_fixture(payload: Vec<u8>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => break,
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let body = payload.clone();
            tokio::spawn(async move {
                // Drain the request head before responding.
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    (addr, hits)
}

/// Binary STL of a unit tetrahedron: 4 vertices, 4 faces.
fn tetrahedron_stl() -> Vec<u8> {
    let verts = [
        [0.0f32, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    let faces = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&(faces.len() as u32).to_le_bytes());
    for face in faces {
        bytes.extend_from_slice(&[0u8; 12]);
        for vi in face {
            for coord in verts[vi] {
                bytes.extend_from_slice(&coord.to_le_bytes());
            }
        }
        bytes.extend_from_slice(&[0u8; 2]);
    }
    bytes
}

/// Binary STL header claiming zero triangles.
fn empty_stl() -> Vec<u8> {
    let mut bytes = vec![0u8; 80];
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

fn multipart_upload(filename: &str, payload: &[u8]) -> (String, Vec<u8>) {
    let boundary = "e2eBoundary7319";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}

fn png_dimensions(png: &[u8]) -> (u32, u32) {
    use image::GenericImageView;
    image::load_from_memory(png).expect("valid png").dimensions()
}

fn error_message(body: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(body).expect("json error body");
    value["error"].as_str().expect("error field").to_string()
}

#[tokio::test]
async fn test_stl_upload_renders_png() {
    let base = start_server().await;
    let (content_type, body) = multipart_upload("tetra.stl", &tetrahedron_stl());

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header("Content-Type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "image/png"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("preview.png"));
    let png = response.bytes().await.unwrap();
    assert_eq!(png_dimensions(&png), (96, 96));
}

#[tokio::test]
async fn test_obj_upload_renders_png() {
    let base = start_server().await;
    let obj = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nf 1 2 3\nf 1 2 4\nf 1 3 4\nf 2 3 4\n";
    let (content_type, body) = multipart_upload("tetra.obj", obj);

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header("Content-Type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let png = response.bytes().await.unwrap();
    assert_eq!(png_dimensions(&png), (96, 96));
}

#[tokio::test]
async fn test_file_url_render_and_spool_cleanup() {
    let base = start_server().await;
    let (fixture, hits) = start_fixture(tetrahedron_stl()).await;

    let temp_dir = std::env::temp_dir();
    let before: HashSet<_> = std::fs::read_dir(&temp_dir)
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.file_name()))
        .collect();

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .json(&serde_json::json!({ "fileUrl": format!("http://{fixture}/model.stl") }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let png = response.bytes().await.unwrap();
    assert_eq!(png_dimensions(&png), (96, 96));

    // The spool file backing the download is gone once the response is out.
    let mut leftovers = Vec::new();
    for _ in 0..50 {
        leftovers = std::fs::read_dir(&temp_dir)
            .unwrap()
            .filter_map(|e| e.ok().map(|e| e.file_name()))
            .filter(|name| !before.contains(name))
            .collect();
        if leftovers.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(leftovers.is_empty(), "staged files left behind: {leftovers:?}");
}

#[tokio::test]
async fn test_ply_url_is_rejected_without_fetch() {
    let base = start_server().await;
    let (fixture, hits) = start_fixture(b"ply".to_vec()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .json(&serde_json::json!({ "fileUrl": format!("http://{fixture}/scan.ply") }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 415);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains(".stl"));
    // Suffix validation ran before any request went out.
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_url_is_bad_gateway() {
    let base = start_server().await;

    // Port 1 on loopback refuses connections.
    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .json(&serde_json::json!({ "fileUrl": "http://127.0.0.1:1/model.stl" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("fetch"));
}

#[tokio::test]
async fn test_zero_face_stl_is_empty_mesh_not_decode_error() {
    let base = start_server().await;
    let (content_type, body) = multipart_upload("empty.stl", &empty_stl());

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header("Content-Type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("no renderable geometry"));
}

#[tokio::test]
async fn test_invalid_obj_content_is_decode_failed() {
    let base = start_server().await;
    let (content_type, body) = multipart_upload("broken.obj", b"v one two three\nf 1 2 3\n");

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header("Content-Type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("decode"));
}

#[tokio::test]
async fn test_missing_file_part_is_invalid_input() {
    let base = start_server().await;
    let boundary = "noFileBoundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
    );

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("file"));
}

#[tokio::test]
async fn test_upload_with_empty_filename_is_invalid_input() {
    let base = start_server().await;
    let (content_type, body) = multipart_upload("", &tetrahedron_stl());

    let response = reqwest::Client::new()
        .post(format!("{base}/render-stl"))
        .header("Content-Type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("no file selected"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let base = start_server().await;

    let response = reqwest::Client::new()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let value: serde_json::Value = response.json().await.unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let base = start_server().await;

    let response = reqwest::Client::new()
        .get(format!("{base}/nope"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let message = error_message(&response.bytes().await.unwrap());
    assert!(message.contains("not found"));
}

#[tokio::test]
async fn test_get_on_render_route_is_method_not_allowed() {
    let base = start_server().await;

    let response = reqwest::Client::new()
        .get(format!("{base}/render-stl"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
}

//! HTTP surface tests against a live server on an ephemeral port.

use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use synthscan::api::ApiServer;
use synthscan::{Analyzer, DetectorConfig};

fn spawn_server() -> synthscan::api::ApiHandle {
    let mut cfg = DetectorConfig::default();
    cfg.api.addr = "127.0.0.1:0".to_string();
    ApiServer::new(Arc::new(Analyzer::new(cfg)))
        .spawn()
        .expect("spawn api server")
}

fn roundtrip(addr: std::net::SocketAddr, request: &[u8]) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.write_all(request).expect("send request");
    let mut response = Vec::new();
    stream.read_to_end(&mut response).expect("read response");
    let text = String::from_utf8_lossy(&response).into_owned();
    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .expect("status code");
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

fn gray_png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(32, 32, image::Rgb([128, 128, 128]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

fn multipart_request(path: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    const BOUNDARY: &str = "synthscanTestBoundary";
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut request = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: multipart/form-data; boundary={BOUNDARY}\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(&body);
    request
}

#[test]
fn health_reports_formats_and_version() {
    let handle = spawn_server();
    let (status, body) = roundtrip(
        handle.addr,
        b"GET /api/v1/health HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["supported_formats"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .any(|v| v == "png"));
    handle.stop().expect("stop server");
}

#[test]
fn root_serves_a_json_banner_without_static_dir() {
    let handle = spawn_server();
    let (status, body) = roundtrip(handle.addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json["service"], "synthscan");
    handle.stop().expect("stop server");
}

#[test]
fn detect_analyzes_a_png_upload() {
    let handle = spawn_server();
    let png = gray_png_bytes();
    let request = multipart_request(
        "/api/v1/detect",
        &[
            ("file", Some("upload.png"), &png),
            ("fast_mode", None, b"true"),
        ],
    );
    let (status, body) = roundtrip(handle.addr, &request);
    assert_eq!(status, 200, "body: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json["filename"], "upload.png");
    assert!(json["verdict"].is_string());
    assert!(json["confidence"].is_f64() || json["confidence"].is_u64());
    assert!(json["total_score"].is_u64());
    assert!(json["scores"].is_object());
    assert!(json["evidence"].is_array());
    assert!(json["analysis_details"]["watermark"].is_object());
    assert!(json["processing_time_ms"].is_number());
    // Fast mode: no noise or geometry details in the response.
    assert!(json["analysis_details"]["noise"].is_null());
    handle.stop().expect("stop server");
}

#[test]
fn detect_rejects_unsupported_extension() {
    let handle = spawn_server();
    let request = multipart_request(
        "/api/v1/detect",
        &[("file", Some("document.txt"), b"plain text".as_slice())],
    );
    let (status, body) = roundtrip(handle.addr, &request);
    assert_eq!(status, 400);
    assert!(body.contains("Unsupported format"));
    handle.stop().expect("stop server");
}

#[test]
fn detect_rejects_undecodable_image_with_500() {
    let handle = spawn_server();
    let request = multipart_request(
        "/api/v1/detect",
        &[("file", Some("broken.png"), b"not actually a png".as_slice())],
    );
    let (status, body) = roundtrip(handle.addr, &request);
    assert_eq!(status, 500);
    assert!(body.contains("Analysis failed"));
    handle.stop().expect("stop server");
}

#[test]
fn batch_rejects_more_than_ten_files() {
    let handle = spawn_server();
    let png = gray_png_bytes();
    let parts: Vec<(&str, Option<&str>, &[u8])> = (0..11)
        .map(|_| ("files", Some("a.png"), png.as_slice()))
        .collect();
    let request = multipart_request("/api/v1/detect/batch", &parts);
    let (status, body) = roundtrip(handle.addr, &request);
    assert_eq!(status, 400);
    assert!(body.contains("Maximum 10 files"));
    handle.stop().expect("stop server");
}

#[test]
fn batch_inlines_per_item_failures() {
    let handle = spawn_server();
    let png = gray_png_bytes();
    let request = multipart_request(
        "/api/v1/detect/batch",
        &[
            ("files", Some("ok.png"), png.as_slice()),
            ("files", Some("nope.txt"), b"text".as_slice()),
        ],
    );
    let (status, body) = roundtrip(handle.addr, &request);
    assert_eq!(status, 200, "body: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(json["total"], 2);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["filename"], "ok.png");
    assert!(results[0]["verdict"].is_string());
    assert_ne!(results[0]["verdict"], "ERROR");
    assert_eq!(results[1]["filename"], "nope.txt");
    assert_eq!(results[1]["verdict"], "ERROR");
    assert!(results[1]["error"].as_str().unwrap().contains("Unsupported"));
    handle.stop().expect("stop server");
}

#[test]
fn unknown_route_is_404() {
    let handle = spawn_server();
    let (status, _) = roundtrip(
        handle.addr,
        b"GET /api/v1/unknown HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    assert_eq!(status, 404);
    handle.stop().expect("stop server");
}

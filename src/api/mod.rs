//! Detect API: a small HTTP server over std TCP.
//!
//! Routes:
//! - `GET /` - static frontend when present, JSON banner otherwise
//! - `POST /api/v1/detect` - multipart `file` + optional `fast_mode`
//! - `POST /api/v1/detect/batch` - multipart `files[]`, batch implies fast
//! - `GET /api/v1/health`
//!
//! One request per connection, parsed by hand; batch items fan out over
//! rayon, each with its own engine.

use anyhow::{anyhow, Result};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::config::{
    classify_extension, MediaKind, SUPPORTED_IMAGE_EXTENSIONS, SUPPORTED_VIDEO_EXTENSIONS,
};
use crate::{Analyzer, Verdict};

const MAX_HEADER_BYTES: usize = 64 * 1024;
const BODY_OVERHEAD_BYTES: u64 = 1024 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    analyzer: Arc<Analyzer>,
}

impl ApiServer {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        Self { analyzer }
    }

    pub fn spawn(self) -> Result<ApiHandle> {
        let configured_addr: SocketAddr = self.analyzer.config().api.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let analyzer = self.analyzer.clone();
        let join = std::thread::spawn(move || {
            if let Err(err) = run_api(listener, analyzer, shutdown_thread) {
                log::error!("detect api stopped: {}", err);
            }
        });

        log::info!("detect api listening on {}", addr);
        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    analyzer: Arc<Analyzer>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                if let Err(err) = handle_connection(stream, &analyzer) {
                    log::warn!("detect api request failed: {}", err);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, analyzer: &Analyzer) -> Result<()> {
    let max_body = analyzer.config().limits.max_video_bytes + BODY_OVERHEAD_BYTES;
    let request = match read_request(&mut stream, max_body as usize) {
        Ok(request) => request,
        Err(err) => {
            write_json(&mut stream, 400, &json!({ "error": err.to_string() }))?;
            return Err(err);
        }
    };

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") => serve_frontend(&mut stream, analyzer),
        ("GET", "/api/v1/health") => serve_health(&mut stream),
        ("POST", "/api/v1/detect") => serve_detect(&mut stream, analyzer, &request),
        ("POST", "/api/v1/detect/batch") => serve_batch(&mut stream, analyzer, &request),
        ("GET", _) | ("POST", _) => {
            write_json(&mut stream, 404, &json!({ "error": "not found" }))
        }
        _ => write_json(&mut stream, 405, &json!({ "error": "method not allowed" })),
    }
}

// ---------------- route handlers ----------------

fn serve_frontend(stream: &mut TcpStream, analyzer: &Analyzer) -> Result<()> {
    let index = analyzer.config().api.static_dir.join("index.html");
    if let Ok(html) = std::fs::read(&index) {
        return write_response(stream, 200, "text/html; charset=utf-8", &html);
    }
    write_json(
        stream,
        200,
        &json!({
            "service": "synthscan",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": ["/api/v1/detect", "/api/v1/detect/batch", "/api/v1/health"],
        }),
    )
}

fn serve_health(stream: &mut TcpStream) -> Result<()> {
    write_json(
        stream,
        200,
        &json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "supported_formats": {
                "images": SUPPORTED_IMAGE_EXTENSIONS,
                "videos": SUPPORTED_VIDEO_EXTENSIONS,
            },
        }),
    )
}

#[derive(Debug, Serialize)]
struct DetectResponse {
    #[serde(flatten)]
    verdict: Verdict,
    analysis_details: serde_json::Value,
    processing_time_ms: f64,
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames_analyzed: Option<usize>,
}

fn serve_detect(stream: &mut TcpStream, analyzer: &Analyzer, request: &HttpRequest) -> Result<()> {
    let parts = match request.multipart_parts() {
        Ok(parts) => parts,
        Err(err) => return write_json(stream, 400, &json!({ "error": err.to_string() })),
    };
    let Some(file) = parts.iter().find(|p| p.name == "file") else {
        return write_json(stream, 400, &json!({ "error": "missing 'file' field" }));
    };
    let fast_mode = parts
        .iter()
        .find(|p| p.name == "fast_mode")
        .map(|p| matches!(text_of(p).trim(), "true" | "1" | "on"))
        .unwrap_or(false);

    match analyze_upload(analyzer, file, fast_mode) {
        Ok(response) => write_json(stream, 200, &serde_json::to_value(response)?),
        Err(failure) => write_json(
            stream,
            failure.status,
            &json!({ "error": failure.message }),
        ),
    }
}

fn serve_batch(stream: &mut TcpStream, analyzer: &Analyzer, request: &HttpRequest) -> Result<()> {
    let parts = match request.multipart_parts() {
        Ok(parts) => parts,
        Err(err) => return write_json(stream, 400, &json!({ "error": err.to_string() })),
    };
    let files: Vec<&Part> = parts
        .iter()
        .filter(|p| p.name == "files" || p.name == "files[]")
        .collect();
    if files.is_empty() {
        return write_json(stream, 400, &json!({ "error": "missing 'files' field" }));
    }
    let max = analyzer.config().limits.max_batch_files;
    if files.len() > max {
        return write_json(
            stream,
            400,
            &json!({ "error": format!("Maximum {max} files per batch") }),
        );
    }

    // Batch implies fast mode; every item owns its own engine.
    let results: Vec<serde_json::Value> = files
        .par_iter()
        .map(|file| match analyze_upload(analyzer, file, true) {
            Ok(response) => serde_json::to_value(response).unwrap_or_else(
                |e| json!({ "filename": file.filename.clone(), "error": e.to_string(), "verdict": "ERROR" }),
            ),
            Err(failure) => json!({
                "filename": file.filename.clone(),
                "error": failure.message,
                "verdict": "ERROR",
            }),
        })
        .collect();

    write_json(
        stream,
        200,
        &json!({ "results": results, "total": results.len() }),
    )
}

struct Failure {
    status: u16,
    message: String,
}

fn reject(message: impl Into<String>) -> Failure {
    Failure {
        status: 400,
        message: message.into(),
    }
}

fn analyze_upload(analyzer: &Analyzer, file: &Part, fast_mode: bool) -> Result<DetectResponse, Failure> {
    let started = Instant::now();
    let filename = file.filename.clone().unwrap_or_default();
    let limits = &analyzer.config().limits;

    let kind = classify_extension(&filename).ok_or_else(|| {
        reject(format!(
            "Unsupported format. Supported: {:?} {:?}",
            SUPPORTED_IMAGE_EXTENSIONS, SUPPORTED_VIDEO_EXTENSIONS
        ))
    })?;

    let (verdict, details, frames_analyzed) = match kind {
        MediaKind::Image => {
            if file.data.len() as u64 > limits.max_image_bytes {
                return Err(reject(format!(
                    "Image too large (max {}MB)",
                    limits.max_image_bytes / (1024 * 1024)
                )));
            }
            let analysis = analyzer
                .analyze_image_bytes(&file.data, fast_mode)
                .map_err(|e| Failure {
                    status: 500,
                    message: format!("Analysis failed: {e:#}"),
                })?;
            (
                analysis.verdict,
                serde_json::to_value(&analysis.details).unwrap_or_default(),
                None,
            )
        }
        MediaKind::Video => {
            if file.data.len() as u64 > limits.max_video_bytes {
                return Err(reject(format!(
                    "Video too large (max {}MB)",
                    limits.max_video_bytes / (1024 * 1024)
                )));
            }
            let analysis = analyze_video_upload(analyzer, file, fast_mode)?;
            (
                analysis.verdict,
                serde_json::to_value(&analysis.details).unwrap_or_default(),
                Some(analysis.frames_analyzed),
            )
        }
    };

    let processing_time_ms =
        (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
    Ok(DetectResponse {
        verdict,
        analysis_details: details,
        processing_time_ms,
        filename,
        frames_analyzed,
    })
}

/// Videos go through a scoped temp file for the decoder; the file is
/// removed on every exit path when the handle drops.
fn analyze_video_upload(
    analyzer: &Analyzer,
    file: &Part,
    fast_mode: bool,
) -> Result<crate::VideoAnalysis, Failure> {
    #[cfg(feature = "video-ffmpeg")]
    {
        let suffix = std::path::Path::new(file.filename.as_deref().unwrap_or("upload.mp4"))
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| ".mp4".to_string());
        let mut tmp = tempfile::Builder::new()
            .prefix("synthscan-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| Failure {
                status: 500,
                message: format!("Video analysis failed: {e}"),
            })?;
        tmp.write_all(&file.data).map_err(|e| Failure {
            status: 500,
            message: format!("Video analysis failed: {e}"),
        })?;

        let frames = crate::ingest::extract_frames(
            tmp.path(),
            analyzer.config().limits.frame_sample_rate,
            analyzer.config().limits.max_frames,
        )
        .map_err(|e| Failure {
            status: 500,
            message: format!("Video analysis failed: {e:#}"),
        })?;
        if frames.is_empty() {
            return Err(reject("Could not extract frames from video"));
        }
        analyzer
            .analyze_frames(&frames, &file.data, fast_mode)
            .map_err(|e| Failure {
                status: 500,
                message: format!("Video analysis failed: {e:#}"),
            })
    }
    #[cfg(not(feature = "video-ffmpeg"))]
    {
        let _ = (analyzer, file, fast_mode);
        Err(Failure {
            status: 500,
            message:
                "Video analysis failed: video decoding not available (build with 'video-ffmpeg')"
                    .to_string(),
        })
    }
}

// ---------------- request plumbing ----------------

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

#[derive(Debug)]
struct Part {
    name: String,
    filename: Option<String>,
    data: Vec<u8>,
}

fn text_of(part: &Part) -> String {
    String::from_utf8_lossy(&part.data).into_owned()
}

impl HttpRequest {
    fn multipart_parts(&self) -> Result<Vec<Part>> {
        let content_type = self
            .headers
            .get("content-type")
            .ok_or_else(|| anyhow!("missing content-type header"))?;
        let boundary = content_type
            .split(';')
            .map(str::trim)
            .find_map(|param| param.strip_prefix("boundary="))
            .map(|b| b.trim_matches('"'))
            .ok_or_else(|| anyhow!("missing multipart boundary"))?;
        parse_multipart(&self.body, boundary)
    }
}

fn read_request(stream: &mut TcpStream, max_body: usize) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];

    // Headers first.
    let header_end = loop {
        if let Some(pos) = find_subsequence(&data, b"\r\n\r\n") {
            break pos + 4;
        }
        if data.len() > MAX_HEADER_BYTES {
            return Err(anyhow!("request headers too large"));
        }
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed before headers completed"));
        }
        data.extend_from_slice(&buf[..n]);
    };

    let header_text = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = header_text.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| anyhow!("missing method"))?
        .to_string();
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .map(|v| v.parse())
        .transpose()
        .map_err(|_| anyhow!("invalid content-length"))?
        .unwrap_or(0);
    if content_length > max_body {
        return Err(anyhow!("request too large"));
    }

    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed before body completed"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    Ok(HttpRequest {
        method,
        path,
        headers,
        body,
    })
}

fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}").into_bytes();
    let mut parts = Vec::new();
    let mut cursor = find_subsequence(body, &delimiter)
        .ok_or_else(|| anyhow!("multipart boundary not found in body"))?;

    loop {
        cursor += delimiter.len();
        if body[cursor..].starts_with(b"--") {
            break; // closing delimiter
        }
        // Skip the CRLF after the delimiter.
        if body[cursor..].starts_with(b"\r\n") {
            cursor += 2;
        }
        let rest = &body[cursor..];
        let Some(next) = find_subsequence(rest, &delimiter) else {
            break;
        };
        let segment = &rest[..next];
        if let Some(part) = parse_part(segment) {
            parts.push(part);
        }
        cursor += next;
    }
    Ok(parts)
}

fn parse_part(segment: &[u8]) -> Option<Part> {
    let header_end = find_subsequence(segment, b"\r\n\r\n")?;
    let headers = String::from_utf8_lossy(&segment[..header_end]);
    let mut data = &segment[header_end + 4..];
    if data.ends_with(b"\r\n") {
        data = &data[..data.len() - 2];
    }

    let mut name = None;
    let mut filename = None;
    for line in headers.split("\r\n") {
        let Some(value) = strip_prefix_ignore_case(line, "content-disposition:") else {
            continue;
        };
        for param in value.split(';').map(str::trim) {
            if let Some(v) = param.strip_prefix("name=") {
                name = Some(v.trim_matches('"').to_string());
            } else if let Some(v) = param.strip_prefix("filename=") {
                filename = Some(v.trim_matches('"').to_string());
            }
        }
    }
    Some(Part {
        name: name?,
        filename,
        data: data.to_vec(),
    })
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn write_json(stream: &mut TcpStream, status: u16, body: &serde_json::Value) -> Result<()> {
    write_response(stream, status, "application/json", body.to_string().as_bytes())
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n",
        status_line = status_line,
        content_type = content_type,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

//! HTTP API Server
//!
//! Lightweight HTTP/1.1 server for the job service. Uses tokio for async
//! I/O without external web framework dependencies. Each connection carries
//! one request and is closed after the response.
//!
//! ## Running the Server
//!
//! ```bash
//! # Start with config/config.yaml
//! replication-manager
//!
//! # With an explicit config file and port override
//! replication-manager --config /etc/replication/manager.yaml --port 9090
//! ```

use crate::api::handlers::*;
use crate::api::models::*;
use crate::config::ManagerConfig;
use crate::error::{ReplicationError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Maximum number of header lines accepted per request
const MAX_HEADERS: usize = 100;

/// Maximum length of the request line or of one header line (bytes)
const MAX_LINE_LENGTH: usize = 8 * 1024;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Bind address
    pub bind: String,
    /// Port
    pub port: u16,
    /// Enable CORS for all origins
    pub cors_enabled: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
            max_body_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl From<&ManagerConfig> for ApiServerConfig {
    fn from(config: &ManagerConfig) -> Self {
        Self {
            bind: config.host.clone(),
            port: config.port,
            ..Default::default()
        }
    }
}

/// A fully rendered HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Content type, absent for empty bodies
    pub content_type: Option<&'static str>,
    /// Body
    pub body: String,
}

impl HttpResponse {
    /// JSON response
    pub fn json<T: Serialize>(status: u16, data: &T) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => Self {
                status,
                content_type: Some("application/json"),
                body,
            },
            Err(e) => {
                tracing::error!("Failed to encode response: {}", e);
                Self::plain(500, "Internal Server Error")
            }
        }
    }

    /// Plain text response
    pub fn plain(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            body: body.into(),
        }
    }

    /// Response without a body
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: String::new(),
        }
    }

    /// JSON error response
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &ApiError::for_status(status, message))
    }

    /// Serialize status line, headers and body
    pub fn to_bytes(&self, cors_enabled: bool) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n",
            self.status,
            status_text(self.status),
            self.body.len(),
        );

        if let Some(content_type) = self.content_type {
            response.push_str(&format!("Content-Type: {}\r\n", content_type));
        }

        if cors_enabled {
            response.push_str("Access-Control-Allow-Origin: *\r\n");
            response.push_str("Access-Control-Allow-Methods: GET, POST, DELETE, OPTIONS\r\n");
            response.push_str("Access-Control-Allow-Headers: Content-Type\r\n");
        }

        response.push_str("\r\n");
        response.push_str(&self.body);
        response.into_bytes()
    }
}

impl From<ReplicationError> for HttpResponse {
    fn from(err: ReplicationError) -> Self {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::debug!("Rejected request: {}", err);
        }
        Self::error(status, err.to_string())
    }
}

/// API HTTP Server
pub struct ApiServer {
    /// Configuration
    config: ApiServerConfig,
    /// Shared application state
    state: Arc<AppState>,
    /// Bound listener
    listener: TcpListener,
}

impl ApiServer {
    /// Bind the listener for a new API server
    pub async fn bind(config: ApiServerConfig, state: Arc<AppState>) -> Result<Self> {
        let addr = format!("{}:{}", config.bind, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ReplicationError::connection(&addr, e.to_string()))?;

        Ok(Self {
            config,
            state,
            listener,
        })
    }

    /// Get the bound address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| ReplicationError::connection(&self.config.bind, e.to_string()))
    }

    /// Serve until the process is stopped
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        tracing::info!("{} listening on http://{}", self.state.service_name, addr);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);

                        let state = Arc::clone(&self.state);
                        let config = self.config.clone();

                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state, &config).await {
                                tracing::warn!("Connection error from {}: {}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                    }
                },
            }
        }

        tracing::info!("API server shutting down");
        Ok(())
    }
}

/// Handle a single HTTP connection
async fn handle_connection(
    stream: TcpStream,
    state: &AppState,
    config: &ApiServerConfig,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let response = match read_request(&mut reader, config).await {
        Ok(Some(request)) => {
            tracing::debug!("{} {}", request.method, request.target);
            route_request(
                state,
                &request.method,
                &request.target,
                request.body.as_deref(),
                config,
            )
        }
        // Peer closed before sending anything
        Ok(None) => return Ok(()),
        Err(e) => HttpResponse::from(e),
    };

    write_half.write_all(&response.to_bytes(config.cors_enabled)).await?;
    write_half.flush().await?;
    write_half.shutdown().await?;

    Ok(())
}

/// Parsed request line, headers and body
struct Request {
    method: String,
    target: String,
    body: Option<Vec<u8>>,
}

/// Read one request from the connection
async fn read_request<R>(reader: &mut R, config: &ApiServerConfig) -> Result<Option<Request>>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = match read_line_limited(reader).await? {
        Some(line) => line,
        None => return Ok(None),
    };

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ReplicationError::http(400, "Bad Request"));
    }

    let method = parts[0].to_string();
    let target = parts[1].to_string();

    let mut content_length = 0usize;
    let mut header_count = 0usize;

    loop {
        let line = match read_line_limited(reader).await? {
            Some(line) if !line.trim().is_empty() => line,
            _ => break,
        };

        header_count += 1;
        if header_count > MAX_HEADERS {
            return Err(ReplicationError::http(400, "Too many headers"));
        }

        if let Some((key, value)) = line.trim().split_once(':') {
            if key.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| ReplicationError::http(400, "Invalid Content-Length"))?;
            }
        }
    }

    if content_length > config.max_body_size {
        return Err(ReplicationError::http(
            413,
            format!("Body exceeds {} bytes", config.max_body_size),
        ));
    }

    let body = if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await?;
        Some(body)
    } else {
        None
    };

    Ok(Some(Request {
        method,
        target,
        body,
    }))
}

/// Read one CRLF-terminated line of at most `MAX_LINE_LENGTH` bytes.
///
/// Returns `None` at end of stream.
async fn read_line_limited<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut line)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if read == MAX_LINE_LENGTH && !line.ends_with(b"\n") {
        return Err(ReplicationError::http(
            431,
            format!("Request line exceeds {} bytes", MAX_LINE_LENGTH),
        ));
    }

    String::from_utf8(line)
        .map(Some)
        .map_err(|_| ReplicationError::http(400, "Request head is not valid UTF-8"))
}

/// Route HTTP request to appropriate handler
pub fn route_request(
    state: &AppState,
    method: &str,
    target: &str,
    body: Option<&[u8]>,
    config: &ApiServerConfig,
) -> HttpResponse {
    // Parse path and query string
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let query_params = parse_query_string(query);

    // Handle CORS preflight
    if method == "OPTIONS" && config.cors_enabled {
        return HttpResponse::empty(204);
    }

    match (method, path) {
        ("GET", "/jobs") => {
            if query_params.contains_key("count") {
                HttpResponse::json(200, &handle_count_jobs(state))
            } else {
                HttpResponse::json(200, &handle_list_jobs(state))
            }
        }

        ("POST", "/jobs") => match handle_create_job(state, body) {
            Ok(job) => HttpResponse::json(201, &job),
            Err(e) => HttpResponse::from(e),
        },

        (_, "/jobs") => HttpResponse::error(405, "Method not allowed"),

        // Job by ID
        (method, path) if path.starts_with("/jobs/") => {
            let job_id = percent_decode(&path["/jobs/".len()..], false);
            if job_id.is_empty() {
                return HttpResponse::error(404, "Not found");
            }

            match method {
                "GET" => match handle_get_job(state, &job_id) {
                    Some(job) => HttpResponse::json(200, &job),
                    None => HttpResponse::error(404, "Job not found"),
                },
                "DELETE" => match handle_delete_job(state, &job_id) {
                    Some(_) => HttpResponse::empty(204),
                    None => HttpResponse::error(404, "Job not found"),
                },
                _ => HttpResponse::error(405, "Method not allowed"),
            }
        }

        ("GET", "/status") => HttpResponse::json(200, &handle_status(state)),

        // Health check
        ("GET", "/health") => HttpResponse::plain(200, "OK"),

        // Not found
        _ => HttpResponse::error(404, "Not found"),
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Parse query string into key-value pairs
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((percent_decode(key, true), percent_decode(value, true)))
        })
        .collect()
}

/// Percent-decode a URL component.
///
/// `+` means space only in query strings; in path segments it is literal.
fn percent_decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        decoded.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        decoded.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' if plus_as_space => {
                decoded.push(b' ');
                i += 1;
            }
            byte => {
                decoded.push(byte);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobRegistry;
    use serde_json::{json, Value};

    fn state() -> AppState {
        AppState::new(Arc::new(JobRegistry::new()), "test-manager")
    }

    fn route(state: &AppState, method: &str, target: &str, body: Option<&str>) -> HttpResponse {
        route_request(state, method, target, body.map(str::as_bytes), &ApiServerConfig::default())
    }

    fn body_json(response: &HttpResponse) -> Value {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("count");
        assert_eq!(params.get("count"), Some(&String::new()));

        let params = parse_query_string("page=1&search=hello+world");
        assert_eq!(params.get("page"), Some(&"1".to_string()));
        assert_eq!(params.get("search"), Some(&"hello world".to_string()));

        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hello%20world", false), "hello world");
        assert_eq!(percent_decode("foo+bar", true), "foo bar");
        assert_eq!(percent_decode("foo+bar", false), "foo+bar");
        assert_eq!(percent_decode("test%2Fpath", false), "test/path");
        assert_eq!(percent_decode("caf%C3%A9", false), "café");
        assert_eq!(percent_decode("100%", false), "100%");
        assert_eq!(percent_decode("%zz", false), "%zz");
    }

    #[test]
    fn test_job_lifecycle_routes() {
        let state = state();

        let created = route(&state, "POST", "/jobs", Some(r#"{"obj_name": "foo"}"#));
        assert_eq!(created.status, 201);
        let job_id = body_json(&created)["job_id"].as_str().unwrap().to_string();

        let fetched = route(&state, "GET", &format!("/jobs/{}", job_id), None);
        assert_eq!(fetched.status, 200);
        assert_eq!(body_json(&fetched)["obj_name"], json!("foo"));

        let listed = route(&state, "GET", "/jobs", None);
        assert_eq!(listed.status, 200);
        assert_eq!(body_json(&listed).as_object().unwrap().len(), 1);

        let deleted = route(&state, "DELETE", &format!("/jobs/{}", job_id), None);
        assert_eq!(deleted.status, 204);
        assert!(deleted.body.is_empty());

        let count = route(&state, "GET", "/jobs?count", None);
        assert_eq!(body_json(&count), json!({"count": 0}));
    }

    #[test]
    fn test_empty_job_is_client_error() {
        let state = state();
        let response = route(&state, "POST", "/jobs", Some("{}"));

        assert_eq!(response.status, 400);
        assert_eq!(body_json(&response)["code"], json!("BAD_REQUEST"));
        assert_eq!(state.jobs.count(), 0);
    }

    #[test]
    fn test_plus_in_job_id_path() {
        let state = state();
        let created = route(&state, "POST", "/jobs", Some(r#"{"job_id": "a+b", "obj_name": "foo"}"#));
        assert_eq!(created.status, 201);

        let fetched = route(&state, "GET", "/jobs/a+b", None);
        assert_eq!(fetched.status, 200);
        assert_eq!(body_json(&fetched)["job_id"], json!("a+b"));

        assert_eq!(route(&state, "GET", "/jobs/a%2Bb", None).status, 200);
        assert_eq!(route(&state, "DELETE", "/jobs/a+b", None).status, 204);
        assert_eq!(state.jobs.count(), 0);
    }

    #[test]
    fn test_invalid_utf8_body_rejected() {
        let state = state();
        let body: &[u8] = b"{\"obj_name\": \"\xff\"}";
        let response = route_request(&state, "POST", "/jobs", Some(body), &ApiServerConfig::default());

        assert_eq!(response.status, 400);
        assert_eq!(body_json(&response)["code"], json!("BAD_REQUEST"));
        assert_eq!(state.jobs.count(), 0);
    }

    #[test]
    fn test_missing_job_routes() {
        let state = state();
        assert_eq!(route(&state, "GET", "/jobs/invalid-job-id", None).status, 404);
        assert_eq!(route(&state, "DELETE", "/jobs/invalid-job-id", None).status, 404);
        assert_eq!(route(&state, "GET", "/jobs/", None).status, 404);
    }

    #[test]
    fn test_method_and_path_errors() {
        let state = state();
        assert_eq!(route(&state, "PUT", "/jobs", None).status, 405);
        assert_eq!(route(&state, "PATCH", "/jobs/abc", None).status, 405);
        assert_eq!(route(&state, "GET", "/nope", None).status, 404);
        assert_eq!(route(&state, "OPTIONS", "/jobs", None).status, 204);
    }

    #[test]
    fn test_status_and_health() {
        let state = state();
        let health = route(&state, "GET", "/health", None);
        assert_eq!(health.body, "OK");

        let status = route(&state, "GET", "/status", None);
        assert_eq!(body_json(&status)["service_name"], json!("test-manager"));
    }

    #[test]
    fn test_response_bytes() {
        let bytes = HttpResponse::empty(204).to_bytes(false);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(!text.contains("Content-Type"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    async fn send(addr: SocketAddr, method: &str, target: &str, body: Option<&str>) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let body = body.unwrap_or("");
        let request = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            method,
            target,
            addr,
            body.len(),
            body
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
        (status, body.to_string())
    }

    async fn start_server() -> (SocketAddr, Arc<AppState>, tokio::sync::oneshot::Sender<()>) {
        let state = Arc::new(state());
        let config = ApiServerConfig {
            port: 0,
            ..Default::default()
        };
        let server = ApiServer::bind(config, Arc::clone(&state)).await.unwrap();
        let addr = server.local_addr().unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        (addr, state, tx)
    }

    #[tokio::test]
    async fn test_end_to_end_over_socket() {
        let (addr, state, shutdown) = start_server().await;

        let (status, body) = send(addr, "POST", "/jobs", Some(r#"{"obj_name": "foo"}"#)).await;
        assert_eq!(status, 201);
        let created: Value = serde_json::from_str(&body).unwrap();
        let job_id = created["job_id"].as_str().unwrap().to_string();

        let (status, body) = send(addr, "GET", &format!("/jobs/{}", job_id), None).await;
        assert_eq!(status, 200);
        let fetched: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(fetched, json!({"obj_name": "foo", "job_id": job_id}));

        let (status, body) = send(addr, "GET", "/jobs", None).await;
        assert_eq!(status, 200);
        let list: Value = serde_json::from_str(&body).unwrap();
        let list = list.as_object().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.values().next().unwrap()["job_id"], json!(job_id));

        let (status, body) = send(addr, "DELETE", &format!("/jobs/{}", job_id), None).await;
        assert_eq!(status, 204);
        assert!(body.is_empty());

        let (status, body) = send(addr, "GET", "/jobs?count", None).await;
        assert_eq!(status, 200);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"count": 0}));

        assert_eq!(state.jobs.count(), 0);
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_empty_payload_over_socket() {
        let (addr, state, shutdown) = start_server().await;

        let (status, _) = send(addr, "POST", "/jobs", Some("{}")).await;
        assert_eq!(status, 400);

        let (status, _) = send(addr, "GET", "/jobs/invalid-job-id", None).await;
        assert_eq!(status, 404);

        let (status, _) = send(addr, "DELETE", "/jobs/invalid-job-id", None).await;
        assert_eq!(status, 404);

        assert_eq!(state.jobs.count(), 0);
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_read_request_limits() {
        let config = ApiServerConfig {
            max_body_size: 16,
            ..Default::default()
        };

        let raw = "POST /jobs HTTP/1.1\r\nContent-Length: 64\r\n\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader, &config).await.err().unwrap();
        assert_eq!(err.status_code(), 413);

        let raw = "POST /jobs HTTP/1.1\r\nContent-Length: abc\r\n\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader, &config).await.err().unwrap();
        assert_eq!(err.status_code(), 400);

        let raw = "GARBAGE\r\n\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader, &config).await.err().unwrap();
        assert_eq!(err.status_code(), 400);

        let mut reader = BufReader::new(&b""[..]);
        assert!(read_request(&mut reader, &config).await.unwrap().is_none());

        let raw = format!("GET /jobs/{} HTTP/1.1\r\n\r\n", "x".repeat(MAX_LINE_LENGTH));
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader, &config).await.err().unwrap();
        assert_eq!(err.status_code(), 431);

        let raw = format!("GET /jobs HTTP/1.1\r\nX-Filler: {}\r\n\r\n", "y".repeat(MAX_LINE_LENGTH));
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_request(&mut reader, &config).await.err().unwrap();
        assert_eq!(err.status_code(), 431);
    }

    #[tokio::test]
    async fn test_read_request_body() {
        let raw = "POST /jobs HTTP/1.1\r\ncontent-length: 19\r\n\r\n{\"obj_name\": \"foo\"}";
        let mut reader = BufReader::new(raw.as_bytes());
        let request = read_request(&mut reader, &ApiServerConfig::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/jobs");
        assert_eq!(request.body.as_deref(), Some(br#"{"obj_name": "foo"}"#.as_slice()));
    }
}

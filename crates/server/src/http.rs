//! Minimal HTTP/1.1 plumbing on tokio streams.
//!
//! Speaks just enough HTTP for this service: one request per connection,
//! `Content-Length` bodies only, `Connection: close` on every response.
//! Anything fancier belongs in a reverse proxy in front.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single request or header line.
const MAX_LINE_BYTES: usize = 8 * 1024;
/// Upper bound on the request line plus all headers.
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Errors from reading a request off the wire.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("request body exceeds {max} bytes")]
    BodyTooLarge { max: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed request.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub target: String,
    /// Header names are lowercased at parse time.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// First header value for `name` (lowercase).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Request target without query or fragment.
    pub fn path(&self) -> &str {
        let end = self
            .target
            .find(|c| c == '?' || c == '#')
            .unwrap_or(self.target.len());
        &self.target[..end]
    }
}

/// Read one request. `max_body` bounds the declared `Content-Length`; the
/// check runs before any body byte is read.
pub async fn read_request<R>(reader: &mut R, max_body: usize) -> Result<Request, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let request_line = read_line(reader).await?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| malformed("empty request line"))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| malformed("missing request target"))?
        .to_string();
    let version = parts
        .next()
        .ok_or_else(|| malformed("missing http version"))?;
    if !version.starts_with("HTTP/1.") {
        return Err(malformed(&format!("unsupported version {version}")));
    }

    let mut headers = Vec::new();
    let mut head_bytes = request_line.len();
    loop {
        let line = read_line(reader).await?;
        if line.is_empty() {
            break;
        }
        head_bytes += line.len();
        if head_bytes > MAX_HEAD_BYTES {
            return Err(malformed("header section too large"));
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| malformed("header line without a colon"))?;
        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    let content_length = match headers.iter().find(|(key, _)| key == "content-length") {
        Some((_, value)) => value
            .parse::<usize>()
            .map_err(|_| malformed("invalid content-length"))?,
        None => 0,
    };
    if content_length > max_body {
        return Err(HttpError::BodyTooLarge { max: max_body });
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;

    Ok(Request {
        method,
        target,
        headers,
        body,
    })
}

/// Read one CRLF-terminated line, bounded by `MAX_LINE_BYTES`.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, HttpError> {
    let mut limited = (&mut *reader).take(MAX_LINE_BYTES as u64);
    let mut line = String::new();
    let n = limited.read_line(&mut line).await?;
    if n == 0 {
        return Err(malformed("connection closed mid-request"));
    }
    if !line.ends_with('\n') && n >= MAX_LINE_BYTES {
        return Err(malformed("header line too long"));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

fn malformed(reason: &str) -> HttpError {
    HttpError::Malformed(reason.to_string())
}

/// An outgoing response.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub extra_headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// A JSON response with the given status.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            extra_headers: Vec::new(),
            body: value.to_string().into_bytes(),
        }
    }

    /// A 200 PNG response served as an attachment.
    pub fn png(bytes: Vec<u8>, download_name: &str) -> Self {
        Self {
            status: 200,
            content_type: "image/png",
            extra_headers: vec![(
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{download_name}\""),
            )],
            body: bytes,
        }
    }
}

/// Write `response` with `Connection: close` framing.
pub async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.content_type,
        response.body.len()
    );
    for (name, value) in &response.extra_headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reason phrase for the statuses this service emits.
fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

//! `multipart/form-data` body parsing.
//!
//! Implements just enough of the format for file uploads: find the
//! boundary, walk the parts, pull out the one whose field name is `file`.
//! Nested multipart and content-transfer-encodings are not supported.

use crate::error::ServiceError;

/// An uploaded file extracted from a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Client-supplied file name; may be empty.
    pub filename: String,
    /// Raw part payload.
    pub bytes: Vec<u8>,
}

/// The boundary parameter of a `Content-Type` header value.
pub fn boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        Some(value.trim().trim_matches('"').to_string())
    })
}

/// Extract the part whose form field name is `file`.
pub fn extract_file_part(body: &[u8], boundary: &str) -> Result<FilePart, ServiceError> {
    let first = format!("--{boundary}");
    // Parts are separated by CRLF + delimiter; matching on the longer
    // marker keeps payloads containing plain "--boundary" text intact.
    let marker = format!("\r\n--{boundary}");

    let mut pos = if body.starts_with(first.as_bytes()) {
        first.len()
    } else {
        match find(body, marker.as_bytes(), 0) {
            Some(at) => at + marker.len(),
            None => return Err(missing_file_part()),
        }
    };

    loop {
        if body[pos..].starts_with(b"--") {
            // Closing delimiter: no part named `file` was present.
            return Err(missing_file_part());
        }
        if !body[pos..].starts_with(b"\r\n") {
            return Err(ServiceError::InvalidInput("malformed multipart body".into()));
        }
        pos += 2;

        let next = find(body, marker.as_bytes(), pos)
            .ok_or_else(|| ServiceError::InvalidInput("unterminated multipart part".into()))?;
        if let Some(file) = parse_part(&body[pos..next])? {
            return Ok(file);
        }
        pos = next + marker.len();
    }
}

/// Parse one part; `Some` when its field name is `file`.
fn parse_part(part: &[u8]) -> Result<Option<FilePart>, ServiceError> {
    let header_end = find(part, b"\r\n\r\n", 0)
        .ok_or_else(|| ServiceError::InvalidInput("multipart part missing headers".into()))?;
    let payload = &part[header_end + 4..];
    let headers = std::str::from_utf8(&part[..header_end])
        .map_err(|_| ServiceError::InvalidInput("multipart headers are not valid utf-8".into()))?;

    for line in headers.split("\r\n") {
        let (name, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        if !name.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        if disposition_param(value, "name").as_deref() != Some("file") {
            return Ok(None);
        }
        let filename = disposition_param(value, "filename").unwrap_or_default();
        return Ok(Some(FilePart {
            filename,
            bytes: payload.to_vec(),
        }));
    }
    Ok(None)
}

/// Value of a `key="value"` parameter inside a Content-Disposition value.
fn disposition_param(value: &str, key: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.trim().split_once('=')?;
        if !name.trim().eq_ignore_ascii_case(key) {
            return None;
        }
        Some(val.trim().trim_matches('"').to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|at| at + from)
}

fn missing_file_part() -> ServiceError {
    ServiceError::InvalidInput(
        "no file part in request; the form field must be named 'file'".into(),
    )
}

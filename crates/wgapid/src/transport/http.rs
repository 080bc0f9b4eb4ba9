//! Minimal HTTP/1.1 framing: one request per connection.

use std::io::{self, Read, Write};

use super::errors::HttpError;

/// Largest accepted request head (request line plus headers).
pub(crate) const MAX_HEADER_BYTES: usize = 16 * 1024;
/// Largest accepted request body.
pub(crate) const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Largest number of header lines in one request.
const MAX_HEADERS: usize = 64;

const CONTINUE_EXPECTATION: &str = "100-continue";
const CONTINUE_RESPONSE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Request {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    remote_addr: String,
}

impl Request {
    #[cfg(test)]
    pub(crate) fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Vec::new(),
            body: Vec::new(),
            remote_addr: String::new(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub(crate) fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// First value of a header, matched case-insensitively.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusCode {
    Ok,
    BadRequest,
    Forbidden,
    MethodNotAllowed,
    PayloadTooLarge,
}

impl StatusCode {
    pub(crate) const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::MethodNotAllowed => 405,
            Self::PayloadTooLarge => 413,
        }
    }

    const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::PayloadTooLarge => "Payload Too Large",
        }
    }
}

/// An HTTP response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Response {
    status: StatusCode,
    content_type: &'static str,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl Response {
    /// `200 OK` with a JSON body.
    pub(crate) fn json(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Ok,
            content_type: wgapi_types::CONTENT_TYPE,
            headers: Vec::new(),
            body,
        }
    }

    /// Plain-text error with a trailing newline.
    pub(crate) fn error(status: StatusCode, message: impl AsRef<str>) -> Self {
        Self {
            status,
            content_type: TEXT_CONTENT_TYPE,
            headers: Vec::new(),
            body: format!("{}\n", message.as_ref()).into_bytes(),
        }
    }

    #[must_use]
    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) const fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// Reads one request from the stream.
///
/// A client announcing `Expect: 100-continue` is sent an interim
/// `100 Continue` before the body is read.
///
/// # Errors
///
/// Returns [`HttpError::Closed`] when the peer sends nothing,
/// [`HttpError::TooLarge`] when limits are exceeded, and
/// [`HttpError::Malformed`] for framing errors.
pub(crate) fn read_request<S: Read + Write>(
    stream: &mut S,
    remote_addr: &str,
) -> Result<Request, HttpError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    let (head, header_end) = loop {
        if let Some(parsed) = parse_head(&buffer)? {
            break parsed;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            return Err(HttpError::TooLarge);
        }
        let read = read_chunk_with_retry(stream, &mut chunk)?;
        if read == 0 {
            return Err(if buffer.is_empty() {
                HttpError::Closed
            } else {
                HttpError::malformed("incomplete request headers")
            });
        }
        buffer.extend_from_slice(chunk.get(..read).unwrap_or_default());
    };
    if header_end > MAX_HEADER_BYTES {
        return Err(HttpError::TooLarge);
    }

    let mut request = Request {
        method: head.method,
        path: head.path,
        headers: head.headers,
        body: Vec::new(),
        remote_addr: remote_addr.to_owned(),
    };

    if request
        .header("transfer-encoding")
        .is_some_and(|value| !value.eq_ignore_ascii_case("identity"))
    {
        return Err(HttpError::malformed("transfer encodings are not supported"));
    }
    let length = match request.header("content-length") {
        Some(value) => value
            .parse::<usize>()
            .map_err(|_| HttpError::malformed(format!("invalid content-length {value:?}")))?,
        None => 0,
    };
    if length > MAX_BODY_BYTES {
        return Err(HttpError::TooLarge);
    }

    let mut body = buffer.split_off(header_end);
    if body.len() < length
        && request
            .header("expect")
            .is_some_and(|value| value.eq_ignore_ascii_case(CONTINUE_EXPECTATION))
    {
        stream.write_all(CONTINUE_RESPONSE)?;
        stream.flush()?;
    }
    while body.len() < length {
        let read = read_chunk_with_retry(stream, &mut chunk)?;
        if read == 0 {
            return Err(HttpError::malformed("request body truncated"));
        }
        body.extend_from_slice(chunk.get(..read).unwrap_or_default());
    }
    body.truncate(length);
    request.body = body;
    Ok(request)
}

struct Head {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

/// Parses the request head once it is complete, returning it with its length.
fn parse_head(buffer: &[u8]) -> Result<Option<(Head, usize)>, HttpError> {
    let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Request::new(&mut slots);
    let header_end = match parsed.parse(buffer) {
        Ok(httparse::Status::Complete(length)) => length,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(httparse::Error::TooManyHeaders) => return Err(HttpError::TooLarge),
        Err(error) => return Err(HttpError::malformed(error.to_string())),
    };

    let headers = parsed
        .headers
        .iter()
        .map(|header| {
            let value = std::str::from_utf8(header.value).map_err(|_| {
                HttpError::malformed(format!("header {:?} is not UTF-8", header.name))
            })?;
            Ok((header.name.to_owned(), value.trim().to_owned()))
        })
        .collect::<Result<Vec<_>, HttpError>>()?;
    let head = Head {
        method: parsed.method.unwrap_or_default().to_owned(),
        path: parsed.path.unwrap_or_default().to_owned(),
        headers,
    };
    Ok(Some((head, header_end)))
}

fn read_chunk_with_retry<R: Read>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

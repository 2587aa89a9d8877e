use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::MonitorError;

/// Hard cap on request size; the endpoints carry no meaningful body.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

pub(super) struct Request {
    pub(super) method: String,
    pub(super) path: String,
}

pub(super) struct RequestError {
    pub(super) status: u16,
    pub(super) message: String,
}

impl RequestError {
    pub(super) fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

pub(super) async fn read_request(socket: &mut TcpStream) -> Result<Request, RequestError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let bytes = socket
            .read(&mut chunk)
            .await
            .map_err(|err| RequestError::new(400, format!("Failed to read request: {}", err)))?;
        if bytes == 0 {
            return Err(RequestError::new(400, "Empty request"));
        }
        let read_slice = chunk
            .get(..bytes)
            .ok_or_else(|| RequestError::new(400, "Invalid read length"))?;
        buffer.extend_from_slice(read_slice);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(RequestError::new(413, "Request too large"));
        }
        if find_header_end(&buffer).is_some() {
            break;
        }
    }

    let header_end = find_header_end(&buffer)
        .ok_or_else(|| RequestError::new(400, "Malformed request headers"))?;
    let header_bytes = buffer
        .get(..header_end)
        .ok_or_else(|| RequestError::new(400, "Malformed request headers"))?;
    let header_text = std::str::from_utf8(header_bytes)
        .map_err(|err| RequestError::new(400, format!("Invalid request encoding: {}", err)))?;
    let request_line = header_text
        .split("\r\n")
        .next()
        .ok_or_else(|| RequestError::new(400, "Missing request line"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| RequestError::new(400, "Missing HTTP method"))?;
    let path = parts
        .next()
        .ok_or_else(|| RequestError::new(400, "Missing request path"))?;

    Ok(Request {
        method: method.to_owned(),
        path: path.to_owned(),
    })
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

pub(super) async fn write_plain_response(
    socket: &mut TcpStream,
    status: u16,
    message: &str,
) -> Result<(), MonitorError> {
    let mut body = message.to_owned();
    if !body.ends_with('\n') {
        body.push('\n');
    }
    write_response(socket, status, "text/plain; charset=utf-8", body.as_bytes()).await
}

pub(super) async fn write_json_response(
    socket: &mut TcpStream,
    status: u16,
    body: &[u8],
) -> Result<(), MonitorError> {
    write_response(socket, status, "application/json", body).await
}

async fn write_response(
    socket: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> Result<(), MonitorError> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        content_type,
        body.len()
    );
    socket
        .write_all(head.as_bytes())
        .await
        .map_err(|err| MonitorError::Io {
            context: "write response head",
            source: err,
        })?;
    socket.write_all(body).await.map_err(|err| MonitorError::Io {
        context: "write response body",
        source: err,
    })?;
    Ok(())
}

//! HTTP response handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::HOTRELOAD_PATH;
use crate::scenario::MockResponse;
use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

/// Respond with bytes from the build output store.
pub fn respond_bytes(request: Request, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }
    send_body(request, 200, content_type, body)
}

/// Respond with a file from the static directory.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with the development document, live reload client included.
pub fn respond_document(request: Request, html: String) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, HTML);
    }
    send_body(request, 200, HTML, inject_hotreload(html).into_bytes())
}

/// Respond with hotreload.js from memory.
pub fn respond_hotreload_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{HOTRELOAD_JS, HotreloadVars};

    let body = HOTRELOAD_JS.render(&HotreloadVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

/// Respond with a mock scenario response.
pub fn respond_mock(request: Request, mock: MockResponse) -> Result<()> {
    send_body(request, mock.status, mock.content_type, mock.body)
}

/// Respond with 202 Accepted (client error report).
pub fn respond_accepted(request: Request) -> Result<()> {
    let response = Response::empty(StatusCode(202));
    request.respond(response)?;
    Ok(())
}

/// Respond with 502 Bad Gateway (relay fetch failed).
pub fn respond_bad_gateway(request: Request, error: &anyhow::Error) -> Result<()> {
    let body = format!("502 Bad Gateway\n\n{error:#}");
    send_body(request, 502, PLAIN, body.into_bytes())
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 404, PLAIN);
    }
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Insert the live reload script before the last `</body>`, or append it.
pub fn inject_hotreload(html: String) -> String {
    let script = format!(r#"<script src="{HOTRELOAD_PATH}"></script>"#);

    // Byte pattern for </body>; the document template is lowercase
    const PATTERN: &[u8] = b"</body>";

    match html
        .as_bytes()
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + script.len());
            result.push_str(&html[..pos]);
            result.push_str(&script);
            result.push_str(&html[pos..]);
            result
        }
        // No </body> found, append to end (browsers handle this gracefully)
        None => html + &script,
    }
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header `{key}: {value}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_body_close() {
        let html = "<html><body><p>x</p></body></html>".to_string();
        assert_eq!(
            inject_hotreload(html),
            r#"<html><body><p>x</p><script src="/__sandbox/hotreload.js"></script></body></html>"#
        );
    }

    #[test]
    fn test_inject_appends_without_body() {
        let injected = inject_hotreload("<p>x</p>".to_string());
        assert!(injected.starts_with("<p>x</p><script"));
    }

    #[test]
    fn test_headers_are_valid() {
        assert!(make_header("Content-Type", JAVASCRIPT).is_ok());
        assert!(make_header("Cache-Control", "no-store").is_ok());
    }
}

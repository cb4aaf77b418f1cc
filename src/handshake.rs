//! The opening-handshake helper (spec.md §4.4). Generalizes the teacher's
//! `websocket/handshake.rs` (which worked directly against the concrete
//! `HttpRequest`/`HttpResponse` types) behind the accessor-trait contract
//! spec.md §6 defines, so the core never depends on a specific HTTP parser.

use base64::{engine::general_purpose, Engine as _};
use sha1::{Digest, Sha1};

use crate::error::{WsError, WsErrorKind};

/// Exact literal the RFC specifies (RFC 6455 §1.3).
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Read-only accessor contract for the incoming handshake request
/// (spec.md §6). An external HTTP parser owns the concrete representation;
/// the core only ever calls through this trait.
pub trait HandshakeRequest {
    fn method(&self) -> &str;
    fn http_version(&self) -> &str;
    fn header(&self, name: &str) -> Option<&str>;
    /// A header's value split on `,` into trimmed parameter tokens (used for
    /// `Sec-WebSocket-Extensions` and `Sec-WebSocket-Protocol`).
    fn parameter_list(&self, name: &str) -> Vec<String> {
        self.header(name)
            .map(|v| v.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default()
    }
    fn uri(&self) -> &str;
}

/// Write-only accessor contract for the outgoing handshake response
/// (spec.md §6).
pub trait HandshakeResponse {
    fn replace_header(&mut self, name: &str, value: &str);
    fn append_header(&mut self, name: &str, value: &str);
    fn raw(&self) -> Vec<u8>;
}

/// `validate_handshake` (spec.md §4.4): method must be `GET`, version must
/// be `HTTP/1.1`, and `Sec-WebSocket-Key` must be present and non-empty.
pub fn validate_handshake(request: &dyn HandshakeRequest) -> Result<(), WsError> {
    if !request.method().eq_ignore_ascii_case("GET") {
        return Err(WsError::new(
            WsErrorKind::InvalidHttpMethod,
            format!("expected GET, got {}", request.method()),
        ));
    }
    if request.http_version() != "HTTP/1.1" {
        return Err(WsError::new(
            WsErrorKind::InvalidHttpVersion,
            format!("expected HTTP/1.1, got {}", request.http_version()),
        ));
    }
    match request.header("sec-websocket-key") {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(WsError::new(
            WsErrorKind::MissingRequiredHeader,
            "missing or empty Sec-WebSocket-Key",
        )),
    }
}

/// `process_handshake` (spec.md §4.4): compute `Sec-WebSocket-Accept` from
/// `Sec-WebSocket-Key` and write it, plus the `Upgrade`/`Connection` tokens,
/// onto `response`.
pub fn process_handshake(
    request: &dyn HandshakeRequest,
    response: &mut dyn HandshakeResponse,
) -> Result<(), WsError> {
    let key = request.header("sec-websocket-key").ok_or_else(|| {
        WsError::new(WsErrorKind::MissingRequiredHeader, "missing Sec-WebSocket-Key")
    })?;

    let accept = accept_key(key);

    response.replace_header("Sec-WebSocket-Accept", &accept);
    response.append_header("Upgrade", "websocket");
    response.append_header("Connection", "Upgrade");
    Ok(())
}

/// Compute `Sec-WebSocket-Accept` for a given `Sec-WebSocket-Key`: SHA-1 over
/// `key + GUID`, base64-encoded.
pub fn accept_key(websocket_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(websocket_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let digest = hasher.finalize();
    general_purpose::STANDARD.encode(digest)
}

/// Split a `Host` header value into `(host, optional port)` per spec.md §6:
/// the last `:` preceded by `]` (or no `]` present) separates host and port;
/// otherwise the entire value is the host (a bare IPv6 literal).
pub fn split_host_port(host_header: &str) -> (&str, Option<&str>) {
    match host_header.rfind(']') {
        Some(bracket) => match host_header[bracket..].find(':') {
            Some(offset) => {
                let colon = bracket + offset;
                (&host_header[..colon], Some(&host_header[colon + 1..]))
            }
            None => (host_header, None),
        },
        None => match host_header.rfind(':') {
            Some(colon) => (&host_header[..colon], Some(&host_header[colon + 1..])),
            None => (host_header, None),
        },
    }
}

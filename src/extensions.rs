//! The extension negotiator (spec.md §4.5). Parses a `Sec-WebSocket-Extensions`
//! offer and delegates to a pluggable `permessage-compress` collaborator;
//! only that one extension token is recognized (spec.md §6).

use std::fmt;

use crate::error::{WsError, WsErrorKind};

/// One parsed extension offer: a token name plus its `;`-separated
/// parameters, each either bare (`no_context_takeover`) or `key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionOffer {
    pub name: String,
    pub params: Vec<(String, Option<String>)>,
}

const PERMESSAGE_COMPRESS: &str = "permessage-compress";

/// Parse a raw `Sec-WebSocket-Extensions` header value into offers.
/// Top-level entries are comma-separated; each entry's parameters are
/// semicolon-separated. An empty segment between semicolons (`;;`) is
/// malformed grammar and rejected.
pub fn parse_extensions_header(value: &str) -> Result<Vec<ExtensionOffer>, WsError> {
    let mut offers = Vec::new();
    for entry in value.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let mut parts = entry.split(';');
        let name = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WsErrorKind::ExtensionParseError)?
            .to_string();

        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                return Err(WsErrorKind::ExtensionParseError.into());
            }
            match param.split_once('=') {
                Some((k, v)) => {
                    let v = v.trim().trim_matches('"');
                    params.push((k.trim().to_string(), Some(v.to_string())));
                }
                None => params.push((param.to_string(), None)),
            }
        }
        offers.push(ExtensionOffer { name, params });
    }
    Ok(offers)
}

/// The pluggable permessage-compress collaborator (spec.md §6). The
/// concrete DEFLATE codec is out of the core's scope; this trait is the
/// seam, negotiated the way `Sender`/`Receiver` hold `Box<dyn Extension>` in
/// similar Rust WebSocket stacks.
pub trait PermessageCompress: fmt::Debug {
    fn is_implemented(&self) -> bool;
    fn is_enabled(&self) -> bool;

    /// Attempt to negotiate against one offer's parameters. Returns the
    /// response fragment to advertise back (e.g. `"permessage-compress"`)
    /// on success, or an error kind on a per-extension failure — which the
    /// negotiator treats as *soft*: the offer is dropped, the handshake
    /// still succeeds (spec.md §4.5, §7).
    fn negotiate(&mut self, params: &[(String, Option<String>)]) -> Result<String, WsErrorKind>;

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), WsError>;
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), WsError>;
}

/// Identity pass-through compressor: accepts any offer, `compress`/
/// `decompress` copy bytes verbatim. Lets the negotiator, the RSV1
/// interleaving logic, and the processor's payload pipeline be exercised
/// end-to-end without depending on a concrete DEFLATE implementation, which
/// spec.md §1 places out of the core's scope.
#[derive(Debug, Default)]
pub struct NullCompressor {
    enabled: bool,
}

impl NullCompressor {
    pub fn new(enabled: bool) -> Self {
        NullCompressor { enabled }
    }
}

impl PermessageCompress for NullCompressor {
    fn is_implemented(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn negotiate(&mut self, _params: &[(String, Option<String>)]) -> Result<String, WsErrorKind> {
        Ok(PERMESSAGE_COMPRESS.to_string())
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), WsError> {
        output.extend_from_slice(input);
        Ok(())
    }

    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), WsError> {
        output.extend_from_slice(input);
        Ok(())
    }
}

/// Negotiate extensions for one connection. Returns the aggregated
/// `Sec-WebSocket-Extensions` response value (absent if nothing was
/// accepted).
///
/// If extension support is globally disabled, returns `extensions_disabled`
/// *without* parsing the offer list (spec.md §4.5).
pub fn negotiate_extensions(
    offer_header: Option<&str>,
    extensions_enabled: bool,
    compressor: &mut dyn PermessageCompress,
) -> Result<Option<String>, WsError> {
    if !extensions_enabled {
        return Err(WsErrorKind::ExtensionsDisabled.into());
    }

    let offers = parse_extensions_header(offer_header.unwrap_or(""))?;
    let mut accepted = Vec::new();

    for offer in offers {
        if offer.name != PERMESSAGE_COMPRESS {
            continue;
        }
        if !compressor.is_implemented() || !compressor.is_enabled() {
            continue;
        }
        match compressor.negotiate(&offer.params) {
            Ok(fragment) => accepted.push(fragment),
            Err(_) => {
                // Soft failure: drop this offer, handshake still succeeds.
            }
        }
    }

    if accepted.is_empty() {
        Ok(None)
    } else {
        Ok(Some(accepted.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_extensions_short_circuit_without_parsing() {
        let mut compressor = NullCompressor::new(true);
        let err = negotiate_extensions(Some("garbage;;;"), false, &mut compressor).unwrap_err();
        assert_eq!(err.kind(), WsErrorKind::ExtensionsDisabled);
    }

    #[test]
    fn accepted_offer_is_aggregated() {
        let mut compressor = NullCompressor::new(true);
        let result =
            negotiate_extensions(Some("permessage-compress; client_max_window_bits"), true, &mut compressor)
                .unwrap();
        assert_eq!(result, Some("permessage-compress".to_string()));
    }

    #[test]
    fn unknown_extension_is_ignored() {
        let mut compressor = NullCompressor::new(true);
        let result = negotiate_extensions(Some("x-unknown-ext"), true, &mut compressor).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn disabled_compressor_drops_offer_without_error() {
        let mut compressor = NullCompressor::new(false);
        let result = negotiate_extensions(Some("permessage-compress"), true, &mut compressor).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn malformed_offer_is_parse_error() {
        let mut compressor = NullCompressor::new(true);
        let err = negotiate_extensions(Some("permessage-compress;;"), true, &mut compressor).unwrap_err();
        assert_eq!(err.kind(), WsErrorKind::ExtensionParseError);
    }

    #[test]
    fn parses_quoted_parameter_values() {
        let offers = parse_extensions_header(r#"permessage-compress; foo="bar baz""#).unwrap();
        assert_eq!(offers[0].params[0], ("foo".to_string(), Some("bar baz".to_string())));
    }
}

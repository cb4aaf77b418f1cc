/// Ambient configuration for the demo connection driver (spec.md places the
/// size-limit *policy* above the core; this is where a host sets it).
#[derive(Debug, Clone)]
pub struct Config {
    pub address: String,
    /// Whether the extension negotiator is consulted at all during the
    /// handshake (spec.md §4.5: disabled means `extensions_disabled` without
    /// even parsing the offer).
    pub extensions_enabled: bool,
    /// Mirrors the `strict_masking` Cargo feature (spec.md §6) so a host can
    /// report which masking path is active; the masking engine itself
    /// dispatches at compile time, not from this field.
    pub strict_masking: bool,
    /// Upper bound on a single reassembled message's total payload size,
    /// checked by the processor before each frame's payload is appended.
    pub max_message_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            extensions_enabled: true,
            strict_masking: cfg!(feature = "strict_masking"),
            max_message_size: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_permissive_but_bounded() {
        let config = Config::default();
        assert!(config.extensions_enabled);
        assert!(config.max_message_size > 0);
    }
}

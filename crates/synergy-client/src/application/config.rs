//! TOML-based configuration for the Synergy uinput client.
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format
//! designed to be easy to read and write. Example:
//!
//! ```toml
//! [server]
//! host = "192.168.1.10"
//! port = 24800
//! ```
//!
//! The `serde` library provides automatic serialisation/deserialisation
//! between Rust structs and TOML text via `#[derive(Serialize, Deserialize)]`.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file, so a
//! freshly written config only needs to specify the keys it wants to
//! override.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred reading the config file.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level client configuration, as loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub screen: ScreenConfig,
    #[serde(default)]
    pub mouse: MouseConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Synergy server endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Client identity advertised in the `HelloBack` handshake reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSection {
    #[serde(default = "default_client_name")]
    pub name: String,
}

/// The screen descriptor sent in the `DINF` reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u16,
    #[serde(default = "default_screen_height")]
    pub height: u16,
}

/// Pointer-handling behavior: absolute vs. relative injection, throttling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MouseConfig {
    /// When `true`, `DMMV` moves are injected via `move_abs`; otherwise the
    /// dispatcher derives relative deltas against its own anchor.
    #[serde(default)]
    pub absolute: bool,
    /// Minimum milliseconds between emitted absolute-mode moves; moves
    /// arriving faster are coalesced.
    #[serde(default = "default_move_threshold_ms")]
    pub move_threshold_ms: u64,
    /// Refresh `CursorContext::current()` every N relative-mode moves.
    #[serde(default = "default_pos_sync_freq")]
    pub pos_sync_freq: u32,
}

/// Transport selection: plain TCP, TLS, or mTLS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub mtls: bool,
    /// Skip peer certificate verification (trust-on-first-use). Logged at
    /// `warn` every time a session is established under this mode.
    #[serde(default)]
    pub trust_on_first_use: bool,
    #[serde(default)]
    pub pem_path: String,
}

fn default_port() -> u16 {
    24800
}
fn default_client_name() -> String {
    "synergy-uinput-client".to_string()
}
fn default_screen_width() -> u16 {
    1920
}
fn default_screen_height() -> u16 {
    1080
}
fn default_move_threshold_ms() -> u64 {
    8
}
fn default_pos_sync_freq() -> u32 {
    16
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            name: default_client_name(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            absolute: false,
            move_threshold_ms: default_move_threshold_ms(),
            pos_sync_freq: default_pos_sync_freq(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: false,
            mtls: false,
            trust_on_first_use: false,
            pem_path: String::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: default_port(),
            },
            client: ClientSection::default(),
            screen: ScreenConfig::default(),
            mouse: MouseConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Loads [`ClientConfig`] from `path`, falling back to [`ClientConfig::default`]
/// when the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: ClientConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_expected_port_and_threshold() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.server.port, 24800);
        assert_eq!(cfg.mouse.move_threshold_ms, 8);
        assert_eq!(cfg.mouse.pos_sync_freq, 16);
        assert!(!cfg.mouse.absolute);
        assert!(!cfg.transport.tls);
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = Path::new("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config(path).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_minimal_toml_fills_in_defaults() {
        let toml_str = r#"
[server]
host = "10.0.0.5"
"#;
        let cfg: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server.host, "10.0.0.5");
        assert_eq!(cfg.server.port, 24800);
        assert_eq!(cfg.screen.width, 1920);
        assert_eq!(cfg.client.name, "synergy-uinput-client");
    }

    #[test]
    fn test_full_toml_round_trips() {
        let mut cfg = ClientConfig::default();
        cfg.server.host = "192.168.1.10".to_string();
        cfg.screen.width = 2560;
        cfg.screen.height = 1440;
        cfg.mouse.absolute = true;
        cfg.transport.tls = true;
        cfg.transport.pem_path = "/etc/synergy/client.pem".to_string();

        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let restored: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let bad = "[[[ not valid toml";
        let result: Result<ClientConfig, toml::de::Error> = toml::from_str(bad);
        assert!(result.is_err());
    }

    #[test]
    fn test_mtls_without_trust_on_first_use_is_representable() {
        let toml_str = r#"
[server]
host = "10.0.0.5"
[transport]
mtls = true
pem_path = "/etc/synergy/client.pem"
"#;
        let cfg: ClientConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.transport.mtls);
        assert!(!cfg.transport.trust_on_first_use);
        assert_eq!(cfg.transport.pem_path, "/etc/synergy/client.pem");
    }
}

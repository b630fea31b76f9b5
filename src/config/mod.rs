//! Configuration module for socksd
//!
//! This module provides configuration types and parsing for the server.

mod server;
mod transport;

pub use server::{AuthConfig, Config, ServerConfig};
pub use transport::TcpConfig;

use crate::error::SocksdError;
use anyhow::{Context, Result};
use std::path::Path;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config = parse_config(&content)?;
    config.validate().map_err(SocksdError::Config)?;
    Ok(config)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::AuthMethod;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:1080");
        assert_eq!(config.server.auth.method, AuthMethod::None);
        assert!(config.server.tcp.nodelay);
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[server]
listen_addr = "0.0.0.0:1081"
debug = true
connect_timeout = 10

[server.auth]
method = "password"

[server.auth.users]
alice = "secret"
bob = "hunter2"

[server.tcp]
nodelay = false
keepalive_secs = 30
keepalive_interval = 10
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:1081");
        assert!(config.server.debug);
        assert_eq!(config.server.connect_timeout, Some(10));
        assert_eq!(config.server.auth.method, AuthMethod::Password);
        assert_eq!(config.server.auth.users.len(), 2);
        assert_eq!(config.server.auth.users["alice"], "secret");
        assert!(!config.server.tcp.nodelay);
        assert_eq!(config.server.tcp.keepalive_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_invalid_method() {
        let config_str = r#"
[server.auth]
method = "gssapi"
"#;
        assert!(parse_config(config_str).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten_addr = \"127.0.0.1:9050\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9050");
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server.auth]\nmethod = \"password\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("at least one user"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

//! Server configuration types
//!
//! Defines the main configuration structures for the socksd server.

use super::TcpConfig;
use crate::socks::{AuthMethod, Authenticator, Credentials};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Longest username or password RFC 1929 can carry
const MAX_CREDENTIAL_LEN: usize = 255;

/// Default listen address
fn default_listen_addr() -> String {
    "127.0.0.1:1080".to_string()
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()
    }
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the listener binds (e.g., "127.0.0.1:1080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Verbose console logging
    #[serde(default)]
    pub debug: bool,

    /// Upper bound in seconds for dialing a CONNECT target
    #[serde(default)]
    pub connect_timeout: Option<u64>,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// TCP socket options
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            debug: false,
            connect_timeout: None,
            auth: AuthConfig::default(),
            tcp: TcpConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.trim().is_empty() {
            return Err("listen_addr must not be empty".to_string());
        }
        self.auth.validate()
    }
}

/// Authentication configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Method required from clients
    #[serde(default)]
    pub method: AuthMethod,

    /// Username → password map for the password method
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl AuthConfig {
    /// Build the authenticator this configuration describes
    pub fn authenticator(&self) -> Authenticator {
        match self.method {
            AuthMethod::None => Authenticator::None,
            AuthMethod::Password => {
                Authenticator::user_password(Credentials::new(self.users.clone()))
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.method == AuthMethod::Password && self.users.is_empty() {
            return Err("Password authentication requires at least one user".to_string());
        }

        for (username, password) in &self.users {
            if username.is_empty() || username.len() > MAX_CREDENTIAL_LEN {
                return Err(format!(
                    "Username {:?} must be 1-{} bytes",
                    username, MAX_CREDENTIAL_LEN
                ));
            }
            if password.is_empty() || password.len() > MAX_CREDENTIAL_LEN {
                return Err(format!(
                    "Password for user {:?} must be 1-{} bytes",
                    username, MAX_CREDENTIAL_LEN
                ));
            }
        }

        Ok(())
    }
}

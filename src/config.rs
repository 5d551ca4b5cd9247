use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::auth::{Authenticator, FixedCredentials, ShadowFile};

/// Top-level configuration.
///
/// Read from an optional YAML file named by `MICROSERVE_CONFIG`, with
/// `MICROSERVE_LISTEN` and `MICROSERVE_ROOT` overriding the server
/// section. Everything has a default, so the server runs with no
/// configuration at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: String,
    /// Directory served to clients.
    pub root: PathBuf,
    /// Deadline in seconds for each receive call, so a stalled client
    /// cannot hold its connection task forever.
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8081".to_string(),
            root: PathBuf::from("."),
            read_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Which credential backend gates PUT and DELETE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Fixed,
    Shadow,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub backend: BackendKind,
    /// Credentials for the `fixed` backend; both must be set to replace
    /// the built-in pair.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Shadow file for the `shadow` backend; defaults to the system one.
    pub shadow_path: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Fixed,
            username: None,
            password: None,
            shadow_path: None,
        }
    }
}

impl AuthConfig {
    /// Builds the credential backend this section describes.
    pub fn build(&self) -> Arc<dyn Authenticator> {
        match self.backend {
            BackendKind::Fixed => match (&self.username, &self.password) {
                (Some(username), Some(password)) => {
                    Arc::new(FixedCredentials::new(username.clone(), password.clone()))
                }
                _ => Arc::new(FixedCredentials::default()),
            },
            BackendKind::Shadow => match &self.shadow_path {
                Some(path) => Arc::new(ShadowFile::new(path.clone())),
                None => Arc::new(ShadowFile::system()),
            },
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var("MICROSERVE_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_yaml(&text)
                    .with_context(|| format!("parsing config file {path}"))?
            }
            Err(_) => Config::default(),
        };

        if let Ok(listen) = std::env::var("MICROSERVE_LISTEN") {
            cfg.server.listen_addr = listen;
        }
        if let Ok(root) = std::env::var("MICROSERVE_ROOT") {
            cfg.server.root = PathBuf::from(root);
        }

        Ok(cfg)
    }

    /// Parses a YAML document. Missing sections fall back to defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing configuration")
    }
}

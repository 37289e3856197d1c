//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.consultdesk.toml` files.

use crate::cli::{Args, Command};
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".consultdesk.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backing store settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path for reports.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "relatorio_executivo.md".to_string()
}

/// Backing store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the REST gateway and auth service.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Public (anon) key, used for row operations when no service key is set.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Service-role key. Required for account provisioning.
    #[serde(default)]
    pub service_role_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: None,
            service_role_key: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allowed CORS origin; `*` allows any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_cors_origin() -> String {
    "*".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output format.
    #[serde(default)]
    pub format: ReportFormat,

    /// Strip shadow and border classes from the HTML export.
    #[serde(default = "default_true")]
    pub flatten_decorations: bool,

    /// Color used in place of CSS color functions that cannot be converted.
    #[serde(default = "default_color_fallback")]
    pub color_fallback: String,

    /// Name printed in the report header and footer.
    #[serde(default = "default_consultancy")]
    pub consultancy: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            flatten_decorations: true,
            color_fallback: default_color_fallback(),
            consultancy: default_consultancy(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_color_fallback() -> String {
    "rgb(0, 0, 0)".to_string()
}

fn default_consultancy() -> String {
    "Gestão de Pessoas 360°".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their environment variables) take precedence over
    /// config file settings, but only when they carry a value.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.url = url.clone();
        }
        if let Some(ref key) = args.anon_key {
            self.backend.anon_key = Some(key.clone());
        }
        if let Some(ref key) = args.service_role_key {
            self.backend.service_role_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }

        match args.command {
            Command::Serve {
                ref bind,
                ref cors_origin,
            } => {
                if let Some(bind) = bind {
                    self.server.bind = bind.clone();
                }
                if let Some(origin) = cors_origin {
                    self.server.cors_origin = origin.clone();
                }
            }
            Command::Report {
                format: Some(format),
                ..
            } => {
                self.report.format = format;
            }
            _ => {}
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

//! Configuration module for the voice-clone gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Example
//! ```rust,no_run
//! use voiceclone_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::path::PathBuf;

use crate::utils::url_validation::validate_endpoint_url;

mod yaml;

/// Default inbound multipart body cap: 64 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port, TLS)
/// - Vendor endpoint URLs and credentials (bearer key, group identifier)
/// - Outbound call behavior (optional timeout, upload size cap)
/// - Security settings (CORS, rate limiting)
///
/// All values are read once at startup and immutable thereafter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Vendor endpoints
    /// Vendor file-upload endpoint URL
    pub upload_endpoint: String,
    /// Vendor voice-clone endpoint URL
    pub clone_endpoint: String,

    // Vendor credentials (held server-side only, never exposed to clients)
    /// Bearer credential attached to every vendor call
    pub api_key: String,
    /// Tenant-scoping group identifier attached as a query parameter
    pub group_id: String,

    // Outbound call behavior
    /// Optional timeout for outbound vendor calls, in seconds.
    /// `None` means no timeout is enforced (wait indefinitely, matching the
    /// behavior the upstream web app had). Setting a value is the recommended
    /// hardening for production deployments.
    pub vendor_timeout_seconds: Option<u64>,
    /// Maximum accepted inbound multipart body size, in bytes
    pub max_upload_bytes: usize,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

/// Zeroize the vendor credential when ServerConfig is dropped so the secret
/// does not linger in freed memory.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.api_key.zeroize();
    }
}

/// Intermediate configuration gathered from the environment before YAML
/// overrides are applied. Required fields stay optional until finalization.
#[derive(Debug, Default)]
struct PartialConfig {
    host: Option<String>,
    port: Option<u16>,
    tls_cert_path: Option<PathBuf>,
    tls_key_path: Option<PathBuf>,
    upload_endpoint: Option<String>,
    clone_endpoint: Option<String>,
    api_key: Option<String>,
    group_id: Option<String>,
    vendor_timeout_seconds: Option<u64>,
    max_upload_bytes: Option<usize>,
    cors_allowed_origins: Option<String>,
    rate_limit_requests_per_second: Option<u32>,
    rate_limit_burst_size: Option<u32>,
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {}: {}", name, e).into()),
        None => Ok(None),
    }
}

impl PartialConfig {
    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: env_var("HOST"),
            port: parse_env("PORT")?,
            tls_cert_path: env_var("TLS_CERT_PATH").map(PathBuf::from),
            tls_key_path: env_var("TLS_KEY_PATH").map(PathBuf::from),
            upload_endpoint: env_var("UPLOAD_API_ENDPOINT"),
            clone_endpoint: env_var("CLONE_API_ENDPOINT"),
            api_key: env_var("API_KEY"),
            group_id: env_var("GROUP_ID"),
            vendor_timeout_seconds: parse_env("VENDOR_TIMEOUT_SECONDS")?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES")?,
            cors_allowed_origins: env_var("CORS_ALLOWED_ORIGINS"),
            rate_limit_requests_per_second: parse_env("RATE_LIMIT_RPS")?,
            rate_limit_burst_size: parse_env("RATE_LIMIT_BURST")?,
        })
    }

    /// Apply YAML overrides on top of the environment base.
    fn apply_yaml(&mut self, yaml: yaml::YamlConfig) {
        if let Some(server) = yaml.server {
            if server.host.is_some() {
                self.host = server.host;
            }
            if server.port.is_some() {
                self.port = server.port;
            }
            if server.tls_cert_path.is_some() {
                self.tls_cert_path = server.tls_cert_path;
            }
            if server.tls_key_path.is_some() {
                self.tls_key_path = server.tls_key_path;
            }
        }
        if let Some(vendor) = yaml.vendor {
            if vendor.upload_endpoint.is_some() {
                self.upload_endpoint = vendor.upload_endpoint;
            }
            if vendor.clone_endpoint.is_some() {
                self.clone_endpoint = vendor.clone_endpoint;
            }
            if vendor.api_key.is_some() {
                self.api_key = vendor.api_key;
            }
            if vendor.group_id.is_some() {
                self.group_id = vendor.group_id;
            }
            if vendor.timeout_seconds.is_some() {
                self.vendor_timeout_seconds = vendor.timeout_seconds;
            }
            if vendor.max_upload_bytes.is_some() {
                self.max_upload_bytes = vendor.max_upload_bytes;
            }
        }
        if let Some(security) = yaml.security {
            if security.cors_allowed_origins.is_some() {
                self.cors_allowed_origins = security.cors_allowed_origins;
            }
            if security.rate_limit_requests_per_second.is_some() {
                self.rate_limit_requests_per_second = security.rate_limit_requests_per_second;
            }
            if security.rate_limit_burst_size.is_some() {
                self.rate_limit_burst_size = security.rate_limit_burst_size;
            }
        }
    }

    fn finalize(self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        let tls = match (self.tls_cert_path, self.tls_key_path) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path,
                key_path,
            }),
            (None, None) => None,
            _ => {
                return Err(
                    "TLS requires both TLS_CERT_PATH and TLS_KEY_PATH to be set".into(),
                );
            }
        };

        let config = ServerConfig {
            host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: self.port.unwrap_or(3000),
            tls,
            upload_endpoint: self
                .upload_endpoint
                .ok_or("UPLOAD_API_ENDPOINT is not configured")?,
            clone_endpoint: self
                .clone_endpoint
                .ok_or("CLONE_API_ENDPOINT is not configured")?,
            api_key: self.api_key.ok_or("API_KEY is not configured")?,
            group_id: self.group_id.ok_or("GROUP_ID is not configured")?,
            vendor_timeout_seconds: self.vendor_timeout_seconds,
            max_upload_bytes: self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_allowed_origins: self.cors_allowed_origins,
            rate_limit_requests_per_second: self.rate_limit_requests_per_second.unwrap_or(60),
            rate_limit_burst_size: self.rate_limit_burst_size.unwrap_or(10),
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and a previously loaded
    /// .env file).
    ///
    /// # Errors
    /// Returns an error if a required value is missing, a numeric value does
    /// not parse, or a vendor endpoint URL is invalid.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        PartialConfig::from_env()?.finalize()
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// Note: the .env file is loaded in main.rs at application startup.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let mut partial = PartialConfig::from_env()?;
        partial.apply_yaml(yaml_config);
        partial.finalize()
    }

    /// Get the server address as a string in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Validate the final configuration.
    ///
    /// Both vendor endpoint URLs must parse and use an http(s) scheme.
    /// Credentials must be non-empty.
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validate_endpoint_url(&self.upload_endpoint)
            .map_err(|e| format!("Invalid UPLOAD_API_ENDPOINT: {}", e))?;
        validate_endpoint_url(&self.clone_endpoint)
            .map_err(|e| format!("Invalid CLONE_API_ENDPOINT: {}", e))?;
        if self.api_key.trim().is_empty() {
            return Err("API_KEY must not be empty".into());
        }
        if self.group_id.trim().is_empty() {
            return Err("GROUP_ID must not be empty".into());
        }
        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "UPLOAD_API_ENDPOINT",
        "CLONE_API_ENDPOINT",
        "API_KEY",
        "GROUP_ID",
        "VENDOR_TIMEOUT_SECONDS",
        "MAX_UPLOAD_BYTES",
        "CORS_ALLOWED_ORIGINS",
        "RATE_LIMIT_RPS",
        "RATE_LIMIT_BURST",
    ];

    fn cleanup_env_vars() {
        for var in ENV_VARS {
            unsafe { env::remove_var(var) };
        }
    }

    fn set_required_env_vars() {
        unsafe {
            env::set_var("UPLOAD_API_ENDPOINT", "https://api.example.com/v1/files/upload");
            env::set_var("CLONE_API_ENDPOINT", "https://api.example.com/v1/voice_clone");
            env::set_var("API_KEY", "test-api-key");
            env::set_var("GROUP_ID", "group-123");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();
        set_required_env_vars();

        let config = ServerConfig::from_env().expect("config should load");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert!(!config.is_tls_enabled());
        assert_eq!(config.vendor_timeout_seconds, None);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.rate_limit_requests_per_second, 60);
        assert_eq!(config.rate_limit_burst_size, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_api_key() {
        cleanup_env_vars();
        set_required_env_vars();
        unsafe { env::remove_var("API_KEY") };

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API_KEY"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_endpoint() {
        cleanup_env_vars();
        set_required_env_vars();
        unsafe { env::set_var("UPLOAD_API_ENDPOINT", "not-a-url") };

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("UPLOAD_API_ENDPOINT")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        set_required_env_vars();
        unsafe { env::set_var("PORT", "not-a-number") };

        let result = ServerConfig::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_tls_requires_both_paths() {
        cleanup_env_vars();
        set_required_env_vars();
        unsafe { env::set_var("TLS_CERT_PATH", "/tmp/cert.pem") };

        let result = ServerConfig::from_env();
        assert!(result.is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();
        set_required_env_vars();
        unsafe { env::set_var("PORT", "3000") };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 8443
vendor:
  group_id: "group-from-yaml"
  timeout_seconds: 30
security:
  cors_allowed_origins: "*"
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(&file.path().to_path_buf()).expect("config");
        assert_eq!(config.port, 8443);
        assert_eq!(config.group_id, "group-from-yaml");
        assert_eq!(config.vendor_timeout_seconds, Some(30));
        assert_eq!(config.cors_allowed_origins.as_deref(), Some("*"));
        // Env values not overridden by YAML survive
        assert_eq!(config.api_key, "test-api-key");

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();
        set_required_env_vars();

        let result = ServerConfig::from_file(&PathBuf::from("/nonexistent/config.yaml"));
        assert!(result.is_err());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_yaml() {
        cleanup_env_vars();
        set_required_env_vars();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server: [not: valid").unwrap();

        let result = ServerConfig::from_file(&file.path().to_path_buf());
        assert!(result.is_err());

        cleanup_env_vars();
    }
}

//! YAML configuration file loading
//!
//! All fields are optional; any value present overrides the corresponding
//! environment-derived value.
//!
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 8443
//!   tls_cert_path: "/etc/ssl/gateway.pem"
//!   tls_key_path: "/etc/ssl/gateway.key"
//! vendor:
//!   upload_endpoint: "https://api.example.com/v1/files/upload"
//!   clone_endpoint: "https://api.example.com/v1/voice_clone"
//!   api_key: "sk-..."
//!   group_id: "1782..."
//!   timeout_seconds: 30
//! security:
//!   cors_allowed_origins: "*"
//!   rate_limit_requests_per_second: 60
//!   rate_limit_burst_size: 10
//! ```

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct YamlConfig {
    pub server: Option<ServerSection>,
    pub vendor: Option<VendorSection>,
    pub security: Option<SecuritySection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VendorSection {
    pub upload_endpoint: Option<String>,
    pub clone_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub group_id: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SecuritySection {
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;
        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }
}

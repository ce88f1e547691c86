//! Endpoint URL validation
//!
//! The vendor endpoint URLs are operator-supplied configuration; validating
//! them at startup turns a typo into an immediate load error instead of a
//! failed request at the first upload.

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during endpoint URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),
}

/// Validates a vendor endpoint URL from configuration.
///
/// The URL must parse and use an `http` or `https` scheme; for those schemes
/// the parser already guarantees a host is present. Plain `http` is accepted
/// for local development against a mock vendor but logged as a warning.
pub fn validate_endpoint_url(url: &str) -> Result<(), UrlValidationError> {
    let parsed = Url::parse(url)?;

    match parsed.scheme() {
        "https" => {}
        "http" => {
            warn!(url = %url, "endpoint URL uses plain http; credentials will be sent unencrypted");
        }
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        assert!(validate_endpoint_url("https://api.example.com/v1/files/upload").is_ok());
    }

    #[test]
    fn test_http_allowed_for_development() {
        assert!(validate_endpoint_url("http://127.0.0.1:8080/upload").is_ok());
    }

    #[test]
    fn test_invalid_format() {
        assert!(matches!(
            validate_endpoint_url("not-a-url"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(matches!(
            validate_endpoint_url("ftp://example.com/upload"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_non_http_path_only_url_rejected() {
        assert!(matches!(
            validate_endpoint_url("unix:/var/run/vendor.sock"),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_empty_host_rejected_at_parse() {
        assert!(matches!(
            validate_endpoint_url("http://"),
            Err(UrlValidationError::InvalidFormat(_))
        ));
    }
}

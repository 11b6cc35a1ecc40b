//! Error types for the Rankwise core library.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering catalog resolution, the leak probe, and configuration.
//!
//! Empty or missing data inside the derivation layer is not an error: those
//! functions return empty collections, `None`, or a placeholder string. The
//! variants here are for construction-time validation and for the explicit
//! resolution step that runs before a page is built.

use std::path::PathBuf;

/// Top-level error type for the Rankwise core library.
#[derive(Debug, thiserror::Error)]
pub enum RankwiseError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from catalog construction and slug resolution.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Vertical not found: {slug}")]
    VerticalNotFound { slug: String },

    #[error("Product '{slug}' not found in vertical '{vertical}'")]
    ProductNotFound { vertical: String, slug: String },

    #[error("No comparison matches '{segment}'")]
    ComparisonNotFound { segment: String },

    #[error("Duplicate vertical slug: {slug}")]
    DuplicateVertical { slug: String },

    #[error("Duplicate product id: {id}")]
    DuplicateProductId { id: u64 },

    #[error("Duplicate product slug '{slug}' in vertical '{vertical}'")]
    DuplicateProductSlug { vertical: String, slug: String },

    #[error("Product '{slug}' has rating {rating} outside 0-10")]
    InvalidRating { slug: String, rating: f64 },

    #[error("Product '{slug}' plan '{plan}' has invalid price {price}")]
    InvalidPrice { slug: String, plan: String, price: f64 },

    #[error("Product '{product}' references unknown vertical '{vertical}'")]
    UnknownVertical { product: String, vertical: String },

    #[error("Catalog parse error: {message}")]
    Parse { message: String },

    #[error("Unsupported catalog format: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors from the WebRTC leak probe and its network collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("WebRTC is not available in this environment")]
    WebRtcUnsupported,

    #[error("ICE gathering failed: {message}")]
    Gathering { message: String },

    #[error("IP lookup failed: {message}")]
    NetworkFailure { message: String },

    #[error("{what} timed out after {timeout_ms}ms")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Invalid endpoint: {url}")]
    InvalidEndpoint { url: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `RankwiseError`.
pub type Result<T> = std::result::Result<T, RankwiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_catalog() {
        let err = RankwiseError::Catalog(CatalogError::ProductNotFound {
            vertical: "vpn".into(),
            slug: "nordvpn".into(),
        });
        assert_eq!(
            err.to_string(),
            "Catalog error: Product 'nordvpn' not found in vertical 'vpn'"
        );
    }

    #[test]
    fn test_error_display_probe_timeout() {
        let err = RankwiseError::Probe(ProbeError::Timeout {
            what: "IP lookup".into(),
            timeout_ms: 5000,
        });
        assert_eq!(
            err.to_string(),
            "Probe error: IP lookup timed out after 5000ms"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: RankwiseError = io_err.into();
        assert!(matches!(err, RankwiseError::Io(_)));
    }

    #[test]
    fn test_error_display_invalid_rating() {
        let err = CatalogError::InvalidRating {
            slug: "acme".into(),
            rating: 11.5,
        };
        assert_eq!(err.to_string(), "Product 'acme' has rating 11.5 outside 0-10");
    }
}

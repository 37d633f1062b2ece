//! # Common Types and Utilities
//!
//! This module provides the error handling infrastructure and the constants
//! shared by the metadata, selection and evaluation layers.

/// Key under which metadata documents store their certificate descriptors.
pub const KEY_DESCRIPTOR: &str = "KeyDescriptor";
/// Role token requesting every certificate in the descriptor collection.
pub const ROLE_ALL: &str = "all";
/// Role assigned to descriptors without a `use` attribute.
pub const ROLE_UNKNOWN: &str = "unknown";
/// Attribute key holding the descriptor role.
pub const USE_ATTRIBUTE: &str = "@use";
/// Key holding the text of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";
/// Opening PEM armor line of a certificate.
pub const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
/// Closing PEM armor line of a certificate.
pub const PEM_FOOTER: &str = "-----END CERTIFICATE-----";
/// Log file used when none is given on the command line.
pub const DEFAULT_LOG_FILE: &str = "saml-cert-expiry.log";

pub type MetadataResult<R> = Result<R, MetadataError>;

/// Represents errors that can occur while inspecting metadata certificates
///
/// Every variant carries the message of the failure that caused it, so the
/// original context survives each layer it is propagated through.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MetadataError {
    #[error("No {0} collection found in the metadata")]
    LookupFailure(String),
    #[error("No X509 certificate of type: {0} found")]
    RoleNotFound(String),
    #[error("Descriptor of type {role} carries no X509 certificate")]
    MissingCertificate { role: String },
    #[error("Unable to decode certificate: {0}")]
    DecodeFailure(String),
    #[error("Metadata parse error: {0}")]
    Parse(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("IO error: {0}")]
    IO(String),
    #[error("Logger configuration error: {0}")]
    Logging(String),
}

impl From<reqwest::Error> for MetadataError {
    fn from(e: reqwest::Error) -> Self {
        MetadataError::Http(e.to_string())
    }
}

impl From<std::io::Error> for MetadataError {
    fn from(e: std::io::Error) -> Self {
        MetadataError::IO(format!("{:?}", e))
    }
}

impl From<roxmltree::Error> for MetadataError {
    fn from(e: roxmltree::Error) -> Self {
        MetadataError::Parse(e.to_string())
    }
}

impl From<log::SetLoggerError> for MetadataError {
    fn from(e: log::SetLoggerError) -> Self {
        MetadataError::Logging(e.to_string())
    }
}

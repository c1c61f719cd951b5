//! use cert_cosign::error::CosignError;

use thiserror::Error;

/// Represents errors that can occur while extracting keys or issuing certificates.
///
/// The first three variants are the ones surfaced to a request boundary:
/// key loading, candidate parsing and extension declaration problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CosignError {
    /// The private or public key could not be read, or its passphrase is wrong.
    #[error("Unable to read the key: {0}")]
    KeyLoadFailure(String),

    /// The candidate certificate could not be parsed.
    #[error("Unable to sign the CSR: {0}")]
    CertificateParseFailure(String),

    /// An extension declaration is malformed.
    #[error("Invalid extension declaration: {0}")]
    DeclarationError(String),

    /// An extension value has no declared or well-known shape.
    #[error("No extension declaration registered for {0}")]
    UnregisteredExtension(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The issuer key refused to sign.
    #[error("Signing failed: {0}")]
    SigningError(String),
}

pub type Result<T, E = CosignError> = std::result::Result<T, E>;

impl From<der::Error> for CosignError {
    /// Converts a `der::Error` into a `CosignError`.
    fn from(err: der::Error) -> Self {
        CosignError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CosignError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CosignError::EncodingError(err.to_string())
    }
}

impl From<serde_json::Error> for CosignError {
    fn from(err: serde_json::Error) -> Self {
        CosignError::InvalidInput(err.to_string())
    }
}

impl From<pkcs8::Error> for CosignError {
    fn from(err: pkcs8::Error) -> Self {
        CosignError::KeyLoadFailure(err.to_string())
    }
}

impl From<rsa::Error> for CosignError {
    fn from(err: rsa::Error) -> Self {
        CosignError::KeyLoadFailure(err.to_string())
    }
}

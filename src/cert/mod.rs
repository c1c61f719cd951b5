pub mod extensions;
pub mod params;
pub mod registry;
pub mod value;

use der::{Decode, DecodePem, Encode, EncodePem};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::{CosignError, Result};
use crate::pem_utils::looks_like_pem;
use crate::template::CertificateTemplate;

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// ECDSA over P-256 with SHA-256.
    Sha256WithECDSA,
    /// ECDSA over P-384 with SHA-384.
    Sha384WithECDSA,
    /// ECDSA over P-521 with SHA-512.
    Sha512WithECDSA,
    /// Ed25519 (the hash is part of the scheme).
    Ed25519,
    /// DSA with SHA-256.
    DsaWithSha256,
}

const DSA_WITH_SHA_256: const_oid::ObjectIdentifier =
    const_oid::ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.3.2");

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RSA carries an explicit NULL parameter, the other algorithms none.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::asn1::Any::null()),
            },
            SignatureAlgorithm::Sha256WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Sha384WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
                parameters: None,
            },
            SignatureAlgorithm::Sha512WithECDSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
            SignatureAlgorithm::DsaWithSha256 => AlgorithmIdentifierOwned {
                oid: DSA_WITH_SHA_256,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Parses a certificate from PEM or DER bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let inner = if looks_like_pem(bytes) {
            x509_cert::Certificate::from_pem(bytes)
        } else {
            x509_cert::Certificate::from_der(bytes)
        }
        .map_err(|e| CosignError::DecodingError(format!("invalid certificate: {e}")))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CosignError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CosignError::EncodingError(e.to_string()))
    }

    /// Extracts the logical content of the certificate.
    pub fn to_template(&self) -> CertificateTemplate {
        CertificateTemplate::from_tbs_certificate(&self.inner.tbs_certificate)
    }
}

//! Elliptic-curve issuer keys: ECDSA over the NIST curves and Ed25519.
//!
//! ECDSA signatures are emitted DER encoded, as X.509 requires. The digest
//! follows the curve size (SHA-256 for P-256, SHA-384 for P-384, SHA-512 for
//! P-521).
use const_oid::ObjectIdentifier;
use pkcs8::DecodePrivateKey;
use signature::Signer;

use super::algorithm::{AlgorithmTag, KeyAlgorithm, SECP256R1, SECP384R1, SECP521R1};
use super::{IssuerKey, PublicKey};
use crate::cert::SignatureAlgorithm;
use crate::error::{CosignError, Result};

#[derive(Debug, Clone)]
pub enum EcKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
    Ed25519(ed25519_dalek::SigningKey),
}

fn load_error(curve: &str, e: impl std::fmt::Display) -> CosignError {
    CosignError::KeyLoadFailure(format!("invalid {curve} private key: {e}"))
}

fn sign_error(e: signature::Error) -> CosignError {
    CosignError::SigningError(e.to_string())
}

impl EcKey {
    /// Loads a PKCS#8 `id-ecPublicKey` key for the given named curve.
    pub fn from_pkcs8_der(der: &[u8], curve: ObjectIdentifier) -> Result<Self> {
        match curve {
            SECP256R1 => p256::SecretKey::from_pkcs8_der(der)
                .map(EcKey::P256)
                .map_err(|e| load_error("P-256", e)),
            SECP384R1 => p384::SecretKey::from_pkcs8_der(der)
                .map(EcKey::P384)
                .map_err(|e| load_error("P-384", e)),
            SECP521R1 => p521::SecretKey::from_pkcs8_der(der)
                .map(EcKey::P521)
                .map_err(|e| load_error("P-521", e)),
            other => Err(CosignError::KeyLoadFailure(format!(
                "unsupported elliptic curve {other}"
            ))),
        }
    }

    pub fn ed25519_from_pkcs8_der(der: &[u8]) -> Result<Self> {
        ed25519_dalek::SigningKey::from_pkcs8_der(der)
            .map(EcKey::Ed25519)
            .map_err(|e| load_error("Ed25519", e))
    }

    /// Loads a SEC1 `ECPrivateKey`, trying each supported curve in turn.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
            return Ok(EcKey::P256(key));
        }
        if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
            return Ok(EcKey::P384(key));
        }
        p521::SecretKey::from_sec1_der(der)
            .map(EcKey::P521)
            .map_err(|e| load_error("SEC1", e))
    }
}

impl KeyAlgorithm for EcKey {
    fn algorithm_tag(&self) -> AlgorithmTag {
        AlgorithmTag::Ec
    }
}

impl IssuerKey for EcKey {
    fn public_key(&self) -> PublicKey {
        match self {
            EcKey::P256(secret) => PublicKey::EcdsaP256(secret.public_key()),
            EcKey::P384(secret) => PublicKey::EcdsaP384(secret.public_key()),
            EcKey::P521(secret) => PublicKey::EcdsaP521(secret.public_key()),
            EcKey::Ed25519(signing_key) => PublicKey::Ed25519(signing_key.verifying_key()),
        }
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            EcKey::P256(_) => SignatureAlgorithm::Sha256WithECDSA,
            EcKey::P384(_) => SignatureAlgorithm::Sha384WithECDSA,
            EcKey::P521(_) => SignatureAlgorithm::Sha512WithECDSA,
            EcKey::Ed25519(_) => SignatureAlgorithm::Ed25519,
        }
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            EcKey::P256(secret) => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(sign_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            EcKey::P384(secret) => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(sign_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            EcKey::P521(secret) => {
                let signing_key =
                    p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes()).map_err(sign_error)?;
                let signature: p521::ecdsa::Signature =
                    signing_key.try_sign(data).map_err(sign_error)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            EcKey::Ed25519(signing_key) => {
                let signature = signing_key.try_sign(data).map_err(sign_error)?;
                Ok(signature.to_bytes().to_vec())
            }
        }
    }
}

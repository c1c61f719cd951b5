use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::RsaPublicKey;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};
use ssh_key::Mpint;
use ssh_key::public::{DsaPublicKey, EcdsaPublicKey, Ed25519PublicKey, KeyData};
use tracing::warn;
use x509_cert::spki::{DecodePublicKey, EncodePublicKey, SubjectPublicKeyInfoOwned};

use super::algorithm::{
    AlgorithmTag, DSA, EC_PUBLIC_KEY, ED25519, KeyAlgorithm, RSA_ENCRYPTION, SECP256R1,
    SECP384R1, SECP521R1,
};
use crate::error::{CosignError, Result};
use crate::pem_utils::{der_to_pem, looks_like_pem, parse_pem};

/// A subject or issuer public key.
///
/// Keys of a family this crate cannot sign with (DH, Ed448, ...) are carried
/// as their raw SubjectPublicKeyInfo so they can still be certified.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
    Dsa(dsa::VerifyingKey),
    Other(SubjectPublicKeyInfoOwned),
}

/// Output encodings for [`PublicKey::encode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicKeyFormat {
    /// PEM `PUBLIC KEY` (SubjectPublicKeyInfo).
    #[default]
    Spki,
    /// PEM `RSA PUBLIC KEY`, RSA keys only.
    Pkcs1,
    /// Base64 of the DER SubjectPublicKeyInfo.
    Der,
    /// An OpenSSH `authorized_keys` line.
    #[serde(alias = "ssh")]
    OpenSsh,
}

impl fmt::Display for PublicKeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicKeyFormat::Spki => write!(f, "spki"),
            PublicKeyFormat::Pkcs1 => write!(f, "pkcs1"),
            PublicKeyFormat::Der => write!(f, "der"),
            PublicKeyFormat::OpenSsh => write!(f, "openssh"),
        }
    }
}

impl FromStr for PublicKeyFormat {
    type Err = CosignError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spki" | "pem" => Ok(PublicKeyFormat::Spki),
            "pkcs1" => Ok(PublicKeyFormat::Pkcs1),
            "der" => Ok(PublicKeyFormat::Der),
            "openssh" | "ssh" => Ok(PublicKeyFormat::OpenSsh),
            _ => Err(CosignError::InvalidInput(format!(
                "unsupported public key format \"{s}\""
            ))),
        }
    }
}

fn load_error(e: impl fmt::Display) -> CosignError {
    CosignError::KeyLoadFailure(format!("invalid public key: {e}"))
}

fn ssh_error(e: impl fmt::Display) -> CosignError {
    CosignError::EncodingError(format!("OpenSSH encoding failed: {e}"))
}

fn mpint(bytes: &[u8]) -> Result<Mpint> {
    Mpint::from_positive_bytes(bytes).map_err(ssh_error)
}

/// The named curve of an `id-ecPublicKey` algorithm identifier.
fn named_curve(algorithm: &x509_cert::spki::AlgorithmIdentifierOwned) -> Option<ObjectIdentifier> {
    algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.decode_as::<ObjectIdentifier>().ok())
}

impl PublicKey {
    /// Creates a `PublicKey` from an X.509 SubjectPublicKeyInfo.
    ///
    /// Algorithms this crate knows are decoded into typed keys (which also
    /// validates them); anything else is kept opaque.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let key = match spki.algorithm.oid {
            RSA_ENCRYPTION => {
                PublicKey::Rsa(RsaPublicKey::from_public_key_der(&der).map_err(load_error)?)
            }
            EC_PUBLIC_KEY => match named_curve(&spki.algorithm) {
                Some(SECP256R1) => PublicKey::EcdsaP256(
                    p256::PublicKey::from_public_key_der(&der).map_err(load_error)?,
                ),
                Some(SECP384R1) => PublicKey::EcdsaP384(
                    p384::PublicKey::from_public_key_der(&der).map_err(load_error)?,
                ),
                Some(SECP521R1) => PublicKey::EcdsaP521(
                    p521::PublicKey::from_public_key_der(&der).map_err(load_error)?,
                ),
                _ => PublicKey::Other(spki.clone()),
            },
            ED25519 => PublicKey::Ed25519(
                ed25519_dalek::VerifyingKey::from_public_key_der(&der).map_err(load_error)?,
            ),
            DSA => {
                PublicKey::Dsa(dsa::VerifyingKey::from_public_key_der(&der).map_err(load_error)?)
            }
            _ => PublicKey::Other(spki.clone()),
        };
        Ok(key)
    }

    /// Parses a caller-supplied public key.
    ///
    /// Accepts PEM `PUBLIC KEY` / `RSA PUBLIC KEY` blocks or the same
    /// structures as raw DER. The `mode` only decides which DER structure is
    /// tried first; the parsed key's own algorithm always wins.
    pub fn from_encoded(bytes: &[u8], mode: Option<AlgorithmTag>) -> Result<Self> {
        let key = if looks_like_pem(bytes) {
            let block = parse_pem(bytes).map_err(load_error)?;
            match block.tag() {
                "PUBLIC KEY" => Self::from_spki_der(block.contents())?,
                "RSA PUBLIC KEY" => Self::from_pkcs1_der(block.contents())?,
                label => {
                    return Err(CosignError::KeyLoadFailure(format!(
                        "unsupported public key PEM label \"{label}\""
                    )));
                }
            }
        } else if mode == Some(AlgorithmTag::Rsa) {
            Self::from_pkcs1_der(bytes).or_else(|_| Self::from_spki_der(bytes))?
        } else {
            Self::from_spki_der(bytes).or_else(|_| Self::from_pkcs1_der(bytes))?
        };

        if let Some(mode) = mode {
            let actual = key.algorithm_tag();
            if mode != actual {
                warn!(
                    key.mode = %mode,
                    key.algorithm = %actual,
                    "client public key does not match the requested mode, using the key's own algorithm"
                );
            }
        }
        Ok(key)
    }

    fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der).map_err(load_error)?;
        Self::from_x509spki(&spki)
    }

    fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        RsaPublicKey::from_pkcs1_der(der)
            .map(PublicKey::Rsa)
            .map_err(load_error)
    }

    /// Returns the X.509 SubjectPublicKeyInfo for this key.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let document = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP256(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP384(key) => key.to_public_key_der()?,
            PublicKey::EcdsaP521(key) => key.to_public_key_der()?,
            PublicKey::Ed25519(key) => key.to_public_key_der()?,
            PublicKey::Dsa(key) => key.to_public_key_der()?,
            PublicKey::Other(spki) => return Ok(spki.clone()),
        };
        Ok(SubjectPublicKeyInfoOwned::from_der(document.as_bytes())?)
    }

    /// Serializes the key in the requested format.
    pub fn encode(&self, format: PublicKeyFormat) -> Result<String> {
        match format {
            PublicKeyFormat::Spki => Ok(der_to_pem(&self.as_spki()?.to_der()?, "PUBLIC KEY")),
            PublicKeyFormat::Der => Ok(STANDARD.encode(self.as_spki()?.to_der()?)),
            PublicKeyFormat::Pkcs1 => match self {
                PublicKey::Rsa(key) => {
                    let document = key
                        .to_pkcs1_der()
                        .map_err(|e| CosignError::EncodingError(e.to_string()))?;
                    Ok(der_to_pem(document.as_bytes(), "RSA PUBLIC KEY"))
                }
                other => Err(CosignError::InvalidInput(format!(
                    "PKCS#1 encoding needs an RSA key, got {}",
                    other.algorithm_tag()
                ))),
            },
            PublicKeyFormat::OpenSsh => self.to_openssh(),
        }
    }

    fn to_openssh(&self) -> Result<String> {
        let key_data = match self {
            PublicKey::Rsa(key) => KeyData::Rsa(ssh_key::public::RsaPublicKey {
                e: mpint(&key.e().to_bytes_be())?,
                n: mpint(&key.n().to_bytes_be())?,
            }),
            PublicKey::EcdsaP256(key) => KeyData::Ecdsa(EcdsaPublicKey::from_sec1_bytes(
                key.to_encoded_point(false).as_bytes(),
            )
            .map_err(ssh_error)?),
            PublicKey::EcdsaP384(key) => KeyData::Ecdsa(EcdsaPublicKey::from_sec1_bytes(
                key.to_encoded_point(false).as_bytes(),
            )
            .map_err(ssh_error)?),
            PublicKey::EcdsaP521(key) => KeyData::Ecdsa(EcdsaPublicKey::from_sec1_bytes(
                key.to_encoded_point(false).as_bytes(),
            )
            .map_err(ssh_error)?),
            PublicKey::Ed25519(key) => KeyData::Ed25519(Ed25519PublicKey(key.to_bytes())),
            PublicKey::Dsa(key) => {
                let components = key.components();
                KeyData::Dsa(DsaPublicKey {
                    p: mpint(&components.p().to_bytes_be())?,
                    q: mpint(&components.q().to_bytes_be())?,
                    g: mpint(&components.g().to_bytes_be())?,
                    y: mpint(&key.y().to_bytes_be())?,
                })
            }
            PublicKey::Other(spki) => {
                return Err(CosignError::InvalidInput(format!(
                    "no OpenSSH encoding for key algorithm {}",
                    spki.algorithm.oid
                )));
            }
        };
        ssh_key::PublicKey::from(key_data)
            .to_openssh()
            .map_err(ssh_error)
    }
}

impl KeyAlgorithm for PublicKey {
    fn algorithm_tag(&self) -> AlgorithmTag {
        match self {
            PublicKey::Rsa(_) => AlgorithmTag::Rsa,
            PublicKey::EcdsaP256(_)
            | PublicKey::EcdsaP384(_)
            | PublicKey::EcdsaP521(_)
            | PublicKey::Ed25519(_) => AlgorithmTag::Ec,
            PublicKey::Dsa(_) => AlgorithmTag::Dsa,
            PublicKey::Other(spki) => spki.algorithm_tag(),
        }
    }
}

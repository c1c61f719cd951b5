//! Classification of keys into algorithm families.
//!
//! Every key handle in this crate, private or public, reports one of a small
//! closed set of [`AlgorithmTag`]s. Classification never fails: keys of an
//! unrecognized algorithm are tagged [`AlgorithmTag::Unknown`].

use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use serde::{Deserialize, Serialize};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::CosignError;

pub const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
pub const RSASSA_PSS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");
pub const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
pub const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
pub const ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");
pub const X25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.110");
pub const X448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.111");
pub const DSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10040.4.1");
/// X9.42 `dhpublicnumber`.
pub const DH_PUBLIC_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10046.2.1");
/// PKCS#3 `dhKeyAgreement`.
pub const DH_KEY_AGREEMENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.3.1");

pub const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
pub const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
pub const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// The cryptographic family of an asymmetric key.
///
/// Edwards-curve keys (Ed25519, Ed448, X25519, X448) are reported as
/// [`AlgorithmTag::Ec`].
///
/// Parsing is case-insensitive and also accepts `ECDSA` and `EdDSA` for
/// [`AlgorithmTag::Ec`], both through [`FromStr`] and through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AlgorithmTag {
    #[serde(rename = "RSA")]
    Rsa,
    #[serde(rename = "EC")]
    Ec,
    #[serde(rename = "DSA")]
    Dsa,
    #[serde(rename = "DH")]
    Dh,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AlgorithmTag {
    /// Maps a SubjectPublicKeyInfo / PrivateKeyInfo algorithm OID to its family.
    pub fn from_oid(oid: &ObjectIdentifier) -> Self {
        match *oid {
            RSA_ENCRYPTION | RSASSA_PSS => AlgorithmTag::Rsa,
            EC_PUBLIC_KEY | ED25519 | ED448 | X25519 | X448 => AlgorithmTag::Ec,
            DSA => AlgorithmTag::Dsa,
            DH_PUBLIC_NUMBER | DH_KEY_AGREEMENT => AlgorithmTag::Dh,
            _ => AlgorithmTag::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmTag::Rsa => "RSA",
            AlgorithmTag::Ec => "EC",
            AlgorithmTag::Dsa => "DSA",
            AlgorithmTag::Dh => "DH",
            AlgorithmTag::Unknown => "unknown",
        }
    }
}

impl TryFrom<String> for AlgorithmTag {
    type Error = CosignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AlgorithmTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmTag {
    type Err = CosignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RSA" => Ok(AlgorithmTag::Rsa),
            "EC" | "ECDSA" | "EDDSA" => Ok(AlgorithmTag::Ec),
            "DSA" => Ok(AlgorithmTag::Dsa),
            "DH" => Ok(AlgorithmTag::Dh),
            "UNKNOWN" => Ok(AlgorithmTag::Unknown),
            _ => Err(CosignError::InvalidInput(format!(
                "unsupported key mode \"{s}\""
            ))),
        }
    }
}

/// Anything that can report the family of the key it holds.
pub trait KeyAlgorithm {
    fn algorithm_tag(&self) -> AlgorithmTag;
}

impl KeyAlgorithm for ObjectIdentifier {
    fn algorithm_tag(&self) -> AlgorithmTag {
        AlgorithmTag::from_oid(self)
    }
}

impl KeyAlgorithm for SubjectPublicKeyInfoOwned {
    fn algorithm_tag(&self) -> AlgorithmTag {
        AlgorithmTag::from_oid(&self.algorithm.oid)
    }
}

/// Classifies a loaded key. Never fails.
pub fn classify<K: KeyAlgorithm + ?Sized>(key: &K) -> AlgorithmTag {
    key.algorithm_tag()
}

//! RSA issuer keys, signing with PKCS#1 v1.5 over SHA-256.
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use signature::{SignatureEncoding, Signer};

use super::algorithm::{AlgorithmTag, KeyAlgorithm};
use super::{IssuerKey, PublicKey};
use crate::cert::SignatureAlgorithm;
use crate::error::{CosignError, Result};

#[derive(Debug, Clone)]
pub struct RsaKey {
    private: Box<RsaPrivateKey>,
}

impl RsaKey {
    pub fn new(private: RsaPrivateKey) -> Self {
        Self {
            private: Box::new(private),
        }
    }

    /// Loads a PKCS#1 `RSAPrivateKey` structure.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        RsaPrivateKey::from_pkcs1_der(der)
            .map(Self::new)
            .map_err(|e| CosignError::KeyLoadFailure(format!("invalid PKCS#1 RSA key: {e}")))
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        RsaPrivateKey::from_pkcs8_der(der)
            .map(Self::new)
            .map_err(|e| CosignError::KeyLoadFailure(format!("invalid PKCS#8 RSA key: {e}")))
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl KeyAlgorithm for RsaKey {
    fn algorithm_tag(&self) -> AlgorithmTag {
        AlgorithmTag::Rsa
    }
}

impl IssuerKey for RsaKey {
    fn public_key(&self) -> PublicKey {
        PublicKey::Rsa(RsaPublicKey::from(self.private.as_ref()))
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Sha256WithRSA
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(self.private.as_ref().clone());
        let signature = signing_key
            .try_sign(data)
            .map_err(|e| CosignError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

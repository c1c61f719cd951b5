//! DSA issuer keys, signing with `dsa-with-sha256`.
use pkcs8::DecodePrivateKey;
use sha2::{Digest, Sha256};
use signature::{DigestSigner, SignatureEncoding};

use super::algorithm::{AlgorithmTag, KeyAlgorithm};
use super::{IssuerKey, PublicKey};
use crate::cert::SignatureAlgorithm;
use crate::error::{CosignError, Result};

pub struct DsaKey {
    signing_key: dsa::SigningKey,
}

impl std::fmt::Debug for DsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaKey").finish_non_exhaustive()
    }
}

impl DsaKey {
    pub fn new(signing_key: dsa::SigningKey) -> Self {
        Self { signing_key }
    }

    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        dsa::SigningKey::from_pkcs8_der(der)
            .map(Self::new)
            .map_err(|e| CosignError::KeyLoadFailure(format!("invalid PKCS#8 DSA key: {e}")))
    }
}

impl KeyAlgorithm for DsaKey {
    fn algorithm_tag(&self) -> AlgorithmTag {
        AlgorithmTag::Dsa
    }
}

impl IssuerKey for DsaKey {
    fn public_key(&self) -> PublicKey {
        PublicKey::Dsa(self.signing_key.verifying_key().clone())
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::DsaWithSha256
    }

    fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signature: dsa::Signature = self
            .signing_key
            .try_sign_digest(Sha256::new_with_prefix(data))
            .map_err(|e| CosignError::SigningError(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

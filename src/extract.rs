//! Public key extraction from encrypted or plain private keys.
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::key::{AlgorithmTag, IssuerKey, KeyPair, PublicKeyFormat, classify};

/// Loads `private_key` and serializes its public half in `format`.
///
/// `algorithm_hint` is advisory: when it disagrees with the key, the key's own
/// algorithm is used and a warning is logged.
#[instrument(skip(private_key, passphrase), fields(encrypted = passphrase.is_some()))]
pub fn extract_public_key(
    private_key: &[u8],
    passphrase: Option<&str>,
    algorithm_hint: Option<AlgorithmTag>,
    format: PublicKeyFormat,
) -> Result<String> {
    let key = KeyPair::load(private_key, passphrase)?;
    let algorithm = classify(&key);
    if let Some(hint) = algorithm_hint.filter(|hint| *hint != algorithm) {
        warn!(
            key.hint = %hint,
            key.algorithm = %algorithm,
            "algorithm hint does not match the private key"
        );
    }
    debug!(key.algorithm = %algorithm, "extracting public key");
    key.public_key().encode(format)
}

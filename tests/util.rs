#![allow(dead_code)]

use cert_cosign::cert::SignatureAlgorithm;
use cert_cosign::cert::params::DistinguishedName;
use cert_cosign::error::{CosignError, Result};
use cert_cosign::issuer::Authority;
use cert_cosign::key::ec::EcKey;
use cert_cosign::key::{
    AlgorithmTag, IssuerKey, KeyAlgorithm, KeyPair, PublicKey, PublicKeyFormat,
};
use pkcs8::pkcs5::pbes2;
use pkcs8::{EncodePrivateKey, LineEnding, PrivateKeyInfo};
use rand_core::{OsRng, RngCore};

pub fn rsa_key_pem() -> String {
    let key = rsa::RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn p256_key_pem() -> String {
    let key = p256::SecretKey::random(&mut OsRng);
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn p384_key_pem() -> String {
    let key = p384::SecretKey::random(&mut OsRng);
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn p521_key_pem() -> String {
    let key = p521::SecretKey::random(&mut OsRng);
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn ed25519_key_pem() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let key = ed25519_dalek::SigningKey::from_bytes(&seed);
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn dsa_key_pem() -> String {
    let components = dsa::Components::generate(&mut OsRng, dsa::KeySize::DSA_2048_256);
    let key = dsa::SigningKey::generate(&mut OsRng, components);
    key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

/// Wraps an unencrypted PKCS#8 PEM key into `ENCRYPTED PRIVATE KEY`.
///
/// PBKDF2 with few iterations keeps the tests fast.
pub fn encrypt_pem(pem: &str, passphrase: &str) -> String {
    let (_, document) = pkcs8::SecretDocument::from_pem(pem).unwrap();
    let info = PrivateKeyInfo::try_from(document.as_bytes()).unwrap();
    let params =
        pbes2::Parameters::pbkdf2_sha256_aes256cbc(2048, b"cosign-salt", &[7u8; 16]).unwrap();
    let encrypted = info.encrypt_with_params(params, passphrase).unwrap();
    encrypted
        .to_pem("ENCRYPTED PRIVATE KEY", LineEnding::LF)
        .unwrap()
        .to_string()
}

pub fn authority_name() -> DistinguishedName {
    DistinguishedName::builder()
        .common_name("Cosign Test Authority".to_string())
        .organization("Example".to_string())
        .country("US".to_string())
        .build()
}

pub fn authority(pem: &str) -> Authority {
    let key = KeyPair::load(pem.as_bytes(), None).unwrap();
    Authority::from_distinguished_name(&authority_name(), key).unwrap()
}

/// A client key pair: the public key as a PEM string.
pub fn client_public_pem() -> String {
    let key = p256::SecretKey::random(&mut OsRng);
    PublicKey::EcdsaP256(key.public_key())
        .encode(PublicKeyFormat::Spki)
        .unwrap()
}

pub fn issuer_public_pem<K: IssuerKey>(authority: &Authority<K>) -> String {
    authority
        .key()
        .public_key()
        .encode(PublicKeyFormat::Spki)
        .unwrap()
}

/// Checks the certificate signature with OpenSSL.
pub fn verify_with_openssl(cert_pem: &str, issuer_public_pem: &str) -> bool {
    let x509 = openssl::x509::X509::from_pem(cert_pem.as_bytes()).unwrap();
    let key = openssl::pkey::PKey::public_key_from_pem(issuer_public_pem.as_bytes()).unwrap();
    x509.verify(&key).unwrap()
}

/// An issuer key that never signs, standing in for an unavailable token.
pub struct RefusingKey(pub EcKey);

impl KeyAlgorithm for RefusingKey {
    fn algorithm_tag(&self) -> AlgorithmTag {
        self.0.algorithm_tag()
    }
}

impl IssuerKey for RefusingKey {
    fn public_key(&self) -> PublicKey {
        self.0.public_key()
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.0.signature_algorithm()
    }

    fn sign_data(&self, _data: &[u8]) -> Result<Vec<u8>> {
        Err(CosignError::SigningError("token unavailable".to_string()))
    }
}

pub fn refusing_authority() -> Authority<RefusingKey> {
    let key = RefusingKey(EcKey::P256(p256::SecretKey::random(&mut OsRng)));
    Authority::from_distinguished_name(&authority_name(), key).unwrap()
}

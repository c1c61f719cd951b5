mod util;

use cert_cosign::error::CosignError;
use cert_cosign::extract::extract_public_key;
use cert_cosign::key::{
    AlgorithmTag, KeyPair, PublicKey, PublicKeyFormat, classify, classify_encoded,
};

#[test]
fn test_encrypted_key_with_passphrase() {
    let plain = util::p384_key_pem();
    let encrypted = util::encrypt_pem(&plain, "correct horse");

    let from_encrypted = extract_public_key(
        encrypted.as_bytes(),
        Some("correct horse"),
        Some(AlgorithmTag::Ec),
        PublicKeyFormat::Spki,
    )
    .unwrap();
    let from_plain =
        extract_public_key(plain.as_bytes(), None, None, PublicKeyFormat::Spki).unwrap();
    assert_eq!(from_encrypted, from_plain);
}

#[test]
fn test_encrypted_key_wrong_passphrase() {
    let encrypted = util::encrypt_pem(&util::p256_key_pem(), "right");
    let err = extract_public_key(
        encrypted.as_bytes(),
        Some("wrong"),
        None,
        PublicKeyFormat::Spki,
    )
    .unwrap_err();
    assert!(matches!(err, CosignError::KeyLoadFailure(_)));

    let err = KeyPair::load(encrypted.as_bytes(), None).unwrap_err();
    assert!(matches!(err, CosignError::KeyLoadFailure(_)));
}

#[test]
fn test_rsa_formats() {
    let pem = util::rsa_key_pem();
    let pkcs1 = extract_public_key(pem.as_bytes(), None, None, PublicKeyFormat::Pkcs1).unwrap();
    assert!(pkcs1.starts_with("-----BEGIN RSA PUBLIC KEY-----\n"));

    let spki = extract_public_key(pem.as_bytes(), None, None, PublicKeyFormat::Spki).unwrap();
    let from_pkcs1 = PublicKey::from_encoded(pkcs1.as_bytes(), Some(AlgorithmTag::Rsa)).unwrap();
    assert_eq!(from_pkcs1.encode(PublicKeyFormat::Spki).unwrap(), spki);

    let openssh =
        extract_public_key(pem.as_bytes(), None, None, PublicKeyFormat::OpenSsh).unwrap();
    assert!(openssh.starts_with("ssh-rsa "));

    let der = extract_public_key(pem.as_bytes(), None, None, PublicKeyFormat::Der).unwrap();
    let openssl_key = openssl::pkey::PKey::public_key_from_pem(spki.as_bytes()).unwrap();
    use base64::Engine;
    assert_eq!(
        base64::engine::general_purpose::STANDARD.encode(openssl_key.public_key_to_der().unwrap()),
        der
    );
}

#[test]
fn test_openssh_prefixes() {
    let cases = [
        (util::p256_key_pem(), "ecdsa-sha2-nistp256 "),
        (util::p384_key_pem(), "ecdsa-sha2-nistp384 "),
        (util::p521_key_pem(), "ecdsa-sha2-nistp521 "),
        (util::ed25519_key_pem(), "ssh-ed25519 "),
        (util::dsa_key_pem(), "ssh-dss "),
    ];
    for (pem, prefix) in cases {
        let line =
            extract_public_key(pem.as_bytes(), None, None, PublicKeyFormat::OpenSsh).unwrap();
        assert!(line.starts_with(prefix), "{line} should start with {prefix}");
    }
}

#[test]
fn test_pkcs1_requires_rsa_key() {
    let err = extract_public_key(
        util::ed25519_key_pem().as_bytes(),
        None,
        None,
        PublicKeyFormat::Pkcs1,
    )
    .unwrap_err();
    assert!(matches!(err, CosignError::InvalidInput(_)));
}

#[test]
fn test_classification() {
    let rsa = KeyPair::load(util::rsa_key_pem().as_bytes(), None).unwrap();
    assert_eq!(classify(&rsa), AlgorithmTag::Rsa);
    let dsa = KeyPair::load(util::dsa_key_pem().as_bytes(), None).unwrap();
    assert_eq!(classify(&dsa), AlgorithmTag::Dsa);
    assert_eq!(
        classify_encoded(util::client_public_pem().as_bytes(), None),
        AlgorithmTag::Ec
    );

    let encrypted = util::encrypt_pem(&util::ed25519_key_pem(), "pw");
    assert_eq!(classify_encoded(encrypted.as_bytes(), Some("pw")), AlgorithmTag::Ec);
    assert_eq!(classify_encoded(encrypted.as_bytes(), None), AlgorithmTag::Unknown);
}

#[test]
fn test_openssl_generated_keys_load() {
    let rsa = openssl::rsa::Rsa::generate(1024).unwrap();
    let pkcs1_pem = rsa.private_key_to_pem().unwrap();
    let key = KeyPair::load(&pkcs1_pem, None).unwrap();
    assert_eq!(classify(&key), AlgorithmTag::Rsa);

    let group = openssl::ec::EcGroup::from_curve_name(openssl::nid::Nid::SECP384R1).unwrap();
    let ec = openssl::ec::EcKey::generate(&group).unwrap();
    let sec1_pem = ec.private_key_to_pem().unwrap();
    let key = KeyPair::load(&sec1_pem, None).unwrap();
    assert_eq!(classify(&key), AlgorithmTag::Ec);

    let pkey = openssl::pkey::PKey::from_ec_key(ec).unwrap();
    let encrypted = pkey
        .private_key_to_pem_pkcs8_passphrase(openssl::symm::Cipher::aes_256_cbc(), b"pw")
        .unwrap();
    let public = extract_public_key(&encrypted, Some("pw"), None, PublicKeyFormat::Spki).unwrap();
    assert_eq!(
        public.as_bytes(),
        pkey.public_key_to_pem().unwrap().as_slice()
    );
}

mod util;

use cert_cosign::cert::params::DistinguishedName;
use cert_cosign::cert::registry::ExtensionRegistry;
use cert_cosign::key::PublicKey;
use cert_cosign::request::{CertificateData, ExtensionInput};
use regex::Regex;
use serde_json::json;
use std::fs;
use std::process::Command;
use time::OffsetDateTime;

fn certificate_data() -> CertificateData {
    let now = OffsetDateTime::now_utc();
    CertificateData::builder()
        .issuer_dn(util::authority_name())
        .subject_dn(
            DistinguishedName::builder()
                .common_name("server.myca.local".to_string())
                .organization_unit("Ops".to_string())
                .build(),
        )
        .serial_number("4096".to_string())
        .not_before(now)
        .not_after(now + time::Duration::days(365))
        .extensions(vec![
            ExtensionInput {
                id: "keyUsage".to_string(),
                critical: true,
                value: json!(["digitalSignature", "keyEncipherment"]),
            },
            ExtensionInput {
                id: "extKeyUsage".to_string(),
                critical: false,
                value: json!(["serverAuth"]),
            },
        ])
        .build()
}

fn issue_pem(issuer_key_pem: &str) -> (String, String) {
    let authority = util::authority(issuer_key_pem);
    let client_key =
        PublicKey::from_encoded(util::client_public_pem().as_bytes(), None).unwrap();
    let certificate = authority
        .issue_direct(&certificate_data(), &client_key, &ExtensionRegistry::new())
        .unwrap()
        .expect("certificate should be signed");
    (
        certificate.to_pem().unwrap(),
        util::issuer_public_pem(&authority),
    )
}

#[test]
fn test_openssl_verifies_every_issuer_family() {
    let cases = [
        ("RSA", util::rsa_key_pem(), openssl::nid::Nid::SHA256WITHRSAENCRYPTION),
        ("P-256", util::p256_key_pem(), openssl::nid::Nid::ECDSA_WITH_SHA256),
        ("P-384", util::p384_key_pem(), openssl::nid::Nid::ECDSA_WITH_SHA384),
        ("P-521", util::p521_key_pem(), openssl::nid::Nid::ECDSA_WITH_SHA512),
        ("Ed25519", util::ed25519_key_pem(), openssl::nid::Nid::from_raw(openssl::pkey::Id::ED25519.as_raw())),
        ("DSA", util::dsa_key_pem(), openssl::nid::Nid::DSA_WITH_SHA256),
    ];

    for (family, key_pem, expected_nid) in cases {
        let (cert_pem, issuer_pem) = issue_pem(&key_pem);
        assert!(
            util::verify_with_openssl(&cert_pem, &issuer_pem),
            "{family} signature does not verify"
        );

        let x509 = openssl::x509::X509::from_pem(cert_pem.as_bytes()).unwrap();
        assert_eq!(
            x509.signature_algorithm().object().nid(),
            expected_nid,
            "{family} signature algorithm"
        );
    }
}

#[test]
fn test_openssl_crate_reads_fields() {
    let (cert_pem, _) = issue_pem(&util::p256_key_pem());

    use openssl::x509::X509;
    let x509 = X509::from_pem(cert_pem.as_bytes()).expect("Failed to parse PEM");

    let subject = x509
        .subject_name()
        .entries_by_nid(openssl::nid::Nid::COMMONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(subject.to_string(), "server.myca.local", "Subject CN mismatch");

    let issuer = x509
        .issuer_name()
        .entries_by_nid(openssl::nid::Nid::ORGANIZATIONNAME)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap();
    assert_eq!(issuer.to_string(), "Example", "Issuer O mismatch");

    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");

    let serial = x509.serial_number().to_bn().unwrap().to_dec_str().unwrap();
    assert_eq!(serial.to_string(), "4096");
}

#[test]
fn test_openssl_cli_text() {
    let (cert_pem, _) = issue_pem(&util::p256_key_pem());

    let cert_path =
        std::env::temp_dir().join(format!("cosign_cli_{}.pem", std::process::id()));
    fs::write(&cert_path, cert_pem).expect("Failed to write certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");
    fs::remove_file(&cert_path).expect("Failed to remove test certificate");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_text = String::from_utf8_lossy(&output.stdout);

    assert!(output_text.contains("Version: 3 (0x2)"), "Version field is incorrect");
    assert!(
        output_text.contains("Serial Number: 4096 (0x1000)"),
        "Serial Number field is incorrect"
    );
    assert!(
        output_text.contains("Signature Algorithm: ecdsa-with-SHA256"),
        "Signature Algorithm field is incorrect"
    );

    let issuer_regex =
        Regex::new(r"Issuer: C ?= ?US, O ?= ?Example, CN ?= ?Cosign Test Authority").unwrap();
    assert!(issuer_regex.is_match(&output_text), "Issuer field is incorrect");
    let subject_regex = Regex::new(r"Subject: OU ?= ?Ops, CN ?= ?server\.myca\.local").unwrap();
    assert!(subject_regex.is_match(&output_text), "Subject field is incorrect");

    assert!(output_text.contains("X509v3 Key Usage: critical"));
    assert!(output_text.contains("Digital Signature, Key Encipherment"));
    assert!(output_text.contains("TLS Web Server Authentication"));
    assert!(output_text.contains("X509v3 Subject Key Identifier"));
}

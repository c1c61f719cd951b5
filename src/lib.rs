//! # cert-cosign - Certificate co-signing with RustCrypto
//!
//! cert-cosign re-issues and issues X.509 certificates under a configured
//! signing authority. It is built on the RustCrypto crates and uses openssl
//! only in tests.
//!
//! ## Supported Key Types
//!
//! Issuer keys, loaded from PEM or DER, optionally from an encrypted PKCS#8
//! container:
//! - **RSA**: PKCS#1 or PKCS#8, signing with `sha256WithRSAEncryption`
//! - **ECDSA**: P-256, P-384 and P-521 (PKCS#8 or SEC1), signing with the
//!   hash matching the curve
//! - **Ed25519**
//! - **DSA**: signing with `dsa-with-sha256`
//!
//! Subject public keys of any algorithm can be certified. Keys this crate
//! cannot parse into a typed key (DH, Ed448, ...) are carried as their raw
//! SubjectPublicKeyInfo.
//!
//! ## Issuance Paths
//!
//! - **Re-issuance**: a candidate certificate keeps its subject and extensions;
//!   issuer, serial number, validity and public key are replaced.
//! - **Direct issuance**: the certificate is built from [`request::CertificateData`],
//!   with extension values given as JSON and encoded through declared shapes.
//!
//! ## Quick Start
//!
//! ### Re-issuing a Candidate Certificate
//!
//! ```rust,no_run
//! use cert_cosign::config::AuthorityConfig;
//! use cert_cosign::issuer::Authority;
//! use cert_cosign::request::{Outcome, SignRequest};
//!
//! # fn main() -> Result<(), cert_cosign::error::CosignError> {
//! let config = AuthorityConfig::from_file("authority.json")?;
//! let authority = Authority::from_config(&config)?;
//!
//! let request = SignRequest::from_json(&std::fs::read_to_string("request.json").unwrap())?;
//! let outcome = Outcome::from_signing(authority.sign(&request));
//! println!("{}", serde_json::to_string(&outcome).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! ### Declaring Custom Extensions
//!
//! ```rust
//! use cert_cosign::cert::registry::{ExtensionData, ExtensionDeclaration, ExtensionRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), cert_cosign::error::CosignError> {
//! let declarations: Vec<ExtensionDeclaration> = serde_json::from_value(json!([
//!     {"name": "coolness", "oid": "1.3.6.1.4.1.55555.1", "type": "ANY"}
//! ]))?;
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register(&declarations)?;
//!
//! let oid = registry.resolve("coolness")?;
//! let der = registry.encode(&oid, &json!({"cool": true, "level": 12}))?;
//! assert_eq!(
//!     registry.decode(&oid, &der),
//!     ExtensionData::Value(json!({"cool": true, "level": 12}))
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ### Extracting a Public Key
//!
//! ```rust,no_run
//! use cert_cosign::extract::extract_public_key;
//! use cert_cosign::key::PublicKeyFormat;
//!
//! # fn main() -> Result<(), cert_cosign::error::CosignError> {
//! let pem = std::fs::read("client.key").unwrap();
//! let line = extract_public_key(&pem, Some("secret"), None, PublicKeyFormat::OpenSsh)?;
//! println!("{line}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Request-level problems are [`error::CosignError`] values:
//!
//! ```rust
//! use cert_cosign::{key::KeyPair, error::CosignError};
//!
//! match KeyPair::load(b"invalid pem data", None) {
//!     Ok(_) => println!("Key loaded"),
//!     Err(CosignError::KeyLoadFailure(msg)) => println!("Failed to read key: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! A signing failure after a request was accepted is not an error: it is
//! logged and the issuance returns `Ok(None)`.
//!
//! ## Module Organization
//!
//! - [`key`]: Key loading, classification and public key encodings
//! - [`cert`]: Certificate encoding, names, extensions and the extension registry
//! - [`template`]: The logical content of a certificate before signing
//! - [`issuer`]: The issuer abstraction and the signing [`issuer::Authority`]
//! - [`reissue`]: Re-issuance and direct issuance
//! - [`request`]: JSON requests and outcomes
//! - [`config`]: Authority configuration
//! - [`extract`]: Public key extraction
//! - [`error`]: Error types

pub mod cert;
pub mod config;
pub mod error;
pub mod extract;
pub mod issuer;
pub mod key;
mod pem_utils;
pub mod reissue;
pub mod request;
pub mod template;

//! The JSON request and response boundary of the signing service.
//!
//! A [`SignRequest`] carries either a candidate certificate to re-issue or the
//! [`CertificateData`] for a new one, never both. Results are reported as an
//! [`Outcome`].
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::cert::Certificate;
use crate::cert::params::DistinguishedName;
use crate::cert::registry::ExtensionDeclaration;
use crate::error::{CosignError, Result};
use crate::key::{AlgorithmTag, PublicKey};

/// One extension value for a directly issued certificate.
///
/// `id` is a declared name, a dotted OID or a well-known extension name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionInput {
    #[serde(alias = "extnID")]
    pub id: String,
    #[serde(default)]
    pub critical: bool,
    #[serde(alias = "extnValue")]
    pub value: Value,
}

/// Everything needed to issue a certificate without a candidate.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    #[serde(rename = "issuerDN")]
    pub issuer_dn: DistinguishedName,
    #[serde(rename = "subjectDN")]
    pub subject_dn: DistinguishedName,
    /// Decimal, at most 20 octets once encoded.
    pub serial_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub not_before: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub not_after: OffsetDateTime,
    #[serde(default)]
    #[builder(default)]
    pub extensions: Vec<ExtensionInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    #[serde(default)]
    pub extensions: Vec<ExtensionDeclaration>,
    /// Candidate certificate, PEM or base64 DER.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_data: Option<CertificateData>,
    /// SPKI or PKCS#1, PEM or base64 DER.
    pub client_public_key: String,
    /// Expected family of the client key; advisory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AlgorithmTag>,
}

/// Which issuance path a request takes.
#[derive(Debug, Clone, Copy)]
pub enum SignPayload<'a> {
    Reissue(&'a str),
    Direct(&'a CertificateData),
}

/// Decodes a PEM document or base64 DER into bytes a parser can accept.
pub(crate) fn text_to_bytes(text: &str) -> Result<Vec<u8>> {
    use base64::Engine;

    let trimmed = text.trim();
    if trimmed.starts_with("-----BEGIN ") {
        return Ok(trimmed.as_bytes().to_vec());
    }
    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| CosignError::InvalidInput(format!("neither PEM nor base64 DER: {e}")))
}

impl SignRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn payload(&self) -> Result<SignPayload<'_>> {
        match (&self.certificate, &self.certificate_data) {
            (Some(certificate), None) => Ok(SignPayload::Reissue(certificate)),
            (None, Some(data)) => Ok(SignPayload::Direct(data)),
            (Some(_), Some(_)) => Err(CosignError::InvalidInput(
                "a request carries either certificate or certificateData, not both".to_string(),
            )),
            (None, None) => Err(CosignError::InvalidInput(
                "a request needs certificate or certificateData".to_string(),
            )),
        }
    }

    pub fn client_public_key(&self) -> Result<PublicKey> {
        let bytes = text_to_bytes(&self.client_public_key)
            .map_err(|e| CosignError::KeyLoadFailure(e.to_string()))?;
        PublicKey::from_encoded(&bytes, self.mode)
    }
}

/// The result reported back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn success(result: String) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
        }
    }

    /// A signed certificate is reported as PEM. A soft signing failure is a
    /// failure outcome without an error message.
    pub fn from_signing(result: Result<Option<Certificate>>) -> Self {
        match result.and_then(|cert| cert.map(|cert| cert.to_pem()).transpose()) {
            Ok(Some(pem)) => Self::success(pem),
            Ok(None) => Self {
                success: false,
                result: None,
                error: None,
            },
            Err(e) => Self::failure(e),
        }
    }
}

impl From<Result<String>> for Outcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::failure(e),
        }
    }
}

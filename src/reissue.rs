//! The two issuance paths of an [`Authority`].
//!
//! Re-issuance takes a candidate certificate, keeps its subject and
//! extensions, and replaces everything the authority controls: issuer,
//! serial number, validity window and subject public key. Direct issuance
//! builds the certificate from caller-supplied [`CertificateData`].
//!
//! Both paths return `Result<Option<Certificate>>`. Problems with the input
//! are errors; a key that refuses to sign is logged and reported as
//! `Ok(None)`.
use tracing::{debug, instrument};

use crate::cert::Certificate;
use crate::cert::extensions::{SubjectKeyIdentifier, ToAndFromX509Extension};
use crate::cert::params::{ExtensionParam, Validity};
use crate::cert::registry::ExtensionRegistry;
use crate::error::{CosignError, Result};
use crate::issuer::{Authority, Issuer};
use crate::key::{IssuerKey, PublicKey};
use crate::request::{CertificateData, SignPayload, SignRequest, text_to_bytes};
use crate::template::{CertificateTemplate, parse_serial_number};

/// Serial number of every re-issued certificate.
pub const REISSUED_SERIAL_NUMBER: u64 = 1;

/// Lifetime of a re-issued certificate, starting at signing time.
pub const REISSUED_VALIDITY_HOURS: i64 = 24;

impl<K: IssuerKey> Authority<K> {
    /// Handles a complete request.
    ///
    /// The request's declarations are registered in a fresh registry that
    /// lives only as long as this call.
    #[instrument(skip_all, fields(declarations = request.extensions.len()))]
    pub fn sign(&self, request: &SignRequest) -> Result<Option<Certificate>> {
        let payload = request.payload()?;
        let mut registry = ExtensionRegistry::new();
        registry.register(&request.extensions)?;
        let client_public_key = request.client_public_key()?;

        match payload {
            SignPayload::Reissue(candidate) => {
                let bytes = text_to_bytes(candidate)
                    .map_err(|e| CosignError::CertificateParseFailure(e.to_string()))?;
                self.reissue(&bytes, &client_public_key)
            }
            SignPayload::Direct(data) => self.issue_direct(data, &client_public_key, &registry),
        }
    }

    /// Builds the template for re-issuing `candidate` (PEM or DER).
    pub fn reissue_template(
        &self,
        candidate: &[u8],
        client_public_key: &PublicKey,
    ) -> Result<CertificateTemplate> {
        let candidate = Certificate::parse(candidate)
            .map_err(|e| CosignError::CertificateParseFailure(e.to_string()))?;
        let mut template = candidate.to_template();
        debug!(
            candidate.serial = %template.serial_number_decimal(),
            candidate.extensions = template.extensions.len(),
            "parsed candidate certificate"
        );

        template.issuer = self.issuer_name().clone();
        template.serial_number = parse_serial_number(&REISSUED_SERIAL_NUMBER.to_string())?;
        template.validity = Validity::for_hours(REISSUED_VALIDITY_HOURS);
        template.subject_public_key = client_public_key.as_spki()?;
        Ok(template)
    }

    /// Re-issues a candidate certificate under this authority.
    #[instrument(skip_all)]
    pub fn reissue(
        &self,
        candidate: &[u8],
        client_public_key: &PublicKey,
    ) -> Result<Option<Certificate>> {
        let template = self.reissue_template(candidate, client_public_key)?;
        self.issue(&template)
    }

    /// Builds the template for a directly issued certificate.
    ///
    /// Extension values are encoded through `registry`. A subject key
    /// identifier is appended unless the caller supplied one.
    pub fn direct_template(
        &self,
        data: &CertificateData,
        client_public_key: &PublicKey,
        registry: &ExtensionRegistry,
    ) -> Result<CertificateTemplate> {
        if data.not_after < data.not_before {
            return Err(CosignError::InvalidInput(format!(
                "notAfter {} is before notBefore {}",
                data.not_after, data.not_before
            )));
        }
        let validity = Validity {
            not_before: data.not_before,
            not_after: data.not_after,
        };
        validity.to_x509_validity()?;
        let subject_public_key = client_public_key.as_spki()?;

        let mut extensions = data
            .extensions
            .iter()
            .map(|input| {
                let oid = registry.resolve(&input.id)?;
                Ok(ExtensionParam {
                    oid,
                    critical: input.critical,
                    value: registry.encode(&oid, &input.value)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if !extensions
            .iter()
            .any(|ext| ext.oid == SubjectKeyIdentifier::OID)
        {
            let ski = SubjectKeyIdentifier::from_spki(&subject_public_key);
            extensions.push(ExtensionParam::from_extension(&ski, false)?);
        }

        Ok(CertificateTemplate {
            serial_number: parse_serial_number(&data.serial_number)?,
            issuer: data.issuer_dn.as_x509_name()?,
            validity,
            subject: data.subject_dn.as_x509_name()?,
            subject_public_key,
            extensions,
        })
    }

    /// Issues a certificate from `data`.
    #[instrument(skip_all, fields(serial = %data.serial_number))]
    pub fn issue_direct(
        &self,
        data: &CertificateData,
        client_public_key: &PublicKey,
        registry: &ExtensionRegistry,
    ) -> Result<Option<Certificate>> {
        let template = self.direct_template(data, client_public_key, registry)?;
        self.issue(&template)
    }
}

use const_oid::ObjectIdentifier;
use rsa::BigUint;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::params::{ExtensionParam, Validity};
use crate::cert::registry::{ExtensionData, ExtensionRegistry};
use crate::error::{CosignError, Result};

/// Parses a non-negative decimal serial number of at most 20 octets.
pub fn parse_serial_number(decimal: &str) -> Result<SerialNumber> {
    let invalid = || CosignError::InvalidInput(format!("invalid serial number \"{decimal}\""));
    if decimal.is_empty() || !decimal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value = BigUint::parse_bytes(decimal.as_bytes(), 10).ok_or_else(invalid)?;
    let mut bytes = value.to_bytes_be();
    // INTEGER is signed; keep a positive value positive.
    if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        bytes.insert(0, 0);
    }
    SerialNumber::new(&bytes).map_err(|e| {
        CosignError::InvalidInput(format!("serial number \"{decimal}\" is out of range: {e}"))
    })
}

/// The logical content of a certificate, before (or after) signing.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The validity window.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - X.509 extensions in certificate order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateTemplate {
    pub serial_number: SerialNumber,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub extensions: Vec<ExtensionParam>,
}

impl CertificateTemplate {
    pub fn serial_number_decimal(&self) -> String {
        BigUint::from_bytes_be(self.serial_number.as_bytes()).to_str_radix(10)
    }

    /// Finds an extension by OID.
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&ExtensionParam> {
        self.extensions.iter().find(|ext| ext.oid == *oid)
    }

    /// Yields every extension with its value decoded through `registry`.
    ///
    /// Values are decoded as the iterator is advanced; an extension without a
    /// usable shape is yielded as [`ExtensionData::Raw`].
    pub fn extension_values<'a>(
        &'a self,
        registry: &'a ExtensionRegistry,
    ) -> impl Iterator<Item = (ObjectIdentifier, ExtensionData)> + 'a {
        self.extensions
            .iter()
            .map(move |ext| (ext.oid, registry.decode(&ext.oid, &ext.value)))
    }

    /// Converts the template into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(
        &self,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<TbsCertificateInner> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: self.serial_number.clone(),
            signature: signature_algorithm.into(),
            issuer: self.issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!extensions.is_empty()).then_some(extensions),
        })
    }

    /// Creates a `CertificateTemplate` from a `TbsCertificateInner`.
    ///
    /// Extensions keep their original order, criticality and bytes.
    pub fn from_tbs_certificate(inner: &TbsCertificateInner) -> Self {
        let extensions = inner
            .extensions
            .iter()
            .flatten()
            .map(ExtensionParam::from_x509_extension)
            .collect();

        Self {
            serial_number: inner.serial_number.clone(),
            issuer: inner.issuer.clone(),
            validity: Validity::from_x509_validity(&inner.validity),
            subject: inner.subject.clone(),
            subject_public_key: inner.subject_public_key_info.clone(),
            extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;
    use crate::key::PublicKey;
    use serde_json::json;

    fn template() -> CertificateTemplate {
        let secret = p256::SecretKey::from_slice(&[9u8; 32]).unwrap();
        let name = DistinguishedName::builder()
            .common_name("Foo".to_string())
            .build()
            .as_x509_name()
            .unwrap();
        CertificateTemplate {
            serial_number: parse_serial_number("123").unwrap(),
            issuer: name.clone(),
            validity: Validity::for_hours(24),
            subject: name,
            subject_public_key: PublicKey::EcdsaP256(secret.public_key()).as_spki().unwrap(),
            extensions: vec![],
        }
    }

    #[test]
    fn test_serial_number_parsing() {
        assert_eq!(parse_serial_number("123").unwrap().as_bytes(), &[0x7b]);

        for bad in ["", "-1", "12a", "0x10", " 1"] {
            assert!(
                matches!(parse_serial_number(bad), Err(CosignError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
        // 2^160 needs 21 octets.
        let too_big = "1461501637330902918203684832716283019655932542976";
        assert!(parse_serial_number(too_big).is_err());
    }

    #[test]
    fn test_serial_number_decimal() {
        let mut template = template();
        assert_eq!(template.serial_number_decimal(), "123");
        for decimal in ["128", "255", "98765432109876543210"] {
            template.serial_number = parse_serial_number(decimal).unwrap();
            assert_eq!(template.serial_number_decimal(), decimal);
        }
    }

    #[test]
    fn test_tbs_round_trip() {
        let mut template = template();
        template.extensions.push(ExtensionParam {
            oid: ObjectIdentifier::new_unwrap("1.2.3.4"),
            critical: true,
            value: vec![0x01, 0x01, 0xff],
        });
        let inner = template
            .to_tbs_certificate_inner(SignatureAlgorithm::Sha256WithECDSA)
            .unwrap();
        assert_eq!(inner.version, Version::V3);

        let mut decoded = CertificateTemplate::from_tbs_certificate(&inner);
        // Sub-second precision does not survive UTCTime.
        decoded.validity = template.validity.clone();
        assert_eq!(decoded, template);
    }

    #[test]
    fn test_no_extensions_omits_the_field() {
        let inner = template()
            .to_tbs_certificate_inner(SignatureAlgorithm::Sha256WithECDSA)
            .unwrap();
        assert!(inner.extensions.is_none());
    }

    #[test]
    fn test_extension_values() {
        let mut template = template();
        let registry = ExtensionRegistry::new();
        assert_eq!(template.extension_values(&registry).count(), 0);

        let key_usage = registry.resolve("keyUsage").unwrap();
        template.extensions.push(ExtensionParam {
            oid: key_usage,
            critical: true,
            value: registry.encode(&key_usage, &json!(["digitalSignature"])).unwrap(),
        });
        template.extensions.push(ExtensionParam {
            oid: ObjectIdentifier::new_unwrap("1.2.3.4"),
            critical: false,
            value: vec![0x05, 0x00],
        });

        let values: Vec<_> = template.extension_values(&registry).collect();
        assert_eq!(
            values,
            vec![
                (key_usage, ExtensionData::Value(json!(["digitalSignature"]))),
                (
                    ObjectIdentifier::new_unwrap("1.2.3.4"),
                    ExtensionData::Raw(vec![0x05, 0x00])
                ),
            ]
        );
    }
}

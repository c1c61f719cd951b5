use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::{Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha1::{Digest, Sha1};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{CosignError, Result};

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use cert_cosign::cert::extensions::SubjectAltName;
/// use cert_cosign::cert::extensions::ToAndFromX509Extension;
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only DNS names are supported. In JSON this is an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::try_from(name.clone())
                        .map(GeneralName::DnsName)
                        .map_err(|e| CosignError::InvalidInput(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(CosignError::InvalidInput(
                    "Unsupported general name type".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// JSON form: `{"cA": true, "pathLenConstraint": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasicConstraints {
    #[serde(rename = "cA", default)]
    pub is_ca: bool,
    #[serde(
        rename = "pathLenConstraint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// In JSON this is an array of RFC 5280 bit names, e.g.
/// `["digitalSignature", "keyCertSign"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

const KEY_USAGE_NAMES: [(KeyUsages, &str); 9] = [
    (KeyUsages::DigitalSignature, "digitalSignature"),
    (KeyUsages::NonRepudiation, "nonRepudiation"),
    (KeyUsages::KeyEncipherment, "keyEncipherment"),
    (KeyUsages::DataEncipherment, "dataEncipherment"),
    (KeyUsages::KeyAgreement, "keyAgreement"),
    (KeyUsages::KeyCertSign, "keyCertSign"),
    (KeyUsages::CRLSign, "cRLSign"),
    (KeyUsages::EncipherOnly, "encipherOnly"),
    (KeyUsages::DecipherOnly, "decipherOnly"),
];

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

impl Serialize for KeyUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let names: Vec<&str> = KEY_USAGE_NAMES
            .iter()
            .filter(|(flag, _)| self.0.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        names.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KeyUsage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut flags = FlagSet::<KeyUsages>::default();
        for name in &names {
            let (flag, _) = KEY_USAGE_NAMES
                .iter()
                .find(|(_, known)| known == name)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown key usage \"{name}\"")))?;
            flags |= *flag;
        }
        Ok(Self(flags))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku
            .0
            .iter()
            .map(|v| match *v {
                const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => {
                    Ok(ExtendedKeyUsageOption::OcspSigning)
                }
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH => Ok(ExtendedKeyUsageOption::ServerAuth),
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => Ok(ExtendedKeyUsageOption::ClientAuth),
                const_oid::db::rfc5912::ID_KP_CODE_SIGNING => {
                    Ok(ExtendedKeyUsageOption::CodeSigning)
                }
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                    Ok(ExtendedKeyUsageOption::EmailProtection)
                }
                const_oid::db::rfc5912::ID_KP_TIME_STAMPING => {
                    Ok(ExtendedKeyUsageOption::TimeStamping)
                }
                _ => Err(CosignError::InvalidInput(
                    "Unsupported extended key usage option".to_string(),
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
        }
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
///
/// In JSON the identifier is a lowercase hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl SubjectKeyIdentifier {
    /// RFC 5280 method (1): SHA-1 over the subjectPublicKey BIT STRING contents.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Self {
        let digest = Sha1::digest(spki.subject_public_key.raw_bytes());
        Self {
            key_identifier: digest.to_vec(),
        }
    }
}

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(
            self.key_identifier.as_slice(),
        )?);
        Ok(ski.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: ski.0.as_bytes().to_vec(),
        })
    }
}

impl Serialize for SubjectKeyIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let hex: String = self
            .key_identifier
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect();
        serializer.serialize_str(&hex)
    }
}

impl<'de> Deserialize<'de> for SubjectKeyIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        let hex: String = hex.chars().filter(|c| *c != ':').collect();
        if hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(serde::de::Error::custom("key identifier must be a hex string"));
        }
        let key_identifier = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(serde::de::Error::custom)?;
        Ok(Self { key_identifier })
    }
}

/// Extensions with a built-in JSON codec; no declaration is needed to use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownExtension {
    SubjectKeyIdentifier,
    KeyUsage,
    SubjectAltName,
    BasicConstraints,
    ExtendedKeyUsage,
}

fn encode_json<E>(value: &Value) -> Result<Vec<u8>>
where
    E: ToAndFromX509Extension + DeserializeOwned,
{
    let extension: E = serde_json::from_value(value.clone())?;
    extension.to_x509_extension_value()
}

fn decode_json<E>(der: &[u8]) -> Result<Value>
where
    E: ToAndFromX509Extension + Serialize,
{
    let extension = E::from_x509_extension_value(der)?;
    serde_json::to_value(extension).map_err(|e| CosignError::EncodingError(e.to_string()))
}

impl WellKnownExtension {
    pub const ALL: [WellKnownExtension; 5] = [
        WellKnownExtension::SubjectKeyIdentifier,
        WellKnownExtension::KeyUsage,
        WellKnownExtension::SubjectAltName,
        WellKnownExtension::BasicConstraints,
        WellKnownExtension::ExtendedKeyUsage,
    ];

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            WellKnownExtension::SubjectKeyIdentifier => SubjectKeyIdentifier::OID,
            WellKnownExtension::KeyUsage => KeyUsage::OID,
            WellKnownExtension::SubjectAltName => SubjectAltName::OID,
            WellKnownExtension::BasicConstraints => BasicConstraints::OID,
            WellKnownExtension::ExtendedKeyUsage => ExtendedKeyUsage::OID,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WellKnownExtension::SubjectKeyIdentifier => "subjectKeyIdentifier",
            WellKnownExtension::KeyUsage => "keyUsage",
            WellKnownExtension::SubjectAltName => "subjectAltName",
            WellKnownExtension::BasicConstraints => "basicConstraints",
            WellKnownExtension::ExtendedKeyUsage => "extKeyUsage",
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.oid() == *oid)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.name() == name)
    }

    /// Encodes a JSON value into the extension's DER value.
    pub fn encode(self, value: &Value) -> Result<Vec<u8>> {
        match self {
            WellKnownExtension::SubjectKeyIdentifier => encode_json::<SubjectKeyIdentifier>(value),
            WellKnownExtension::KeyUsage => encode_json::<KeyUsage>(value),
            WellKnownExtension::SubjectAltName => encode_json::<SubjectAltName>(value),
            WellKnownExtension::BasicConstraints => encode_json::<BasicConstraints>(value),
            WellKnownExtension::ExtendedKeyUsage => encode_json::<ExtendedKeyUsage>(value),
        }
    }

    /// Decodes the extension's DER value into its JSON form.
    pub fn decode(self, der: &[u8]) -> Result<Value> {
        match self {
            WellKnownExtension::SubjectKeyIdentifier => decode_json::<SubjectKeyIdentifier>(der),
            WellKnownExtension::KeyUsage => decode_json::<KeyUsage>(der),
            WellKnownExtension::SubjectAltName => decode_json::<SubjectAltName>(der),
            WellKnownExtension::BasicConstraints => decode_json::<BasicConstraints>(der),
            WellKnownExtension::ExtendedKeyUsage => decode_json::<ExtendedKeyUsage>(der),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_extended_key_usage_encoding_decoding() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.usage, decoded.usage);
    }

    #[test]
    fn test_subject_key_identifier_hex() {
        let ski: SubjectKeyIdentifier = serde_json::from_value(json!("0a:FF:10")).unwrap();
        assert_eq!(ski.key_identifier, vec![0x0a, 0xff, 0x10]);
        assert_eq!(serde_json::to_value(&ski).unwrap(), json!("0aff10"));

        assert!(serde_json::from_value::<SubjectKeyIdentifier>(json!("abc")).is_err());
    }

    #[test]
    fn test_well_known_json_forms() {
        let der = WellKnownExtension::BasicConstraints
            .encode(&json!({"cA": true, "pathLenConstraint": 0}))
            .unwrap();
        assert_eq!(
            WellKnownExtension::BasicConstraints.decode(&der).unwrap(),
            json!({"cA": true, "pathLenConstraint": 0})
        );

        let der = WellKnownExtension::KeyUsage
            .encode(&json!(["keyCertSign", "digitalSignature"]))
            .unwrap();
        assert_eq!(
            WellKnownExtension::KeyUsage.decode(&der).unwrap(),
            json!(["digitalSignature", "keyCertSign"])
        );

        let der = WellKnownExtension::ExtendedKeyUsage
            .encode(&json!(["serverAuth", "ocspSigning"]))
            .unwrap();
        assert_eq!(
            WellKnownExtension::ExtendedKeyUsage.decode(&der).unwrap(),
            json!(["serverAuth", "ocspSigning"])
        );

        let der = WellKnownExtension::SubjectAltName
            .encode(&json!(["example.com"]))
            .unwrap();
        assert_eq!(
            SubjectAltName::from_x509_extension_value(&der).unwrap().names,
            vec!["example.com".to_string()]
        );
    }

    #[test]
    fn test_well_known_rejects_bad_json() {
        let err = WellKnownExtension::KeyUsage
            .encode(&json!(["flying"]))
            .unwrap_err();
        assert!(matches!(err, CosignError::InvalidInput(_)));
    }

    #[test]
    fn test_well_known_lookup() {
        for known in WellKnownExtension::ALL {
            assert_eq!(WellKnownExtension::from_oid(&known.oid()), Some(known));
            assert_eq!(WellKnownExtension::from_name(known.name()), Some(known));
        }
        assert_eq!(
            WellKnownExtension::from_name("extKeyUsage"),
            Some(WellKnownExtension::ExtendedKeyUsage)
        );
    }
}

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{
    Any, GeneralizedTime, Ia5StringRef, PrintableStringRef, SetOfVec, UtcTime, Utf8StringRef,
};
use der::{DateTime, Tag, Tagged};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::time::Time;

use super::extensions::ToAndFromX509Extension;
use crate::error::{CosignError, Result};

const COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Distinguished name parameters for building an X.509 certificate.
///
/// This struct represents the subject or issuer name in a certificate. In
/// JSON the attributes use their X.520 names (`commonName`, `countryName`,
/// ...) or the short forms (`CN`, `C`, `ST`, `L`, `O`, `OU`).
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
/// * `email_address` - The PKCS#9 email address.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistinguishedName {
    #[serde(rename = "commonName", alias = "CN", skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    #[serde(rename = "countryName", alias = "C", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(
        rename = "stateOrProvinceName",
        alias = "ST",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<String>,
    #[serde(rename = "localityName", alias = "L", skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(
        rename = "organizationName",
        alias = "O",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization: Option<String>,
    #[serde(
        rename = "organizationalUnitName",
        alias = "OU",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_unit: Option<String>,
    #[serde(rename = "emailAddress", skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

fn attribute(oid: ObjectIdentifier, value: Any) -> Result<RelativeDistinguishedName> {
    let atv = AttributeTypeAndValue { oid, value };
    let set = SetOfVec::try_from(vec![atv])?;
    Ok(RelativeDistinguishedName(set))
}

fn invalid_attribute(name: &str, e: der::Error) -> CosignError {
    CosignError::InvalidInput(format!("{name} cannot be encoded: {e}"))
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509-compatible format.
    ///
    /// Attributes are written in the order C, ST, L, O, OU, CN, emailAddress
    /// and absent attributes are skipped. The country is a PrintableString,
    /// the email address an IA5String and everything else a UTF8String.
    pub fn as_x509_name(&self) -> Result<Name> {
        let utf8 = |name: &str, value: &str| -> Result<Any> {
            let value = Utf8StringRef::new(value).map_err(|e| invalid_attribute(name, e))?;
            Any::encode_from(&value).map_err(|e| invalid_attribute(name, e))
        };

        let mut rdns = Vec::new();
        if let Some(country) = &self.country {
            let value = PrintableStringRef::new(country)
                .map_err(|e| invalid_attribute("countryName", e))?;
            let value = Any::encode_from(&value).map_err(|e| invalid_attribute("countryName", e))?;
            rdns.push(attribute(COUNTRY, value)?);
        }
        if let Some(state) = &self.state {
            rdns.push(attribute(STATE, utf8("stateOrProvinceName", state)?)?);
        }
        if let Some(locality) = &self.locality {
            rdns.push(attribute(LOCALITY, utf8("localityName", locality)?)?);
        }
        if let Some(organization) = &self.organization {
            rdns.push(attribute(ORGANIZATION, utf8("organizationName", organization)?)?);
        }
        if let Some(unit) = &self.organization_unit {
            rdns.push(attribute(ORGANIZATION_UNIT, utf8("organizationalUnitName", unit)?)?);
        }
        if let Some(common_name) = &self.common_name {
            rdns.push(attribute(COMMON_NAME, utf8("commonName", common_name)?)?);
        }
        if let Some(email) = &self.email_address {
            let value =
                Ia5StringRef::new(email).map_err(|e| invalid_attribute("emailAddress", e))?;
            let value =
                Any::encode_from(&value).map_err(|e| invalid_attribute("emailAddress", e))?;
            rdns.push(attribute(EMAIL_ADDRESS, value)?);
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than the seven known ones are ignored, and so are
    /// values that are not a string type.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(&attr.value) else {
                    continue;
                };
                let slot = match attr.oid {
                    COUNTRY => &mut dn.country,
                    STATE => &mut dn.state,
                    LOCALITY => &mut dn.locality,
                    ORGANIZATION => &mut dn.organization,
                    ORGANIZATION_UNIT => &mut dn.organization_unit,
                    COMMON_NAME => &mut dn.common_name,
                    EMAIL_ADDRESS => &mut dn.email_address,
                    _ => continue,
                };
                *slot = Some(value);
            }
        }
        dn
    }
}

fn attribute_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String | Tag::TeletexString => {
            String::from_utf8(value.value().to_vec()).ok()
        }
        _ => None,
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of hours.
    pub fn for_hours(hours: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::hours(hours),
        }
    }

    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }

    pub fn from_x509_validity(validity: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: validity.not_before.to_system_time().into(),
            not_after: validity.not_after.to_system_time().into(),
        }
    }
}

/// RFC 5280 section 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050.
///
/// DER times start at 1970; earlier instants are rejected.
fn to_x509_time(time: OffsetDateTime) -> Result<Time> {
    let invalid = |reason: String| CosignError::InvalidInput(format!("time {time} {reason}"));
    let utc = time.to_offset(UtcOffset::UTC);
    let year = u16::try_from(utc.year())
        .ok()
        .filter(|year| *year >= 1970)
        .ok_or_else(|| invalid("is before 1970 and cannot be encoded".to_string()))?;
    let datetime = DateTime::new(
        year,
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second(),
    )
    .map_err(|e| invalid(format!("cannot be encoded: {e}")))?;

    if year < 2050 {
        UtcTime::from_date_time(datetime)
            .map(Time::UtcTime)
            .map_err(|e| invalid(format!("cannot be encoded: {e}")))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(datetime)))
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn to_x509_extension(&self) -> Result<Extension> {
        Ok(Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }

    pub fn from_x509_extension(extension: &Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }
}

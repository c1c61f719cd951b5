//! JSON values and their DER encoding under a declared extension shape.
//!
//! An [`ExtensionShape`] is the validated form of a declaration's `type`.
//! Encoding consumes a [`serde_json::Value`] and produces the DER bytes that go
//! inside the extension's OCTET STRING; decoding reverses it. The free-form
//! [`ExtensionShape::Any`] shape maps JSON to DER as follows:
//!
//! | JSON            | DER                                                  |
//! |-----------------|------------------------------------------------------|
//! | `null`          | NULL                                                 |
//! | boolean         | BOOLEAN                                              |
//! | integer         | INTEGER                                              |
//! | other number    | `[1]` primitive, the number's decimal text           |
//! | string          | UTF8String                                           |
//! | array           | SEQUENCE of the elements                             |
//! | object          | `[0]` constructed, SEQUENCE { UTF8String, value } per member |
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use der::asn1::{
    Any, Ia5String, Ia5StringRef, Null, OctetString, OctetStringRef, Uint, Utf8StringRef,
};
use der::{Decode, Encode, Reader, SliceReader, Tag, TagNumber, Tagged};
use rsa::BigUint;
use serde_json::{Map, Number, Value};

use crate::error::{CosignError, Result};

const OBJECT_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};
const REAL_TAG: Tag = Tag::ContextSpecific {
    constructed: false,
    number: TagNumber::N1,
};

/// The ASN.1 structure of an extension value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionShape {
    Integer,
    Boolean,
    Utf8String,
    Ia5String,
    /// JSON form is base64 text.
    OctetString,
    Null,
    Any,
    Sequence(Vec<FieldShape>),
    SequenceOf(Box<ExtensionShape>),
}

/// A named member of a SEQUENCE shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    pub name: String,
    pub shape: ExtensionShape,
    pub optional: bool,
}

impl fmt::Display for ExtensionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionShape::Integer => f.write_str("INTEGER"),
            ExtensionShape::Boolean => f.write_str("BOOLEAN"),
            ExtensionShape::Utf8String => f.write_str("UTF8String"),
            ExtensionShape::Ia5String => f.write_str("IA5String"),
            ExtensionShape::OctetString => f.write_str("OCTET STRING"),
            ExtensionShape::Null => f.write_str("NULL"),
            ExtensionShape::Any => f.write_str("ANY"),
            ExtensionShape::Sequence(_) => f.write_str("SEQUENCE"),
            ExtensionShape::SequenceOf(inner) => write!(f, "SEQUENCE OF {inner}"),
        }
    }
}

fn mismatch(shape: &ExtensionShape, value: &Value) -> CosignError {
    CosignError::InvalidInput(format!("expected a {shape} value, got {value}"))
}

fn wrap(tag: Tag, content: Vec<u8>) -> Result<Vec<u8>> {
    Ok(Any::new(tag, content)?.to_der()?)
}

fn read_elements(content: &[u8]) -> Result<Vec<Any>> {
    let mut reader = SliceReader::new(content)?;
    let mut elements = Vec::new();
    while !reader.is_finished() {
        elements.push(Any::decode(&mut reader)?);
    }
    Ok(elements)
}

fn expect_tag(any: &Any, tag: Tag) -> Result<()> {
    if any.tag() == tag {
        Ok(())
    } else {
        Err(CosignError::DecodingError(format!(
            "expected {tag}, found {}",
            any.tag()
        )))
    }
}

fn encode_integer(value: &Value) -> Option<Result<Vec<u8>>> {
    if let Some(i) = value.as_i64() {
        return Some(i.to_der().map_err(Into::into));
    }
    if let Some(u) = value.as_u64() {
        return Some(u.to_der().map_err(Into::into));
    }
    // Integers beyond 64 bits travel as decimal strings.
    let digits = value.as_str()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let big = BigUint::parse_bytes(digits.as_bytes(), 10)?;
    Some(
        Uint::new(&big.to_bytes_be())
            .and_then(|uint| uint.to_der())
            .map_err(Into::into),
    )
}

fn decode_integer(any: &Any) -> Result<Value> {
    expect_tag(any, Tag::Integer)?;
    if let Ok(i) = any.decode_as::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = any.decode_as::<u64>() {
        return Ok(Value::from(u));
    }
    let uint = any.decode_as::<Uint>()?;
    Ok(Value::String(
        BigUint::from_bytes_be(uint.as_bytes()).to_str_radix(10),
    ))
}

impl ExtensionShape {
    /// The tag every encoding of this shape starts with; `None` for ANY.
    pub(crate) fn expected_tag(&self) -> Option<Tag> {
        match self {
            ExtensionShape::Integer => Some(Tag::Integer),
            ExtensionShape::Boolean => Some(Tag::Boolean),
            ExtensionShape::Utf8String => Some(Tag::Utf8String),
            ExtensionShape::Ia5String => Some(Tag::Ia5String),
            ExtensionShape::OctetString => Some(Tag::OctetString),
            ExtensionShape::Null => Some(Tag::Null),
            ExtensionShape::Any => None,
            ExtensionShape::Sequence(_) | ExtensionShape::SequenceOf(_) => Some(Tag::Sequence),
        }
    }

    /// Encodes `value` into DER according to this shape.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            ExtensionShape::Integer => {
                encode_integer(value).unwrap_or_else(|| Err(mismatch(self, value)))
            }
            ExtensionShape::Boolean => {
                let b = value.as_bool().ok_or_else(|| mismatch(self, value))?;
                Ok(b.to_der()?)
            }
            ExtensionShape::Utf8String => {
                let s = value.as_str().ok_or_else(|| mismatch(self, value))?;
                Ok(Utf8StringRef::new(s)?.to_der()?)
            }
            ExtensionShape::Ia5String => {
                let s = value.as_str().ok_or_else(|| mismatch(self, value))?;
                let ia5 = Ia5StringRef::new(s)
                    .map_err(|e| CosignError::InvalidInput(format!("{s:?} is not IA5: {e}")))?;
                Ok(ia5.to_der()?)
            }
            ExtensionShape::OctetString => {
                let s = value.as_str().ok_or_else(|| mismatch(self, value))?;
                let bytes = STANDARD
                    .decode(s)
                    .map_err(|e| CosignError::InvalidInput(format!("invalid base64: {e}")))?;
                Ok(OctetStringRef::new(&bytes)?.to_der()?)
            }
            ExtensionShape::Null => {
                if !value.is_null() {
                    return Err(mismatch(self, value));
                }
                Ok(Null.to_der()?)
            }
            ExtensionShape::Any => encode_any_value(value),
            ExtensionShape::Sequence(fields) => {
                let members = value.as_object().ok_or_else(|| mismatch(self, value))?;
                if let Some(extra) = members
                    .keys()
                    .find(|key| !fields.iter().any(|field| &field.name == *key))
                {
                    return Err(CosignError::InvalidInput(format!(
                        "field \"{extra}\" is not part of the declared SEQUENCE"
                    )));
                }
                let mut content = Vec::new();
                for field in fields {
                    match members.get(&field.name) {
                        Some(Value::Null)
                            if field.optional && field.shape != ExtensionShape::Null => {}
                        Some(member) => content.extend(field.shape.encode(member)?),
                        None if field.optional => {}
                        None => {
                            return Err(CosignError::InvalidInput(format!(
                                "missing required field \"{}\"",
                                field.name
                            )));
                        }
                    }
                }
                wrap(Tag::Sequence, content)
            }
            ExtensionShape::SequenceOf(element) => {
                let items = value.as_array().ok_or_else(|| mismatch(self, value))?;
                let mut content = Vec::new();
                for item in items {
                    content.extend(element.encode(item)?);
                }
                wrap(Tag::Sequence, content)
            }
        }
    }

    /// Decodes a complete DER value according to this shape.
    pub fn decode(&self, der: &[u8]) -> Result<Value> {
        let any = Any::from_der(der)?;
        self.decode_any(&any)
    }

    fn decode_any(&self, any: &Any) -> Result<Value> {
        match self {
            ExtensionShape::Integer => decode_integer(any),
            ExtensionShape::Boolean => Ok(Value::Bool(any.decode_as::<bool>()?)),
            ExtensionShape::Utf8String => Ok(Value::String(any.decode_as::<String>()?)),
            ExtensionShape::Ia5String => Ok(Value::String(
                any.decode_as::<Ia5String>()?.to_string(),
            )),
            ExtensionShape::OctetString => {
                let octets = any.decode_as::<OctetString>()?;
                Ok(Value::String(STANDARD.encode(octets.as_bytes())))
            }
            ExtensionShape::Null => {
                expect_tag(any, Tag::Null)?;
                Ok(Value::Null)
            }
            ExtensionShape::Any => decode_any_value(any),
            ExtensionShape::Sequence(fields) => {
                expect_tag(any, Tag::Sequence)?;
                let mut elements = read_elements(any.value())?.into_iter().peekable();
                let mut members = Map::new();
                for field in fields {
                    let present = elements.peek().is_some_and(|element| {
                        field
                            .shape
                            .expected_tag()
                            .is_none_or(|tag| tag == element.tag())
                    });
                    if present {
                        if let Some(element) = elements.next() {
                            members.insert(field.name.clone(), field.shape.decode_any(&element)?);
                        }
                    } else if !field.optional {
                        return Err(CosignError::DecodingError(format!(
                            "missing required field \"{}\"",
                            field.name
                        )));
                    }
                }
                if elements.next().is_some() {
                    return Err(CosignError::DecodingError(
                        "trailing elements after the declared SEQUENCE fields".to_string(),
                    ));
                }
                Ok(Value::Object(members))
            }
            ExtensionShape::SequenceOf(element) => {
                expect_tag(any, Tag::Sequence)?;
                read_elements(any.value())?
                    .iter()
                    .map(|item| element.decode_any(item))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
        }
    }
}

/// Encodes an arbitrary JSON value with the free-form mapping.
pub fn encode_any_value(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Null => Ok(Null.to_der()?),
        Value::Bool(b) => Ok(b.to_der()?),
        Value::Number(n) => match encode_integer(value) {
            Some(encoded) => encoded,
            None => wrap(REAL_TAG, n.to_string().into_bytes()),
        },
        Value::String(s) => Ok(Utf8StringRef::new(s)?.to_der()?),
        Value::Array(items) => {
            let mut content = Vec::new();
            for item in items {
                content.extend(encode_any_value(item)?);
            }
            wrap(Tag::Sequence, content)
        }
        Value::Object(members) => {
            let mut content = Vec::new();
            for (key, member) in members {
                let mut pair = Utf8StringRef::new(key)?.to_der()?;
                pair.extend(encode_any_value(member)?);
                content.extend(wrap(Tag::Sequence, pair)?);
            }
            wrap(OBJECT_TAG, content)
        }
    }
}

/// Decodes a DER element with the free-form mapping.
///
/// Tags the mapping never produces are an error, except PrintableString and
/// IA5String, which decode as strings.
pub fn decode_any_value(any: &Any) -> Result<Value> {
    match any.tag() {
        Tag::Null => Ok(Value::Null),
        Tag::Boolean => Ok(Value::Bool(any.decode_as::<bool>()?)),
        Tag::Integer => decode_integer(any),
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            String::from_utf8(any.value().to_vec())
                .map(Value::String)
                .map_err(|e| CosignError::DecodingError(e.to_string()))
        }
        Tag::Sequence => read_elements(any.value())?
            .iter()
            .map(decode_any_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        tag if tag == OBJECT_TAG => {
            let mut members = Map::new();
            for pair in read_elements(any.value())? {
                expect_tag(&pair, Tag::Sequence)?;
                let [key, member]: [Any; 2] = read_elements(pair.value())?
                    .try_into()
                    .map_err(|_| {
                        CosignError::DecodingError("object member is not a key/value pair".into())
                    })?;
                let key = key.decode_as::<String>()?;
                members.insert(key, decode_any_value(&member)?);
            }
            Ok(Value::Object(members))
        }
        tag if tag == REAL_TAG => {
            let text = std::str::from_utf8(any.value())
                .map_err(|e| CosignError::DecodingError(e.to_string()))?;
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| CosignError::DecodingError(format!("invalid number {text:?}")))
        }
        other => Err(CosignError::DecodingError(format!(
            "{other} has no JSON mapping"
        ))),
    }
}

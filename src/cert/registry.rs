//! Request-scoped table of named extension shapes.
//!
//! Callers declare custom extensions by name, dotted OID and ASN.1 shape.
//! The registry maps names to OIDs, and OIDs to shapes, for the lifetime of a
//! single request. Identifiers resolve against declared names first, then as a
//! dotted OID, then against the well-known extension names.
use std::collections::{BTreeMap, BTreeSet};

use const_oid::ObjectIdentifier;
use const_oid::db::DB;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::extensions::WellKnownExtension;
use super::value::{ExtensionShape, FieldShape};
use crate::error::{CosignError, Result};

/// A declaration as it arrives in a request:
/// `{"name": "myExt", "oid": "1.2.3.4", "type": "ANY"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDeclaration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub oid: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeDescriptor>,
}

/// Unvalidated shape description from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeDescriptor {
    /// `"INTEGER"`, `"BOOLEAN"`, `"UTF8String"`, `"IA5String"`,
    /// `"OCTET STRING"`, `"NULL"` or `"ANY"`.
    Named(String),
    Sequence {
        #[serde(rename = "SEQUENCE")]
        fields: Vec<FieldDescriptor>,
    },
    SequenceOf {
        #[serde(rename = "SEQUENCE OF")]
        element: Box<ShapeDescriptor>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub shape: Option<ShapeDescriptor>,
    #[serde(default)]
    pub optional: bool,
}

fn declaration_error(message: impl Into<String>) -> CosignError {
    CosignError::DeclarationError(message.into())
}

/// An optional field is recognized on decoding by its tag alone, so that tag
/// must differ from every field that could come next in its place.
fn check_optional_fields(fields: &[FieldShape]) -> Result<()> {
    for (index, field) in fields.iter().enumerate().filter(|(_, field)| field.optional) {
        let mut candidates = Vec::new();
        for next in &fields[index + 1..] {
            candidates.push(next);
            if !next.optional {
                break;
            }
        }
        let tag = field.shape.expected_tag();
        if let Some(clash) = candidates.iter().find(|next| {
            let next_tag = next.shape.expected_tag();
            tag.is_none() || next_tag.is_none() || next_tag == tag
        }) {
            return Err(declaration_error(format!(
                "optional field \"{}\" cannot be told apart from \"{}\"",
                field.name, clash.name
            )));
        }
    }
    Ok(())
}

impl TryFrom<&ShapeDescriptor> for ExtensionShape {
    type Error = CosignError;

    fn try_from(descriptor: &ShapeDescriptor) -> Result<Self> {
        match descriptor {
            ShapeDescriptor::Named(name) => {
                let normalized: String = name
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '_')
                    .collect::<String>()
                    .to_ascii_uppercase();
                match normalized.as_str() {
                    "INTEGER" | "INT" => Ok(ExtensionShape::Integer),
                    "BOOLEAN" | "BOOL" => Ok(ExtensionShape::Boolean),
                    "UTF8STRING" | "UTF8" => Ok(ExtensionShape::Utf8String),
                    "IA5STRING" | "IA5" => Ok(ExtensionShape::Ia5String),
                    "OCTETSTRING" => Ok(ExtensionShape::OctetString),
                    "NULL" => Ok(ExtensionShape::Null),
                    "ANY" => Ok(ExtensionShape::Any),
                    _ => Err(declaration_error(format!("unknown type \"{name}\""))),
                }
            }
            ShapeDescriptor::Sequence { fields } => {
                let mut seen = BTreeSet::new();
                let fields = fields
                    .iter()
                    .map(|field| {
                        if field.name.is_empty() {
                            return Err(declaration_error("SEQUENCE field without a name"));
                        }
                        if !seen.insert(field.name.as_str()) {
                            return Err(declaration_error(format!(
                                "duplicate SEQUENCE field \"{}\"",
                                field.name
                            )));
                        }
                        let shape = field.shape.as_ref().ok_or_else(|| {
                            declaration_error(format!("field \"{}\" has no type", field.name))
                        })?;
                        Ok(FieldShape {
                            name: field.name.clone(),
                            shape: ExtensionShape::try_from(shape)?,
                            optional: field.optional,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                check_optional_fields(&fields)?;
                Ok(ExtensionShape::Sequence(fields))
            }
            ShapeDescriptor::SequenceOf { element } => Ok(ExtensionShape::SequenceOf(Box::new(
                ExtensionShape::try_from(element.as_ref())?,
            ))),
        }
    }
}

/// How an extension value is presented to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionData {
    /// Decoded through a declared or well-known shape.
    Value(Value),
    /// No shape applies, or the bytes do not match it.
    Raw(Vec<u8>),
}

impl ExtensionData {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ExtensionData::Value(value) => Some(value),
            ExtensionData::Raw(_) => None,
        }
    }
}

/// Name and shape table for one request.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    names: BTreeMap<String, ObjectIdentifier>,
    shapes: BTreeMap<ObjectIdentifier, ExtensionShape>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a batch of declarations.
    ///
    /// Every declaration is validated before any is committed, so a malformed
    /// entry leaves the registry unchanged. A later declaration for the same
    /// name or OID replaces the earlier one.
    #[instrument(skip_all, fields(declarations = declarations.len()))]
    pub fn register(&mut self, declarations: &[ExtensionDeclaration]) -> Result<()> {
        let validated = declarations
            .iter()
            .map(|declaration| {
                if declaration.name.is_empty() {
                    return Err(declaration_error(format!(
                        "declaration for \"{}\" has no name",
                        declaration.oid
                    )));
                }
                let oid = ObjectIdentifier::new(&declaration.oid).map_err(|e| {
                    declaration_error(format!(
                        "\"{}\" has an invalid OID \"{}\": {e}",
                        declaration.name, declaration.oid
                    ))
                })?;
                let shape = declaration
                    .shape
                    .as_ref()
                    .ok_or_else(|| {
                        declaration_error(format!("\"{}\" has no type", declaration.name))
                    })
                    .and_then(ExtensionShape::try_from)?;
                Ok((declaration.name.clone(), oid, shape))
            })
            .collect::<Result<Vec<_>>>()?;

        for (name, oid, shape) in validated {
            debug!(
                extension.name = %name,
                extension.oid = %oid,
                extension.shape = %shape,
                "registered extension"
            );
            self.names.insert(name, oid);
            self.shapes.insert(oid, shape);
        }
        Ok(())
    }

    /// Resolves a declared name, a dotted OID or a well-known name.
    pub fn resolve(&self, identifier: &str) -> Result<ObjectIdentifier> {
        if let Some(oid) = self.names.get(identifier) {
            return Ok(*oid);
        }
        if let Ok(oid) = ObjectIdentifier::new(identifier) {
            return Ok(oid);
        }
        if let Some(known) = WellKnownExtension::from_name(identifier) {
            return Ok(known.oid());
        }
        DB.by_name(identifier).copied().ok_or_else(|| {
            CosignError::UnregisteredExtension(format!("\"{identifier}\""))
        })
    }

    /// The declared name for `oid`, else its well-known name.
    pub fn name_of(&self, oid: &ObjectIdentifier) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, registered)| *registered == oid)
            .map(|(name, _)| name.as_str())
            .or_else(|| WellKnownExtension::from_oid(oid).map(WellKnownExtension::name))
            .or_else(|| DB.by_oid(oid))
    }

    pub fn shape(&self, oid: &ObjectIdentifier) -> Option<&ExtensionShape> {
        self.shapes.get(oid)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Encodes a JSON value for the extension `oid`.
    ///
    /// Declared shapes take precedence over the built-in codecs.
    pub fn encode(&self, oid: &ObjectIdentifier, value: &Value) -> Result<Vec<u8>> {
        if let Some(shape) = self.shapes.get(oid) {
            return shape.encode(value);
        }
        match WellKnownExtension::from_oid(oid) {
            Some(known) => known.encode(value),
            None => Err(CosignError::UnregisteredExtension(oid.to_string())),
        }
    }

    /// Decodes an extension value. Never fails: bytes that no shape accepts
    /// come back as [`ExtensionData::Raw`].
    pub fn decode(&self, oid: &ObjectIdentifier, der: &[u8]) -> ExtensionData {
        let decoded = match (self.shapes.get(oid), WellKnownExtension::from_oid(oid)) {
            (Some(shape), _) => shape.decode(der),
            (None, Some(known)) => known.decode(der),
            (None, None) => return ExtensionData::Raw(der.to_vec()),
        };
        match decoded {
            Ok(value) => ExtensionData::Value(value),
            Err(e) => {
                debug!(extension.oid = %oid, error = %e, "extension value kept raw");
                ExtensionData::Raw(der.to_vec())
            }
        }
    }
}

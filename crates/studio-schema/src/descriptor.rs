//! # Schema Descriptors
//!
//! The JSON-safe projection of a [`SchemaNode`](crate::SchemaNode). Keys and
//! tag names match what rendering clients already consume (`typeName`,
//! `innerType`, `ZodString`, ...). Every field is optional and omitted from
//! the serialized form when the source node did not carry it.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::node::{LengthBound, UnknownKeys};

/// Tag identifying the kind of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    #[serde(rename = "ZodString")]
    String,
    #[serde(rename = "ZodNumber")]
    Number,
    #[serde(rename = "ZodNaN")]
    NaN,
    #[serde(rename = "ZodBigInt")]
    BigInt,
    #[serde(rename = "ZodBoolean")]
    Boolean,
    #[serde(rename = "ZodDate")]
    Date,
    #[serde(rename = "ZodSymbol")]
    Symbol,
    #[serde(rename = "ZodUndefined")]
    Undefined,
    #[serde(rename = "ZodNull")]
    Null,
    #[serde(rename = "ZodAny")]
    Any,
    #[serde(rename = "ZodUnknown")]
    Unknown,
    #[serde(rename = "ZodNever")]
    Never,
    #[serde(rename = "ZodVoid")]
    Void,
    #[serde(rename = "ZodArray")]
    Array,
    #[serde(rename = "ZodObject")]
    Object,
    #[serde(rename = "ZodUnion")]
    Union,
    #[serde(rename = "ZodDiscriminatedUnion")]
    DiscriminatedUnion,
    #[serde(rename = "ZodIntersection")]
    Intersection,
    #[serde(rename = "ZodTuple")]
    Tuple,
    #[serde(rename = "ZodRecord")]
    Record,
    #[serde(rename = "ZodMap")]
    Map,
    #[serde(rename = "ZodSet")]
    Set,
    #[serde(rename = "ZodLiteral")]
    Literal,
    #[serde(rename = "ZodEnum")]
    Enum,
    #[serde(rename = "ZodNativeEnum")]
    NativeEnum,
    #[serde(rename = "ZodEffects")]
    Effects,
    #[serde(rename = "ZodOptional")]
    Optional,
    #[serde(rename = "ZodNullable")]
    Nullable,
    #[serde(rename = "ZodDefault")]
    Default,
    #[serde(rename = "ZodCatch")]
    Catch,
    #[serde(rename = "ZodReadonly")]
    Readonly,
    #[serde(rename = "ZodPipeline")]
    Pipeline,
    #[serde(rename = "StudioUnsupportedType")]
    Unsupported,
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "ZodString",
            Self::Number => "ZodNumber",
            Self::NaN => "ZodNaN",
            Self::BigInt => "ZodBigInt",
            Self::Boolean => "ZodBoolean",
            Self::Date => "ZodDate",
            Self::Symbol => "ZodSymbol",
            Self::Undefined => "ZodUndefined",
            Self::Null => "ZodNull",
            Self::Any => "ZodAny",
            Self::Unknown => "ZodUnknown",
            Self::Never => "ZodNever",
            Self::Void => "ZodVoid",
            Self::Array => "ZodArray",
            Self::Object => "ZodObject",
            Self::Union => "ZodUnion",
            Self::DiscriminatedUnion => "ZodDiscriminatedUnion",
            Self::Intersection => "ZodIntersection",
            Self::Tuple => "ZodTuple",
            Self::Record => "ZodRecord",
            Self::Map => "ZodMap",
            Self::Set => "ZodSet",
            Self::Literal => "ZodLiteral",
            Self::Enum => "ZodEnum",
            Self::NativeEnum => "ZodNativeEnum",
            Self::Effects => "ZodEffects",
            Self::Optional => "ZodOptional",
            Self::Nullable => "ZodNullable",
            Self::Default => "ZodDefault",
            Self::Catch => "ZodCatch",
            Self::Readonly => "ZodReadonly",
            Self::Pipeline => "ZodPipeline",
            Self::Unsupported => "StudioUnsupportedType",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled check: kind, parameters and message, predicate dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckDescriptor {
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// JSON-safe descriptor of one schema node.
///
/// Bounds use `Option<Option<_>>`: the outer level is field presence, the
/// inner level is the declared value (`null` when unbounded).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    pub type_name: TypeName,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<CheckDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coerce: Option<bool>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_length: Option<Option<LengthBound>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Option<LengthBound>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Option<LengthBound>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<Option<LengthBound>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<Option<LengthBound>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<IndexMap<String, SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchall: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_keys: Option<UnknownKeys>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<SchemaDescriptor>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<Box<SchemaDescriptor>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<Box<SchemaDescriptor>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_type: Option<Box<SchemaDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub input: Option<Box<SchemaDescriptor>>,
}

impl SchemaDescriptor {
    /// A descriptor carrying only its tag.
    pub fn bare(type_name: TypeName) -> Self {
        Self {
            type_name,
            checks: None,
            coerce: None,
            element: None,
            exact_length: None,
            min_length: None,
            max_length: None,
            min_size: None,
            max_size: None,
            shape: None,
            catchall: None,
            unknown_keys: None,
            options: None,
            discriminator: None,
            left: None,
            right: None,
            items: None,
            rest: None,
            value_type: None,
            key_type: None,
            value: None,
            values: None,
            schema: None,
            inner_type: None,
            default_value: None,
            input: None,
        }
    }

    /// Whether this subtree was truncated because its kind is unsupported.
    pub fn is_unsupported(&self) -> bool {
        self.type_name == TypeName::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_descriptor_serializes_to_tag_only() {
        let json = serde_json::to_value(SchemaDescriptor::bare(TypeName::Unsupported)).unwrap();
        assert_eq!(json, serde_json::json!({"typeName": "StudioUnsupportedType"}));
    }

    #[test]
    fn type_name_serde_matches_as_str() {
        for t in [TypeName::String, TypeName::DiscriminatedUnion, TypeName::Pipeline] {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, Value::String(t.as_str().to_string()));
        }
    }

    #[test]
    fn unbounded_length_serializes_as_null() {
        let mut d = SchemaDescriptor::bare(TypeName::Array);
        d.exact_length = Some(None);
        d.min_length = Some(Some(LengthBound::new(2)));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["exactLength"], Value::Null);
        assert_eq!(json["minLength"]["value"], 2);
        assert!(json.get("maxLength").is_none());
    }

    #[test]
    fn check_params_are_flattened() {
        let mut params = Map::new();
        params.insert("value".into(), Value::from(3));
        let check = CheckDescriptor {
            kind: "min".into(),
            params,
            message: Some("too short".into()),
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "min", "value": 3, "message": "too short"})
        );
    }
}

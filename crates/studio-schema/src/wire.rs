//! # Wire Decoding
//!
//! Decodes the JSON rendering of a validator definition (the `_def` record
//! a module loader dumps, keyed by `typeName`) into a [`SchemaNode`].
//!
//! Every required field is checked for presence and type. Unknown kind
//! names are not an error: they decode to
//! [`UnsupportedNode::Unrecognized`] so the compiler degrades them like any
//! other untraversable kind. Optional child fields that are `null` are
//! treated as absent.
//!
//! [`SchemaNode::from_wire`] stops at the first problem.
//! [`SchemaNode::from_wire_lenient`] replaces each undecodable node with
//! [`UnsupportedNode::Malformed`], keeps its siblings, and returns the
//! problems alongside the graph.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::node::{
    ArrayNode, Check, DefaultValue, EffectKind, LazySchema, LengthBound, ObjectNode, ScalarKind,
    ScalarNode, SchemaNode, SetNode, TupleNode, UnionNode, UnknownKeys, UnsupportedNode,
};

/// Errors decoding a schema node from its wire form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("schema node at {path} is not an object")]
    NotAnObject { path: String },

    #[error("schema node at {path} has no string `typeName`")]
    MissingTypeName { path: String },

    #[error("{type_name} node at {path} is missing required field `{field}`")]
    MissingField {
        path: String,
        type_name: String,
        field: &'static str,
    },

    #[error("field `{field}` of {type_name} node at {path} is invalid: expected {expected}")]
    InvalidField {
        path: String,
        type_name: String,
        field: &'static str,
        expected: &'static str,
    },
}

/// Result of a lenient decode.
#[derive(Debug)]
pub struct WireDecode {
    pub node: SchemaNode,
    /// One entry per node that was replaced, innermost first.
    pub problems: Vec<WireError>,
}

impl SchemaNode {
    /// Decode a schema node from its wire form.
    pub fn from_wire(value: &Value) -> Result<Self, WireError> {
        Decoder::default().decode(value)
    }

    /// Decode a schema node, degrading undecodable subtrees instead of
    /// failing.
    pub fn from_wire_lenient(value: &Value) -> WireDecode {
        let mut decoder = Decoder {
            lenient: true,
            ..Decoder::default()
        };
        let node = match decoder.decode_child(value) {
            Ok(node) => node,
            Err(error) => decoder.degrade(value, error),
        };
        WireDecode {
            node,
            problems: decoder.problems,
        }
    }
}

#[derive(Default)]
struct Decoder {
    path: Vec<String>,
    lenient: bool,
    problems: Vec<WireError>,
}

/// The definition record being decoded, with its kind name for errors.
struct Def<'v> {
    type_name: &'v str,
    fields: &'v Map<String, Value>,
}

impl Decoder {
    /// Decode a node that sits below a field boundary. In lenient mode a
    /// failure replaces just this node.
    fn decode_child(&mut self, value: &Value) -> Result<SchemaNode, WireError> {
        match self.decode(value) {
            Err(error) if self.lenient => Ok(self.degrade(value, error)),
            other => other,
        }
    }

    fn degrade(&mut self, value: &Value, error: WireError) -> SchemaNode {
        let kind = value
            .get("typeName")
            .and_then(Value::as_str)
            .unwrap_or("<untyped>");
        tracing::warn!(%error, kind, "schema node cannot be decoded, degrading it");
        self.problems.push(error);
        SchemaNode::Unsupported(UnsupportedNode::Malformed(kind.to_string()))
    }

    fn decode(&mut self, value: &Value) -> Result<SchemaNode, WireError> {
        let fields = value.as_object().ok_or_else(|| WireError::NotAnObject {
            path: self.current_path(),
        })?;
        let type_name = fields
            .get("typeName")
            .and_then(Value::as_str)
            .ok_or_else(|| WireError::MissingTypeName {
                path: self.current_path(),
            })?;
        let def = Def { type_name, fields };

        if let Some(kind) = scalar_kind(type_name) {
            return self.scalar(&def, kind);
        }

        let node = match type_name {
            "ZodArray" => SchemaNode::Array(ArrayNode {
                element: self.required_child(&def, "type")?,
                exact_length: self.bound(&def, "exactLength")?,
                min_length: self.bound(&def, "minLength")?,
                max_length: self.bound(&def, "maxLength")?,
            }),
            "ZodObject" => SchemaNode::Object(self.object(&def)?),
            "ZodUnion" => SchemaNode::Union(UnionNode {
                options: self.child_list(&def, "options")?,
                discriminator: None,
            }),
            "ZodDiscriminatedUnion" => SchemaNode::Union(UnionNode {
                options: self.child_list(&def, "options")?,
                discriminator: Some(self.required_str(&def, "discriminator")?.to_string()),
            }),
            "ZodIntersection" => SchemaNode::Intersection {
                left: self.required_child(&def, "left")?,
                right: self.required_child(&def, "right")?,
            },
            "ZodTuple" => SchemaNode::Tuple(TupleNode {
                items: self.child_list(&def, "items")?,
                rest: self.optional_child(&def, "rest")?,
            }),
            "ZodRecord" => SchemaNode::Record {
                key_type: self.required_child(&def, "keyType")?,
                value_type: self.required_child(&def, "valueType")?,
            },
            "ZodMap" => SchemaNode::Map {
                key_type: self.required_child(&def, "keyType")?,
                value_type: self.required_child(&def, "valueType")?,
            },
            "ZodSet" => SchemaNode::Set(SetNode {
                value_type: self.required_child(&def, "valueType")?,
                min_size: self.bound(&def, "minSize")?,
                max_size: self.bound(&def, "maxSize")?,
            }),
            "ZodLiteral" => SchemaNode::Literal(self.required(&def, "value")?.clone()),
            "ZodEnum" => {
                let values = self
                    .required(&def, "values")?
                    .as_array()
                    .ok_or_else(|| self.invalid(&def, "values", "an array"))?;
                SchemaNode::Enum(values.clone())
            }
            "ZodNativeEnum" => SchemaNode::NativeEnum(self.required(&def, "values")?.clone()),
            "ZodEffects" => SchemaNode::Effects {
                schema: self.required_child(&def, "schema")?,
                effect: effect_kind(def.fields.get("effect")),
            },
            "ZodOptional" => SchemaNode::Optional(self.required_child(&def, "innerType")?),
            "ZodNullable" => SchemaNode::Nullable(self.required_child(&def, "innerType")?),
            "ZodCatch" => SchemaNode::Catch(self.required_child(&def, "innerType")?),
            "ZodReadonly" => SchemaNode::Readonly(self.required_child(&def, "innerType")?),
            "ZodDefault" => SchemaNode::Default {
                inner: self.required_child(&def, "innerType")?,
                default: DefaultValue::Value(self.required(&def, "defaultValue")?.clone()),
            },
            "ZodPipeline" => SchemaNode::Pipeline {
                input: self.required_child(&def, "in")?,
                output: self.required_child(&def, "out")?,
            },
            "ZodFunction" => SchemaNode::Unsupported(UnsupportedNode::Function),
            "ZodLazy" => SchemaNode::Unsupported(UnsupportedNode::Lazy(LazySchema::opaque())),
            "ZodPromise" => SchemaNode::Unsupported(UnsupportedNode::Promise),
            "ZodBranded" => SchemaNode::Unsupported(UnsupportedNode::Branded),
            other => SchemaNode::Unsupported(UnsupportedNode::Unrecognized(other.to_string())),
        };
        Ok(node)
    }

    fn scalar(&mut self, def: &Def<'_>, kind: ScalarKind) -> Result<SchemaNode, WireError> {
        let checks = match def.fields.get("checks") {
            None | Some(Value::Null) => None,
            Some(Value::Array(entries)) => Some(
                entries
                    .iter()
                    .map(|entry| self.check(def, entry))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(self.invalid(def, "checks", "an array of checks")),
        };
        let coerce = match def.fields.get("coerce") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => return Err(self.invalid(def, "coerce", "a boolean")),
        };
        Ok(SchemaNode::Scalar(ScalarNode {
            kind,
            checks,
            coerce,
        }))
    }

    fn check(&self, def: &Def<'_>, entry: &Value) -> Result<Check, WireError> {
        let fields = entry
            .as_object()
            .ok_or_else(|| self.invalid(def, "checks", "an array of checks"))?;
        let kind = fields
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| self.invalid(def, "checks", "checks with a string `kind`"))?;
        let mut check = Check::new(kind);
        for (key, value) in fields {
            match key.as_str() {
                "kind" => {}
                "message" => check.message = value.as_str().map(str::to_string),
                _ => {
                    check.params.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(check)
    }

    fn object(&mut self, def: &Def<'_>) -> Result<ObjectNode, WireError> {
        let raw_shape = self
            .required(def, "shape")?
            .as_object()
            .ok_or_else(|| self.invalid(def, "shape", "an object"))?;
        let mut shape = IndexMap::with_capacity(raw_shape.len());
        for (key, field) in raw_shape {
            self.path.push(format!("shape.{key}"));
            let node = self.decode_child(field);
            self.path.pop();
            shape.insert(key.clone(), node?);
        }
        let unknown_keys = match def.fields.get("unknownKeys") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value::<UnknownKeys>(value.clone()).map_err(|_| {
                    self.invalid(def, "unknownKeys", "one of strip, strict, passthrough")
                })?,
            ),
        };
        Ok(ObjectNode {
            shape,
            unknown_keys,
            catchall: self.optional_child(def, "catchall")?,
        })
    }

    fn required<'v>(&self, def: &Def<'v>, field: &'static str) -> Result<&'v Value, WireError> {
        def.fields.get(field).ok_or_else(|| WireError::MissingField {
            path: self.current_path(),
            type_name: def.type_name.to_string(),
            field,
        })
    }

    fn required_str<'v>(&self, def: &Def<'v>, field: &'static str) -> Result<&'v str, WireError> {
        self.required(def, field)?
            .as_str()
            .ok_or_else(|| self.invalid(def, field, "a string"))
    }

    fn required_child(
        &mut self,
        def: &Def<'_>,
        field: &'static str,
    ) -> Result<Box<SchemaNode>, WireError> {
        let value = self.required(def, field)?;
        self.path.push(field.to_string());
        let node = self.decode_child(value);
        self.path.pop();
        node.map(Box::new)
    }

    fn optional_child(
        &mut self,
        def: &Def<'_>,
        field: &'static str,
    ) -> Result<Option<Box<SchemaNode>>, WireError> {
        match def.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.required_child(def, field).map(Some),
        }
    }

    fn child_list(
        &mut self,
        def: &Def<'_>,
        field: &'static str,
    ) -> Result<Vec<SchemaNode>, WireError> {
        let entries = self
            .required(def, field)?
            .as_array()
            .ok_or_else(|| self.invalid(def, field, "an array"))?;
        let mut nodes = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            self.path.push(format!("{field}.{i}"));
            let node = self.decode_child(entry);
            self.path.pop();
            nodes.push(node?);
        }
        Ok(nodes)
    }

    fn bound(
        &self,
        def: &Def<'_>,
        field: &'static str,
    ) -> Result<Option<LengthBound>, WireError> {
        match def.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value::<LengthBound>(value.clone())
                .map(Some)
                .map_err(|_| self.invalid(def, field, "null or {value, message?}")),
        }
    }

    fn invalid(&self, def: &Def<'_>, field: &'static str, expected: &'static str) -> WireError {
        WireError::InvalidField {
            path: self.current_path(),
            type_name: def.type_name.to_string(),
            field,
            expected,
        }
    }

    fn current_path(&self) -> String {
        std::iter::once("$")
            .chain(self.path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn scalar_kind(type_name: &str) -> Option<ScalarKind> {
    let kind = match type_name {
        "ZodString" => ScalarKind::String,
        "ZodNumber" => ScalarKind::Number,
        "ZodNaN" => ScalarKind::NaN,
        "ZodBigInt" => ScalarKind::BigInt,
        "ZodBoolean" => ScalarKind::Boolean,
        "ZodDate" => ScalarKind::Date,
        "ZodSymbol" => ScalarKind::Symbol,
        "ZodUndefined" => ScalarKind::Undefined,
        "ZodNull" => ScalarKind::Null,
        "ZodAny" => ScalarKind::Any,
        "ZodUnknown" => ScalarKind::Unknown,
        "ZodNever" => ScalarKind::Never,
        "ZodVoid" => ScalarKind::Void,
        _ => return None,
    };
    Some(kind)
}

fn effect_kind(effect: Option<&Value>) -> EffectKind {
    match effect
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
    {
        Some("transform") => EffectKind::Transform,
        Some("preprocess") => EffectKind::Preprocess,
        _ => EffectKind::Refinement,
    }
}

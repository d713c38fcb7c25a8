//! # Descriptor Compiler
//!
//! Turns a [`SchemaNode`] graph into a [`SchemaDescriptor`] tree.
//!
//! Compilation is total: every variant is handled by an exhaustive match,
//! and unsupported kinds are cut off at their own position without looking
//! inside them. Because a lazily evaluated node is never expanded, a
//! self-referential graph compiles in a single bounded pass.
//!
//! Each cut-off raises a non-fatal diagnostic: a `tracing` warning naming
//! the descriptor path, plus a [`Degradation`] entry in the
//! [`CompileReport`] for callers that want to surface it.

use indexmap::IndexMap;

use crate::descriptor::{CheckDescriptor, SchemaDescriptor, TypeName};
use crate::node::{Check, SchemaNode, UnsupportedNode};

/// One position where compilation emitted an unsupported descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    /// Dotted path from the root (`$`) to the truncated node.
    pub path: String,
    /// Source kind that could not be introspected.
    pub kind: String,
}

/// A compiled descriptor together with its diagnostics.
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub descriptor: SchemaDescriptor,
    pub degradations: Vec<Degradation>,
}

/// Compile a schema graph into its descriptor.
pub fn compile(node: &SchemaNode) -> SchemaDescriptor {
    compile_with_report(node).descriptor
}

/// Compile a schema graph and return the degradations alongside it.
pub fn compile_with_report(node: &SchemaNode) -> CompileReport {
    let mut compiler = Compiler::default();
    let descriptor = compiler.compile(node);
    CompileReport {
        descriptor,
        degradations: compiler.degradations,
    }
}

#[derive(Default)]
struct Compiler {
    path: Vec<String>,
    degradations: Vec<Degradation>,
}

impl Compiler {
    fn compile(&mut self, node: &SchemaNode) -> SchemaDescriptor {
        let mut out = SchemaDescriptor::bare(node.type_name());
        match node {
            SchemaNode::Scalar(scalar) => {
                out.checks = scalar
                    .checks
                    .as_ref()
                    .map(|checks| checks.iter().map(compile_check).collect());
                out.coerce = scalar.coerce;
            }
            SchemaNode::Array(array) => {
                out.element = Some(self.child("type", &array.element));
                out.exact_length = Some(array.exact_length.clone());
                out.min_length = Some(array.min_length.clone());
                out.max_length = Some(array.max_length.clone());
            }
            SchemaNode::Object(object) => {
                let mut shape = IndexMap::with_capacity(object.shape.len());
                for (key, field) in &object.shape {
                    self.path.push(format!("shape.{key}"));
                    let compiled = self.compile(field);
                    self.path.pop();
                    shape.insert(key.clone(), compiled);
                }
                out.shape = Some(shape);
                out.unknown_keys = object.unknown_keys;
                out.catchall = object.catchall.as_ref().map(|c| self.child("catchall", c));
            }
            SchemaNode::Union(union) => {
                out.options = Some(self.children("options", &union.options));
                out.discriminator = union.discriminator.clone();
            }
            SchemaNode::Intersection { left, right } => {
                out.left = Some(self.child("left", left));
                out.right = Some(self.child("right", right));
            }
            SchemaNode::Tuple(tuple) => {
                out.items = Some(self.children("items", &tuple.items));
                out.rest = tuple.rest.as_ref().map(|r| self.child("rest", r));
            }
            SchemaNode::Record {
                key_type,
                value_type,
            }
            | SchemaNode::Map {
                key_type,
                value_type,
            } => {
                out.key_type = Some(self.child("keyType", key_type));
                out.value_type = Some(self.child("valueType", value_type));
            }
            SchemaNode::Set(set) => {
                out.value_type = Some(self.child("valueType", &set.value_type));
                out.min_size = Some(set.min_size.clone());
                out.max_size = Some(set.max_size.clone());
            }
            SchemaNode::Literal(value) => out.value = Some(value.clone()),
            SchemaNode::Enum(values) => out.values = Some(values.clone().into()),
            SchemaNode::NativeEnum(values) => out.values = Some(values.clone()),
            SchemaNode::Effects { schema, .. } => out.schema = Some(self.child("schema", schema)),
            SchemaNode::Optional(inner)
            | SchemaNode::Nullable(inner)
            | SchemaNode::Catch(inner)
            | SchemaNode::Readonly(inner) => out.inner_type = Some(self.child("innerType", inner)),
            SchemaNode::Default { inner, default } => {
                out.inner_type = Some(self.child("innerType", inner));
                out.default_value = Some(default.evaluate());
            }
            SchemaNode::Pipeline { input, .. } => out.input = Some(self.child("in", input)),
            SchemaNode::Unsupported(unsupported) => self.degrade(unsupported),
        }
        out
    }

    fn child(&mut self, segment: &str, node: &SchemaNode) -> Box<SchemaDescriptor> {
        self.path.push(segment.to_string());
        let compiled = self.compile(node);
        self.path.pop();
        Box::new(compiled)
    }

    fn children(&mut self, segment: &str, nodes: &[SchemaNode]) -> Vec<SchemaDescriptor> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                self.path.push(format!("{segment}.{i}"));
                let compiled = self.compile(node);
                self.path.pop();
                compiled
            })
            .collect()
    }

    fn degrade(&mut self, node: &UnsupportedNode) {
        let path = self.current_path();
        tracing::warn!(
            path = %path,
            kind = node.label(),
            "schema node cannot be introspected, emitting {}",
            TypeName::Unsupported
        );
        self.degradations.push(Degradation {
            path,
            kind: node.label().to_string(),
        });
    }

    fn current_path(&self) -> String {
        std::iter::once("$")
            .chain(self.path.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn compile_check(check: &Check) -> CheckDescriptor {
    CheckDescriptor {
        kind: check.kind.clone(),
        params: check.params.clone(),
        message: check.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::node::{
        ArrayNode, Check, DefaultValue, LengthBound, ObjectNode, ScalarKind, SetNode, TupleNode,
        UnknownKeys,
    };

    fn to_json(node: &SchemaNode) -> Value {
        serde_json::to_value(compile(node)).unwrap()
    }

    #[test]
    fn scalar_copies_checks_and_coerce() {
        let node = SchemaNode::string()
            .with_check(Check::new("min").with_param("value", 3).with_message("too short"))
            .with_check(Check::new("regex").with_param("regex", "^[a-z]+$"));
        assert_eq!(
            to_json(&node),
            json!({
                "typeName": "ZodString",
                "checks": [
                    {"kind": "min", "value": 3, "message": "too short"},
                    {"kind": "regex", "regex": "^[a-z]+$"}
                ],
                "coerce": false
            })
        );
    }

    #[test]
    fn check_predicate_is_dropped() {
        let node = SchemaNode::number().with_check(
            Check::new("custom").with_predicate(Arc::new(|v: &Value| v.is_number())),
        );
        let json = to_json(&node);
        assert_eq!(json["checks"][0], json!({"kind": "custom"}));
    }

    #[test]
    fn scalar_without_fields_stays_bare() {
        assert_eq!(
            to_json(&SchemaNode::scalar(ScalarKind::Null)),
            json!({"typeName": "ZodNull"})
        );
    }

    #[test]
    fn object_shape_keeps_declaration_order() {
        let node = SchemaNode::object([
            ("zeta", SchemaNode::string()),
            ("alpha", SchemaNode::number()),
            ("mid", SchemaNode::boolean()),
        ]);
        let descriptor = compile(&node);
        let keys: Vec<_> = descriptor.shape.unwrap().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn object_catchall_presence_is_mirrored() {
        let without = to_json(&SchemaNode::object([("a", SchemaNode::string())]));
        assert!(without.get("catchall").is_none());
        assert_eq!(without["unknownKeys"], "strip");

        let with = to_json(&SchemaNode::Object(ObjectNode {
            shape: Default::default(),
            unknown_keys: Some(UnknownKeys::Passthrough),
            catchall: Some(Box::new(SchemaNode::number())),
        }));
        assert_eq!(with["catchall"]["typeName"], "ZodNumber");
        assert_eq!(with["unknownKeys"], "passthrough");
    }

    #[test]
    fn array_bounds_are_always_present() {
        let node = SchemaNode::Array(ArrayNode {
            element: Box::new(SchemaNode::string()),
            exact_length: None,
            min_length: Some(LengthBound {
                value: 1,
                message: Some("at least one".into()),
            }),
            max_length: None,
        });
        assert_eq!(
            to_json(&node),
            json!({
                "typeName": "ZodArray",
                "type": {"typeName": "ZodString", "checks": [], "coerce": false},
                "exactLength": null,
                "minLength": {"value": 1, "message": "at least one"},
                "maxLength": null
            })
        );
    }

    #[test]
    fn tuple_rest_only_when_declared() {
        let node = SchemaNode::Tuple(TupleNode {
            items: vec![SchemaNode::string(), SchemaNode::number()],
            rest: None,
        });
        let json = to_json(&node);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert!(json.get("rest").is_none());
    }

    #[test]
    fn set_compiles_value_type_and_sizes() {
        let node = SchemaNode::Set(SetNode {
            value_type: Box::new(SchemaNode::string()),
            min_size: None,
            max_size: Some(LengthBound::new(4)),
        });
        let json = to_json(&node);
        assert_eq!(json["valueType"]["typeName"], "ZodString");
        assert_eq!(json["minSize"], Value::Null);
        assert_eq!(json["maxSize"]["value"], 4);
        assert!(json.get("keyType").is_none());
    }

    #[test]
    fn default_thunk_is_evaluated_eagerly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let node = SchemaNode::string().with_default(DefaultValue::Thunk(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            json!("anonymous")
        })));
        let json = to_json(&node);
        assert_eq!(json["defaultValue"], "anonymous");
        assert_eq!(json["innerType"]["typeName"], "ZodString");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn literal_null_value_is_kept() {
        let json = to_json(&SchemaNode::Literal(Value::Null));
        assert_eq!(json, json!({"typeName": "ZodLiteral", "value": null}));
    }

    #[test]
    fn pipeline_compiles_input_side_only() {
        let node = SchemaNode::Pipeline {
            input: Box::new(SchemaNode::string()),
            output: Box::new(SchemaNode::number()),
        };
        let json = to_json(&node);
        assert_eq!(json["in"]["typeName"], "ZodString");
        assert!(json.get("out").is_none());
    }

    #[test]
    fn unsupported_subtree_is_truncated_and_siblings_survive() {
        let node = SchemaNode::object([
            ("callback", SchemaNode::Unsupported(UnsupportedNode::Function)),
            ("name", SchemaNode::string()),
        ]);
        let report = compile_with_report(&node);
        let shape = report.descriptor.shape.as_ref().unwrap();
        assert!(shape["callback"].is_unsupported());
        assert_eq!(shape["name"].type_name, TypeName::String);
        assert_eq!(
            report.degradations,
            vec![Degradation {
                path: "$.shape.callback".into(),
                kind: "ZodFunction".into(),
            }]
        );
    }

    #[test]
    fn self_referential_lazy_terminates() {
        fn category() -> SchemaNode {
            SchemaNode::object([
                ("name", SchemaNode::string()),
                ("children", SchemaNode::array(SchemaNode::lazy(category))),
            ])
        }
        let report = compile_with_report(&category());
        let json = serde_json::to_value(&report.descriptor).unwrap();
        assert_eq!(
            json["shape"]["children"]["type"],
            json!({"typeName": "StudioUnsupportedType"})
        );
        assert_eq!(report.degradations[0].path, "$.shape.children.type");
        assert_eq!(report.degradations[0].kind, "ZodLazy");
    }

    #[test]
    fn union_paths_include_option_index() {
        let node = SchemaNode::union(vec![
            SchemaNode::string(),
            SchemaNode::Unsupported(UnsupportedNode::Promise),
        ]);
        let report = compile_with_report(&node);
        assert_eq!(report.degradations[0].path, "$.options.1");
    }

    #[test]
    fn compile_is_idempotent() {
        let node = SchemaNode::object([
            ("id", SchemaNode::number().optional()),
            ("tags", SchemaNode::array(SchemaNode::string()).nullable()),
            ("self", SchemaNode::lazy(SchemaNode::string)),
        ]);
        let first = serde_json::to_vec(&compile(&node)).unwrap();
        let second = serde_json::to_vec(&compile(&node)).unwrap();
        assert_eq!(first, second);
    }
}

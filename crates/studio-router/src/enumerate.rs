//! # Procedure Enumerator
//!
//! Walks a [`Router`] and compiles every procedure into a [`ProcedureInfo`]
//! for the catalog a client lists, inspects and invokes from.
//!
//! ## Input resolution
//!
//! | inputs                      | descriptor                           |
//! |-----------------------------|--------------------------------------|
//! | none                        | `ZodNever`                           |
//! | one custom validator        | `ZodUnknown`                         |
//! | one schema                  | that schema, compiled                |
//! | a chain of object schemas   | the objects merged, then compiled    |
//! | a chain with anything else  | `StudioUnsupportedType` + a warning  |
//!
//! An output parser that is a schema is compiled; anything else is
//! reported as `ZodUnknown`. Enumeration itself never fails.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use studio_schema::{compile, merge_objects, SchemaDescriptor, SchemaNode, TypeName};

use crate::procedure::{Procedure, ProcedureInput, ProcedureKind};
use crate::router::Router;

/// The client-facing description of one procedure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureInfo {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ProcedureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    pub input_info: SchemaDescriptor,
    pub output_info: SchemaDescriptor,
}

/// Every procedure of a router, keyed by path, in declaration order.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProcedureCatalog {
    entries: IndexMap<String, ProcedureInfo>,
}

impl ProcedureCatalog {
    pub fn get(&self, path: &str) -> Option<&ProcedureInfo> {
        self.entries.get(path)
    }

    /// Path to kind, the listing a client shows first.
    pub fn kinds(&self) -> IndexMap<String, ProcedureKind> {
        self.entries
            .iter()
            .map(|(path, info)| (path.clone(), info.kind))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcedureInfo> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a ProcedureCatalog {
    type Item = &'a ProcedureInfo;
    type IntoIter = indexmap::map::Values<'a, String, ProcedureInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Compile every procedure of `router`.
pub fn enumerate(router: &Router) -> ProcedureCatalog {
    let entries = router
        .procedures
        .iter()
        .map(|(path, procedure)| (path.clone(), describe(path, procedure)))
        .collect();
    let catalog = ProcedureCatalog { entries };
    tracing::debug!(router = %router.name, procedures = catalog.len(), "procedures enumerated");
    catalog
}

fn describe(path: &str, procedure: &Procedure) -> ProcedureInfo {
    ProcedureInfo {
        path: path.to_string(),
        kind: procedure.kind,
        meta: procedure.meta.clone(),
        input_info: input_descriptor(path, &procedure.inputs),
        output_info: match &procedure.output {
            Some(ProcedureInput::Schema(node)) => compile(node),
            _ => compile(&SchemaNode::unknown()),
        },
    }
}

fn input_descriptor(path: &str, inputs: &[ProcedureInput]) -> SchemaDescriptor {
    match inputs {
        [] => compile(&SchemaNode::never()),
        [ProcedureInput::Predicate(_)] => compile(&SchemaNode::unknown()),
        [ProcedureInput::Schema(node)] => compile(node),
        chain => {
            let schemas: Option<Vec<&SchemaNode>> =
                chain.iter().map(ProcedureInput::as_schema).collect();
            let Some(schemas) = schemas else {
                tracing::warn!(
                    procedure = path,
                    "input chain contains a custom validator; input cannot be described"
                );
                return SchemaDescriptor::bare(TypeName::Unsupported);
            };
            match merge_objects(schemas) {
                Ok(merged) => compile(&merged),
                Err(error) => {
                    tracing::warn!(procedure = path, %error, "input chain cannot be merged");
                    SchemaDescriptor::bare(TypeName::Unsupported)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::OpaquePredicate;
    use serde_json::json;

    fn single(procedure: Procedure) -> ProcedureInfo {
        let router = Router::new("r").with_procedure("p", procedure);
        enumerate(&router).get("p").cloned().unwrap()
    }

    fn predicate() -> ProcedureInput {
        ProcedureInput::Predicate(OpaquePredicate {
            label: "custom".into(),
        })
    }

    #[test]
    fn no_inputs_compile_to_never() {
        let info = single(Procedure::new(ProcedureKind::Query));
        assert_eq!(info.input_info.type_name, TypeName::Never);
        assert_eq!(info.output_info.type_name, TypeName::Unknown);
    }

    #[test]
    fn single_predicate_is_unknown() {
        let mut procedure = Procedure::new(ProcedureKind::Mutation);
        procedure.inputs.push(predicate());
        procedure.output = Some(predicate());
        let info = single(procedure);
        assert_eq!(info.input_info.type_name, TypeName::Unknown);
        assert_eq!(info.output_info.type_name, TypeName::Unknown);
    }

    #[test]
    fn single_schema_is_compiled() {
        let info = single(
            Procedure::new(ProcedureKind::Query)
                .with_input(SchemaNode::string())
                .with_output(SchemaNode::array(SchemaNode::number())),
        );
        assert_eq!(info.input_info.type_name, TypeName::String);
        assert_eq!(info.output_info.type_name, TypeName::Array);
    }

    #[test]
    fn chained_objects_are_merged() {
        let info = single(
            Procedure::new(ProcedureKind::Mutation)
                .with_input(SchemaNode::object([("a", SchemaNode::string())]))
                .with_input(SchemaNode::object([("b", SchemaNode::number())])),
        );
        let json = serde_json::to_value(&info.input_info).unwrap();
        assert_eq!(json["typeName"], "ZodObject");
        let keys: Vec<&String> = json["shape"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn chain_with_non_object_is_unsupported() {
        let info = single(
            Procedure::new(ProcedureKind::Query)
                .with_input(SchemaNode::object([("a", SchemaNode::string())]))
                .with_input(SchemaNode::string()),
        );
        assert!(info.input_info.is_unsupported());
    }

    #[test]
    fn chain_with_predicate_is_unsupported() {
        let mut procedure = Procedure::new(ProcedureKind::Query)
            .with_input(SchemaNode::object([("a", SchemaNode::string())]));
        procedure.inputs.push(predicate());
        assert!(single(procedure).input_info.is_unsupported());
    }

    #[test]
    fn catalog_keeps_order_and_kinds() {
        let router = Router::new("r")
            .with_procedure("z.last", Procedure::new(ProcedureKind::Query))
            .with_procedure("a.first", Procedure::new(ProcedureKind::Mutation))
            .with_procedure("events", Procedure::new(ProcedureKind::Subscription));
        let catalog = enumerate(&router);
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            serde_json::to_value(catalog.kinds()).unwrap(),
            json!({"z.last": "query", "a.first": "mutation", "events": "subscription"})
        );
        let paths: Vec<&str> = catalog.iter().map(|info| info.path.as_str()).collect();
        assert_eq!(paths, vec!["z.last", "a.first", "events"]);
    }

    #[test]
    fn info_serializes_with_client_field_names() {
        let mut procedure = Procedure::new(ProcedureKind::Query);
        procedure.meta = Some(json!({"description": "hi"}).as_object().cloned().unwrap());
        let json = serde_json::to_value(single(procedure)).unwrap();
        assert_eq!(
            json,
            json!({
                "path": "p",
                "type": "query",
                "meta": {"description": "hi"},
                "inputInfo": {"typeName": "ZodNever"},
                "outputInfo": {"typeName": "ZodUnknown"},
            })
        );
    }

    #[test]
    fn meta_is_omitted_when_absent() {
        let json = serde_json::to_value(single(Procedure::new(ProcedureKind::Query))).unwrap();
        assert!(json.get("meta").is_none());
    }
}

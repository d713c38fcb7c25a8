//! # Router Decoding
//!
//! Turns a selected router export into a typed [`Router`]. The export is
//! loader output and is not trusted: every field is checked for presence
//! and type before use, and the first problem is reported with the
//! procedure path it concerns.
//!
//! ## Wire form
//!
//! ```json
//! {
//!   "_def": {
//!     "router": true,
//!     "procedures": {
//!       "user.byId": {
//!         "_def": { "type": "query", "meta": {}, "inputs": [ ... ], "output": { ... } }
//!       }
//!     },
//!     "_config": { "transformer": "superjson" }
//!   }
//! }
//! ```
//!
//! Older routers mark the kind with a boolean flag (`"query": true`)
//! instead of `type`; both are accepted. A string entry in `inputs` (or a
//! string `output`) is a custom validator known only by its label.
//!
//! Schemas are decoded leniently: a schema node that cannot be decoded is
//! logged and kept as an unsupported leaf, so one odd validator never
//! costs the rest of the catalog.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use studio_schema::SchemaNode;
use thiserror::Error;

use crate::procedure::{OpaquePredicate, Procedure, ProcedureInput, ProcedureKind};
use crate::transformer::WireTransformer;

/// A router selected from a module, decoded into typed form.
#[derive(Debug, Clone)]
pub struct Router {
    /// Export name the router was found under.
    pub name: String,
    /// Dot-delimited path to procedure, in declaration order.
    pub procedures: IndexMap<String, Procedure>,
    pub transformer: WireTransformer,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("router has no `_def` object")]
    MissingDef,

    #[error("`_def.procedures` is missing or not an object")]
    InvalidProcedures,

    #[error("`_def._config` is not an object")]
    InvalidConfig,

    #[error("unknown transformer `{0}`")]
    UnknownTransformer(String),

    #[error("procedure `{path}` is malformed: {reason}")]
    MalformedProcedure { path: String, reason: String },
}

impl Router {
    /// Build a router directly, mostly for tests and embedders.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            procedures: IndexMap::new(),
            transformer: WireTransformer::default(),
        }
    }

    pub fn with_procedure(mut self, path: impl Into<String>, procedure: Procedure) -> Self {
        self.procedures.insert(path.into(), procedure);
        self
    }

    /// Decode a router export.
    pub fn from_export(name: &str, value: &Value) -> Result<Self, RouterError> {
        let def = value
            .get("_def")
            .and_then(Value::as_object)
            .ok_or(RouterError::MissingDef)?;

        let raw_procedures = def
            .get("procedures")
            .and_then(Value::as_object)
            .ok_or(RouterError::InvalidProcedures)?;

        let mut procedures = IndexMap::with_capacity(raw_procedures.len());
        for (path, raw) in raw_procedures {
            procedures.insert(path.clone(), decode_procedure(path, raw)?);
        }

        Ok(Self {
            name: name.to_string(),
            procedures,
            transformer: decode_transformer(def)?,
        })
    }
}

fn decode_transformer(def: &Map<String, Value>) -> Result<WireTransformer, RouterError> {
    let config = match def.get("_config") {
        None | Some(Value::Null) => return Ok(WireTransformer::default()),
        Some(Value::Object(config)) => config,
        Some(_) => return Err(RouterError::InvalidConfig),
    };
    match config.get("transformer") {
        None | Some(Value::Null) => Ok(WireTransformer::default()),
        Some(Value::String(name)) => WireTransformer::from_name(name)
            .ok_or_else(|| RouterError::UnknownTransformer(name.clone())),
        Some(other) => Err(RouterError::UnknownTransformer(other.to_string())),
    }
}

fn malformed(path: &str, reason: impl Into<String>) -> RouterError {
    RouterError::MalformedProcedure {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn decode_procedure(path: &str, raw: &Value) -> Result<Procedure, RouterError> {
    let def = raw
        .get("_def")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed(path, "no `_def` object"))?;

    let kind = decode_kind(path, def)?;

    let meta = match def.get("meta") {
        None | Some(Value::Null) => None,
        Some(Value::Object(meta)) => Some(meta.clone()),
        Some(_) => return Err(malformed(path, "`meta` is not an object")),
    };

    let inputs = match def.get("inputs") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| decode_input(path, &format!("inputs[{i}]"), entry))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(malformed(path, "`inputs` is not an array")),
    };

    let output = match def.get("output") {
        None | Some(Value::Null) => None,
        Some(entry) => Some(decode_input(path, "output", entry)?),
    };

    Ok(Procedure {
        kind,
        meta,
        inputs,
        output,
    })
}

fn decode_kind(path: &str, def: &Map<String, Value>) -> Result<ProcedureKind, RouterError> {
    match def.get("type") {
        Some(Value::String(name)) => name.parse().map_err(|e| malformed(path, format!("{e}"))),
        Some(_) => Err(malformed(path, "`type` is not a string")),
        None => ProcedureKind::ALL
            .into_iter()
            .find(|kind| def.get(kind.as_str()) == Some(&Value::Bool(true)))
            .ok_or_else(|| malformed(path, "no procedure kind")),
    }
}

fn decode_input(path: &str, field: &str, entry: &Value) -> Result<ProcedureInput, RouterError> {
    match entry {
        Value::String(label) => Ok(ProcedureInput::Predicate(OpaquePredicate {
            label: label.clone(),
        })),
        Value::Object(_) => {
            let decoded = SchemaNode::from_wire_lenient(entry);
            for problem in &decoded.problems {
                tracing::warn!(procedure = path, field, %problem, "degraded an undecodable schema");
            }
            Ok(ProcedureInput::Schema(decoded.node))
        }
        _ => Err(malformed(
            path,
            format!("`{field}` is neither a schema nor a validator label"),
        )),
    }
}

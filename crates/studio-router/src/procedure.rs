//! Procedures as declared on a router.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use studio_schema::SchemaNode;

/// What a procedure does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Query,
    Mutation,
    Subscription,
}

impl ProcedureKind {
    pub const ALL: [ProcedureKind; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// Subscriptions are listed but never relayed.
    pub fn is_executable(self) -> bool {
        !matches!(self, Self::Subscription)
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown procedure kind `{0}`")]
pub struct UnknownProcedureKind(pub String);

impl FromStr for ProcedureKind {
    type Err = UnknownProcedureKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownProcedureKind(s.to_string()))
    }
}

/// A custom validator that carries no declarative structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaquePredicate {
    /// Whatever the loader could name it by, usually the function name.
    pub label: String,
}

/// One entry of a procedure's input chain, or its output parser.
#[derive(Debug, Clone)]
pub enum ProcedureInput {
    Schema(SchemaNode),
    Predicate(OpaquePredicate),
}

impl ProcedureInput {
    pub fn as_schema(&self) -> Option<&SchemaNode> {
        match self {
            Self::Schema(node) => Some(node),
            Self::Predicate(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub kind: ProcedureKind,
    /// Free-form metadata, copied to the catalog untouched.
    pub meta: Option<Map<String, Value>>,
    /// Input parsers in the order they were chained.
    pub inputs: Vec<ProcedureInput>,
    pub output: Option<ProcedureInput>,
}

impl Procedure {
    pub fn new(kind: ProcedureKind) -> Self {
        Self {
            kind,
            meta: None,
            inputs: Vec::new(),
            output: None,
        }
    }

    pub fn with_input(mut self, input: SchemaNode) -> Self {
        self.inputs.push(ProcedureInput::Schema(input));
        self
    }

    pub fn with_output(mut self, output: SchemaNode) -> Self {
        self.output = Some(ProcedureInput::Schema(output));
        self
    }
}

//! # Invocation Envelope
//!
//! The body a client posts to execute a procedure:
//!
//! ```json5
//! { method: "query", data: { id: 1 } }  // comments and trailing commas allowed
//! ```
//!
//! Parsing is lenient (JSON5). Validation is strict about `method` and
//! accepts any `data`, including none at all, so `method` is the only
//! field that can be reported.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use studio_router::ProcedureKind;

/// The call style a client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcMethod {
    Query,
    Mutation,
}

impl RpcMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }

    /// Whether this is how a procedure of `kind` is normally called.
    pub fn matches(self, kind: ProcedureKind) -> bool {
        matches!(
            (self, kind),
            (Self::Query, ProcedureKind::Query) | (Self::Mutation, ProcedureKind::Mutation)
        )
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated invocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationEnvelope {
    pub method: RpcMethod,
    /// Procedure input; `None` when the body has no `data` member.
    pub data: Option<Value>,
}

/// One violated field of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeIssue {
    /// Path to the offending member; empty for the body itself.
    pub path: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    /// The body is not valid JSON5.
    #[error("{0}")]
    Syntax(String),

    /// The body parsed but does not have the envelope shape.
    #[error("invalid invocation envelope: {} issue(s)", .0.len())]
    Invalid(Vec<EnvelopeIssue>),
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Parse and validate a raw request body.
pub fn parse_envelope(raw: &[u8]) -> Result<InvocationEnvelope, EnvelopeError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| EnvelopeError::Syntax(format!("request body is not UTF-8: {e}")))?;
    let value: Value = json5::from_str(text).map_err(|e| EnvelopeError::Syntax(e.to_string()))?;
    validate(value)
}

fn validate(value: Value) -> Result<InvocationEnvelope, EnvelopeError> {
    let mut fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(EnvelopeError::Invalid(vec![EnvelopeIssue {
                path: Vec::new(),
                message: format!("Expected object, received {}", type_label(&other)),
            }]))
        }
    };

    let method = match fields.get("method") {
        Some(Value::String(s)) if s == "query" => RpcMethod::Query,
        Some(Value::String(s)) if s == "mutation" => RpcMethod::Mutation,
        None => return Err(method_issue("Required".into())),
        Some(other) => {
            return Err(method_issue(format!(
                "Invalid enum value. Expected 'query' | 'mutation', received {other}"
            )))
        }
    };

    Ok(InvocationEnvelope {
        method,
        data: fields.remove("data"),
    })
}

fn method_issue(message: String) -> EnvelopeError {
    EnvelopeError::Invalid(vec![EnvelopeIssue {
        path: vec!["method".into()],
        message,
    }])
}

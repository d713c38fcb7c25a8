//! # Execution Relay
//!
//! Forwards one captured invocation to the live endpoint and shapes the
//! outcome for the client.
//!
//! ## Outcomes
//!
//! | situation                         | status                  | body                                          |
//! |-----------------------------------|-------------------------|-----------------------------------------------|
//! | body is not JSON5                 | 400                     | `{error, message}`                            |
//! | body is not `{method, data?}`     | 400                     | `{error, issues}`                             |
//! | call succeeded                    | 200                     | `{response: {success: true, data}, timeTaken}` |
//! | endpoint returned a tRPC error    | `data.httpStatus` / 502 | `{response: {success: false, error}, timeTaken}` |
//! | endpoint unreachable or non-tRPC  | 502                     | `{response: {success: false, error}, timeTaken}` |
//! | anything else                     | [`RelayFault`]          |                                               |

use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Map, Value};
use studio_router::ProcedureKind;

use crate::envelope::{parse_envelope, EnvelopeError};
use crate::error::{RelayFault, RemoteError};
use crate::transport::{RpcRequest, RpcTransport};

/// Status used when the remote failed without naming a better one.
pub const REMOTE_FAILURE_STATUS: u16 = 502;

const INVALID_BODY: &str = "Invalid request body";

/// Status and JSON body to send back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

/// Outcome of the forwarded call itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationResult {
    Success { success: bool, data: Value },
    Failure { success: bool, error: Value },
}

impl InvocationResult {
    pub fn success(data: Value) -> Self {
        Self::Success {
            success: true,
            data,
        }
    }

    pub fn failure(error: Value) -> Self {
        Self::Failure {
            success: false,
            error,
        }
    }
}

/// [`InvocationResult`] with the wall-clock time the call took.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedInvocation {
    pub response: InvocationResult,
    /// Milliseconds.
    pub time_taken: u64,
}

/// Relays invocations through a transport.
#[derive(Debug, Clone)]
pub struct ExecutionRelay<T> {
    transport: T,
}

impl<T: RpcTransport> ExecutionRelay<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke the procedure at `path` with the raw request body.
    ///
    /// `path` must already be known to exist; `declared` is its kind in the
    /// catalog.
    pub async fn invoke(
        &self,
        path: &str,
        declared: ProcedureKind,
        raw_body: &[u8],
    ) -> Result<RelayResponse, RelayFault> {
        let envelope = match parse_envelope(raw_body) {
            Ok(envelope) => envelope,
            Err(EnvelopeError::Syntax(message)) => {
                tracing::debug!(path, %message, "rejected unparsable invocation body");
                return Ok(RelayResponse {
                    status: 400,
                    body: json!({ "error": INVALID_BODY, "message": message }),
                });
            }
            Err(EnvelopeError::Invalid(issues)) => {
                tracing::debug!(
                    path,
                    issues = issues.len(),
                    "rejected invalid invocation envelope"
                );
                return Ok(RelayResponse {
                    status: 400,
                    body: json!({ "error": INVALID_BODY, "issues": issues }),
                });
            }
        };

        if !envelope.method.matches(declared) {
            tracing::warn!(
                path,
                declared = %declared,
                method = %envelope.method,
                "invocation method differs from the declared procedure kind"
            );
        }

        let request = RpcRequest {
            method: envelope.method,
            path: path.to_string(),
            input: envelope.data,
        };
        let started = Instant::now();
        let outcome = self.transport.call(request).await;
        let time_taken = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, response) = match outcome {
            Ok(data) => (200, InvocationResult::success(data)),
            Err(error) if error.is_fault() => {
                return Err(RelayFault::Remote {
                    path: path.to_string(),
                    source: error,
                })
            }
            Err(error) => {
                let (status, body) = classify(&error);
                tracing::info!(path, status, %error, "remote call failed");
                (status, InvocationResult::failure(body))
            }
        };

        tracing::info!(path, method = %envelope.method, status, time_taken, "procedure invoked");
        let body = serde_json::to_value(TimedInvocation {
            response,
            time_taken,
        })
        .unwrap_or(Value::Null);
        Ok(RelayResponse { status, body })
    }
}

/// Status and client-facing error body for a remote failure.
fn classify(error: &RemoteError) -> (u16, Value) {
    match error {
        RemoteError::Rpc {
            message,
            code,
            data,
        } => {
            let status = data
                .as_ref()
                .and_then(|data| data.get("httpStatus"))
                .and_then(Value::as_u64)
                .and_then(|status| u16::try_from(status).ok())
                .filter(|status| (100..=599).contains(status))
                .unwrap_or(REMOTE_FAILURE_STATUS);
            (status, flatten_rpc_error(message, code.as_ref(), data.as_ref()))
        }
        other => (REMOTE_FAILURE_STATUS, json!({ "message": other.to_string() })),
    }
}

/// `{message, ...data}` when the error has a data payload, otherwise
/// `{message, code?}`.
fn flatten_rpc_error(
    message: &str,
    code: Option<&Value>,
    data: Option<&Map<String, Value>>,
) -> Value {
    let mut body = Map::new();
    body.insert("message".into(), Value::String(message.to_string()));
    match data {
        Some(data) => {
            for (key, value) in data {
                body.insert(key.clone(), value.clone());
            }
        }
        None => {
            if let Some(code) = code {
                body.insert("code".into(), code.clone());
            }
        }
    }
    Value::Object(body)
}

//! Relay error types.

use serde_json::{Map, Value};

/// A failed remote call, as seen by the relay.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The endpoint answered with a tRPC error envelope.
    #[error("remote procedure failed: {message}")]
    Rpc {
        message: String,
        code: Option<Value>,
        data: Option<Map<String, Value>>,
    },

    /// The endpoint answered with a non-2xx status and no tRPC envelope.
    #[error("{url} returned HTTP {status}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The request never got a response (connection refused, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response that is not a tRPC envelope.
    #[error("{url} returned an unexpected response: {reason}")]
    Protocol { url: String, reason: String },

    /// The request could not be built.
    #[error("cannot build a request for `{path}`: {reason}")]
    InvalidRequest { path: String, reason: String },
}

impl RemoteError {
    /// Whether this is a relay fault rather than a refusal by the remote.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::InvalidRequest { .. })
    }
}

/// An invocation failure the relay does not classify.
///
/// The hosting layer answers these with a generic 500 for the one request
/// and keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum RelayFault {
    #[error("relay to `{path}` failed")]
    Remote {
        path: String,
        #[source]
        source: RemoteError,
    },
}

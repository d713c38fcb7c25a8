//! # studio-relay: Execution Relay
//!
//! Takes the raw body a client posted to execute a procedure, validates
//! it, forwards the call to the live tRPC endpoint through an
//! [`RpcTransport`], and turns the outcome into a status code and JSON
//! body.
//!
//! The relay holds no mutable state; one [`ExecutionRelay`] can serve any
//! number of concurrent invocations, and dropping an invocation's future
//! cancels only that call.

pub mod envelope;
pub mod error;
pub mod relay;
pub mod transport;

pub use envelope::{parse_envelope, EnvelopeError, EnvelopeIssue, InvocationEnvelope, RpcMethod};
pub use error::{RelayFault, RemoteError};
pub use relay::{
    ExecutionRelay, InvocationResult, RelayResponse, TimedInvocation, REMOTE_FAILURE_STATUS,
};
pub use transport::{HttpRpcClient, HttpRpcConfig, RpcRequest, RpcTransport};

//! # RPC Transport
//!
//! [`RpcTransport`] is the seam between the relay and the live endpoint.
//! [`HttpRpcClient`] implements it over `reqwest`, speaking the tRPC HTTP
//! protocol without batching:
//!
//! - query: `GET {endpoint}/{path}?input=<json>`
//! - mutation: `POST {endpoint}/{path}` with the input as a JSON body
//!
//! Inputs are encoded and results decoded through the router's
//! [`WireTransformer`]. Each call has its own timeout.
//!
//! ## Retry
//!
//! None. Mutations are not idempotent in general, so a failure is
//! classified and returned as-is.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use studio_router::WireTransformer;
use url::Url;

use crate::envelope::RpcMethod;
use crate::error::RemoteError;

/// One call to forward.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: RpcMethod,
    pub path: String,
    pub input: Option<Value>,
}

/// Something that can execute a procedure call on the live endpoint.
pub trait RpcTransport: Send + Sync {
    /// Execute `request`, returning the decoded result data.
    fn call(&self, request: RpcRequest) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

/// Configuration for [`HttpRpcClient`].
#[derive(Debug, Clone)]
pub struct HttpRpcConfig {
    /// Base URL of the tRPC handler, e.g. `http://localhost:4000/trpc`.
    pub endpoint: Url,
    pub transformer: WireTransformer,
    pub timeout: Duration,
}

impl HttpRpcConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            transformer: WireTransformer::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_transformer(mut self, transformer: WireTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// tRPC-over-HTTP client.
#[derive(Debug, Clone)]
pub struct HttpRpcClient {
    client: reqwest::Client,
    endpoint: Url,
    transformer: WireTransformer,
}

impl HttpRpcClient {
    pub fn new(config: HttpRpcConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            transformer: config.transformer,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn transformer(&self) -> WireTransformer {
        self.transformer
    }

    fn procedure_url(&self, path: &str) -> Result<Url, RemoteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidRequest {
                path: path.to_string(),
                reason: format!("endpoint {} cannot have a path", self.endpoint),
            })?
            .pop_if_empty()
            .push(path);
        Ok(url)
    }

    fn build(
        &self,
        request: &RpcRequest,
    ) -> Result<(String, reqwest::RequestBuilder), RemoteError> {
        let mut url = self.procedure_url(&request.path)?;
        let input = request
            .input
            .clone()
            .map(|input| self.transformer.serialize(input));

        let builder = match request.method {
            RpcMethod::Query => {
                if let Some(input) = &input {
                    url.query_pairs_mut()
                        .append_pair("input", &input.to_string());
                }
                self.client.get(url.clone())
            }
            RpcMethod::Mutation => {
                let builder = self.client.post(url.clone());
                match &input {
                    Some(input) => builder.json(input),
                    None => builder,
                }
            }
        };
        Ok((url.to_string(), builder))
    }

    /// Map a response body onto the tRPC envelope.
    fn interpret(&self, url: String, status: u16, body: &str) -> Result<Value, RemoteError> {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let success = (200..300).contains(&status);

        match parsed {
            Some(Value::Object(mut envelope)) if envelope.contains_key("result") => {
                let result = envelope.remove("result").unwrap_or(Value::Null);
                let data = match result {
                    Value::Object(mut result) => result.remove("data").unwrap_or(Value::Null),
                    other => other,
                };
                Ok(self.transformer.deserialize(data))
            }
            Some(Value::Object(mut envelope)) if envelope.contains_key("error") => {
                let error = envelope.remove("error").unwrap_or(Value::Null);
                Err(rpc_error(self.transformer.deserialize(error)))
            }
            _ if !success => Err(RemoteError::Http {
                url,
                status,
                body: body.to_string(),
            }),
            _ => Err(RemoteError::Protocol {
                url,
                reason: "no `result` or `error` member".into(),
            }),
        }
    }
}

fn rpc_error(error: Value) -> RemoteError {
    let mut fields = match error {
        Value::Object(fields) => fields,
        other => {
            return RemoteError::Rpc {
                message: other.to_string(),
                code: None,
                data: None,
            }
        }
    };
    let message = match fields.remove("message") {
        Some(Value::String(message)) => message,
        Some(other) => other.to_string(),
        None => "Unknown error".to_string(),
    };
    let data = match fields.remove("data") {
        Some(Value::Object(data)) => Some(data),
        _ => None,
    };
    RemoteError::Rpc {
        message,
        code: fields.remove("code"),
        data,
    }
}

impl RpcTransport for HttpRpcClient {
    async fn call(&self, request: RpcRequest) -> Result<Value, RemoteError> {
        let (url, builder) = self.build(&request)?;
        tracing::debug!(%url, method = %request.method, "forwarding procedure call");

        let response = builder.send().await.map_err(|source| RemoteError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| RemoteError::Transport {
            url: url.clone(),
            source,
        })?;
        self.interpret(url, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(transformer: WireTransformer) -> HttpRpcClient {
        let config = HttpRpcConfig::new(Url::parse("http://localhost:4000/trpc/").unwrap())
            .with_transformer(transformer);
        HttpRpcClient::new(config).unwrap()
    }

    #[test]
    fn procedure_url_appends_the_path() {
        let url = client(WireTransformer::Identity)
            .procedure_url("user.byId")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/trpc/user.byId");
    }

    #[test]
    fn result_data_is_unwrapped() {
        let c = client(WireTransformer::Superjson);
        let data = c
            .interpret("u".into(), 200, r#"{"result":{"data":{"json":{"id":1}}}}"#)
            .unwrap();
        assert_eq!(data, json!({"id": 1}));
    }

    #[test]
    fn error_envelope_becomes_rpc_error() {
        let c = client(WireTransformer::Identity);
        let body = concat!(
            r#"{"error":{"message":"nope","code":-32004,"#,
            r#""data":{"code":"NOT_FOUND","httpStatus":404}}}"#
        );
        match c.interpret("u".into(), 404, body).unwrap_err() {
            RemoteError::Rpc { message, code, data } => {
                assert_eq!(message, "nope");
                assert_eq!(code, Some(json!(-32004)));
                assert_eq!(data.unwrap()["httpStatus"], json!(404));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_envelope_failure_is_http_error() {
        let c = client(WireTransformer::Identity);
        let err = c.interpret("u".into(), 503, "<html>down</html>").unwrap_err();
        assert!(matches!(err, RemoteError::Http { status: 503, .. }));
        assert!(!err.is_fault());
    }

    #[test]
    fn non_envelope_success_is_a_fault() {
        let c = client(WireTransformer::Identity);
        let err = c.interpret("u".into(), 200, r#"{"ok":true}"#).unwrap_err();
        assert!(err.is_fault());
    }
}

//! The HTTP transport and relay against a mock tRPC endpoint.

use std::time::Duration;

use serde_json::json;
use studio_relay::{
    ExecutionRelay, HttpRpcClient, HttpRpcConfig, RemoteError, RpcMethod, RpcRequest,
    RpcTransport,
};
use studio_router::{ProcedureKind, WireTransformer};
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, transformer: WireTransformer) -> HttpRpcClient {
    let endpoint = Url::parse(&format!("{}/trpc", server.uri())).unwrap();
    let config = HttpRpcConfig::new(endpoint)
        .with_transformer(transformer)
        .with_timeout(Duration::from_secs(5));
    HttpRpcClient::new(config).unwrap()
}

fn query(path: &str, input: serde_json::Value) -> RpcRequest {
    RpcRequest {
        method: RpcMethod::Query,
        path: path.into(),
        input: Some(input),
    }
}

#[tokio::test]
async fn query_sends_input_in_the_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trpc/user.byId"))
        .and(query_param("input", r#"{"id":1}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"data": {"id": 1, "name": "Ada"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server, WireTransformer::Identity)
        .call(query("user.byId", json!({"id": 1})))
        .await
        .unwrap();
    assert_eq!(data, json!({"id": 1, "name": "Ada"}));
}

#[tokio::test]
async fn mutation_posts_a_superjson_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trpc/user.create"))
        .and(body_json(json!({"json": {"name": "Ada"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"data": {"json": {"id": 7}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = RpcRequest {
        method: RpcMethod::Mutation,
        path: "user.create".into(),
        input: Some(json!({"name": "Ada"})),
    };
    let data = client(&server, WireTransformer::Superjson)
        .call(request)
        .await
        .unwrap();
    assert_eq!(data, json!({"id": 7}));
}

#[tokio::test]
async fn error_envelope_is_structured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trpc/user.byId"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "User not found",
                "code": -32004,
                "data": {"code": "NOT_FOUND", "httpStatus": 404, "path": "user.byId"}
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server, WireTransformer::Identity)
        .call(query("user.byId", json!({"id": 9})))
        .await
        .unwrap_err();
    match err {
        RemoteError::Rpc { message, data, .. } => {
            assert_eq!(message, "User not found");
            assert_eq!(data.unwrap()["httpStatus"], json!(404));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let server = MockServer::start().await;
    let client = client(&server, WireTransformer::Identity);
    drop(server);

    let err = client.call(query("health", json!(null))).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport { .. }), "{err:?}");
    assert!(!err.is_fault());
}

#[tokio::test]
async fn relay_forwards_remote_status_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trpc/user.byId"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "message": "User not found",
                "code": -32004,
                "data": {"code": "NOT_FOUND", "httpStatus": 404}
            }
        })))
        .mount(&server)
        .await;

    let relay = ExecutionRelay::new(client(&server, WireTransformer::Identity));
    let response = relay
        .invoke(
            "user.byId",
            ProcedureKind::Query,
            br#"{ method: "query", data: { id: 9 } }"#,
        )
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body["response"]["success"], json!(false));
    assert_eq!(response.body["response"]["error"]["message"], "User not found");
}

#[tokio::test]
async fn upstream_outage_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/trpc/job.run"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let relay = ExecutionRelay::new(client(&server, WireTransformer::Identity));
    let response = relay
        .invoke("job.run", ProcedureKind::Mutation, br#"{"method":"mutation","data":{}}"#)
        .await
        .unwrap();
    assert_eq!(response.status, 502);
    assert_eq!(response.body["response"]["success"], json!(false));
}

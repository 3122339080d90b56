// tests/mcp_tests.rs

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use clap::Parser;
use mockito::{mock, Matcher};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;
use web3_stats_mcp::{
    api::build_app,
    blockchain::UpstreamClient,
    config::{Cli, Config},
    mcp::{protocol::Request as RpcRequest, McpHandler},
    transport::{CallContext, RpcService},
    AppState,
};

fn handler() -> McpHandler {
    let client = UpstreamClient::new(SecretString::new("test-key".into()), mockito::server_url())
        .with_blockscout_base(mockito::server_url());
    McpHandler::new(client)
}

async fn call(handler: &McpHandler, id: i64, method: &str, params: Value) -> Value {
    let request = RpcRequest::new(json!(id), method, Some(params));
    let ctx = CallContext::new("test", None);
    let response = handler.handle(request, &ctx).await.expect("expected a response");
    serde_json::to_value(response).unwrap()
}

async fn call_tool(handler: &McpHandler, name: &str, arguments: Value) -> Value {
    call(handler, 1, "tools/call", json!({ "name": name, "arguments": arguments })).await
}

fn text_of(reply: &Value) -> &str {
    reply["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn lists_every_tool_with_a_schema() {
    let reply = call(&handler(), 1, "tools/list", json!({})).await;
    let tools = reply["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 29);
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));

    let balances = tools.iter().find(|t| t["name"] == "get_evm_balances").unwrap();
    assert_eq!(balances["inputSchema"]["required"], json!(["walletAddress"]));
}

#[tokio::test]
async fn evm_balances_forwards_key_and_query() {
    let m = mock("GET", "/v1/evm/balances/0xbalances")
        .match_header("x-sim-api-key", "test-key")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("chain_ids".into(), "1,56".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"balances":[{"symbol":"ETH","amount":"42"}]}"#)
        .create();

    let reply = call_tool(
        &handler(),
        "get_evm_balances",
        json!({ "walletAddress": "0xbalances", "chainIds": "1,56", "limit": 5 }),
    )
    .await;

    m.assert();
    assert!(reply["result"].get("isError").is_none());
    let data: Value = serde_json::from_str(text_of(&reply)).unwrap();
    assert_eq!(data["balances"][0]["symbol"], "ETH");
}

#[tokio::test]
async fn upstream_failure_is_a_tool_error() {
    let _m = mock("GET", "/v1/evm/activity/0xbroken")
        .with_status(500)
        .with_body("boom")
        .create();

    let reply = call_tool(&handler(), "get_evm_activity", json!({ "walletAddress": "0xbroken" })).await;

    assert!(reply.get("error").is_none());
    assert_eq!(reply["result"]["isError"], true);
    assert_eq!(
        text_of(&reply),
        "Dune API Error: 500 Internal Server Error. Details: boom"
    );
}

#[tokio::test]
async fn invalid_arguments_are_protocol_errors() {
    let h = handler();

    let reply = call_tool(&h, "get_evm_balances", json!({})).await;
    assert_eq!(reply["error"]["code"], -32602);

    let reply = call_tool(&h, "get_evm_activity", json!({ "walletAddress": "0x1", "limit": 0 })).await;
    assert_eq!(reply["error"]["code"], -32602);

    let reply = call_tool(&h, "no_such_tool", json!({})).await;
    assert_eq!(reply["error"]["code"], -32602);

    let reply = call(&h, 4, "tools/call", json!({ "name": "ping_dune_server", "arguments": [1] })).await;
    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(reply["id"], 4);
}

#[tokio::test]
async fn ping_tools() {
    let h = handler();

    let reply = call_tool(&h, "ping_dune_server", json!({})).await;
    assert_eq!(text_of(&reply), "Pong! Dune MCP server is active.");

    let reply = call_tool(&h, "ping_blockscout", json!({ "chainId": "999999" })).await;
    assert!(reply["result"].get("isError").is_none());
    assert!(text_of(&reply).starts_with("Unsupported chain ID: 999999. Supported chains: 1, 10"));
}

#[tokio::test]
async fn blockscout_address_info_uses_v2_api() {
    let m = mock("GET", "/api/v2/addresses/0xaddressinfo")
        .with_status(200)
        .with_body(r#"{"hash":"0xaddressinfo","is_contract":false}"#)
        .create();

    let reply = call_tool(
        &handler(),
        "blockscout_address_info",
        json!({ "address": "0xaddressinfo", "chainId": "1" }),
    )
    .await;

    m.assert();
    let data: Value = serde_json::from_str(text_of(&reply)).unwrap();
    assert_eq!(data["is_contract"], false);
}

#[tokio::test]
async fn blockscout_unsupported_chain_is_a_tool_error() {
    let reply = call_tool(
        &handler(),
        "blockscout_address_info",
        json!({ "address": "0x1", "chainId": "424242" }),
    )
    .await;
    assert_eq!(reply["result"]["isError"], true);
    assert!(text_of(&reply).starts_with("Unsupported chain ID: 424242"));
}

#[tokio::test]
async fn contract_methods_combines_read_and_write() {
    let read = mock("GET", "/api/v2/smart-contracts/0xmethods/methods-read")
        .with_status(200)
        .with_body(r#"[{"name":"balanceOf"}]"#)
        .create();
    let write = mock("GET", "/api/v2/smart-contracts/0xmethods/methods-write")
        .with_status(200)
        .with_body(r#"[{"name":"transfer"}]"#)
        .create();

    let reply = call_tool(
        &handler(),
        "blockscout_contract_methods",
        json!({ "address": "0xmethods", "chainId": "8453" }),
    )
    .await;

    read.assert();
    write.assert();
    let data: Value = serde_json::from_str(text_of(&reply)).unwrap();
    assert_eq!(data["readMethods"][0]["name"], "balanceOf");
    assert_eq!(data["writeMethods"][0]["name"], "transfer");
}

#[tokio::test]
async fn resources_merge_dune_chains() {
    let _m = mock("GET", "/v1/evm/supported-chains")
        .with_status(200)
        .with_body(
            r#"{"chains":[
                {"chain_id":1,"name":"ethereum","endpoints":{"balances":true,"activity":false}},
                {"chain_id":7777777,"name":"zora","endpoints":{"balances":true}}
            ]}"#,
        )
        .create();
    let h = handler();

    let reply = call(&h, 1, "resources/read", json!({ "uri": "dune://evm/supported-chains" })).await;
    let contents = &reply["result"]["contents"][0];
    assert_eq!(contents["mimeType"], "application/json");

    let reply = call(&h, 2, "resources/read", json!({ "uri": "web3-stats://supported-networks" })).await;
    let merged: Value =
        serde_json::from_str(reply["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(merged["networks"]["1"]["dune"]["capabilities"], json!({ "balances": true }));
    assert_eq!(merged["networks"]["7777777"]["blockscout"]["available"], false);
    assert_eq!(merged["summary"]["totalNetworks"], 10);
    assert_eq!(merged["summary"]["bothApis"], 1);
    assert_eq!(merged["summary"]["duneOnly"], 1);

    let reply = call(&h, 3, "resources/list", json!({})).await;
    assert_eq!(reply["result"]["resources"].as_array().unwrap().len(), 7);

    let reply = call(&h, 4, "resources/read", json!({ "uri": "web3-stats://tokens/stablecoins" })).await;
    let doc: Value =
        serde_json::from_str(reply["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(doc["stablecoins"]["1"]["USDT"], "0xdAC17F958D2ee523a2206206994597C13D831ec7");

    let reply = call(&h, 5, "resources/read", json!({ "uri": "nope://x" })).await;
    assert_eq!(reply["error"]["code"], -32602);
}

#[tokio::test]
async fn prompts_render_arguments() {
    let h = handler();
    let reply = call(&h, 1, "prompts/list", json!({})).await;
    assert_eq!(reply["result"]["prompts"].as_array().unwrap().len(), 18);

    let reply = call(
        &h,
        2,
        "prompts/get",
        json!({ "name": "evm_wallet_overview", "arguments": { "walletAddress": "0xfeed" } }),
    )
    .await;
    let messages = reply["result"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0]["content"]["text"].as_str().unwrap().contains("0xfeed"));
}

#[tokio::test]
async fn unknown_method_and_notifications() {
    let h = handler();
    let reply = call(&h, 7, "wallet/drain", json!({})).await;
    assert_eq!(reply["error"]["code"], -32601);
    assert_eq!(reply["id"], 7);

    let ctx = CallContext::new("test", None);
    let note = RpcRequest::new(Value::Null, "notifications/initialized", None);
    assert!(h.handle(note, &ctx).await.is_none());
}

#[tokio::test]
async fn initialize_round_trip_over_http() {
    let cli = Cli::try_parse_from(["web3_stats_mcp", "--transport", "http", "--host", "127.0.0.1"]).unwrap();
    let config = Config::from_lookup(&cli, |key| match key {
        "DUNE_API_KEY" => Some("test-key".to_string()),
        _ => None,
    })
    .unwrap();
    let rpc: Arc<dyn RpcService> = Arc::new(handler());
    let app = build_app(AppState::new(config, rpc));

    let req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": { "protocolVersion": "2024-11-05", "capabilities": {} }
            })
            .to_string(),
        ))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session_id = res.headers()["mcp-session-id"].to_str().unwrap().to_string();

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(body["result"]["serverInfo"]["name"], "MCPWeb3Stats");

    let req = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .header("mcp-session-id", &session_id)
        .body(Body::from(json!({"jsonrpc": "2.0", "id": "x", "method": "ping"}).to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "id": "x", "result": {}}));
}

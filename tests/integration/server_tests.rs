/// End-to-end tests: the real client against the real server over pipes
use serde_json::{json, Value};

use skinguide_mcp::mcp::{ErrorKind, LifecycleState};
use skinguide_mcp::ClientError;

use crate::{client_info, start_server};

#[tokio::test]
async fn test_handshake_and_tool_list() {
    let (client, server) = start_server();

    let init = client.initialize(client_info()).await.unwrap();
    assert_eq!(init.protocol_version, "2024-11-05");
    assert_eq!(init.server_info.name, "skinguide-mcp-server");
    assert!(init.capabilities.tools.is_some());
    assert_eq!(client.state(), LifecycleState::Ready);

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["search_products", "get_skin_type_info", "list_skin_types", "get_product_types"]);

    let skin_type = tools.iter().find(|t| t.name == "get_skin_type_info").unwrap();
    assert_eq!(skin_type.input_schema["type"], json!("object"));
    assert_eq!(skin_type.input_schema["required"], json!(["skinType"]));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_get_skin_type_info_ospt() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let info = client.call_tool("get_skin_type_info", json!({"skinType": "OSPT"})).await.unwrap();
    assert_eq!(info["code"], json!("OSPT"));
    assert_eq!(info["name"], json!("Oily, Sensitive, Pigmented, Tight"));
    assert_eq!(info["category"], json!("oily-sensitive"));
    assert_eq!(info["difficulty"], json!(4));
    assert!(info["description"].as_str().unwrap().contains("acne-prone"));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_skin_type_is_tool_failure() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let err = client.call_tool("get_skin_type_info", json!({"skinType": "ZZZZ"})).await.unwrap_err();
    match &err {
        ClientError::Remote { kind, message, .. } => {
            assert_eq!(*kind, Some(ErrorKind::ToolExecutionFailed));
            assert!(message.starts_with("Unknown skin type \"ZZZZ\""), "{}", message);
        }
        other => panic!("expected remote error, got {:?}", other),
    }

    // The connection stays usable after a failed tool
    let list = client.call_tool("list_skin_types", json!({})).await.unwrap();
    assert_eq!(list["total"], json!(16));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_tool_and_bad_arguments() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let err = client.call_tool("find_products", json!({})).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::UnknownTool));

    let err = client.call_tool("search_products", json!({"limit": 0})).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidArguments));

    let err = client.call_tool("search_products", json!({"od": "X"})).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidArguments));

    let err = client.call_tool("get_skin_type_info", json!({"skinType": "OSP"})).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidArguments));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_search_products_filters() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let result = client
        .call_tool("search_products", json!({"od": "O", "sr": "S", "budget": 30, "limit": 5}))
        .await
        .unwrap();
    let ids: Vec<u64> = result["products"].as_array().unwrap().iter().map(|p| p["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 5]);
    assert_eq!(result["total"], json!(2));
    assert_eq!(result["query"]["type"], json!("all"));
    assert_eq!(result["query"]["country"], json!("US"));
    assert_eq!(result["query"]["od"], json!("O"));

    let result = client
        .call_tool("search_products", json!({"type": "Moisturizer", "country": "UAE", "limit": 1}))
        .await
        .unwrap();
    assert_eq!(result["total"], json!(1));
    assert_eq!(result["products"][0]["id"], json!(4));
    assert_eq!(result["products"][0]["skinTypes"], json!(["OSPW"]));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_server_rejects_calls_before_handshake() {
    let (client, server) = start_server();

    // Bypass the client-side guard to see what the server itself does
    let err = client
        .connection()
        .call("tools/call", json!({"name": "list_skin_types", "arguments": {}}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::NotInitialized));

    let err = client.call_tool("list_skin_types", json!({})).await.unwrap_err();
    assert!(matches!(err, ClientError::NotInitialized));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_concurrent_tool_calls_over_one_connection() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let codes = ["OSPT", "DRNT", "ORNW", "DSPW", "OSNT", "DRPT"];
    let calls = codes
        .iter()
        .map(|code| client.call_tool("get_skin_type_info", json!({"skinType": code})));
    let results: Vec<Value> = futures::future::try_join_all(calls).await.unwrap();

    for (code, info) in codes.iter().zip(&results) {
        assert_eq!(info["code"], json!(code));
    }

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_double_initialize_is_refused() {
    let (client, server) = start_server();
    client.initialize(client_info()).await.unwrap();

    let err = client.initialize(client_info()).await.unwrap_err();
    assert!(matches!(err, ClientError::AlreadyInitialized));

    let err = client.connection().call("initialize", json!({})).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidRequest));

    client.shutdown().await.unwrap();
    server.await.unwrap().unwrap();
}

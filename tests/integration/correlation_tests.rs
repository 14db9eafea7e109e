/// Request correlation against a scripted peer: reply ordering, stray ids
/// and transport shutdown
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use skinguide_mcp::mcp::ErrorKind;
use skinguide_mcp::{ClientError, McpClient};

use crate::{client_info, scripted, tool_result};

#[tokio::test]
async fn test_out_of_order_replies_reach_their_callers() {
    let (connection, mut peer) = scripted();
    let client = McpClient::from_connection(connection);

    let peer_task = tokio::spawn(async move {
        peer.accept_handshake().await;

        let ping = peer.next().await;
        assert_eq!(ping["id"], json!(2));
        peer.reply(2, json!({})).await;

        let first = peer.next().await;
        let second = peer.next().await;
        assert_eq!(first["id"], json!(3));
        assert_eq!(first["params"]["name"], json!("list_skin_types"));
        assert_eq!(second["id"], json!(4));
        assert_eq!(second["params"]["name"], json!("get_product_types"));

        // Answer the later request first
        peer.reply(4, tool_result(json!({"productTypes": [], "total": 0}))).await;
        peer.reply(3, tool_result(json!({"skinTypes": [], "total": 16}))).await;
        peer
    });

    client.initialize(client_info()).await.unwrap();
    client.ping().await.unwrap();

    let (skin_types, product_types) = tokio::join!(
        client.call_tool("list_skin_types", json!({})),
        client.call_tool("get_product_types", json!({})),
    );
    assert_eq!(skin_types.unwrap()["total"], json!(16));
    assert_eq!(product_types.unwrap()["total"], json!(0));
    assert_eq!(client.connection().pending(), 0);

    peer_task.await.unwrap();
}

#[tokio::test]
async fn test_permuted_replies_match_by_id() {
    const CALLS: u64 = 16;
    let (connection, mut peer) = scripted();

    let peer_task = tokio::spawn(async move {
        let mut requests = Vec::new();
        for _ in 0..CALLS {
            requests.push(peer.next().await);
        }
        // Deterministic shuffle: a stride coprime to the call count
        for i in 0..CALLS as usize {
            let request = &requests[(i * 7) % CALLS as usize];
            let id = request["id"].as_u64().unwrap();
            peer.reply(id, json!({"echo": request["params"]["n"]})).await;
        }
        peer
    });

    let shared = &connection;
    let calls = (0..CALLS).map(|n| async move { (n, shared.call("echo", json!({"n": n})).await) });
    let results = futures::future::join_all(calls).await;

    for (n, result) in results {
        assert_eq!(result.unwrap(), json!({"echo": n}));
    }
    assert_eq!(connection.pending(), 0);
    peer_task.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_reach_the_wire_in_id_order() {
    const CALLS: u64 = 32;
    let (connection, mut peer) = scripted();
    let connection = Arc::new(connection);

    let peer_task = tokio::spawn(async move {
        let mut ids = Vec::new();
        for _ in 0..CALLS {
            let request = peer.next().await;
            ids.push(request["id"].as_u64().unwrap());
        }
        for &id in &ids {
            peer.reply(id, json!(id)).await;
        }
        (ids, peer)
    });

    let mut callers = Vec::new();
    for n in 0..CALLS {
        let connection = Arc::clone(&connection);
        callers.push(tokio::spawn(async move { connection.call("echo", json!({"n": n})).await }));
    }
    for caller in callers {
        caller.await.unwrap().unwrap();
    }

    let (ids, _peer) = peer_task.await.unwrap();
    assert_eq!(ids, (1..=CALLS).collect::<Vec<_>>());
    assert_eq!(connection.pending(), 0);
}

#[tokio::test]
async fn test_stray_reply_is_discarded() {
    let (connection, mut peer) = scripted();

    let peer_task = tokio::spawn(async move {
        let request = peer.next().await;
        let id = request["id"].as_u64().unwrap();
        peer.reply(999, json!("nobody asked")).await;
        peer.send(json!({"jsonrpc": "2.0", "id": id})).await; // neither result nor error
        peer.send(json!("not a message")).await;
        peer.reply(id, json!("mine")).await;
        peer
    });

    let value = connection.call("tools/list", Value::Null).await.unwrap();
    assert_eq!(value, json!("mine"));
    peer_task.await.unwrap();
}

#[tokio::test]
async fn test_error_payload_surfaces_as_remote_error() {
    let (connection, mut peer) = scripted();

    let peer_task = tokio::spawn(async move {
        let request = peer.next().await;
        let id = request["id"].as_u64().unwrap();
        peer.send(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32602, "message": "Unknown tool: nope", "data": {"kind": "UnknownTool"}}
        }))
        .await;
        peer
    });

    let err = connection
        .call("tools/call", json!({"name": "nope", "arguments": {}}))
        .await
        .unwrap_err();
    match err {
        ClientError::Remote { kind, code, message } => {
            assert_eq!(kind, Some(ErrorKind::UnknownTool));
            assert_eq!(code, -32602);
            assert_eq!(message, "Unknown tool: nope");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
    peer_task.await.unwrap();
}

#[tokio::test]
async fn test_transport_close_fails_pending_call() {
    let (connection, mut peer) = scripted();

    let peer_task = tokio::spawn(async move {
        let request = peer.next().await;
        assert_eq!(request["id"], json!(1));
        drop(peer);
    });

    let err = connection.call("tools/call", json!({"name": "list_skin_types"})).await.unwrap_err();
    assert!(matches!(err, ClientError::TransportClosed));
    assert_eq!(err.kind(), Some(ErrorKind::TransportClosed));
    assert_eq!(connection.pending(), 0);
    peer_task.await.unwrap();

    // Later calls fail immediately instead of hanging
    let err = connection.call("ping", Value::Null).await.unwrap_err();
    assert!(matches!(err, ClientError::TransportClosed));
}

#[tokio::test]
async fn test_concurrent_pending_calls_all_drained() {
    let (connection, mut peer) = scripted();

    let peer_task = tokio::spawn(async move {
        for _ in 0..3 {
            peer.next().await;
        }
        drop(peer);
    });

    let (a, b, c) = tokio::join!(
        connection.call("a", Value::Null),
        connection.call("b", Value::Null),
        connection.call("c", Value::Null),
    );
    for result in [a, b, c] {
        assert!(matches!(result, Err(ClientError::TransportClosed)));
    }
    peer_task.await.unwrap();
}

#[tokio::test]
async fn test_client_answers_server_ping() {
    let (connection, mut peer) = scripted();

    peer.send(json!({"jsonrpc": "2.0", "id": 50, "method": "ping"})).await;
    let reply = peer.next().await;
    assert_eq!(reply, json!({"jsonrpc": "2.0", "id": 50, "result": {}}));

    peer.send(json!({"jsonrpc": "2.0", "id": 51, "method": "sampling/createMessage"})).await;
    let reply = peer.next().await;
    assert_eq!(reply["id"], json!(51));
    assert_eq!(reply["error"]["code"], json!(-32601));

    assert_eq!(connection.pending(), 0);
}

#[tokio::test]
async fn test_notification_has_no_id_and_no_reply() {
    let (connection, mut peer) = scripted();

    connection.notify("notifications/cancelled", json!({"requestId": 7})).await.unwrap();
    let message = peer.next().await;
    assert_eq!(message["method"], json!("notifications/cancelled"));
    assert!(message.get("id").is_none());
    assert_eq!(connection.pending(), 0);
}

#[tokio::test]
async fn test_identifiers_are_never_reused() {
    let (connection, mut peer) = scripted();
    let connection = connection.with_timeout(Duration::from_millis(50));

    let peer_task = tokio::spawn(async move {
        let mut seen = HashSet::new();
        for _ in 0..3 {
            let request = peer.next().await;
            let id = request["id"].as_u64().unwrap();
            assert!(seen.insert(id), "id {} reused", id);
            if id != 2 {
                peer.reply(id, json!(id)).await;
            }
        }
        // Late reply for the call that already timed out
        peer.reply(2, json!("late")).await;
        peer
    });

    assert_eq!(connection.call("one", Value::Null).await.unwrap(), json!(1));
    let err = connection.call("two", Value::Null).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }));
    assert_eq!(connection.call("three", Value::Null).await.unwrap(), json!(3));

    let _peer = peer_task.await.unwrap();
    assert_eq!(connection.pending(), 0);
}

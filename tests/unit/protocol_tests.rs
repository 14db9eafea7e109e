/// Wire codec tests
use serde_json::{json, Value};

use skinguide_mcp::mcp::protocol::*;

fn reparse(message: Message) -> Message {
    let line = message.to_line().expect("Failed to serialize");
    assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1);
    let text = std::str::from_utf8(&line).expect("Line is not UTF-8");
    Message::parse(text.trim_end()).expect("Failed to parse line back")
}

#[test]
fn test_request_survives_the_wire() {
    let request = Request::new(
        12,
        "tools/call",
        json!({"name": "search_products", "arguments": {"type": "Toner", "note": "line\nbreak"}}),
    );
    let Message::Request(parsed) = reparse(Message::from(request.clone())) else {
        panic!("expected a request");
    };
    assert_eq!(parsed.id, request.id);
    assert_eq!(parsed.method, request.method);
    assert_eq!(parsed.params, request.params);
}

#[test]
fn test_request_without_params_omits_the_field() {
    let line = Message::from(Request::new(1, "tools/list", Value::Null)).to_line().unwrap();
    let value: Value = serde_json::from_slice(&line).unwrap();
    assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}));
}

#[test]
fn test_response_carries_exactly_one_payload() {
    let ok: Value = serde_json::from_slice(&Message::from(Response::success(3, json!([]))).to_line().unwrap()).unwrap();
    assert!(ok.get("error").is_none());
    assert_eq!(ok["result"], json!([]));

    let error = RpcError::new(ErrorKind::NotInitialized, "not yet");
    let err: Value = serde_json::from_slice(&Message::from(Response::error(3, error)).to_line().unwrap()).unwrap();
    assert!(err.get("result").is_none());
    assert_eq!(err["error"]["code"], json!(-32002));
    assert_eq!(err["error"]["data"]["kind"], json!("NotInitialized"));
}

#[test]
fn test_error_codes() {
    let cases = [
        (ErrorKind::MalformedLine, -32700),
        (ErrorKind::InvalidRequest, -32600),
        (ErrorKind::MethodNotFound, -32601),
        (ErrorKind::UnknownTool, -32602),
        (ErrorKind::InvalidArguments, -32602),
        (ErrorKind::ToolExecutionFailed, -32603),
        (ErrorKind::NotInitialized, -32002),
        (ErrorKind::NoMatchingRequest, -32003),
        (ErrorKind::TransportClosed, -32000),
    ];
    for (kind, code) in cases {
        let error = RpcError::new(kind, "x");
        assert_eq!(error.code, code, "{}", kind);
        assert_eq!(error.kind(), Some(kind));
    }
}

#[test]
fn test_initialize_params_use_camel_case() {
    let params = InitializeParams {
        protocol_version: MCP_VERSION.to_string(),
        capabilities: json!({}),
        client_info: Implementation {
            name: "unit".to_string(),
            version: "1.0.0".to_string(),
        },
    };
    let value = serde_json::to_value(params).unwrap();
    assert_eq!(value["protocolVersion"], json!("2024-11-05"));
    assert_eq!(value["clientInfo"]["name"], json!("unit"));
}

#[test]
fn test_tool_call_arguments_default_to_empty_object() {
    let params: ToolCallParams = serde_json::from_value(json!({"name": "list_skin_types"})).unwrap();
    assert_eq!(params.arguments, json!({}));
}

//! JsonRpcClient against a canned local JSON-RPC endpoint.

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use chainwatch_client::{ChainClient, ChainError, ClientConfig, JsonRpcClient};
use chainwatch_types::Address;

struct Canned {
    responses: Mutex<VecDeque<(u16, String)>>,
    seen: Mutex<mpsc::Sender<Value>>,
}

async fn answer(
    State(canned): State<Arc<Canned>>,
    Json(request): Json<Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let _ = canned.seen.lock().unwrap().send(request);
    let (status, body) = canned
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, "no canned response left".into()));
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Serve one canned response per request on a background runtime,
/// returning the endpoint URL and the request bodies seen.
fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    let canned = Arc::new(Canned {
        responses: Mutex::new(responses.into()),
        seen: Mutex::new(tx),
    });
    let app = Router::new().route("/", post(answer)).with_state(canned);

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    (url, rx)
}

fn client(url: &str) -> JsonRpcClient {
    JsonRpcClient::new(ClientConfig::new(url)).unwrap()
}

#[test]
fn head_decodes_hex_quantity() {
    let (url, requests) = serve(vec![(200, r#"{"jsonrpc":"2.0","id":1,"result":"0x10d4f"}"#.into())]);
    assert_eq!(client(&url).head().unwrap(), 68943);

    let request = requests.recv().unwrap();
    assert_eq!(request["method"], "eth_blockNumber");
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["params"], serde_json::json!([]));
}

#[test]
fn request_ids_increase() {
    let ok = r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#.to_string();
    let (url, requests) = serve(vec![(200, ok.clone()), (200, ok)]);
    let client = client(&url);
    client.head().unwrap();
    client.head().unwrap();

    let first = requests.recv().unwrap()["id"].as_u64().unwrap();
    let second = requests.recv().unwrap()["id"].as_u64().unwrap();
    assert!(second > first);
}

#[test]
fn tx_count_sends_address_and_block_tag() {
    let (url, requests) = serve(vec![(200, r#"{"jsonrpc":"2.0","id":1,"result":"0x2a"}"#.into())]);
    let address = Address::parse("0xa7d9ddbe1f17865597fbd27ec712455208b6b76d").unwrap();
    assert_eq!(client(&url).tx_count_as_of(&address, 436).unwrap(), 42);

    let request = requests.recv().unwrap();
    assert_eq!(request["method"], "eth_getTransactionCount");
    assert_eq!(
        request["params"],
        serde_json::json!(["0xa7d9ddbe1f17865597fbd27ec712455208b6b76d", "0x1b4"])
    );
}

#[test]
fn block_request_asks_for_full_transactions() {
    let body = format!(
        r#"{{"jsonrpc":"2.0","id":1,"result":{{"number":"0x5","hash":"0x{}","transactions":[]}}}}"#,
        "11".repeat(32)
    );
    let (url, requests) = serve(vec![(200, body)]);
    let block = client(&url).block_transactions(5).unwrap();
    assert_eq!(block.number, 5);
    assert!(block.transactions.is_empty());

    let request = requests.recv().unwrap();
    assert_eq!(request["params"], serde_json::json!(["0x5", true]));
}

#[test]
fn non_200_status_carries_body() {
    let (url, _requests) = serve(vec![(503, "upstream overloaded".into())]);
    match client(&url).head() {
        Err(ChainError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream overloaded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn error_object_becomes_rpc_error() {
    let (url, _requests) = serve(vec![(
        200,
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#.into(),
    )]);
    match client(&url).head() {
        Err(ChainError::Rpc { code, message }) => {
            assert_eq!(code, -32000);
            assert_eq!(message, "header not found");
        }
        other => panic!("expected rpc error, got {other:?}"),
    }
}

#[test]
fn null_block_is_missing_result() {
    let (url, _requests) = serve(vec![(200, r#"{"jsonrpc":"2.0","id":1,"result":null}"#.into())]);
    assert!(matches!(
        client(&url).block_transactions(99_999_999),
        Err(ChainError::MissingResult(_))
    ));
}

#[test]
fn unreachable_node_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    assert!(matches!(client(&url).head(), Err(ChainError::Transport(_))));
}

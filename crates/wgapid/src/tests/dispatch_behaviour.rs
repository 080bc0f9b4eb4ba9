//! Behavioural tests for JSON-RPC peer management.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use crate::provider::{Key, MemoryProvider, PeerState};
use crate::rpc::{self, Dispatcher};

use super::support::TEST_DEVICE;

struct DispatchWorld {
    provider: Arc<MemoryProvider>,
    dispatcher: Dispatcher<Arc<MemoryProvider>>,
    response: Option<Value>,
}

impl DispatchWorld {
    fn new() -> Self {
        let provider = Arc::new(MemoryProvider::new(TEST_DEVICE));
        Self {
            dispatcher: Dispatcher::new(TEST_DEVICE, Arc::clone(&provider)),
            provider,
            response: None,
        }
    }

    fn seed_peer(&mut self, key: &str) {
        let mut peers = self.provider.snapshot().peers;
        peers.push(PeerState::new(parse_key(key)));
        let provider = Arc::new(MemoryProvider::new(TEST_DEVICE).with_peers(peers));
        self.dispatcher = Dispatcher::new(TEST_DEVICE, Arc::clone(&provider));
        self.provider = provider;
    }

    fn send(&mut self, body: &str) {
        let response = self.dispatcher.handle(body.as_bytes());
        let encoded = rpc::encode(&response);
        self.response = Some(serde_json::from_slice(&encoded).expect("response is JSON"));
    }

    fn call(&mut self, method: &str, params: Option<&str>) {
        let body = match params {
            Some(params) => {
                format!(r#"{{"jsonrpc":"2.0","method":"{method}","params":{params},"id":1}}"#)
            }
            None => format!(r#"{{"jsonrpc":"2.0","method":"{method}","id":1}}"#),
        };
        self.send(&body);
    }

    fn response(&self) -> &Value {
        self.response.as_ref().expect("no response recorded")
    }

    fn peer(&self, key: &str) -> Option<PeerState> {
        let key = parse_key(key);
        self.provider
            .snapshot()
            .peers
            .into_iter()
            .find(|peer| peer.public_key == key)
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("an interface without peers")]
fn given_empty_interface(world: &RefCell<DispatchWorld>) {
    assert!(world.borrow().provider.snapshot().peers.is_empty());
}

#[given("the interface has peer {key}")]
fn given_peer(world: &RefCell<DispatchWorld>, key: String) {
    world.borrow_mut().seed_peer(strip_quotes(&key));
}

#[when("the client calls {method} without params")]
fn when_call_without_params(world: &RefCell<DispatchWorld>, method: String) {
    world.borrow_mut().call(strip_quotes(&method), None);
}

#[when("the client calls {method} with {params}")]
fn when_call_with_params(world: &RefCell<DispatchWorld>, method: String, params: String) {
    world
        .borrow_mut()
        .call(strip_quotes(&method), Some(strip_single_quotes(&params)));
}

#[when("the client sends {body}")]
fn when_client_sends(world: &RefCell<DispatchWorld>, body: String) {
    world.borrow_mut().send(strip_single_quotes(&body));
}

#[then("the response carries error code {code}")]
fn then_error_code(world: &RefCell<DispatchWorld>, code: i64) {
    let world = world.borrow();
    let response = world.response();
    assert_eq!(response["error"]["code"], code, "response: {response}");
    assert!(response.get("result").is_none(), "response: {response}");
}

#[then("the error message reads {message}")]
fn then_error_message(world: &RefCell<DispatchWorld>, message: String) {
    let world = world.borrow();
    assert_eq!(
        world.response()["error"]["message"],
        strip_quotes(&message),
        "response: {}",
        world.response()
    );
}

#[then("the error message mentions {text}")]
fn then_error_mentions(world: &RefCell<DispatchWorld>, text: String) {
    let world = world.borrow();
    let message = world.response()["error"]["message"]
        .as_str()
        .expect("error message")
        .to_owned();
    let text = strip_single_quotes(&text);
    assert!(message.contains(text), "{message:?} should mention {text:?}");
}

#[then("the response result is {result}")]
fn then_result(world: &RefCell<DispatchWorld>, result: String) {
    let expected: Value =
        serde_json::from_str(strip_single_quotes(&result)).expect("expected result is JSON");
    let world = world.borrow();
    let response = world.response();
    assert_eq!(response["result"], expected, "response: {response}");
    assert!(response.get("error").is_none(), "response: {response}");
}

#[then("the response id is {id}")]
fn then_response_id(world: &RefCell<DispatchWorld>, id: String) {
    let expected: Value =
        serde_json::from_str(strip_single_quotes(&id)).expect("expected id is JSON");
    assert_eq!(world.borrow().response()["id"], expected);
}

#[then("the result lists {count} peers")]
fn then_result_lists(world: &RefCell<DispatchWorld>, count: usize) {
    let world = world.borrow();
    let peers = world.response()["result"]["peers"]
        .as_array()
        .expect("peers array");
    assert_eq!(peers.len(), count);
}

#[then("the interface has {count} peers")]
fn then_interface_peer_count(world: &RefCell<DispatchWorld>, count: usize) {
    assert_eq!(world.borrow().provider.snapshot().peers.len(), count);
}

#[then("peer {key} allows {ranges}")]
fn then_peer_allows(world: &RefCell<DispatchWorld>, key: String, ranges: String) {
    let peer = world
        .borrow()
        .peer(strip_quotes(&key))
        .expect("peer should exist");
    let allowed: Vec<String> = peer.allowed_ips.iter().map(ToString::to_string).collect();
    assert_eq!(allowed.join(","), strip_quotes(&ranges));
}

#[then("peer {key} is absent")]
fn then_peer_absent(world: &RefCell<DispatchWorld>, key: String) {
    assert!(world.borrow().peer(strip_quotes(&key)).is_none());
}

fn parse_key(text: &str) -> Key {
    Key::from_base64(text).expect("test key is valid")
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

fn strip_single_quotes(s: &str) -> &str {
    s.trim_matches('\'')
}

#[scenario(path = "tests/features/peer_management.feature")]
fn peer_management(#[from(world)] world: RefCell<DispatchWorld>) {
    drop(world);
}

//! Behavioural tests for the HTTP binding and middleware chain.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use wgapi_config::ListenEndpoint;

use crate::provider::MemoryProvider;
use crate::rpc::Dispatcher;
use crate::transport::{HttpConnectionHandler, ListenerHandle, SocketListener, send_request};

use super::support::TEST_DEVICE;

const DEVICE_INFO: &str = r#"{"jsonrpc":"2.0","method":"GetDeviceInfo","id":1}"#;

struct HttpWorld {
    tokens: Vec<String>,
    listener: Option<ListenerHandle>,
    address: Option<SocketAddr>,
    status: Option<u16>,
    body: String,
}

impl HttpWorld {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            listener: None,
            address: None,
            status: None,
            body: String::new(),
        }
    }

    fn start(&mut self) {
        let listener =
            SocketListener::bind(&ListenEndpoint::tcp("127.0.0.1", 0)).expect("bind listener");
        self.address = listener.local_addr();
        let dispatcher = Arc::new(Dispatcher::new(
            TEST_DEVICE,
            MemoryProvider::new(TEST_DEVICE),
        ));
        let handler = Arc::new(HttpConnectionHandler::new(dispatcher, self.tokens.clone()));
        self.listener = Some(listener.start(handler).expect("start listener"));
    }

    fn send(&mut self, method: &str, headers: &[(&str, &str)]) {
        let addr = self.address.expect("listener address should be set");
        let (status, body) = send_request(addr, method, headers, DEVICE_INFO);
        self.status = Some(status);
        self.body = body;
    }
}

impl Drop for HttpWorld {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

#[fixture]
fn world() -> RefCell<HttpWorld> {
    RefCell::new(HttpWorld::new())
}

#[given("the API server accepts token {token}")]
fn given_token(world: &RefCell<HttpWorld>, token: String) {
    world
        .borrow_mut()
        .tokens
        .push(strip_quotes(&token).to_owned());
}

#[given("the API server is running")]
fn given_running(world: &RefCell<HttpWorld>) {
    world.borrow_mut().start();
}

#[when("a client posts a JSON request")]
fn when_post(world: &RefCell<HttpWorld>) {
    world
        .borrow_mut()
        .send("POST", &[("Content-Type", "application/json")]);
}

#[when("a client posts a JSON request with authorization {value}")]
fn when_post_with_authorization(world: &RefCell<HttpWorld>, value: String) {
    world.borrow_mut().send(
        "POST",
        &[
            ("Content-Type", "application/json"),
            ("Authorization", strip_quotes(&value)),
        ],
    );
}

#[when("a client posts a JSON request with header {name} set to {value}")]
fn when_post_with_header(world: &RefCell<HttpWorld>, name: String, value: String) {
    world.borrow_mut().send(
        "POST",
        &[
            ("Content-Type", "application/json"),
            (strip_quotes(&name), strip_quotes(&value)),
        ],
    );
}

#[when("a client posts the request as {content_type}")]
fn when_post_as(world: &RefCell<HttpWorld>, content_type: String) {
    world
        .borrow_mut()
        .send("POST", &[("Content-Type", strip_quotes(&content_type))]);
}

#[when("a client sends a {method} request")]
fn when_client_sends(world: &RefCell<HttpWorld>, method: String) {
    world.borrow_mut().send(strip_quotes(&method), &[]);
}

#[then("the HTTP status is {status}")]
fn then_status(world: &RefCell<HttpWorld>, status: u16) {
    let world = world.borrow();
    assert_eq!(world.status, Some(status), "body: {}", world.body);
}

#[then("the HTTP body reads {text}")]
fn then_body_reads(world: &RefCell<HttpWorld>, text: String) {
    assert_eq!(world.borrow().body.trim_end(), strip_single_quotes(&text));
}

#[then("the JSON-RPC result names device {name}")]
fn then_result_device(world: &RefCell<HttpWorld>, name: String) {
    let body: Value = serde_json::from_str(&world.borrow().body).expect("JSON body");
    assert_eq!(body["result"]["device"]["name"], strip_quotes(&name));
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

fn strip_single_quotes(s: &str) -> &str {
    s.trim_matches('\'')
}

#[scenario(path = "tests/features/http_api.feature")]
fn http_api(#[from(world)] world: RefCell<HttpWorld>) {
    drop(world);
}

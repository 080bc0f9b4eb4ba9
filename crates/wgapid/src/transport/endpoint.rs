//! JSON-RPC endpoint at the end of the middleware chain.

use std::sync::Arc;

use wgapi_types::CONTENT_TYPE;

use super::http::{Request, Response, StatusCode};
use super::middleware::Handler;
use crate::provider::InterfaceControl;
use crate::rpc::{self, Dispatcher};

/// Accepts `POST` requests with a JSON body and answers with the encoded
/// JSON-RPC response. Every JSON-RPC outcome, including parse errors, is
/// returned with status 200.
pub(crate) struct RpcEndpoint<P> {
    dispatcher: Arc<Dispatcher<P>>,
}

impl<P> RpcEndpoint<P> {
    pub(crate) fn new(dispatcher: Arc<Dispatcher<P>>) -> Self {
        Self { dispatcher }
    }
}

impl<P: InterfaceControl> Handler for RpcEndpoint<P> {
    fn handle(&self, request: &Request) -> Response {
        if request.method() != "POST" {
            return Response::error(StatusCode::MethodNotAllowed, "method not allowed")
                .with_header("Allow", "POST");
        }
        let content_type = request.header("Content-Type").unwrap_or_default();
        if !content_type.starts_with(CONTENT_TYPE) {
            return Response::error(
                StatusCode::BadRequest,
                format!("unknown content type {content_type:?}"),
            );
        }
        let response = self.dispatcher.handle(request.body());
        Response::json(rpc::encode(&response))
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    use super::*;
    use crate::provider::MemoryProvider;

    #[fixture]
    fn endpoint() -> RpcEndpoint<MemoryProvider> {
        RpcEndpoint::new(Arc::new(Dispatcher::new("wg0", MemoryProvider::new("wg0"))))
    }

    fn json_post(body: &str) -> Request {
        Request::new("POST", "/")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(body.as_bytes().to_vec())
    }

    #[rstest]
    #[case("GET")]
    #[case("PUT")]
    #[case("DELETE")]
    fn non_post_methods_are_not_allowed(
        endpoint: RpcEndpoint<MemoryProvider>,
        #[case] method: &str,
    ) {
        let response = endpoint.handle(&Request::new(method, "/"));
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
        assert_eq!(response.body(), b"method not allowed\n");
    }

    #[rstest]
    fn other_content_types_are_rejected(endpoint: RpcEndpoint<MemoryProvider>) {
        let request = Request::new("POST", "/").with_header("Content-Type", "text/plain");
        let response = endpoint.handle(&request);
        assert_eq!(response.status(), StatusCode::BadRequest);
        assert_eq!(response.body(), b"unknown content type \"text/plain\"\n");
    }

    #[rstest]
    fn rpc_results_are_returned_as_json(endpoint: RpcEndpoint<MemoryProvider>) {
        let response =
            endpoint.handle(&json_post(r#"{"jsonrpc":"2.0","method":"ListPeers","id":1}"#));
        assert_eq!(response.status(), StatusCode::Ok);
        let body: Value = serde_json::from_slice(response.body()).expect("json body");
        assert_eq!(body, json!({"jsonrpc": "2.0", "result": {"peers": []}, "id": 1}));
    }

    #[rstest]
    fn parse_errors_are_still_http_ok(endpoint: RpcEndpoint<MemoryProvider>) {
        let response = endpoint.handle(&json_post("{"));
        assert_eq!(response.status(), StatusCode::Ok);
        let body: Value = serde_json::from_slice(response.body()).expect("json body");
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }
}

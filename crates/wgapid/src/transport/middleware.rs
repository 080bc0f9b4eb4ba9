//! Request middleware.
//!
//! A [`Chain`] runs its middleware in insertion order. Each middleware either
//! answers the request itself or passes it on through [`Next`]; the endpoint
//! sits at the end of the chain.

use std::time::Instant;

use subtle::{Choice, ConstantTimeEq};
use tracing::info;

use super::TRANSPORT_TARGET;
use super::http::{Request, Response, StatusCode};

const FORBIDDEN: &str = "forbidden";
const TOKEN_PREFIX: &str = "Token ";

/// Terminal request handler.
pub(crate) trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> Response;
}

/// A step in the chain that may short-circuit.
pub(crate) trait Middleware: Send + Sync {
    fn handle(&self, request: &Request, next: Next<'_>) -> Response;
}

/// The remainder of the chain after the current middleware.
pub(crate) struct Next<'a> {
    middleware: &'a [Box<dyn Middleware>],
    endpoint: &'a dyn Handler,
}

impl Next<'_> {
    /// Passes the request to the next middleware, or the endpoint.
    pub(crate) fn run(self, request: &Request) -> Response {
        match self.middleware.split_first() {
            Some((current, rest)) => current.handle(
                request,
                Next {
                    middleware: rest,
                    endpoint: self.endpoint,
                },
            ),
            None => self.endpoint.handle(request),
        }
    }
}

/// Ordered middleware in front of an endpoint.
pub(crate) struct Chain {
    middleware: Vec<Box<dyn Middleware>>,
    endpoint: Box<dyn Handler>,
}

impl Chain {
    pub(crate) fn new(endpoint: impl Handler + 'static) -> Self {
        Self {
            middleware: Vec::new(),
            endpoint: Box::new(endpoint),
        }
    }

    /// Appends a middleware; earlier additions run first.
    #[must_use]
    pub(crate) fn with(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }
}

impl Handler for Chain {
    fn handle(&self, request: &Request) -> Response {
        Next {
            middleware: &self.middleware,
            endpoint: self.endpoint.as_ref(),
        }
        .run(request)
    }
}

/// Rejects browser-originated requests carrying `Referer` or `Origin`.
#[derive(Debug, Default)]
pub(crate) struct RefererBlock;

impl Middleware for RefererBlock {
    fn handle(&self, request: &Request, next: Next<'_>) -> Response {
        let from_browser = ["Referer", "Origin"]
            .into_iter()
            .any(|name| request.header(name).is_some());
        if from_browser {
            return Response::error(StatusCode::Forbidden, FORBIDDEN);
        }
        next.run(request)
    }
}

/// Requires `Authorization: Token <value>` to match a configured token.
#[derive(Debug)]
pub(crate) struct TokenAuth {
    tokens: Vec<String>,
}

impl TokenAuth {
    pub(crate) fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    fn accepts(&self, presented: &str) -> bool {
        let matched = self.tokens.iter().fold(Choice::from(0), |found, token| {
            found | token.as_bytes().ct_eq(presented.as_bytes())
        });
        bool::from(matched)
    }
}

impl Middleware for TokenAuth {
    fn handle(&self, request: &Request, next: Next<'_>) -> Response {
        let header = request.header("Authorization").unwrap_or_default();
        let presented = header.strip_prefix(TOKEN_PREFIX).unwrap_or(header).trim();
        if presented.is_empty() || !self.accepts(presented) {
            return Response::error(StatusCode::Forbidden, FORBIDDEN);
        }
        next.run(request)
    }
}

/// Logs each request once the inner handlers have answered it.
#[derive(Debug, Default)]
pub(crate) struct RequestLogger;

impl Middleware for RequestLogger {
    fn handle(&self, request: &Request, next: Next<'_>) -> Response {
        let started = Instant::now();
        let response = next.run(request);
        info!(
            target: TRANSPORT_TARGET,
            method = request.method(),
            path = request.path(),
            remote_addr = request.remote_addr(),
            status = response.status().code(),
            duration = ?started.elapsed(),
            "handled request"
        );
        response
    }
}

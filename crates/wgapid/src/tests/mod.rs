//! Test suites for the API daemon.

mod behaviour;
mod dispatch_behaviour;
mod http_behaviour;
pub(crate) mod support;

//! Request handlers.

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};

/// Turns a fully parsed request into a response.
///
/// Implemented for any `Fn(&Request) -> Response` closure.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

/// Answers every request with an empty `200 OK`.
pub fn empty_ok(_request: &Request) -> Response {
    Response::new(StatusCode::Ok, Vec::new())
}

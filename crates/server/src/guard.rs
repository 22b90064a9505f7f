use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::session::has_session_cookie;

pub const LOGIN_PATH: &str = "/admin";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(&'static str),
}

/// Decides what happens to a request under `/admin`.
///
/// Only the presence of the session cookie is checked. The pages behind the
/// guard call the session-checked API, which rejects stale tokens on its own.
pub fn admin_guard_decision(path: &str, has_cookie: bool) -> GuardDecision {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };
    let is_login = path == LOGIN_PATH;
    match (has_cookie, is_login) {
        (false, false) => GuardDecision::Redirect(LOGIN_PATH),
        (true, true) => GuardDecision::Redirect(DASHBOARD_PATH),
        _ => GuardDecision::Pass,
    }
}

pub async fn admin_guard(request: Request, next: Next) -> Response {
    let has_cookie = has_session_cookie(request.headers());
    match admin_guard_decision(request.uri().path(), has_cookie) {
        GuardDecision::Pass => next.run(request).await,
        GuardDecision::Redirect(target) => {
            debug!(path = %request.uri().path(), target, "admin guard redirect");
            Redirect::to(target).into_response()
        }
    }
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;

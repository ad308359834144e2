//! Authentication endpoint paths and the refresh skip-list.

use crate::api::request::route_of;

pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";
pub const REFRESH: &str = "/auth/refresh";
/// "Who am I" probe used to check whether the session cookie is still valid
pub const ME: &str = "/auth/me";
pub const LOGOUT: &str = "/auth/logout";

/// Paths that must never trigger a refresh, or refresh would recurse.
pub const SKIP_LIST: [&str; 4] = [LOGIN, REGISTER, REFRESH, ME];

pub fn is_probe(path: &str) -> bool {
    route_of(path) == ME
}

pub fn is_skip_listed(path: &str) -> bool {
    let route = route_of(path);
    SKIP_LIST.contains(&route)
}

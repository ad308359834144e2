use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

/// One HTTP call that may need to be replayed after a session refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    /// Path relative to the API base URL, including any query string
    pub path: String,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// The path without its query string.
    pub fn route(&self) -> &str {
        route_of(&self.path)
    }
}

/// Strip the query string (and fragment) from a path.
pub fn route_of(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_strips_query() {
        assert_eq!(route_of("/users/paged?page=0&size=10"), "/users/paged");
        assert_eq!(route_of("/auth/me"), "/auth/me");
        assert_eq!(route_of("/login#top"), "/login");
        assert_eq!(route_of(""), "");
    }

    #[test]
    fn test_constructors() {
        let req = PendingRequest::post("/auth/login", serde_json::json!({"email": "a@b.c"}));
        assert_eq!(req.method, Method::POST);
        assert!(req.body.is_some());

        let req = PendingRequest::get("/quizzes/paged?page=1").with_header(
            HeaderName::from_static("x-trace"),
            HeaderValue::from_static("abc"),
        );
        assert_eq!(req.route(), "/quizzes/paged");
        assert_eq!(req.headers.get("x-trace").map(|v| v.as_bytes()), Some(&b"abc"[..]));
        assert!(req.body.is_none());
    }
}

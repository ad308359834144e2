//! Request dispatcher for the quiz platform API.
//!
//! Sends a `PendingRequest` against the configured base URL and classifies
//! the outcome into `ApiResult`. Status codes are never acted on here; that
//! is the reauthentication wrapper's job.

use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiResult, PendingRequest};
use crate::config::Config;

/// Cookie-carrying HTTP dispatcher.
/// Clone is cheap - reqwest::Client shares its connection pool and cookie jar.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    base_url: String,
}

impl Dispatcher {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Perform one HTTP call. An empty success body yields `Ok(None)`.
    pub async fn dispatch(&self, request: &PendingRequest) -> ApiResult<Option<Value>> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, path = %request.path, "Dispatching request");

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .headers(request.headers.clone());
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(path = %request.path, status = status.as_u16(), "Request failed");
            return Err(ApiError::from_status(status, &body));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let payload: Value = serde_json::from_slice(&bytes)?;
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn dispatcher_for(url: &str) -> Dispatcher {
        let config = Config {
            api_base_url: url.to_string(),
            ..Config::default()
        };
        Dispatcher::new(&config).expect("dispatcher")
    }

    #[test]
    fn test_url_for_joins_paths() {
        let dispatcher = dispatcher_for("http://localhost:8080/api/");
        assert_eq!(dispatcher.url_for("/quizzes"), "http://localhost:8080/api/quizzes");
        assert_eq!(dispatcher.url_for("roles/3"), "http://localhost:8080/api/roles/3");
    }

    #[tokio::test]
    async fn test_dispatch_sets_json_content_type_and_returns_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/quizzes")
            .match_header("content-type", "application/json")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"title": "Rust basics"})))
            .with_status(201)
            .with_body(r#"{"id": 7, "title": "Rust basics"}"#)
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        let result = dispatcher
            .dispatch(&PendingRequest::post("/quizzes", json!({"title": "Rust basics"})))
            .await
            .expect("dispatch ok");

        assert_eq!(result, Some(json!({"id": 7, "title": "Rust basics"})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dispatch_get_without_body_still_sends_content_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/roles")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        let result = dispatcher.dispatch(&PendingRequest::get("/roles")).await;
        assert_eq!(result, Ok(Some(json!([]))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dispatch_empty_body_is_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/quizzes/3")
            .with_status(204)
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        let result = dispatcher.dispatch(&PendingRequest::delete("/quizzes/3")).await;
        assert_eq!(result, Ok(None));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dispatch_classifies_status() {
        let mut server = Server::new_async().await;
        let _unauthorized = server
            .mock("GET", "/users")
            .with_status(401)
            .create_async()
            .await;
        let _server_error = server
            .mock("GET", "/roles")
            .with_status(500)
            .with_body(r#"{"message":"database unavailable"}"#)
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        assert_eq!(
            dispatcher.dispatch(&PendingRequest::get("/users")).await,
            Err(ApiError::Unauthorized)
        );
        assert_eq!(
            dispatcher.dispatch(&PendingRequest::get("/roles")).await,
            Err(ApiError::ServerError {
                status: 500,
                message: "database unavailable".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_dispatch_invalid_json_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/quizzes")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        let result = dispatcher.dispatch(&PendingRequest::get("/quizzes")).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_dispatch_connection_refused_is_network_error() {
        // Port 1 is reserved and nothing listens there
        let dispatcher = dispatcher_for("http://127.0.0.1:1");
        let result = dispatcher.dispatch(&PendingRequest::get("/auth/me")).await;
        assert!(matches!(result, Err(ref e) if e.is_network()), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_dispatch_carries_session_cookie() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/auth/login")
            .with_status(200)
            .with_header("set-cookie", "access_token=abc123; Path=/; HttpOnly")
            .create_async()
            .await;
        let me = server
            .mock("GET", "/auth/me")
            .match_header("cookie", Matcher::Regex("access_token=abc123".to_string()))
            .with_status(200)
            .with_body(r#"{"id": 1}"#)
            .create_async()
            .await;

        let dispatcher = dispatcher_for(&server.url());
        dispatcher
            .dispatch(&PendingRequest::post("/auth/login", json!({})))
            .await
            .expect("login");
        let result = dispatcher.dispatch(&PendingRequest::get("/auth/me")).await;
        assert_eq!(result, Ok(Some(json!({"id": 1}))));
        login.assert_async().await;
        me.assert_async().await;
    }
}

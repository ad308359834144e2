//! Reauthentication wrapper around the dispatcher.
//!
//! Each call runs a small state machine:
//!
//! ```text
//! INITIAL ──ok──────────────────────────────────────────────▶ DONE
//!    └─err─▶ INSPECTING ─probe (401/network)────────────────▶ DONE (Ok(None))
//!                       ─skip-listed────────────────────────▶ DONE (error)
//!                       ─401─▶ REFRESHING ─ok─▶ RETRYING ───▶ DONE (retry result)
//!                                         └fail▶ NOTIFYING ─▶ DONE (original 401)
//!                       ─anything else──────────────────────▶ DONE (error)
//! ```
//!
//! At most one refresh and one retry are issued per original call, strictly
//! in sequence.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::endpoints;
use super::refresh::{RefreshGate, RefreshOutcome};
use super::service::decode_user;
use super::session::SessionStore;
use crate::api::{ApiResult, Dispatcher, PendingRequest};
use crate::config::Config;
use crate::events::{SessionExpired, SessionExpiryNotifier};
use crate::navigation::Router;

/// Dispatcher with silent session refresh.
/// Clone is cheap; clones share the cookie jar, the refresh gate and the notifier.
#[derive(Clone)]
pub struct AuthenticatedClient {
    dispatcher: Dispatcher,
    notifier: SessionExpiryNotifier,
    router: Router,
    refresh_gate: Arc<RefreshGate>,
    /// Reloaded after every successful silent refresh
    session: Option<SessionStore>,
}

impl AuthenticatedClient {
    pub fn new(
        dispatcher: Dispatcher,
        notifier: SessionExpiryNotifier,
        router: Router,
        single_flight_refresh: bool,
    ) -> Self {
        Self {
            dispatcher,
            notifier,
            router,
            refresh_gate: Arc::new(RefreshGate::new(single_flight_refresh)),
            session: None,
        }
    }

    /// Keep `session` in step with the server after silent refreshes.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    /// Build the dispatcher from `config` and wrap it.
    pub fn from_config(
        config: &Config,
        notifier: SessionExpiryNotifier,
        router: Router,
    ) -> ApiResult<Self> {
        let dispatcher = Dispatcher::new(config)?;
        Ok(Self::new(
            dispatcher,
            notifier,
            router,
            config.single_flight_refresh,
        ))
    }

    pub fn notifier(&self) -> &SessionExpiryNotifier {
        &self.notifier
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Execute `request`, refreshing the session once on a 401.
    pub async fn execute(&self, request: PendingRequest) -> ApiResult<Option<Value>> {
        let observed = self.refresh_gate.generation();

        let error = match self.dispatcher.dispatch(&request).await {
            Ok(payload) => return Ok(payload),
            Err(e) => e,
        };

        let route = request.route();

        // The probe is itself skip-listed, but an unauthenticated probe is
        // the normal logged-out state rather than a failure.
        if endpoints::is_probe(route) {
            if error.is_unauthorized() || error.is_network() {
                debug!(error = %error, "Probe found no session");
                return Ok(None);
            }
            return Err(error);
        }

        if endpoints::is_skip_listed(route) {
            return Err(error);
        }

        if !error.is_unauthorized() {
            return Err(error);
        }

        info!(path = %request.path, "Session expired, refreshing");
        let outcome = self
            .refresh_gate
            .run(observed, || self.refresh_session())
            .await;

        match outcome {
            RefreshOutcome::Refreshed => {
                debug!(path = %request.path, "Retrying after refresh");
                self.dispatcher.dispatch(&request).await
            }
            RefreshOutcome::Failed { performed } => {
                if performed {
                    let redirect_to = self.router.login_redirect_from_here();
                    warn!(redirect_to = %redirect_to, "Session refresh failed");
                    self.notifier.publish(SessionExpired { redirect_to });
                }
                Err(error)
            }
        }
    }

    async fn refresh_session(&self) -> bool {
        let request = PendingRequest::new(reqwest::Method::POST, endpoints::REFRESH);
        match self.dispatcher.dispatch(&request).await {
            Ok(_) => {
                self.reload_user().await;
                true
            }
            Err(e) => {
                debug!(error = %e, "Refresh call failed");
                false
            }
        }
    }

    /// Re-read the current user. A failed reload leaves the stored user alone.
    async fn reload_user(&self) {
        let Some(session) = &self.session else {
            return;
        };
        let request = PendingRequest::get(endpoints::ME);
        match self.dispatcher.dispatch(&request).await.and_then(decode_user) {
            Ok(Some(user)) => {
                debug!(user_id = user.id, "User reloaded after refresh");
                session.set(Some(user));
            }
            Ok(None) => debug!("Refresh succeeded but no user was returned"),
            Err(e) => debug!(error = %e, "Could not reload user after refresh"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;

    fn client_for(
        server: &ServerGuard,
        router: Router,
    ) -> (AuthenticatedClient, SessionExpiryNotifier) {
        let config = Config {
            api_base_url: server.url(),
            ..Config::default()
        };
        let notifier = SessionExpiryNotifier::new();
        let client = AuthenticatedClient::from_config(&config, notifier.clone(), router)
            .expect("client");
        (client, notifier)
    }

    async fn refresh_mock(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
        server
            .mock("POST", "/auth/refresh")
            .with_status(status)
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_success_is_returned_unchanged() {
        let mut server = Server::new_async().await;
        let quizzes = server
            .mock("GET", "/quizzes")
            .with_status(200)
            .with_body(r#"[{"id":1}]"#)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 0).await;

        let (client, _) = client_for(&server, Router::default());
        let result = client.execute(PendingRequest::get("/quizzes")).await;

        assert_eq!(result, Ok(Some(json!([{"id": 1}]))));
        quizzes.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_silent_refresh_reloads_attached_session() {
        let mut server = Server::new_async().await;
        let expired = server
            .mock("GET", "/quizzes")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 1).await;
        let me = server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_body(r#"{"id": 4, "firstName": "Barbara", "lastName": "Liskov", "roles": ["ADMIN"]}"#)
            .expect(1)
            .create_async()
            .await;
        let retried = server
            .mock("GET", "/quizzes")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let session = SessionStore::new();
        let (client, _) = client_for(&server, Router::default());
        let client = client.with_session(session.clone());

        let result = client.execute(PendingRequest::get("/quizzes")).await;

        assert_eq!(result, Ok(Some(json!([]))));
        assert_eq!(session.current_user().map(|u| u.full_name()), Some("Barbara Liskov".to_string()));
        expired.assert_async().await;
        refresh.assert_async().await;
        me.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_401_is_absent_user() {
        let mut server = Server::new_async().await;
        let me = server
            .mock("GET", "/auth/me")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 0).await;

        let (client, notifier) = client_for(&server, Router::default());
        let mut rx = notifier.subscribe();
        let result = client.execute(PendingRequest::get("/auth/me")).await;

        assert_eq!(result, Ok(None));
        assert!(rx.try_recv().is_err());
        me.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_network_failure_is_absent_user() {
        let config = Config {
            api_base_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        let client =
            AuthenticatedClient::from_config(&config, SessionExpiryNotifier::new(), Router::default())
                .expect("client");
        assert_eq!(client.execute(PendingRequest::get("/auth/me")).await, Ok(None));
    }

    #[tokio::test]
    async fn test_probe_500_passes_through() {
        let mut server = Server::new_async().await;
        let _me = server
            .mock("GET", "/auth/me")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 0).await;

        let (client, _) = client_for(&server, Router::default());
        let result = client.execute(PendingRequest::get("/auth/me")).await;

        assert_eq!(
            result,
            Err(ApiError::ServerError {
                status: 500,
                message: "boom".to_string()
            })
        );
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_skip_listed_paths_never_refresh() {
        let mut server = Server::new_async().await;
        let login = server
            .mock("POST", "/auth/login")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let register = server
            .mock("POST", "/auth/register")
            .with_status(401)
            .create_async()
            .await;
        // Only the refresh endpoint call we make ourselves may reach it
        let refresh = refresh_mock(&mut server, 401, 1).await;

        let (client, notifier) = client_for(&server, Router::new("/login"));
        let mut rx = notifier.subscribe();

        for _ in 0..2 {
            let result = client
                .execute(PendingRequest::post("/auth/login", json!({"email": "a@b.c"})))
                .await;
            assert_eq!(result, Err(ApiError::Unauthorized));
        }
        let result = client
            .execute(PendingRequest::post("/auth/register", json!({})))
            .await;
        assert_eq!(result, Err(ApiError::Unauthorized));
        let result = client
            .execute(PendingRequest::new(reqwest::Method::POST, "/auth/refresh"))
            .await;
        assert_eq!(result, Err(ApiError::Unauthorized));

        assert!(rx.try_recv().is_err());
        login.assert_async().await;
        register.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_retries_once() {
        let mut server = Server::new_async().await;
        // Original and retry both 401; there must be no second refresh.
        let roles = server
            .mock("GET", "/roles")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 1).await;

        let (client, notifier) = client_for(&server, Router::new("/roles"));
        let mut rx = notifier.subscribe();
        let result = client.execute(PendingRequest::get("/roles")).await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert!(rx.try_recv().is_err(), "refresh succeeded, no expiry signal");
        roles.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_notifies_with_redirect() {
        let mut server = Server::new_async().await;
        let quizzes = server
            .mock("GET", "/quizzes")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 401, 1).await;

        let (client, notifier) = client_for(&server, Router::new("/quizzes?page=2"));
        let mut rx = notifier.subscribe();
        let result = client.execute(PendingRequest::get("/quizzes")).await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        let signal = rx.try_recv().expect("expiry signal emitted");
        assert_eq!(signal.redirect_to, "/login?redirect=%2Fquizzes%3Fpage%3D2");
        assert!(rx.try_recv().is_err(), "emitted exactly once");
        quizzes.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_refresh_failure_on_login_route_has_bare_redirect() {
        let mut server = Server::new_async().await;
        let _users = server
            .mock("GET", "/users")
            .with_status(401)
            .create_async()
            .await;
        let _refresh = refresh_mock(&mut server, 500, 1).await;

        let (client, notifier) = client_for(&server, Router::new("/login"));
        let mut rx = notifier.subscribe();
        let result = client.execute(PendingRequest::get("/users")).await;

        assert_eq!(result, Err(ApiError::Unauthorized));
        assert_eq!(rx.try_recv().expect("signal").redirect_to, "/login");
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let forbidden = server
            .mock("DELETE", "/users/1")
            .with_status(403)
            .with_body("admins only")
            .expect(1)
            .create_async()
            .await;
        let broken = server
            .mock("GET", "/analytics/admin/dashboard")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 0).await;

        let (client, _) = client_for(&server, Router::default());
        assert_eq!(
            client.execute(PendingRequest::delete("/users/1")).await,
            Err(ApiError::AccessDenied("admins only".to_string()))
        );
        assert!(matches!(
            client.execute(PendingRequest::get("/analytics/admin/dashboard")).await,
            Err(ApiError::ServerError { status: 503, .. })
        ));
        forbidden.assert_async().await;
        broken.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_logout_is_not_skip_listed() {
        let mut server = Server::new_async().await;
        let logout_expired = server
            .mock("POST", "/auth/logout")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let logout_ok = server
            .mock("POST", "/auth/logout")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 1).await;

        let (client, _) = client_for(&server, Router::default());
        let result = client
            .execute(PendingRequest::new(reqwest::Method::POST, "/auth/logout"))
            .await;

        assert_eq!(result, Ok(None));
        logout_expired.assert_async().await;
        logout_ok.assert_async().await;
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn test_paged_users_recover_after_refresh() {
        let mut server = Server::new_async().await;
        let users: Vec<_> = (1..=10)
            .map(|id| json!({"id": id, "firstName": "User", "lastName": format!("{}", id)}))
            .collect();
        let page = json!({
            "content": users,
            "totalElements": 42,
            "totalPages": 5,
            "number": 0,
            "size": 10
        });
        let query = Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "0".into()),
            Matcher::UrlEncoded("size".into(), "10".into()),
        ]);

        let expired = server
            .mock("GET", "/users/paged")
            .match_query(query.clone())
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 200, 1).await;
        let retried = server
            .mock("GET", "/users/paged")
            .match_query(query)
            .with_status(200)
            .with_body(page.to_string())
            .expect(1)
            .create_async()
            .await;

        let (client, notifier) = client_for(&server, Router::new("/users"));
        let mut rx = notifier.subscribe();
        let result = client
            .execute(PendingRequest::get("/users/paged?page=0&size=10"))
            .await
            .expect("caller sees no error");

        let payload = result.expect("page payload");
        assert_eq!(payload["content"].as_array().map(Vec::len), Some(10));
        assert!(rx.try_recv().is_err());
        expired.assert_async().await;
        refresh.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_single_refresh() {
        let mut server = Server::new_async().await;
        let expired = server
            .mock("GET", Matcher::Regex(r"^/(quizzes|questions)$".to_string()))
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let refresh = refresh_mock(&mut server, 401, 1).await;

        let (client, notifier) = client_for(&server, Router::new("/"));
        let mut rx = notifier.subscribe();
        let (a, b) = tokio::join!(
            client.execute(PendingRequest::get("/quizzes")),
            client.execute(PendingRequest::get("/questions"))
        );

        assert_eq!(a, Err(ApiError::Unauthorized));
        assert_eq!(b, Err(ApiError::Unauthorized));
        assert_eq!(rx.try_recv().expect("signal").redirect_to, "/login?redirect=%2F");
        assert!(rx.try_recv().is_err(), "only the refreshing caller notifies");
        expired.assert_async().await;
        refresh.assert_async().await;
    }
}

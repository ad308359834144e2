use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::endpoints;
use super::{AuthenticatedClient, CurrentUser, SessionStore};
use crate::api::{ApiError, ApiResult, PendingRequest};
use crate::cache::QueryCache;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Session lifecycle: probe, login, register, refresh and logout.
///
/// Keeps `SessionStore` consistent with the last probe: a user is present
/// only when the probe returned one.
#[derive(Clone)]
pub struct AuthService {
    client: AuthenticatedClient,
    session: SessionStore,
    cache: QueryCache,
}

impl AuthService {
    pub fn new(client: AuthenticatedClient, session: SessionStore, cache: QueryCache) -> Self {
        Self {
            client,
            session,
            cache,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Ask the server who we are and record the answer.
    ///
    /// A missing session is `Ok(None)`. Any other failure also clears the
    /// user, but the error is returned so the caller can show it.
    pub async fn probe(&self) -> ApiResult<Option<CurrentUser>> {
        let result = self
            .client
            .execute(PendingRequest::get(endpoints::ME))
            .await
            .and_then(decode_user);

        match result {
            Ok(user) => {
                debug!(authenticated = user.is_some(), "Probe complete");
                self.session.set(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Probe failed, treating as logged out");
                self.session.clear();
                Err(e)
            }
        }
    }

    /// Log in and load the resulting user. Credential errors pass through.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<CurrentUser> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        self.client
            .execute(PendingRequest::post(endpoints::LOGIN, body))
            .await?;

        // Anything cached belongs to whoever was here before
        self.cache.clear().await;

        match self.probe().await? {
            Some(user) => {
                info!(user_id = user.id, "Login successful");
                Ok(user)
            }
            None => Err(ApiError::InvalidResponse(
                "login succeeded but no session was established".to_string(),
            )),
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Option<Value>> {
        let body = serde_json::to_value(request)?;
        let result = self
            .client
            .execute(PendingRequest::post(endpoints::REGISTER, body))
            .await?;
        info!(email = %request.email, "Registration submitted");
        Ok(result)
    }

    /// Explicitly renew the session cookie, then reload the user.
    pub async fn refresh(&self) -> ApiResult<Option<CurrentUser>> {
        self.client
            .execute(PendingRequest::new(Method::POST, endpoints::REFRESH))
            .await?;
        self.probe().await
    }

    /// End the session. Local state is torn down even if the call fails.
    pub async fn logout(&self) -> ApiResult<()> {
        let result = self
            .client
            .execute(PendingRequest::new(Method::POST, endpoints::LOGOUT))
            .await;

        self.session.clear();
        self.cache.clear().await;
        info!("Logged out");

        result.map(|_| ())
    }
}

pub(crate) fn decode_user(payload: Option<Value>) -> ApiResult<Option<CurrentUser>> {
    match payload {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

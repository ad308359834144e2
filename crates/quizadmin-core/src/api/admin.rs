//! Typed endpoints for the admin console resources.
//!
//! Reads go through the `QueryCache` and are keyed by request path; writes
//! invalidate everything under the resource's path. All traffic flows
//! through `AuthenticatedClient`, so an expired session is refreshed
//! transparently.

use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiResult, PendingRequest};
use crate::auth::{AuthService, AuthenticatedClient, CurrentUser};
use crate::cache::QueryCache;
use crate::models::{
    DashboardMetrics, Page, ProfileUpdate, Question, QuestionInput, Quiz, QuizInput, Role,
    RoleInput, User, UserInput,
};

const DASHBOARD_PATH: &str = "/analytics/admin/dashboard";

/// A CRUD resource exposed at `PATH`, `PATH/paged` and `PATH/{id}`.
pub trait Resource: DeserializeOwned {
    const PATH: &'static str;
    /// Human name for messages ("quiz", "user", ...)
    const NAME: &'static str;
    type Input: Serialize;
}

impl Resource for Quiz {
    const PATH: &'static str = "/quizzes";
    const NAME: &'static str = "quiz";
    type Input = QuizInput;
}

impl Resource for Question {
    const PATH: &'static str = "/questions";
    const NAME: &'static str = "question";
    type Input = QuestionInput;
}

impl Resource for User {
    const PATH: &'static str = "/users";
    const NAME: &'static str = "user";
    type Input = UserInput;
}

impl Resource for Role {
    const PATH: &'static str = "/roles";
    const NAME: &'static str = "role";
    type Input = RoleInput;
}

#[derive(Clone)]
pub struct AdminApi {
    client: AuthenticatedClient,
    auth: AuthService,
    cache: QueryCache,
}

impl AdminApi {
    pub fn new(client: AuthenticatedClient, auth: AuthService, cache: QueryCache) -> Self {
        Self {
            client,
            auth,
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ===== Generic plumbing =====

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        if let Some(cached) = self.cache.get_fresh(path).await {
            debug!(path = path, "Serving from cache");
            return Ok(cached);
        }

        let value = require_payload(self.client.execute(PendingRequest::get(path)).await?, path)?;
        self.cache.put(path, value.clone()).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn mutate(&self, request: PendingRequest, invalidate: &str) -> ApiResult<Option<Value>> {
        let result = self.client.execute(request).await;
        // Even a failed write may have partially applied
        self.cache.invalidate_prefix(invalidate).await;
        result
    }

    // ===== Resources =====

    pub async fn list<R: Resource>(&self) -> ApiResult<Vec<R>> {
        self.fetch(R::PATH).await
    }

    /// Zero-based `page` of `size` items.
    pub async fn page<R: Resource>(&self, page: u32, size: u32) -> ApiResult<Page<R>> {
        self.fetch(&format!("{}/paged?page={}&size={}", R::PATH, page, size))
            .await
    }

    pub async fn get<R: Resource>(&self, id: i64) -> ApiResult<R> {
        self.fetch(&format!("{}/{}", R::PATH, id)).await
    }

    /// Fetch several items concurrently; each result stands alone.
    pub async fn get_many<R: Resource>(&self, ids: &[i64]) -> Vec<ApiResult<R>> {
        join_all(ids.iter().map(|id| self.get::<R>(*id))).await
    }

    pub async fn create<R: Resource>(&self, input: &R::Input) -> ApiResult<R> {
        let body = serde_json::to_value(input)?;
        let value = self
            .mutate(PendingRequest::post(R::PATH, body), R::PATH)
            .await?;
        Ok(serde_json::from_value(require_payload(value, R::PATH)?)?)
    }

    pub async fn update<R: Resource>(&self, id: i64, input: &R::Input) -> ApiResult<R> {
        let path = format!("{}/{}", R::PATH, id);
        let body = serde_json::to_value(input)?;
        let value = self
            .mutate(PendingRequest::put(path.as_str(), body), R::PATH)
            .await?;
        Ok(serde_json::from_value(require_payload(value, &path)?)?)
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> ApiResult<()> {
        let path = format!("{}/{}", R::PATH, id);
        self.mutate(PendingRequest::delete(path), R::PATH).await?;
        debug!(resource = R::NAME, id, "Deleted");
        Ok(())
    }

    // ===== Analytics =====

    pub async fn dashboard(&self) -> ApiResult<DashboardMetrics> {
        self.fetch(DASHBOARD_PATH).await
    }

    // ===== Profile =====

    /// Update the signed-in user's own record, then reload the session user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<CurrentUser> {
        let user_id = self
            .auth
            .session()
            .current_user()
            .map(|u| u.id)
            .ok_or(ApiError::Unauthorized)?;

        let body = serde_json::to_value(update)?;
        let path = format!("{}/{}", User::PATH, user_id);
        self.mutate(PendingRequest::put(path, body), User::PATH)
            .await?;

        self.auth.probe().await?.ok_or(ApiError::Unauthorized)
    }
}

fn require_payload(value: Option<Value>, path: &str) -> ApiResult<Value> {
    value.ok_or_else(|| ApiError::InvalidResponse(format!("empty response from {}", path)))
}

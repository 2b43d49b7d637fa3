//! JSON-over-HTTP client for the GymWay document server.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, PoisonError, RwLock};

use super::collections::{COACHES, WORKOUT_PLANS, WORKOUT_PROGRESS};
use super::{normalize_base_url, RemoteError, RemoteStore};
use crate::models::{Coach, WorkoutPlan, WorkoutProgress};

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Shared HTTP plumbing: base URL, connection pool and session token.
///
/// Clones share the session token, so an identity client and a remote
/// store built from the same `ApiClient` see the same login.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(server_url),
            http: reqwest::Client::new(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        tracing::debug!("GET {}", path);
        let response = self.request(Method::GET, path).send().await?;
        read_json(response).await
    }

    /// Like [`get_json`](Self::get_json) but maps 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, RemoteError> {
        tracing::debug!("GET {}", path);
        let response = self.request(Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).json(body).send().await?;
        read_json(response).await
    }

    /// Sends a request whose response body is ignored.
    pub async fn send(&self, method: Method, path: &str) -> Result<(), RemoteError> {
        tracing::debug!("{} {}", method, path);
        let response = self.request(method, path).send().await?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    match status {
        StatusCode::UNAUTHORIZED => Err(RemoteError::Unauthorized),
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound(message)),
        _ => Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        }),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn document_path(collection: &str, id: &str) -> String {
    format!("/{}/{}", collection, urlencoding::encode(id))
}

fn filter_path(collection: &str, field: &str, value: &str) -> String {
    format!("/{}?{}={}", collection, field, urlencoding::encode(value))
}

/// [`RemoteStore`] backed by the document server's REST API.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    api: ApiClient,
}

impl HttpRemoteStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    async fn require_plan(&self, plan_id: &str) -> Result<WorkoutPlan, RemoteError> {
        self.fetch_plan(plan_id)
            .await?
            .ok_or_else(|| RemoteError::NotFound("workout plan".to_string()))
    }

    async fn write_exercises(&self, plan: &WorkoutPlan) -> Result<(), RemoteError> {
        let body = json!({ "exercises": plan.exercises });
        let _: serde_json::Value = self
            .api
            .send_json(Method::PATCH, &document_path(WORKOUT_PLANS, &plan.id), &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_all_plans(&self) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.api.get_json(&format!("/{}", WORKOUT_PLANS)).await
    }

    async fn fetch_plans_by_creator(
        &self,
        coach_id: &str,
    ) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.api
            .get_json(&filter_path(WORKOUT_PLANS, "createdBy", coach_id))
            .await
    }

    async fn fetch_plans_by_assignee(
        &self,
        athlete_id: &str,
    ) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.api
            .get_json(&filter_path(WORKOUT_PLANS, "assignedTo", athlete_id))
            .await
    }

    async fn fetch_plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>, RemoteError> {
        self.api
            .get_optional(&document_path(WORKOUT_PLANS, plan_id))
            .await
    }

    async fn put_plan(&self, plan: &WorkoutPlan) -> Result<(), RemoteError> {
        let _: serde_json::Value = self
            .api
            .send_json(Method::PUT, &document_path(WORKOUT_PLANS, &plan.id), plan)
            .await?;
        tracing::info!("Stored workout plan '{}' remotely", plan.title);
        Ok(())
    }

    async fn update_exercise_completion(
        &self,
        plan_id: &str,
        exercise_id: &str,
        completed: bool,
    ) -> Result<(), RemoteError> {
        let mut plan = self.require_plan(plan_id).await?;
        plan.set_exercise_completed(exercise_id, completed);
        self.write_exercises(&plan).await
    }

    async fn mark_all_completed(&self, plan_id: &str) -> Result<(), RemoteError> {
        let mut plan = self.require_plan(plan_id).await?;
        plan.mark_all_completed();
        self.write_exercises(&plan).await
    }

    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<WorkoutProgress>, RemoteError> {
        self.api
            .get_json(&filter_path(WORKOUT_PROGRESS, "userId", user_id))
            .await
    }

    async fn append_progress(
        &self,
        progress: &WorkoutProgress,
    ) -> Result<WorkoutProgress, RemoteError> {
        self.api
            .send_json(Method::POST, &format!("/{}", WORKOUT_PROGRESS), progress)
            .await
    }

    async fn fetch_coaches(&self) -> Result<Vec<Coach>, RemoteError> {
        self.api.get_json(&format!("/{}", COACHES)).await
    }
}

//! Remote document store access.
//!
//! [`RemoteStore`] is the seam the repositories sync through. The HTTP
//! implementation talks to `gymway-server`; the in-memory one backs tests
//! and offline demos.

mod http;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Coach, WorkoutPlan, WorkoutProgress};

pub use http::{ApiClient, HttpRemoteStore};
pub use memory::InMemoryRemoteStore;

/// Collection names shared by clients and the document server.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUT_PLANS: &str = "workout_plans";
    pub const WORKOUT_PROGRESS: &str = "workout_progress";
    pub const COACHES: &str = "coaches";
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid response from server: {0}")]
    Decode(String),

    #[error("Not signed in or session expired")]
    Unauthorized,

    #[error("Remote store is offline")]
    Offline,
}

/// Operations against the shared workout document store.
///
/// Updates to a single plan are read-modify-write cycles over the whole
/// exercise list. Two clients updating the same plan concurrently can
/// lose one of the changes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn fetch_all_plans(&self) -> Result<Vec<WorkoutPlan>, RemoteError>;

    async fn fetch_plans_by_creator(&self, coach_id: &str)
        -> Result<Vec<WorkoutPlan>, RemoteError>;

    async fn fetch_plans_by_assignee(
        &self,
        athlete_id: &str,
    ) -> Result<Vec<WorkoutPlan>, RemoteError>;

    async fn fetch_plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>, RemoteError>;

    /// Creates or fully replaces the plan stored under `plan.id`.
    async fn put_plan(&self, plan: &WorkoutPlan) -> Result<(), RemoteError>;

    async fn update_exercise_completion(
        &self,
        plan_id: &str,
        exercise_id: &str,
        completed: bool,
    ) -> Result<(), RemoteError>;

    async fn mark_all_completed(&self, plan_id: &str) -> Result<(), RemoteError>;

    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<WorkoutProgress>, RemoteError>;

    /// Stores a progress entry and returns it with its assigned id.
    async fn append_progress(
        &self,
        progress: &WorkoutProgress,
    ) -> Result<WorkoutProgress, RemoteError>;

    async fn fetch_coaches(&self) -> Result<Vec<Coach>, RemoteError>;
}

/// Normalizes a configured server address into an HTTP base URL.
pub fn normalize_base_url(server_url: &str) -> String {
    let trimmed = server_url.trim();
    let base_url = if let Some(rest) = trimmed.strip_prefix("ws://") {
        format!("http://{}", rest)
    } else if let Some(rest) = trimmed.strip_prefix("wss://") {
        format!("https://{}", rest)
    } else if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        format!("http://{}", trimmed)
    } else {
        trimmed.to_string()
    };

    base_url.trim_end_matches('/').to_string()
}

/// Checks that the document server answers its health endpoint.
pub async fn check_server(server_url: &str) -> Result<(), RemoteError> {
    let url = format!("{}/health", normalize_base_url(server_url));
    let response = reqwest::get(&url).await?;

    if !response.status().is_success() {
        return Err(RemoteError::Status {
            status: response.status().as_u16(),
            message: "health check failed".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url("https://gym.example.com/"),
            "https://gym.example.com"
        );
        assert_eq!(normalize_base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(
            normalize_base_url("wss://gym.example.com"),
            "https://gym.example.com"
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = RemoteError::NotFound("workout plan".to_string());
        assert_eq!(err.to_string(), "workout plan not found");
    }

    #[tokio::test]
    async fn test_check_server_unreachable() {
        // Port 9 (discard) is never served in test environments.
        let result = check_server("http://127.0.0.1:9").await;
        assert!(result.is_err());
    }
}

//! HTTP routes of the document server.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `POST /auth/register`, `POST /auth/login`: start a session (no auth)
//! - `GET /auth/verify?token=`: confirm an email address (no auth)
//! - `GET /auth/status`, `POST /auth/resend`, `POST /auth/logout`
//! - `GET|POST /{collection}`: list (with `field=value` filters) or insert
//! - `GET|PUT|PATCH /{collection}/{id}`: read, replace or merge one document
//!
//! Everything except the public routes needs `Authorization: Bearer <token>`.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use gymway_core::identity::{AuthResponse, AuthStatus, LoginRequest, RegisterRequest};
use gymway_core::remote::collections::{COACHES, USERS};
use gymway_core::validation::{validate_login, validate_registration};
use gymway_core::{Coach, Role, User};

use super::config::ServerConfig;
use super::email::Mailer;
use super::storage::{Document, DocumentStore, StorageError, COLLECTIONS};
use super::tokens::{SessionStore, TokenStore};
use super::users::{AccountError, AccountStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentStore>,
    pub accounts: Arc<AccountStore>,
    pub verifications: Arc<TokenStore>,
    pub sessions: Arc<SessionStore>,
    pub mailer: Arc<Mailer>,
    /// Base URL for links sent by email, without a trailing slash.
    pub public_url: String,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            documents: Arc::new(DocumentStore::new(&config.data_dir)),
            accounts: Arc::new(AccountStore::load(&config.data_dir)),
            verifications: Arc::new(TokenStore::default()),
            sessions: Arc::new(SessionStore::new()),
            mailer: Arc::new(Mailer::from_config(config.smtp.clone())),
            public_url: config.public_url.clone(),
        }
    }
}

/// Authenticated user, added to request extensions after auth.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub token: String,
}

/// Error response body: `{"error": "...", "message": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidName(name) => {
                ApiError::bad_request(format!("Invalid name: {}", name))
            }
            StorageError::NotFound { .. } => ApiError::not_found(err.to_string()),
            other => ApiError::internal(other),
        }
    }
}

/// Builds the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify_email));

    let protected_routes = Router::new()
        .route("/auth/status", get(auth_status))
        .route("/auth/resend", post(resend_verification))
        .route("/auth/logout", post(logout))
        .route("/{collection}", get(list_documents).post(insert_document))
        .route(
            "/{collection}/{id}",
            get(get_document).put(put_document).patch(patch_document),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Authentication
// ============================================================================

async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
        Some(_) => {
            return ApiError::unauthorized(
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            )
            .into_response();
        }
        None => {
            return ApiError::unauthorized("missing_auth", "Authorization header required")
                .into_response();
        }
    };

    match state.sessions.lookup(&token) {
        Some(uid) => {
            request.extensions_mut().insert(AuthUser { uid, token });
            next.run(request).await
        }
        None => ApiError::unauthorized("invalid_session", "Session expired or invalid")
            .into_response(),
    }
}

/// Issues a verification token and delivers its link.
///
/// Delivery failures are logged; the account stays usable for resending.
async fn send_verification(state: &AppState, email: &str, name: Option<&str>) {
    let token = state.verifications.create_token(email);
    let link = format!("{}/auth/verify?token={}", state.public_url, token);

    if let Err(e) = state.mailer.send_verification(email, name, &link).await {
        tracing::warn!("Failed to send verification email to {}: {}", email, e);
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, ApiError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(ApiError::internal("document is not a JSON object")),
        Err(e) => Err(ApiError::internal(e)),
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_registration(&request.email, &request.password, &request.display_name)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let account = state
        .accounts
        .create(&request.email, &request.password)
        .map_err(|e| match e {
            AccountError::AlreadyExists(_) => {
                ApiError::new(StatusCode::CONFLICT, "email_taken", e.to_string())
            }
            other => ApiError::internal(other),
        })?;

    let display_name = request.display_name.trim().to_string();
    let now = Utc::now();

    let user = User {
        uid: account.uid.clone(),
        email: account.email.clone(),
        display_name: display_name.clone(),
        role: request.role,
        email_verified: false,
        created_at: Some(now),
        ..Default::default()
    };
    state
        .documents
        .put(USERS, &account.uid, to_document(&user)?)?;

    if request.role == Role::Coach {
        let coach = Coach {
            id: account.uid.clone(),
            name: display_name.clone(),
            email: account.email.clone(),
            created_at: Some(now),
            ..Default::default()
        };
        state
            .documents
            .put(COACHES, &account.uid, to_document(&coach)?)?;
    }

    send_verification(&state, &account.email, Some(&display_name)).await;

    let token = state.sessions.create(&account.uid);
    tracing::info!("Registered {} ({})", account.email, request.role);

    Ok(Json(AuthResponse {
        uid: account.uid,
        token,
        email_verified: false,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_login(&request.email, &request.password)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    // 400 rather than 401 so clients can tell bad credentials from an expired session.
    let account = state
        .accounts
        .authenticate(&request.email, &request.password)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Invalid email or password",
            )
        })?;

    let token = state.sessions.create(&account.uid);
    tracing::info!("Signed in {}", account.email);

    Ok(Json(AuthResponse {
        uid: account.uid,
        token,
        email_verified: account.email_verified,
    }))
}

#[derive(Deserialize)]
struct VerifyParams {
    token: String,
}

async fn verify_email(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<&'static str, ApiError> {
    let data = state.verifications.verify_token(&params.token).ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_token",
            "Verification link is invalid or has expired",
        )
    })?;

    let account = state.accounts.mark_verified(&data.email).map_err(|e| match e {
        AccountError::NotFound(_) => ApiError::not_found(e.to_string()),
        other => ApiError::internal(other),
    })?;

    let mut fields = Document::new();
    fields.insert("emailVerified".to_string(), Value::Bool(true));
    match state.documents.merge(USERS, &account.uid, fields) {
        Ok(_) | Err(StorageError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Verified email {}", account.email);
    Ok("Email verified. You can now sign in.")
}

async fn auth_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AuthStatus>, ApiError> {
    let account = state
        .accounts
        .get_by_uid(&user.uid)
        .ok_or_else(|| ApiError::unauthorized("invalid_session", "Account no longer exists"))?;

    Ok(Json(AuthStatus {
        uid: account.uid,
        email_verified: account.email_verified,
    }))
}

async fn resend_verification(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    let account = state
        .accounts
        .get_by_uid(&user.uid)
        .ok_or_else(|| ApiError::unauthorized("invalid_session", "Account no longer exists"))?;

    if account.email_verified {
        tracing::debug!("{} is already verified, nothing to resend", account.email);
        return Ok(StatusCode::NO_CONTENT);
    }

    let name = state
        .documents
        .get(USERS, &account.uid)
        .ok()
        .flatten()
        .and_then(|doc| {
            doc.get("displayName")
                .and_then(Value::as_str)
                .map(str::to_string)
        });

    send_verification(&state, &account.email, name.as_deref()).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> StatusCode {
    state.sessions.revoke(&user.token);
    tracing::info!("Signed out {}", user.uid);
    StatusCode::NO_CONTENT
}

fn check_collection(collection: &str) -> Result<(), ApiError> {
    if COLLECTIONS.contains(&collection) {
        Ok(())
    } else {
        Err(ApiError::not_found(format!(
            "Unknown collection '{}'",
            collection
        )))
    }
}

fn into_object(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(doc) => Ok(doc),
        _ => Err(ApiError::bad_request("Document body must be a JSON object")),
    }
}

async fn list_documents(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(filters): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    check_collection(&collection)?;
    Ok(Json(state.documents.list(&collection, &filters)?))
}

async fn insert_document(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Document>), ApiError> {
    check_collection(&collection)?;
    let doc = state.documents.insert(&collection, into_object(body)?)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn get_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Document>, ApiError> {
    check_collection(&collection)?;
    state
        .documents
        .get(&collection, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Document {}/{} not found", collection, id)))
}

async fn put_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Document>, ApiError> {
    check_collection(&collection)?;
    Ok(Json(state.documents.put(&collection, &id, into_object(body)?)?))
}

async fn patch_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Document>, ApiError> {
    check_collection(&collection)?;
    Ok(Json(state.documents.merge(&collection, &id, into_object(body)?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(temp_dir: &TempDir) -> AppState {
        let config = ServerConfig {
            port: 0,
            data_dir: temp_dir.path().to_path_buf(),
            config_path: PathBuf::from("/nonexistent/config.yaml"),
            public_url: "http://localhost:8080".to_string(),
            smtp: None,
        };
        AppState::new(&config)
    }

    async fn call(
        state: &AppState,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(state: &AppState, email: &str, role: &str) -> (String, String) {
        let (status, body) = call(
            state,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": "secret1",
                "display_name": "Test User",
                "role": role,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["uid"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let (status, body) = call(&state, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_coach() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let (uid, token) = register(&state, "coach@example.com", "coach").await;

        let (status, user) = call(&state, "GET", &format!("/users/{}", uid), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["displayName"], "Test User");
        assert_eq!(user["role"], "coach");
        assert_eq!(user["emailVerified"], false);

        let (_, coaches) = call(&state, "GET", "/coaches", Some(&token), None).await;
        assert_eq!(coaches.as_array().unwrap().len(), 1);
        assert_eq!(coaches[0]["id"], uid.as_str());
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let (status, body) = call(
            &state,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "a@b.com", "password": "123", "display_name": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("at least 6"));

        register(&state, "a@b.com", "athlete").await;
        let (status, body) = call(
            &state,
            "POST",
            "/auth/register",
            None,
            Some(json!({"email": "A@B.com", "password": "secret1", "display_name": "A"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "email_taken");
    }

    #[tokio::test]
    async fn test_login_and_verification_flow() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (uid, _) = register(&state, "ath@example.com", "athlete").await;

        let credentials = json!({"email": "ath@example.com", "password": "secret1"});
        let (status, body) = call(&state, "POST", "/auth/login", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email_verified"], false);
        let token = body["token"].as_str().unwrap().to_string();

        let (_, status_body) = call(&state, "GET", "/auth/status", Some(&token), None).await;
        assert_eq!(status_body["email_verified"], false);

        let verification = state.verifications.create_token("ath@example.com");
        let (status, _) = call(
            &state,
            "GET",
            &format!("/auth/verify?token={}", verification),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, status_body) = call(&state, "GET", "/auth/status", Some(&token), None).await;
        assert_eq!(status_body["email_verified"], true);
        let (_, user) = call(&state, "GET", &format!("/users/{}", uid), Some(&token), None).await;
        assert_eq!(user["emailVerified"], true);

        let (_, body) = call(&state, "POST", "/auth/login", None, Some(credentials)).await;
        assert_eq!(body["email_verified"], true);
    }

    #[tokio::test]
    async fn test_bad_credentials_and_tokens() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        register(&state, "a@b.com", "athlete").await;

        let (status, body) = call(
            &state,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "a@b.com", "password": "wrongpass"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_credentials");

        let (status, _) = call(&state, "GET", "/auth/verify?token=bogus", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_protected_routes_need_session() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let (status, body) = call(&state, "GET", "/workout_plans", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing_auth");

        let (status, body) = call(&state, "GET", "/workout_plans", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_session");
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (_, token) = register(&state, "a@b.com", "athlete").await;

        let (status, _) = call(&state, "POST", "/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&state, "GET", "/auth/status", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_document_crud() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (_, token) = register(&state, "a@b.com", "athlete").await;
        let token = Some(token.as_str());

        let plan = json!({"title": "Legs", "createdBy": "c1", "exercises": []});
        let (status, stored) = call(&state, "PUT", "/workout_plans/p1", token, Some(plan)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["id"], "p1");

        let (status, merged) = call(
            &state,
            "PATCH",
            "/workout_plans/p1",
            token,
            Some(json!({"title": "Legs Day"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(merged["title"], "Legs Day");
        assert_eq!(merged["createdBy"], "c1");

        let (_, filtered) = call(&state, "GET", "/workout_plans?createdBy=c1", token, None).await;
        assert_eq!(filtered.as_array().unwrap().len(), 1);
        let (_, filtered) = call(&state, "GET", "/workout_plans?createdBy=c2", token, None).await;
        assert!(filtered.as_array().unwrap().is_empty());

        let (status, created) = call(
            &state,
            "POST",
            "/workout_progress",
            token,
            Some(json!({"userId": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(!created["id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_errors() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let (_, token) = register(&state, "a@b.com", "athlete").await;
        let token = Some(token.as_str());

        let (status, _) = call(&state, "GET", "/workout_plans/missing", token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&state, "PATCH", "/workout_plans/missing", token, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&state, "GET", "/secrets", token, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("secrets"));

        let (status, _) = call(&state, "PUT", "/workout_plans/p1", token, Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Drives the real HTTP clients against a served router.
    #[tokio::test]
    async fn test_http_clients_end_to_end() {
        use gymway_core::{
            ApiClient, Exercise, HttpIdentityClient, HttpRemoteStore, IdentityError,
            IdentityProvider, RemoteStore, WorkoutPlan, WorkoutProgress,
        };

        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let accounts = state.accounts.clone();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let api = ApiClient::new(&format!("http://{}", addr));
        gymway_core::check_server(api.base_url()).await.unwrap();

        let identity = HttpIdentityClient::new(api.clone());
        let uid = identity
            .register("coach@example.com", "secret1", "Sam", Role::Coach)
            .await
            .unwrap();
        assert!(!identity.check_email_verified().await.unwrap());

        let blocked = identity.login("coach@example.com", "secret1").await;
        assert!(matches!(blocked, Err(IdentityError::EmailNotVerified)));

        accounts.mark_verified("coach@example.com").unwrap();
        assert_eq!(
            identity.login("coach@example.com", "secret1").await.unwrap(),
            uid
        );

        let remote = HttpRemoteStore::new(api.clone());
        let plan = WorkoutPlan::new("plan_a", "Push")
            .with_creator(uid.clone())
            .with_exercises(vec![Exercise::new("a-1", "Bench"), Exercise::new("a-2", "Dips")]);
        remote.put_plan(&plan).await.unwrap();

        remote
            .update_exercise_completion("plan_a", "a-1", true)
            .await
            .unwrap();
        let fetched = remote.fetch_plan("plan_a").await.unwrap().unwrap();
        assert!(fetched.exercises[0].is_completed);
        assert!(!fetched.exercises[1].is_completed);

        remote.mark_all_completed("plan_a").await.unwrap();
        let fetched = remote.fetch_plan("plan_a").await.unwrap().unwrap();
        assert_eq!(fetched.completed_count(), 2);

        assert!(remote.fetch_plan("nope").await.unwrap().is_none());
        assert_eq!(remote.fetch_plans_by_creator(&uid).await.unwrap().len(), 1);
        assert!(remote.fetch_plans_by_assignee(&uid).await.unwrap().is_empty());

        let stored = remote
            .append_progress(&WorkoutProgress::new(uid.clone(), "plan_a", 2, 2))
            .await
            .unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(remote.fetch_progress(&uid).await.unwrap().len(), 1);

        let coaches = remote.fetch_coaches().await.unwrap();
        assert_eq!(coaches[0].name, "Sam");

        let profile = identity.fetch_profile(&uid).await.unwrap();
        assert!(profile.is_coach());
        assert!(profile.email_verified);

        identity.sign_out().await;
        assert!(identity.current_uid().is_none());
        assert!(remote.fetch_all_plans().await.is_err());
    }
}

//! HTTP surface: routing, request/response shapes, and the mapping from
//! domain errors to status codes.
//!
//! Every error leaves as `{"error": {"code", "message"}}` with a stable
//! machine-readable code; storage failures are logged server-side and
//! rendered as an opaque 500.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use roster_core::model::{NewPullRequest, TeamMember};
use roster_core::{DomainError, RandomSource};

use crate::repository::{PullRequestRepository, TeamRepository, UserRepository};
use crate::service::{PullRequestService, TeamService, UserService};

/// Shared handler state: one service per API slice, all backed by the
/// same repository.
pub struct AppState {
    pub teams: TeamService,
    pub users: UserService,
    pub pulls: PullRequestService,
}

impl AppState {
    pub fn new<R>(repository: Arc<R>, random: Arc<dyn RandomSource>) -> Self
    where
        R: UserRepository + TeamRepository + PullRequestRepository + 'static,
    {
        let user_repo: Arc<dyn UserRepository> = repository.clone();
        let team_repo: Arc<dyn TeamRepository> = repository.clone();
        let pull_repo: Arc<dyn PullRequestRepository> = repository;

        Self {
            teams: TeamService::new(
                team_repo,
                user_repo.clone(),
                pull_repo.clone(),
                random.clone(),
            ),
            users: UserService::new(user_repo.clone(), pull_repo.clone()),
            pulls: PullRequestService::new(user_repo, pull_repo, random),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/team/add", post(team_add))
        .route("/team/get", get(team_get))
        .route("/team/deactivateMembers", post(team_deactivate_members))
        .route("/users/setIsActive", post(users_set_is_active))
        .route("/users/getReview", get(users_get_review))
        .route("/pullRequest/create", post(pull_request_create))
        .route("/pullRequest/merge", post(pull_request_merge))
        .route("/pullRequest/reassign", post(pull_request_reassign))
        .route("/stats/assignments", get(stats_assignments))
        .route("/ping", get(ping))
        .route("/healthcheck", get(healthcheck))
        .with_state(state)
}

struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::TeamExists
            | DomainError::PrExists
            | DomainError::PrMerged
            | DomainError::NotAssigned
            | DomainError::NoCandidate
            | DomainError::AlreadyInactive => StatusCode::CONFLICT,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            DomainError::Storage { operation, message } => {
                tracing::error!(operation = %operation, message = %message, "storage failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": {
                "code": self.0.code(),
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

// Request bodies default missing string fields to "" so the services can
// reject them with a field-naming validation error instead of a generic
// deserialization failure.

#[derive(Debug, Deserialize)]
struct TeamMemberBody {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct TeamAddBody {
    #[serde(default)]
    team_name: String,
    #[serde(default)]
    members: Vec<TeamMemberBody>,
}

#[derive(Debug, Deserialize)]
struct TeamQuery {
    #[serde(default)]
    team_name: String,
}

#[derive(Debug, Deserialize)]
struct DeactivateMembersBody {
    #[serde(default)]
    team_name: String,
    #[serde(default)]
    user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SetIsActiveBody {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatePullRequestBody {
    #[serde(default)]
    pull_request_id: String,
    #[serde(default)]
    pull_request_name: String,
    #[serde(default)]
    author_id: String,
}

#[derive(Debug, Deserialize)]
struct MergePullRequestBody {
    #[serde(default)]
    pull_request_id: String,
}

#[derive(Debug, Deserialize)]
struct ReassignBody {
    #[serde(default)]
    pull_request_id: String,
    #[serde(default)]
    old_user_id: String,
}

async fn team_add(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TeamAddBody>,
) -> Result<Response, ApiError> {
    let members = body
        .members
        .into_iter()
        .map(|m| TeamMember {
            id: m.user_id,
            username: m.username,
            is_active: m.is_active,
        })
        .collect();
    let team = state.teams.create(&body.team_name, members).await?;
    Ok((StatusCode::CREATED, Json(json!({ "team": team }))).into_response())
}

async fn team_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamQuery>,
) -> Result<Response, ApiError> {
    let team = state.teams.get(&query.team_name).await?;
    Ok(Json(team).into_response())
}

async fn team_deactivate_members(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeactivateMembersBody>,
) -> Result<Response, ApiError> {
    let result = state
        .teams
        .deactivate_members(&body.team_name, &body.user_ids)
        .await?;
    Ok(Json(json!({ "result": result })).into_response())
}

async fn users_set_is_active(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIsActiveBody>,
) -> Result<Response, ApiError> {
    let user = state
        .users
        .set_is_active(&body.user_id, body.is_active)
        .await?;
    Ok(Json(json!({ "user": user })).into_response())
}

async fn users_get_review(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserQuery>,
) -> Result<Response, ApiError> {
    let (user, pull_requests) = state.users.get_review(&query.user_id).await?;
    Ok(Json(json!({
        "user_id": user.id,
        "pull_requests": pull_requests,
    }))
    .into_response())
}

async fn pull_request_create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePullRequestBody>,
) -> Result<Response, ApiError> {
    let pr = state
        .pulls
        .create(NewPullRequest {
            id: body.pull_request_id,
            name: body.pull_request_name,
            author_id: body.author_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "pr": pr }))).into_response())
}

async fn pull_request_merge(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MergePullRequestBody>,
) -> Result<Response, ApiError> {
    let pr = state.pulls.merge(&body.pull_request_id).await?;
    Ok(Json(json!({ "pr": pr })).into_response())
}

async fn pull_request_reassign(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReassignBody>,
) -> Result<Response, ApiError> {
    let (pr, replaced_by) = state
        .pulls
        .reassign(&body.pull_request_id, &body.old_user_id)
        .await?;
    Ok(Json(json!({ "pr": pr, "replaced_by": replaced_by })).into_response())
}

async fn stats_assignments(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let stats = state.pulls.assignment_stats().await?;
    Ok(Json(stats).into_response())
}

async fn ping() -> &'static str {
    "pong"
}

async fn healthcheck() -> StatusCode {
    StatusCode::NO_CONTENT
}

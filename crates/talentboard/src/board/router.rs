use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::auth::{Caller, SessionResolver};
use super::domain::{ApplicationId, ApplicationStatus, JobDraft, JobId, UserId};
use super::events::EventPublisher;
use super::repository::{
    ApplicationFilters, ApplicationRepository, IdentityRepository, JobFilters, JobRepository,
};
use super::service::{LifecycleError, LifecycleService, ReviewCommand, ReviewDecision};

/// Shared router state: the engine plus the session resolver.
pub struct BoardState<I, J, A, P> {
    pub service: Arc<LifecycleService<I, J, A, P>>,
    pub sessions: Arc<dyn SessionResolver>,
}

impl<I, J, A, P> Clone for BoardState<I, J, A, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

/// Router builder exposing the job and application lifecycle endpoints.
pub fn board_router<I, J, A, P>(state: BoardState<I, J, A, P>) -> Router
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(list_jobs_handler::<I, J, A, P>).post(post_job_handler::<I, J, A, P>),
        )
        .route("/api/v1/jobs/mine", get(my_jobs_handler::<I, J, A, P>))
        .route(
            "/api/v1/jobs/:job_id",
            get(get_job_handler::<I, J, A, P>)
                .put(update_job_handler::<I, J, A, P>)
                .delete(delete_job_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/jobs/:job_id/activation",
            post(job_activation_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(apply_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/applications",
            get(list_applications_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/applications/bulk",
            post(bulk_review_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_application_handler::<I, J, A, P>).patch(review_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/applications/:application_id/withdraw",
            post(withdraw_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/students/me/resume",
            put(resume_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/admin/applications",
            get(admin_list_applications_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/status",
            post(admin_status_handler::<I, J, A, P>),
        )
        .route(
            "/api/v1/admin/users/:user_id/activation",
            post(admin_user_activation_handler::<I, J, A, P>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivationRequest {
    active: bool,
}

#[derive(Debug, Deserialize)]
struct BulkReviewRequest {
    application_ids: Vec<ApplicationId>,
    status: ReviewDecision,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminStatusRequest {
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
struct ResumeRequest {
    resume: Option<String>,
}

fn bearer_caller(headers: &HeaderMap, sessions: &dyn SessionResolver) -> Caller {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| sessions.resolve(token))
        .unwrap_or(Caller::Anonymous)
}

fn unauthorized() -> Response {
    let payload = json!({ "error": "missing or invalid session" });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn role_denied(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::FORBIDDEN, Json(payload)).into_response()
}

fn require_student(caller: &Caller) -> Result<UserId, Response> {
    match caller {
        Caller::Student(id) => Ok(id.clone()),
        Caller::Anonymous => Err(unauthorized()),
        _ => Err(role_denied("student session required")),
    }
}

fn require_recruiter(caller: &Caller) -> Result<UserId, Response> {
    match caller {
        Caller::Recruiter(id) => Ok(id.clone()),
        Caller::Anonymous => Err(unauthorized()),
        _ => Err(role_denied("recruiter session required")),
    }
}

fn require_admin(caller: &Caller) -> Result<(), Response> {
    match caller {
        Caller::Admin => Ok(()),
        Caller::Anonymous => Err(unauthorized()),
        _ => Err(role_denied("admin credential required")),
    }
}

fn error_response(err: LifecycleError) -> Response {
    let status = match &err {
        LifecycleError::NotFound => StatusCode::NOT_FOUND,
        LifecycleError::Forbidden => StatusCode::FORBIDDEN,
        LifecycleError::InvalidTransition { .. } | LifecycleError::DuplicateApplication => {
            StatusCode::CONFLICT
        }
        LifecycleError::DeadlinePassed
        | LifecycleError::Inactive
        | LifecycleError::MissingResume
        | LifecycleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LifecycleError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

async fn list_jobs_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    Query(filters): Query<JobFilters>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    match state.service.list_jobs(&filters) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn post_job_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Json(draft): Json<JobDraft>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.post_job(&recruiter, draft) {
        Ok(job) => (StatusCode::CREATED, Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn my_jobs_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Query(filters): Query<JobFilters>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.list_jobs_for_owner(&recruiter, &filters) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_job_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    match state.service.get_job(&JobId(job_id), &caller) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_job_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(draft): Json<JobDraft>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.update_job(&JobId(job_id), &recruiter, draft) {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_job_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.delete_job(&JobId(job_id), &recruiter) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn job_activation_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state
        .service
        .set_job_active(&JobId(job_id), &recruiter, request.active)
    {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn apply_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    Json(request): Json<ApplyRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let student = match require_student(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state
        .service
        .apply(&JobId(job_id), &student, request.cover_letter, Utc::now())
    {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_applications_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Query(filters): Query<ApplicationFilters>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    if caller == Caller::Anonymous {
        return unauthorized();
    }
    match state.service.list_applications(&caller, &filters) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_application_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    if caller == Caller::Anonymous {
        return unauthorized();
    }
    match state
        .service
        .get_application(&ApplicationId(application_id), &caller)
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn review_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(command): Json<ReviewCommand>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.review(
        &ApplicationId(application_id),
        &recruiter,
        command,
        Utc::now(),
    ) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn withdraw_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let student = match require_student(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state
        .service
        .withdraw(&ApplicationId(application_id), &student)
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn bulk_review_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Json(request): Json<BulkReviewRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let recruiter = match require_recruiter(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.bulk_review(
        &request.application_ids,
        &recruiter,
        request.status,
        request.notes,
        Utc::now(),
    ) {
        Ok(updated) => (StatusCode::OK, Json(json!({ "updated": updated }))).into_response(),
        Err(err) => error_response(err),
    }
}

async fn resume_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Json(request): Json<ResumeRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    let student = match require_student(&caller) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.service.update_student_resume(&student, request.resume) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_list_applications_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Query(filters): Query<ApplicationFilters>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    match state.service.list_applications(&caller, &filters) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_status_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<AdminStatusRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    match state.service.admin_override_status(
        &ApplicationId(application_id),
        request.status,
        Utc::now(),
    ) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn admin_user_activation_handler<I, J, A, P>(
    State(state): State<BoardState<I, J, A, P>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Response
where
    I: IdentityRepository + 'static,
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    P: EventPublisher + 'static,
{
    let caller = bearer_caller(&headers, state.sessions.as_ref());
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    match state
        .service
        .set_identity_active(&UserId(user_id), request.active)
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

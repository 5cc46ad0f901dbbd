use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::assignment::{AssignmentEngine, AssignmentError};
use super::domain::{
    AnimalId, FosterProfileId, FosterVisibility, GroupId, OrganizationId, RequestId, RequestTarget,
    ShelterStatus,
};
use super::repository::{ConversationStore, RequestStore, ShelterStore, StoreError};
use super::requests::{RequestError, RequestLifecycleManager};

/// Shared handler state carrying both workflow services.
pub struct FosteringState<S, R, C> {
    pub assignments: Arc<AssignmentEngine<S, C>>,
    pub requests: Arc<RequestLifecycleManager<S, R, C>>,
}

impl<S, R, C> Clone for FosteringState<S, R, C> {
    fn clone(&self) -> Self {
        Self {
            assignments: self.assignments.clone(),
            requests: self.requests.clone(),
        }
    }
}

/// Router builder exposing the assignment and request lifecycle endpoints.
pub fn fostering_router<S, R, C>(state: FosteringState<S, R, C>) -> Router
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/fostering/animals/:animal_id/assign",
            post(assign_animal_handler::<S, R, C>),
        )
        .route(
            "/api/v1/fostering/animals/:animal_id/unassign",
            post(unassign_animal_handler::<S, R, C>),
        )
        .route(
            "/api/v1/fostering/groups/:group_id/assign",
            post(assign_group_handler::<S, R, C>),
        )
        .route(
            "/api/v1/fostering/groups/:group_id/unassign",
            post(unassign_group_handler::<S, R, C>),
        )
        .route(
            "/api/v1/fostering/requests",
            post(create_request_handler::<S, R, C>),
        )
        .route(
            "/api/v1/fostering/requests/:request_id/cancel",
            post(cancel_request_handler::<S, R, C>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AssignPayload {
    pub organization_id: OrganizationId,
    pub foster_id: FosterProfileId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnassignPayload {
    pub organization_id: OrganizationId,
    pub new_status: ShelterStatus,
    pub new_visibility: FosterVisibility,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestPayload {
    pub organization_id: OrganizationId,
    pub target: RequestTarget,
    pub requester_id: FosterProfileId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequestPayload {
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub message: Option<String>,
}

async fn assign_animal_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    Path(animal_id): Path<String>,
    axum::Json(payload): axum::Json<AssignPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.assignments.assign_animal(
        &payload.organization_id,
        &AnimalId(animal_id),
        &payload.foster_id,
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

async fn unassign_animal_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    Path(animal_id): Path<String>,
    axum::Json(payload): axum::Json<UnassignPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.assignments.unassign_animal(
        &payload.organization_id,
        &AnimalId(animal_id),
        payload.new_status,
        payload.new_visibility,
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

async fn assign_group_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    Path(group_id): Path<String>,
    axum::Json(payload): axum::Json<AssignPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.assignments.assign_group(
        &payload.organization_id,
        &GroupId(group_id),
        &payload.foster_id,
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

async fn unassign_group_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    Path(group_id): Path<String>,
    axum::Json(payload): axum::Json<UnassignPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.assignments.unassign_group(
        &payload.organization_id,
        &GroupId(group_id),
        payload.new_status,
        payload.new_visibility,
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => assignment_error_response(error),
    }
}

async fn create_request_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    axum::Json(payload): axum::Json<CreateRequestPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.requests.create_request(
        &payload.organization_id,
        payload.target,
        &payload.requester_id,
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(error) => request_error_response(error),
    }
}

async fn cancel_request_handler<S, R, C>(
    State(state): State<FosteringState<S, R, C>>,
    Path(request_id): Path<String>,
    axum::Json(payload): axum::Json<CancelRequestPayload>,
) -> Response
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    match state.requests.cancel_request(
        &payload.organization_id,
        &RequestId(request_id),
        payload.message,
    ) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => request_error_response(error),
    }
}

fn assignment_error_response(error: AssignmentError) -> Response {
    if let AssignmentError::PartialGroupWrite {
        ref group_id,
        ref foster,
        ref pending_members,
        ref source,
    } = error
    {
        // Surface the resume state so the caller can retry only the member
        // batch instead of re-running the whole operation blindly.
        let payload = json!({
            "error": error.to_string(),
            "group_id": group_id,
            "foster_id": foster,
            "pending_members": pending_members,
            "source": source.to_string(),
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    let status = match &error {
        AssignmentError::AnimalNotFound(_)
        | AssignmentError::GroupNotFound(_)
        | AssignmentError::NotAssigned(_)
        | AssignmentError::GroupNotAssigned(_) => StatusCode::NOT_FOUND,
        AssignmentError::GroupMembership { .. } | AssignmentError::Conflict { .. } => {
            StatusCode::CONFLICT
        }
        AssignmentError::FosterNotFound(_)
        | AssignmentError::EmptyGroup(_)
        | AssignmentError::UnresolvedMembers { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AssignmentError::PartialGroupWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AssignmentError::Store(store) => store_status(store),
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn request_error_response(error: RequestError) -> Response {
    if let RequestError::PartialRequestWrite {
        ref request_id,
        ref pending_visibility,
        ref source,
    } = error
    {
        // The request row committed; hand back the visibility batch so the
        // caller can re-drive just that step.
        let payload = json!({
            "error": error.to_string(),
            "request_id": request_id,
            "pending_visibility": pending_visibility,
            "source": source.to_string(),
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    let status = match &error {
        RequestError::AlreadyPending { .. } | RequestError::AlreadyAssigned { .. } => {
            StatusCode::CONFLICT
        }
        RequestError::AnimalNotFound(_)
        | RequestError::GroupNotFound(_)
        | RequestError::NotFound(_) => StatusCode::NOT_FOUND,
        RequestError::RequesterNotFound(_) | RequestError::EmptyGroup(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RequestError::PartialRequestWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        RequestError::Store(store) => store_status(store),
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::domain::{
    Animal, AnimalId, FosterProfileId, FosterRequest, FosterVisibility, GroupId, MessageTag,
    OrganizationId, RequestId, RequestStatus, RequestTarget, VisibilityChange,
};
use super::notify::{NotificationDispatcher, NotificationOutcome};
use super::repository::{ConversationStore, RequestStore, ShelterStore, StoreError};

/// Error raised by the request lifecycle manager. Precondition variants are
/// detected before any write; `PartialRequestWrite` is the one mid-sequence
/// case and carries enough state to retry just the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("foster {requester_id} already has a pending request for {target:?}")]
    AlreadyPending {
        target: RequestTarget,
        requester_id: FosterProfileId,
    },
    #[error("{target:?} is not open to foster requests: {detail}")]
    AlreadyAssigned {
        target: RequestTarget,
        detail: String,
    },
    #[error("animal {0} not found")]
    AnimalNotFound(AnimalId),
    #[error("group {0} not found")]
    GroupNotFound(GroupId),
    #[error("requester profile {0} not found")]
    RequesterNotFound(FosterProfileId),
    #[error("group {0} has no members")]
    EmptyGroup(GroupId),
    #[error("no pending request matches {0}")]
    NotFound(RequestId),
    /// The request row committed but the visibility batch did not. Retrying
    /// the attached `pending_visibility` batch completes the operation; the
    /// request itself must not be re-driven.
    #[error("request {request_id} was recorded but the visibility batch did not commit; retry the pending visibility changes")]
    PartialRequestWrite {
        request_id: RequestId,
        pending_visibility: Vec<VisibilityChange>,
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Receipt for a created or cancelled request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestReceipt {
    pub request: FosterRequest,
    pub notification: NotificationOutcome,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

/// Resolved view of a request target used by both lifecycle operations.
struct TargetSnapshot {
    name: String,
    visibility: FosterVisibility,
    current_foster: Option<FosterProfileId>,
    members: Vec<Animal>,
    tag: MessageTag,
}

/// Manages foster-initiated requests. Request creation and coordinator
/// assignment stay mutually exclusive through the visibility gate: a pending
/// request parks the target at `foster_pending`, and an assigned target
/// (`not_visible`) cannot be requested.
pub struct RequestLifecycleManager<S, R, C> {
    store: Arc<S>,
    requests: Arc<R>,
    dispatcher: Arc<NotificationDispatcher<S, C>>,
}

impl<S, R, C> RequestLifecycleManager<S, R, C>
where
    S: ShelterStore + 'static,
    R: RequestStore + 'static,
    C: ConversationStore + 'static,
{
    pub fn new(store: Arc<S>, requests: Arc<R>, conversations: Arc<C>) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(store.clone(), conversations));
        Self::with_dispatcher(store, requests, dispatcher)
    }

    pub fn with_dispatcher(
        store: Arc<S>,
        requests: Arc<R>,
        dispatcher: Arc<NotificationDispatcher<S, C>>,
    ) -> Self {
        Self {
            store,
            requests,
            dispatcher,
        }
    }

    /// Creates a pending request and parks the target's visibility at
    /// `foster_pending` (every member for a group, so the group's effective
    /// visibility stays uniform). Notifies the coordinator team.
    pub fn create_request(
        &self,
        org: &OrganizationId,
        target: RequestTarget,
        requester_id: &FosterProfileId,
        message: Option<String>,
    ) -> Result<RequestReceipt, RequestError> {
        let requester = self
            .store
            .fetch_profile(org, requester_id)?
            .ok_or_else(|| RequestError::RequesterNotFound(requester_id.clone()))?;

        let snapshot = self.resolve_target(org, &target)?;

        // Duplicate detection runs before the visibility gate so a repeated
        // call reports AlreadyPending instead of tripping over the
        // foster_pending visibility its own first call staged.
        if self
            .requests
            .find_pending(org, &target, requester_id)?
            .is_some()
        {
            return Err(RequestError::AlreadyPending {
                target,
                requester_id: requester_id.clone(),
            });
        }

        if matches!(
            snapshot.visibility,
            FosterVisibility::NotVisible | FosterVisibility::FosterPending
        ) {
            return Err(RequestError::AlreadyAssigned {
                target,
                detail: format!("current visibility is {}", snapshot.visibility.label()),
            });
        }
        if snapshot.current_foster.as_ref() == Some(requester_id) {
            return Err(RequestError::AlreadyAssigned {
                target,
                detail: "already assigned to this requester".to_string(),
            });
        }

        let request = FosterRequest {
            id: next_request_id(),
            organization_id: org.clone(),
            target,
            requester_id: requester_id.clone(),
            status: RequestStatus::Pending,
            message: message.clone(),
            created_at: Utc::now(),
        };
        let request = self.requests.insert_request(org, request)?;

        let changes: Vec<VisibilityChange> = snapshot
            .members
            .iter()
            .map(|member| VisibilityChange {
                animal_id: member.id.clone(),
                visibility: FosterVisibility::FosterPending,
            })
            .collect();
        if let Err(source) = self.store.apply_visibility_changes(org, &changes) {
            return Err(RequestError::PartialRequestWrite {
                request_id: request.id,
                pending_visibility: changes,
                source,
            });
        }

        let content = message.unwrap_or_else(|| {
            format!(
                "{} has requested to foster {}.",
                requester.full_name, snapshot.name
            )
        });
        let notification =
            self.dispatcher
                .notify_coordinators(org, requester_id, content, Some(snapshot.tag));

        Ok(RequestReceipt {
            request,
            notification,
        })
    }

    /// Cancels a pending request and restores the target's visibility. The
    /// prior value is not remembered anywhere; it is reconstructed from each
    /// member's current status through the default mapping.
    pub fn cancel_request(
        &self,
        org: &OrganizationId,
        request_id: &RequestId,
        message: Option<String>,
    ) -> Result<RequestReceipt, RequestError> {
        let request = self
            .requests
            .fetch_request(org, request_id)?
            .ok_or_else(|| RequestError::NotFound(request_id.clone()))?;
        if request.status != RequestStatus::Pending {
            return Err(RequestError::NotFound(request_id.clone()));
        }

        let snapshot = self.resolve_target(org, &request.target)?;

        let mut cancelled = request;
        cancelled.status = RequestStatus::Cancelled;
        self.requests.update_request(org, cancelled.clone())?;

        let changes: Vec<VisibilityChange> = snapshot
            .members
            .iter()
            .map(|member| VisibilityChange {
                animal_id: member.id.clone(),
                visibility: member.status.default_visibility(),
            })
            .collect();
        if let Err(source) = self.store.apply_visibility_changes(org, &changes) {
            return Err(RequestError::PartialRequestWrite {
                request_id: cancelled.id.clone(),
                pending_visibility: changes,
                source,
            });
        }

        // Cancellation must not fail on a lapsed requester profile; the
        // default text falls back to the raw id.
        let requester_name = self
            .store
            .fetch_profile(org, &cancelled.requester_id)?
            .map(|profile| profile.full_name)
            .unwrap_or_else(|| cancelled.requester_id.0.clone());
        let content = message.unwrap_or_else(|| {
            format!(
                "{} has cancelled their request to foster {}.",
                requester_name, snapshot.name
            )
        });
        let notification = self.dispatcher.notify_coordinators(
            org,
            &cancelled.requester_id,
            content,
            Some(snapshot.tag),
        );

        Ok(RequestReceipt {
            request: cancelled,
            notification,
        })
    }

    fn resolve_target(
        &self,
        org: &OrganizationId,
        target: &RequestTarget,
    ) -> Result<TargetSnapshot, RequestError> {
        match target {
            RequestTarget::Animal(animal_id) => {
                let animal = self
                    .store
                    .fetch_animal(org, animal_id)?
                    .ok_or_else(|| RequestError::AnimalNotFound(animal_id.clone()))?;
                Ok(TargetSnapshot {
                    name: animal.name.clone(),
                    visibility: animal.foster_visibility,
                    current_foster: animal.current_foster_id.clone(),
                    tag: MessageTag::Animal(animal.id.clone()),
                    members: vec![animal],
                })
            }
            RequestTarget::Group(group_id) => {
                let group = self
                    .store
                    .fetch_group(org, group_id)?
                    .ok_or_else(|| RequestError::GroupNotFound(group_id.clone()))?;
                if group.animal_ids.is_empty() {
                    return Err(RequestError::EmptyGroup(group.id));
                }
                let members = self.store.fetch_animals(org, &group.animal_ids)?;
                // Members share one visibility by invariant; the first
                // resolved member is representative.
                let visibility = members
                    .first()
                    .map(|member| member.foster_visibility)
                    .ok_or_else(|| RequestError::EmptyGroup(group.id.clone()))?;
                Ok(TargetSnapshot {
                    name: group.name,
                    visibility,
                    current_foster: group.current_foster_id,
                    tag: MessageTag::Group(group.id),
                    members,
                })
            }
        }
    }
}

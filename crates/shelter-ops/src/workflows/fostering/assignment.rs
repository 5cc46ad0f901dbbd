use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::conflict::check_group_conflict;
use super::domain::{
    Animal, AnimalChange, AnimalGroup, AnimalId, FosterProfileId, FosterVisibility, GroupId,
    MessageTag, OrganizationId, ShelterStatus,
};
use super::notify::{NotificationDispatcher, NotificationOutcome};
use super::repository::{ConversationStore, ShelterStore, StoreError};

/// Error raised by the assignment engine. Precondition variants are detected
/// before any write; `PartialGroupWrite` is the one mid-sequence case and
/// carries enough state to retry just the step that failed.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("animal {0} not found")]
    AnimalNotFound(AnimalId),
    #[error("group {0} not found")]
    GroupNotFound(GroupId),
    #[error("foster profile {0} not found")]
    FosterNotFound(FosterProfileId),
    #[error("animal {animal_id} belongs to group {group_id}; it can only be assigned or unassigned with its group")]
    GroupMembership {
        animal_id: AnimalId,
        group_id: GroupId,
    },
    #[error("group {group_id} is currently fostered by {group_foster_id}")]
    Conflict {
        group_id: GroupId,
        group_foster_id: FosterProfileId,
    },
    #[error("group {0} has no members")]
    EmptyGroup(GroupId),
    #[error("group {group_id} lists members that do not resolve: {missing:?}")]
    UnresolvedMembers {
        group_id: GroupId,
        missing: Vec<AnimalId>,
    },
    #[error("animal {0} has no foster assigned")]
    NotAssigned(AnimalId),
    #[error("group {0} has no foster assigned")]
    GroupNotAssigned(GroupId),
    /// The group row committed but the member batch did not. Retrying the
    /// attached `pending_members` batch completes the operation; nothing
    /// here guarantees another caller has not interleaved in the meantime.
    #[error("group {group_id} row was updated but the member batch did not commit; retry the pending member changes")]
    PartialGroupWrite {
        group_id: GroupId,
        foster: Option<FosterProfileId>,
        pending_members: Vec<AnimalChange>,
        source: StoreError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Receipt for a completed animal-level transition: the post-write snapshot
/// plus the best-effort notification outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AnimalReceipt {
    pub animal: Animal,
    pub notification: NotificationOutcome,
}

/// Receipt for a completed group-level transition.
#[derive(Debug, Clone, Serialize)]
pub struct GroupReceipt {
    pub group: AnimalGroup,
    pub members: Vec<Animal>,
    pub notification: NotificationOutcome,
}

/// Orchestrates the ordered writes behind assigning and unassigning animals
/// and groups. Each multi-step operation is a sequence of independent store
/// calls with no cross-call atomicity; failures after the first write are
/// reported with resume state rather than rolled back.
pub struct AssignmentEngine<S, C> {
    store: Arc<S>,
    dispatcher: Arc<NotificationDispatcher<S, C>>,
}

impl<S, C> AssignmentEngine<S, C>
where
    S: ShelterStore + 'static,
    C: ConversationStore + 'static,
{
    pub fn new(store: Arc<S>, conversations: Arc<C>) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(store.clone(), conversations));
        Self::with_dispatcher(store, dispatcher)
    }

    pub fn with_dispatcher(store: Arc<S>, dispatcher: Arc<NotificationDispatcher<S, C>>) -> Self {
        Self { store, dispatcher }
    }

    /// Assigns a single ungrouped animal to a foster. Grouped animals are
    /// rejected outright; they only move with their group.
    pub fn assign_animal(
        &self,
        org: &OrganizationId,
        animal_id: &AnimalId,
        foster_id: &FosterProfileId,
        message: Option<String>,
    ) -> Result<AnimalReceipt, AssignmentError> {
        let animal = self
            .store
            .fetch_animal(org, animal_id)?
            .ok_or_else(|| AssignmentError::AnimalNotFound(animal_id.clone()))?;

        if let Some(group_id) = animal.group_id.clone() {
            return Err(AssignmentError::GroupMembership {
                animal_id: animal.id,
                group_id,
            });
        }

        if let Some(conflict) =
            check_group_conflict(self.store.as_ref(), org, animal_id, foster_id)?
        {
            return Err(AssignmentError::Conflict {
                group_id: conflict.group_id,
                group_foster_id: conflict.group_foster_id,
            });
        }

        let foster = self
            .store
            .fetch_profile(org, foster_id)?
            .ok_or_else(|| AssignmentError::FosterNotFound(foster_id.clone()))?;

        // Visibility is hard-set on assignment, not derived from status.
        let change = AnimalChange {
            animal_id: animal.id.clone(),
            foster: Some(foster_id.clone()),
            status: ShelterStatus::InFoster,
            visibility: FosterVisibility::NotVisible,
        };
        self.store
            .apply_animal_changes(org, std::slice::from_ref(&change))?;

        let content = message.unwrap_or_else(|| assigned_text(&foster.full_name, &animal.name));
        let notification = self.dispatcher.notify(
            org,
            foster_id,
            content,
            Some(MessageTag::Animal(animal.id.clone())),
        );

        Ok(AnimalReceipt {
            animal: apply_change(animal, &change),
            notification,
        })
    }

    /// Assigns a whole group: the group row first, then every member listed
    /// in `animal_ids` in one batched write. Animals outside that list are
    /// never touched, even if their `group_id` points here.
    pub fn assign_group(
        &self,
        org: &OrganizationId,
        group_id: &GroupId,
        foster_id: &FosterProfileId,
        message: Option<String>,
    ) -> Result<GroupReceipt, AssignmentError> {
        let group = self
            .store
            .fetch_group(org, group_id)?
            .ok_or_else(|| AssignmentError::GroupNotFound(group_id.clone()))?;
        if group.animal_ids.is_empty() {
            return Err(AssignmentError::EmptyGroup(group.id));
        }

        let members = self.resolve_members(org, &group)?;

        let foster = self
            .store
            .fetch_profile(org, foster_id)?
            .ok_or_else(|| AssignmentError::FosterNotFound(foster_id.clone()))?;

        self.store
            .update_group_foster(org, &group.id, Some(foster_id.clone()))?;

        let changes: Vec<AnimalChange> = members
            .iter()
            .map(|member| AnimalChange {
                animal_id: member.id.clone(),
                foster: Some(foster_id.clone()),
                status: ShelterStatus::InFoster,
                visibility: FosterVisibility::NotVisible,
            })
            .collect();
        if let Err(source) = self.store.apply_animal_changes(org, &changes) {
            return Err(AssignmentError::PartialGroupWrite {
                group_id: group.id,
                foster: Some(foster_id.clone()),
                pending_members: changes,
                source,
            });
        }

        let content = message.unwrap_or_else(|| assigned_text(&foster.full_name, &group.name));
        let notification = self.dispatcher.notify(
            org,
            foster_id,
            content,
            Some(MessageTag::Group(group.id.clone())),
        );

        let members = members
            .into_iter()
            .zip(changes.iter())
            .map(|(member, change)| apply_change(member, change))
            .collect();
        let mut group = group;
        group.current_foster_id = Some(foster_id.clone());

        Ok(GroupReceipt {
            group,
            members,
            notification,
        })
    }

    /// Clears a single ungrouped animal's foster. The caller supplies the
    /// resulting status and visibility; the engine trusts both as given and
    /// does not re-derive visibility, since a coordinator may deliberately
    /// decouple them.
    pub fn unassign_animal(
        &self,
        org: &OrganizationId,
        animal_id: &AnimalId,
        new_status: ShelterStatus,
        new_visibility: FosterVisibility,
        message: Option<String>,
    ) -> Result<AnimalReceipt, AssignmentError> {
        let animal = self
            .store
            .fetch_animal(org, animal_id)?
            .ok_or_else(|| AssignmentError::AnimalNotFound(animal_id.clone()))?;

        if let Some(group_id) = animal.group_id.clone() {
            return Err(AssignmentError::GroupMembership {
                animal_id: animal.id,
                group_id,
            });
        }

        let foster_id = animal
            .current_foster_id
            .clone()
            .ok_or_else(|| AssignmentError::NotAssigned(animal.id.clone()))?;
        // Unassignment must not fail on a lapsed foster profile; the default
        // text falls back to the raw id.
        let foster_name = self
            .store
            .fetch_profile(org, &foster_id)?
            .map(|profile| profile.full_name)
            .unwrap_or_else(|| foster_id.0.clone());

        let change = AnimalChange {
            animal_id: animal.id.clone(),
            foster: None,
            status: new_status,
            visibility: new_visibility,
        };
        self.store
            .apply_animal_changes(org, std::slice::from_ref(&change))?;

        let content = message.unwrap_or_else(|| unassigned_text(&foster_name, &animal.name));
        let notification = self.dispatcher.notify(
            org,
            &foster_id,
            content,
            Some(MessageTag::Animal(animal.id.clone())),
        );

        Ok(AnimalReceipt {
            animal: apply_change(animal, &change),
            notification,
        })
    }

    /// Clears a whole group's foster and applies the caller-supplied status
    /// and visibility to every listed member.
    pub fn unassign_group(
        &self,
        org: &OrganizationId,
        group_id: &GroupId,
        new_status: ShelterStatus,
        new_visibility: FosterVisibility,
        message: Option<String>,
    ) -> Result<GroupReceipt, AssignmentError> {
        let group = self
            .store
            .fetch_group(org, group_id)?
            .ok_or_else(|| AssignmentError::GroupNotFound(group_id.clone()))?;
        if group.animal_ids.is_empty() {
            return Err(AssignmentError::EmptyGroup(group.id));
        }

        let foster_id = group
            .current_foster_id
            .clone()
            .ok_or_else(|| AssignmentError::GroupNotAssigned(group.id.clone()))?;

        let members = self.resolve_members(org, &group)?;

        // Same lapsed-profile tolerance as the single-animal path.
        let foster_name = self
            .store
            .fetch_profile(org, &foster_id)?
            .map(|profile| profile.full_name)
            .unwrap_or_else(|| foster_id.0.clone());

        self.store.update_group_foster(org, &group.id, None)?;

        let changes: Vec<AnimalChange> = members
            .iter()
            .map(|member| AnimalChange {
                animal_id: member.id.clone(),
                foster: None,
                status: new_status,
                visibility: new_visibility,
            })
            .collect();
        if let Err(source) = self.store.apply_animal_changes(org, &changes) {
            return Err(AssignmentError::PartialGroupWrite {
                group_id: group.id,
                foster: None,
                pending_members: changes,
                source,
            });
        }

        let content = message.unwrap_or_else(|| unassigned_text(&foster_name, &group.name));
        let notification = self.dispatcher.notify(
            org,
            &foster_id,
            content,
            Some(MessageTag::Group(group.id.clone())),
        );

        let members = members
            .into_iter()
            .zip(changes.iter())
            .map(|(member, change)| apply_change(member, change))
            .collect();
        let mut group = group;
        group.current_foster_id = None;

        Ok(GroupReceipt {
            group,
            members,
            notification,
        })
    }

    fn resolve_members(
        &self,
        org: &OrganizationId,
        group: &AnimalGroup,
    ) -> Result<Vec<Animal>, AssignmentError> {
        let members = self.store.fetch_animals(org, &group.animal_ids)?;
        if members.len() != group.animal_ids.len() {
            let found: HashSet<&AnimalId> = members.iter().map(|member| &member.id).collect();
            let missing = group
                .animal_ids
                .iter()
                .filter(|id| !found.contains(id))
                .cloned()
                .collect();
            return Err(AssignmentError::UnresolvedMembers {
                group_id: group.id.clone(),
                missing,
            });
        }
        Ok(members)
    }
}

fn apply_change(mut animal: Animal, change: &AnimalChange) -> Animal {
    animal.current_foster_id = change.foster.clone();
    animal.status = change.status;
    animal.foster_visibility = change.visibility;
    animal
}

fn assigned_text(foster_name: &str, entity_name: &str) -> String {
    format!("Hi {foster_name}, {entity_name} has been assigned to you.")
}

fn unassigned_text(foster_name: &str, entity_name: &str) -> String {
    format!("Hi {foster_name}, {entity_name} is no longer assigned to you.")
}

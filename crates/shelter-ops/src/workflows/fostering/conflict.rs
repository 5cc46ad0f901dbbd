use super::domain::{AnimalId, FosterProfileId, GroupId, OrganizationId};
use super::repository::{ShelterStore, StoreError};

/// Names the group blocking an individual assignment and the foster who
/// currently holds it, so the caller can surface an actionable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConflict {
    pub group_id: GroupId,
    pub group_foster_id: FosterProfileId,
}

/// Checks whether an animal's group membership makes assigning it to
/// `candidate_foster` illegal.
///
/// No group, or a group with no foster, or a group already held by the
/// candidate is not a conflict. A negative result authorizes the attempt,
/// not the outcome: another caller can still write between this check and
/// the subsequent mutation.
pub fn check_group_conflict<S: ShelterStore>(
    store: &S,
    org: &OrganizationId,
    animal_id: &AnimalId,
    candidate_foster: &FosterProfileId,
) -> Result<Option<GroupConflict>, StoreError> {
    let animal = store
        .fetch_animal(org, animal_id)?
        .ok_or(StoreError::NotFound)?;

    let Some(group_id) = animal.group_id else {
        return Ok(None);
    };

    let group = match store.fetch_group(org, &group_id)? {
        Some(group) => group,
        // Dangling group reference; nothing to conflict with.
        None => return Ok(None),
    };

    match group.current_foster_id {
        Some(group_foster_id) if group_foster_id != *candidate_foster => Ok(Some(GroupConflict {
            group_id: group.id,
            group_foster_id,
        })),
        _ => Ok(None),
    }
}

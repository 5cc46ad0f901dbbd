use super::domain::{
    Animal, AnimalChange, AnimalGroup, AnimalId, Conversation, ConversationKind, FosterProfile,
    FosterProfileId, FosterRequest, GroupId, Message, MessageLink, OrganizationId, RequestId,
    RequestTarget, VisibilityChange,
};

/// Error enumeration for store failures.
///
/// `Unavailable` is the transport-level case and must stay distinguishable
/// from `NotFound`: a caller whose network is down must never be told an
/// entity does not exist.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Row store for animals, groups, and profiles. Every call is scoped to one
/// organization; implementations must never cross that boundary. There is no
/// cross-call atomicity: each method is a single independent network write.
pub trait ShelterStore: Send + Sync {
    fn fetch_animal(
        &self,
        org: &OrganizationId,
        id: &AnimalId,
    ) -> Result<Option<Animal>, StoreError>;

    /// Returns the animals that resolved, preserving input order. Callers
    /// detect missing ids by comparing against what they asked for.
    fn fetch_animals(
        &self,
        org: &OrganizationId,
        ids: &[AnimalId],
    ) -> Result<Vec<Animal>, StoreError>;

    fn fetch_group(
        &self,
        org: &OrganizationId,
        id: &GroupId,
    ) -> Result<Option<AnimalGroup>, StoreError>;

    fn fetch_profile(
        &self,
        org: &OrganizationId,
        id: &FosterProfileId,
    ) -> Result<Option<FosterProfile>, StoreError>;

    fn update_group_foster(
        &self,
        org: &OrganizationId,
        id: &GroupId,
        foster: Option<FosterProfileId>,
    ) -> Result<(), StoreError>;

    /// Applies the full post-transition field set to each listed animal in
    /// one batched write.
    fn apply_animal_changes(
        &self,
        org: &OrganizationId,
        changes: &[AnimalChange],
    ) -> Result<(), StoreError>;

    /// Visibility-only batched write; status and foster are left untouched.
    fn apply_visibility_changes(
        &self,
        org: &OrganizationId,
        changes: &[VisibilityChange],
    ) -> Result<(), StoreError>;
}

/// Row store for foster requests. The store offers no uniqueness constraint
/// across the animal/group target columns, so the pending-per-(target,
/// requester) invariant is enforced by `find_pending` before insert.
pub trait RequestStore: Send + Sync {
    fn insert_request(
        &self,
        org: &OrganizationId,
        request: FosterRequest,
    ) -> Result<FosterRequest, StoreError>;

    fn update_request(
        &self,
        org: &OrganizationId,
        request: FosterRequest,
    ) -> Result<(), StoreError>;

    fn fetch_request(
        &self,
        org: &OrganizationId,
        id: &RequestId,
    ) -> Result<Option<FosterRequest>, StoreError>;

    fn find_pending(
        &self,
        org: &OrganizationId,
        target: &RequestTarget,
        requester: &FosterProfileId,
    ) -> Result<Option<FosterRequest>, StoreError>;
}

/// Write-mostly store for the chat side effects. The workflow never reads
/// messages back.
pub trait ConversationStore: Send + Sync {
    /// Looks up a conversation by kind. `foster` narrows the lookup to the
    /// owning profile for foster chats; coordinator group conversations are
    /// found by kind and organization alone.
    fn find_conversation(
        &self,
        org: &OrganizationId,
        kind: ConversationKind,
        foster: Option<&FosterProfileId>,
    ) -> Result<Option<Conversation>, StoreError>;

    fn insert_message(
        &self,
        org: &OrganizationId,
        message: Message,
    ) -> Result<Message, StoreError>;

    fn insert_link(&self, org: &OrganizationId, link: MessageLink) -> Result<(), StoreError>;
}

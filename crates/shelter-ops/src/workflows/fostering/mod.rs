//! Foster assignment and request lifecycle for animals and animal groups.
//!
//! Several independently-stored entities (animal, group, profile, request,
//! conversation, message, tag link) are kept mutually consistent here without
//! multi-row transactions: each multi-step operation is an explicit ordered
//! sequence of store writes, precondition errors abort before the first
//! write, and mid-sequence failures surface with enough state to retry the
//! remaining step. Notifications are best-effort side effects of successful
//! transitions and never roll a transition back.

pub mod assignment;
pub mod conflict;
pub mod domain;
pub mod notify;
pub mod repository;
pub mod requests;
pub mod router;

#[cfg(test)]
mod tests;

pub use assignment::{AnimalReceipt, AssignmentEngine, AssignmentError, GroupReceipt};
pub use conflict::{check_group_conflict, GroupConflict};
pub use domain::{
    Animal, AnimalChange, AnimalGroup, AnimalId, Conversation, ConversationId, ConversationKind,
    FosterProfile, FosterProfileId, FosterRequest, FosterRole, FosterVisibility, GroupId, Message,
    MessageId, MessageLink, MessageTag, OrganizationId, RequestId, RequestStatus, RequestTarget,
    ShelterStatus, VisibilityChange,
};
pub use notify::{NotificationDispatcher, NotificationOutcome};
pub use repository::{ConversationStore, RequestStore, ShelterStore, StoreError};
pub use requests::{RequestError, RequestLifecycleManager, RequestReceipt};
pub use router::{fostering_router, FosteringState};

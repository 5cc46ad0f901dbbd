use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! display_as_inner {
    ($($id:ty),+ $(,)?) => {
        $(impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

/// Identifier wrapper for shelter animals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub String);

/// Identifier wrapper for animal groups (litters, bonded pairs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub String);

/// Identifier wrapper for foster and coordinator profiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FosterProfileId(pub String);

/// Identifier wrapper for foster requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Identifier wrapper for chat conversations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// Identifier wrapper for chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Tenant boundary: every store read and write is scoped to one organization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub String);

display_as_inner!(
    AnimalId,
    GroupId,
    FosterProfileId,
    RequestId,
    ConversationId,
    MessageId,
    OrganizationId,
);

/// Internal shelter status tracked for every animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelterStatus {
    InShelter,
    InFoster,
    Adopted,
    MedicalHold,
    Transferring,
}

impl ShelterStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShelterStatus::InShelter => "in_shelter",
            ShelterStatus::InFoster => "in_foster",
            ShelterStatus::Adopted => "adopted",
            ShelterStatus::MedicalHold => "medical_hold",
            ShelterStatus::Transferring => "transferring",
        }
    }

    /// Default public visibility for this status.
    ///
    /// The rule is one-directional: a status change flows into visibility
    /// through this mapping, but a visibility change never touches status.
    pub const fn default_visibility(self) -> FosterVisibility {
        match self {
            ShelterStatus::InShelter => FosterVisibility::AvailableNow,
            ShelterStatus::MedicalHold | ShelterStatus::Transferring => {
                FosterVisibility::AvailableFuture
            }
            ShelterStatus::InFoster | ShelterStatus::Adopted => FosterVisibility::NotVisible,
        }
    }
}

/// Availability flag shown on the public "fosters needed" listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FosterVisibility {
    AvailableNow,
    AvailableFuture,
    FosterPending,
    NotVisible,
}

impl FosterVisibility {
    pub const fn label(self) -> &'static str {
        match self {
            FosterVisibility::AvailableNow => "available_now",
            FosterVisibility::AvailableFuture => "available_future",
            FosterVisibility::FosterPending => "foster_pending",
            FosterVisibility::NotVisible => "not_visible",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FosterRole {
    Foster,
    Coordinator,
}

/// A shelter animal. `group_id` present means the animal moves only with its
/// group; its `current_foster_id` is then owned by the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub status: ShelterStatus,
    pub foster_visibility: FosterVisibility,
    pub current_foster_id: Option<FosterProfileId>,
    pub group_id: Option<GroupId>,
}

/// A fixed set of animals fostered together as one unit. Member animals'
/// `group_id` and `current_foster_id` are kept in sync by the assignment
/// engine, not by any store-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalGroup {
    pub id: GroupId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub animal_ids: Vec<AnimalId>,
    pub current_foster_id: Option<FosterProfileId>,
}

/// Volunteer or staff profile. Read-only from this workflow's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FosterProfile {
    pub id: FosterProfileId,
    pub organization_id: OrganizationId,
    pub role: FosterRole,
    pub full_name: String,
    pub email: String,
}

/// Target of a foster request: one animal or one whole group, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTarget {
    Animal(AnimalId),
    Group(GroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Cancelled,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Foster-initiated request to take an animal or group. This workflow
/// creates `pending` rows and transitions them to `cancelled`; fulfilment
/// and rejection belong to coordinator tooling outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FosterRequest {
    pub id: RequestId,
    pub organization_id: OrganizationId,
    pub target: RequestTarget,
    pub requester_id: FosterProfileId,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Private chat owned by a single foster.
    FosterChat,
    /// Shared conversation for the organization's coordinator team.
    CoordinatorGroup,
}

impl ConversationKind {
    pub const fn label(self) -> &'static str {
        match self {
            ConversationKind::FosterChat => "foster_chat",
            ConversationKind::CoordinatorGroup => "coordinator_group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub organization_id: OrganizationId,
    pub kind: ConversationKind,
    /// Set for `FosterChat`, absent for `CoordinatorGroup`.
    pub foster_profile_id: Option<FosterProfileId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: FosterProfileId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Discriminated reference from a message to exactly one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTag {
    Animal(AnimalId),
    Group(GroupId),
    Foster(FosterProfileId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLink {
    pub message_id: MessageId,
    pub tag: MessageTag,
}

/// Batch-command value object for one animal row: the full post-transition
/// field set, applied by the store in a single batched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalChange {
    pub animal_id: AnimalId,
    pub foster: Option<FosterProfileId>,
    pub status: ShelterStatus,
    pub visibility: FosterVisibility,
}

/// Visibility-only write; the directional status→visibility rule means this
/// never carries a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityChange {
    pub animal_id: AnimalId,
    pub visibility: FosterVisibility,
}

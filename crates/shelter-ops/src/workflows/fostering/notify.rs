use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use super::domain::{
    ConversationKind, FosterProfileId, FosterRole, Message, MessageId, MessageLink, MessageTag,
    OrganizationId,
};
use super::repository::{ConversationStore, ShelterStore};

/// Outcome of a best-effort notification. Rides on the success receipt of
/// the triggering operation and never escalates into a failure of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Delivered { message_id: MessageId },
    /// The message row committed but the tag row did not.
    DeliveredWithoutTag { message_id: MessageId, reason: String },
    Skipped { reason: String },
}

static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_message_id() -> MessageId {
    let id = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MessageId(format!("msg-{id:06}"))
}

/// Writes chat messages (optionally tagged to an animal, group, or profile)
/// as a decoupled side effect of a successful transition. Runs only after
/// the primary mutation is confirmed.
pub struct NotificationDispatcher<S, C> {
    shelter: Arc<S>,
    conversations: Arc<C>,
}

impl<S, C> NotificationDispatcher<S, C>
where
    S: ShelterStore,
    C: ConversationStore,
{
    pub fn new(shelter: Arc<S>, conversations: Arc<C>) -> Self {
        Self {
            shelter,
            conversations,
        }
    }

    /// Routes by the recipient's role: coordinators share one group
    /// conversation per organization, fosters each own a private chat.
    pub fn notify(
        &self,
        org: &OrganizationId,
        recipient: &FosterProfileId,
        content: String,
        tag: Option<MessageTag>,
    ) -> NotificationOutcome {
        let profile = match self.shelter.fetch_profile(org, recipient) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(
                    recipient = %recipient,
                    "notification skipped: recipient profile not found"
                );
                return NotificationOutcome::Skipped {
                    reason: format!("profile {recipient} not found"),
                };
            }
            Err(err) => {
                warn!(
                    recipient = %recipient,
                    error = %err,
                    "notification skipped: profile lookup failed"
                );
                return NotificationOutcome::Skipped {
                    reason: err.to_string(),
                };
            }
        };

        let (kind, owner) = match profile.role {
            FosterRole::Coordinator => (ConversationKind::CoordinatorGroup, None),
            FosterRole::Foster => (ConversationKind::FosterChat, Some(recipient)),
        };
        self.deliver(org, kind, owner, recipient, content, tag)
    }

    /// Request-lifecycle events land in the organization's shared
    /// coordinator conversation regardless of the sender's role.
    pub fn notify_coordinators(
        &self,
        org: &OrganizationId,
        sender: &FosterProfileId,
        content: String,
        tag: Option<MessageTag>,
    ) -> NotificationOutcome {
        self.deliver(
            org,
            ConversationKind::CoordinatorGroup,
            None,
            sender,
            content,
            tag,
        )
    }

    fn deliver(
        &self,
        org: &OrganizationId,
        kind: ConversationKind,
        owner: Option<&FosterProfileId>,
        sender: &FosterProfileId,
        content: String,
        tag: Option<MessageTag>,
    ) -> NotificationOutcome {
        let conversation = match self.conversations.find_conversation(org, kind, owner) {
            Ok(Some(conversation)) => conversation,
            Ok(None) => {
                warn!(
                    organization = %org,
                    kind = kind.label(),
                    "notification skipped: no matching conversation"
                );
                return NotificationOutcome::Skipped {
                    reason: format!("no {} conversation", kind.label()),
                };
            }
            Err(err) => {
                warn!(
                    organization = %org,
                    kind = kind.label(),
                    error = %err,
                    "notification skipped: conversation lookup failed"
                );
                return NotificationOutcome::Skipped {
                    reason: err.to_string(),
                };
            }
        };

        let message = Message {
            id: next_message_id(),
            conversation_id: conversation.id,
            sender_id: sender.clone(),
            content,
            sent_at: Utc::now(),
        };
        let message = match self.conversations.insert_message(org, message) {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    organization = %org,
                    kind = kind.label(),
                    error = %err,
                    "notification skipped: message insert failed"
                );
                return NotificationOutcome::Skipped {
                    reason: err.to_string(),
                };
            }
        };

        if let Some(tag) = tag {
            let link = MessageLink {
                message_id: message.id.clone(),
                tag,
            };
            if let Err(err) = self.conversations.insert_link(org, link) {
                // The message itself committed; report degraded success.
                warn!(
                    message_id = %message.id,
                    error = %err,
                    "message delivered but tag link insert failed"
                );
                return NotificationOutcome::DeliveredWithoutTag {
                    message_id: message.id,
                    reason: err.to_string(),
                };
            }
        }

        NotificationOutcome::Delivered {
            message_id: message.id,
        }
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::workflows::fostering::assignment::AssignmentEngine;
use crate::workflows::fostering::domain::{
    Animal, AnimalChange, AnimalGroup, AnimalId, Conversation, ConversationId, ConversationKind,
    FosterProfile, FosterProfileId, FosterRequest, FosterRole, FosterVisibility, GroupId, Message,
    MessageLink, OrganizationId, RequestId, RequestStatus, RequestTarget, ShelterStatus,
    VisibilityChange,
};
use crate::workflows::fostering::notify::NotificationDispatcher;
use crate::workflows::fostering::repository::{
    ConversationStore, RequestStore, ShelterStore, StoreError,
};
use crate::workflows::fostering::requests::RequestLifecycleManager;

pub(super) fn org() -> OrganizationId {
    OrganizationId("org-paws".to_string())
}

pub(super) fn animal(id: &str, name: &str) -> Animal {
    Animal {
        id: AnimalId(id.to_string()),
        organization_id: org(),
        name: name.to_string(),
        status: ShelterStatus::InShelter,
        foster_visibility: FosterVisibility::AvailableNow,
        current_foster_id: None,
        group_id: None,
    }
}

pub(super) fn grouped_animal(id: &str, name: &str, group_id: &str) -> Animal {
    let mut member = animal(id, name);
    member.group_id = Some(GroupId(group_id.to_string()));
    member
}

pub(super) fn group(id: &str, name: &str, member_ids: &[&str]) -> AnimalGroup {
    AnimalGroup {
        id: GroupId(id.to_string()),
        organization_id: org(),
        name: name.to_string(),
        animal_ids: member_ids
            .iter()
            .map(|member| AnimalId(member.to_string()))
            .collect(),
        current_foster_id: None,
    }
}

pub(super) fn foster(id: &str, name: &str) -> FosterProfile {
    FosterProfile {
        id: FosterProfileId(id.to_string()),
        organization_id: org(),
        role: FosterRole::Foster,
        full_name: name.to_string(),
        email: format!("{id}@example.org"),
    }
}

pub(super) fn coordinator(id: &str, name: &str) -> FosterProfile {
    let mut profile = foster(id, name);
    profile.role = FosterRole::Coordinator;
    profile
}

#[derive(Default)]
pub(super) struct MemoryShelterStore {
    pub(super) animals: Mutex<HashMap<AnimalId, Animal>>,
    pub(super) groups: Mutex<HashMap<GroupId, AnimalGroup>>,
    pub(super) profiles: Mutex<HashMap<FosterProfileId, FosterProfile>>,
}

impl MemoryShelterStore {
    pub(super) fn with(
        animals: Vec<Animal>,
        groups: Vec<AnimalGroup>,
        profiles: Vec<FosterProfile>,
    ) -> Arc<Self> {
        let store = Self::default();
        {
            let mut guard = store.animals.lock().expect("animal mutex poisoned");
            for animal in animals {
                guard.insert(animal.id.clone(), animal);
            }
        }
        {
            let mut guard = store.groups.lock().expect("group mutex poisoned");
            for group in groups {
                guard.insert(group.id.clone(), group);
            }
        }
        {
            let mut guard = store.profiles.lock().expect("profile mutex poisoned");
            for profile in profiles {
                guard.insert(profile.id.clone(), profile);
            }
        }
        Arc::new(store)
    }

    pub(super) fn animal(&self, id: &str) -> Animal {
        self.animals
            .lock()
            .expect("animal mutex poisoned")
            .get(&AnimalId(id.to_string()))
            .cloned()
            .expect("animal present")
    }

    pub(super) fn group(&self, id: &str) -> AnimalGroup {
        self.groups
            .lock()
            .expect("group mutex poisoned")
            .get(&GroupId(id.to_string()))
            .cloned()
            .expect("group present")
    }
}

impl ShelterStore for MemoryShelterStore {
    fn fetch_animal(
        &self,
        org: &OrganizationId,
        id: &AnimalId,
    ) -> Result<Option<Animal>, StoreError> {
        let guard = self.animals.lock().expect("animal mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|animal| animal.organization_id == *org)
            .cloned())
    }

    fn fetch_animals(
        &self,
        org: &OrganizationId,
        ids: &[AnimalId],
    ) -> Result<Vec<Animal>, StoreError> {
        let guard = self.animals.lock().expect("animal mutex poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id))
            .filter(|animal| animal.organization_id == *org)
            .cloned()
            .collect())
    }

    fn fetch_group(
        &self,
        org: &OrganizationId,
        id: &GroupId,
    ) -> Result<Option<AnimalGroup>, StoreError> {
        let guard = self.groups.lock().expect("group mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|group| group.organization_id == *org)
            .cloned())
    }

    fn fetch_profile(
        &self,
        org: &OrganizationId,
        id: &FosterProfileId,
    ) -> Result<Option<FosterProfile>, StoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|profile| profile.organization_id == *org)
            .cloned())
    }

    fn update_group_foster(
        &self,
        org: &OrganizationId,
        id: &GroupId,
        foster: Option<FosterProfileId>,
    ) -> Result<(), StoreError> {
        let mut guard = self.groups.lock().expect("group mutex poisoned");
        let group = guard
            .get_mut(id)
            .filter(|group| group.organization_id == *org)
            .ok_or(StoreError::NotFound)?;
        group.current_foster_id = foster;
        Ok(())
    }

    fn apply_animal_changes(
        &self,
        org: &OrganizationId,
        changes: &[AnimalChange],
    ) -> Result<(), StoreError> {
        let mut guard = self.animals.lock().expect("animal mutex poisoned");
        for change in changes {
            let animal = guard
                .get_mut(&change.animal_id)
                .filter(|animal| animal.organization_id == *org)
                .ok_or(StoreError::NotFound)?;
            animal.current_foster_id = change.foster.clone();
            animal.status = change.status;
            animal.foster_visibility = change.visibility;
        }
        Ok(())
    }

    fn apply_visibility_changes(
        &self,
        org: &OrganizationId,
        changes: &[VisibilityChange],
    ) -> Result<(), StoreError> {
        let mut guard = self.animals.lock().expect("animal mutex poisoned");
        for change in changes {
            let animal = guard
                .get_mut(&change.animal_id)
                .filter(|animal| animal.organization_id == *org)
                .ok_or(StoreError::NotFound)?;
            animal.foster_visibility = change.visibility;
        }
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryRequestStore {
    pub(super) records: Mutex<HashMap<RequestId, FosterRequest>>,
}

impl RequestStore for MemoryRequestStore {
    fn insert_request(
        &self,
        _org: &OrganizationId,
        request: FosterRequest,
    ) -> Result<FosterRequest, StoreError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        if guard.contains_key(&request.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update_request(
        &self,
        _org: &OrganizationId,
        request: FosterRequest,
    ) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        if !guard.contains_key(&request.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(request.id.clone(), request);
        Ok(())
    }

    fn fetch_request(
        &self,
        org: &OrganizationId,
        id: &RequestId,
    ) -> Result<Option<FosterRequest>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|request| request.organization_id == *org)
            .cloned())
    }

    fn find_pending(
        &self,
        org: &OrganizationId,
        target: &RequestTarget,
        requester: &FosterProfileId,
    ) -> Result<Option<FosterRequest>, StoreError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard
            .values()
            .find(|request| {
                request.organization_id == *org
                    && request.status == RequestStatus::Pending
                    && request.target == *target
                    && request.requester_id == *requester
            })
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryConversationStore {
    pub(super) conversations: Mutex<Vec<Conversation>>,
    pub(super) messages: Mutex<Vec<Message>>,
    pub(super) links: Mutex<Vec<MessageLink>>,
}

impl MemoryConversationStore {
    pub(super) fn add_foster_chat(&self, conversation_id: &str, foster_id: &str) {
        self.conversations
            .lock()
            .expect("conversation mutex poisoned")
            .push(Conversation {
                id: ConversationId(conversation_id.to_string()),
                organization_id: org(),
                kind: ConversationKind::FosterChat,
                foster_profile_id: Some(FosterProfileId(foster_id.to_string())),
            });
    }

    pub(super) fn add_coordinator_group(&self, conversation_id: &str) {
        self.conversations
            .lock()
            .expect("conversation mutex poisoned")
            .push(Conversation {
                id: ConversationId(conversation_id.to_string()),
                organization_id: org(),
                kind: ConversationKind::CoordinatorGroup,
                foster_profile_id: None,
            });
    }

    pub(super) fn messages(&self) -> Vec<Message> {
        self.messages.lock().expect("message mutex poisoned").clone()
    }

    pub(super) fn links(&self) -> Vec<MessageLink> {
        self.links.lock().expect("link mutex poisoned").clone()
    }
}

impl ConversationStore for MemoryConversationStore {
    fn find_conversation(
        &self,
        org: &OrganizationId,
        kind: ConversationKind,
        foster: Option<&FosterProfileId>,
    ) -> Result<Option<Conversation>, StoreError> {
        let guard = self
            .conversations
            .lock()
            .expect("conversation mutex poisoned");
        Ok(guard
            .iter()
            .find(|conversation| {
                conversation.organization_id == *org
                    && conversation.kind == kind
                    && conversation.foster_profile_id.as_ref() == foster
            })
            .cloned())
    }

    fn insert_message(
        &self,
        _org: &OrganizationId,
        message: Message,
    ) -> Result<Message, StoreError> {
        self.messages
            .lock()
            .expect("message mutex poisoned")
            .push(message.clone());
        Ok(message)
    }

    fn insert_link(&self, _org: &OrganizationId, link: MessageLink) -> Result<(), StoreError> {
        self.links.lock().expect("link mutex poisoned").push(link);
        Ok(())
    }
}

/// Conversation store whose tag-link writes always fail, for exercising the
/// degraded-success path.
pub(super) struct BrokenLinkConversationStore {
    pub(super) inner: Arc<MemoryConversationStore>,
}

impl ConversationStore for BrokenLinkConversationStore {
    fn find_conversation(
        &self,
        org: &OrganizationId,
        kind: ConversationKind,
        foster: Option<&FosterProfileId>,
    ) -> Result<Option<Conversation>, StoreError> {
        self.inner.find_conversation(org, kind, foster)
    }

    fn insert_message(
        &self,
        org: &OrganizationId,
        message: Message,
    ) -> Result<Message, StoreError> {
        self.inner.insert_message(org, message)
    }

    fn insert_link(&self, _org: &OrganizationId, _link: MessageLink) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("link table offline".to_string()))
    }
}

/// Shelter store whose batched member writes always fail, for exercising the
/// partial group write path. Everything else delegates.
pub(super) struct FlakyMemberBatchStore {
    pub(super) inner: Arc<MemoryShelterStore>,
}

impl ShelterStore for FlakyMemberBatchStore {
    fn fetch_animal(
        &self,
        org: &OrganizationId,
        id: &AnimalId,
    ) -> Result<Option<Animal>, StoreError> {
        self.inner.fetch_animal(org, id)
    }

    fn fetch_animals(
        &self,
        org: &OrganizationId,
        ids: &[AnimalId],
    ) -> Result<Vec<Animal>, StoreError> {
        self.inner.fetch_animals(org, ids)
    }

    fn fetch_group(
        &self,
        org: &OrganizationId,
        id: &GroupId,
    ) -> Result<Option<AnimalGroup>, StoreError> {
        self.inner.fetch_group(org, id)
    }

    fn fetch_profile(
        &self,
        org: &OrganizationId,
        id: &FosterProfileId,
    ) -> Result<Option<FosterProfile>, StoreError> {
        self.inner.fetch_profile(org, id)
    }

    fn update_group_foster(
        &self,
        org: &OrganizationId,
        id: &GroupId,
        foster: Option<FosterProfileId>,
    ) -> Result<(), StoreError> {
        self.inner.update_group_foster(org, id, foster)
    }

    fn apply_animal_changes(
        &self,
        _org: &OrganizationId,
        _changes: &[AnimalChange],
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("animal batch offline".to_string()))
    }

    fn apply_visibility_changes(
        &self,
        org: &OrganizationId,
        changes: &[VisibilityChange],
    ) -> Result<(), StoreError> {
        self.inner.apply_visibility_changes(org, changes)
    }
}

/// Shelter store whose batched visibility writes always fail, for exercising
/// the partial request write path. Everything else delegates.
pub(super) struct FlakyVisibilityBatchStore {
    pub(super) inner: Arc<MemoryShelterStore>,
}

impl ShelterStore for FlakyVisibilityBatchStore {
    fn fetch_animal(
        &self,
        org: &OrganizationId,
        id: &AnimalId,
    ) -> Result<Option<Animal>, StoreError> {
        self.inner.fetch_animal(org, id)
    }

    fn fetch_animals(
        &self,
        org: &OrganizationId,
        ids: &[AnimalId],
    ) -> Result<Vec<Animal>, StoreError> {
        self.inner.fetch_animals(org, ids)
    }

    fn fetch_group(
        &self,
        org: &OrganizationId,
        id: &GroupId,
    ) -> Result<Option<AnimalGroup>, StoreError> {
        self.inner.fetch_group(org, id)
    }

    fn fetch_profile(
        &self,
        org: &OrganizationId,
        id: &FosterProfileId,
    ) -> Result<Option<FosterProfile>, StoreError> {
        self.inner.fetch_profile(org, id)
    }

    fn update_group_foster(
        &self,
        org: &OrganizationId,
        id: &GroupId,
        foster: Option<FosterProfileId>,
    ) -> Result<(), StoreError> {
        self.inner.update_group_foster(org, id, foster)
    }

    fn apply_animal_changes(
        &self,
        org: &OrganizationId,
        changes: &[AnimalChange],
    ) -> Result<(), StoreError> {
        self.inner.apply_animal_changes(org, changes)
    }

    fn apply_visibility_changes(
        &self,
        _org: &OrganizationId,
        _changes: &[VisibilityChange],
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(
            "visibility batch offline".to_string(),
        ))
    }
}

pub(super) fn build_engine(
    shelter: Arc<MemoryShelterStore>,
    conversations: Arc<MemoryConversationStore>,
) -> AssignmentEngine<MemoryShelterStore, MemoryConversationStore> {
    AssignmentEngine::new(shelter, conversations)
}

pub(super) fn build_manager(
    shelter: Arc<MemoryShelterStore>,
    requests: Arc<MemoryRequestStore>,
    conversations: Arc<MemoryConversationStore>,
) -> RequestLifecycleManager<MemoryShelterStore, MemoryRequestStore, MemoryConversationStore> {
    RequestLifecycleManager::new(shelter, requests, conversations)
}

pub(super) fn build_dispatcher(
    shelter: Arc<MemoryShelterStore>,
    conversations: Arc<MemoryConversationStore>,
) -> NotificationDispatcher<MemoryShelterStore, MemoryConversationStore> {
    NotificationDispatcher::new(shelter, conversations)
}

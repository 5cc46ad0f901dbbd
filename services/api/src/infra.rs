use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;
use shelter_ops::workflows::fostering::{
    Animal, AnimalChange, AnimalGroup, AnimalId, Conversation, ConversationId, ConversationKind,
    ConversationStore, FosterProfile, FosterProfileId, FosterRequest, FosterRole, FosterVisibility,
    GroupId, Message, MessageLink, OrganizationId, RequestId, RequestStatus, RequestStore,
    RequestTarget, ShelterStatus, ShelterStore, StoreError, VisibilityChange,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryShelterStore {
    animals: Mutex<HashMap<AnimalId, Animal>>,
    groups: Mutex<HashMap<GroupId, AnimalGroup>>,
    profiles: Mutex<HashMap<FosterProfileId, FosterProfile>>,
}

impl InMemoryShelterStore {
    pub(crate) fn insert_animal(&self, animal: Animal) {
        self.animals
            .lock()
            .expect("animal mutex poisoned")
            .insert(animal.id.clone(), animal);
    }

    pub(crate) fn insert_group(&self, group: AnimalGroup) {
        self.groups
            .lock()
            .expect("group mutex poisoned")
            .insert(group.id.clone(), group);
    }

    pub(crate) fn insert_profile(&self, profile: FosterProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(profile.id.clone(), profile);
    }

    pub(crate) fn animal_snapshot(&self, id: &AnimalId) -> Option<Animal> {
        self.animals
            .lock()
            .expect("animal mutex poisoned")
            .get(id)
            .cloned()
    }
}

impl ShelterStore for InMemoryShelterStore {
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
pub(crate) struct InMemoryRequestStore {
    records: Mutex<HashMap<RequestId, FosterRequest>>,
}

impl RequestStore for InMemoryRequestStore {
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
pub(crate) struct InMemoryConversationStore {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<Message>>,
    links: Mutex<Vec<MessageLink>>,
}

impl InMemoryConversationStore {
    pub(crate) fn insert_conversation(&self, conversation: Conversation) {
        self.conversations
            .lock()
            .expect("conversation mutex poisoned")
            .push(conversation);
    }

    pub(crate) fn transcript(&self) -> Vec<Message> {
        self.messages
            .lock()
            .expect("message mutex poisoned")
            .clone()
    }
}

impl ConversationStore for InMemoryConversationStore {
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

/// Seeds one organization with a small adoptable population so the service
/// and the CLI demo have data to work against out of the box.
pub(crate) fn seed_demo_organization(
    shelter: &InMemoryShelterStore,
    conversations: &InMemoryConversationStore,
    org: &OrganizationId,
) {
    for (id, name, status) in [
        ("a-101", "Biscuit", ShelterStatus::InShelter),
        ("a-102", "Clover", ShelterStatus::MedicalHold),
    ] {
        shelter.insert_animal(Animal {
            id: AnimalId(id.to_string()),
            organization_id: org.clone(),
            name: name.to_string(),
            status,
            foster_visibility: status.default_visibility(),
            current_foster_id: None,
            group_id: None,
        });
    }

    let litter = GroupId("g-201".to_string());
    for (id, name) in [("a-201", "Mochi"), ("a-202", "Nori"), ("a-203", "Ume")] {
        shelter.insert_animal(Animal {
            id: AnimalId(id.to_string()),
            organization_id: org.clone(),
            name: name.to_string(),
            status: ShelterStatus::InShelter,
            foster_visibility: FosterVisibility::AvailableNow,
            current_foster_id: None,
            group_id: Some(litter.clone()),
        });
    }
    shelter.insert_group(AnimalGroup {
        id: litter,
        organization_id: org.clone(),
        name: "Mochi's litter".to_string(),
        animal_ids: vec![
            AnimalId("a-201".to_string()),
            AnimalId("a-202".to_string()),
            AnimalId("a-203".to_string()),
        ],
        current_foster_id: None,
    });

    for (id, name, role) in [
        ("f-301", "Priya Nair", FosterRole::Foster),
        ("f-302", "Sam Ortiz", FosterRole::Foster),
        ("f-303", "Dana Holt", FosterRole::Coordinator),
    ] {
        shelter.insert_profile(FosterProfile {
            id: FosterProfileId(id.to_string()),
            organization_id: org.clone(),
            role,
            full_name: name.to_string(),
            email: format!("{id}@example.org"),
        });
    }

    conversations.insert_conversation(Conversation {
        id: ConversationId("c-401".to_string()),
        organization_id: org.clone(),
        kind: ConversationKind::FosterChat,
        foster_profile_id: Some(FosterProfileId("f-301".to_string())),
    });
    conversations.insert_conversation(Conversation {
        id: ConversationId("c-402".to_string()),
        organization_id: org.clone(),
        kind: ConversationKind::FosterChat,
        foster_profile_id: Some(FosterProfileId("f-302".to_string())),
    });
    conversations.insert_conversation(Conversation {
        id: ConversationId("c-403".to_string()),
        organization_id: org.clone(),
        kind: ConversationKind::CoordinatorGroup,
        foster_profile_id: None,
    });
}

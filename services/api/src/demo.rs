use crate::infra::{
    seed_demo_organization, InMemoryConversationStore, InMemoryRequestStore, InMemoryShelterStore,
};
use clap::Args;
use shelter_ops::error::AppError;
use shelter_ops::workflows::fostering::{
    Animal, AnimalId, AssignmentEngine, FosterProfileId, FosterVisibility, GroupId,
    NotificationOutcome, OrganizationId, RequestLifecycleManager, RequestTarget, ShelterStatus,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Organization identifier used for the seeded demo data.
    #[arg(long, default_value = "org-demo")]
    pub(crate) organization: String,
    /// Skip the foster request portion of the demo.
    #[arg(long)]
    pub(crate) skip_requests: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let org = OrganizationId(args.organization);

    let shelter = Arc::new(InMemoryShelterStore::default());
    let requests = Arc::new(InMemoryRequestStore::default());
    let conversations = Arc::new(InMemoryConversationStore::default());
    seed_demo_organization(&shelter, &conversations, &org);

    let engine = AssignmentEngine::new(shelter.clone(), conversations.clone());
    let manager = RequestLifecycleManager::new(shelter.clone(), requests, conversations.clone());

    println!("Foster placement demo ({})", org);

    let biscuit = AnimalId("a-101".to_string());
    let priya = FosterProfileId("f-301".to_string());
    let litter = GroupId("g-201".to_string());

    println!("\n== Assigning a single animal ==");
    let receipt = engine.assign_animal(&org, &biscuit, &priya, None)?;
    render_animal(&receipt.animal);
    render_notification(&receipt.notification);

    println!("\n== Assigning a litter as one unit ==");
    let receipt = engine.assign_group(&org, &litter, &priya, None)?;
    println!(
        "group {} -> foster {}",
        receipt.group.name,
        receipt
            .group
            .current_foster_id
            .as_ref()
            .map(|id| id.0.as_str())
            .unwrap_or("-")
    );
    for member in &receipt.members {
        render_animal(member);
    }
    render_notification(&receipt.notification);

    println!("\n== Returning the litter to the shelter ==");
    let receipt = engine.unassign_group(
        &org,
        &litter,
        ShelterStatus::InShelter,
        FosterVisibility::AvailableNow,
        None,
    )?;
    for member in &receipt.members {
        render_animal(member);
    }
    render_notification(&receipt.notification);

    if !args.skip_requests {
        println!("\n== Foster request lifecycle ==");
        let sam = FosterProfileId("f-302".to_string());
        let clover = AnimalId("a-102".to_string());

        let created =
            manager.create_request(&org, RequestTarget::Animal(clover.clone()), &sam, None)?;
        println!(
            "request {} created with status {}",
            created.request.id,
            created.request.status.label()
        );
        if let Some(parked) = shelter.animal_snapshot(&clover) {
            render_animal(&parked);
        }
        render_notification(&created.notification);

        let cancelled = manager.cancel_request(&org, &created.request.id, None)?;
        println!(
            "request {} now {}",
            cancelled.request.id,
            cancelled.request.status.label()
        );
        if let Some(restored) = shelter.animal_snapshot(&clover) {
            render_animal(&restored);
        }
        render_notification(&cancelled.notification);
    }

    println!("\n== Conversation transcript ==");
    for message in conversations.transcript() {
        println!("[{}] {}: {}", message.conversation_id, message.sender_id, message.content);
    }

    Ok(())
}

fn render_animal(animal: &Animal) {
    println!(
        "animal {} ({}) status={} visibility={} foster={}",
        animal.id,
        animal.name,
        animal.status.label(),
        animal.foster_visibility.label(),
        animal
            .current_foster_id
            .as_ref()
            .map(|id| id.0.as_str())
            .unwrap_or("-")
    );
}

fn render_notification(outcome: &NotificationOutcome) {
    match outcome {
        NotificationOutcome::Delivered { message_id } => {
            println!("notification delivered as {message_id}");
        }
        NotificationOutcome::DeliveredWithoutTag { message_id, reason } => {
            println!("notification {message_id} delivered without its tag: {reason}");
        }
        NotificationOutcome::Skipped { reason } => {
            println!("notification skipped: {reason}");
        }
    }
}

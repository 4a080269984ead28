//! Demo fixtures so a fresh server has data to browse.

use std::sync::Arc;

use mercatu_common::chat::{Attachment, ChatMessage, Conversation, MessageKind};
use mercatu_common::requests::{
    Budget, BudgetKind, Coordinates, Proposal, RequestLocation, ServiceRequest, Urgency,
};
use mercatu_common::users::{Location, User};

use crate::conversations::ConversationRepository;
use crate::error::{Result, StoreError};
use crate::requests::RequestRepository;
use crate::store::Store;
use crate::users::UserRepository;

/// Every demo account logs in with this password.
pub const DEMO_PASSWORD: &str = "demo123";

/// Handles to everything [`demo_seed`] created.
pub struct DemoData {
    pub client: User,
    pub electrician: User,
    pub plumber: User,
    /// Open, with one pending proposal from the electrician.
    pub shower_request: ServiceRequest,
    /// Open, no proposals yet.
    pub leak_request: ServiceRequest,
    pub proposal: Proposal,
    pub conversation: Conversation,
}

/// Populate a fresh store: three accounts, two open requests, a pending
/// proposal, and a short conversation about the first request.
pub async fn demo_seed(store: Arc<Store>) -> Result<DemoData> {
    let users = UserRepository::new(store.clone());
    let requests = RequestRepository::new(store.clone());
    let conversations = ConversationRepository::new(store.clone());

    let mut client = User::new_client("Ana Souza", "ana@demo.mercatu.app");
    client.phone = Some("+55 11 98888-1001".into());
    client.verified = true;
    client.location = Some(Location { city: "São Paulo".into(), state: "SP".into() });
    let client = users.create(client, DEMO_PASSWORD).await?;

    let mut electrician =
        User::new_professional("Carlos Silva", "carlos@demo.mercatu.app", "Eletricista");
    electrician.phone = Some("+55 11 98888-1002".into());
    electrician.verified = true;
    electrician.location = Some(Location { city: "São Paulo".into(), state: "SP".into() });
    if let Some(profile) = electrician.professional.as_mut() {
        profile.categories = vec!["eletricista".into()];
        profile.service_radius_km = 15.0;
        profile.rating = 4.8;
        profile.review_count = 127;
        profile.completed_jobs = 143;
        profile.hourly_rate = Some(85.0);
        profile.description = Some("Eletricista residencial com 12 anos de experiência.".into());
        profile.skills =
            vec!["Instalações novas".into(), "Quadros de distribuição".into(), "Chuveiros".into()];
        profile.certifications = vec!["NR-10".into()];
    }
    let electrician = users.create(electrician, DEMO_PASSWORD).await?;

    let mut plumber = User::new_professional("Roberto Lima", "roberto@demo.mercatu.app", "Encanador");
    plumber.phone = Some("+55 11 98888-1003".into());
    plumber.verified = true;
    plumber.location = Some(Location { city: "São Paulo".into(), state: "SP".into() });
    if let Some(profile) = plumber.professional.as_mut() {
        profile.categories = vec!["encanador".into()];
        profile.rating = 4.6;
        profile.review_count = 89;
        profile.completed_jobs = 102;
        profile.hourly_rate = Some(70.0);
        profile.description = Some("Encanador e caça-vazamentos, atendo toda a zona oeste.".into());
        profile.skills = vec!["Vazamentos".into(), "Desentupimento".into()];
    }
    let plumber = users.create(plumber, DEMO_PASSWORD).await?;

    let mut shower = ServiceRequest::new(
        client.id,
        client.name.clone(),
        "Instalação de chuveiro elétrico",
        "O chuveiro queimou e preciso de um novo instalado, o aparelho já está comprado.",
        "eletricista",
    );
    shower.budget = Some(Budget { min: 150.0, max: Some(300.0), kind: BudgetKind::Range });
    shower.urgency = Urgency::High;
    shower.location = RequestLocation {
        address: "Rua Augusta, 1200".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
        coordinates: Some(Coordinates { lat: -23.5540, lng: -46.6565 }),
    };
    let shower_request = requests.insert(shower).await;

    let mut leak = ServiceRequest::new(
        client.id,
        client.name.clone(),
        "Vazamento na pia da cozinha",
        "O sifão está pingando sem parar e o armário já ficou manchado.",
        "encanador",
    );
    leak.budget = Some(Budget { min: 90.0, max: None, kind: BudgetKind::Fixed });
    leak.location = RequestLocation {
        address: "Rua Alvarenga, 890".into(),
        city: "São Paulo".into(),
        state: "SP".into(),
        coordinates: Some(Coordinates { lat: -23.5670, lng: -46.7031 }),
    };
    let leak_request = requests.insert(leak).await;

    let mut proposal = Proposal::new(
        shower_request.id,
        &electrician,
        "Posso ir hoje à tarde, levo o material de fixação.",
        140.0,
    );
    proposal.estimated_duration = Some("2 horas".into());
    let proposal = requests.submit_proposal(shower_request.id, proposal).await?;

    let (conversation, _) = conversations
        .find_or_create(
            client.id,
            electrician.id,
            Some(shower_request.id),
            Some(shower_request.title.clone()),
        )
        .await?;
    conversations
        .send_message(ChatMessage::new(
            conversation.id,
            electrician.id,
            "Olá! Vi seu pedido do chuveiro, posso passar hoje às 15h.",
        ))
        .await?;
    conversations
        .send_message(ChatMessage::new(
            conversation.id,
            client.id,
            "Perfeito, o porteiro libera sua entrada.",
        ))
        .await?;
    let mut photo = ChatMessage::new(
        conversation.id,
        client.id,
        "Segue a foto do modelo que comprei.",
    );
    photo.kind = MessageKind::Image;
    photo.attachments.push(Attachment {
        url: "/uploads/chuveiro-novo.jpg".into(),
        name: "chuveiro-novo.jpg".into(),
        mime: "image/jpeg".into(),
        size: 48_213,
    });
    conversations.send_message(photo).await?;

    // Re-read the records the steps above mutated.
    let shower_request = requests
        .find_by_id(shower_request.id)
        .await
        .ok_or_else(|| StoreError::NotFound("Request".into()))?;
    let conversation = conversations
        .find_for_user(client.id, conversation.id)
        .await
        .ok_or_else(|| StoreError::NotFound("Conversation".into()))?;

    tracing::debug!(users = 3, requests = 2, "demo data seeded");

    Ok(DemoData {
        client,
        electrician,
        plumber,
        shower_request,
        leak_request,
        proposal,
        conversation,
    })
}

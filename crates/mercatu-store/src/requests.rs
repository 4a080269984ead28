//! Service request repository: CRUD, the nearby feed, and proposal
//! decisions.
//!
//! Decisions validate and mutate inside one write guard, so two clients
//! racing to accept different proposals serialize and the loser sees the
//! already-decided state.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use mercatu_common::geo::haversine_km;
use mercatu_common::lifecycle::{
    validate_decision, validate_request_move, validate_submission, ProposalDecision,
    ProposalStatus, RequestStatus,
};
use mercatu_common::requests::{
    Budget, ContactPreference, Proposal, RequestLocation, ServiceRequest, Urgency,
};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// An owner's edit. Content fields only apply while the request is open;
/// `status` must follow the transition map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub budget: Option<Budget>,
    pub urgency: Option<Urgency>,
    /// Replaces the whole location block when present.
    pub location: Option<RequestLocation>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    pub contact_preference: Option<ContactPreference>,
    pub images: Option<Vec<String>>,
    pub status: Option<RequestStatus>,
}

impl RequestPatch {
    fn touches_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.budget.is_some()
            || self.urgency.is_some()
            || self.location.is_some()
            || self.preferred_date.is_some()
            || self.preferred_time.is_some()
            || self.contact_preference.is_some()
            || self.images.is_some()
    }
}

/// Repository for service requests and their proposals.
#[derive(Clone)]
pub struct RequestRepository {
    store: Arc<Store>,
}

impl RequestRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Insert a freshly built request.
    pub async fn insert(&self, request: ServiceRequest) -> ServiceRequest {
        self.store
            .requests
            .write()
            .await
            .insert(request.id, request.clone());
        request
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<ServiceRequest> {
        self.store.requests.read().await.get(&id).cloned()
    }

    /// Requests posted by `client_id`, newest first.
    pub async fn list_for_client(&self, client_id: Uuid) -> Vec<ServiceRequest> {
        let requests = self.store.requests.read().await;
        let mut list: Vec<ServiceRequest> = requests
            .values()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    /// Open requests for the professional feed. Requests without
    /// coordinates never appear. With an origin the result is limited to
    /// `radius_km`, nearest first; without one it is newest first with no
    /// distances.
    pub async fn open_nearby(
        &self,
        origin: Option<(f64, f64)>,
        radius_km: f64,
        category: Option<&str>,
    ) -> Vec<(ServiceRequest, Option<f64>)> {
        let requests = self.store.requests.read().await;
        let mut list: Vec<(ServiceRequest, Option<f64>)> = Vec::new();

        for request in requests.values() {
            if request.status != RequestStatus::Open {
                continue;
            }
            let Some(coords) = request.location.coordinates else {
                continue;
            };
            if let Some(category) = category {
                if request.category != category {
                    continue;
                }
            }
            match origin {
                Some((lat, lng)) => {
                    let distance = haversine_km(lat, lng, coords.lat, coords.lng);
                    if distance <= radius_km {
                        list.push((request.clone(), Some(distance)));
                    }
                }
                None => list.push((request.clone(), None)),
            }
        }

        if origin.is_some() {
            list.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        } else {
            list.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));
        }
        list
    }

    /// Apply an owner's edit and return the updated request.
    pub async fn apply_patch(
        &self,
        owner_id: Uuid,
        id: Uuid,
        patch: RequestPatch,
    ) -> Result<ServiceRequest> {
        let mut requests = self.store.requests.write().await;
        let request = requests
            .get_mut(&id)
            .filter(|r| r.client_id == owner_id)
            .ok_or_else(|| StoreError::NotFound("Request".into()))?;

        if patch.touches_content() && request.status != RequestStatus::Open {
            return Err(StoreError::Conflict(format!(
                "request is {}, its content can no longer change",
                request.status
            )));
        }
        if let Some(next) = patch.status {
            validate_request_move(request.status, next)?;
        }

        if let Some(title) = patch.title {
            request.title = title;
        }
        if let Some(description) = patch.description {
            request.description = description;
        }
        if let Some(budget) = patch.budget {
            request.budget = Some(budget);
        }
        if let Some(urgency) = patch.urgency {
            request.urgency = urgency;
        }
        if let Some(location) = patch.location {
            request.location = location;
        }
        if let Some(date) = patch.preferred_date {
            request.preferred_date = Some(date);
        }
        if let Some(time) = patch.preferred_time {
            request.preferred_time = Some(time);
        }
        if let Some(preference) = patch.contact_preference {
            request.contact_preference = preference;
        }
        if let Some(images) = patch.images {
            request.images = images;
        }
        if let Some(next) = patch.status {
            request.status = next;
        }
        request.updated_at = Utc::now();

        Ok(request.clone())
    }

    /// Cancel an owner's request.
    pub async fn cancel(&self, owner_id: Uuid, id: Uuid) -> Result<ServiceRequest> {
        let mut requests = self.store.requests.write().await;
        let request = requests
            .get_mut(&id)
            .filter(|r| r.client_id == owner_id)
            .ok_or_else(|| StoreError::NotFound("Request".into()))?;

        validate_request_move(request.status, RequestStatus::Cancelled)?;
        request.status = RequestStatus::Cancelled;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    /// Add a proposal to an open request. One proposal per professional
    /// per request.
    pub async fn submit_proposal(&self, request_id: Uuid, proposal: Proposal) -> Result<Proposal> {
        let mut requests = self.store.requests.write().await;
        let request = requests
            .get_mut(&request_id)
            .ok_or_else(|| StoreError::NotFound("Request".into()))?;

        if request.client_id == proposal.professional_id {
            return Err(StoreError::Conflict(
                "you cannot send a proposal on your own request".into(),
            ));
        }
        validate_submission(request.status)?;
        if request.has_proposal_from(proposal.professional_id) {
            return Err(StoreError::Duplicate(
                "you already sent a proposal for this request".into(),
            ));
        }

        request.proposals.push(proposal.clone());
        request.updated_at = Utc::now();
        Ok(proposal)
    }

    /// Decide a pending proposal. Accepting also rejects every other
    /// pending proposal and moves the request to `in_progress`, all under
    /// the same guard.
    pub async fn decide_proposal(
        &self,
        owner_id: Uuid,
        request_id: Uuid,
        proposal_id: Uuid,
        decision: ProposalDecision,
    ) -> Result<(ServiceRequest, Proposal)> {
        let mut requests = self.store.requests.write().await;
        let request = requests
            .get_mut(&request_id)
            .filter(|r| r.client_id == owner_id)
            .ok_or_else(|| StoreError::NotFound("Request".into()))?;

        let current = request
            .proposal(proposal_id)
            .map(|p| p.status)
            .ok_or_else(|| StoreError::NotFound("Proposal".into()))?;
        validate_decision(request.status, current, decision)?;

        match decision {
            ProposalDecision::Accept => {
                for proposal in request.proposals.iter_mut() {
                    if proposal.id == proposal_id {
                        proposal.status = ProposalStatus::Accepted;
                    } else if proposal.status == ProposalStatus::Pending {
                        proposal.status = ProposalStatus::Rejected;
                    }
                }
                request.status = RequestStatus::InProgress;
            }
            ProposalDecision::Reject => {
                if let Some(proposal) = request.proposals.iter_mut().find(|p| p.id == proposal_id) {
                    proposal.status = ProposalStatus::Rejected;
                }
            }
        }
        request.updated_at = Utc::now();

        let decided = request
            .proposal(proposal_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Proposal".into()))?;
        Ok((request.clone(), decided))
    }
}

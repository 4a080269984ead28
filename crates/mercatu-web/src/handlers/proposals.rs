//! Proposal endpoints: professionals bid, request owners decide.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use mercatu_common::requests::Proposal;
use mercatu_common::users::Role;
use mercatu_common::{ApiError, ProposalDecision, ProposalStatus, RequestStatus};
use mercatu_store::RequestRepository;

use crate::auth::CurrentUser;
use crate::extract::{Json, Path};
use crate::state::{AppEvent, SharedState};

// === API Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProposal {
    pub message: String,
    pub price: f64,
    pub estimated_duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecideProposal {
    /// Target status: `accepted` or `rejected`.
    pub status: ProposalStatus,
}

// === Handlers ===

/// POST /api/requests/{id}/proposals - Bid on an open request.
pub async fn submit_proposal(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<SubmitProposal>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Professional {
        return Err(ApiError::Forbidden(
            "only professionals can send proposals".to_string(),
        ));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::Validation("message is required".to_string()));
    }
    if payload.price <= 0.0 {
        return Err(ApiError::Validation(
            "price must be greater than zero".to_string(),
        ));
    }

    let mut proposal = Proposal::new(request_id, &user, payload.message.trim(), payload.price);
    proposal.estimated_duration = payload.estimated_duration;

    let repo = RequestRepository::new(state.store.clone());
    let proposal = repo.submit_proposal(request_id, proposal).await?;

    state.publish(AppEvent::ProposalReceived {
        request_id,
        proposal_id: proposal.id,
        professional_name: proposal.professional_name.clone(),
        price: proposal.price,
    });
    tracing::info!(request_id = %request_id, proposal_id = %proposal.id, "proposal received");

    Ok((StatusCode::CREATED, Json(proposal)))
}

/// PUT /api/requests/{id}/proposals/{proposal_id} - Accept or reject a bid.
///
/// Accepting one proposal rejects the other pending ones and moves the
/// request to in_progress, all in one step. A request keeps at most one
/// accepted proposal for its lifetime; deciding against a proposal that is
/// already decided answers 409.
pub async fn decide_proposal(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path((request_id, proposal_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecideProposal>,
) -> Result<impl IntoResponse, ApiError> {
    let decision = ProposalDecision::from_target(payload.status).ok_or_else(|| {
        ApiError::Validation("status must be accepted or rejected".to_string())
    })?;

    let repo = RequestRepository::new(state.store.clone());
    let (request, proposal) = repo
        .decide_proposal(user.id, request_id, proposal_id, decision)
        .await?;

    state.publish(AppEvent::ProposalDecided {
        request_id,
        proposal_id,
        status: proposal.status.to_string(),
    });
    if proposal.status == ProposalStatus::Accepted {
        state.publish(AppEvent::RequestStatusChanged {
            request_id,
            status: RequestStatus::InProgress.to_string(),
        });
    }
    tracing::info!(
        request_id = %request_id,
        proposal_id = %proposal_id,
        status = %proposal.status,
        "proposal decided"
    );

    Ok(Json(request))
}

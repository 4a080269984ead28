//! Service request endpoints: posting, browsing, editing, cancelling.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use mercatu_common::requests::{
    is_known_category, Budget, BudgetKind, ContactPreference, RequestLocation, ServiceRequest,
    Urgency,
};
use mercatu_common::users::Role;
use mercatu_common::{ApiError, RequestStatus};
use mercatu_store::{RequestPatch, RequestRepository};

use crate::auth::CurrentUser;
use crate::extract::{Json, Path, Query};
use crate::state::{AppEvent, SharedState};

// === API Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: Option<Budget>,
    #[serde(default)]
    pub urgency: Urgency,
    pub location: Option<RequestLocation>,
    pub preferred_date: Option<String>,
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<ServiceRequest>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyFilter {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub category: Option<String>,
}

/// An open request as seen from the professional feed, with the distance
/// from the caller's position when one was given.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    #[serde(flatten)]
    pub request: ServiceRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub requests: Vec<NearbyRequest>,
    pub total: usize,
}

fn validate_budget(budget: &Budget) -> Result<(), ApiError> {
    if budget.min <= 0.0 {
        return Err(ApiError::Validation(
            "budget must be greater than zero".to_string(),
        ));
    }
    if budget.kind == BudgetKind::Range {
        let max = budget.max.ok_or_else(|| {
            ApiError::Validation("a range budget needs a max value".to_string())
        })?;
        if max < budget.min {
            return Err(ApiError::Validation(
                "budget max cannot be below min".to_string(),
            ));
        }
    }
    Ok(())
}

// === Handlers ===

/// GET /api/requests - The caller's own requests, newest first.
pub async fn list_requests(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = RequestRepository::new(state.store.clone());
    let requests = repo.list_for_client(user.id).await;
    let total = requests.len();

    Ok(Json(RequestsResponse { requests, total }))
}

/// POST /api/requests - Post a new service request.
pub async fn create_request(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Client {
        return Err(ApiError::Forbidden(
            "only clients can post requests".to_string(),
        ));
    }

    let title = payload.title.trim();
    if title.chars().count() < 5 {
        return Err(ApiError::Validation(
            "title must be at least 5 characters".to_string(),
        ));
    }
    let description = payload.description.trim();
    if description.chars().count() < 20 {
        return Err(ApiError::Validation(
            "description must be at least 20 characters".to_string(),
        ));
    }
    if !is_known_category(&payload.category) {
        return Err(ApiError::Validation(format!(
            "unknown category: {}",
            payload.category
        )));
    }
    if let Some(budget) = &payload.budget {
        validate_budget(budget)?;
    }

    let mut request = ServiceRequest::new(user.id, &user.name, title, description, &payload.category);
    request.budget = payload.budget;
    request.urgency = payload.urgency;
    request.location = payload.location.unwrap_or_default();
    request.preferred_date = payload.preferred_date;
    request.preferred_time = payload.preferred_time;
    request.contact_preference = payload.contact_preference;
    request.images = payload.images;

    let repo = RequestRepository::new(state.store.clone());
    let request = repo.insert(request).await;

    state.publish(AppEvent::RequestPosted {
        request_id: request.id,
        category: request.category.clone(),
        title: request.title.clone(),
    });
    tracing::info!(request_id = %request.id, category = %request.category, "request posted");

    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/requests/nearby - Open requests for the professional feed.
///
/// With `lat`/`lng` the feed is limited to `radiusKm` (config default
/// otherwise) and sorted nearest first; requests without coordinates drop
/// out. Without a position every open request qualifies, newest first.
pub async fn nearby_requests(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<NearbyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    if user.role != Role::Professional {
        return Err(ApiError::Forbidden(
            "only professionals can browse the request feed".to_string(),
        ));
    }

    let origin = match (filter.lat, filter.lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        (None, None) => None,
        _ => {
            return Err(ApiError::Validation(
                "lat and lng must be given together".to_string(),
            ))
        }
    };
    let radius_km = filter
        .radius_km
        .unwrap_or(state.config.api.nearby_radius_km);
    if radius_km <= 0.0 {
        return Err(ApiError::Validation(
            "radiusKm must be greater than zero".to_string(),
        ));
    }

    let repo = RequestRepository::new(state.store.clone());
    let rows = repo
        .open_nearby(origin, radius_km, filter.category.as_deref())
        .await;

    let requests: Vec<NearbyRequest> = rows
        .into_iter()
        .map(|(request, distance_km)| NearbyRequest {
            request,
            distance_km,
        })
        .collect();
    let total = requests.len();

    Ok(Json(NearbyResponse { requests, total }))
}

/// GET /api/requests/{id} - One request with all its proposals.
///
/// Visible to the owner and to any professional; other clients see a 404.
pub async fn request_detail(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = RequestRepository::new(state.store.clone());
    let request = repo
        .find_by_id(id)
        .await
        .filter(|r| r.client_id == user.id || user.role == Role::Professional)
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    Ok(Json(request))
}

/// PUT /api/requests/{id} - Edit a request or move its status.
///
/// Content edits only while the request is open; status moves follow the
/// lifecycle (open -> in_progress -> completed, cancel before completion).
pub async fn update_request(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<RequestPatch>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &patch.title {
        if title.trim().chars().count() < 5 {
            return Err(ApiError::Validation(
                "title must be at least 5 characters".to_string(),
            ));
        }
    }
    if let Some(description) = &patch.description {
        if description.trim().chars().count() < 20 {
            return Err(ApiError::Validation(
                "description must be at least 20 characters".to_string(),
            ));
        }
    }
    if let Some(budget) = &patch.budget {
        validate_budget(budget)?;
    }

    let status_moved = patch.status;
    let repo = RequestRepository::new(state.store.clone());
    let request = repo.apply_patch(user.id, id, patch).await?;

    if let Some(status) = status_moved {
        state.publish(AppEvent::RequestStatusChanged {
            request_id: request.id,
            status: status.to_string(),
        });
    }

    Ok(Json(request))
}

/// DELETE /api/requests/{id} - Cancel a request.
pub async fn cancel_request(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = RequestRepository::new(state.store.clone());
    let request = repo.cancel(user.id, id).await?;

    state.publish(AppEvent::RequestStatusChanged {
        request_id: request.id,
        status: RequestStatus::Cancelled.to_string(),
    });
    tracing::info!(request_id = %request.id, "request cancelled");

    Ok(Json(json!({ "message": "request cancelled" })))
}

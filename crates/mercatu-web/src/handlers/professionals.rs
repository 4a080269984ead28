//! Public directory of professionals.

use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mercatu_common::users::{Role, User};
use mercatu_common::ApiError;
use mercatu_store::UserRepository;

use crate::extract::{Json, Path, Query};
use crate::state::SharedState;

// === API Types ===

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalFilter {
    /// Category slug, e.g. `eletricista`.
    pub category: Option<String>,
    pub city: Option<String>,
    /// Free-text match against name, profession, and skills.
    pub q: Option<String>,
    pub min_rating: Option<f64>,
    pub available: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalsResponse {
    pub professionals: Vec<User>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

// === Handlers ===

/// GET /api/professionals - Browse professionals, best rated first.
///
/// Open to anonymous callers so the directory works before signup.
pub async fn list_professionals(
    State(state): State<SharedState>,
    Query(filter): Query<ProfessionalFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = filter
        .limit
        .unwrap_or(state.config.api.default_page_size)
        .clamp(1, state.config.api.max_page_size) as usize;
    let page = filter.page.unwrap_or(1).max(1) as usize;

    let users = UserRepository::new(state.store.clone());
    let matches = users
        .search_professionals(
            filter.category.as_deref(),
            filter.city.as_deref(),
            filter.q.as_deref(),
            filter.min_rating,
            filter.available,
        )
        .await;

    let total = matches.len();
    let total_pages = total.div_ceil(limit).max(1);
    let professionals: Vec<User> = matches
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .collect();

    Ok(Json(ProfessionalsResponse {
        professionals,
        total,
        page,
        total_pages,
    }))
}

/// GET /api/professionals/{id} - One professional's public profile.
pub async fn professional_detail(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let users = UserRepository::new(state.store.clone());
    let user = users
        .find_by_id(id)
        .await
        .filter(|u| u.role == Role::Professional)
        .ok_or_else(|| ApiError::NotFound("Professional not found".to_string()))?;

    Ok(Json(user))
}

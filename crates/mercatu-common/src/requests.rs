//! Service requests and the proposals professionals make on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::{ProposalStatus, RequestStatus};
use crate::users::User;

/// Category slugs a request may carry.
pub const CATEGORIES: &[&str] = &[
    "eletricista",
    "encanador",
    "pedreiro",
    "pintor",
    "marceneiro",
    "jardineiro",
    "diarista",
    "montador",
    "arcondicionado",
    "informatica",
];

pub fn is_known_category(slug: &str) -> bool {
    CATEGORIES.contains(&slug)
}

// ---------------------------------------------------------------------------
// Urgency / contact preference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// How the client wants to be reached once a professional is engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    Phone,
    Chat,
    #[default]
    Both,
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where the work happens. Address fields are free-form; coordinates are
/// what the nearby feed matches on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestLocation {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

// ---------------------------------------------------------------------------
// Budget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetKind {
    Range,
    Fixed,
}

/// What the client expects to pay. A fixed budget carries only `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(rename = "type")]
    pub kind: BudgetKind,
}

// ---------------------------------------------------------------------------
// Service request
// ---------------------------------------------------------------------------

/// A job posted by a client. Proposals live inside the request, so one
/// lock guards the request and everything that may change with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub urgency: Urgency,
    pub status: RequestStatus,
    #[serde(default)]
    pub location: RequestLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn new(
        client_id: Uuid,
        client_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            client_name: client_name.into(),
            title: title.into(),
            description: description.into(),
            category: category.into(),
            budget: None,
            urgency: Urgency::default(),
            status: RequestStatus::Open,
            location: RequestLocation::default(),
            preferred_date: None,
            preferred_time: None,
            contact_preference: ContactPreference::default(),
            images: Vec::new(),
            proposals: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The accepted proposal, if one exists. The lifecycle rules guarantee
    /// at most one.
    pub fn accepted_proposal(&self) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.status == ProposalStatus::Accepted)
    }

    pub fn proposal(&self, id: Uuid) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn has_proposal_from(&self, professional_id: Uuid) -> bool {
        self.proposals.iter().any(|p| p.professional_id == professional_id)
    }
}

// ---------------------------------------------------------------------------
// Proposal
// ---------------------------------------------------------------------------

/// A professional's bid on a request. Display fields are snapshotted from
/// the account at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    pub request_id: Uuid,
    pub professional_id: Uuid,
    pub professional_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professional_rating: Option<f64>,
    pub message: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    pub fn new(request_id: Uuid, professional: &User, message: impl Into<String>, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            professional_id: professional.id,
            professional_name: professional.name.clone(),
            professional_avatar: Some(professional.avatar.clone()),
            professional_rating: professional.professional.as_ref().map(|p| p.rating),
            message: message.into(),
            price,
            estimated_duration: None,
            status: ProposalStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

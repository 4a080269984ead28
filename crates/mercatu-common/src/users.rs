//! Accounts: the clients who post requests and the professionals who bid on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Professional,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Professional => "professional",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "professional" => Ok(Role::Professional),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

// ---------------------------------------------------------------------------
// Professional profile
// ---------------------------------------------------------------------------

/// Extra fields a professional account carries. Flattened into the user on
/// the wire, so both roles share a single JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalProfile {
    pub profession: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_service_radius_km")]
    pub service_radius_km: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub completed_jobs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_service_radius_km() -> f64 {
    10.0
}

fn default_available() -> bool {
    true
}

impl ProfessionalProfile {
    pub fn new(profession: impl Into<String>) -> Self {
        Self {
            profession: profession.into(),
            categories: Vec::new(),
            service_radius_km: default_service_radius_km(),
            rating: 0.0,
            review_count: 0,
            completed_jobs: 0,
            hourly_rate: None,
            description: None,
            skills: Vec::new(),
            certifications: Vec::new(),
            available: true,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub name: String,
    /// `type` on the wire.
    #[serde(rename = "type")]
    pub role: Role,
    pub verified: bool,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Present only for professionals. Required `profession` inside keeps
    /// the flattened deserialization from inventing an empty profile.
    #[serde(flatten)]
    pub professional: Option<ProfessionalProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Never leaves the process.
    #[serde(skip)]
    pub password_hash: String,
}

impl User {
    pub fn new_client(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Role::Client, None)
    }

    pub fn new_professional(
        name: impl Into<String>,
        email: impl Into<String>,
        profession: impl Into<String>,
    ) -> Self {
        Self::new(name, email, Role::Professional, Some(ProfessionalProfile::new(profession)))
    }

    fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        professional: Option<ProfessionalProfile>,
    ) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            phone: None,
            avatar: avatar_url(&name),
            name,
            role,
            verified: false,
            location: None,
            professional,
            preferred_payment_method: None,
            created_at: Utc::now(),
            password_hash: String::new(),
        }
    }

    /// Average rating, zero for clients and unrated professionals.
    pub fn rating(&self) -> f64 {
        self.professional.as_ref().map(|p| p.rating).unwrap_or(0.0)
    }
}

/// Default avatar for accounts without an uploaded picture.
pub fn avatar_url(name: &str) -> String {
    let encoded = name.replace(' ', "+");
    format!("https://ui-avatars.com/api/?name={encoded}&background=0D8ABC&color=fff")
}

//! Account repository and password handling.

use std::sync::Arc;

use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use mercatu_common::users::{Location, User};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Fields an account owner may change. Professional fields are ignored on
/// client accounts; email, role, and earned reputation never change here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub location: Option<Location>,
    pub preferred_payment_method: Option<String>,
    pub profession: Option<String>,
    pub categories: Option<Vec<String>>,
    pub service_radius_km: Option<f64>,
    pub hourly_rate: Option<f64>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub available: Option<bool>,
}

/// Repository for account operations.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<Store>,
}

impl UserRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Insert a new account, hashing its password. Emails are unique,
    /// compared case-insensitively.
    pub async fn create(&self, mut user: User, password: &str) -> Result<User> {
        let mut users = self.store.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Duplicate(format!(
                "an account already exists for {}",
                user.email
            )));
        }
        user.password_hash = hash_password(password);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<User> {
        self.store.users.read().await.get(&id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.store
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub async fn find_by_phone(&self, phone: &str) -> Option<User> {
        self.store
            .users
            .read()
            .await
            .values()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned()
    }

    /// Email + password check. `None` covers both unknown email and wrong
    /// password, so callers cannot tell the two apart.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Option<User> {
        let user = self.find_by_email(email).await?;
        verify_password(password, &user.password_hash).then_some(user)
    }

    /// Apply an owner's profile edit and return the updated account.
    pub async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> Result<User> {
        let mut users = self.store.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("User".into()))?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(phone) = patch.phone {
            user.phone = Some(phone);
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = avatar;
        }
        if let Some(location) = patch.location {
            user.location = Some(location);
        }
        if let Some(method) = patch.preferred_payment_method {
            user.preferred_payment_method = Some(method);
        }

        if let Some(profile) = user.professional.as_mut() {
            if let Some(profession) = patch.profession {
                profile.profession = profession;
            }
            if let Some(categories) = patch.categories {
                profile.categories = categories;
            }
            if let Some(radius) = patch.service_radius_km {
                profile.service_radius_km = radius;
            }
            if let Some(rate) = patch.hourly_rate {
                profile.hourly_rate = Some(rate);
            }
            if let Some(description) = patch.description {
                profile.description = Some(description);
            }
            if let Some(skills) = patch.skills {
                profile.skills = skills;
            }
            if let Some(certifications) = patch.certifications {
                profile.certifications = certifications;
            }
            if let Some(available) = patch.available {
                profile.available = available;
            }
        }

        Ok(user.clone())
    }

    /// Directory search over professional accounts. Results come back
    /// best-rated first; pagination is the caller's concern.
    pub async fn search_professionals(
        &self,
        category: Option<&str>,
        city: Option<&str>,
        q: Option<&str>,
        min_rating: Option<f64>,
        available: Option<bool>,
    ) -> Vec<User> {
        let users = self.store.users.read().await;
        let needle = q.map(str::to_lowercase);

        let mut matches: Vec<User> = users
            .values()
            .filter(|user| {
                let Some(profile) = user.professional.as_ref() else {
                    return false;
                };
                if let Some(category) = category {
                    if !profile.categories.iter().any(|c| c == category) {
                        return false;
                    }
                }
                if let Some(city) = city {
                    let lives_there = user
                        .location
                        .as_ref()
                        .is_some_and(|l| l.city.eq_ignore_ascii_case(city));
                    if !lives_there {
                        return false;
                    }
                }
                if let Some(min) = min_rating {
                    if profile.rating < min {
                        return false;
                    }
                }
                if let Some(available) = available {
                    if profile.available != available {
                        return false;
                    }
                }
                if let Some(needle) = needle.as_deref() {
                    let haystack = format!(
                        "{} {} {}",
                        user.name.to_lowercase(),
                        profile.profession.to_lowercase(),
                        profile.skills.join(" ").to_lowercase()
                    );
                    if !haystack.contains(needle) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let (pa, pb) = (a.professional.as_ref(), b.professional.as_ref());
            let rating = |p: Option<&mercatu_common::users::ProfessionalProfile>| {
                p.map(|p| (p.rating, p.review_count)).unwrap_or((0.0, 0))
            };
            let (ra, ca) = rating(pa);
            let (rb, cb) = rating(pb);
            rb.partial_cmp(&ra)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(cb.cmp(&ca))
        });

        matches
    }
}

// ---------------------------------------------------------------------------
// Passwords
// ---------------------------------------------------------------------------

/// Salted SHA-256, hex encoded as `salt$digest`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    let digest = Sha256::digest(format!("{salt}:{password}").as_bytes());
    format!("{salt}${}", hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    hex::encode(Sha256::digest(format!("{salt}:{password}").as_bytes())) == digest
}

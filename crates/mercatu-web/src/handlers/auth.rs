//! Signup, login, and profile endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use mercatu_common::users::{Location, Role, User};
use mercatu_common::ApiError;
use mercatu_store::{ProfilePatch, SessionRepository, UserRepository};

use crate::auth::{clear_session_cookie, session_cookie, CurrentUser, SESSION_COOKIE};
use crate::extract::Json;
use crate::state::SharedState;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// === API Types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub role: Role,
    /// Professionals may declare it at signup or fill it in later.
    pub profession: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneLoginRequest {
    pub phone: String,
    pub code: String,
}

// === Handlers ===

/// POST /api/auth/signup - Create an account and open a session.
pub async fn signup(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.chars().count() < 2 {
        return Err(ApiError::Validation(
            "name must have at least 2 characters".to_string(),
        ));
    }
    let email = payload.email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ApiError::Validation("invalid email address".to_string()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "password must have at least 6 characters".to_string(),
        ));
    }

    let mut user = match payload.role {
        Role::Client => User::new_client(name, &email),
        Role::Professional => {
            let profession = payload.profession.as_deref().map(str::trim).unwrap_or("");
            User::new_professional(name, &email, profession)
        }
    };
    user.phone = payload.phone;
    user.location = payload.location;

    let users = UserRepository::new(state.store.clone());
    let user = users.create(user, &payload.password).await?;

    let sessions = SessionRepository::new(state.store.clone());
    let session = sessions
        .create(user.id, state.config.auth.session_ttl_days)
        .await;

    tracing::info!(user_id = %user.id, role = %user.role, "account created");

    Ok((jar.add(session_cookie(session.token)), Json(user)))
}

/// POST /api/auth/login - Email and password login.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let users = UserRepository::new(state.store.clone());
    let user = users
        .verify_credentials(payload.email.trim(), &payload.password)
        .await
        .ok_or_else(|| ApiError::Unauthorized("invalid email or password".to_string()))?;

    let sessions = SessionRepository::new(state.store.clone());
    let session = sessions
        .create(user.id, state.config.auth.session_ttl_days)
        .await;

    Ok((jar.add(session_cookie(session.token)), Json(user)))
}

/// POST /api/auth/login-phone - Login with a phone number and SMS code.
///
/// No SMS gateway is wired up; the accepted code is fixed in config and the
/// whole endpoint can be switched off there. An unknown number provisions a
/// fresh verified client account on the spot.
pub async fn login_phone(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(payload): Json<PhoneLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.config.auth.phone_login_enabled {
        return Err(ApiError::Forbidden("phone login is disabled".to_string()));
    }
    if payload.code != state.config.auth.phone_login_code {
        return Err(ApiError::Unauthorized(
            "invalid verification code".to_string(),
        ));
    }
    let phone = payload.phone.trim();
    if phone.is_empty() {
        return Err(ApiError::Validation("phone is required".to_string()));
    }

    let users = UserRepository::new(state.store.clone());
    let user = match users.find_by_phone(phone).await {
        Some(user) => user,
        None => {
            // The account has no usable password until the user sets one.
            let mut user = User::new_client("Usuário", format!("{phone}@phone.temp"));
            user.phone = Some(phone.to_string());
            user.verified = true;
            let user = users.create(user, &Uuid::new_v4().to_string()).await?;
            tracing::info!(user_id = %user.id, "account provisioned via phone login");
            user
        }
    };

    let sessions = SessionRepository::new(state.store.clone());
    let session = sessions
        .create(user.id, state.config.auth.session_ttl_days)
        .await;

    Ok((jar.add(session_cookie(session.token)), Json(user)))
}

/// POST /api/auth/logout - Drop the session. Safe to call while logged out.
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let sessions = SessionRepository::new(state.store.clone());
        sessions.revoke(cookie.value()).await;
    }

    Ok((
        jar.add(clear_session_cookie()),
        Json(json!({ "message": "logged out" })),
    ))
}

/// GET /api/auth/me - The account behind the session cookie.
pub async fn me(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(user))
}

/// PUT /api/auth/profile - Update the caller's profile.
///
/// Professional fields in the patch are ignored for client accounts.
pub async fn update_profile(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name cannot be empty".to_string()));
        }
    }

    let users = UserRepository::new(state.store.clone());
    let updated = users.update_profile(user.id, patch).await?;

    Ok(Json(updated))
}

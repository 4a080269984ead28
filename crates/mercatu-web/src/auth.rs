//! Session cookies and the authenticated-user extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use mercatu_common::users::User;
use mercatu_common::ApiError;
use mercatu_store::{SessionRepository, UserRepository};

use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "session";

/// The account behind the request's session cookie.
///
/// Rejects with 401 when the cookie is missing, the session has expired, or
/// the account no longer exists.
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("not authenticated".to_string()))?;

        let sessions = SessionRepository::new(state.store.clone());
        let user_id = sessions
            .resolve(&token)
            .await
            .ok_or_else(|| ApiError::Unauthorized("session expired".to_string()))?;

        let users = UserRepository::new(state.store.clone());
        let user = users
            .find_by_id(user_id)
            .await
            .ok_or_else(|| ApiError::Unauthorized("account no longer exists".to_string()))?;

        Ok(CurrentUser(user))
    }
}

/// Cookie that opens a browser session. No Max-Age; the expiry lives
/// server-side on the session itself.
pub fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

/// Cookie that tells the browser to forget the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}

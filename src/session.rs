//! Cookie sessions for the two actor classes.
//!
//! A session cookie holds a signed `{sub, kind, exp}` token. Tokens live for
//! seven days from issuance; there is no refresh and no revocation list.
//! Handlers receive the resolved [`AdminSession`] or [`UserSession`] as an
//! extractor argument.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::models::{AdminProfile, UserProfile};
use crate::store::Store;

pub const ADMIN_COOKIE: &str = "admin_session";
pub const USER_COOKIE: &str = "user_session";
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Admin,
    User,
}

impl SessionKind {
    pub fn cookie_name(self) -> &'static str {
        match self {
            SessionKind::Admin => ADMIN_COOKIE,
            SessionKind::User => USER_COOKIE,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    kind: SessionKind,
    exp: usize,
}

pub fn issue_token(secret: &str, kind: SessionKind, id: ObjectId) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_hex(),
        kind,
        exp: (chrono::Utc::now() + chrono::Duration::seconds(SESSION_TTL_SECS)).timestamp()
            as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Returns the subject id when the token is valid, unexpired and of `kind`.
pub fn verify_token(secret: &str, kind: SessionKind, token: &str) -> Option<ObjectId> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Rejected session token: {e}"))
    .ok()?;

    if data.claims.kind != kind {
        return None;
    }
    ObjectId::parse_str(&data.claims.sub).ok()
}

pub fn session_cookie(kind: SessionKind, token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        kind.cookie_name(),
        token,
        SESSION_TTL_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(kind: SessionKind) -> String {
    format!(
        "{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax",
        kind.cookie_name()
    )
}

pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(|pair| pair.trim())
        .find_map(|pair| pair.strip_prefix(prefix.as_str()))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub id: ObjectId,
    pub admin: AdminProfile,
}

#[derive(Debug, Clone)]
pub struct UserSession {
    pub id: ObjectId,
    pub admin_id: ObjectId,
    pub user: UserProfile,
}

pub async fn resolve_admin(
    store: &dyn Store,
    secret: &str,
    token: &str,
) -> Result<AdminSession, AppError> {
    let id = verify_token(secret, SessionKind::Admin, token).ok_or_else(AppError::unauthenticated)?;
    let admin = store
        .find_admin(id)
        .await?
        .ok_or_else(AppError::unauthenticated)?;

    Ok(AdminSession {
        id: admin.id,
        admin: admin.profile(),
    })
}

pub async fn resolve_user(
    store: &dyn Store,
    secret: &str,
    token: &str,
) -> Result<UserSession, AppError> {
    let id = verify_token(secret, SessionKind::User, token).ok_or_else(AppError::unauthenticated)?;
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(AppError::unauthenticated)?;

    Ok(UserSession {
        id: user.id,
        admin_id: user.admin_id,
        user: user.profile(),
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ADMIN_COOKIE).ok_or_else(AppError::unauthenticated)?;
        resolve_admin(state.store.as_ref(), &state.config.session_secret, &token).await
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, USER_COOKIE).ok_or_else(AppError::unauthenticated)?;
        resolve_user(state.store.as_ref(), &state.config.session_secret, &token).await
    }
}

/// Token subject of the `user_session` cookie, if one was sent. The account
/// itself is not loaded: a deleted user still carries their id so the
/// operation can report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeUserSession {
    pub user_id: Option<ObjectId>,
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUserSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = read_cookie(&parts.headers, USER_COOKIE) else {
            return Ok(Self { user_id: None });
        };
        let id = verify_token(&state.config.session_secret, SessionKind::User, &token)
            .ok_or_else(AppError::unauthenticated)?;
        Ok(Self { user_id: Some(id) })
    }
}

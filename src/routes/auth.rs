use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{ProfileUpdate, User, UserProfile};
use crate::session::{SessionKind, UserSession, clear_cookie, issue_token, session_cookie};
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub admin_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Without an explicit `admin_id` the account joins whichever admin the store
/// returns first.
pub async fn register_user(store: &dyn Store, req: RegisterRequest) -> Result<User, AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Name, email and password are required"));
    }
    if req
        .confirm_password
        .as_deref()
        .is_some_and(|confirm| confirm != req.password)
    {
        return Err(AppError::validation("Passwords do not match"));
    }

    let email = normalize_email(&req.email);
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::validation("Email already registered"));
    }

    let admin = match req.admin_id.as_deref() {
        Some(id) => {
            let id = ObjectId::parse_str(id).map_err(|_| AppError::NotFound("Admin not found"))?;
            store.find_admin(id).await?
        }
        None => store.first_admin().await?,
    }
    .ok_or(AppError::NotFound("Admin not found"))?;

    let user = User::new(&req.name, &email, &req.password, admin.id);
    store.insert_user(&user).await?;

    info!(
        "Registered user {} under admin {}",
        user.id.to_hex(),
        admin.id.to_hex()
    );
    Ok(user)
}

pub async fn login_user(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    match store.find_user_by_email(&normalize_email(email)).await? {
        Some(user) if user.password == password => Ok(user),
        _ => Err(AppError::InvalidCredentials),
    }
}

pub async fn update_profile(
    store: &dyn Store,
    user_id: ObjectId,
    update: ProfileUpdate,
) -> Result<UserProfile, AppError> {
    let mut user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    if let Some(email) = update.email.as_deref() {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::validation("Email cannot be empty"));
        }
        if email != user.email && store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::validation("Email already registered"));
        }
    }

    update.apply(&mut user);
    if !store.replace_user(&user).await? {
        return Err(AppError::NotFound("User not found"));
    }
    Ok(user.profile())
}

fn signed_in(state: &AppState, user: &User, status: StatusCode) -> Result<Response, AppError> {
    let token = issue_token(&state.config.session_secret, SessionKind::User, user.id)?;
    let cookie = session_cookie(SessionKind::User, &token, state.config.secure_cookies);

    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "user": user.profile() })),
    )
        .into_response())
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let user = register_user(state.store.as_ref(), req).await?;
    signed_in(&state, &user, StatusCode::CREATED)
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let user = login_user(state.store.as_ref(), &req.email, &req.password).await?;
    signed_in(&state, &user, StatusCode::OK)
}

async fn logout() -> Response {
    (
        [(SET_COOKIE, clear_cookie(SessionKind::User))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn session(
    State(state): State<AppState>,
    session: UserSession,
) -> Result<Response, AppError> {
    let payment_methods = state
        .store
        .find_admin(session.admin_id)
        .await?
        .map(|admin| admin.payment_methods)
        .unwrap_or_default();

    Ok(Json(json!({
        "success": true,
        "user": session.user,
        "payment_methods": payment_methods,
    }))
    .into_response())
}

async fn profile(
    State(state): State<AppState>,
    session: UserSession,
    Json(update): Json<ProfileUpdate>,
) -> Result<Response, AppError> {
    let user = update_profile(state.store.as_ref(), session.id, update).await?;
    Ok(Json(json!({ "success": true, "user": user })).into_response())
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
        .route("/profile", put(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Admin, PaymentMethods};
    use crate::store::MemoryStore;

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "pw".to_string(),
            confirm_password: None,
            admin_id: None,
        }
    }

    async fn store_with_admin() -> (MemoryStore, Admin) {
        let store = MemoryStore::new();
        let admin = Admin::new("root", "pw", PaymentMethods::default());
        store.insert_admin(&admin).await.unwrap();
        (store, admin)
    }

    #[tokio::test]
    async fn registration_defaults_to_the_first_admin() {
        let (store, admin) = store_with_admin().await;
        let later = Admin::new("second", "pw", PaymentMethods::default());
        store.insert_admin(&later).await.unwrap();

        let first = register_user(&store, request("one@example.com")).await.unwrap();
        let second = register_user(&store, request("two@example.com")).await.unwrap();

        assert_eq!(first.admin_id, admin.id);
        assert_eq!(second.admin_id, admin.id);
    }

    #[tokio::test]
    async fn registration_validates_input() {
        let (store, admin) = store_with_admin().await;

        let mut mismatched = request("ada@example.com");
        mismatched.confirm_password = Some("other".to_string());
        let err = register_user(&store, mismatched).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");

        register_user(&store, request("ada@example.com")).await.unwrap();
        let err = register_user(&store, request(" ADA@example.com "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");

        let mut unknown_admin = request("bob@example.com");
        unknown_admin.admin_id = Some(ObjectId::new().to_hex());
        let err = register_user(&store, unknown_admin).await.unwrap_err();
        assert_eq!(err.to_string(), "Admin not found");

        let mut explicit = request("cy@example.com");
        explicit.admin_id = Some(admin.id.to_hex());
        assert!(register_user(&store, explicit).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_registrations_keep_one_account() {
        let (store, _) = store_with_admin().await;

        let (first, second) = tokio::join!(
            register_user(&store, request("race@example.com")),
            register_user(&store, request("race@example.com")),
        );
        let failure = match (first, second) {
            (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
            other => panic!("expected exactly one success, got {other:?}"),
        };
        assert_eq!(failure.status(), StatusCode::BAD_REQUEST);
        assert_eq!(failure.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn registration_without_any_admin_fails() {
        let store = MemoryStore::new();
        let err = register_user(&store, request("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn login_compares_credentials() {
        let (store, _) = store_with_admin().await;
        register_user(&store, request("ada@example.com")).await.unwrap();

        assert!(login_user(&store, "Ada@Example.com", "pw").await.is_ok());
        assert!(matches!(
            login_user(&store, "ada@example.com", "nope").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            login_user(&store, "nobody@example.com", "pw").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn profile_update_rejects_taken_email() {
        let (store, _) = store_with_admin().await;
        let ada = register_user(&store, request("ada@example.com")).await.unwrap();
        register_user(&store, request("bob@example.com")).await.unwrap();

        let err = update_profile(
            &store,
            ada.id,
            ProfileUpdate {
                email: Some("bob@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");

        let profile = update_profile(
            &store,
            ada.id,
            ProfileUpdate {
                phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.phone.as_deref(), Some("555-0100"));
        assert_eq!(profile.email, "ada@example.com");
    }
}

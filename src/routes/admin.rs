//! Admin-side operations. Everything here is scoped to the calling admin's
//! tenant: users of another admin behave as if they did not exist.

use std::collections::{BTreeSet, HashMap};

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::parse_status_filter;
use crate::AppState;
use crate::aggregate::{AdminDonationRow, DonationTotals, admin_donation_rows, causes_supported};
use crate::error::AppError;
use crate::models::{
    Admin, AdminProfile, Donation, DonationStatus, DonationView, PaymentMethods, User,
    UserProfile,
};
use crate::session::{AdminSession, SessionKind, clear_cookie, issue_token, session_cookie};
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsUpdate {
    pub username: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn login_admin(store: &dyn Store, username: &str, password: &str) -> Result<Admin, AppError> {
    match store.find_admin_by_username(username.trim()).await? {
        Some(admin) if admin.password == password => Ok(admin),
        _ => Err(AppError::InvalidCredentials),
    }
}

pub async fn create_admin(store: &dyn Store, username: &str, password: &str) -> Result<Admin, AppError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::validation("Username and password are required"));
    }
    if store.find_admin_by_username(username.trim()).await?.is_some() {
        return Err(AppError::validation("Admin already exists"));
    }

    let admin = Admin::new(username, password, PaymentMethods::default());
    store.insert_admin(&admin).await?;
    info!("Created admin {} ({})", admin.username, admin.id.to_hex());
    Ok(admin)
}

pub async fn update_credentials(
    store: &dyn Store,
    admin_id: ObjectId,
    update: CredentialsUpdate,
) -> Result<AdminProfile, AppError> {
    let mut admin = store
        .find_admin(admin_id)
        .await?
        .ok_or(AppError::NotFound("Admin not found"))?;

    if let Some(new_password) = update.new_password.filter(|p| !p.is_empty()) {
        let current = update
            .current_password
            .ok_or_else(|| AppError::validation("Current password is required"))?;
        if current != admin.password {
            return Err(AppError::validation("Current password is incorrect"));
        }
        admin.password = new_password;
    }

    if let Some(username) = update.username.map(|u| u.trim().to_string()) {
        if !username.is_empty() && username != admin.username {
            if store.find_admin_by_username(&username).await?.is_some() {
                return Err(AppError::validation("Username already taken"));
            }
            admin.username = username;
        }
    }

    admin.updated_at = DateTime::now();
    store.replace_admin(&admin).await?;
    Ok(admin.profile())
}

pub async fn payment_methods(store: &dyn Store, admin_id: ObjectId) -> Result<PaymentMethods, AppError> {
    store
        .find_admin(admin_id)
        .await?
        .map(|admin| admin.payment_methods)
        .ok_or(AppError::NotFound("Admin not found"))
}

/// Replaces the whole configuration; absent sections are cleared.
pub async fn replace_payment_methods(
    store: &dyn Store,
    admin_id: ObjectId,
    methods: PaymentMethods,
) -> Result<PaymentMethods, AppError> {
    let mut admin = store
        .find_admin(admin_id)
        .await?
        .ok_or(AppError::NotFound("Admin not found"))?;

    admin.payment_methods = methods;
    admin.updated_at = DateTime::now();
    if !store.replace_admin(&admin).await? {
        return Err(AppError::NotFound("Admin not found"));
    }

    info!("Admin {} replaced payment methods", admin.username);
    Ok(admin.payment_methods)
}

#[derive(Debug, Serialize)]
pub struct AdminUserView {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub donations: Vec<DonationView>,
    pub total_donated: f64,
    pub causes_supported: BTreeSet<String>,
}

async fn tenant_donations(
    store: &dyn Store,
    admin_id: ObjectId,
) -> Result<(Vec<User>, Vec<Donation>), AppError> {
    let users = store.users_for_admin(admin_id).await?;
    let ids: Vec<ObjectId> = users.iter().map(|u| u.id).collect();
    let donations = store.donations_for_users(&ids).await?;
    Ok((users, donations))
}

/// Users of the tenant, newest first, each with their donations newest first.
pub async fn list_users(store: &dyn Store, admin_id: ObjectId) -> Result<Vec<AdminUserView>, AppError> {
    let (users, donations) = tenant_donations(store, admin_id).await?;

    let mut by_user: HashMap<ObjectId, Vec<&Donation>> = HashMap::new();
    for donation in &donations {
        by_user.entry(donation.user_id).or_default().push(donation);
    }

    Ok(users
        .iter()
        .map(|user| {
            let mut own = by_user.remove(&user.id).unwrap_or_default();
            own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            AdminUserView {
                profile: user.profile(),
                donations: own.iter().copied().map(DonationView::from).collect(),
                total_donated: DonationTotals::from_donations(own.iter().copied()).total_amount,
                causes_supported: causes_supported(own.iter().copied()),
            }
        })
        .collect())
}

pub async fn delete_user(store: &dyn Store, admin_id: ObjectId, user_id: &str) -> Result<(), AppError> {
    let not_found = || AppError::NotFound("User not found");
    let user_id = ObjectId::parse_str(user_id).map_err(|_| not_found())?;

    if !store.delete_tenant_user(admin_id, user_id).await? {
        return Err(not_found());
    }
    info!("Admin {} deleted user {}", admin_id.to_hex(), user_id.to_hex());
    Ok(())
}

/// Moves one donation to `target`. The user must belong to `admin_id` and the
/// donation to the user; any mismatch is reported as a single not-found.
pub async fn transition_donation(
    store: &dyn Store,
    admin_id: ObjectId,
    user_id: &str,
    donation_id: &str,
    target: DonationStatus,
) -> Result<DonationView, AppError> {
    let not_found = || AppError::NotFound("User or donation not found");
    let user_id = ObjectId::parse_str(user_id).map_err(|_| not_found())?;
    let donation_id = ObjectId::parse_str(donation_id).map_err(|_| not_found())?;

    store
        .find_tenant_user(admin_id, user_id)
        .await?
        .ok_or_else(not_found)?;
    let mut donation = store
        .find_donation(user_id, donation_id)
        .await?
        .ok_or_else(not_found)?;

    let next = donation.status.transition(target)?;
    if next != donation.status {
        if !store.set_donation_status(user_id, donation_id, next).await? {
            return Err(not_found());
        }
        info!(
            "Donation {} moved from {} to {}",
            donation_id.to_hex(),
            donation.status,
            next
        );
        donation.status = next;
    }

    Ok(DonationView::from(&donation))
}

#[derive(Debug, Serialize)]
pub struct DonationOverview {
    pub donations: Vec<AdminDonationRow>,
    pub totals: DonationTotals,
}

/// Tenant-wide donation list narrowed by status and search, with totals over
/// the unfiltered set.
pub async fn donation_overview(
    store: &dyn Store,
    admin_id: ObjectId,
    status: Option<DonationStatus>,
    query: Option<&str>,
) -> Result<DonationOverview, AppError> {
    let (users, donations) = tenant_donations(store, admin_id).await?;

    Ok(DonationOverview {
        donations: admin_donation_rows(&users, &donations, status, query),
        totals: DonationTotals::from_donations(&donations),
    })
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub user_count: usize,
    #[serde(flatten)]
    pub totals: DonationTotals,
}

pub async fn dashboard_stats(store: &dyn Store, admin_id: ObjectId) -> Result<DashboardStats, AppError> {
    let (users, donations) = tenant_donations(store, admin_id).await?;
    Ok(DashboardStats {
        user_count: users.len(),
        totals: DonationTotals::from_donations(&donations),
    })
}

#[derive(Debug, Deserialize)]
struct OverviewQuery {
    status: Option<String>,
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminCredentials>,
) -> Result<Response, AppError> {
    let admin = login_admin(state.store.as_ref(), &req.username, &req.password).await?;
    let token = issue_token(&state.config.session_secret, SessionKind::Admin, admin.id)?;
    let cookie = session_cookie(SessionKind::Admin, &token, state.config.secure_cookies);

    info!("Admin {} signed in", admin.username);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "admin": { "id": admin.id.to_hex(), "username": admin.username },
        })),
    )
        .into_response())
}

async fn logout() -> Response {
    (
        [(SET_COOKIE, clear_cookie(SessionKind::Admin))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

async fn session(session: AdminSession) -> Response {
    Json(json!({ "success": true, "admin": session.admin })).into_response()
}

async fn setup(
    State(state): State<AppState>,
    Json(req): Json<AdminCredentials>,
) -> Result<Response, AppError> {
    let admin = create_admin(state.store.as_ref(), &req.username, &req.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "admin_id": admin.id.to_hex() })),
    )
        .into_response())
}

async fn credentials(
    State(state): State<AppState>,
    session: AdminSession,
    Json(update): Json<CredentialsUpdate>,
) -> Result<Response, AppError> {
    let admin = update_credentials(state.store.as_ref(), session.id, update).await?;
    Ok(Json(json!({ "success": true, "admin": admin })).into_response())
}

async fn users(State(state): State<AppState>, session: AdminSession) -> Result<Response, AppError> {
    let users = list_users(state.store.as_ref(), session.id).await?;
    Ok(Json(json!({ "success": true, "users": users })).into_response())
}

async fn remove_user(
    State(state): State<AppState>,
    session: AdminSession,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    delete_user(state.store.as_ref(), session.id, &user_id).await?;
    Ok(Json(json!({ "success": true })).into_response())
}

async fn donations(
    State(state): State<AppState>,
    session: AdminSession,
    Query(query): Query<OverviewQuery>,
) -> Result<Response, AppError> {
    let status = parse_status_filter(query.status.as_deref())?;
    let overview =
        donation_overview(state.store.as_ref(), session.id, status, query.q.as_deref()).await?;
    Ok(Json(json!({ "success": true, "overview": overview })).into_response())
}

async fn donation_status(
    State(state): State<AppState>,
    session: AdminSession,
    Path((user_id, donation_id)): Path<(String, String)>,
    Json(update): Json<StatusUpdate>,
) -> Result<Response, AppError> {
    let target: DonationStatus = update.status.parse().map_err(AppError::Validation)?;
    let donation = transition_donation(
        state.store.as_ref(),
        session.id,
        &user_id,
        &donation_id,
        target,
    )
    .await?;
    Ok(Json(json!({ "success": true, "donation": donation })).into_response())
}

async fn stats(State(state): State<AppState>, session: AdminSession) -> Result<Response, AppError> {
    let stats = dashboard_stats(state.store.as_ref(), session.id).await?;
    Ok(Json(json!({ "success": true, "stats": stats })).into_response())
}

async fn get_payment_methods(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Response, AppError> {
    let methods = payment_methods(state.store.as_ref(), session.id).await?;
    Ok(Json(json!({ "success": true, "payment_methods": methods })).into_response())
}

async fn put_payment_methods(
    State(state): State<AppState>,
    session: AdminSession,
    Json(methods): Json<PaymentMethods>,
) -> Result<Response, AppError> {
    let methods = replace_payment_methods(state.store.as_ref(), session.id, methods).await?;
    Ok(Json(json!({ "success": true, "payment_methods": methods })).into_response())
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
        .route("/setup", post(setup))
        .route("/credentials", put(credentials))
        .route("/users", get(users))
        .route("/users/:user_id", delete(remove_user))
        .route(
            "/users/:user_id/donations/:donation_id/status",
            put(donation_status),
        )
        .route("/donations", get(donations))
        .route("/stats", get(stats))
        .route(
            "/payment-methods",
            get(get_payment_methods).put(put_payment_methods),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BankTransfer, CryptoType, CryptoWallet, CryptoWallets, PaymentMethod,
    };
    use crate::store::MemoryStore;

    struct Tenant {
        admin: Admin,
        user: User,
        donation: Donation,
    }

    async fn tenant(store: &MemoryStore, name: &str) -> Tenant {
        let admin = Admin::new(name, "pw", PaymentMethods::default());
        let user = User::new("Donor", &format!("donor@{name}.org"), "pw", admin.id);
        let donation = Donation {
            id: ObjectId::new(),
            user_id: user.id,
            cause: "education".to_string(),
            amount: 100.0,
            payment_method: PaymentMethod::BankTransfer,
            crypto_type: None,
            payment_proof: None,
            status: DonationStatus::Pending,
            is_anonymous: false,
            created_at: DateTime::now(),
        };
        store.insert_admin(&admin).await.unwrap();
        store.insert_user(&user).await.unwrap();
        store.insert_donation(&donation).await.unwrap();
        Tenant {
            admin,
            user,
            donation,
        }
    }

    async fn stored_status(store: &MemoryStore, t: &Tenant) -> DonationStatus {
        store
            .find_donation(t.user.id, t.donation.id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn confirming_is_idempotent() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        let (user, donation) = (a.user.id.to_hex(), a.donation.id.to_hex());

        let confirm = DonationStatus::Confirmed;
        let once = transition_donation(&store, a.admin.id, &user, &donation, confirm)
            .await
            .unwrap();
        let twice = transition_donation(&store, a.admin.id, &user, &donation, confirm)
            .await
            .unwrap();

        assert_eq!(once, twice);
        assert_eq!(stored_status(&store, &a).await, DonationStatus::Confirmed);
    }

    #[tokio::test]
    async fn other_tenants_see_not_found() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        let b = tenant(&store, "b").await;

        let err = transition_donation(
            &store,
            b.admin.id,
            &a.user.id.to_hex(),
            &a.donation.id.to_hex(),
            DonationStatus::Confirmed,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User or donation not found");
        assert_eq!(stored_status(&store, &a).await, DonationStatus::Pending);

        // b's own user paired with a's donation
        let err = transition_donation(
            &store,
            b.admin.id,
            &b.user.id.to_hex(),
            &a.donation.id.to_hex(),
            DonationStatus::Rejected,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "User or donation not found");

        let err = delete_user(&store, b.admin.id, &a.user.id.to_hex())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        assert!(store.find_user(a.user.id).await.unwrap().is_some());

        let listed = list_users(&store, b.admin.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].profile.id, b.user.id.to_hex());
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        let err = transition_donation(&store, a.admin.id, "zzz", "yyy", DonationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn terminal_donations_cannot_reopen() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        let (user, donation) = (a.user.id.to_hex(), a.donation.id.to_hex());

        transition_donation(&store, a.admin.id, &user, &donation, DonationStatus::Rejected)
            .await
            .unwrap();
        let err = transition_donation(&store, a.admin.id, &user, &donation, DonationStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(stored_status(&store, &a).await, DonationStatus::Rejected);
    }

    #[tokio::test]
    async fn payment_methods_round_trip() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        let methods = PaymentMethods {
            bank_transfer: Some(BankTransfer {
                bank_name: "First Bank".to_string(),
                account_name: "Hope".to_string(),
                account_number: "000123".to_string(),
                routing_number: Some("021000021".to_string()),
            }),
            crypto: Some(CryptoWallets {
                ethereum: Some(CryptoWallet {
                    address: "0xabc".to_string(),
                    qr_image: Some("https://img.example/qr.png".to_string()),
                }),
                xrp: Some(CryptoWallet {
                    address: "rXYZ".to_string(),
                    qr_image: None,
                }),
                ..Default::default()
            }),
        };

        let written = replace_payment_methods(&store, a.admin.id, methods.clone())
            .await
            .unwrap();
        assert_eq!(written, methods);
        assert_eq!(payment_methods(&store, a.admin.id).await.unwrap(), methods);

        let bank_only = PaymentMethods {
            crypto: None,
            ..methods.clone()
        };
        replace_payment_methods(&store, a.admin.id, bank_only)
            .await
            .unwrap();
        let read = payment_methods(&store, a.admin.id).await.unwrap();
        assert!(read.wallet_for(CryptoType::Ethereum).is_none());
    }

    #[tokio::test]
    async fn credentials_update_rules() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        tenant(&store, "b").await;

        let err = update_credentials(
            &store,
            a.admin.id,
            CredentialsUpdate {
                new_password: Some("new".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Current password is required");

        let err = update_credentials(
            &store,
            a.admin.id,
            CredentialsUpdate {
                current_password: Some("wrong".to_string()),
                new_password: Some("new".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Current password is incorrect");

        let err = update_credentials(
            &store,
            a.admin.id,
            CredentialsUpdate {
                username: Some("b".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Username already taken");

        update_credentials(
            &store,
            a.admin.id,
            CredentialsUpdate {
                username: Some("renamed".to_string()),
                current_password: Some("pw".to_string()),
                new_password: Some("new".to_string()),
            },
        )
        .await
        .unwrap();
        assert!(login_admin(&store, "renamed", "new").await.is_ok());
        assert!(login_admin(&store, "a", "pw").await.is_err());
    }

    #[tokio::test]
    async fn setup_refuses_duplicates() {
        let store = MemoryStore::new();
        create_admin(&store, "root", "pw").await.unwrap();
        let err = create_admin(&store, "root", "other").await.unwrap_err();
        assert_eq!(err.to_string(), "Admin already exists");
    }

    #[tokio::test]
    async fn overview_and_stats_cover_the_tenant() {
        let store = MemoryStore::new();
        let a = tenant(&store, "a").await;
        tenant(&store, "b").await;
        transition_donation(
            &store,
            a.admin.id,
            &a.user.id.to_hex(),
            &a.donation.id.to_hex(),
            DonationStatus::Confirmed,
        )
        .await
        .unwrap();

        let stats = dashboard_stats(&store, a.admin.id).await.unwrap();
        assert_eq!(stats.user_count, 1);
        assert_eq!(stats.totals.confirmed_amount, 100.0);
        assert_eq!(stats.totals.total_count, 1);

        let overview = donation_overview(&store, a.admin.id, Some(DonationStatus::Pending), None)
            .await
            .unwrap();
        assert!(overview.donations.is_empty());
        assert_eq!(overview.totals.total_amount, 100.0);

        let users = list_users(&store, a.admin.id).await.unwrap();
        assert_eq!(users[0].total_donated, 100.0);
        assert!(users[0].causes_supported.contains("education"));
    }
}

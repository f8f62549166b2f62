use std::collections::BTreeSet;

use axum::{
    Router,
    extract::{Json, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::parse_status_filter;
use super::uploads::read_upload;
use crate::AppState;
use crate::aggregate::{DonationTotals, causes_supported, sort_newest_first, with_status};
use crate::blob::{BlobStore, Upload};
use crate::error::AppError;
use crate::models::{
    CryptoType, Donation, DonationStatus, DonationView, PaymentMethod, PaymentMethods,
};
use crate::session::{MaybeUserSession, UserSession};
use crate::store::Store;

/// Caller-supplied donation fields. Status is not among them: every new
/// donation starts pending.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDonation {
    pub cause: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub crypto_type: Option<CryptoType>,
    #[serde(default)]
    pub payment_proof: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

fn check_submission(donor: Option<ObjectId>, input: &NewDonation) -> Result<(), AppError> {
    if donor.is_none() && !input.is_anonymous {
        return Err(AppError::NotAuthenticated(
            "Please sign in to donate or donate anonymously",
        ));
    }
    if input.payment_method == PaymentMethod::Crypto && input.crypto_type.is_none() {
        return Err(AppError::validation(
            "crypto_type is required for crypto donations",
        ));
    }
    Ok(())
}

/// Signed-in donations are stored under `donor`, which must still exist.
/// Anonymous donations without a session are acknowledged but not stored.
pub async fn create_donation(
    store: &dyn Store,
    donor: Option<ObjectId>,
    input: NewDonation,
) -> Result<DonationView, AppError> {
    check_submission(donor, &input)?;

    let donation = Donation {
        id: ObjectId::new(),
        user_id: donor.unwrap_or_else(ObjectId::new),
        cause: input.cause,
        amount: input.amount,
        payment_method: input.payment_method,
        crypto_type: input.crypto_type,
        payment_proof: input.payment_proof,
        status: DonationStatus::Pending,
        is_anonymous: input.is_anonymous,
        created_at: DateTime::now(),
    };

    let Some(donor) = donor else {
        info!("Accepted anonymous {} donation", donation.cause);
        return Ok(DonationView {
            user_id: None,
            ..DonationView::from(&donation)
        });
    };

    store
        .find_user(donor)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    store.insert_donation(&donation).await?;

    info!(
        "User {} pledged {} to {}",
        donor.to_hex(),
        donation.amount,
        donation.cause
    );
    Ok(DonationView::from(&donation))
}

/// Uploads the proof first; nothing is stored when the upload fails.
pub async fn create_donation_with_proof(
    store: &dyn Store,
    blobs: &dyn BlobStore,
    donor: Option<ObjectId>,
    mut input: NewDonation,
    proof: Option<Upload>,
) -> Result<DonationView, AppError> {
    check_submission(donor, &input)?;

    if let Some(proof) = proof {
        input.payment_proof = Some(blobs.put(proof).await?);
    }
    create_donation(store, donor, input).await
}

#[derive(Debug, Serialize)]
pub struct DonationHistory {
    pub donations: Vec<DonationView>,
    pub totals: DonationTotals,
    pub causes_supported: BTreeSet<String>,
}

/// The user's donations newest first, optionally narrowed to one status.
/// Totals always cover the full history.
pub async fn donation_history(
    store: &dyn Store,
    user_id: ObjectId,
    status: Option<DonationStatus>,
) -> Result<DonationHistory, AppError> {
    let mut donations = store.donations_for_users(&[user_id]).await?;
    sort_newest_first(&mut donations);

    Ok(DonationHistory {
        donations: with_status(&donations, status).map(DonationView::from).collect(),
        totals: DonationTotals::from_donations(&donations),
        causes_supported: causes_supported(&donations),
    })
}

/// Payment details shown on the donation page: the named admin, else the
/// signed-in donor's admin, else the first admin found.
pub async fn payment_methods_for_donors(
    store: &dyn Store,
    admin_id: Option<&str>,
    donor: Option<ObjectId>,
) -> Result<PaymentMethods, AppError> {
    let admin = match (admin_id, donor) {
        (Some(id), _) => {
            let id = ObjectId::parse_str(id).map_err(|_| AppError::NotFound("Admin not found"))?;
            store.find_admin(id).await?
        }
        (None, Some(donor)) => {
            let user = store
                .find_user(donor)
                .await?
                .ok_or(AppError::NotFound("User not found"))?;
            store.find_admin(user.admin_id).await?
        }
        (None, None) => store.first_admin().await?,
    };

    admin
        .map(|admin| admin.payment_methods)
        .ok_or(AppError::NotFound("Admin not found"))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodsQuery {
    admin_id: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    session: MaybeUserSession,
    Json(input): Json<NewDonation>,
) -> Result<Response, AppError> {
    let donation = create_donation(state.store.as_ref(), session.user_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "donation": donation })),
    )
        .into_response())
}

/// Multipart form: a `donation` JSON part and an optional `file` part.
async fn create_with_proof(
    State(state): State<AppState>,
    session: MaybeUserSession,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut input = None;
    let mut proof = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("donation") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                let parsed: NewDonation = serde_json::from_str(&text)
                    .map_err(|e| AppError::validation(format!("Malformed donation: {e}")))?;
                input = Some(parsed);
            }
            Some("file") => proof = Some(read_upload(field).await?),
            _ => {}
        }
    }

    let input = input.ok_or_else(|| AppError::validation("Missing donation details"))?;
    let donation = create_donation_with_proof(
        state.store.as_ref(),
        state.blobs.as_ref(),
        session.user_id,
        input,
        proof,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "donation": donation })),
    )
        .into_response())
}

async fn history(
    State(state): State<AppState>,
    session: UserSession,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    let status = parse_status_filter(query.status.as_deref())?;
    let history = donation_history(state.store.as_ref(), session.id, status).await?;
    Ok(Json(json!({ "success": true, "history": history })).into_response())
}

async fn payment_methods(
    State(state): State<AppState>,
    session: MaybeUserSession,
    Query(query): Query<PaymentMethodsQuery>,
) -> Result<Response, AppError> {
    let methods = payment_methods_for_donors(
        state.store.as_ref(),
        query.admin_id.as_deref(),
        session.user_id,
    )
    .await?;
    Ok(Json(json!({ "success": true, "payment_methods": methods })).into_response())
}

pub fn donation_routes() -> Router<AppState> {
    Router::new()
        .route("/donations", post(create).get(history))
        .route("/donations/with-proof", post(create_with_proof))
        .route("/payment-methods", get(payment_methods))
}

use axum::{
    Router,
    extract::{Json, State},
    response::{IntoResponse, Response},
    routing::get,
};
use mongodb::bson::{DateTime, oid::ObjectId};
use serde_json::json;
use tracing::info;

use crate::AppState;
use crate::error::AppError;
use crate::models::{Admin, BankTransfer, CryptoWallet, CryptoWallets, PaymentMethods};
use crate::store::Store;

pub const SEED_USERNAME: &str = "admin.eric@secure.encryption";
pub const SEED_PASSWORD: &str = "AdminEric99$ecure@nodemailer.encrypted";

fn wallet(address: &str) -> Option<CryptoWallet> {
    Some(CryptoWallet {
        address: address.to_string(),
        qr_image: Some(String::new()),
    })
}

pub fn seed_payment_methods() -> PaymentMethods {
    PaymentMethods {
        bank_transfer: Some(BankTransfer {
            bank_name: "Chase Bank".to_string(),
            account_name: "Hope Foundation International".to_string(),
            account_number: "4829103847291038".to_string(),
            routing_number: Some("021000021".to_string()),
        }),
        crypto: Some(CryptoWallets {
            bitcoin: wallet("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh"),
            ethereum: wallet("0x71C7656EC7ab88b098defB751B7401B5f6d8976F"),
            usdt: wallet("TKFYqBHHvuaxC8FLNV3GhvPFFP8yGLx9JM"),
            bnb: wallet("bnb1grpf0955h0ykzq3ar5nmum7y6gdfl6lxfn46h2"),
            solana: wallet("DYw8jCTfwHNRJhhmFcbXvVDTqWMEVFBX6ZKUmG5CNSKK"),
            xrp: wallet("rN7n3473SaZBCG4dFL83w7a1RXtXtbk2D9"),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOutcome {
    pub admin_id: ObjectId,
    pub updated: bool,
}

/// Creates the bootstrap admin, or resets its payment methods if it exists.
pub async fn seed_admin(store: &dyn Store) -> Result<SeedOutcome, AppError> {
    if let Some(mut admin) = store.find_admin_by_username(SEED_USERNAME).await? {
        admin.payment_methods = seed_payment_methods();
        admin.updated_at = DateTime::now();
        store.replace_admin(&admin).await?;

        info!("Admin already exists, payment methods updated");
        return Ok(SeedOutcome {
            admin_id: admin.id,
            updated: true,
        });
    }

    let admin = Admin::new(SEED_USERNAME, SEED_PASSWORD, seed_payment_methods());
    store.insert_admin(&admin).await?;

    info!("Admin seeded: {} ({})", admin.username, admin.id.to_hex());
    Ok(SeedOutcome {
        admin_id: admin.id,
        updated: false,
    })
}

async fn seed(State(state): State<AppState>) -> Result<Response, AppError> {
    let outcome = seed_admin(state.store.as_ref()).await?;
    let message = if outcome.updated {
        "Admin already exists, payment methods updated"
    } else {
        "Admin seeded successfully"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "admin_id": outcome.admin_id.to_hex(),
    }))
    .into_response())
}

pub fn seed_routes() -> Router<AppState> {
    Router::new().route("/seed", get(seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CryptoType;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_keeps_one_admin_and_resets_payments() {
        let store = MemoryStore::new();

        let first = seed_admin(&store).await.unwrap();
        assert!(!first.updated);

        let mut admin = store.find_admin(first.admin_id).await.unwrap().unwrap();
        admin.payment_methods = PaymentMethods::default();
        store.replace_admin(&admin).await.unwrap();

        let second = seed_admin(&store).await.unwrap();
        assert!(second.updated);
        assert_eq!(second.admin_id, first.admin_id);

        let admin = store.first_admin().await.unwrap().unwrap();
        assert_eq!(admin.id, first.admin_id);
        assert_eq!(admin.payment_methods, seed_payment_methods());
        for currency in CryptoType::ALL {
            assert!(admin.payment_methods.wallet_for(currency).is_some());
        }
    }
}

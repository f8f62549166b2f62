use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use super::donation::CryptoType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransfer {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoWallet {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoWallets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitcoin: Option<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum: Option<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usdt: Option<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bnb: Option<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solana: Option<CryptoWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xrp: Option<CryptoWallet>,
}

impl CryptoWallets {
    pub fn get(&self, currency: CryptoType) -> Option<&CryptoWallet> {
        match currency {
            CryptoType::Bitcoin => self.bitcoin.as_ref(),
            CryptoType::Ethereum => self.ethereum.as_ref(),
            CryptoType::Usdt => self.usdt.as_ref(),
            CryptoType::Bnb => self.bnb.as_ref(),
            CryptoType::Solana => self.solana.as_ref(),
            CryptoType::Xrp => self.xrp.as_ref(),
        }
    }
}

/// Replaced as a whole on every update, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_transfer: Option<BankTransfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoWallets>,
}

impl PaymentMethods {
    pub fn wallet_for(&self, currency: CryptoType) -> Option<&CryptoWallet> {
        self.crypto.as_ref().and_then(|wallets| wallets.get(currency))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub password: String, // stored as submitted, compared verbatim
    #[serde(default)]
    pub payment_methods: PaymentMethods,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Admin {
    pub fn new(username: &str, password: &str, payment_methods: PaymentMethods) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            username: username.trim().to_string(),
            password: password.to_string(),
            payment_methods,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id.to_hex(),
            username: self.username.clone(),
            payment_methods: self.payment_methods.clone(),
        }
    }
}

/// Admin without the password field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminProfile {
    pub id: String,
    pub username: String,
    pub payment_methods: PaymentMethods,
}

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl DonationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Confirmed => "confirmed",
            DonationStatus::Rejected => "rejected",
        }
    }

    /// Confirmed and rejected are terminal. Moving to the current status is a no-op.
    pub fn transition(self, target: DonationStatus) -> Result<DonationStatus, InvalidTransition> {
        match (self, target) {
            (from, to) if from == to => Ok(to),
            (DonationStatus::Pending, DonationStatus::Confirmed | DonationStatus::Rejected) => {
                Ok(target)
            }
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DonationStatus::Pending),
            "confirmed" => Ok(DonationStatus::Confirmed),
            "rejected" => Ok(DonationStatus::Rejected),
            other => Err(format!("Unknown donation status: {other}")),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cannot move a {from} donation to {to}")]
pub struct InvalidTransition {
    pub from: DonationStatus,
    pub to: DonationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Crypto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoType {
    Bitcoin,
    Ethereum,
    Usdt,
    Bnb,
    Solana,
    Xrp,
}

impl CryptoType {
    pub const ALL: [CryptoType; 6] = [
        CryptoType::Bitcoin,
        CryptoType::Ethereum,
        CryptoType::Usdt,
        CryptoType::Bnb,
        CryptoType::Solana,
        CryptoType::Xrp,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub cause: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_type: Option<CryptoType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_proof: Option<String>,
    pub status: DonationStatus,
    #[serde(default)]
    pub is_anonymous: bool,
    pub created_at: DateTime,
}

/// Outward shape of a donation: hex ids and RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonationView {
    pub id: String,
    pub user_id: Option<String>,
    pub cause: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub crypto_type: Option<CryptoType>,
    pub payment_proof: Option<String>,
    pub status: DonationStatus,
    pub is_anonymous: bool,
    pub created_at: String,
}

impl From<&Donation> for DonationView {
    fn from(donation: &Donation) -> Self {
        Self {
            id: donation.id.to_hex(),
            user_id: Some(donation.user_id.to_hex()),
            cause: donation.cause.clone(),
            amount: donation.amount,
            payment_method: donation.payment_method,
            crypto_type: donation.crypto_type,
            payment_proof: donation.payment_proof.clone(),
            status: donation.status,
            is_anonymous: donation.is_anonymous,
            created_at: donation.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_either_terminal_state() {
        assert_eq!(
            DonationStatus::Pending.transition(DonationStatus::Confirmed),
            Ok(DonationStatus::Confirmed)
        );
        assert_eq!(
            DonationStatus::Pending.transition(DonationStatus::Rejected),
            Ok(DonationStatus::Rejected)
        );
    }

    #[test]
    fn same_status_is_a_no_op() {
        for status in [
            DonationStatus::Pending,
            DonationStatus::Confirmed,
            DonationStatus::Rejected,
        ] {
            assert_eq!(status.transition(status), Ok(status));
        }
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let err = DonationStatus::Confirmed
            .transition(DonationStatus::Pending)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot move a confirmed donation to pending");
        assert!(DonationStatus::Rejected
            .transition(DonationStatus::Confirmed)
            .is_err());
    }

    #[test]
    fn wire_names_match_stored_strings() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"bank_transfer\""
        );
        assert_eq!(serde_json::to_string(&CryptoType::Usdt).unwrap(), "\"usdt\"");
        assert_eq!("rejected".parse::<DonationStatus>(), Ok(DonationStatus::Rejected));
        assert!("approved".parse::<DonationStatus>().is_err());
    }
}

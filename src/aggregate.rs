//! Read-side rollups over donation lists, recomputed on every request.

use std::collections::{BTreeSet, HashMap};

use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::models::{Donation, DonationStatus, DonationView, User};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct DonationTotals {
    pub total_amount: f64,
    pub confirmed_amount: f64,
    pub pending_amount: f64,
    pub rejected_amount: f64,
    pub total_count: usize,
    pub confirmed_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
}

impl DonationTotals {
    pub fn from_donations<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> Self {
        let mut totals = Self::default();
        for donation in donations {
            totals.total_amount += donation.amount;
            totals.total_count += 1;
            match donation.status {
                DonationStatus::Pending => {
                    totals.pending_amount += donation.amount;
                    totals.pending_count += 1;
                }
                DonationStatus::Confirmed => {
                    totals.confirmed_amount += donation.amount;
                    totals.confirmed_count += 1;
                }
                DonationStatus::Rejected => {
                    totals.rejected_amount += donation.amount;
                    totals.rejected_count += 1;
                }
            }
        }
        totals
    }

    pub fn amount(&self, status: DonationStatus) -> f64 {
        match status {
            DonationStatus::Pending => self.pending_amount,
            DonationStatus::Confirmed => self.confirmed_amount,
            DonationStatus::Rejected => self.rejected_amount,
        }
    }

    pub fn count(&self, status: DonationStatus) -> usize {
        match status {
            DonationStatus::Pending => self.pending_count,
            DonationStatus::Confirmed => self.confirmed_count,
            DonationStatus::Rejected => self.rejected_count,
        }
    }
}

/// Distinct causes with at least one confirmed donation.
pub fn causes_supported<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> BTreeSet<String> {
    donations
        .into_iter()
        .filter(|d| d.status == DonationStatus::Confirmed)
        .map(|d| d.cause.clone())
        .collect()
}

pub fn sort_newest_first(donations: &mut [Donation]) {
    donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub fn with_status(
    donations: &[Donation],
    status: Option<DonationStatus>,
) -> impl Iterator<Item = &Donation> {
    donations
        .iter()
        .filter(move |d| status.map_or(true, |s| d.status == s))
}

/// A donation joined with its donor, as listed on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDonationRow {
    #[serde(flatten)]
    pub donation: DonationView,
    pub user_name: String,
    pub user_email: String,
}

impl AdminDonationRow {
    fn matches(&self, query: &str) -> bool {
        self.user_name.to_lowercase().contains(query)
            || self.user_email.to_lowercase().contains(query)
            || self.donation.cause.to_lowercase().contains(query)
    }
}

/// Flattens every user's donations into one list, newest first, keeping only
/// those matching `status` and, when given, the case-insensitive `query`
/// against donor name, donor email or cause.
pub fn admin_donation_rows(
    users: &[User],
    donations: &[Donation],
    status: Option<DonationStatus>,
    query: Option<&str>,
) -> Vec<AdminDonationRow> {
    let donors: HashMap<ObjectId, &User> = users.iter().map(|u| (u.id, u)).collect();
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut sorted: Vec<&Donation> = with_status(donations, status).collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    sorted
        .into_iter()
        .filter_map(|donation| {
            let donor = donors.get(&donation.user_id)?;
            Some(AdminDonationRow {
                donation: DonationView::from(donation),
                user_name: donor.name.clone(),
                user_email: donor.email.clone(),
            })
        })
        .filter(|row| query.as_deref().map_or(true, |q| row.matches(q)))
        .collect()
}

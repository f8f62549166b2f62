//! Persistence for admins, users and donations.
//!
//! Every mutation is a single-document write. There are no transactions: two
//! admins updating the same donation race and the last write wins.

use axum::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{Admin, Donation, DonationStatus, User};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the write; carries the caller-facing message.
    #[error("{0}")]
    Duplicate(&'static str),

    #[error("Database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

pub const DUPLICATE_EMAIL: &str = "Email already registered";
pub const DUPLICATE_USERNAME: &str = "Username already taken";

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_admin(&self, id: ObjectId) -> StoreResult<Option<Admin>>;
    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>>;
    /// Oldest admin record, used when a caller does not name a tenant.
    async fn first_admin(&self) -> StoreResult<Option<Admin>>;
    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()>;
    async fn replace_admin(&self, admin: &Admin) -> StoreResult<bool>;

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Matches only when the user belongs to `admin_id`.
    async fn find_tenant_user(
        &self,
        admin_id: ObjectId,
        user_id: ObjectId,
    ) -> StoreResult<Option<User>>;
    /// Newest first.
    async fn users_for_admin(&self, admin_id: ObjectId) -> StoreResult<Vec<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn replace_user(&self, user: &User) -> StoreResult<bool>;
    /// Removes the user and all of their donations.
    async fn delete_tenant_user(&self, admin_id: ObjectId, user_id: ObjectId)
    -> StoreResult<bool>;

    async fn insert_donation(&self, donation: &Donation) -> StoreResult<()>;
    /// Newest first.
    async fn donations_for_users(&self, user_ids: &[ObjectId]) -> StoreResult<Vec<Donation>>;
    async fn find_donation(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
    ) -> StoreResult<Option<Donation>>;
    async fn set_donation_status(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
        status: DonationStatus,
    ) -> StoreResult<bool>;
}

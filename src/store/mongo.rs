use axum::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, doc, oid::ObjectId};
use mongodb::error::{Error, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

use super::{DUPLICATE_EMAIL, DUPLICATE_USERNAME, Store, StoreError, StoreResult};
use crate::models::{Admin, Donation, DonationStatus, User};

const ADMINS: &str = "admins";
const USERS: &str = "users";
const DONATIONS: &str = "donations";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        info!("Connecting to MongoDB database {database}");
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(database);

        db.run_command(doc! { "ping": 1 }, None).await?;

        let store = Self { db };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.admins()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        self.donations()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;
        Ok(())
    }

    fn admins(&self) -> Collection<Admin> {
        self.db.collection(ADMINS)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn donations(&self) -> Collection<Donation> {
        self.db.collection(DONATIONS)
    }
}

const DUPLICATE_KEY: i32 = 11000;

/// Maps a unique-index violation to [`StoreError::Duplicate`].
fn unique(err: Error, message: &'static str) -> StoreError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    };
    if duplicate {
        StoreError::Duplicate(message)
    } else {
        StoreError::Mongo(err)
    }
}

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .build()
}

#[async_trait]
impl Store for MongoStore {
    async fn find_admin(&self, id: ObjectId) -> StoreResult<Option<Admin>> {
        Ok(self.admins().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self
            .admins()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn first_admin(&self) -> StoreResult<Option<Admin>> {
        let options = FindOneOptions::builder().sort(doc! { "_id": 1 }).build();
        Ok(self.admins().find_one(None, options).await?)
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        self.admins()
            .insert_one(admin, None)
            .await
            .map_err(|e| unique(e, DUPLICATE_USERNAME))?;
        Ok(())
    }

    async fn replace_admin(&self, admin: &Admin) -> StoreResult<bool> {
        let result = self
            .admins()
            .replace_one(doc! { "_id": admin.id }, admin, None)
            .await
            .map_err(|e| unique(e, DUPLICATE_USERNAME))?;
        Ok(result.matched_count == 1)
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_tenant_user(
        &self,
        admin_id: ObjectId,
        user_id: ObjectId,
    ) -> StoreResult<Option<User>> {
        Ok(self
            .users()
            .find_one(doc! { "_id": user_id, "admin_id": admin_id }, None)
            .await?)
    }

    async fn users_for_admin(&self, admin_id: ObjectId) -> StoreResult<Vec<User>> {
        let cursor = self
            .users()
            .find(doc! { "admin_id": admin_id }, newest_first())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| unique(e, DUPLICATE_EMAIL))?;
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> StoreResult<bool> {
        let result = self
            .users()
            .replace_one(doc! { "_id": user.id }, user, None)
            .await
            .map_err(|e| unique(e, DUPLICATE_EMAIL))?;
        Ok(result.matched_count == 1)
    }

    async fn delete_tenant_user(
        &self,
        admin_id: ObjectId,
        user_id: ObjectId,
    ) -> StoreResult<bool> {
        let result = self
            .users()
            .delete_one(doc! { "_id": user_id, "admin_id": admin_id }, None)
            .await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }

        let removed = self
            .donations()
            .delete_many(doc! { "user_id": user_id }, None)
            .await?;
        info!(
            "Deleted user {} with {} donations",
            user_id.to_hex(),
            removed.deleted_count
        );
        Ok(true)
    }

    async fn insert_donation(&self, donation: &Donation) -> StoreResult<()> {
        self.donations().insert_one(donation, None).await?;
        Ok(())
    }

    async fn donations_for_users(&self, user_ids: &[ObjectId]) -> StoreResult<Vec<Donation>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Bson> = user_ids.iter().copied().map(Bson::ObjectId).collect();
        let cursor = self
            .donations()
            .find(doc! { "user_id": { "$in": ids } }, newest_first())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_donation(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
    ) -> StoreResult<Option<Donation>> {
        Ok(self
            .donations()
            .find_one(doc! { "_id": donation_id, "user_id": user_id }, None)
            .await?)
    }

    async fn set_donation_status(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
        status: DonationStatus,
    ) -> StoreResult<bool> {
        let result = self
            .donations()
            .update_one(
                doc! { "_id": donation_id, "user_id": user_id },
                doc! { "$set": { "status": status.as_str() } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}

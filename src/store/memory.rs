use axum::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{DUPLICATE_EMAIL, DUPLICATE_USERNAME, Store, StoreError, StoreResult};
use crate::models::{Admin, Donation, DonationStatus, User};

/// Process-local store with the same scoping rules as [`super::MongoStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    admins: Vec<Admin>,
    users: Vec<User>,
    donations: Vec<Donation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> i64) {
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_admin(&self, id: ObjectId) -> StoreResult<Option<Admin>> {
        let data = self.inner.read().await;
        Ok(data.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        let data = self.inner.read().await;
        Ok(data.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn first_admin(&self) -> StoreResult<Option<Admin>> {
        let data = self.inner.read().await;
        Ok(data.admins.first().cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if data.admins.iter().any(|a| a.username == admin.username) {
            return Err(StoreError::Duplicate(DUPLICATE_USERNAME));
        }
        data.admins.push(admin.clone());
        Ok(())
    }

    async fn replace_admin(&self, admin: &Admin) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        if data
            .admins
            .iter()
            .any(|a| a.id != admin.id && a.username == admin.username)
        {
            return Err(StoreError::Duplicate(DUPLICATE_USERNAME));
        }
        match data.admins.iter_mut().find(|a| a.id == admin.id) {
            Some(slot) => {
                *slot = admin.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_tenant_user(
        &self,
        admin_id: ObjectId,
        user_id: ObjectId,
    ) -> StoreResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.id == user_id && u.admin_id == admin_id)
            .cloned())
    }

    async fn users_for_admin(&self, admin_id: ObjectId) -> StoreResult<Vec<User>> {
        let data = self.inner.read().await;
        let mut users: Vec<User> = data
            .users
            .iter()
            .filter(|u| u.admin_id == admin_id)
            .cloned()
            .collect();
        newest_first(&mut users, |u| u.created_at.timestamp_millis());
        Ok(users)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(DUPLICATE_EMAIL));
        }
        data.users.push(user.clone());
        Ok(())
    }

    async fn replace_user(&self, user: &User) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Duplicate(DUPLICATE_EMAIL));
        }
        match data.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_tenant_user(
        &self,
        admin_id: ObjectId,
        user_id: ObjectId,
    ) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.users.len();
        data.users
            .retain(|u| !(u.id == user_id && u.admin_id == admin_id));
        if data.users.len() == before {
            return Ok(false);
        }
        data.donations.retain(|d| d.user_id != user_id);
        Ok(true)
    }

    async fn insert_donation(&self, donation: &Donation) -> StoreResult<()> {
        self.inner.write().await.donations.push(donation.clone());
        Ok(())
    }

    async fn donations_for_users(&self, user_ids: &[ObjectId]) -> StoreResult<Vec<Donation>> {
        let data = self.inner.read().await;
        let mut donations: Vec<Donation> = data
            .donations
            .iter()
            .filter(|d| user_ids.contains(&d.user_id))
            .cloned()
            .collect();
        newest_first(&mut donations, |d| d.created_at.timestamp_millis());
        Ok(donations)
    }

    async fn find_donation(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
    ) -> StoreResult<Option<Donation>> {
        let data = self.inner.read().await;
        Ok(data
            .donations
            .iter()
            .find(|d| d.id == donation_id && d.user_id == user_id)
            .cloned())
    }

    async fn set_donation_status(
        &self,
        user_id: ObjectId,
        donation_id: ObjectId,
        status: DonationStatus,
    ) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        match data
            .donations
            .iter_mut()
            .find(|d| d.id == donation_id && d.user_id == user_id)
        {
            Some(donation) => {
                donation.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, PaymentMethods};
    use mongodb::bson::DateTime;

    fn donation(user_id: ObjectId, millis: i64) -> Donation {
        Donation {
            id: ObjectId::new(),
            user_id,
            cause: "education".to_string(),
            amount: 10.0,
            payment_method: PaymentMethod::BankTransfer,
            crypto_type: None,
            payment_proof: None,
            status: DonationStatus::Pending,
            is_anonymous: false,
            created_at: DateTime::from_millis(millis),
        }
    }

    #[tokio::test]
    async fn deleting_a_user_drops_their_donations() {
        let store = MemoryStore::new();
        let admin = Admin::new("root", "pw", PaymentMethods::default());
        let user = User::new("Ada", "ada@example.com", "pw", admin.id);
        let other = User::new("Bob", "bob@example.com", "pw", admin.id);
        store.insert_admin(&admin).await.unwrap();
        store.insert_user(&user).await.unwrap();
        store.insert_user(&other).await.unwrap();
        store.insert_donation(&donation(user.id, 1)).await.unwrap();
        store.insert_donation(&donation(other.id, 2)).await.unwrap();

        assert!(!store
            .delete_tenant_user(ObjectId::new(), user.id)
            .await
            .unwrap());
        assert!(store.delete_tenant_user(admin.id, user.id).await.unwrap());

        let left = store
            .donations_for_users(&[user.id, other.id])
            .await
            .unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].user_id, other.id);
    }

    #[tokio::test]
    async fn donations_come_back_newest_first() {
        let store = MemoryStore::new();
        let user_id = ObjectId::new();
        for millis in [5, 30, 10] {
            store
                .insert_donation(&donation(user_id, millis))
                .await
                .unwrap();
        }

        let stamps: Vec<i64> = store
            .donations_for_users(&[user_id])
            .await
            .unwrap()
            .iter()
            .map(|d| d.created_at.timestamp_millis())
            .collect();
        assert_eq!(stamps, vec![30, 10, 5]);
    }

    #[tokio::test]
    async fn unique_fields_are_enforced_like_the_indexes() {
        let store = MemoryStore::new();
        let admin = Admin::new("root", "pw", PaymentMethods::default());
        store.insert_admin(&admin).await.unwrap();

        let twin = Admin::new("root", "other", PaymentMethods::default());
        let err = store.insert_admin(&twin).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(DUPLICATE_USERNAME)));

        let mut renamed = Admin::new("second", "pw", PaymentMethods::default());
        store.insert_admin(&renamed).await.unwrap();
        renamed.username = "root".to_string();
        assert!(store.replace_admin(&renamed).await.is_err());

        let user = User::new("Ada", "ada@example.com", "pw", admin.id);
        store.insert_user(&user).await.unwrap();
        assert!(store.replace_user(&user).await.unwrap());

        let twin = User::new("Ada Two", "ada@example.com", "pw", admin.id);
        let err = store.insert_user(&twin).await.unwrap_err();
        assert_eq!(err.to_string(), "Email already registered");
    }
}

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AVATAR: &str = "/assets/team-members/1.jpg";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password: String, // stored as submitted, compared verbatim
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub avatar: String,
    pub admin_id: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl User {
    pub fn new(name: &str, email: &str, password: &str, admin_id: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
            phone: None,
            address: None,
            bio: None,
            avatar: DEFAULT_AVATAR.to_string(),
            admin_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.to_hex(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            bio: self.bio.clone(),
            avatar: self.avatar.clone(),
            admin_id: self.admin_id.to_hex(),
            created_at: self.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User without the password field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub avatar: String,
    pub admin_id: String,
    pub created_at: String,
}

/// Fields a user may change on their own profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = normalize_email(&email);
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(address) = self.address {
            user.address = Some(address);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        user.updated_at = DateTime::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_normalized() {
        let user = User::new(" Ada ", "  Ada@Example.COM ", "pw", ObjectId::new());
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.avatar, DEFAULT_AVATAR);
    }

    #[test]
    fn profile_update_only_touches_given_fields() {
        let mut user = User::new("Ada", "ada@example.com", "pw", ObjectId::new());
        user.phone = Some("555".to_string());

        ProfileUpdate {
            bio: Some("Engineer".to_string()),
            email: Some("ADA@new.org".to_string()),
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@new.org");
        assert_eq!(user.phone.as_deref(), Some("555"));
        assert_eq!(user.bio.as_deref(), Some("Engineer"));
    }
}

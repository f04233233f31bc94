use chrono::{DateTime, Utc};
use crypto::bcrypt::bcrypt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::role::RoleName;

pub mod db;

pub static USER_COLLECTION_NAME: &str = "users";

/// Salted bcrypt over a SHA-256 pre-hash, so password length never exceeds
/// bcrypt's 72-byte input limit.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PasswordHash([u8; 24]);

const BCRYPT_COST: u32 = 12;

impl PasswordHash {
    pub fn new(password: impl AsRef<str>) -> PasswordHash {
        let mut pw_hash: [u8; 24] = [0; 24];

        let mut sha = Sha256::new();
        sha2::Digest::update(&mut sha, password.as_ref().as_bytes());

        bcrypt(
            BCRYPT_COST,
            &crate::SECURITY.salt,
            sha.finalize().as_slice(),
            &mut pw_hash,
        );

        PasswordHash(pw_hash)
    }

    pub fn verify(&self, password: impl AsRef<str>) -> bool {
        self == &PasswordHash::new(password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default = "Uuid::new_v4", rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub pw_hash: PasswordHash,
    pub role_id: Uuid,
    #[serde(
        default = "Utc::now",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl ToString,
        email: impl ToString,
        password: impl AsRef<str>,
        role_id: Uuid,
    ) -> User {
        let id = Uuid::new_v4();
        tracing::info!("Creating a new user with UUID: {}", id);

        User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            pw_hash: PasswordHash::new(password),
            role_id,
            created: Utc::now(),
        }
    }
}

/// User shape returned by handlers. The password hash never leaves the
/// store layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: RoleName,
}

impl UserResponse {
    pub fn new(user: &User, role: RoleName) -> UserResponse {
        UserResponse {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_original_password_only() {
        let hash = PasswordHash::new("Password123!");
        assert!(hash.verify("Password123!"));
        assert!(!hash.verify("password123!"));
    }
}

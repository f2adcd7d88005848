//! Participant identity
//!
//! A participant signs in with their medical record number (MRN). Their birth
//! date is the initial password; hashes are argon2id in PHC format.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{require, LabError, Result};

/// Opaque bearer token handed out on register/login
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthToken {
    pub token: String,
    pub user_id: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, medical_record_number: &str, birth_date: &str) -> Result<AuthToken>;

    async fn login(&self, medical_record_number: &str, password: &str) -> Result<AuthToken>;

    /// Replace the password and revoke every token issued so far. Returns a
    /// fresh token for the caller.
    async fn change_password(&self, user_id: &str, current: &str, new: &str) -> Result<AuthToken>;

    /// Revoke a single token
    async fn logout(&self, token: &str);

    /// User id behind `token`, if it is still valid
    async fn current_user_id(&self, token: &str) -> Option<String>;
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LabError::InvalidRequest(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| LabError::InvalidRequest(format!("Invalid password hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// MRNs are non-empty and made of letters, digits and dashes
fn validate_mrn(mrn: &str) -> Result<()> {
    require!(
        !mrn.is_empty() && mrn.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
        LabError::InvalidRequest("Medical record number must be letters, digits or dashes".into())
    );
    Ok(())
}

/// In-process identity store
#[derive(Default)]
pub struct MemoryIdentityProvider {
    /// MRN -> password hash
    accounts: DashMap<String, String>,
    /// token -> MRN
    tokens: DashMap<String, String>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_token(&self, user_id: &str) -> AuthToken {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        AuthToken {
            token,
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn register(&self, medical_record_number: &str, birth_date: &str) -> Result<AuthToken> {
        let mrn = medical_record_number.trim();
        validate_mrn(mrn)?;
        require!(
            !birth_date.trim().is_empty(),
            LabError::InvalidRequest("Birth date is required".into())
        );

        let hash = hash_password(birth_date.trim())?;
        match self.accounts.entry(mrn.to_string()) {
            Entry::Occupied(_) => return Err(LabError::AlreadyRegistered(mrn.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(hash);
            }
        }

        tracing::info!(user_id = %mrn, "participant registered");
        Ok(self.issue_token(mrn))
    }

    async fn login(&self, medical_record_number: &str, password: &str) -> Result<AuthToken> {
        let mrn = medical_record_number.trim();
        let hash = self
            .accounts
            .get(mrn)
            .map(|h| h.value().clone())
            .ok_or(LabError::InvalidCredentials)?;

        if !verify_password(password.trim(), &hash)? {
            tracing::warn!(user_id = %mrn, "login failed");
            return Err(LabError::InvalidCredentials);
        }
        Ok(self.issue_token(mrn))
    }

    async fn change_password(&self, user_id: &str, current: &str, new: &str) -> Result<AuthToken> {
        require!(
            new.len() >= 6,
            LabError::InvalidRequest("New password must be at least 6 characters".into())
        );
        let hash = self
            .accounts
            .get(user_id)
            .map(|h| h.value().clone())
            .ok_or(LabError::Unauthorized)?;
        require!(verify_password(current, &hash)?, LabError::InvalidCredentials);

        let new_hash = hash_password(new)?;
        self.accounts.insert(user_id.to_string(), new_hash);
        let before = self.tokens.len();
        self.tokens.retain(|_, owner| owner.as_str() != user_id);
        tracing::info!(user_id = %user_id, revoked = before - self.tokens.len(), "password changed");
        Ok(self.issue_token(user_id))
    }

    async fn logout(&self, token: &str) {
        if let Some((_, user_id)) = self.tokens.remove(token) {
            tracing::info!(user_id = %user_id, "signed out");
        }
    }

    async fn current_user_id(&self, token: &str) -> Option<String> {
        self.tokens.get(token).map(|u| u.value().clone())
    }
}

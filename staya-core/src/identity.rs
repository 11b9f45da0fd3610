use std::fmt;
use std::str::FromStr;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use staya_shared::pii::Masked;
use staya_shared::validation::check;
use staya_shared::ValidationReport;

pub const RESET_CODE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
    Vendor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
            Role::Vendor => "vendor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            "vendor" => Ok(Role::Vendor),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Stored password hash is unreadable: {0}")]
    CorruptHash(String),
}

pub fn hash_password(password: &Masked<String>) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

pub fn verify_password(password: &Masked<String>, stored: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(stored).map_err(|e| CredentialError::CorruptHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.expose().as_bytes(), &parsed)
        .is_ok())
}

/// A registered account. The password hash and reset code never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub reset_code: Option<String>,
    #[serde(skip_serializing)]
    pub reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What other parties (including the account holder) get to see.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "First name is required and cannot be more than 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required and cannot be more than 50 characters"))]
    pub last_name: String,
    #[validate(custom(function = "staya_shared::validation::email_address"))]
    pub email: String,
    #[validate(custom(function = "staya_shared::validation::nigerian_phone"))]
    pub phone: String,
    #[validate(custom(function = "staya_shared::validation::password_policy"))]
    pub password: Masked<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50, message = "First name is required and cannot be more than 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name is required and cannot be more than 50 characters"))]
    pub last_name: Option<String>,
    #[validate(custom(function = "staya_shared::validation::nigerian_phone"))]
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl User {
    /// Validate a sign-up and hash its password. Admin accounts cannot be self-assigned.
    pub fn register(request: RegisterRequest, now: DateTime<Utc>) -> Result<User, RegistrationError> {
        check(&request)?;

        let role = request.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(ValidationReport::single("role", "Role admin cannot be self-assigned").into());
        }

        let password_hash = hash_password(&request.password)?;
        Ok(User {
            id: Uuid::new_v4(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            phone: request.phone.trim().to_string(),
            password_hash,
            role,
            avatar: None,
            is_verified: false,
            reset_code: None,
            reset_expires: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn check_password(&self, password: &Masked<String>) -> Result<bool, CredentialError> {
        verify_password(password, &self.password_hash)
    }

    /// Hash and store a new password, invalidating any outstanding reset code.
    pub fn set_password(&mut self, password: &Masked<String>, now: DateTime<Utc>) -> Result<(), RegistrationError> {
        staya_shared::validation::password_policy(password)
            .map_err(|_| ValidationReport::single("password", "Password must be at least 6 characters"))?;
        self.password_hash = hash_password(password)?;
        self.reset_code = None;
        self.reset_expires = None;
        self.updated_at = now;
        Ok(())
    }

    /// Issue a fresh six-digit reset code valid for ten minutes.
    pub fn issue_reset_code(&mut self, now: DateTime<Utc>) -> String {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.reset_code = Some(code.clone());
        self.reset_expires = Some(now + Duration::minutes(RESET_CODE_TTL_MINUTES));
        self.updated_at = now;
        code
    }

    pub fn reset_code_matches(&self, code: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_code, self.reset_expires) {
            (Some(stored), Some(expires)) => stored == code.trim() && now < expires,
            _ => false,
        }
    }

    pub fn apply_profile(&mut self, update: ProfileUpdate, now: DateTime<Utc>) -> Result<(), ValidationReport> {
        check(&update)?;
        if let Some(first_name) = update.first_name {
            self.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone.trim().to_string();
        }
        if let Some(avatar) = update.avatar {
            self.avatar = Some(avatar);
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn profile(&self) -> PublicProfile {
        PublicProfile::from(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Invalid(#[from] ValidationReport),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }

    pub(crate) fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(DomainError::Validation {
                field: "status",
                message: "must be 'active' or 'inactive'",
            }),
        }
    }

    pub(crate) fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) status: UserStatus,
    pub(crate) is_admin: bool,
    pub(crate) profile_picture: String,
    pub(crate) cover_picture: String,
    pub(crate) description: String,
    pub(crate) city: String,
    pub(crate) home_town: String,
    pub(crate) relationship: String,
    pub(crate) followers: Vec<i64>,
    pub(crate) followings: Vec<i64>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl RegisterRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username)?;
        let email = normalize_email(&self.email)?;
        validate_password(&self.password)?;
        Ok(Self {
            username,
            email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LoginRequest {
    /// Username or email.
    pub(crate) identifier: String,
    pub(crate) password: String,
}

impl LoginRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let identifier = self.identifier.trim();
        if identifier.is_empty() || identifier.len() > 50 {
            return Err(DomainError::Validation {
                field: "identifier",
                message: "must be 1..50 chars",
            });
        }
        if self.password.is_empty() {
            return Err(DomainError::Validation {
                field: "password",
                message: "must not be empty",
            });
        }
        Ok(Self {
            identifier: identifier.to_string(),
            password: self.password,
        })
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateUserRequest {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) home_town: Option<String>,
    pub(crate) relationship: Option<String>,
    pub(crate) profile_picture: Option<String>,
    pub(crate) cover_picture: Option<String>,
    pub(crate) status: Option<UserStatus>,
    pub(crate) is_admin: Option<bool>,
}

impl UpdateUserRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self
            .username
            .map(|value| normalize_username(&value))
            .transpose()?;
        let email = self.email.map(|value| normalize_email(&value)).transpose()?;
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        bounded_field("description", self.description.as_deref(), 80)?;
        bounded_field("city", self.city.as_deref(), 50)?;
        bounded_field("home_town", self.home_town.as_deref(), 50)?;
        Ok(Self {
            username,
            email,
            ..self
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.description.is_none()
            && self.city.is_none()
            && self.home_town.is_none()
            && self.relationship.is_none()
            && self.profile_picture.is_none()
            && self.cover_picture.is_none()
            && self.status.is_none()
            && self.is_admin.is_none()
    }
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    let len = username.chars().count();
    if len < 3 || len > 20 {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 3..20 chars",
        });
    }
    Ok(username.to_string())
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if email.len() > 50 || !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email of at most 50 chars",
        });
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    let len = password.chars().count();
    if len < 6 || len > 128 {
        return Err(DomainError::Validation {
            field: "password",
            message: "must be 6..128 chars",
        });
    }
    Ok(())
}

fn bounded_field(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), DomainError> {
    if let Some(value) = value
        && value.chars().count() > max
    {
        return Err(DomainError::Validation {
            field,
            message: "too long",
        });
    }
    Ok(())
}

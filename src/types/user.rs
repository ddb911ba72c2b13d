//! User-related types
//!
//! Users are built by a single constructor keyed by [`Role`]; there is no
//! per-role type hierarchy. Registration details are validated against the
//! same limits the user table enforces.

use super::error::LedgerError;
use super::ids::{AccountId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a document identifier
pub const MAX_DOCUMENT_ID_LEN: usize = 14;

/// Maximum length of a username
pub const MAX_USERNAME_LEN: usize = 50;

/// Maximum length of an email address
pub const MAX_EMAIL_LEN: usize = 100;

/// Role of a user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular bank client, may only operate their own account
    #[default]
    Client,

    /// Bank staff, may operate any account
    Manager,
}

impl Role {
    /// Whether users with this role are staff
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Manager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Manager => "manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "manager" => Ok(Role::Manager),
            other => Err(LedgerError::invalid_role(other)),
        }
    }
}

/// Registration details supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub document_id: String,
    pub username: String,
    pub email: String,
}

impl NewUser {
    /// Validate and normalize the details
    ///
    /// Every field is trimmed. Emails are compared case-insensitively, so they
    /// are lowercased here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserField` naming the first offending field.
    pub fn validate(self) -> Result<NewUser, LedgerError> {
        let name = required("name", &self.name)?;
        let document_id = required("document_id", &self.document_id)?;
        let username = required("username", &self.username)?;
        let email = required("email", &self.email)?.to_lowercase();

        max_len("document_id", &document_id, MAX_DOCUMENT_ID_LEN)?;
        max_len("username", &username, MAX_USERNAME_LEN)?;
        max_len("email", &email, MAX_EMAIL_LEN)?;

        if !email.contains('@') {
            return Err(LedgerError::invalid_user_field("email", "must contain '@'"));
        }

        Ok(NewUser {
            name,
            document_id,
            username,
            email,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid_user_field(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<(), LedgerError> {
    if value.chars().count() > max {
        return Err(LedgerError::invalid_user_field(
            field,
            &format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub document_id: String,
    pub username: String,
    pub email: String,
    pub role: Role,

    /// The user's single account, once opened
    pub account_id: Option<AccountId>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a user of the given role from already validated details
    pub fn with_role(details: NewUser, role: Role) -> Self {
        User {
            id: UserId::new(),
            name: details.name,
            document_id: details.document_id,
            username: details.username,
            email: details.email,
            role,
            account_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

//! User directory
//!
//! Holds every registered user and enforces uniqueness of document id, email
//! and username. The directory is an ordinary value: whoever builds the bank
//! owns it and hands it around, there is no process-wide instance.
//!
//! All three indexes sit behind one `RwLock` so a uniqueness check and the
//! insert that follows it happen atomically. Each user also gets a registration
//! sequence number, which fixes the listing order.

use crate::types::{AccountId, LedgerError, NewUser, Role, User, UserId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

#[derive(Debug)]
struct Registered {
    sequence: u64,
    user: User,
}

#[derive(Debug, Default)]
struct Directory {
    users: HashMap<UserId, Registered>,
    by_document: HashMap<String, UserId>,
    by_email: HashMap<String, UserId>,
    by_username: HashMap<String, UserId>,
    next_sequence: u64,
}

/// Registry of users
#[derive(Debug, Default)]
pub struct UserDirectory {
    inner: RwLock<Directory>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user with the given role
    ///
    /// # Errors
    ///
    /// - `InvalidUserField` if the details fail validation
    /// - `DuplicateUser` if the document id, email or username is taken
    ///   (checked in that order)
    pub fn register(&self, details: NewUser, role: Role) -> Result<User, LedgerError> {
        let details = details.validate()?;
        let mut directory = self.write();

        if directory.by_document.contains_key(&details.document_id) {
            return Err(LedgerError::duplicate_user(
                "document_id",
                &details.document_id,
            ));
        }
        if directory.by_email.contains_key(&details.email) {
            return Err(LedgerError::duplicate_user("email", &details.email));
        }
        if directory.by_username.contains_key(&details.username) {
            return Err(LedgerError::duplicate_user("username", &details.username));
        }

        let user = User::with_role(details, role);
        directory
            .by_document
            .insert(user.document_id.clone(), user.id);
        directory.by_email.insert(user.email.clone(), user.id);
        directory
            .by_username
            .insert(user.username.clone(), user.id);
        let sequence = directory.next_sequence;
        directory.next_sequence += 1;
        directory.users.insert(
            user.id,
            Registered {
                sequence,
                user: user.clone(),
            },
        );

        info!(user = %user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }

    /// Look a user up by id
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown id.
    pub fn get(&self, id: UserId) -> Result<User, LedgerError> {
        self.read()
            .users
            .get(&id)
            .map(|entry| entry.user.clone())
            .ok_or_else(|| LedgerError::user_not_found(id))
    }

    /// Look a user up by username
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown username.
    pub fn find_by_username(&self, username: &str) -> Result<User, LedgerError> {
        let username = username.trim();
        let directory = self.read();
        directory
            .by_username
            .get(username)
            .and_then(|id| directory.users.get(id))
            .map(|entry| entry.user.clone())
            .ok_or_else(|| LedgerError::user_not_found(username))
    }

    /// All users, oldest registration first
    pub fn list(&self) -> Vec<User> {
        let directory = self.read();
        let mut entries: Vec<&Registered> = directory.users.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries.into_iter().map(|entry| entry.user.clone()).collect()
    }

    /// Remove a user, returning its last state
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` for an unknown id.
    pub fn remove(&self, id: UserId) -> Result<User, LedgerError> {
        let mut directory = self.write();
        let user = directory
            .users
            .remove(&id)
            .map(|entry| entry.user)
            .ok_or_else(|| LedgerError::user_not_found(id))?;

        directory.by_document.remove(&user.document_id);
        directory.by_email.remove(&user.email);
        directory.by_username.remove(&user.username);

        info!(user = %id, username = %user.username, "User removed");
        Ok(user)
    }

    /// Attach an account to a user, opening it with `open` if the user has none
    ///
    /// `open` runs at most once per successful link, under the directory lock,
    /// so two concurrent calls for the same user cannot both open an account.
    ///
    /// # Returns
    ///
    /// The user's account id, new or existing
    ///
    /// # Errors
    ///
    /// - `UserNotFound` for an unknown id; `open` is not called then
    /// - whatever `open` fails with; the user stays without an account
    pub fn link_account<F>(&self, id: UserId, open: F) -> Result<AccountId, LedgerError>
    where
        F: FnOnce(UserId) -> Result<AccountId, LedgerError>,
    {
        let mut directory = self.write();
        let entry = directory
            .users
            .get_mut(&id)
            .ok_or_else(|| LedgerError::user_not_found(id))?;

        if let Some(existing) = entry.user.account_id {
            return Ok(existing);
        }

        let account_id = open(id)?;
        entry.user.account_id = Some(account_id);
        Ok(account_id)
    }

    fn read(&self) -> RwLockReadGuard<'_, Directory> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Directory> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn details(document_id: &str, username: &str, email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            document_id: document_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let directory = UserDirectory::new();

        let user = directory
            .register(details("111", "ada", "ada@example.com"), Role::Manager)
            .unwrap();

        assert_eq!(user.role, Role::Manager);
        assert_eq!(directory.get(user.id).unwrap(), user);
        assert_eq!(directory.find_by_username(" ada ").unwrap(), user);
    }

    #[rstest]
    #[case::document("111", "grace", "grace@example.com", "document_id")]
    #[case::email("222", "grace", "ADA@example.com", "email")]
    #[case::username("222", "ada", "grace@example.com", "username")]
    #[case::document_wins_over_email("111", "grace", "ada@example.com", "document_id")]
    fn test_register_duplicate(
        #[case] document_id: &str,
        #[case] username: &str,
        #[case] email: &str,
        #[case] field: &str,
    ) {
        let directory = UserDirectory::new();
        directory
            .register(details("111", "ada", "ada@example.com"), Role::Client)
            .unwrap();

        let err = directory
            .register(details(document_id, username, email), Role::Client)
            .unwrap_err();

        match err {
            LedgerError::DuplicateUser { field: actual, .. } => assert_eq!(actual, field),
            other => panic!("expected DuplicateUser, got {:?}", other),
        }
        assert_eq!(directory.list().len(), 1);
    }

    #[test]
    fn test_unknown_user() {
        let directory = UserDirectory::new();
        let id = UserId::new();

        assert_eq!(
            directory.get(id).unwrap_err(),
            LedgerError::user_not_found(id)
        );
        assert_eq!(
            directory.find_by_username("nobody").unwrap_err(),
            LedgerError::user_not_found("nobody")
        );
        assert!(directory.remove(id).is_err());
    }

    #[test]
    fn test_remove_frees_unique_values() {
        let directory = UserDirectory::new();
        let user = directory
            .register(details("111", "ada", "ada@example.com"), Role::Client)
            .unwrap();

        directory.remove(user.id).unwrap();

        assert!(directory
            .register(details("111", "ada", "ada@example.com"), Role::Client)
            .is_ok());
    }

    #[test]
    fn test_link_account_is_idempotent() {
        let directory = UserDirectory::new();
        let user = directory
            .register(details("111", "ada", "ada@example.com"), Role::Client)
            .unwrap();
        let mut opened = 0;

        let first = directory
            .link_account(user.id, |_| {
                opened += 1;
                Ok(AccountId::new())
            })
            .unwrap();
        let second = directory
            .link_account(user.id, |_| {
                opened += 1;
                Ok(AccountId::new())
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(opened, 1);
        assert_eq!(directory.get(user.id).unwrap().account_id, Some(first));
    }

    #[test]
    fn test_link_account_unknown_user_does_not_open() {
        let directory = UserDirectory::new();
        let mut opened = false;

        let result = directory.link_account(UserId::new(), |_| {
            opened = true;
            Ok(AccountId::new())
        });

        assert!(result.is_err());
        assert!(!opened);
    }

    #[test]
    fn test_failed_open_leaves_user_unlinked() {
        let directory = UserDirectory::new();
        let user = directory
            .register(details("111", "ada", "ada@example.com"), Role::Client)
            .unwrap();

        let err = directory
            .link_account(user.id, |_| Err(LedgerError::invalid_account_type("x")))
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_ACCOUNT_TYPE");
        assert_eq!(directory.get(user.id).unwrap().account_id, None);
    }

    #[test]
    fn test_list_follows_registration_order() {
        let directory = UserDirectory::new();
        for (document_id, username) in [("1", "carol"), ("2", "alice"), ("3", "bob")] {
            directory
                .register(
                    details(document_id, username, &format!("{}@example.com", username)),
                    Role::Client,
                )
                .unwrap();
        }

        let alice = directory.find_by_username("alice").unwrap();
        directory.remove(alice.id).unwrap();
        directory
            .register(details("4", "alice", "alice@example.com"), Role::Client)
            .unwrap();

        let names: Vec<String> = directory.list().into_iter().map(|u| u.username).collect();
        assert_eq!(names, ["carol", "bob", "alice"]);
    }
}

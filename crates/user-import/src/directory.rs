//! Persistence boundary for imported users.
//!
//! A [`UserDirectory`] answers uniqueness queries and stores users. The
//! import pipeline only talks to this trait; storage adapters implement it.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, warn};

use crate::uniqueness::{DuplicateUniqueField, UnexpectedUniqueViolation};
use crate::user::ImportedUser;

/// Store of user accounts keyed by unique login and email.
pub trait UserDirectory {
    /// Returns `true` when `login` already belongs to a stored user.
    fn login_exists(&self, login: &str) -> bool;

    /// Returns `true` when `email` already belongs to a stored user.
    fn email_exists(&self, email: &str) -> bool;

    /// Stores `user`.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateUniqueField`] when the store's own uniqueness
    /// constraint rejects the user.
    fn insert(&mut self, user: &ImportedUser) -> Result<(), DuplicateUniqueField>;
}

/// Failures from [`create_user_checked`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateUserError {
    /// The pre-check found a stored user holding the same unique value.
    #[error(transparent)]
    Duplicate(DuplicateUniqueField),

    /// The store rejected a user that the pre-check had cleared.
    #[error(transparent)]
    Unexpected(#[from] UnexpectedUniqueViolation),
}

/// Stores `user` after checking its login and then its email for conflicts.
///
/// # Errors
///
/// Returns [`CreateUserError::Duplicate`] when the login or email is already
/// taken, and [`CreateUserError::Unexpected`] when the insert itself reports
/// a conflict the pre-check did not see.
///
/// # Example
///
/// ```
/// # use chrono::NaiveDate;
/// # use uuid::Uuid;
/// use user_import::hash::hash;
/// use user_import::{
///     CreateUserError, ImportedUser, InMemoryUserDirectory, Sex, create_user_checked,
/// };
///
/// let user = ImportedUser {
///     id: Uuid::nil(),
///     login: "jjonas42".to_owned(),
///     first_name: "Justus".to_owned(),
///     last_name: "Jonas".to_owned(),
///     course: "9a".to_owned(),
///     sex: Sex::Male,
///     birthday: NaiveDate::from_ymd_opt(1998, 3, 4).expect("valid date"),
///     email: "justus@jonas.de".to_owned(),
///     password_digest: hash("secret"),
/// };
/// let mut directory = InMemoryUserDirectory::default();
///
/// create_user_checked(&mut directory, &user).expect("first insert succeeds");
/// let Err(CreateUserError::Duplicate(conflict)) = create_user_checked(&mut directory, &user)
/// else {
///     panic!("second insert must conflict");
/// };
/// assert_eq!(conflict.message(), "Username 'jjonas42' is already in use");
/// ```
pub fn create_user_checked<D>(directory: &mut D, user: &ImportedUser) -> Result<(), CreateUserError>
where
    D: UserDirectory + ?Sized,
{
    if directory.login_exists(&user.login) {
        warn!(login = %user.login, "login already in use");
        return Err(CreateUserError::Duplicate(DuplicateUniqueField::username(
            format!("Username '{}' is already in use", user.login),
        )));
    }
    if directory.email_exists(&user.email) {
        warn!(login = %user.login, "email already in use");
        return Err(CreateUserError::Duplicate(DuplicateUniqueField::email(
            format!("Email '{}' is already in use", user.email),
        )));
    }

    directory.insert(user).map_err(|cause| {
        error!(
            login = %user.login,
            field = %cause.field(),
            "insert reported a conflict the pre-check missed"
        );
        CreateUserError::Unexpected(UnexpectedUniqueViolation::new(cause))
    })
}

/// A [`UserDirectory`] held in memory.
///
/// Emails are compared case-insensitively; logins are compared exactly.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Vec<ImportedUser>,
    logins: HashSet<String>,
    emails: HashSet<String>,
}

impl InMemoryUserDirectory {
    /// Returns the stored users in insertion order.
    #[must_use]
    pub fn users(&self) -> &[ImportedUser] {
        &self.users
    }

    /// Returns the number of stored users.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` when no user is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Consumes the directory and returns its users.
    #[must_use]
    pub fn into_users(self) -> Vec<ImportedUser> {
        self.users
    }
}

fn email_key(email: &str) -> String {
    email.to_lowercase()
}

impl UserDirectory for InMemoryUserDirectory {
    fn login_exists(&self, login: &str) -> bool {
        self.logins.contains(login)
    }

    fn email_exists(&self, email: &str) -> bool {
        self.emails.contains(&email_key(email))
    }

    fn insert(&mut self, user: &ImportedUser) -> Result<(), DuplicateUniqueField> {
        if self.login_exists(&user.login) {
            return Err(DuplicateUniqueField::username(format!(
                "login '{}' violates the unique login constraint",
                user.login
            )));
        }
        if self.email_exists(&user.email) {
            return Err(DuplicateUniqueField::email(format!(
                "email '{}' violates the unique email constraint",
                user.email
            )));
        }
        self.logins.insert(user.login.clone());
        self.emails.insert(email_key(&user.email));
        self.users.push(user.clone());
        Ok(())
    }
}

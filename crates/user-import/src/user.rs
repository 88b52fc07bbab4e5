//! Imported user record types.
//!
//! These types are the pipeline's output. They stay independent of any
//! storage schema and are converted by the directory that persists them.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::hash::PasswordDigest;

/// Sex recorded for an imported user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Roster code `1`.
    Female,
    /// Roster code `2`.
    Male,
    /// Any other roster code.
    #[default]
    Unset,
}

impl Sex {
    /// Decodes a roster sex code.
    ///
    /// # Example
    ///
    /// ```
    /// use user_import::Sex;
    ///
    /// assert_eq!(Sex::from_code(1), Sex::Female);
    /// assert_eq!(Sex::from_code(2), Sex::Male);
    /// assert_eq!(Sex::from_code(9), Sex::Unset);
    /// ```
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Female,
            2 => Self::Male,
            _ => Self::Unset,
        }
    }
}

/// A user assembled from one roster line.
///
/// Only the password digest is kept; the plaintext travels separately in an
/// [`IssuedCredential`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedUser {
    /// Unique identifier for the user.
    pub id: Uuid,
    /// Generated login handle.
    pub login: String,
    /// Given name as written in the roster.
    pub first_name: String,
    /// Family name as written in the roster.
    pub last_name: String,
    /// Course or class the user belongs to.
    pub course: String,
    /// Decoded sex code.
    pub sex: Sex,
    /// Date of birth.
    pub birthday: NaiveDate,
    /// Contact email address.
    pub email: String,
    /// Digest of the generated password.
    pub password_digest: PasswordDigest,
}

/// Login and plaintext password handed to a newly imported user.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    /// Roster line the user came from.
    pub line: usize,
    /// Generated login handle.
    pub login: String,
    /// Generated plaintext password.
    pub password: String,
    /// Email address the credential is sent to.
    pub email: String,
}

impl fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCredential")
            .field("line", &self.line)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("email", &self.email)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::hash::hash;

    use super::*;

    #[test]
    fn sex_defaults_to_unset() {
        assert_eq!(Sex::default(), Sex::Unset);
    }

    #[test]
    fn sex_serializes_lowercase() {
        let female = serde_json::to_string(&Sex::Female).expect("serialize");
        let unset = serde_json::to_string(&Sex::Unset).expect("serialize");
        assert_eq!(female, "\"female\"");
        assert_eq!(unset, "\"unset\"");
    }

    #[test]
    fn imported_user_serializes_to_camel_case() {
        let user = ImportedUser {
            id: Uuid::nil(),
            login: "jjonas42".to_owned(),
            first_name: "Justus".to_owned(),
            last_name: "Jonas".to_owned(),
            course: "9a".to_owned(),
            sex: Sex::Male,
            birthday: NaiveDate::from_ymd_opt(1998, 3, 4).expect("valid date"),
            email: "justus@jonas.de".to_owned(),
            password_digest: hash("secret"),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(json.contains("\"firstName\":\"Justus\""));
        assert!(json.contains("\"birthday\":\"1998-03-04\""));
        assert!(json.contains("passwordDigest"));
        assert!(!json.contains("secret"));
    }

    #[test]
    fn credential_debug_redacts_password() {
        let credential = IssuedCredential {
            line: 1,
            login: "jjonas42".to_owned(),
            password: "Xk7#pQ2@".to_owned(),
            email: "justus@jonas.de".to_owned(),
        };
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("jjonas42"));
        assert!(!rendered.contains("Xk7#pQ2@"));
    }
}

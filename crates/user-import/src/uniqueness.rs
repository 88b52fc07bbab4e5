//! Signals for violated uniqueness constraints.
//!
//! [`DuplicateUniqueField`] is the expected, recoverable conflict a directory
//! reports when a value declared unique already exists. The caller may
//! regenerate a login or ask for another email.
//!
//! [`UnexpectedUniqueViolation`] wraps such a conflict when it arrives after
//! the caller already checked that the value was free. That points at a
//! check-then-act race or a broken pre-check and must not be retried blindly.

use std::fmt;

use thiserror::Error;

use crate::error::ArgumentError;
use crate::precondition::require_present;

/// Attribute whose uniqueness was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueField {
    /// Login handle of a user.
    Username,
    /// Email address of a user.
    Email,
    /// Name of a page.
    PageName,
    /// Name of a template.
    TemplateName,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::PageName => "page name",
            Self::TemplateName => "template name",
        };
        f.write_str(label)
    }
}

/// A value declared unique already exists.
///
/// # Example
///
/// ```
/// use user_import::{DuplicateUniqueField, UniqueField};
///
/// let err = DuplicateUniqueField::username("Username 'jjonas42' is already in use");
/// assert_eq!(err.field(), UniqueField::Username);
/// assert_eq!(err.to_string(), "Username 'jjonas42' is already in use");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DuplicateUniqueField {
    field: UniqueField,
    message: String,
}

impl DuplicateUniqueField {
    /// Creates a conflict for an arbitrary field kind.
    pub fn new(field: UniqueField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Creates a username conflict.
    pub fn username(message: impl Into<String>) -> Self {
        Self::new(UniqueField::Username, message)
    }

    /// Creates an email conflict.
    pub fn email(message: impl Into<String>) -> Self {
        Self::new(UniqueField::Email, message)
    }

    /// Creates a page name conflict.
    pub fn page_name(message: impl Into<String>) -> Self {
        Self::new(UniqueField::PageName, message)
    }

    /// Creates a template name conflict.
    pub fn template_name(message: impl Into<String>) -> Self {
        Self::new(UniqueField::TemplateName, message)
    }

    /// Returns the field kind that collided.
    #[must_use]
    pub const fn field(&self) -> UniqueField {
        self.field
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A duplicate reported after the caller verified the value was unique.
///
/// The type always carries its cause. Treat it as fatal for the current
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected unique violation on {}: {cause}", .cause.field())]
pub struct UnexpectedUniqueViolation {
    #[source]
    cause: DuplicateUniqueField,
}

impl UnexpectedUniqueViolation {
    /// Wraps the conflict that contradicted the caller's pre-check.
    #[must_use]
    pub const fn new(cause: DuplicateUniqueField) -> Self {
        Self { cause }
    }

    /// Wraps a conflict that may be absent, e.g. one taken from an optional
    /// slot.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::MissingValue`] when `cause` is `None`.
    pub fn try_from_cause(cause: Option<DuplicateUniqueField>) -> Result<Self, ArgumentError> {
        require_present(cause).map(Self::new)
    }

    /// Returns the wrapped conflict.
    #[must_use]
    pub const fn cause(&self) -> &DuplicateUniqueField {
        &self.cause
    }

    /// Unwraps the conflict.
    #[must_use]
    pub fn into_cause(self) -> DuplicateUniqueField {
        self.cause
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(DuplicateUniqueField::username("u"), UniqueField::Username)]
    #[case(DuplicateUniqueField::email("e"), UniqueField::Email)]
    #[case(DuplicateUniqueField::page_name("p"), UniqueField::PageName)]
    #[case(DuplicateUniqueField::template_name("t"), UniqueField::TemplateName)]
    fn constructors_tag_the_field(#[case] err: DuplicateUniqueField, #[case] field: UniqueField) {
        assert_eq!(err.field(), field);
    }

    #[test]
    fn duplicate_displays_its_message() {
        let err = DuplicateUniqueField::email("Email 'justus@jonas.de' is already in use");
        assert_eq!(err.message(), "Email 'justus@jonas.de' is already in use");
        assert_eq!(err.to_string(), err.message());
    }

    #[test]
    fn unexpected_violation_exposes_cause_as_source() {
        let cause = DuplicateUniqueField::username("Username 'pshaw01' is already in use");
        let err = UnexpectedUniqueViolation::new(cause.clone());

        assert_eq!(err.cause(), &cause);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some(cause.message()));
        assert_eq!(
            err.to_string(),
            "unexpected unique violation on username: Username 'pshaw01' is already in use"
        );
    }

    #[test]
    fn unexpected_violation_requires_a_cause() {
        let result = UnexpectedUniqueViolation::try_from_cause(None);
        assert_eq!(
            result,
            Err(ArgumentError::MissingValue {
                path: "$".to_owned()
            })
        );
    }

    #[test]
    fn unexpected_violation_accepts_present_cause() {
        let cause = DuplicateUniqueField::page_name("Page 'home' exists");
        let err = UnexpectedUniqueViolation::try_from_cause(Some(cause.clone()))
            .expect("cause is present");
        assert_eq!(err.into_cause(), cause);
    }
}

//! Import configuration loaded via OrthoConfig.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::credentials::{
    DEFAULT_CLASS_MINIMUM, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH, PasswordPolicy,
};
use crate::error::ArgumentError;
use crate::import::ColumnLayout;

/// Configuration values controlling roster layout and password generation.
///
/// Every value is optional; unset values fall back to the standard roster
/// export and the default password policy.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_IMPORT")]
pub struct ImportSettings {
    /// Number of columns each roster line must hold.
    pub column_count: Option<usize>,
    /// Column holding the family name.
    pub last_name_column: Option<usize>,
    /// Column holding the given name.
    pub first_name_column: Option<usize>,
    /// Column holding the course.
    pub course_column: Option<usize>,
    /// Column holding the sex code.
    pub sex_column: Option<usize>,
    /// Column holding the birthday.
    pub birthday_column: Option<usize>,
    /// Column holding the email address.
    pub email_column: Option<usize>,
    /// Shortest generated password.
    pub password_min_length: Option<i32>,
    /// Longest generated password.
    pub password_max_length: Option<i32>,
    /// Minimum lowercase letters per password.
    pub min_lowercase: Option<i32>,
    /// Minimum uppercase letters per password.
    pub min_uppercase: Option<i32>,
    /// Minimum digits per password.
    pub min_digits: Option<i32>,
    /// Minimum special characters per password.
    pub min_special: Option<i32>,
}

impl ImportSettings {
    /// Return the configured column layout, falling back to the standard
    /// roster export for unset positions.
    #[must_use]
    pub fn layout(&self) -> ColumnLayout {
        let defaults = ColumnLayout::default();
        ColumnLayout {
            column_count: self.column_count.unwrap_or(defaults.column_count),
            last_name: self.last_name_column.unwrap_or(defaults.last_name),
            first_name: self.first_name_column.unwrap_or(defaults.first_name),
            course: self.course_column.unwrap_or(defaults.course),
            sex: self.sex_column.unwrap_or(defaults.sex),
            birthday: self.birthday_column.unwrap_or(defaults.birthday),
            email: self.email_column.unwrap_or(defaults.email),
        }
    }

    /// Return the configured password policy.
    ///
    /// # Errors
    ///
    /// Propagates [`PasswordPolicy::new`] errors for unusable length ranges.
    pub fn password_policy(&self) -> Result<PasswordPolicy, ArgumentError> {
        PasswordPolicy::new(
            self.password_min_length.unwrap_or(DEFAULT_MIN_LENGTH),
            self.password_max_length.unwrap_or(DEFAULT_MAX_LENGTH),
            self.min_lowercase.unwrap_or(DEFAULT_CLASS_MINIMUM),
            self.min_uppercase.unwrap_or(DEFAULT_CLASS_MINIMUM),
            self.min_digits.unwrap_or(DEFAULT_CLASS_MINIMUM),
            self.min_special.unwrap_or(DEFAULT_CLASS_MINIMUM),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for import configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARIABLES: [&str; 13] = [
        "USER_IMPORT_COLUMN_COUNT",
        "USER_IMPORT_LAST_NAME_COLUMN",
        "USER_IMPORT_FIRST_NAME_COLUMN",
        "USER_IMPORT_COURSE_COLUMN",
        "USER_IMPORT_SEX_COLUMN",
        "USER_IMPORT_BIRTHDAY_COLUMN",
        "USER_IMPORT_EMAIL_COLUMN",
        "USER_IMPORT_PASSWORD_MIN_LENGTH",
        "USER_IMPORT_PASSWORD_MAX_LENGTH",
        "USER_IMPORT_MIN_LOWERCASE",
        "USER_IMPORT_MIN_UPPERCASE",
        "USER_IMPORT_MIN_DIGITS",
        "USER_IMPORT_MIN_SPECIAL",
    ];

    fn environment(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARIABLES
            .iter()
            .map(|&name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value).to_owned());
                (name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> ImportSettings {
        ImportSettings::load_from_iter([OsString::from("user-import")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(environment(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.layout(), ColumnLayout::default());
        assert_eq!(settings.password_policy(), Ok(PasswordPolicy::default()));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(environment(&[
            ("USER_IMPORT_COLUMN_COUNT", "6"),
            ("USER_IMPORT_EMAIL_COLUMN", "5"),
            ("USER_IMPORT_PASSWORD_MIN_LENGTH", "12"),
            ("USER_IMPORT_PASSWORD_MAX_LENGTH", "12"),
            ("USER_IMPORT_MIN_SPECIAL", "3"),
        ]));

        let settings = load_from_empty_args();
        let layout = settings.layout();
        assert_eq!(layout.column_count, 6);
        assert_eq!(layout.email, 5);
        assert_eq!(layout.first_name, ColumnLayout::default().first_name);

        let policy = settings.password_policy().expect("valid policy");
        assert_eq!(policy.min_length(), 12);
        assert_eq!(policy.max_length(), 12);
        assert_eq!(policy.min_special(), 3);
        assert_eq!(policy.min_digit(), 1);
    }

    #[rstest]
    fn inverted_length_range_is_reported() {
        let _guard = lock_env(environment(&[
            ("USER_IMPORT_PASSWORD_MIN_LENGTH", "20"),
            ("USER_IMPORT_PASSWORD_MAX_LENGTH", "10"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.password_policy(),
            Err(ArgumentError::InvertedRange { min: 20, max: 10 })
        );
    }
}

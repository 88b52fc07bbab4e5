//! Bulk user import with strict record parsing and credential generation.
//!
//! This crate reads fixed-schema, comma-delimited rosters and turns each line
//! into a user account with a generated login and password. The pieces are
//! usable on their own:
//!
//! - [`RecordParser`] reads lines with an exact column count and typed
//!   field accessors
//! - [`generate_login`] and [`generate_password`] derive credentials
//! - [`hash::hash`] produces the stored password digest
//! - [`precondition`] offers reusable argument checks that report the
//!   location of the first absent or blank element
//! - [`DuplicateUniqueField`] and [`UnexpectedUniqueViolation`] describe
//!   uniqueness conflicts at the persistence boundary
//!
//! [`import_users`] wires them together against any [`UserDirectory`].
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//!
//! use user_import::RecordParser;
//!
//! let line = "Jonas,,,,,,,Justus,,9a,2,,19980304,justus@jonas.de\n";
//! let mut parser = RecordParser::new(Cursor::new(line), 14).expect("columns > 0");
//!
//! assert!(parser.advance().expect("line is well formed"));
//! assert_eq!(parser.get_string(7), "Justus");
//! assert_eq!(parser.get_int(10).expect("integer"), 2);
//! assert!(!parser.advance().expect("end of input"));
//! ```

mod config;
mod credentials;
mod directory;
mod error;
pub mod hash;
mod import;
pub mod precondition;
mod record;
mod uniqueness;
mod user;

pub use config::ImportSettings;
pub use credentials::{
    CharacterClass, DEFAULT_CLASS_MINIMUM, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH,
    LOGIN_MAX_LENGTH, LOGIN_MIN_LENGTH, MAX_LOGIN_ATTEMPTS, MAX_PASSWORD_LENGTH, PasswordPolicy,
    generate_available_login, generate_login, generate_login_variant, generate_password,
    generate_password_with_rng,
};
pub use directory::{CreateUserError, InMemoryUserDirectory, UserDirectory, create_user_checked};
pub use error::{ArgumentError, FormatError, GenerationError, ImportError};
pub use import::{ColumnLayout, DEFAULT_COLUMN_COUNT, ImportReport, import_users};
pub use record::{RecordParser, Row};
pub use uniqueness::{DuplicateUniqueField, UnexpectedUniqueViolation, UniqueField};
pub use user::{ImportedUser, IssuedCredential, Sex};

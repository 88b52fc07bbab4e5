//! Error types for the user-import crate.
//!
//! This module defines semantic error enums for argument validation, record
//! parsing, credential generation and the batch import, following the
//! project's error handling conventions with `thiserror`.

use thiserror::Error;

use crate::uniqueness::{DuplicateUniqueField, UnexpectedUniqueViolation};

/// Invalid-argument failures raised by precondition checks.
///
/// Every variant is raised by the call that received the bad input; nothing
/// is partially applied before the error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required value, or an element nested inside one, is absent.
    #[error("value at {path} is missing")]
    MissingValue {
        /// Locator of the missing element, `$` being the value itself.
        path: String,
    },

    /// A string, or a string nested inside a container, is empty or blank.
    #[error("value at {path} is empty or blank")]
    BlankValue {
        /// Locator of the blank element, `$` being the value itself.
        path: String,
    },

    /// A number that must be zero or positive was negative.
    #[error("value must not be negative, found {value}")]
    Negative {
        /// The rejected value rendered as text.
        value: String,
    },

    /// A length range whose lower bound exceeds its upper bound.
    #[error("minimum length {min} exceeds maximum length {max}")]
    InvertedRange {
        /// Requested minimum length.
        min: i32,
        /// Requested maximum length.
        max: i32,
    },

    /// A maximum length beyond what the generator will produce.
    #[error("maximum length {max} exceeds the limit of {limit}")]
    LengthTooLarge {
        /// Requested maximum length.
        max: i32,
        /// Largest supported length.
        limit: usize,
    },

    /// A length range that only admits zero characters.
    #[error("minimum and maximum length must not both be zero")]
    ZeroLength,

    /// A record schema declared without any columns.
    #[error("column count must be at least one")]
    ZeroColumns,

    /// A column index that lies outside the declared schema.
    #[error("column {column} is outside the {column_count} column schema")]
    ColumnOutOfRange {
        /// Offending column index.
        column: usize,
        /// Declared number of columns.
        column_count: usize,
    },
}

/// Invalid-format failures raised while reading fixed-schema records.
///
/// Line numbers are one-based; column indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// A line split into a different number of fields than configured.
    #[error("line {line} has {actual} columns, expected {expected}")]
    ColumnCount {
        /// Line that failed to split.
        line: usize,
        /// Configured column count.
        expected: usize,
        /// Number of fields found on the line.
        actual: usize,
    },

    /// A field expected to hold a base-10 integer did not.
    #[error("line {line}, column {column}: '{value}' is not an integer")]
    InvalidInteger {
        /// Line holding the field.
        line: usize,
        /// Column index of the field.
        column: usize,
        /// Raw field text.
        value: String,
    },

    /// A field expected to hold a `yyyyMMdd` date did not.
    #[error("line {line}, column {column}: '{value}' is not a yyyyMMdd date")]
    InvalidDate {
        /// Line holding the field.
        line: usize,
        /// Column index of the field.
        column: usize,
        /// Raw field text.
        value: String,
    },

    /// The underlying stream failed or yielded text that is not UTF-8.
    #[error("failed to read line {line}: {message}")]
    Read {
        /// Line that could not be read.
        line: usize,
        /// Description of the I/O error.
        message: String,
    },
}

/// Errors that can occur during credential generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The generator rejected its inputs.
    #[error(transparent)]
    InvalidArgument(#[from] ArgumentError),

    /// Every login derivation for a name pair is already taken.
    #[error("failed to find a free login after {max_attempts} attempts")]
    LoginSpaceExhausted {
        /// Number of derivations tried before giving up.
        max_attempts: u32,
    },
}

/// Errors that stop a batch import.
///
/// The batch stops at the first error; records created before it stay with
/// the directory, which owns any rollback policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// The column layout does not fit its own schema.
    #[error("invalid column layout: {0}")]
    InvalidLayout(#[source] ArgumentError),

    /// The input stream held a malformed line.
    #[error("malformed input: {0}")]
    Format(#[from] FormatError),

    /// A record carried a value the pipeline cannot accept.
    #[error("line {line}: {source}")]
    InvalidRecord {
        /// Line of the offending record.
        line: usize,
        /// Precondition that failed.
        #[source]
        source: ArgumentError,
    },

    /// Credentials could not be generated for a record.
    #[error("line {line}: {source}")]
    Generation {
        /// Line of the offending record.
        line: usize,
        /// Generation failure.
        #[source]
        source: GenerationError,
    },

    /// A record collides with an existing unique value.
    #[error("line {line}: {source}")]
    Duplicate {
        /// Line of the offending record.
        line: usize,
        /// Conflict reported by the directory.
        #[source]
        source: DuplicateUniqueField,
    },

    /// The directory reported a conflict that its own pre-check missed.
    #[error(transparent)]
    UnexpectedViolation(#[from] UnexpectedUniqueViolation),
}

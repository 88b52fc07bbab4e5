//! Strict reader for fixed-schema, comma-delimited records.
//!
//! Every line must split on `,` into exactly the configured number of
//! columns. There is no quoting or escaping, so a field can never contain a
//! comma. Lines are checked as they are read: the first malformed line fails
//! [`RecordParser::advance`] and leaves the parser in a failed state, so no
//! further rows are ever produced from that stream.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use user_import::RecordParser;
//!
//! let input = "Jonas,Justus,9a,19980304\n";
//! let mut parser = RecordParser::new(input.as_bytes(), 4).expect("valid column count");
//!
//! assert_eq!(parser.advance(), Ok(true));
//! assert_eq!(parser.get_string(1), "Justus");
//! assert_eq!(
//!     parser.get_date(3),
//!     Ok(NaiveDate::from_ymd_opt(1998, 3, 4).expect("valid date"))
//! );
//! assert_eq!(parser.advance(), Ok(false));
//! ```

use std::io::BufRead;
use std::mem;

use chrono::NaiveDate;

use crate::error::{ArgumentError, FormatError};

/// Field separator.
const DELIMITER: char = ',';

/// Length of a `yyyyMMdd` date field.
const DATE_LENGTH: usize = 8;

/// One parsed line: its fields in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    line: usize,
    fields: Vec<String>,
}

impl Row {
    /// Returns the one-based line number the row was read from.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the row holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the raw text at `index`, untrimmed.
    ///
    /// # Panics
    ///
    /// Panics when `index` is beyond the row's columns.
    #[must_use]
    pub fn get_string(&self, index: usize) -> &str {
        match self.fields.get(index) {
            Some(field) => field,
            None => panic!(
                "column {index} is outside the {} column schema",
                self.fields.len()
            ),
        }
    }

    /// Parses the text at `index` as a base-10 integer.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidInteger`] for anything but an optionally
    /// signed run of ASCII digits that fits in an `i64`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is beyond the row's columns.
    pub fn get_int(&self, index: usize) -> Result<i64, FormatError> {
        let text = self.get_string(index);
        text.parse().map_err(|_| FormatError::InvalidInteger {
            line: self.line,
            column: index,
            value: text.to_owned(),
        })
    }

    /// Parses the text at `index` as a `yyyyMMdd` calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidDate`] unless the field is exactly eight
    /// ASCII digits naming a real calendar day.
    ///
    /// # Panics
    ///
    /// Panics when `index` is beyond the row's columns.
    pub fn get_date(&self, index: usize) -> Result<NaiveDate, FormatError> {
        let text = self.get_string(index);
        parse_compact_date(text).ok_or_else(|| FormatError::InvalidDate {
            line: self.line,
            column: index,
            value: text.to_owned(),
        })
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Active(Row),
    Exhausted,
    Failed(FormatError),
}

/// Sequential reader of fixed-schema records.
///
/// One parser performs one forward scan; it is not meant to be shared
/// between threads.
#[derive(Debug)]
pub struct RecordParser<R> {
    reader: R,
    column_count: usize,
    lines_read: usize,
    state: State,
}

impl<R: BufRead> RecordParser<R> {
    /// Creates a parser expecting `column_count` fields on every line.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::ZeroColumns`] when `column_count` is zero.
    pub fn new(reader: R, column_count: usize) -> Result<Self, ArgumentError> {
        if column_count == 0 {
            return Err(ArgumentError::ZeroColumns);
        }
        Ok(Self {
            reader,
            column_count,
            lines_read: 0,
            state: State::Idle,
        })
    }

    /// Returns the configured column count.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    /// Reads and splits the next line.
    ///
    /// Returns `Ok(true)` when a row is now active and `Ok(false)` once the
    /// stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::ColumnCount`] when the line does not split into
    /// the configured number of columns and [`FormatError::Read`] when the
    /// stream fails. Once failed, every later call returns the same error.
    pub fn advance(&mut self) -> Result<bool, FormatError> {
        match &self.state {
            State::Failed(err) => return Err(err.clone()),
            State::Exhausted => return Ok(false),
            State::Idle | State::Active(_) => {}
        }

        let line = self.lines_read + 1;
        let mut buffer = String::new();
        let read = match self.reader.read_line(&mut buffer) {
            Ok(read) => read,
            Err(err) => {
                return self.fail(FormatError::Read {
                    line,
                    message: err.to_string(),
                });
            }
        };
        if read == 0 {
            self.state = State::Exhausted;
            return Ok(false);
        }
        self.lines_read = line;

        let text = strip_line_ending(&buffer);
        let fields: Vec<String> = text.split(DELIMITER).map(str::to_owned).collect();
        if fields.len() != self.column_count {
            return self.fail(FormatError::ColumnCount {
                line,
                expected: self.column_count,
                actual: fields.len(),
            });
        }

        self.state = State::Active(Row { line, fields });
        Ok(true)
    }

    /// Returns the active row, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Row> {
        match &self.state {
            State::Active(row) => Some(row),
            State::Idle | State::Exhausted | State::Failed(_) => None,
        }
    }

    /// Returns the raw text at `index` of the active row.
    ///
    /// # Panics
    ///
    /// Panics without an active row or when `index` is out of range.
    #[must_use]
    pub fn get_string(&self, index: usize) -> &str {
        self.active_row().get_string(index)
    }

    /// Parses `index` of the active row as a base-10 integer.
    ///
    /// # Errors
    ///
    /// See [`Row::get_int`].
    ///
    /// # Panics
    ///
    /// Panics without an active row or when `index` is out of range.
    pub fn get_int(&self, index: usize) -> Result<i64, FormatError> {
        self.active_row().get_int(index)
    }

    /// Parses `index` of the active row as a `yyyyMMdd` date.
    ///
    /// # Errors
    ///
    /// See [`Row::get_date`].
    ///
    /// # Panics
    ///
    /// Panics without an active row or when `index` is out of range.
    pub fn get_date(&self, index: usize) -> Result<NaiveDate, FormatError> {
        self.active_row().get_date(index)
    }

    fn active_row(&self) -> &Row {
        match self.current() {
            Some(row) => row,
            None => panic!("no active row: advance() must succeed before reading fields"),
        }
    }

    fn fail(&mut self, err: FormatError) -> Result<bool, FormatError> {
        self.state = State::Failed(err.clone());
        Err(err)
    }
}

/// Yields owned rows; iteration ends after the first error.
impl<R: BufRead> Iterator for RecordParser<R> {
    type Item = Result<Row, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Failed(_)) {
            return None;
        }
        match self.advance() {
            Ok(true) => match mem::replace(&mut self.state, State::Idle) {
                State::Active(row) => Some(Ok(row)),
                State::Idle | State::Exhausted | State::Failed(_) => None,
            },
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

fn strip_line_ending(line: &str) -> &str {
    let without_newline = line.strip_suffix('\n').unwrap_or(line);
    without_newline
        .strip_suffix('\r')
        .unwrap_or(without_newline)
}

fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    if text.len() != DATE_LENGTH || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let year = text.get(0..4)?.parse().ok()?;
    let month = text.get(4..6)?.parse().ok()?;
    let day = text.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

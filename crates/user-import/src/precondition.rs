//! Fail-fast validators applied to inputs before any component proceeds.
//!
//! Absence is modelled as [`Option::None`]. The validators walk a value of
//! any nesting depth (sequences, sets, map values, options of containers of
//! options...) and reject it when an absent element appears anywhere inside
//! it. [`require_non_empty`] additionally rejects empty or whitespace-only
//! strings at any depth.
//!
//! Values are only inspected, never copied: each validator hands its argument
//! back unchanged on success.
//!
//! # Example
//!
//! ```
//! use user_import::precondition::{require_non_empty, require_non_null};
//!
//! let names = vec![vec![Some("Justus"), Some("  ")]];
//! assert!(require_non_null(&names).is_ok());
//! assert!(require_non_empty(&names).is_err());
//!
//! let gaps = vec![Some("Peter"), None];
//! assert!(require_non_null(&gaps).is_err());
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ArgumentError;

/// Locator of the value handed to a validator.
const ROOT_PATH: &str = "$";

/// How a value presents itself to the validators.
pub enum Shape<'a> {
    /// The value is absent.
    Absent,
    /// The value is text and may be checked for blankness.
    Text(&'a str),
    /// The value has no inner structure worth inspecting.
    Scalar,
    /// The value is a positional container.
    Sequence(Vec<&'a dyn Inspect>),
    /// The value maps rendered keys to inspected values.
    Keyed(Vec<(String, &'a dyn Inspect)>),
}

/// Types the precondition validators can walk.
///
/// Implementations describe one level of structure; the validators do the
/// traversal with an explicit stack, so nesting depth is unbounded by the
/// call stack.
pub trait Inspect {
    /// Describes the outermost level of this value.
    fn shape(&self) -> Shape<'_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strictness {
    NonNull,
    NonEmpty,
}

/// Returns `value` unchanged when it is zero or positive.
///
/// # Errors
///
/// Returns [`ArgumentError::Negative`] when `value` is below zero.
///
/// # Example
///
/// ```
/// use user_import::precondition::require_non_negative;
///
/// assert_eq!(require_non_negative(95), Ok(95));
/// assert_eq!(require_non_negative(0), Ok(0));
/// assert!(require_non_negative(-1).is_err());
/// ```
pub fn require_non_negative<T>(value: T) -> Result<T, ArgumentError>
where
    T: PartialOrd + Default + fmt::Display,
{
    if value < T::default() {
        return Err(ArgumentError::Negative {
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Returns `value` unchanged when neither it nor anything inside it is
/// absent.
///
/// Blank strings are accepted.
///
/// # Errors
///
/// Returns [`ArgumentError::MissingValue`] naming the first absent element.
pub fn require_non_null<T: Inspect>(value: T) -> Result<T, ArgumentError> {
    walk(&value, Strictness::NonNull)?;
    Ok(value)
}

/// Returns `value` unchanged when nothing inside it is absent, empty or
/// whitespace-only.
///
/// # Errors
///
/// Returns [`ArgumentError::MissingValue`] or [`ArgumentError::BlankValue`]
/// naming the first offending element.
pub fn require_non_empty<T: Inspect>(value: T) -> Result<T, ArgumentError> {
    walk(&value, Strictness::NonEmpty)?;
    Ok(value)
}

/// Unwraps an optional value.
///
/// # Errors
///
/// Returns [`ArgumentError::MissingValue`] when `value` is `None`.
pub fn require_present<T>(value: Option<T>) -> Result<T, ArgumentError> {
    value.ok_or_else(|| ArgumentError::MissingValue {
        path: ROOT_PATH.to_owned(),
    })
}

fn walk(root: &dyn Inspect, strictness: Strictness) -> Result<(), ArgumentError> {
    let mut pending: Vec<(String, &dyn Inspect)> = vec![(ROOT_PATH.to_owned(), root)];

    while let Some((path, value)) = pending.pop() {
        match value.shape() {
            Shape::Absent => return Err(ArgumentError::MissingValue { path }),
            Shape::Text(text) => {
                if strictness == Strictness::NonEmpty && text.trim().is_empty() {
                    return Err(ArgumentError::BlankValue { path });
                }
            }
            Shape::Scalar => {}
            Shape::Sequence(items) => {
                // Reversed so elements are visited in their natural order.
                for (index, item) in items.into_iter().enumerate().rev() {
                    pending.push((format!("{path}[{index}]"), item));
                }
            }
            Shape::Keyed(entries) => {
                for (key, item) in entries.into_iter().rev() {
                    pending.push((format!("{path}[{key}]"), item));
                }
            }
        }
    }

    Ok(())
}

fn sequence<'a, T, I>(items: I) -> Shape<'a>
where
    T: Inspect + 'a,
    I: IntoIterator<Item = &'a T>,
{
    Shape::Sequence(
        items
            .into_iter()
            .map(|item| item as &dyn Inspect)
            .collect(),
    )
}

fn keyed<'a, K, V, I>(entries: I) -> Shape<'a>
where
    K: fmt::Debug + 'a,
    V: Inspect + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    Shape::Keyed(
        entries
            .into_iter()
            .map(|(key, value)| (format!("{key:?}"), value as &dyn Inspect))
            .collect(),
    )
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Inspect for $ty {
                fn shape(&self) -> Shape<'_> {
                    Shape::Scalar
                }
            }
        )*
    };
}

impl_scalar!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    NaiveDate,
    Uuid,
);

impl Inspect for str {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(self)
    }
}

impl Inspect for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Text(self)
    }
}

impl<T: Inspect> Inspect for Option<T> {
    fn shape(&self) -> Shape<'_> {
        match self {
            Some(value) => value.shape(),
            None => Shape::Absent,
        }
    }
}

impl<T: Inspect + ?Sized> Inspect for &T {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
}

impl<T: Inspect + ?Sized> Inspect for Rc<T> {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
}

impl<T: Inspect + ?Sized> Inspect for Arc<T> {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }
}

impl<T: Inspect> Inspect for [T] {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<T: Inspect> Inspect for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<T: Inspect, S: BuildHasher> Inspect for HashSet<T, S> {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<T: Inspect> Inspect for BTreeSet<T> {
    fn shape(&self) -> Shape<'_> {
        sequence(self)
    }
}

impl<K: fmt::Debug, V: Inspect, S: BuildHasher> Inspect for HashMap<K, V, S> {
    fn shape(&self) -> Shape<'_> {
        keyed(self)
    }
}

impl<K: fmt::Debug, V: Inspect> Inspect for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        keyed(self)
    }
}

//! One-way password digests.
//!
//! Produces the lowercase hex SHA-512 digest of a string's UTF-8 bytes. The
//! transform is unkeyed and unsalted; callers wanting salted storage layer it
//! themselves.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha512};

use crate::error::ArgumentError;
use crate::precondition::require_present;

/// Length of a digest in hex characters.
pub const DIGEST_HEX_LENGTH: usize = 128;

/// Hex-encoded SHA-512 digest of a password.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Returns the digest as hex text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when `candidate` hashes to this digest.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        hash(candidate) == *self
    }
}

impl AsRef<str> for PasswordDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PasswordDigest> for String {
    fn from(digest: PasswordDigest) -> Self {
        digest.0
    }
}

/// Hashes `text` into a [`PasswordDigest`].
///
/// # Examples
///
/// ```
/// use user_import::hash::{DIGEST_HEX_LENGTH, hash};
///
/// let digest = hash("Test");
///
/// assert_eq!(digest.as_str().len(), DIGEST_HEX_LENGTH);
/// assert_eq!(digest, hash("Test"));
/// ```
#[must_use]
pub fn hash(text: &str) -> PasswordDigest {
    let mut hasher = Sha512::new();
    hasher.update(text.as_bytes());
    PasswordDigest(hex::encode(hasher.finalize()))
}

/// Hashes a possibly absent `text`.
///
/// # Errors
///
/// Returns [`ArgumentError::MissingValue`] when `text` is `None`.
pub fn try_hash(text: Option<&str>) -> Result<PasswordDigest, ArgumentError> {
    require_present(text).map(hash)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        "",
        "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
    )]
    #[case(
        "a",
        "1f40fc92da241694750979ee6cf582f2d5d7d28e18335de05abc54d0560e0f5302860c652bf08d560252aa5e74210546f369fbbbce8c12cfc7957b2652fe9a75"
    )]
    #[case(
        "Test",
        "c6ee9e33cf5c6715a1d148fd73f7318884b41adcb916021e2bc0e800a5c5dd97f5142178f6ae88c8fdd98e1afb0ce4c8d2c54b5f37b30b7da1997bb33b0b8a31"
    )]
    fn hashes_known_vectors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(hash(input).as_str(), expected);
    }

    #[test]
    fn rejects_absent_text() {
        assert_eq!(
            try_hash(None),
            Err(ArgumentError::MissingValue {
                path: "$".to_owned()
            })
        );
    }

    #[test]
    fn hashes_present_text() {
        assert_eq!(try_hash(Some("a")), Ok(hash("a")));
    }

    #[rstest]
    #[case("pässwörd")]
    #[case("@#$%")]
    #[case("a much longer passphrase that spans more than one block of input")]
    fn digests_are_fixed_length_lowercase_hex(#[case] input: &str) {
        let digest = hash(input);
        assert_eq!(digest.as_str().len(), DIGEST_HEX_LENGTH);
        assert!(
            digest
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn multibyte_text_hashes_all_of_its_bytes() {
        assert_ne!(hash("ä"), hash("Ã"));
    }

    #[test]
    fn digest_verifies_its_source() {
        let digest = hash("Xk7#pQ2@");
        assert!(digest.matches("Xk7#pQ2@"));
        assert!(!digest.matches("xk7#pQ2@"));
    }
}

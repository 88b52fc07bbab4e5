//! Login and password generation for newly imported users.
//!
//! Logins are derived deterministically from a person's names and always
//! hold between [`LOGIN_MIN_LENGTH`] and [`LOGIN_MAX_LENGTH`] characters.
//! The derivation does not guarantee global uniqueness. Callers check
//! successive attempts with [`generate_login_variant`], or let
//! [`generate_available_login`] do it against a predicate.
//!
//! Passwords are random, drawn from four disjoint character classes with a
//! guaranteed minimum count per class. The alphabets leave out glyphs that
//! are easily confused on printed credential sheets (`l`, `1`, `O`, `0`...).

use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha512};
use tracing::debug;

use crate::error::{ArgumentError, GenerationError};
use crate::precondition::require_non_empty;

/// Shortest login ever produced.
pub const LOGIN_MIN_LENGTH: usize = 7;

/// Longest login ever produced.
pub const LOGIN_MAX_LENGTH: usize = 8;

/// Number of distinct derivations tried per name pair.
pub const MAX_LOGIN_ATTEMPTS: u32 = 100;

/// Characters taken from the family name.
const SURNAME_LETTERS: usize = 5;

/// Minimum stem length before the numeric suffix.
const STEM_MIN_LENGTH: usize = LOGIN_MIN_LENGTH - SUFFIX_DIGITS;

/// Width of the numeric suffix.
const SUFFIX_DIGITS: usize = 2;

/// Number of distinct suffixes.
const SUFFIX_SPACE: u32 = 100;

/// Pads stems of very short names.
const FILLER: char = 'x';

/// Longest password the generator will produce.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

const LOWERCASE: &[u8] = b"abcdefgijkmnopqrstwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTWXYZ";
const DIGITS: &[u8] = b"23456789";
const SPECIAL: &[u8] = b"@#$%";
const ANY: &[u8] = b"abcdefgijkmnopqrstwxyzABCDEFGHJKLMNPQRSTWXYZ23456789@#$%";

/// A character class with a minimum-count constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    /// Lowercase letters.
    Lowercase,
    /// Uppercase letters.
    Uppercase,
    /// Decimal digits.
    Digit,
    /// Special characters `@ # $ %`.
    Special,
}

impl CharacterClass {
    /// All classes, in quota allocation order.
    pub const ALL: [Self; 4] = [Self::Lowercase, Self::Uppercase, Self::Digit, Self::Special];

    /// Returns the characters this class draws from.
    #[must_use]
    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Lowercase => LOWERCASE,
            Self::Uppercase => UPPERCASE,
            Self::Digit => DIGITS,
            Self::Special => SPECIAL,
        }
    }

    /// Returns the class `c` belongs to, if any.
    #[must_use]
    pub fn of(c: char) -> Option<Self> {
        let byte = u8::try_from(c).ok()?;
        Self::ALL
            .into_iter()
            .find(|class| class.alphabet().contains(&byte))
    }
}

/// Validated password constraints.
///
/// # Example
///
/// ```
/// use user_import::PasswordPolicy;
///
/// let policy = PasswordPolicy::new(8, 16, 1, 1, 1, -4).expect("valid policy");
/// assert_eq!(policy.min_special(), 0);
/// assert!(PasswordPolicy::new(9, 8, 0, 0, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
    min_lowercase: usize,
    min_uppercase: usize,
    min_digit: usize,
    min_special: usize,
}

impl PasswordPolicy {
    /// Builds a policy, clamping negative values to zero.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvertedRange`] when `min_length` exceeds
    /// `max_length`, [`ArgumentError::LengthTooLarge`] when `max_length`
    /// exceeds [`MAX_PASSWORD_LENGTH`], and [`ArgumentError::ZeroLength`]
    /// when the range only admits empty passwords.
    pub fn new(
        min_length: i32,
        max_length: i32,
        min_lowercase: i32,
        min_uppercase: i32,
        min_digit: i32,
        min_special: i32,
    ) -> Result<Self, ArgumentError> {
        if min_length > max_length {
            return Err(ArgumentError::InvertedRange {
                min: min_length,
                max: max_length,
            });
        }
        let max = clamp_count(max_length);
        if max > MAX_PASSWORD_LENGTH {
            return Err(ArgumentError::LengthTooLarge {
                max: max_length,
                limit: MAX_PASSWORD_LENGTH,
            });
        }
        if max == 0 {
            return Err(ArgumentError::ZeroLength);
        }
        Ok(Self {
            min_length: clamp_count(min_length),
            max_length: max,
            min_lowercase: clamp_count(min_lowercase),
            min_uppercase: clamp_count(min_uppercase),
            min_digit: clamp_count(min_digit),
            min_special: clamp_count(min_special),
        })
    }

    /// Returns the shortest permitted length.
    #[must_use]
    pub const fn min_length(&self) -> usize {
        self.min_length
    }

    /// Returns the longest permitted length.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Returns the lowercase minimum.
    #[must_use]
    pub const fn min_lowercase(&self) -> usize {
        self.min_lowercase
    }

    /// Returns the uppercase minimum.
    #[must_use]
    pub const fn min_uppercase(&self) -> usize {
        self.min_uppercase
    }

    /// Returns the digit minimum.
    #[must_use]
    pub const fn min_digit(&self) -> usize {
        self.min_digit
    }

    /// Returns the special character minimum.
    #[must_use]
    pub const fn min_special(&self) -> usize {
        self.min_special
    }

    /// Returns the minimum for `class`.
    #[must_use]
    pub const fn minimum(&self, class: CharacterClass) -> usize {
        match class {
            CharacterClass::Lowercase => self.min_lowercase,
            CharacterClass::Uppercase => self.min_uppercase,
            CharacterClass::Digit => self.min_digit,
            CharacterClass::Special => self.min_special,
        }
    }
}

/// Default shortest password length.
pub const DEFAULT_MIN_LENGTH: i32 = 8;

/// Default longest password length.
pub const DEFAULT_MAX_LENGTH: i32 = 16;

/// Default minimum count for each character class.
pub const DEFAULT_CLASS_MINIMUM: i32 = 1;

impl Default for PasswordPolicy {
    /// Eight to sixteen characters with at least one of each class.
    fn default() -> Self {
        Self {
            min_length: clamp_count(DEFAULT_MIN_LENGTH),
            max_length: clamp_count(DEFAULT_MAX_LENGTH),
            min_lowercase: clamp_count(DEFAULT_CLASS_MINIMUM),
            min_uppercase: clamp_count(DEFAULT_CLASS_MINIMUM),
            min_digit: clamp_count(DEFAULT_CLASS_MINIMUM),
            min_special: clamp_count(DEFAULT_CLASS_MINIMUM),
        }
    }
}

fn clamp_count(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Generates a random password using the thread-local RNG.
///
/// Negative minimums are treated as zero. When the minimums add up to more
/// than the chosen length they are honoured round-robin (lowercase,
/// uppercase, digit, special) until the length is used up.
///
/// # Errors
///
/// See [`PasswordPolicy::new`].
///
/// # Example
///
/// ```
/// use user_import::generate_password;
///
/// let password = generate_password(8, 8, 1, 1, 1, 1).expect("valid policy");
/// assert_eq!(password.chars().count(), 8);
/// ```
pub fn generate_password(
    min_length: i32,
    max_length: i32,
    min_lowercase: i32,
    min_uppercase: i32,
    min_digit: i32,
    min_special: i32,
) -> Result<String, ArgumentError> {
    let policy = PasswordPolicy::new(
        min_length,
        max_length,
        min_lowercase,
        min_uppercase,
        min_digit,
        min_special,
    )?;
    Ok(generate_password_with_rng(&mut rand::rng(), &policy))
}

/// Generates a password satisfying `policy` from the supplied RNG.
///
/// The length is drawn uniformly from the policy's range. Class quotas are
/// filled first, the remaining positions come from the union of all classes,
/// and the result is shuffled so no position predicts its class.
pub fn generate_password_with_rng<R: Rng + ?Sized>(rng: &mut R, policy: &PasswordPolicy) -> String {
    let length = rng.random_range(policy.min_length..=policy.max_length);
    let quotas = allocate_quotas(length, CharacterClass::ALL.map(|class| policy.minimum(class)));

    let mut password: Vec<char> = Vec::with_capacity(length);
    for (class, quota) in CharacterClass::ALL.into_iter().zip(quotas) {
        for _ in 0..quota {
            password.extend(class.alphabet().choose(rng).copied().map(char::from));
        }
    }
    for _ in password.len()..length {
        password.extend(ANY.choose(rng).copied().map(char::from));
    }

    password.shuffle(rng);
    password.into_iter().collect()
}

/// Splits `length` positions over the class minimums, one position per class
/// per round, so an oversubscribed policy still spreads across classes.
fn allocate_quotas(length: usize, minimums: [usize; 4]) -> [usize; 4] {
    let mut quotas = [0; 4];
    let mut budget = length;
    let mut progressed = true;

    while budget > 0 && progressed {
        progressed = false;
        for (quota, minimum) in quotas.iter_mut().zip(minimums) {
            if budget > 0 && *quota < minimum {
                *quota += 1;
                budget -= 1;
                progressed = true;
            }
        }
    }

    quotas
}

/// Derives the first-choice login for a person.
///
/// Equivalent to [`generate_login_variant`] with attempt `0`.
///
/// # Errors
///
/// Returns [`ArgumentError::BlankValue`] when either name is empty or blank.
///
/// # Example
///
/// ```
/// use user_import::generate_login;
///
/// let login = generate_login("Justus", "Jonas").expect("names are present");
/// assert!(login.starts_with("jjonas"));
/// assert_eq!(login.len(), 8);
/// ```
pub fn generate_login(first_name: &str, last_name: &str) -> Result<String, ArgumentError> {
    generate_login_variant(first_name, last_name, 0)
}

/// Derives the `attempt`-th login candidate for a person.
///
/// The login is the first name's initial followed by up to five letters of
/// the family name (padded from the rest of the first name, then with `x`,
/// to at least five letters) and a two-digit suffix. Names are lowercased and
/// folded to ASCII (`ä` becomes `ae`, `ß` becomes `ss`); other characters are
/// dropped. The suffix starts at a value derived from the names and advances
/// by one per attempt, so the first [`MAX_LOGIN_ATTEMPTS`] attempts are all
/// distinct.
///
/// # Errors
///
/// Returns [`ArgumentError::BlankValue`] when either name is empty or blank.
pub fn generate_login_variant(
    first_name: &str,
    last_name: &str,
    attempt: u32,
) -> Result<String, ArgumentError> {
    require_non_empty([first_name, last_name])?;

    let first = fold_name(first_name);
    let last = fold_name(last_name);
    let stem = login_stem(&first, &last);
    let suffix = login_suffix(&first, &last, attempt);

    Ok(format!("{stem}{suffix:0width$}", width = SUFFIX_DIGITS))
}

/// Returns the first login candidate for which `is_taken` answers `false`.
///
/// # Errors
///
/// Returns [`GenerationError::InvalidArgument`] for empty names and
/// [`GenerationError::LoginSpaceExhausted`] when every candidate is taken.
pub fn generate_available_login<F>(
    first_name: &str,
    last_name: &str,
    mut is_taken: F,
) -> Result<String, GenerationError>
where
    F: FnMut(&str) -> bool,
{
    for attempt in 0..MAX_LOGIN_ATTEMPTS {
        let login = generate_login_variant(first_name, last_name, attempt)?;
        if !is_taken(&login) {
            return Ok(login);
        }
        debug!(attempt, login = %login, "login taken, trying next derivation");
    }

    Err(GenerationError::LoginSpaceExhausted {
        max_attempts: MAX_LOGIN_ATTEMPTS,
    })
}

fn fold_name(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'a'..='z' => folded.push(c),
            'ä' | 'æ' => folded.push_str("ae"),
            'ö' | 'ø' | 'œ' => folded.push_str("oe"),
            'ü' => folded.push_str("ue"),
            'ß' => folded.push_str("ss"),
            'à' | 'á' | 'â' | 'ã' | 'å' => folded.push('a'),
            'ç' => folded.push('c'),
            'è' | 'é' | 'ê' | 'ë' => folded.push('e'),
            'ì' | 'í' | 'î' | 'ï' => folded.push('i'),
            'ñ' => folded.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' => folded.push('o'),
            'ù' | 'ú' | 'û' => folded.push('u'),
            'ý' | 'ÿ' => folded.push('y'),
            _ => {}
        }
    }
    folded
}

fn login_stem(first: &str, last: &str) -> String {
    let mut first_letters = first.chars();
    let mut stem: String = first_letters.next().into_iter().collect();
    stem.extend(last.chars().take(SURNAME_LETTERS));

    let missing = STEM_MIN_LENGTH.saturating_sub(stem.len());
    stem.extend(
        first_letters
            .chain(std::iter::repeat(FILLER))
            .take(missing),
    );
    stem
}

fn login_suffix(first: &str, last: &str, attempt: u32) -> u32 {
    let mut hasher = Sha512::new();
    hasher.update(first.as_bytes());
    hasher.update([0_u8]);
    hasher.update(last.as_bytes());
    let seed = hasher
        .finalize()
        .iter()
        .fold(0_u64, |acc, &byte| acc.rotate_left(8) ^ u64::from(byte));

    let base = ChaCha8Rng::seed_from_u64(seed).random_range(0..SUFFIX_SPACE);
    base.wrapping_add(attempt).rem_euclid(SUFFIX_SPACE)
}

#[cfg(test)]
mod tests {
    //! Covers login derivation, password quotas and policy validation.

    use std::collections::HashSet;

    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(2026)
    }

    fn count_class(password: &str, class: CharacterClass) -> usize {
        password
            .chars()
            .filter(|&c| CharacterClass::of(c) == Some(class))
            .count()
    }

    #[rstest]
    #[case::inverted(9, 8)]
    #[case::inverted_by_one(2, 1)]
    #[case::inverted_negative(-1, -2)]
    fn rejects_inverted_length_range(#[case] min: i32, #[case] max: i32) {
        assert_eq!(
            generate_password(min, max, 1, 1, 1, 1),
            Err(ArgumentError::InvertedRange { min, max })
        );
    }

    #[rstest]
    #[case::huge(i32::MAX, i32::MAX)]
    #[case::just_over(1, 1025)]
    fn rejects_lengths_beyond_the_limit(#[case] min: i32, #[case] max: i32) {
        assert_eq!(
            generate_password(min, max, 1, 1, 1, 1),
            Err(ArgumentError::LengthTooLarge {
                max,
                limit: MAX_PASSWORD_LENGTH
            })
        );
    }

    #[test]
    fn accepts_the_longest_supported_length() {
        let password = generate_password(1024, 1024, 1, 1, 1, 1).expect("valid policy");
        assert_eq!(password.chars().count(), MAX_PASSWORD_LENGTH);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(-3, 0)]
    #[case(-3, -1)]
    fn rejects_zero_length_range(#[case] min: i32, #[case] max: i32) {
        assert_eq!(
            generate_password(min, max, 0, 0, 0, 0),
            Err(ArgumentError::ZeroLength)
        );
    }

    #[test]
    fn negative_minimums_are_clamped() {
        let policy = PasswordPolicy::new(4, 6, -1, -2, -3, -4).expect("valid policy");
        for class in CharacterClass::ALL {
            assert_eq!(policy.minimum(class), 0);
        }

        for _ in 0..50 {
            let password = generate_password(4, 6, -1, -2, -3, -4).expect("valid policy");
            let length = password.chars().count();
            assert!((4..=6).contains(&length), "length {length} out of range");
        }
    }

    #[test]
    fn length_stays_within_range() {
        for _ in 0..200 {
            let password = generate_password(1, 8, 1, 1, 1, 1).expect("valid policy");
            let length = password.chars().count();
            assert!((1..=8).contains(&length), "length {length} out of range");
        }
    }

    #[test]
    fn fixed_length_password_holds_every_class() {
        for _ in 0..200 {
            let password = generate_password(8, 8, 1, 1, 1, 1).expect("valid policy");
            assert_eq!(password.chars().count(), 8);
            for class in CharacterClass::ALL {
                assert!(
                    count_class(&password, class) >= 1,
                    "{password} lacks {class:?}"
                );
            }
            assert!(password.chars().any(|c| "@#$%".contains(c)));
        }
    }

    #[rstest]
    fn every_character_belongs_to_a_class(mut rng: ChaCha8Rng) {
        let policy = PasswordPolicy::new(30, 40, 0, 0, 0, 0).expect("valid policy");
        let password = generate_password_with_rng(&mut rng, &policy);
        assert!(password.chars().all(|c| CharacterClass::of(c).is_some()));
    }

    #[rstest]
    fn larger_minimums_are_honoured(mut rng: ChaCha8Rng) {
        let policy = PasswordPolicy::new(12, 12, 2, 3, 4, 2).expect("valid policy");
        for _ in 0..100 {
            let password = generate_password_with_rng(&mut rng, &policy);
            for class in CharacterClass::ALL {
                assert!(count_class(&password, class) >= policy.minimum(class));
            }
        }
    }

    #[rstest]
    fn seeded_generation_is_reproducible() {
        let policy = PasswordPolicy::default();
        let first = generate_password_with_rng(&mut ChaCha8Rng::seed_from_u64(7), &policy);
        let second = generate_password_with_rng(&mut ChaCha8Rng::seed_from_u64(7), &policy);
        assert_eq!(first, second);
    }

    #[rstest]
    fn class_positions_vary(mut rng: ChaCha8Rng) {
        let policy = PasswordPolicy::new(4, 4, 1, 1, 1, 1).expect("valid policy");
        let leading: HashSet<Option<CharacterClass>> = (0..200)
            .map(|_| {
                let password = generate_password_with_rng(&mut rng, &policy);
                password.chars().next().and_then(CharacterClass::of)
            })
            .collect();
        assert_eq!(leading.len(), 4, "every class should lead some password");
    }

    #[rstest]
    #[case::exact(4, [1, 1, 1, 1], [1, 1, 1, 1])]
    #[case::capped_in_order(2, [1, 1, 1, 1], [1, 1, 0, 0])]
    #[case::round_robin(3, [3, 0, 0, 2], [2, 0, 0, 1])]
    #[case::spare_room(10, [1, 0, 2, 0], [1, 0, 2, 0])]
    #[case::nothing_required(5, [0, 0, 0, 0], [0, 0, 0, 0])]
    #[case::no_room(0, [1, 1, 1, 1], [0, 0, 0, 0])]
    fn quotas_are_capped_round_robin(
        #[case] length: usize,
        #[case] minimums: [usize; 4],
        #[case] expected: [usize; 4],
    ) {
        assert_eq!(allocate_quotas(length, minimums), expected);
    }

    #[rstest]
    fn oversubscribed_policy_fills_exact_length(mut rng: ChaCha8Rng) {
        let policy = PasswordPolicy::new(3, 3, 5, 5, 5, 5).expect("valid policy");
        let password = generate_password_with_rng(&mut rng, &policy);
        assert_eq!(password.chars().count(), 3);
        assert_eq!(count_class(&password, CharacterClass::Lowercase), 1);
        assert_eq!(count_class(&password, CharacterClass::Uppercase), 1);
        assert_eq!(count_class(&password, CharacterClass::Digit), 1);
        assert_eq!(count_class(&password, CharacterClass::Special), 0);
    }

    #[rstest]
    #[case("Justus", "Jonas", "jjonas")]
    #[case("Peter", "Shaw", "pshaw")]
    #[case("Bob", "Andrews", "bandre")]
    #[case("Li", "Wu", "lwuix")]
    #[case("Jürgen", "Müller", "jmuell")]
    #[case("Anne-Marie", "O'Neil", "aoneil")]
    #[case("Zoë", "Ng", "zngoe")]
    #[case("李", "王", "xxxxx")]
    fn login_stems_follow_the_names(#[case] first: &str, #[case] last: &str, #[case] stem: &str) {
        let login = generate_login(first, last).expect("names are present");
        assert!(login.starts_with(stem), "{login} should start with {stem}");
        assert!(
            (LOGIN_MIN_LENGTH..=LOGIN_MAX_LENGTH).contains(&login.len()),
            "{login} has length {}",
            login.len()
        );
        assert!(
            login
                .get(stem.len()..)
                .is_some_and(|suffix| suffix.len() == 2
                    && suffix.chars().all(|c| c.is_ascii_digit()))
        );
    }

    #[test]
    fn login_is_deterministic() {
        assert_eq!(
            generate_login("Justus", "Jonas"),
            generate_login("Justus", "Jonas")
        );
    }

    #[rstest]
    #[case("", "Jonas", "$[0]")]
    #[case("Justus", "   ", "$[1]")]
    fn login_rejects_blank_names(#[case] first: &str, #[case] last: &str, #[case] path: &str) {
        assert_eq!(
            generate_login(first, last),
            Err(ArgumentError::BlankValue {
                path: path.to_owned()
            })
        );
    }

    #[test]
    fn login_variants_are_distinct_across_all_attempts() {
        let logins: HashSet<String> = (0..MAX_LOGIN_ATTEMPTS)
            .map(|attempt| {
                generate_login_variant("Justus", "Jonas", attempt).expect("names are present")
            })
            .collect();
        assert_eq!(logins.len(), 100);
    }

    #[test]
    fn available_login_skips_taken_candidates() {
        let taken: HashSet<String> = (0..3)
            .map(|attempt| {
                generate_login_variant("Peter", "Shaw", attempt).expect("names are present")
            })
            .collect();
        let expected = generate_login_variant("Peter", "Shaw", 3).expect("names are present");

        let login = generate_available_login("Peter", "Shaw", |candidate| {
            taken.contains(candidate)
        })
        .expect("a login is free");
        assert_eq!(login, expected);
    }

    #[test]
    fn available_login_reports_exhaustion() {
        let result = generate_available_login("Peter", "Shaw", |_| true);
        assert_eq!(
            result,
            Err(GenerationError::LoginSpaceExhausted {
                max_attempts: MAX_LOGIN_ATTEMPTS
            })
        );
    }

    #[test]
    fn available_login_propagates_argument_errors() {
        let result = generate_available_login("", "Shaw", |_| false);
        assert!(matches!(result, Err(GenerationError::InvalidArgument(_))));
    }
}

//! Batch import of user rosters.
//!
//! Reads a comma-delimited roster line by line, derives a login and password
//! for each person, and stores the result through a [`UserDirectory`]. The
//! batch stops at the first failing line, and nothing is stored unless every
//! line passes.

use std::collections::HashSet;
use std::io::BufRead;

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Builder;

use crate::credentials::{PasswordPolicy, generate_available_login, generate_password_with_rng};
use crate::directory::{CreateUserError, UserDirectory, create_user_checked};
use crate::error::{ArgumentError, ImportError};
use crate::hash::hash;
use crate::precondition::require_non_empty;
use crate::record::{RecordParser, Row};
use crate::uniqueness::DuplicateUniqueField;
use crate::user::{ImportedUser, IssuedCredential, Sex};

/// Number of columns in the standard roster export.
pub const DEFAULT_COLUMN_COUNT: usize = 14;

/// Positions of the fields the import reads from each roster line.
///
/// Columns not named here are read for the column count check and otherwise
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Number of columns every line must split into.
    pub column_count: usize,
    /// Column holding the family name.
    pub last_name: usize,
    /// Column holding the given name.
    pub first_name: usize,
    /// Column holding the course.
    pub course: usize,
    /// Column holding the sex code.
    pub sex: usize,
    /// Column holding the `yyyyMMdd` birthday.
    pub birthday: usize,
    /// Column holding the email address.
    pub email: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            column_count: DEFAULT_COLUMN_COUNT,
            last_name: 0,
            first_name: 7,
            course: 9,
            sex: 10,
            birthday: 12,
            email: 13,
        }
    }
}

impl ColumnLayout {
    /// Checks that the schema has columns and every field lies inside it.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::ZeroColumns`] for an empty schema and
    /// [`ArgumentError::ColumnOutOfRange`] for the first field outside it.
    pub fn validate(&self) -> Result<(), ArgumentError> {
        if self.column_count == 0 {
            return Err(ArgumentError::ZeroColumns);
        }
        let fields = [
            self.last_name,
            self.first_name,
            self.course,
            self.sex,
            self.birthday,
            self.email,
        ];
        match fields.into_iter().find(|&column| column >= self.column_count) {
            Some(column) => Err(ArgumentError::ColumnOutOfRange {
                column,
                column_count: self.column_count,
            }),
            None => Ok(()),
        }
    }
}

/// Outcome of a successful batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Users stored, in input order.
    pub users: Vec<ImportedUser>,
    /// Credentials to hand out, one per stored user.
    pub credentials: Vec<IssuedCredential>,
}

impl ImportReport {
    /// Returns the number of users imported.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` when the roster held no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Imports every line of `reader` into `directory`.
///
/// Each line yields one user whose login is the first free derivation of
/// the person's names and whose password follows `policy`. Logins issued
/// earlier in the same batch count as taken. Identifiers and passwords are
/// drawn from `rng`, so a seeded generator gives reproducible output.
///
/// The whole roster is parsed, validated and checked for login and email
/// conflicts before the first user is stored. A roster with any bad line
/// stores nobody.
///
/// # Errors
///
/// Returns [`ImportError::InvalidLayout`] before reading anything when the
/// layout is unusable. Otherwise returns the first line's failure, tagged
/// with its line number. A conflict raised while storing, after the roster
/// was checked, leaves the users stored before it in place; rolling them back
/// is up to the directory.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use user_import::{ColumnLayout, InMemoryUserDirectory, PasswordPolicy, import_users};
///
/// let roster = "Jonas,,,,,,,Justus,,9a,2,,19980304,justus@jonas.de\n";
/// let mut directory = InMemoryUserDirectory::default();
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
///
/// let report = import_users(
///     roster.as_bytes(),
///     &ColumnLayout::default(),
///     &PasswordPolicy::default(),
///     &mut directory,
///     &mut rng,
/// )
/// .expect("roster is well formed");
///
/// assert_eq!(report.len(), 1);
/// assert!(report.credentials[0].login.starts_with("jjonas"));
/// ```
pub fn import_users<R, D, G>(
    reader: R,
    layout: &ColumnLayout,
    policy: &PasswordPolicy,
    directory: &mut D,
    rng: &mut G,
) -> Result<ImportReport, ImportError>
where
    R: BufRead,
    D: UserDirectory + ?Sized,
    G: Rng + ?Sized,
{
    layout.validate().map_err(ImportError::InvalidLayout)?;
    let parser = RecordParser::new(reader, layout.column_count).map_err(ImportError::InvalidLayout)?;

    let report = stage_roster(parser, layout, policy, &*directory, rng)?;
    debug!(staged = report.len(), "roster checked, storing users");

    for (user, credential) in report.users.iter().zip(&report.credentials) {
        store_user(directory, user, credential.line)?;
        info!(line = credential.line, login = %user.login, "imported user");
    }

    info!(imported = report.len(), "user import finished");
    Ok(report)
}

fn stage_roster<R, D, G>(
    parser: RecordParser<R>,
    layout: &ColumnLayout,
    policy: &PasswordPolicy,
    directory: &D,
    rng: &mut G,
) -> Result<ImportReport, ImportError>
where
    R: BufRead,
    D: UserDirectory + ?Sized,
    G: Rng + ?Sized,
{
    let mut staged = StagedDirectory::new(directory);
    let mut report = ImportReport::default();
    for record in parser {
        let row = record?;
        let (user, credential) = stage_row(&row, layout, policy, &mut staged, rng)?;
        report.users.push(user);
        report.credentials.push(credential);
    }
    Ok(report)
}

fn stage_row<D, G>(
    row: &Row,
    layout: &ColumnLayout,
    policy: &PasswordPolicy,
    staged: &mut StagedDirectory<'_, D>,
    rng: &mut G,
) -> Result<(ImportedUser, IssuedCredential), ImportError>
where
    D: UserDirectory + ?Sized,
    G: Rng + ?Sized,
{
    let line = row.line();
    debug!(line, "processing roster line");
    let first_name = row.get_string(layout.first_name);
    let last_name = row.get_string(layout.last_name);
    let email = row.get_string(layout.email);
    require_non_empty([first_name, last_name, email])
        .map_err(|source| ImportError::InvalidRecord { line, source })?;

    let sex = Sex::from_code(row.get_int(layout.sex)?);
    let birthday = row.get_date(layout.birthday)?;

    let login = generate_available_login(first_name, last_name, |candidate| {
        staged.login_exists(candidate)
    })
    .map_err(|source| ImportError::Generation { line, source })?;
    let password = generate_password_with_rng(rng, policy);

    let user = ImportedUser {
        id: Builder::from_random_bytes(rng.random()).into_uuid(),
        login,
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        course: row.get_string(layout.course).to_owned(),
        sex,
        birthday,
        email: email.to_owned(),
        password_digest: hash(&password),
    };
    store_user(staged, &user, line)?;

    let credential = IssuedCredential {
        line,
        login: user.login.clone(),
        password,
        email: user.email.clone(),
    };
    Ok((user, credential))
}

fn store_user<D>(directory: &mut D, user: &ImportedUser, line: usize) -> Result<(), ImportError>
where
    D: UserDirectory + ?Sized,
{
    match create_user_checked(directory, user) {
        Ok(()) => Ok(()),
        Err(CreateUserError::Duplicate(source)) => {
            warn!(line, field = %source.field(), "roster line collides with another user");
            Err(ImportError::Duplicate { line, source })
        }
        Err(CreateUserError::Unexpected(violation)) => Err(violation.into()),
    }
}

/// Read-only view of a directory plus the users staged from the roster so
/// far. Inserting records the user in the stage and leaves the directory
/// untouched.
struct StagedDirectory<'a, D: ?Sized> {
    directory: &'a D,
    logins: HashSet<String>,
    emails: HashSet<String>,
}

impl<'a, D: UserDirectory + ?Sized> StagedDirectory<'a, D> {
    fn new(directory: &'a D) -> Self {
        Self {
            directory,
            logins: HashSet::new(),
            emails: HashSet::new(),
        }
    }
}

impl<D: UserDirectory + ?Sized> UserDirectory for StagedDirectory<'_, D> {
    fn login_exists(&self, login: &str) -> bool {
        self.logins.contains(login) || self.directory.login_exists(login)
    }

    fn email_exists(&self, email: &str) -> bool {
        self.emails.contains(&email.to_lowercase()) || self.directory.email_exists(email)
    }

    fn insert(&mut self, user: &ImportedUser) -> Result<(), DuplicateUniqueField> {
        if !self.logins.insert(user.login.clone()) {
            return Err(DuplicateUniqueField::username(format!(
                "login '{}' is already staged",
                user.login
            )));
        }
        if !self.emails.insert(user.email.to_lowercase()) {
            return Err(DuplicateUniqueField::email(format!(
                "email '{}' is already staged",
                user.email
            )));
        }
        Ok(())
    }
}

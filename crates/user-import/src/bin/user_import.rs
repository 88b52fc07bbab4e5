//! Import a user roster and print the issued credentials as JSON lines.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use clap::Parser;
use ortho_config::OrthoConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use user_import::{ImportSettings, InMemoryUserDirectory, import_users};

/// `user-import` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "user-import",
    about = "Generate logins and passwords for every line of a user roster",
    version
)]
struct CliArgs {
    /// Path to a comma-delimited roster file.
    #[arg(long = "input", value_name = "path")]
    input: PathBuf,
    /// Seed for reproducible credentials. Drawn from the OS when omitted.
    #[arg(long = "seed", value_name = "u64")]
    seed: Option<u64>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = ImportSettings::load_from_iter([OsString::from("user-import")])
        .map_err(|error| io::Error::other(format!("load import settings: {error}")))?;
    let layout = settings.layout();
    let policy = settings
        .password_policy()
        .map_err(|error| io::Error::other(format!("invalid password policy: {error}")))?;

    let reader = open_input(&args.input)?;
    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };
    let mut directory = InMemoryUserDirectory::default();

    let report = import_users(reader, &layout, &policy, &mut directory, &mut rng).map_err(
        |error| io::Error::other(format!("import '{}' failed: {error}", args.input.display())),
    )?;

    let mut out = io::stdout().lock();
    for credential in &report.credentials {
        serde_json::to_writer(&mut out, credential).map_err(io::Error::other)?;
        writeln!(out)?;
    }
    out.flush()?;

    info!(users = report.len(), "credentials written");
    Ok(())
}

fn open_input(path: &Path) -> io::Result<BufReader<cap_std::fs::File>> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|error| {
        io::Error::other(format!(
            "open input parent directory '{}': {error}",
            parent.display()
        ))
    })?;
    let file = directory.open(Path::new(file_name)).map_err(|error| {
        io::Error::other(format!("open input file '{}': {error}", path.display()))
    })?;
    Ok(BufReader::new(file))
}

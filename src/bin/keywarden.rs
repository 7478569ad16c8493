//! # keywarden CLI
//!
//! Issues, verifies and revokes license codes against a local key pair and
//! license database.
//!
//! Exit status: 0 on success, 1 when a license is not valid or a revoked
//! code is unknown, 2 on any error.

use clap::{Parser, Subcommand};
use keywarden::{initialize, KeywardenConfig, KeywardenError, LicenseManager};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// keywarden: signed license issuance and verification.
#[derive(Parser, Debug)]
#[command(name = "keywarden", version, about)]
struct Cli {
    /// Directory holding the key files and license database.
    /// Defaults to the platform data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// JSON configuration file. Overrides --dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the signing key pair and create the license database.
    Init {
        /// Replace an existing key pair. Invalidates every issued license.
        #[arg(long)]
        force: bool,
    },
    /// Issue a new license.
    Generate {
        /// Code length (8-128). Defaults to the configured length.
        #[arg(short, long)]
        length: Option<usize>,
        /// Days until expiry; negative issues an already expired license.
        #[arg(short, long, allow_negative_numbers = true)]
        duration_days: Option<i64>,
    },
    /// Check whether a license is valid.
    Verify {
        /// License code.
        code: String,
    },
    /// Revoke a license.
    Revoke {
        /// License code.
        code: String,
    },
    /// List all licenses.
    List,
}

const EXIT_REJECTED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            if e.is_infrastructure() {
                tracing::error!(error = %e, "operation failed");
            }
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn load_config(cli: &Cli) -> Result<KeywardenConfig, KeywardenError> {
    if let Some(path) = &cli.config {
        return KeywardenConfig::from_json_file(path);
    }
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => KeywardenConfig::default_dir()?,
    };
    Ok(KeywardenConfig::in_dir(dir))
}

fn run(cli: Cli) -> Result<ExitCode, KeywardenError> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Init { force } => {
            let fingerprint = initialize(&config, force)?;
            println!("Initialized license authority");
            println!("Private key: {}", config.private_key_path.display());
            println!("Public key:  {}", config.public_key_path.display());
            println!("Database:    {}", config.database_path.display());
            println!("Fingerprint: {}", fingerprint);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate {
            length,
            duration_days,
        } => {
            let manager = LicenseManager::new(config)?;
            let length = length.unwrap_or(manager.config().code_length);
            let duration_days = duration_days.unwrap_or(manager.config().default_duration_days);
            let issued = manager.issue(length, duration_days)?;
            println!("License generated: {}", issued.code);
            println!("Expires: {}", issued.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { code } => {
            let manager = LicenseManager::new(config)?;
            let result = manager.verify(&code)?;
            if result.valid {
                println!("License is valid");
                if let Some(expires_at) = result.expires_at {
                    println!("Expires: {}", expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                Ok(ExitCode::SUCCESS)
            } else {
                println!("License verification failed: {}", result.reason);
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        }
        Commands::Revoke { code } => {
            let manager = LicenseManager::new(config)?;
            if manager.revoke(&code)? {
                println!("License successfully revoked");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("Failed to revoke license: license not found");
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        }
        Commands::List => {
            let manager = LicenseManager::new(config)?;
            let now = manager.now();
            for license in manager.list()? {
                println!(
                    "{:>6}  {}  {:<8}  expires {}",
                    license.id,
                    license.code,
                    license.status_at(now),
                    license.expiration_date.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

//! Configuration for the portal CLI
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::resolver::StatusVocabulary;

/// tawzi3 beneficiary portal
#[derive(Parser, Debug, Clone)]
#[command(name = "tawzi3-portal")]
#[command(about = "Beneficiary portal for the tawzi3 aid-distribution program")]
pub struct Args {
    /// Record store backend
    #[arg(long, env = "PORTAL_STORE", value_enum, default_value = "mongo")]
    pub store: StoreBackend,

    /// Seed file for the in-memory store
    #[arg(long, env = "PORTAL_SEED")]
    pub seed: Option<PathBuf>,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "tawzi3")]
    pub mongodb_db: String,

    /// Where the signed-in session is kept
    #[arg(long, env = "PORTAL_SESSION_FILE", default_value = ".tawzi3/session.json")]
    pub session_file: PathBuf,

    /// Deadline for each record store call in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "10000")]
    pub store_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Print command results as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Status vocabulary of the deployed data
    #[command(flatten)]
    pub statuses: StatusArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Status literals, overridable for deployments that store English values
#[derive(Parser, Debug, Clone)]
pub struct StatusArgs {
    /// Parcel status meaning the parcel round has ended
    #[arg(long, env = "PARCEL_CLOSED_STATUS", default_value = "انتهى")]
    pub parcel_closed_status: String,

    /// Distribution status meaning the parcel was not collected
    #[arg(long, env = "NOT_RECEIVED_STATUS", default_value = "لم يستلم")]
    pub not_received_status: String,

    /// Distribution status meaning the parcel was collected
    #[arg(long, env = "RECEIVED_STATUS", default_value = "استلم")]
    pub received_status: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with a national id and a phone number or password
    Login {
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        credential: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show the household profile
    Profile,
    /// List parcels allocated to the household
    Parcels,
    /// File a complaint
    Complain {
        #[arg(long)]
        text: String,
    },
    /// Show one filed complaint
    Complaint {
        #[arg(long)]
        key: String,
    },
    /// Change the password (current credential is the phone until a password is set)
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long = "new")]
        new_password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Show the QR identity payload
    Qr {
        /// Print the compact `{"id","name","camp"}` JSON form instead
        #[arg(long)]
        compact: bool,
    },
}

impl Args {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn vocabulary(&self) -> StatusVocabulary {
        StatusVocabulary {
            parcel_closed: self.statuses.parcel_closed_status.clone(),
            not_received: self.statuses.not_received_status.clone(),
            received: self.statuses.received_status.clone(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.store == StoreBackend::Memory && self.seed.is_none() {
            return Err("--seed is required with the memory store".to_string());
        }

        let vocabulary = self.vocabulary();
        if vocabulary.received == vocabulary.not_received {
            return Err("RECEIVED_STATUS and NOT_RECEIVED_STATUS must differ".to_string());
        }

        Ok(())
    }
}

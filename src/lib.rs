// lib.rs - Constraint-aware credential generator library

pub mod breach;
pub mod charset;
pub mod config;
pub mod entropy;
pub mod generator;
pub mod guard;
pub mod service;
pub mod stats;
pub mod wordlist;

// Re-exports for convenience
pub use breach::{BreachOracleClient, BreachStatus};
pub use config::{CheckSpec, ConstraintSpec, Mode, PassphraseSpec, RandomSpec};
pub use entropy::{EntropyReport, ATTACKER_PROFILES};
pub use service::{CredentialResult, CredentialService};
pub use stats::RunStats;
pub use wordlist::Wordlist;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default cryptographically secure RNG.
pub(crate) fn csprng() -> impl rand::CryptoRng + rand::Rng {
    rand::rngs::OsRng
}

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Configuration error: {0}")]
        Config(String),

        #[error(
            "Retry budget exhausted after {attempts} attempts \
             (most frequent failure: {dominant})"
        )]
        Exhausted { attempts: u32, dominant: String },

        #[error("Wordlist is empty")]
        EmptyWordlist,

        #[error("No wordlist available for passphrase generation")]
        MissingWordlist,

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Network error: {0}")]
        Network(#[from] reqwest::Error),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Utilities module
pub mod utils {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3600.0;
    const DAY: f64 = 86_400.0;
    const YEAR: f64 = 365.25 * DAY;

    /// Format a duration in a human-readable unit, from seconds up to
    /// centuries. Non-finite or absurdly large values collapse to
    /// "centuries" rather than a meaningless number.
    pub fn format_duration(seconds: f64) -> String {
        if !seconds.is_finite() || seconds >= 100.0 * YEAR {
            return "centuries".to_string();
        }
        if seconds < MINUTE {
            format!("{:.1}s", seconds)
        } else if seconds < HOUR {
            format!("{:.1}m", seconds / MINUTE)
        } else if seconds < DAY {
            format!("{:.1}h", seconds / HOUR)
        } else if seconds < YEAR {
            format!("{:.1}d", seconds / DAY)
        } else {
            format!("{:.1}y", seconds / YEAR)
        }
    }

    /// Format number with thousands separator
    pub fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }
}

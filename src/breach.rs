use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

/// Default range-query endpoint of the public breach corpus.
pub const DEFAULT_ENDPOINT: &str = "https://api.pwnedpasswords.com/range/";

/// Number of hash characters disclosed to the oracle.
const PREFIX_LEN: usize = 5;

const USER_AGENT: &str = concat!("passmint/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a breach-corpus lookup.
///
/// `CheckFailed` is a first-class status, not an error: breach checking
/// is advisory and network unavailability must never block credential
/// generation. `Unknown` means the check never ran; the two are never
/// conflated with `Clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BreachStatus {
    Unknown,
    Clean,
    Compromised { count: u64 },
    CheckFailed,
}

/// The first five uppercase-hex characters of a candidate's SHA-1
/// digest. This is the only hash material that ever leaves the process;
/// the fixed-size array makes a wider payload unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashPrefix([u8; PREFIX_LEN]);

impl HashPrefix {
    pub fn as_str(&self) -> &str {
        // constructed only from hex-encoded output, always ASCII
        std::str::from_utf8(&self.0).expect("hash prefix is ASCII hex")
    }
}

impl fmt::Display for HashPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a candidate's SHA-1 digest into the disclosed prefix and the
/// locally retained suffix.
fn hash_parts(secret: &str) -> (HashPrefix, String) {
    let digest = Sha1::digest(secret.as_bytes());
    let hex = hex::encode_upper(digest);

    let mut prefix = [0u8; PREFIX_LEN];
    prefix.copy_from_slice(&hex.as_bytes()[..PREFIX_LEN]);
    (HashPrefix(prefix), hex[PREFIX_LEN..].to_string())
}

/// Scan `SUFFIX:COUNT` range-response lines for the retained suffix.
fn find_suffix(body: &str, suffix: &str) -> Option<u64> {
    for line in body.lines() {
        if let Some((candidate, count)) = line.trim().split_once(':') {
            if candidate.eq_ignore_ascii_case(suffix) {
                return Some(count.trim().parse().unwrap_or(1));
            }
        }
    }
    None
}

/// k-anonymity client for the breach oracle.
#[derive(Debug, Clone)]
pub struct BreachOracleClient {
    client: Client,
    endpoint: String,
}

impl BreachOracleClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Build a client against a non-default endpoint (used by tests).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Check a candidate against the breach corpus. Never fails: any
    /// transport or protocol problem degrades to `CheckFailed`.
    pub async fn check(&self, secret: &str) -> BreachStatus {
        let (prefix, suffix) = hash_parts(secret);

        let body = match self.query_range(&prefix).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Breach check failed: {}", e);
                return BreachStatus::CheckFailed;
            }
        };

        match find_suffix(&body, &suffix) {
            Some(count) => BreachStatus::Compromised { count },
            None => BreachStatus::Clean,
        }
    }

    /// Range query against the oracle. The signature admits only a
    /// `HashPrefix`, so no more than five hash characters can reach the
    /// wire.
    async fn query_range(&self, prefix: &HashPrefix) -> Result<String> {
        let url = format!("{}{}", self.endpoint, prefix);
        debug!("Range query for prefix {}", prefix);

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

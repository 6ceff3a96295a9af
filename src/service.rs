use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::breach::{BreachOracleClient, BreachStatus};
use crate::config::{ConstraintSpec, Mode};
use crate::entropy::{self, CrackTime};
use crate::error::{Error, Result};
use crate::generator::{self, RawCandidate};
use crate::stats::RunStats;
use crate::wordlist::Wordlist;

/// Regenerations allowed when the oracle reports a candidate as
/// breached. Best-effort: past this limit the candidate is returned
/// tagged `Compromised` rather than failing the request.
const BREACH_REGEN_LIMIT: u32 = 5;

/// In-flight batch items, bounded so a large batch does not overwhelm
/// the breach oracle.
const BATCH_CONCURRENCY: usize = 4;

/// Final output of one generation request. Owned solely by the caller;
/// the service keeps no reference to it and never writes the secret to
/// disk or logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialResult {
    pub secret: String,
    pub entropy_bits: f64,
    pub crack_times: Vec<CrackTime>,
    pub breach: BreachStatus,

    /// Fresh draws consumed, summed across breach regenerations.
    pub attempts: u32,
}

/// Orchestrates generation, entropy scoring and breach checking. This is
/// the only component the CLI shell calls.
#[derive(Clone, Default)]
pub struct CredentialService {
    wordlist: Option<Arc<Wordlist>>,
    breach: Option<BreachOracleClient>,
    stats: Arc<RunStats>,
}

impl CredentialService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the wordlist used for passphrase mode.
    pub fn with_wordlist(mut self, wordlist: Arc<Wordlist>) -> Self {
        self.wordlist = Some(wordlist);
        self
    }

    /// Attach the breach oracle client. Without one, breach status stays
    /// `Unknown` even when the spec enables checking.
    pub fn with_breach_client(mut self, client: BreachOracleClient) -> Self {
        self.breach = Some(client);
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Generate a single credential according to the spec.
    pub async fn generate(&self, spec: &ConstraintSpec) -> Result<CredentialResult> {
        spec.validate()?;

        let mut total_attempts: u32 = 0;
        let mut regenerations: u32 = 0;

        loop {
            let raw = self.draw(spec)?;
            total_attempts += raw.attempts;

            let breach = match (&self.breach, spec.checks.breach) {
                (Some(client), true) => client.check(&raw.secret).await,
                _ => BreachStatus::Unknown,
            };

            if let BreachStatus::Compromised { count } = breach {
                if regenerations < BREACH_REGEN_LIMIT {
                    regenerations += 1;
                    debug!(
                        "Candidate found in breach corpus ({} occurrences), \
                         regenerating ({}/{})",
                        count, regenerations, BREACH_REGEN_LIMIT
                    );
                    let mut discarded = raw.secret;
                    discarded.zeroize();
                    continue;
                }

                warn!(
                    "Candidate still in breach corpus after {} regenerations \
                     ({} occurrences); returning it flagged as compromised",
                    BREACH_REGEN_LIMIT, count
                );
                self.stats.record_compromised();
            }

            if breach == BreachStatus::CheckFailed {
                self.stats.record_check_failure();
            }
            self.stats.record_generated(total_attempts);

            let report = entropy::estimate(raw.units, raw.pool_size);
            return Ok(CredentialResult {
                secret: raw.secret,
                entropy_bits: report.bits,
                crack_times: report.crack_times,
                breach,
                attempts: total_attempts,
            });
        }
    }

    /// Generate `spec.count` independent credentials with bounded
    /// concurrency. The returned order preserves request order; batch
    /// items are not transactional, so one item's failure leaves the
    /// others untouched.
    pub async fn generate_batch(
        &self,
        spec: &ConstraintSpec,
    ) -> Vec<Result<CredentialResult>> {
        stream::iter(0..spec.count)
            .map(|_| self.generate(spec))
            .buffered(BATCH_CONCURRENCY)
            .collect()
            .await
    }

    fn draw(&self, spec: &ConstraintSpec) -> Result<RawCandidate> {
        match spec.mode {
            Mode::Random => generator::generate_password(spec),
            Mode::Passphrase => {
                let wordlist =
                    self.wordlist.as_ref().ok_or(Error::MissingWordlist)?;
                generator::generate_passphrase(spec, wordlist)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breach::stub;
    use sha1::{Digest, Sha1};

    fn no_breach_spec() -> ConstraintSpec {
        let mut spec = ConstraintSpec::default();
        spec.checks.breach = false;
        spec
    }

    #[tokio::test]
    async fn test_generate_without_breach_client_is_unknown() {
        let service = CredentialService::new();
        let mut spec = ConstraintSpec::default();
        spec.random.length = 14;

        let result = service.generate(&spec).await.unwrap();
        assert_eq!(result.secret.chars().count(), 14);
        assert_eq!(result.breach, BreachStatus::Unknown);
        assert!(result.attempts >= 1);

        let expected_bits = 14.0 * 94f64.log2();
        assert!((result.entropy_bits - expected_bits).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_passphrase_without_wordlist_fails() {
        let service = CredentialService::new();
        let spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };

        let err = service.generate(&spec).await.unwrap_err();
        assert!(matches!(err, Error::MissingWordlist));
    }

    #[tokio::test]
    async fn test_clean_breach_check_flows_through() {
        let stub = stub::spawn("0018A45C4D1DEF81644B54AB7F969B88D65:3\r\n").await;
        let client = BreachOracleClient::with_endpoint(&stub.endpoint).unwrap();
        let service = CredentialService::new().with_breach_client(client);

        let result = service.generate(&ConstraintSpec::default()).await.unwrap();
        assert_eq!(result.breach, BreachStatus::Clean);
    }

    #[tokio::test]
    async fn test_failed_check_never_blocks_generation() {
        let client =
            BreachOracleClient::with_endpoint("http://127.0.0.1:9/range/").unwrap();
        let service = CredentialService::new().with_breach_client(client);

        let result = service.generate(&ConstraintSpec::default()).await.unwrap();
        assert_eq!(result.breach, BreachStatus::CheckFailed);
        assert!(!result.secret.is_empty());
        assert_eq!(service.stats().check_failures(), 1);
    }

    #[tokio::test]
    async fn test_compromised_regeneration_gives_up_gracefully() {
        // a one-word wordlist makes every draw identical, so the stub can
        // be primed with that candidate's own hash suffix
        let secret = "echo-echo-echo-echo";
        let digest = Sha1::digest(secret.as_bytes());
        let hash = hex::encode_upper(digest);
        let body = format!("{}:77\r\n", &hash[5..]);

        let stub = stub::spawn(&body).await;
        let client = BreachOracleClient::with_endpoint(&stub.endpoint).unwrap();
        let wordlist = Arc::new(Wordlist::new(vec!["echo".to_string()]));
        let service = CredentialService::new()
            .with_wordlist(wordlist)
            .with_breach_client(client);

        let mut spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        spec.passphrase.words = 4;

        let result = service.generate(&spec).await.unwrap();
        assert_eq!(result.secret, secret);
        assert_eq!(result.breach, BreachStatus::Compromised { count: 77 });
        // one initial draw plus five regenerations
        assert_eq!(result.attempts, 6);
        assert_eq!(service.stats().compromised(), 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_count() {
        let service = CredentialService::new();
        let mut spec = no_breach_spec();
        spec.count = 5;

        let results = service.generate_batch(&spec).await;
        assert_eq!(results.len(), 5);

        let secrets: Vec<String> = results
            .into_iter()
            .map(|r| r.unwrap().secret)
            .collect();
        for (i, a) in secrets.iter().enumerate() {
            for b in secrets.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert_eq!(service.stats().generated(), 5);
    }
}

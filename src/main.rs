use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use passmint::breach::{BreachOracleClient, BreachStatus};
use passmint::charset::AMBIGUOUS;
use passmint::config::{ConstraintSpec, Mode, RandomSpec};
use passmint::service::{CredentialResult, CredentialService};
use passmint::utils;
use passmint::wordlist::Wordlist;

const DEFAULT_MIN_LENGTH: usize = 12;
const DEFAULT_MAX_LENGTH: usize = 24;

/// Constraint-aware password and passphrase generator with breach checking
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Length in characters (words with --passphrase). Defaults to a
    /// random length between 12 and 24, or 6 words
    #[arg(short, long)]
    length: Option<usize>,

    /// Number of credentials to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Load the generation profile from a TOML file instead of flags
    #[arg(long)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Exclude lowercase characters (a-z)
    #[arg(long)]
    no_lower: bool,

    /// Exclude uppercase characters (A-Z)
    #[arg(long)]
    no_upper: bool,

    /// Exclude digits (0-9)
    #[arg(long)]
    no_digits: bool,

    /// Exclude symbols (!@#$...)
    #[arg(long)]
    no_symbols: bool,

    /// Exclude ambiguous characters (l, I, O, 0, 1)
    #[arg(long)]
    exclude_ambiguous: bool,

    /// Minimum number of lowercase characters
    #[arg(long, default_value_t = 0)]
    min_lower: usize,

    /// Minimum number of uppercase characters
    #[arg(long, default_value_t = 0)]
    min_upper: usize,

    /// Minimum number of digits
    #[arg(long, default_value_t = 0)]
    min_digits: usize,

    /// Minimum number of symbols
    #[arg(long, default_value_t = 0)]
    min_symbols: usize,

    /// Generate a Diceware-style passphrase instead of a random password
    #[arg(long)]
    passphrase: bool,

    /// Wordlist file: one word per line, or tab-indexed Diceware rows
    #[arg(long)]
    wordlist: Option<String>,

    /// Delimiter between passphrase words
    #[arg(long, default_value = "-")]
    delimiter: String,

    /// Capitalize the first letter of each passphrase word
    #[arg(long)]
    capitalize_words: bool,

    /// Append a random digit to the passphrase
    #[arg(long)]
    add_number: bool,

    /// Append a random symbol to the passphrase
    #[arg(long)]
    add_symbol: bool,

    /// Disable the common-pattern check
    #[arg(long)]
    no_pattern_check: bool,

    /// Disable the consecutive-repetition check
    #[arg(long)]
    no_repetition_check: bool,

    /// Skip the online breach-corpus check
    #[arg(long)]
    no_breach_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let spec = build_spec(&args)?;
    spec.validate()?;

    let mut service = CredentialService::new();

    if spec.mode == Mode::Passphrase {
        let path = args
            .wordlist
            .as_deref()
            .context("--wordlist is required for passphrase generation")?;
        let wordlist = Wordlist::load(path)?;
        service = service.with_wordlist(Arc::new(wordlist));
    }

    if spec.checks.breach {
        service = service.with_breach_client(BreachOracleClient::new()?);
    }

    let progress = (spec.count > 1 && !args.json).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_message(format!("generating {} credentials...", spec.count));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });

    let results = service.generate_batch(&spec).await;

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    if args.json {
        print_json(&results)?;
    } else {
        print_text(&spec, &results);
    }

    if spec.count > 1 {
        print_summary(&service);
    }

    if results.iter().all(|r| r.is_err()) {
        bail!("credential generation failed");
    }
    Ok(())
}

fn build_spec(args: &Args) -> Result<ConstraintSpec> {
    let mut spec = if let Some(path) = &args.config {
        ConstraintSpec::load(path)?
    } else {
        let mut spec = ConstraintSpec::default();

        if args.passphrase {
            spec.mode = Mode::Passphrase;
            spec.passphrase.words = args.length.unwrap_or(spec.passphrase.words);
            spec.passphrase.delimiter = args.delimiter.clone();
            spec.passphrase.capitalize = args.capitalize_words;
            spec.passphrase.append_digit = args.add_number;
            spec.passphrase.append_symbol = args.add_symbol;
        } else {
            spec.mode = Mode::Random;
            spec.random.include_lower = !args.no_lower;
            spec.random.include_upper = !args.no_upper;
            spec.random.include_digits = !args.no_digits;
            spec.random.include_symbols = !args.no_symbols;
            spec.random.min_lower = args.min_lower;
            spec.random.min_upper = args.min_upper;
            spec.random.min_digits = args.min_digits;
            spec.random.min_symbols = args.min_symbols;
            spec.random.exclude_ambiguous = args.exclude_ambiguous;
            spec.random.length =
                args.length.unwrap_or_else(|| default_length(&spec.random));
        }

        spec.checks.patterns = !args.no_pattern_check;
        spec.checks.repetition = !args.no_repetition_check;
        spec.checks.breach = !args.no_breach_check;
        spec
    };

    spec.count = args.count;
    Ok(spec)
}

/// Without an explicit length: a random length in 12..=24 when no
/// minimums are requested, otherwise 12 raised to cover the minimums
/// with headroom.
fn default_length(random: &RandomSpec) -> usize {
    let min_total = random.min_total();
    if min_total == 0 {
        rand::rngs::OsRng.gen_range(DEFAULT_MIN_LENGTH..=DEFAULT_MAX_LENGTH)
    } else if min_total > DEFAULT_MIN_LENGTH {
        min_total + 4
    } else {
        DEFAULT_MIN_LENGTH
    }
}

fn print_text(spec: &ConstraintSpec, results: &[passmint::error::Result<CredentialResult>]) {
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(credential) => {
                println!("\nCredential {}: {}", i + 1, credential.secret);
                println!("  Entropy: {:.2} bits", credential.entropy_bits);
                for estimate in &credential.crack_times {
                    println!(
                        "  Crack time ({}): {}",
                        estimate.profile, estimate.display
                    );
                }
                println!("  Breach check: {}", breach_message(credential.breach));

                if spec.mode == Mode::Random
                    && !spec.random.exclude_ambiguous
                    && credential.secret.chars().any(|c| AMBIGUOUS.contains(c))
                {
                    println!(
                        "  Note: contains ambiguous characters (l, I, O, 0, 1); \
                         pass --exclude-ambiguous if typing manually"
                    );
                }
            }
            Err(e) => eprintln!("\nCredential {}: failed: {}", i + 1, e),
        }
    }
}

fn breach_message(status: BreachStatus) -> String {
    match status {
        BreachStatus::Unknown => "skipped".to_string(),
        BreachStatus::Clean => "not found in known breaches".to_string(),
        BreachStatus::Compromised { count } => format!(
            "WARNING: found {} time(s) in breach corpora - do NOT use",
            count
        ),
        BreachStatus::CheckFailed => {
            "unavailable - treat as unchecked".to_string()
        }
    }
}

fn print_json(results: &[passmint::error::Result<CredentialResult>]) -> Result<()> {
    let succeeded: Vec<&CredentialResult> =
        results.iter().filter_map(|r| r.as_ref().ok()).collect();
    println!("{}", serde_json::to_string_pretty(&succeeded)?);

    for e in results.iter().filter_map(|r| r.as_ref().err()) {
        warn!("Generation failed: {}", e);
    }
    Ok(())
}

fn print_summary(service: &CredentialService) {
    let stats = service.stats();
    info!(
        "Generated {} credential(s) from {} draw(s) in {:.1}s ({:.2}/s)",
        utils::format_number(stats.generated()),
        utils::format_number(stats.draw_attempts()),
        stats.elapsed(),
        stats.rate()
    );
    if stats.compromised() > 0 {
        warn!(
            "{} credential(s) remained in the breach corpus after retries",
            stats.compromised()
        );
    }
    if stats.check_failures() > 0 {
        warn!(
            "{} breach check(s) failed; those credentials are unchecked",
            stats.check_failures()
        );
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .init();
}

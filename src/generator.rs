use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use zeroize::Zeroize;

use crate::charset::{self, CharClass, DIGITS, SYMBOLS};
use crate::config::{ConstraintSpec, RandomSpec};
use crate::csprng;
use crate::error::{Error, Result};
use crate::guard::{self, Rejection};
use crate::wordlist::Wordlist;

/// Upper bound on fresh draws before generation gives up. Bounded so a
/// near-infeasible spec surfaces a diagnostic instead of spinning.
const MAX_ATTEMPTS: u32 = 10_000;

/// A freshly drawn candidate with its provenance. Transient; never
/// persisted by the library.
#[derive(Debug)]
pub struct RawCandidate {
    pub secret: String,

    /// Fresh draws consumed, including the accepted one.
    pub attempts: u32,

    /// Effective sample-space size per drawn unit.
    pub pool_size: usize,

    /// Units drawn: characters for passwords, words for passphrases.
    pub units: usize,
}

/// Counts which validation dimension rejected each discarded draw, so an
/// exhausted retry budget can name the dominant offender.
#[derive(Debug, Default)]
struct FailureTally {
    class_minimum: u32,
    weak_token: u32,
    sequence: u32,
    repetition: u32,
}

impl FailureTally {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::WeakToken => self.weak_token += 1,
            Rejection::Sequence => self.sequence += 1,
            Rejection::Repetition => self.repetition += 1,
        }
    }

    fn dominant(&self) -> String {
        let entries = [
            ("class minimum", self.class_minimum),
            ("weak token", self.weak_token),
            ("sequential run", self.sequence),
            ("character repetition", self.repetition),
        ];
        entries
            .iter()
            .max_by_key(|(_, count)| *count)
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Generate a random-character password satisfying the spec.
///
/// Each attempt is a fresh independent draw of `length` characters,
/// uniform over the effective alphabet; rejected draws are never patched
/// in place, preserving uniformity over the accepted distribution.
/// Repeat invocations with the same spec yield unrelated outputs.
pub fn generate_password(spec: &ConstraintSpec) -> Result<RawCandidate> {
    spec.validate()?;
    let alphabet = charset::effective_alphabet(&spec.random)?;
    let length = spec.random.length;

    let mut rng = csprng();
    let mut tally = FailureTally::default();

    for attempt in 1..=MAX_ATTEMPTS {
        let mut candidate: String = (0..length)
            .map(|_| alphabet.pool()[rng.gen_range(0..alphabet.len())])
            .collect();

        if !meets_class_minimums(&candidate, &spec.random) {
            tally.class_minimum += 1;
            candidate.zeroize();
            continue;
        }

        if let Some(rejection) = guard::evaluate(&candidate, &spec.checks) {
            tally.record(rejection);
            candidate.zeroize();
            continue;
        }

        if attempt > 1 {
            debug!("accepted candidate after {} draws", attempt);
        }

        return Ok(RawCandidate {
            secret: candidate,
            attempts: attempt,
            pool_size: alphabet.len(),
            units: length,
        });
    }

    Err(Error::Exhausted {
        attempts: MAX_ATTEMPTS,
        dominant: tally.dominant(),
    })
}

/// Generate a Diceware-style passphrase from the supplied wordlist.
///
/// Words are drawn uniformly and independently; duplicate words across
/// positions are permitted. Uniform sampling is preferred over
/// artificial uniqueness.
pub fn generate_passphrase(
    spec: &ConstraintSpec,
    wordlist: &Wordlist,
) -> Result<RawCandidate> {
    spec.validate()?;
    if wordlist.is_empty() {
        return Err(Error::EmptyWordlist);
    }

    let options = &spec.passphrase;
    let mut rng = csprng();
    let mut tally = FailureTally::default();

    for attempt in 1..=MAX_ATTEMPTS {
        let mut elements: Vec<String> = (0..options.words)
            .map(|_| {
                let word = &wordlist.words()[rng.gen_range(0..wordlist.len())];
                if options.capitalize {
                    capitalize(word)
                } else {
                    word.clone()
                }
            })
            .collect();

        if options.append_digit {
            elements.push(draw_one(DIGITS, &mut rng));
        }
        if options.append_symbol {
            elements.push(draw_one(SYMBOLS, &mut rng));
        }
        if options.append_digit || options.append_symbol {
            elements.shuffle(&mut rng);
        }

        let mut candidate = elements.join(&options.delimiter);
        for element in elements.iter_mut() {
            element.zeroize();
        }

        if let Some(rejection) = guard::evaluate(&candidate, &spec.checks) {
            tally.record(rejection);
            candidate.zeroize();
            continue;
        }

        return Ok(RawCandidate {
            secret: candidate,
            attempts: attempt,
            pool_size: wordlist.len(),
            units: options.words,
        });
    }

    Err(Error::Exhausted {
        attempts: MAX_ATTEMPTS,
        dominant: tally.dominant(),
    })
}

fn meets_class_minimums(candidate: &str, random: &RandomSpec) -> bool {
    CharClass::ALL.iter().all(|&class| {
        let min = random.min_count(class);
        min == 0
            || candidate.chars().filter(|&c| class.contains(c)).count() >= min
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn draw_one(pool: &str, rng: &mut impl Rng) -> String {
    let chars: Vec<char> = pool.chars().collect();
    chars[rng.gen_range(0..chars.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::AMBIGUOUS;
    use crate::config::Mode;

    fn strict_spec() -> ConstraintSpec {
        let mut spec = ConstraintSpec::default();
        spec.random.length = 12;
        spec.random.min_upper = 1;
        spec.random.min_digits = 1;
        spec.random.min_symbols = 1;
        spec.random.exclude_ambiguous = true;
        spec
    }

    fn test_wordlist() -> Wordlist {
        Wordlist::new(
            ["echo", "gravel", "hazel", "mosaic", "tundra", "velvet"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_password_satisfies_all_constraints() {
        let spec = strict_spec();
        for _ in 0..50 {
            let raw = generate_password(&spec).unwrap();
            let secret = &raw.secret;

            assert_eq!(secret.chars().count(), 12);
            assert!(secret.chars().all(|c| !AMBIGUOUS.contains(c)));
            assert!(secret.chars().any(|c| CharClass::Upper.contains(c)));
            assert!(secret.chars().any(|c| CharClass::Digit.contains(c)));
            assert!(secret.chars().any(|c| CharClass::Symbol.contains(c)));

            let lowered = secret.to_lowercase();
            assert!(!lowered.contains("password"));
            assert!(!lowered.contains("123456"));

            let mut run = 1;
            let mut prev = None;
            for c in secret.chars() {
                run = if Some(c) == prev { run + 1 } else { 1 };
                assert!(run <= 2, "run of 3+ in {:?}", secret);
                prev = Some(c);
            }
        }
    }

    #[test]
    fn test_unsatisfiable_minimums_fail_before_any_draw() {
        let mut spec = ConstraintSpec::default();
        spec.random.length = 4;
        spec.random.min_upper = 3;
        spec.random.min_digits = 3;

        let err = generate_password(&spec).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got: {}", err);
    }

    #[test]
    fn test_minimum_counts_are_honored() {
        let mut spec = ConstraintSpec::default();
        spec.random.length = 8;
        spec.random.min_digits = 5;

        for _ in 0..20 {
            let raw = generate_password(&spec).unwrap();
            let digits = raw
                .secret
                .chars()
                .filter(|&c| CharClass::Digit.contains(c))
                .count();
            assert!(digits >= 5, "only {} digits in {:?}", digits, raw.secret);
        }
    }

    #[test]
    fn test_successive_draws_are_unrelated() {
        let spec = ConstraintSpec::default();
        let first = generate_password(&spec).unwrap();
        let second = generate_password(&spec).unwrap();
        assert_ne!(first.secret, second.secret);
    }

    #[test]
    fn test_pool_size_reflects_exclusions() {
        let mut spec = ConstraintSpec::default();
        let raw = generate_password(&spec).unwrap();
        assert_eq!(raw.pool_size, 94);

        spec.random.exclude_ambiguous = true;
        let raw = generate_password(&spec).unwrap();
        assert_eq!(raw.pool_size, 89);
    }

    #[test]
    fn test_passphrase_words_come_from_the_wordlist() {
        let wordlist = test_wordlist();
        let mut spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        spec.passphrase.words = 5;
        spec.passphrase.delimiter = ".".to_string();

        let raw = generate_passphrase(&spec, &wordlist).unwrap();
        let parts: Vec<&str> = raw.secret.split('.').collect();
        assert_eq!(parts.len(), 5);
        for part in parts {
            assert!(wordlist.words().contains(&part.to_string()));
        }
        assert_eq!(raw.units, 5);
        assert_eq!(raw.pool_size, wordlist.len());
    }

    #[test]
    fn test_passphrase_capitalization() {
        let wordlist = test_wordlist();
        let mut spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        spec.passphrase.words = 4;
        spec.passphrase.capitalize = true;

        let raw = generate_passphrase(&spec, &wordlist).unwrap();
        for part in raw.secret.split('-') {
            assert!(part.chars().next().unwrap().is_uppercase());
            assert!(wordlist
                .words()
                .contains(&part.to_lowercase()));
        }
    }

    #[test]
    fn test_duplicate_words_are_permitted() {
        // a single-word list forces duplicates in every position
        let wordlist = Wordlist::new(vec!["echo".to_string()]);
        let mut spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        spec.passphrase.words = 4;

        let raw = generate_passphrase(&spec, &wordlist).unwrap();
        assert_eq!(raw.secret, "echo-echo-echo-echo");
    }

    #[test]
    fn test_empty_wordlist_is_an_error() {
        let wordlist = Wordlist::new(Vec::new());
        let spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        let err = generate_passphrase(&spec, &wordlist).unwrap_err();
        assert!(matches!(err, Error::EmptyWordlist));
    }

    #[test]
    fn test_appended_digit_and_symbol() {
        let wordlist = test_wordlist();
        let mut spec = ConstraintSpec {
            mode: Mode::Passphrase,
            ..ConstraintSpec::default()
        };
        spec.passphrase.words = 3;
        // a drawn symbol may collide with the default "-" delimiter, so
        // join with a space here to keep the split unambiguous
        spec.passphrase.delimiter = " ".to_string();
        spec.passphrase.append_digit = true;
        spec.passphrase.append_symbol = true;

        let raw = generate_passphrase(&spec, &wordlist).unwrap();
        let parts: Vec<&str> = raw.secret.split(' ').collect();
        assert_eq!(parts.len(), 5);

        let digits = parts
            .iter()
            .filter(|p| p.len() == 1 && p.chars().all(|c| c.is_ascii_digit()))
            .count();
        let symbols = parts
            .iter()
            .filter(|p| {
                p.len() == 1 && p.chars().all(|c| SYMBOLS.contains(c))
            })
            .count();
        assert_eq!(digits, 1);
        assert_eq!(symbols, 1);
        // entropy units still count only the words
        assert_eq!(raw.units, 3);
    }
}

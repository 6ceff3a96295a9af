use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::charset::CharClass;
use crate::error::{Error, Result};

/// Generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Random,
    Passphrase,
}

/// Immutable description of what to generate. Built once per invocation
/// (from CLI flags or a TOML profile), validated up front, and read-only
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSpec {
    pub mode: Mode,

    /// Number of independent credentials to produce.
    pub count: usize,

    pub random: RandomSpec,
    pub passphrase: PassphraseSpec,
    pub checks: CheckSpec,
}

/// Options for random-character passwords.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomSpec {
    /// Password length in characters.
    pub length: usize,

    pub include_lower: bool,
    pub include_upper: bool,
    pub include_digits: bool,
    pub include_symbols: bool,

    /// Per-class minimum occurrence counts.
    pub min_lower: usize,
    pub min_upper: usize,
    pub min_digits: usize,
    pub min_symbols: usize,

    /// Drop visually confusable characters (l, I, O, 0, 1) from every class.
    pub exclude_ambiguous: bool,
}

/// Options for Diceware-style passphrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseSpec {
    /// Number of words drawn from the wordlist.
    pub words: usize,

    /// Joins the selected elements.
    pub delimiter: String,

    /// Capitalize the first letter of each word.
    pub capitalize: bool,

    /// Append one random digit as an extra element.
    pub append_digit: bool,

    /// Append one random symbol as an extra element.
    pub append_symbol: bool,
}

/// Post-generation screening toggles. A disabled check always passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSpec {
    /// Reject candidates containing common weak tokens or sequential runs.
    pub patterns: bool,

    /// Reject candidates with too many identical consecutive characters.
    pub repetition: bool,

    /// Longest permitted run of identical characters.
    pub max_run_length: usize,

    /// Cross-check the finished candidate against the breach oracle.
    pub breach: bool,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        ConstraintSpec {
            mode: Mode::Random,
            count: 1,
            random: RandomSpec::default(),
            passphrase: PassphraseSpec::default(),
            checks: CheckSpec::default(),
        }
    }
}

impl Default for RandomSpec {
    fn default() -> Self {
        RandomSpec {
            length: 16,
            include_lower: true,
            include_upper: true,
            include_digits: true,
            include_symbols: true,
            min_lower: 0,
            min_upper: 0,
            min_digits: 0,
            min_symbols: 0,
            exclude_ambiguous: false,
        }
    }
}

impl Default for PassphraseSpec {
    fn default() -> Self {
        PassphraseSpec {
            words: 6,
            delimiter: "-".to_string(),
            capitalize: false,
            append_digit: false,
            append_symbol: false,
        }
    }
}

impl Default for CheckSpec {
    fn default() -> Self {
        CheckSpec {
            patterns: true,
            repetition: true,
            max_run_length: 2,
            breach: true,
        }
    }
}

impl RandomSpec {
    pub fn includes(&self, class: CharClass) -> bool {
        match class {
            CharClass::Lower => self.include_lower,
            CharClass::Upper => self.include_upper,
            CharClass::Digit => self.include_digits,
            CharClass::Symbol => self.include_symbols,
        }
    }

    pub fn min_count(&self, class: CharClass) -> usize {
        match class {
            CharClass::Lower => self.min_lower,
            CharClass::Upper => self.min_upper,
            CharClass::Digit => self.min_digits,
            CharClass::Symbol => self.min_symbols,
        }
    }

    /// Sum of all per-class minimums.
    pub fn min_total(&self) -> usize {
        CharClass::ALL
            .iter()
            .map(|class| self.min_count(*class))
            .sum()
    }
}

impl ConstraintSpec {
    /// Load a spec from a TOML profile and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let spec: ConstraintSpec = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse profile {}: {}", path.display(), e))
        })?;

        spec.validate()?;
        Ok(spec)
    }

    /// Validate the spec once, up front. Contradictory combinations are
    /// rejected here so generation never has to discover them by
    /// exhausting its retry budget.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::Config("count must be greater than 0".to_string()));
        }

        if self.checks.max_run_length == 0 {
            return Err(Error::Config(
                "checks.max_run_length must be at least 1".to_string(),
            ));
        }

        match self.mode {
            Mode::Random => self.validate_random(),
            Mode::Passphrase => self.validate_passphrase(),
        }
    }

    fn validate_random(&self) -> Result<()> {
        let random = &self.random;

        if random.length == 0 {
            return Err(Error::Config("length must be greater than 0".to_string()));
        }

        if !CharClass::ALL.iter().any(|class| random.includes(*class)) {
            return Err(Error::Config(
                "At least one character class must be enabled".to_string(),
            ));
        }

        for class in CharClass::ALL {
            if !random.includes(class) && random.min_count(class) > 0 {
                return Err(Error::Config(format!(
                    "{} class is disabled but has a minimum count of {}",
                    class.label(),
                    random.min_count(class)
                )));
            }
        }

        let min_total = random.min_total();
        if min_total > random.length {
            return Err(Error::Config(format!(
                "minimum required characters ({}) exceed total length ({})",
                min_total, random.length
            )));
        }

        Ok(())
    }

    fn validate_passphrase(&self) -> Result<()> {
        if self.passphrase.words == 0 {
            return Err(Error::Config(
                "passphrase word count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

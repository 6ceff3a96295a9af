use crate::config::RandomSpec;
use crate::error::{Error, Result};

pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";

/// All 32 printable ASCII punctuation characters.
pub const SYMBOLS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Characters commonly confused when read or typed (1/l/I, 0/O).
pub const AMBIGUOUS: &str = "lIO01";

/// Character classes a credential can draw from. The member sets are
/// pairwise disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Symbol,
}

impl CharClass {
    pub const ALL: [CharClass; 4] = [
        CharClass::Lower,
        CharClass::Upper,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    /// Full member set before any exclusion.
    pub fn members(self) -> &'static str {
        match self {
            CharClass::Lower => LOWERCASE,
            CharClass::Upper => UPPERCASE,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS,
        }
    }

    pub fn contains(self, c: char) -> bool {
        self.members().contains(c)
    }

    pub fn label(self) -> &'static str {
        match self {
            CharClass::Lower => "lowercase",
            CharClass::Upper => "uppercase",
            CharClass::Digit => "digit",
            CharClass::Symbol => "symbol",
        }
    }
}

/// The character pool actually available for sampling, after ambiguous
/// exclusion. Distinct from the nominal configured classes; entropy must
/// be computed against this, not against the configured intent.
#[derive(Debug, Clone)]
pub struct EffectiveAlphabet {
    pool: Vec<char>,
    classes: Vec<(CharClass, Vec<char>)>,
}

impl EffectiveAlphabet {
    /// Flat ordered pool of every usable character.
    pub fn pool(&self) -> &[char] {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Enabled classes with their effective member sets.
    pub fn classes(&self) -> &[(CharClass, Vec<char>)] {
        &self.classes
    }
}

/// Build the effective alphabet for a random-password spec.
///
/// Fails when no class is enabled, or when ambiguous exclusion empties a
/// class that carries a positive minimum count. Both are configuration
/// errors surfaced before any randomness is drawn.
pub fn effective_alphabet(spec: &RandomSpec) -> Result<EffectiveAlphabet> {
    let mut classes = Vec::new();

    for class in CharClass::ALL {
        if !spec.includes(class) {
            continue;
        }

        let members: Vec<char> = class
            .members()
            .chars()
            .filter(|c| !spec.exclude_ambiguous || !AMBIGUOUS.contains(*c))
            .collect();

        if members.is_empty() {
            if spec.min_count(class) > 0 {
                return Err(Error::Config(format!(
                    "{} class is empty after ambiguous exclusion but requires \
                     at least {} character(s)",
                    class.label(),
                    spec.min_count(class)
                )));
            }
            continue;
        }

        classes.push((class, members));
    }

    if classes.is_empty() {
        return Err(Error::Config(
            "At least one character class must be enabled".to_string(),
        ));
    }

    let pool: Vec<char> = classes
        .iter()
        .flat_map(|(_, members)| members.iter().copied())
        .collect();

    Ok(EffectiveAlphabet { pool, classes })
}

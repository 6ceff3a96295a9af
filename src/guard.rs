use crate::config::CheckSpec;

/// Common weak tokens. Any candidate containing one of these as a
/// case-insensitive substring is rejected outright. This is a coarse
/// screen, not a cryptographic one; false positives are acceptable and
/// entropy scoring exists as the second signal.
pub const WEAK_TOKENS: &[&str] = &[
    "password",
    "123456",
    "qwerty",
    "asdfgh",
    "zxcvbn",
    "qazwsx",
    "password123",
    "admin",
    "abcdef",
    "111111",
    "222222",
    "333333",
    "john",
    "mary",
];

/// Shortest ascending or descending codepoint run treated as sequential.
const SEQUENTIAL_RUN: usize = 4;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    WeakToken,
    Sequence,
    Repetition,
}

impl Rejection {
    pub fn label(self) -> &'static str {
        match self {
            Rejection::WeakToken => "weak token",
            Rejection::Sequence => "sequential run",
            Rejection::Repetition => "character repetition",
        }
    }
}

/// Screen a finished candidate against the enabled checks. Returns the
/// first check that failed, or `None` when the candidate is acceptable.
///
/// Evaluation is deterministic: re-screening an accepted candidate with
/// the same spec always accepts it again.
pub fn evaluate(candidate: &str, checks: &CheckSpec) -> Option<Rejection> {
    if checks.patterns {
        let lowered = candidate.to_lowercase();
        if WEAK_TOKENS.iter().any(|token| lowered.contains(token)) {
            return Some(Rejection::WeakToken);
        }
        if has_sequential_run(candidate) {
            return Some(Rejection::Sequence);
        }
    }

    if checks.repetition && longest_run(candidate) > checks.max_run_length {
        return Some(Rejection::Repetition);
    }

    None
}

/// A disabled check always passes for its dimension.
pub fn is_acceptable(candidate: &str, checks: &CheckSpec) -> bool {
    evaluate(candidate, checks).is_none()
}

/// Length of the longest run of identical consecutive characters.
fn longest_run(candidate: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;

    for c in candidate.chars() {
        if Some(c) == previous {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}

/// Detects runs of `SEQUENTIAL_RUN` or more characters stepping through
/// consecutive codepoints in one direction (e.g. "abcd", "9876").
fn has_sequential_run(candidate: &str) -> bool {
    let chars: Vec<char> = candidate.chars().collect();
    let mut ascending = 1;
    let mut descending = 1;

    for pair in chars.windows(2) {
        let prev = pair[0] as i32;
        let curr = pair[1] as i32;

        ascending = if curr == prev + 1 { ascending + 1 } else { 1 };
        descending = if curr == prev - 1 { descending + 1 } else { 1 };

        if ascending >= SEQUENTIAL_RUN || descending >= SEQUENTIAL_RUN {
            return true;
        }
    }

    false
}

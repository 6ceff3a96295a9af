use serde::{Deserialize, Serialize};

use crate::utils;

/// Named attacker guessing-rate profile.
#[derive(Debug, Clone, Copy)]
pub struct AttackerProfile {
    pub name: &'static str,
    pub guesses_per_second: f64,
}

/// Default attacker-rate table. The table is configuration data; adding
/// a profile requires no change to the estimation algorithm.
pub const ATTACKER_PROFILES: &[AttackerProfile] = &[
    AttackerProfile {
        name: "online throttled",
        guesses_per_second: 1e2,
    },
    AttackerProfile {
        name: "offline slow hash",
        guesses_per_second: 1e4,
    },
    AttackerProfile {
        name: "offline fast hash",
        guesses_per_second: 1e10,
    },
];

/// Crack-time estimate under one attacker profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrackTime {
    pub profile: String,
    pub display: String,
}

/// Information-theoretic strength of a generated credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyReport {
    pub bits: f64,
    pub crack_times: Vec<CrackTime>,
}

/// Estimate entropy for `units` independent uniform draws from a pool of
/// `pool_size` alternatives, using the default attacker table.
///
/// The pool size must be the *effective* sample space actually used for
/// generation (post ambiguous-exclusion), not the configured intent.
pub fn estimate(units: usize, pool_size: usize) -> EntropyReport {
    estimate_with(ATTACKER_PROFILES, units, pool_size)
}

/// Estimate entropy against a caller-supplied attacker table.
pub fn estimate_with(
    profiles: &[AttackerProfile],
    units: usize,
    pool_size: usize,
) -> EntropyReport {
    let bits = if pool_size == 0 {
        0.0
    } else {
        units as f64 * (pool_size as f64).log2()
    };

    let crack_times = profiles
        .iter()
        .map(|profile| CrackTime {
            profile: profile.name.to_string(),
            display: utils::format_duration(expected_seconds(
                bits,
                profile.guesses_per_second,
            )),
        })
        .collect();

    EntropyReport { bits, crack_times }
}

/// Expected seconds to reach 50% keyspace coverage: 2^(bits-1) guesses.
/// An estimate, never a guarantee.
fn expected_seconds(bits: f64, guesses_per_second: f64) -> f64 {
    if bits <= 0.0 {
        return 0.0;
    }
    (bits - 1.0).exp2() / guesses_per_second
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_random_mode_bits() {
        // 12 characters over an 89-character effective alphabet
        let report = estimate(12, 89);
        let expected = 12.0 * 89f64.log2();
        assert!((report.bits - expected).abs() < TOLERANCE);
    }

    #[test]
    fn test_passphrase_mode_bits() {
        // 6 words over the 7776-word Diceware list
        let report = estimate(6, 7776);
        let expected = 6.0 * 7776f64.log2();
        assert!((report.bits - expected).abs() < TOLERANCE);
        // log2(6^5) * 6 is about 77.5 bits
        assert!(report.bits > 77.0 && report.bits < 78.0);
    }

    #[test]
    fn test_empty_pool_has_zero_bits() {
        let report = estimate(10, 0);
        assert_eq!(report.bits, 0.0);
    }

    #[test]
    fn test_report_covers_every_profile() {
        let report = estimate(16, 94);
        assert_eq!(report.crack_times.len(), ATTACKER_PROFILES.len());
        for (estimate, profile) in report.crack_times.iter().zip(ATTACKER_PROFILES) {
            assert_eq!(estimate.profile, profile.name);
            assert!(!estimate.display.is_empty());
        }
    }

    #[test]
    fn test_faster_attacker_means_shorter_time() {
        let short = expected_seconds(40.0, 1e10);
        let long = expected_seconds(40.0, 1e2);
        assert!(short < long);
    }

    #[test]
    fn test_huge_keyspace_renders_as_centuries() {
        let report = estimate(64, 94);
        for estimate in &report.crack_times {
            assert_eq!(estimate.display, "centuries");
        }
    }

    #[test]
    fn test_custom_profile_table() {
        let table = &[AttackerProfile {
            name: "test rig",
            guesses_per_second: 1.0,
        }];
        let report = estimate_with(table, 1, 2);
        assert_eq!(report.crack_times.len(), 1);
        assert_eq!(report.crack_times[0].profile, "test rig");
        // 1 bit, 2^0 = 1 guess at 1/s
        assert_eq!(report.crack_times[0].display, "1.0s");
    }
}

/// XP divisor in the level curve: level = floor(1 + sqrt(xp / 50)).
pub const XP_LEVEL_DIVISOR: u32 = 50;

/// Level for a given XP total. Computed in integer arithmetic so the
/// boundaries are exact: level(0) = 1, level(50) = 2, level(200) = 3.
pub fn level_for_xp(xp: u32) -> u32 {
    1 + isqrt(xp / XP_LEVEL_DIVISOR)
}

/// Minimum XP required to hold a level: 50 * (level - 1)^2.
/// Inverse boundary of `level_for_xp`.
pub fn xp_threshold_for_level(level: u32) -> u32 {
    let steps = level.saturating_sub(1);
    XP_LEVEL_DIVISOR * steps * steps
}

fn isqrt(n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    // f64 sqrt as a starting guess, then correct for rounding.
    let mut root = (n as f64).sqrt() as u32;
    while root.saturating_mul(root) > n {
        root -= 1;
    }
    while (root + 1).saturating_mul(root + 1) <= n {
        root += 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_level_boundaries() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(49), 1);
        assert_eq!(level_for_xp(50), 2);
        assert_eq!(level_for_xp(199), 2);
        assert_eq!(level_for_xp(200), 3);
        assert_eq!(level_for_xp(449), 3);
        assert_eq!(level_for_xp(450), 4);
    }

    #[test]
    fn level_is_monotonic_in_xp() {
        let mut previous = level_for_xp(0);
        for xp in 1..5_000 {
            let level = level_for_xp(xp);
            assert!(level >= previous, "level dropped at xp={}", xp);
            previous = level;
        }
    }

    #[test]
    fn threshold_is_the_inverse_boundary() {
        for level in 1..=30 {
            let threshold = xp_threshold_for_level(level);
            assert_eq!(level_for_xp(threshold), level);
            if threshold > 0 {
                assert_eq!(level_for_xp(threshold - 1), level - 1);
            }
        }
    }
}

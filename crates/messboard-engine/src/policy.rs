//! Expiry policy: pure functions over timestamps.

use std::time::Duration;

use messboard_types::{EpochMillis, Remaining};

/// How long a posted record stays visible.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60 * 60);

/// How often the background sweeper purges expired records.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Label shown once a record has expired.
pub const EXPIRED_LABEL: &str = "Expired";

const MS_PER_HOUR: u64 = 60 * 60 * 1000;
const MS_PER_MINUTE: u64 = 60 * 1000;

/// `created_at + ttl`, saturating.
pub fn compute_expiration(created_at: EpochMillis, ttl: Duration) -> EpochMillis {
    created_at.saturating_add(ttl)
}

/// A record is active strictly before its expiration instant.
pub fn is_active(now: EpochMillis, expires_at: EpochMillis) -> bool {
    now.is_before(expires_at)
}

/// Whole hours and leftover whole minutes until expiry, or `None` once
/// expired.
fn hours_minutes_left(now: EpochMillis, expires_at: EpochMillis) -> Option<(u64, u64)> {
    if !is_active(now, expires_at) {
        return None;
    }
    let left = now.millis_until(expires_at);
    Some((left / MS_PER_HOUR, (left % MS_PER_HOUR) / MS_PER_MINUTE))
}

/// Remaining-time label with an urgency flag.
///
/// - expired: `"Expired"`, urgent
/// - one hour or more: `"{h}h {m}m left"`, urgent only if `h < 1` (never, in
///   this branch)
/// - under an hour: `"{m}m left"`, urgent
pub fn remaining(now: EpochMillis, expires_at: EpochMillis) -> Remaining {
    match hours_minutes_left(now, expires_at) {
        None => Remaining {
            text: EXPIRED_LABEL.to_string(),
            urgent: true,
        },
        Some((hours, minutes)) if hours >= 1 => Remaining {
            text: format!("{hours}h {minutes}m left"),
            urgent: hours < 1,
        },
        Some((_, minutes)) => Remaining {
            text: format!("{minutes}m left"),
            urgent: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const H: u64 = MS_PER_HOUR;
    const M: u64 = MS_PER_MINUTE;

    fn at(ms: u64) -> EpochMillis {
        EpochMillis::new(ms)
    }

    #[test]
    fn default_ttl_is_five_hours() {
        assert_eq!(compute_expiration(at(0), DEFAULT_TTL), at(5 * H));
    }

    #[test]
    fn exactly_one_hour_left() {
        let r = remaining(at(4 * H), at(5 * H));
        assert_eq!(r.text, "1h 0m left");
        assert!(!r.urgent);
    }

    #[test]
    fn one_minute_left_is_urgent() {
        let r = remaining(at(4 * H + 59 * M), at(5 * H));
        assert_eq!(r.text, "1m left");
        assert!(r.urgent);
    }

    #[test]
    fn under_a_minute_shows_zero_minutes() {
        let r = remaining(at(5 * H - 30_000), at(5 * H));
        assert_eq!(r.text, "0m left");
        assert!(r.urgent);
    }

    #[test]
    fn boundary_is_expired() {
        let r = remaining(at(5 * H), at(5 * H));
        assert_eq!(r.text, EXPIRED_LABEL);
        assert!(r.urgent);
        assert!(!is_active(at(5 * H), at(5 * H)));
    }

    #[test]
    fn partial_minutes_are_floored() {
        let r = remaining(at(0), at(2 * H + 30 * M + 59_999));
        assert_eq!(r.text, "2h 30m left");
        assert!(!r.urgent);
    }

    proptest! {
        #[test]
        fn expiration_is_exact(created in 0u64..4_000_000_000_000, ttl_ms in 0u64..1_000_000_000) {
            let expires = compute_expiration(at(created), Duration::from_millis(ttl_ms));
            prop_assert_eq!(expires.as_millis(), created + ttl_ms);
        }

        #[test]
        fn active_iff_strictly_before(now in 0u64..10 * H, expires in 0u64..10 * H) {
            prop_assert_eq!(is_active(at(now), at(expires)), now < expires);
        }

        #[test]
        fn expired_is_always_urgent(expires in 0u64..10 * H, past in 0u64..10 * H) {
            let r = remaining(at(expires + past), at(expires));
            prop_assert_eq!(r.text.as_str(), EXPIRED_LABEL);
            prop_assert!(r.urgent);
        }

        #[test]
        fn displayed_minutes_never_increase(a in 0u64..5 * H, b in 0u64..5 * H) {
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            let expires = at(5 * H);
            let total = |now| hours_minutes_left(at(now), expires).map(|(h, m)| h * 60 + m);
            let (x, y) = (total(earlier), total(later));
            prop_assert!(x.is_some() && y.is_some());
            prop_assert!(x >= y);
        }

        #[test]
        fn urgent_iff_under_an_hour(now in 0u64..5 * H) {
            let r = remaining(at(now), at(5 * H));
            prop_assert_eq!(r.urgent, 5 * H - now < H);
        }
    }
}

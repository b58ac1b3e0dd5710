use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::estimation::window::Window;
use crate::estimation::{MAX_WAIT_MINUTES, clamp, round_half_up};
use crate::time::minutes_between;

/// Slack around the scheduled slot is this fraction of base prep, bounded.
const SLACK_FRACTION: f64 = 0.25;
const MIN_SLACK_MINUTES: i64 = 2;
const MAX_SLACK_MINUTES: i64 = 15;

/// Resolves an IANA name, falling back to `fallback` for unknown names.
pub fn resolve_timezone(name: &str, fallback: Tz) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(timezone = name, fallback = %fallback, "unresolvable merchant timezone; using fallback");
            fallback
        }
    }
}

/// Interprets merchant-local `date` (`YYYY-MM-DD`) and `time` (`HH:MM` or
/// `HH:MM:SS`) in `tz`.
///
/// `None` when either part does not parse or the wall-clock time does not
/// exist in `tz` (DST gap). Ambiguous times take the earlier instant.
pub fn resolve_scheduled_at(date: &str, time: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = parse_time_of_day(time.trim())?;

    tz.from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Window around a future scheduled slot. `None` unless `scheduled_at` is
/// strictly after `now`.
pub fn scheduled_window(
    now: DateTime<Utc>,
    scheduled_at: DateTime<Utc>,
    base_minutes: i64,
) -> Option<Window> {
    if scheduled_at <= now {
        return None;
    }

    let minutes_until = clamp(
        round_half_up(minutes_between(now, scheduled_at)),
        0,
        MAX_WAIT_MINUTES,
    );
    let slack = clamp(
        round_half_up(base_minutes as f64 * SLACK_FRACTION),
        MIN_SLACK_MINUTES,
        MAX_SLACK_MINUTES,
    );

    let min = clamp(minutes_until - slack, 0, MAX_WAIT_MINUTES);
    let max = clamp(minutes_until + slack, min, MAX_WAIT_MINUTES);

    Some(Window {
        min,
        max,
        capped_at60: max >= MAX_WAIT_MINUTES,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn thirty_minutes_out_with_base_twenty() {
        let now = Utc::now();
        let w = scheduled_window(now, now + Duration::minutes(30), 20).unwrap();

        assert_eq!(w.min, 25);
        assert_eq!(w.max, 35);
        assert!(!w.capped_at60);
    }

    #[test]
    fn slack_is_bounded() {
        let now = Utc::now();

        // base 5 -> round(1.25) = 1 -> raised to 2
        let w = scheduled_window(now, now + Duration::minutes(30), 5).unwrap();
        assert_eq!((w.min, w.max), (28, 32));

        // base 60 -> 15
        let w = scheduled_window(now, now + Duration::minutes(30), 60).unwrap();
        assert_eq!((w.min, w.max), (15, 45));
    }

    #[test]
    fn far_future_slot_saturates_at_sixty() {
        let now = Utc::now();
        let w = scheduled_window(now, now + Duration::hours(3), 20).unwrap();

        assert_eq!((w.min, w.max), (55, 60));
        assert!(w.capped_at60);
    }

    #[test]
    fn imminent_slot_floors_min_at_zero() {
        let now = Utc::now();
        let w = scheduled_window(now, now + Duration::minutes(2), 20).unwrap();

        assert_eq!((w.min, w.max), (0, 7));
    }

    #[test]
    fn past_or_present_slot_is_not_scheduled() {
        let now = Utc::now();
        assert!(scheduled_window(now, now, 20).is_none());
        assert!(scheduled_window(now, now - Duration::minutes(5), 20).is_none());
    }

    #[test]
    fn resolves_local_time_in_merchant_zone() {
        let at = resolve_scheduled_at("2026-03-10", "12:30", Tz::Asia__Jakarta).unwrap();
        // Jakarta is UTC+7 year-round
        assert_eq!(at.to_rfc3339(), "2026-03-10T05:30:00+00:00");

        let at = resolve_scheduled_at("2026-03-10", "12:30:15", Tz::UTC).unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-10T12:30:15+00:00");
    }

    #[test]
    fn garbage_date_or_time_does_not_resolve() {
        assert!(resolve_scheduled_at("10/03/2026", "12:30", Tz::UTC).is_none());
        assert!(resolve_scheduled_at("2026-03-10", "noon", Tz::UTC).is_none());
        assert!(resolve_scheduled_at("2026-02-30", "12:30", Tz::UTC).is_none());
    }

    #[test]
    fn dst_gap_does_not_resolve() {
        // 02:30 does not exist in New York on 2026-03-08
        assert!(resolve_scheduled_at("2026-03-08", "02:30", Tz::America__New_York).is_none());
    }

    #[test]
    fn unknown_timezone_falls_back() {
        assert_eq!(resolve_timezone("Asia/Jakarta", Tz::UTC), Tz::Asia__Jakarta);
        assert_eq!(resolve_timezone("Nowhere/Special", Tz::UTC), Tz::UTC);
        assert_eq!(resolve_timezone("", Tz::Europe__Berlin), Tz::Europe__Berlin);
    }

    proptest! {
        #[test]
        fn scheduled_window_stays_in_bounds(
            secs_ahead in 1_i64..(6 * 3600),
            base in 5_i64..=60,
        ) {
            let now = Utc::now();
            let w = scheduled_window(now, now + Duration::seconds(secs_ahead), base).unwrap();

            prop_assert!(0 <= w.min && w.min <= w.max && w.max <= 60);
            prop_assert_eq!(w.capped_at60, w.max == 60);
        }
    }
}

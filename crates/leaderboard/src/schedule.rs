//! Settlement due-time arithmetic.
//!
//! Combines a configured time-of-day with the current date and advances it by
//! one cycle when that candidate has already passed. The result is persisted
//! at period start; the scheduler's due-check only compares against the
//! persisted instant and never re-derives it.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use rankd_core::types::Cycle;

/// Next settlement instant for a leaderboard with the given cycle and
/// time-of-day, evaluated at `now` (all UTC).
///
/// If today's occurrence of `settlement_time` is still ahead of `now` it is
/// returned unmodified. Otherwise the candidate advances one cycle:
/// daily by 24h, weekly to the next Monday (always at least one day ahead),
/// monthly to the same day next month with the day-of-month clamped to the
/// target month's length and the year rolling at December.
pub fn next_settlement_time(
    cycle: Cycle,
    settlement_time: NaiveTime,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let candidate = now.date_naive().and_time(settlement_time).and_utc();
    if candidate > now {
        return candidate;
    }
    match cycle {
        Cycle::Daily => candidate + Duration::days(1),
        Cycle::Weekly => {
            let ahead = 7 - i64::from(candidate.weekday().num_days_from_monday());
            candidate + Duration::days(ahead)
        }
        Cycle::Monthly => add_month_clamped(candidate),
    }
}

/// Same day-of-month next month, clamped to the target month's last day.
fn add_month_clamped(dt: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if dt.month() == 12 {
        (dt.year() + 1, 1)
    } else {
        (dt.year(), dt.month() + 1)
    };
    let day = dt.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("clamped day is valid for target month")
        .and_time(dt.time())
        .and_utc()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("first of month is valid")
        .pred_opt()
        .expect("day before first of month is valid")
        .day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn midnight() -> NaiveTime {
        NaiveTime::from_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn future_candidate_is_returned_unmodified() {
        // 10:00 today, asked at 08:00 — not yet due today.
        let now = at(2026, 3, 10, 8, 0, 0);
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        for cycle in Cycle::SUPPORTED {
            assert_eq!(next_settlement_time(cycle, time, now), at(2026, 3, 10, 10, 0, 0));
        }
    }

    #[test]
    fn daily_advances_exactly_24_hours() {
        let now = at(2026, 3, 10, 12, 0, 0);
        let first = next_settlement_time(Cycle::Daily, midnight(), now);
        assert_eq!(first, at(2026, 3, 11, 0, 0, 0));

        let next_day = now + Duration::days(1);
        let second = next_settlement_time(Cycle::Daily, midnight(), next_day);
        assert_eq!(second - first, Duration::hours(24));
    }

    #[test]
    fn daily_result_is_strictly_future() {
        let now = at(2026, 3, 10, 0, 0, 0); // exactly at settlement time
        let next = next_settlement_time(Cycle::Daily, midnight(), now);
        assert!(next > now);
    }

    #[test]
    fn weekly_lands_on_next_monday() {
        // 2026-03-11 is a Wednesday.
        let now = at(2026, 3, 11, 12, 0, 0);
        let next = next_settlement_time(Cycle::Weekly, midnight(), now);
        assert_eq!(next, at(2026, 3, 16, 0, 0, 0));
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn weekly_from_monday_advances_a_full_week() {
        // 2026-03-09 is a Monday; the formula always moves at least one day.
        let now = at(2026, 3, 9, 12, 0, 0);
        let next = next_settlement_time(Cycle::Weekly, midnight(), now);
        assert_eq!(next, at(2026, 3, 16, 0, 0, 0));
    }

    #[test]
    fn weekly_from_sunday_advances_one_day() {
        // 2026-03-15 is a Sunday.
        let now = at(2026, 3, 15, 12, 0, 0);
        let next = next_settlement_time(Cycle::Weekly, midnight(), now);
        assert_eq!(next, at(2026, 3, 16, 0, 0, 0));
    }

    #[test]
    fn monthly_keeps_day_of_month() {
        let now = at(2026, 4, 15, 12, 0, 0);
        let next = next_settlement_time(Cycle::Monthly, midnight(), now);
        assert_eq!(next, at(2026, 5, 15, 0, 0, 0));
    }

    #[test]
    fn monthly_clamps_short_months() {
        // Jan 31 → Feb 28 (2026 is not a leap year).
        let now = at(2026, 1, 31, 12, 0, 0);
        let next = next_settlement_time(Cycle::Monthly, midnight(), now);
        assert_eq!(next, at(2026, 2, 28, 0, 0, 0));
    }

    #[test]
    fn monthly_clamps_to_leap_day() {
        let now = at(2028, 1, 31, 12, 0, 0);
        let next = next_settlement_time(Cycle::Monthly, midnight(), now);
        assert_eq!(next, at(2028, 2, 29, 0, 0, 0));
    }

    #[test]
    fn monthly_rolls_year_at_december() {
        let now = at(2026, 12, 10, 12, 0, 0);
        let next = next_settlement_time(Cycle::Monthly, midnight(), now);
        assert_eq!(next, at(2027, 1, 10, 0, 0, 0));
    }
}

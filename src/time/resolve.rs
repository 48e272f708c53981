//! Time Resolution Engine.
//!
//! Turns a [`TimeDescriptor`] into a local wall-clock [`NaiveDateTime`] that lies after `now`.
//! `now` is always passed in, so the engine is a pure function of its inputs.
//!
//! Bare hours (1..=12 without a half-day marker) on "today" are disambiguated by building an
//! AM and a PM candidate, rolling each one that is not after `now` forward a day, and taking
//! the one that comes soonest. Ties go to AM.
//!
//! Resolution never panics. A descriptor that cannot be placed on the calendar (a relative
//! amount past [`MAX_RELATIVE_SECS`], or arithmetic past the end of the representable range)
//! resolves to `None`.

use chrono::{Days, NaiveDateTime, NaiveTime, TimeDelta};

use super::{ClockTime, DayOffset, RelativeUnit, TimeDescriptor};

/// Smallest lead time for a relative expression. "In 0 minutes" still has to fire in the future.
const MIN_RELATIVE_LEAD_SECS: i64 = 60;

/// Furthest ahead a relative expression may reach: one leap year.
pub const MAX_RELATIVE_SECS: i64 = 366 * 86_400;

/// Length of `amount` units in whole seconds, or `None` if it is not finite or exceeds
/// [`MAX_RELATIVE_SECS`].
pub fn relative_secs(amount: f64, unit: RelativeUnit) -> Option<i64> {
    let secs = (amount * unit.seconds() as f64).round();
    (secs.is_finite() && secs <= MAX_RELATIVE_SECS as f64).then_some(secs as i64)
}

/// Resolve a descriptor against `now`.
pub fn resolve(descriptor: &TimeDescriptor, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match descriptor {
        TimeDescriptor::Relative { amount, unit } => {
            let secs = relative_secs(*amount, *unit)?.max(MIN_RELATIVE_LEAD_SECS);
            now.checked_add_signed(TimeDelta::try_seconds(secs)?)
        }
        TimeDescriptor::Absolute(clock) => resolve_clock_time(clock, now),
    }
}

/// Resolve an absolute clock time against `now`.
pub fn resolve_clock_time(clock: &ClockTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let hour = clock.hour.min(23);
    let minute = clock.minute.min(59);

    match clock.day {
        DayOffset::Tomorrow | DayOffset::DayAfterTomorrow => {
            at_on_day(now, clock.day.days(), hour, minute)
        }
        DayOffset::Today if clock.bare_hour && (1..=12).contains(&hour) => {
            nearest_half_day(now, hour, minute)
        }
        DayOffset::Today => next_occurrence(now, hour, minute),
    }
}

/// `hour:minute:00` on the date `days` after `now`'s date.
fn at_on_day(now: NaiveDateTime, days: u64, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let date = now.date().checked_add_days(Days::new(days))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

/// Today at `hour:minute`, or tomorrow if that is not strictly after `now`.
fn next_occurrence(now: NaiveDateTime, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let today = at_on_day(now, 0, hour, minute)?;
    if today > now {
        Some(today)
    } else {
        today.checked_add_days(Days::new(1))
    }
}

/// Soonest future reading of an hour spoken without AM/PM.
///
/// 12 reads as midnight (AM) or noon (PM); any other `h` reads as `h` or `h + 12`.
fn nearest_half_day(now: NaiveDateTime, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let (am_hour, pm_hour) = if hour == 12 { (0, 12) } else { (hour, hour + 12) };

    let am = next_occurrence(now, am_hour, minute);
    let pm = next_occurrence(now, pm_hour, minute);

    match (am, pm) {
        (Some(am), Some(pm)) if pm < am => Some(pm),
        (Some(am), _) => Some(am),
        (None, pm) => pm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::RelativeUnit;
    use chrono::{NaiveDate, Timelike};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        // 2024-06-03 is a Monday.
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn bare(hour: u32) -> TimeDescriptor {
        TimeDescriptor::at(DayOffset::Today, hour, 0, true)
    }

    #[test]
    fn relative_minutes_from_now() {
        let now = at(3, 14, 0);
        let got = resolve(&TimeDescriptor::relative(30.0, RelativeUnit::Minute), now).unwrap();
        assert_eq!(got, at(3, 14, 30));
    }

    #[test]
    fn relative_fractional_hours() {
        let now = at(3, 14, 0);
        let got = resolve(&TimeDescriptor::relative(0.5, RelativeUnit::Hour), now).unwrap();
        assert_eq!(got, at(3, 14, 30));
    }

    #[test]
    fn relative_zero_is_still_in_the_future() {
        let now = at(3, 14, 0);
        let got = resolve(&TimeDescriptor::relative(0.0, RelativeUnit::Minute), now).unwrap();
        assert!(got > now);
    }

    #[test]
    fn relative_days() {
        let now = at(3, 9, 15);
        let got = resolve(&TimeDescriptor::relative(2.0, RelativeUnit::Day), now).unwrap();
        assert_eq!(got, at(5, 9, 15));
    }

    #[test]
    fn tomorrow_uses_given_clock_time() {
        let now = at(3, 22, 41);
        let got = resolve(&TimeDescriptor::at(DayOffset::Tomorrow, 7, 30, false), now).unwrap();
        assert_eq!(got, at(4, 7, 30));
    }

    #[test]
    fn tomorrow_bare_hour_is_not_disambiguated() {
        let now = at(3, 10, 0);
        let got = resolve(&TimeDescriptor::at(DayOffset::Tomorrow, 3, 0, true), now).unwrap();
        assert_eq!(got, at(4, 3, 0));
    }

    #[test]
    fn day_after_tomorrow_zeroes_seconds() {
        let now = at(3, 10, 0) + TimeDelta::seconds(17);
        let got = resolve(&TimeDescriptor::at(DayOffset::DayAfterTomorrow, 9, 0, false), now).unwrap();
        assert_eq!(got, at(5, 9, 0));
        assert_eq!(got.second(), 0);
    }

    #[test]
    fn today_passed_time_rolls_to_tomorrow() {
        let now = at(3, 18, 0);
        let got = resolve(&TimeDescriptor::at(DayOffset::Today, 17, 0, false), now).unwrap();
        assert_eq!(got, at(4, 17, 0));
    }

    #[test]
    fn today_exact_now_rolls_to_tomorrow() {
        let now = at(3, 17, 0);
        let got = resolve(&TimeDescriptor::at(DayOffset::Today, 17, 0, false), now).unwrap();
        assert_eq!(got, at(4, 17, 0));
    }

    #[test]
    fn bare_hour_in_24h_range_is_taken_literally() {
        let now = at(3, 9, 0);
        let got = resolve(&TimeDescriptor::at(DayOffset::Today, 17, 0, true), now).unwrap();
        assert_eq!(got, at(3, 17, 0));
    }

    #[test]
    fn bare_three_on_monday_morning_is_afternoon() {
        let now = at(3, 9, 0);
        assert_eq!(resolve(&bare(3), now), Some(at(3, 15, 0)));
    }

    #[test]
    fn bare_one_just_before_midnight_is_early_morning() {
        let now = at(3, 23, 50);
        assert_eq!(resolve(&bare(1), now), Some(at(4, 1, 0)));
    }

    #[test]
    fn bare_twelve_means_noon_or_midnight() {
        assert_eq!(resolve(&bare(12), at(3, 9, 0)), Some(at(3, 12, 0)));
        assert_eq!(resolve(&bare(12), at(3, 13, 0)), Some(at(4, 0, 0)));
    }

    #[test]
    fn bare_hour_keeps_minutes() {
        let now = at(3, 20, 0);
        let got = resolve(&TimeDescriptor::at(DayOffset::Today, 8, 30, true), now).unwrap();
        assert_eq!(got, at(3, 20, 30));
    }

    #[test]
    fn bare_hour_is_always_the_soonest_future_reading() {
        // Every bare hour against every quarter-hour of a day.
        for h in 1..=12u32 {
            for quarter in 0..96u32 {
                let now = at(3, quarter / 4, (quarter % 4) * 15);
                let got = resolve(&bare(h), now).unwrap();

                let (am_h, pm_h) = if h == 12 { (0, 12) } else { (h, h + 12) };
                let candidates: Vec<NaiveDateTime> = [am_h, pm_h]
                    .iter()
                    .map(|&ch| {
                        let t = at(3, ch, 0);
                        if t > now { t } else { t + Days::new(1) }
                    })
                    .collect();
                let best = *candidates.iter().min().unwrap();

                assert!(got > now, "h={h} now={now}: {got} not in the future");
                assert_eq!(got, best, "h={h} now={now}");
            }
        }
    }

    #[test]
    fn largest_relative_amounts_resolve() {
        let now = at(3, 9, 0);
        let got = resolve(&TimeDescriptor::relative(366.0, RelativeUnit::Day), now).unwrap();
        assert_eq!(got, now + TimeDelta::days(366));

        let got = resolve(&TimeDescriptor::relative(527_040.0, RelativeUnit::Minute), now);
        assert_eq!(got, Some(now + TimeDelta::days(366)));
    }

    #[test]
    fn oversized_relative_amounts_do_not_resolve() {
        let now = at(3, 9, 0);
        for (amount, unit) in [
            (367.0, RelativeUnit::Day),
            (999_999_999.0, RelativeUnit::Day),
            (1e300, RelativeUnit::Minute),
            (f64::INFINITY, RelativeUnit::Hour),
            (f64::NAN, RelativeUnit::Minute),
        ] {
            let got = resolve(&TimeDescriptor::relative(amount, unit), now);
            assert_eq!(got, None, "{amount} {unit}");
        }
    }

    #[test]
    fn negative_relative_amount_still_leads_by_a_minute() {
        let now = at(3, 9, 0);
        let got = resolve(&TimeDescriptor::relative(-1e300, RelativeUnit::Day), now);
        assert_eq!(got, Some(now + TimeDelta::minutes(1)));
    }

    #[test]
    fn end_of_calendar_does_not_panic() {
        let now = NaiveDateTime::MAX - TimeDelta::minutes(30);
        assert_eq!(resolve(&TimeDescriptor::relative(1.0, RelativeUnit::Hour), now), None);
        assert_eq!(
            resolve(&TimeDescriptor::at(DayOffset::Tomorrow, 9, 0, false), now),
            None
        );
        assert_eq!(resolve(&bare(11), now), None);
    }
}

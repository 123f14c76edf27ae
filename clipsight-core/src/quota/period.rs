use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

/// Calendar-day stamp (`YYYY-MM-DD`, UTC) used as the period marker for all
/// daily counters. All callers must use the same reference timezone, so this
/// is fixed to UTC rather than the caller's locale.
pub fn day_stamp(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

/// The instant the current daily period ends: midnight UTC of the next day.
/// Anonymous counter entries expire at this instant and the rate-limit reset
/// header advertises it.
pub fn next_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDate::MAX);
    Utc.from_utc_datetime(&tomorrow.and_hms_opt(0, 0, 0).expect("midnight is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_stamp_is_calendar_day_not_rolling_window() {
        let late = Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap();
        assert_eq!(day_stamp(late), "2024-03-14");
        assert_eq!(day_stamp(early), "2024-03-15");
    }

    #[test]
    fn next_midnight_is_start_of_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 10, 30, 0).unwrap();
        let reset = next_midnight(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_midnight_just_before_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let reset = next_midnight(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}

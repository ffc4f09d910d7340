//! Weekly schedule strings ("DAILY", "MON,WED,FRI", "SUN SAT", ...).
//!
//! Timetable rows carry a free-text running-days column and restaurants
//! carry an equally free-text weekly-off column. Both share this grammar.

use chrono::{Datelike, NaiveDate, Weekday};

use super::time::parse_iso_date;

/// Three-letter upper-case code for a weekday.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "SUN",
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
    }
}

/// A parsed weekly schedule.
///
/// # Examples
///
/// ```
/// use railmeal_server::domain::RunningDays;
/// use chrono::NaiveDate;
///
/// let wed = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let thu = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
///
/// let days = RunningDays::parse(Some("mon, wed/fri"));
/// assert!(days.runs_on(wed));
/// assert!(!days.runs_on(thu));
///
/// assert!(RunningDays::parse(Some("DAILY")).runs_on(thu));
/// assert!(RunningDays::parse(None).runs_on(thu));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunningDays {
    /// Nothing recorded; no restriction.
    Unspecified,
    /// "DAILY" or "ALL".
    Daily,
    /// Upper-cased tokens of the schedule string.
    Tokens(Vec<String>),
}

impl RunningDays {
    /// Parse a schedule string. Null or blank means unspecified.
    pub fn parse(schedule: Option<&str>) -> Self {
        let Some(schedule) = schedule.map(str::trim).filter(|s| !s.is_empty()) else {
            return RunningDays::Unspecified;
        };

        let upper = schedule.to_uppercase();
        if upper == "DAILY" || upper == "ALL" {
            return RunningDays::Daily;
        }

        let tokens = upper
            .split([' ', ',', '/'])
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        RunningDays::Tokens(tokens)
    }

    /// Whether the schedule includes the weekday of `date`.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        match self {
            RunningDays::Unspecified | RunningDays::Daily => true,
            RunningDays::Tokens(tokens) => {
                let code = weekday_code(date.weekday());
                tokens.iter().any(|t| t == code)
            }
        }
    }

    /// Like [`runs_on`](Self::runs_on) for an unvalidated ISO date string.
    ///
    /// An unparseable date is treated as not running.
    pub fn runs_on_iso(&self, date: &str) -> bool {
        parse_iso_date(date).is_ok_and(|d| self.runs_on(d))
    }
}

/// Days on which a restaurant is closed.
///
/// Uses the running-days grammar, but an empty schedule means "never closed"
/// and "DAILY"/"ALL" means closed every day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeeklyOff(Option<RunningDays>);

impl WeeklyOff {
    pub fn parse(schedule: Option<&str>) -> Self {
        match RunningDays::parse(schedule) {
            RunningDays::Unspecified => WeeklyOff(None),
            days => WeeklyOff(Some(days)),
        }
    }

    /// Whether the restaurant is off on `date`.
    pub fn is_off(&self, date: NaiveDate) -> bool {
        self.0.as_ref().is_some_and(|days| days.runs_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2025-01-06 is a Monday
    fn week() -> Vec<NaiveDate> {
        (6..13).map(|d| date(2025, 1, d)).collect()
    }

    #[test]
    fn weekday_codes() {
        let codes: Vec<_> = week().iter().map(|d| weekday_code(d.weekday())).collect();
        assert_eq!(codes, ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"]);
    }

    #[test]
    fn daily_and_all_match_every_day() {
        for schedule in ["DAILY", "daily", " All "] {
            let days = RunningDays::parse(Some(schedule));
            assert_eq!(days, RunningDays::Daily);
            assert!(week().into_iter().all(|d| days.runs_on(d)));
        }
    }

    #[test]
    fn null_or_blank_is_permissive() {
        assert_eq!(RunningDays::parse(None), RunningDays::Unspecified);
        assert_eq!(RunningDays::parse(Some("   ")), RunningDays::Unspecified);
        assert!(RunningDays::parse(Some("")).runs_on(date(2025, 1, 7)));
    }

    #[test]
    fn mixed_delimiters() {
        let days = RunningDays::parse(Some("Mon/Wed, fri SUN"));
        let matches: Vec<_> = week().into_iter().map(|d| days.runs_on(d)).collect();
        assert_eq!(matches, [true, false, true, false, true, false, true]);
    }

    #[test]
    fn full_day_names_do_not_match() {
        let days = RunningDays::parse(Some("MONDAY"));
        assert!(!days.runs_on(date(2025, 1, 6)));
    }

    #[test]
    fn bad_iso_date_fails_closed() {
        let days = RunningDays::parse(Some("DAILY"));
        assert!(days.runs_on_iso("2025-01-06"));
        assert!(!days.runs_on_iso("06/01/2025"));
        assert!(!days.runs_on_iso(""));
    }

    #[test]
    fn weekly_off() {
        let off = WeeklyOff::parse(Some("TUE"));
        assert!(off.is_off(date(2025, 1, 7)));
        assert!(!off.is_off(date(2025, 1, 8)));
        assert!(!WeeklyOff::parse(None).is_off(date(2025, 1, 7)));
        assert!(!WeeklyOff::default().is_off(date(2025, 1, 7)));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (2000i32..2100, 1u32..=366).prop_filter_map("valid ordinal", |(y, o)| {
            NaiveDate::from_yo_opt(y, o)
        })
    }

    proptest! {
        #[test]
        fn mon_wed_fri_only(d in any_date()) {
            let days = RunningDays::parse(Some("MON,WED,FRI"));
            let expected = matches!(d.weekday(), Weekday::Mon | Weekday::Wed | Weekday::Fri);
            prop_assert_eq!(days.runs_on(d), expected);
        }

        #[test]
        fn daily_always(d in any_date()) {
            prop_assert!(RunningDays::parse(Some("DAILY")).runs_on(d));
        }

        #[test]
        fn null_always(d in any_date()) {
            prop_assert!(RunningDays::parse(None).runs_on(d));
        }
    }
}

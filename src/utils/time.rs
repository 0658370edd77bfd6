use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Rolling "uploaded since" window used by job history filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateWindow {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl DateWindow {
    /// Earliest instant still inside the window ending at `now`.
    /// `Today` means the last 24 hours, not the calendar day.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateWindow::Today => now - Duration::days(1),
            DateWindow::Week => now - Duration::days(7),
            DateWindow::Month => months_before(now, 1),
            DateWindow::ThreeMonths => months_before(now, 3),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        at >= self.cutoff(now)
    }
}

// Month arithmetic clamps to the last valid day; it only fails far outside
// any realistic feed date, where falling back to 31-day months is fine.
fn months_before(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or_else(|| now - Duration::days(31 * i64::from(months)))
}

/// Same UTC calendar day.
pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_today_is_last_24_hours() {
        let cutoff = DateWindow::Today.cutoff(now());
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 30, 12, 0, 0).unwrap());
        assert!(DateWindow::Today.contains(cutoff, now()));
        assert!(!DateWindow::Today.contains(cutoff - Duration::seconds(1), now()));
    }

    #[test]
    fn test_month_windows_clamp_day() {
        // 31 May minus one month clamps to 30 April
        assert_eq!(
            DateWindow::Month.cutoff(now()),
            Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap()
        );
        assert_eq!(
            DateWindow::ThreeMonths.cutoff(now()),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_names() {
        let window: DateWindow = serde_json::from_str("\"3months\"").unwrap();
        assert_eq!(window, DateWindow::ThreeMonths);
        assert_eq!(serde_json::to_string(&DateWindow::Week).unwrap(), "\"week\"");
    }

    #[test]
    fn test_is_same_day() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 31, 0, 5, 0).unwrap();
        assert!(is_same_day(morning, now()));
        assert!(!is_same_day(morning - Duration::hours(1), now()));
    }
}

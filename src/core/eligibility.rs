use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Minimum number of days between two donations
pub const ELIGIBILITY_WINDOW_DAYS: i64 = 90;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Donation interval policy
///
/// A donor with no recorded donation is always eligible. Otherwise the donor
/// becomes eligible once `window_days` whole days have elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub window_days: i64,
}

impl EligibilityPolicy {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    pub fn is_eligible(&self, last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match elapsed_days(last_donation, now) {
            None => true,
            Some(days) => days >= self.window_days,
        }
    }

    /// Days left until the donor may donate again, `None` when already eligible
    pub fn days_remaining(
        &self,
        last_donation: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        let days = elapsed_days(last_donation, now)?;
        if days >= self.window_days {
            None
        } else {
            Some(self.window_days - days)
        }
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(ELIGIBILITY_WINDOW_DAYS)
    }
}

/// Whole days elapsed since the last donation, floored
///
/// A date in the future gives a negative count.
pub fn elapsed_days(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    let last = last_donation?;
    let millis = (now - last).num_milliseconds();
    Some(millis.div_euclid(MILLIS_PER_DAY))
}

pub fn is_eligible(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    EligibilityPolicy::default().is_eligible(last_donation, now)
}

pub fn days_remaining(last_donation: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    EligibilityPolicy::default().days_remaining(last_donation, now)
}

/// Parse a stored last-donation date
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339, and naive date-times which
/// are read as UTC. Anything else, including the empty string, is `None` and
/// therefore counts as "no donation recorded".
pub fn parse_donation_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}

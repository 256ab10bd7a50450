//! Represents the retention policy applied to deployment folders.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

/// How many deployments to keep and how old the rest may get.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Newest prefixes that are always kept, regardless of age.
    pub keep_count: usize,

    /// Prefixes past the count floor are only deleted once older than this
    /// many days. `0` disables the age test.
    pub max_age_days: u32,
}

impl RetentionPolicy {
    pub fn new(keep_count: usize, max_age_days: u32) -> Self {
        Self {
            keep_count,
            max_age_days,
        }
    }

    /// Midnight UTC of `today`, minus `max_age_days` days.
    ///
    /// Returns `None` when the age test is disabled. A cutoff earlier than
    /// the representable range saturates to the minimum timestamp, so
    /// nothing is old enough to delete.
    pub fn cutoff(&self, today: NaiveDate) -> Option<DateTime<Utc>> {
        if self.max_age_days == 0 {
            return None;
        }

        let midnight = today.and_time(NaiveTime::MIN).and_utc();
        let cutoff = TimeDelta::try_days(i64::from(self.max_age_days))
            .and_then(|age| midnight.checked_sub_signed(age))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Some(cutoff)
    }
}

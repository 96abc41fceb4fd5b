use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

pub const DEFAULT_TERM: u32 = 210;
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_SID_BEGIN: u32 = 7034;
pub const DEFAULT_SID_END: u32 = 7199;

pub fn default_date_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 8, 19).expect("valid default start date")
}

pub fn default_date_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 12, 10).expect("valid default end date")
}

/// Run configuration, fixed for the lifetime of one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Diet session number (国会回次).
    pub term: u32,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub sid_begin: u32,
    pub sid_end: u32,
    pub request_delay: Duration,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            term: DEFAULT_TERM,
            date_start: default_date_start(),
            date_end: default_date_end(),
            sid_begin: DEFAULT_SID_BEGIN,
            sid_end: DEFAULT_SID_END,
            request_delay: Duration::from_millis(DEFAULT_DELAY_MS),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, String> {
        if self.term == 0 {
            return Err("Term must be greater than 0".to_string());
        }
        if self.date_start > self.date_end {
            return Err(format!(
                "Start date ({}) cannot be after end date ({})",
                self.date_start, self.date_end
            ));
        }
        if self.sid_begin > self.sid_end {
            return Err(format!(
                "First sid ({}) cannot be after last sid ({})",
                self.sid_begin, self.sid_end
            ));
        }
        Ok(self)
    }

    /// Every calendar day of the lower-house range, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.date_end;
        self.date_start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn sids(&self) -> RangeInclusive<u32> {
        self.sid_begin..=self.sid_end
    }
}

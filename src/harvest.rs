use std::fmt::Display;

use crate::rows::project_rows;
use crate::scraper::ScraperError;
use crate::types::{MeetingInfo, OutputRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub url: String,
    pub reason: String,
}

/// Accumulates the meetings of one run. A page that fails to fetch or parse
/// is recorded as skipped and never stops the enumeration.
#[derive(Debug, Default)]
pub struct Harvest {
    pub meetings: Vec<MeetingInfo>,
    pub skipped: Vec<Skip>,
}

impl Harvest {
    pub fn absorb(&mut self, url: &str, result: Result<MeetingInfo, ScraperError>) {
        match result {
            Ok(meeting) if meeting.speeches.is_empty() => {
                log::info!("{} {}: no speeches, dropped", meeting.date, meeting.name);
            }
            Ok(meeting) => {
                log::info!(
                    "{} {}: {} speech(es)",
                    meeting.date,
                    meeting.name,
                    meeting.speeches.len()
                );
                self.meetings.push(meeting);
            }
            Err(ScraperError::NotFound(_)) => {
                log::info!("No page at {}", url);
                self.record(url, "page not found");
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", url, e);
                self.record(url, e);
            }
        }
    }

    pub fn skip(&mut self, url: &str, reason: impl Display) {
        log::warn!("Skipping {}: {}", url, reason);
        self.record(url, reason);
    }

    fn record(&mut self, url: &str, reason: impl Display) {
        self.skipped.push(Skip {
            url: url.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn rows(&self) -> Vec<OutputRow> {
        project_rows(&self.meetings)
    }
}

use chrono::NaiveDate;

use super::MEMBER_PAGES;
use super::parser::{
    listing_url, members_url, parse_meeting_list, parse_member_list, parse_question, question_url,
};
use crate::config::Config;
use crate::harvest::Harvest;
use crate::parser::Layout;
use crate::scraper::{HttpClient, ScraperError};
use crate::types::{MeetingInfo, MeetingSummary, Member, Question};

#[derive(Debug, Clone)]
pub struct WebScraper {
    http: HttpClient,
    term: u32,
}

impl WebScraper {
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        Ok(Self {
            http: HttpClient::new(config.request_delay)?,
            term: config.term,
        })
    }

    pub async fn fetch_meeting_summaries(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<MeetingSummary>, ScraperError> {
        let url = listing_url(date);
        log::info!("Fetching meetings held on {}...", date);
        let html = self.http.get_html(&url).await?;
        Ok(parse_meeting_list(&html))
    }

    pub async fn fetch_meeting(
        &self,
        date: NaiveDate,
        summary: &MeetingSummary,
    ) -> Result<MeetingInfo, ScraperError> {
        log::info!("Fetching meeting: {}", summary);
        let html = self.http.get_html(&summary.detail_url).await?;
        let layout = Layout::Shugiin {
            date,
            summary: summary.clone(),
        };
        Ok(layout.extract(&html)?)
    }

    /// Walks every day in `dates`, then every meeting listed for that day.
    /// Nothing here aborts the walk; failures end up in [`Harvest::skipped`].
    pub async fn fetch_meetings(&self, dates: impl IntoIterator<Item = NaiveDate>) -> Harvest {
        let mut harvest = Harvest::default();

        for date in dates {
            let summaries = match self.fetch_meeting_summaries(date).await {
                Ok(summaries) => summaries,
                Err(e) => {
                    harvest.skip(&listing_url(date), e);
                    continue;
                }
            };

            if summaries.is_empty() {
                log::debug!("No meetings on {}", date);
            }

            for summary in &summaries {
                let result = self.fetch_meeting(date, summary).await;
                harvest.absorb(&summary.detail_url, result);
            }
        }

        harvest
    }

    pub async fn fetch_members(&self) -> Vec<Member> {
        let mut members = Vec::new();

        for page in 1..=MEMBER_PAGES {
            let url = members_url(page);
            log::info!("Fetching member page {}/{}...", page, MEMBER_PAGES);

            let result = match self.http.get_html(&url).await {
                Ok(html) => parse_member_list(&html).map_err(ScraperError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(page_members) => members.extend(page_members),
                Err(e) => log::warn!("Skipping member page {}: {}", url, e),
            }
        }

        members
    }

    /// Questions are numbered from 1 with no gaps, so the first missing page
    /// ends the walk. A page that does not parse is skipped; an HTTP failure
    /// aborts the walk.
    pub async fn fetch_questions(&self) -> Result<Vec<Question>, ScraperError> {
        let mut walk = QuestionWalk::default();

        for number in 1.. {
            let url = question_url(self.term, number);
            let page = self.http.get_html(&url).await;
            if !walk.absorb(&url, page)? {
                break;
            }
        }

        let questions = walk.questions;
        log::info!("Fetched {} question(s)", questions.len());
        Ok(questions)
    }
}

/// Consecutive unparseable pages after which the site is assumed to serve an
/// error page in place of a 404.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

#[derive(Debug, Default)]
struct QuestionWalk {
    questions: Vec<Question>,
    failures: u32,
}

impl QuestionWalk {
    /// Takes one fetched page. Returns whether the walk should go on.
    fn absorb(
        &mut self,
        url: &str,
        page: Result<String, ScraperError>,
    ) -> Result<bool, ScraperError> {
        let html = match page {
            Ok(html) => html,
            Err(ScraperError::NotFound(_)) => {
                log::info!("No question at {}, stopping", url);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        match parse_question(&html) {
            Ok(question) => {
                log::debug!("{}", question);
                self.questions.push(question);
                self.failures = 0;
            }
            Err(e) => {
                log::warn!("Skipping question page {}: {}", url, e);
                self.failures += 1;
                if self.failures >= MAX_CONSECUTIVE_FAILURES {
                    log::warn!("{} unreadable question pages in a row, stopping", self.failures);
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

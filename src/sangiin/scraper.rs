use super::parser::{
    detail_url, members_url, parse_member_list, parse_question_list, questions_url,
};
use crate::config::Config;
use crate::harvest::Harvest;
use crate::parser::Layout;
use crate::scraper::{HttpClient, ScraperError};
use crate::types::{MeetingInfo, Member, Question};

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

    pub async fn fetch_meeting(&self, sid: u32) -> Result<MeetingInfo, ScraperError> {
        let url = detail_url(sid);
        log::info!("Fetching meeting sid={}...", sid);
        let html = self.http.get_html(&url).await?;
        Ok(Layout::Sangiin.extract(&html)?)
    }

    /// Tries every sid in turn. Unassigned sids are expected and only end up
    /// in [`Harvest::skipped`].
    pub async fn fetch_meetings(&self, sids: impl IntoIterator<Item = u32>) -> Harvest {
        let mut harvest = Harvest::default();

        for sid in sids {
            let result = self.fetch_meeting(sid).await;
            harvest.absorb(&detail_url(sid), result);
        }

        harvest
    }

    pub async fn fetch_members(&self) -> Result<Vec<Member>, ScraperError> {
        let url = members_url(self.term);
        log::info!("Fetching members of term {}...", self.term);
        let html = self.http.get_html(&url).await?;
        Ok(parse_member_list(&html)?)
    }

    pub async fn fetch_questions(&self) -> Result<Vec<Question>, ScraperError> {
        let url = questions_url(self.term);
        log::info!("Fetching questions of term {}...", self.term);
        let html = self.http.get_html(&url).await?;
        let questions = parse_question_list(&html)?;
        log::info!("Fetched {} question(s)", questions.len());
        Ok(questions)
    }
}

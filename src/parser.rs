use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::duration::Calculator;
use crate::types::{House, MeetingInfo, MeetingSummary};
use crate::{sangiin, shugiin};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Expected {what} at position {index}, found only {len}")]
    IndexOutOfRange {
        what: String,
        index: usize,
        len: usize,
    },
    #[error("Failed to parse date: {0}")]
    DateParse(String),
}

/// Page layout of a meeting detail page, one per source site.
#[derive(Debug, Clone)]
pub enum Layout {
    /// Lower-house TV minutes. The page itself carries neither the date nor
    /// the meeting name, so both come from the day listing.
    Shugiin {
        date: NaiveDate,
        summary: MeetingSummary,
    },
    /// Upper-house web TV minutes.
    Sangiin,
}

impl Layout {
    pub fn house(&self) -> House {
        match self {
            Layout::Shugiin { .. } => House::Shugiin,
            Layout::Sangiin => House::Sangiin,
        }
    }

    /// Parses one detail page into a [`MeetingInfo`] and fills in speech
    /// durations. Duration faults are logged; they do not fail the page.
    pub fn extract(&self, html: &str) -> Result<MeetingInfo, ParseError> {
        let document = Html::parse_document(html);

        let mut meeting = match self {
            Layout::Shugiin { date, summary } => {
                shugiin::parser::parse_meeting_detail(&document, *date, summary)?
            }
            Layout::Sangiin => sangiin::parser::parse_meeting_detail(&document)?,
        };

        for fault in Calculator::for_house(self.house()).apply(&mut meeting) {
            log::warn!("{} {}: {}", meeting.date, meeting.name, fault);
        }

        Ok(meeting)
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{}': {}", css, e))
}

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops every whitespace character, including ideographic spaces.
pub(crate) fn remove_whitespace(text: &str) -> String {
    text.split_whitespace().collect()
}

/// Positional lookup that reports the layout deviation instead of panicking.
pub(crate) fn nth<T: Copy>(items: &[T], index: usize, what: &str) -> Result<T, ParseError> {
    items
        .get(index)
        .copied()
        .ok_or_else(|| ParseError::IndexOutOfRange {
            what: what.to_string(),
            index,
            len: items.len(),
        })
}

/// Submitter cells read like "山田　太郎君"; strip spacing and the trailing
/// honorific.
pub(crate) fn clean_submitter(text: &str) -> String {
    let name = remove_whitespace(text);
    name.strip_suffix('君').unwrap_or(&name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_nth_out_of_range() {
        let items = [1, 2];
        assert_eq!(nth(&items, 1, "item").unwrap(), 2);
        let err = nth(&items, 2, "item").unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfRange { index: 2, len: 2, .. }));
    }

    #[test]
    fn test_clean_submitter() {
        assert_eq!(clean_submitter(" 山田　太郎君 "), "山田太郎");
        assert_eq!(clean_submitter("鈴木花子"), "鈴木花子");
    }

    #[test]
    fn test_layout_extract_sangiin() {
        let html = fs::read_to_string("fixtures/sangiin/meeting_detail.html")
            .expect("Failed to read fixture");

        let meeting = Layout::Sangiin.extract(&html).expect("Failed to extract");

        assert_eq!(meeting.house, House::Sangiin);
        assert!(meeting.speeches.iter().all(|s| s.duration_min.is_some()));
    }

    #[test]
    fn test_layout_extract_shugiin() {
        let html = fs::read_to_string("fixtures/shugiin/meeting_detail.html")
            .expect("Failed to read fixture");
        let layout = Layout::Shugiin {
            date: NaiveDate::from_ymd_opt(2022, 10, 18).unwrap(),
            summary: MeetingSummary {
                name: "予算委員会".to_string(),
                detail_url: "https://www.shugiintv.go.jp/jp/index.php?ex=VL&deli_id=54000"
                    .to_string(),
            },
        };

        let meeting = layout.extract(&html).expect("Failed to extract");

        assert_eq!(meeting.house, House::Shugiin);
        assert_eq!(meeting.name, "予算委員会");
        assert!(meeting.speeches.iter().all(|s| s.duration_min.is_some()));
    }
}

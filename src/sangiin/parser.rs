use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use crate::attributes::{Delimiter, speaker_or_unattributed};
use crate::duration::{anchor_minutes, parse_duration_text};
use crate::parser::{
    ParseError, clean_submitter, elem_text, nth, normalize_whitespace, remove_whitespace, selector,
};
use crate::types::{House, MeetingInfo, Member, Question, Speech};

use super::{DETAIL_URL_BASE, KOUSEI_URL_BASE};

const DATE_FORMAT: &str = "%Y年%m月%d日";

pub fn detail_url(sid: u32) -> String {
    format!("{}{}", DETAIL_URL_BASE, sid)
}

pub fn members_url(term: u32) -> String {
    format!("{}giin/{}/giin.htm", KOUSEI_URL_BASE, term)
}

pub fn questions_url(term: u32) -> String {
    format!("{}syuisyo/{}/syuisyo.htm", KOUSEI_URL_BASE, term)
}

fn detail_container(document: &Html) -> Result<ElementRef<'_>, ParseError> {
    let container_sel = selector("div#detail-contents-inner");
    document
        .select(&container_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("div#detail-contents-inner".to_string()))
}

/// The `dd` values of the `dl.date` blocks: date, meeting name, duration.
fn summary_fields(container: ElementRef) -> Vec<String> {
    let dl_sel = selector("dl.date");
    let dd_sel = selector("dd");

    container
        .select(&dl_sel)
        .map(|dl| {
            dl.select(&dd_sel)
                .next()
                .map(|dd| elem_text(dd).trim().to_string())
                .unwrap_or_default()
        })
        .collect()
}

fn description(container: ElementRef) -> Option<String> {
    let span_sel = selector("span");
    container
        .select(&span_sel)
        .next()
        .map(|span| remove_whitespace(&elem_text(span)))
        .filter(|text| !text.is_empty())
}

/// Seek links of the speaker index, in page order.
fn speech_links(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let ul_sel = selector("ul");
    let li_sel = selector("li");
    let a_sel = selector("a");

    let Some(list) = container.select(&ul_sel).next() else {
        return Vec::new();
    };

    list.select(&li_sel)
        .filter_map(|li| li.select(&a_sel).next())
        .collect()
}

fn parse_speech_link(link: ElementRef) -> Speech {
    let text = elem_text(link);
    let label = text.trim();
    let href = link.value().attr("href").unwrap_or("");
    let anchor = anchor_minutes(href);
    if anchor.is_none() {
        log::warn!("Speech '{}' has no readable seek anchor '{}'", label, href);
    }

    Speech::anchored(speaker_or_unattributed(label, Delimiter::Touten), anchor)
}

/// Parses a web TV detail page. Durations are not filled in here.
pub fn parse_meeting_detail(document: &Html) -> Result<MeetingInfo, ParseError> {
    let container = detail_container(document)?;
    let owned = summary_fields(container);
    let fields: Vec<&str> = owned.iter().map(String::as_str).collect();

    let date_text = nth(&fields, 0, "meeting date")?;
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|e| ParseError::DateParse(format!("{}: {}", date_text, e)))?;

    let name = normalize_whitespace(nth(&fields, 1, "meeting name")?);
    if name.is_empty() {
        return Err(ParseError::MissingField("meeting name".to_string()));
    }

    let duration_total_min = fields.get(2).and_then(|text| parse_duration_text(text));
    if duration_total_min.is_none() {
        log::warn!("{} {}: meeting duration unreadable", date, name);
    }

    let links = speech_links(container);
    if links.is_empty() {
        log::debug!("{} {}: no speaker index", date, name);
    }
    let speeches = links.into_iter().map(parse_speech_link).collect();

    Ok(MeetingInfo {
        house: House::Sangiin,
        date,
        name,
        topics: description(container).into_iter().collect(),
        duration_total_min,
        speeches,
    })
}

/// The member roster. A name written `現姓[旧姓]` yields one member per
/// name, sharing kana and party.
pub fn parse_member_list(html: &str) -> Result<Vec<Member>, ParseError> {
    let document = Html::parse_document(html);
    let container_sel = selector("div#ContentsBox");
    let table_sel = selector("table");
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let container = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("div#ContentsBox".to_string()))?;
    let tables: Vec<ElementRef> = container.select(&table_sel).collect();
    let table = nth(&tables, 1, "member table")?;

    let mut members = Vec::new();

    for row in table.select(&row_sel).skip(1) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            log::warn!("Skipping member row with {} cell(s)", cells.len());
            continue;
        }

        let name = remove_whitespace(&elem_text(cells[0]));
        let name_kana = elem_text(cells[1]).replace('\u{3000}', " ").trim().to_string();
        let party = elem_text(cells[2]).trim().to_string();

        let names = match name.split_once('[') {
            Some((current, former)) => {
                vec![current.to_string(), former.trim_end_matches(']').to_string()]
            }
            None => vec![name.clone()],
        };

        for name in names {
            members.push(Member {
                name,
                name_kana: name_kana.clone(),
                party: party.clone(),
            });
        }
    }

    Ok(members)
}

/// The question index lists each question over three rows: title, then
/// number and submitter, then the answer links.
pub fn parse_question_list(html: &str) -> Result<Vec<Question>, ParseError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table");
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let tables: Vec<ElementRef> = document.select(&table_sel).collect();
    let table = nth(&tables, 1, "question table")?;
    let rows: Vec<ElementRef> = table.select(&row_sel).collect();

    let mut questions = Vec::new();

    for chunk in rows.chunks_exact(3) {
        let title_cells: Vec<ElementRef> = chunk[0].select(&cell_sel).collect();
        let info_cells: Vec<ElementRef> = chunk[1].select(&cell_sel).collect();

        let number_text = elem_text(nth(&info_cells, 0, "question number")?);
        let number = number_text
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::MissingField(format!("question number '{}'", number_text)))?;

        questions.push(Question {
            number,
            title: elem_text(nth(&title_cells, 0, "question title")?)
                .trim()
                .to_string(),
            submitter: clean_submitter(&elem_text(nth(&info_cells, 1, "question submitter")?)),
        });
    }

    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse_fixture(name: &str) -> MeetingInfo {
        let html = fs::read_to_string(format!("fixtures/sangiin/{}", name))
            .expect("Failed to read fixture");
        parse_meeting_detail(&Html::parse_document(&html)).expect("Failed to parse detail")
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            detail_url(7034),
            "https://www.webtv.sangiin.go.jp/webtv/detail.php?sid=7034"
        );
        assert_eq!(
            members_url(210),
            "https://www.sangiin.go.jp/japanese/joho1/kousei/giin/210/giin.htm"
        );
        assert_eq!(
            questions_url(210),
            "https://www.sangiin.go.jp/japanese/joho1/kousei/syuisyo/210/syuisyo.htm"
        );
    }

    #[test]
    fn test_parse_meeting_detail() {
        let meeting = parse_fixture("meeting_detail.html");

        assert_eq!(meeting.house, House::Sangiin);
        assert_eq!(meeting.date, NaiveDate::from_ymd_opt(2022, 10, 13).unwrap());
        assert_eq!(meeting.name, "外交防衛委員会");
        assert_eq!(meeting.topics, vec!["国の防衛に関する調査"]);
        assert_eq!(meeting.duration_total_min, Some(60));
        assert_eq!(meeting.speeches.len(), 3);

        let first = &meeting.speeches[0];
        assert_eq!(first.speaker.name, "山田太郎");
        assert_eq!(first.speaker.attributes, vec!["自由民主党", "国民の声"]);
        assert_eq!(first.anchor_min, Some(2));

        let anchors: Vec<Option<u32>> = meeting.speeches.iter().map(|s| s.anchor_min).collect();
        assert_eq!(anchors, vec![Some(2), Some(10), Some(25)]);
    }

    #[test]
    fn test_ideographic_space_splits_attributes() {
        let meeting = parse_fixture("meeting_detail.html");
        assert_eq!(meeting.speeches[2].speaker.attributes, vec!["立憲民主・社民", "会派"]);
    }

    #[test]
    fn test_detail_durations() {
        let html = fs::read_to_string("fixtures/sangiin/meeting_detail.html")
            .expect("Failed to read fixture");
        let meeting = crate::parser::Layout::Sangiin
            .extract(&html)
            .expect("Failed to extract");

        let durations: Vec<Option<u32>> = meeting.speeches.iter().map(|s| s.duration_min).collect();
        assert_eq!(durations, vec![Some(8), Some(15), Some(35)]);
    }

    #[test]
    fn test_meeting_without_speaker_index() {
        let meeting = parse_fixture("meeting_no_speeches.html");
        assert_eq!(meeting.name, "本会議");
        assert!(meeting.speeches.is_empty());
    }

    #[test]
    fn test_missing_container() {
        let document = Html::parse_document("<html><body><p>ページが見つかりません</p></body></html>");
        let err = parse_meeting_detail(&document).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement(_)));
    }

    #[test]
    fn test_bad_date_is_reported() {
        let document = Html::parse_document(
            r#"<div id="detail-contents-inner">
                <dl class="date"><dt>開会日</dt><dd>令和4年10月13日</dd></dl>
                <dl class="date"><dt>会議名</dt><dd>本会議</dd></dl>
            </div>"#,
        );
        let err = parse_meeting_detail(&document).unwrap_err();
        assert!(matches!(err, ParseError::DateParse(_)));
    }

    #[test]
    fn test_parse_member_list() {
        let html = fs::read_to_string("fixtures/sangiin/members.html")
            .expect("Failed to read fixture");

        let members = parse_member_list(&html).expect("Failed to parse members");

        assert_eq!(members.len(), 3);
        assert_eq!(members[0].name, "山田太郎");
        assert_eq!(members[0].name_kana, "やまだ たろう");
        assert_eq!(members[0].party, "自民");
        assert_eq!(members[1].name, "佐藤花子");
        assert_eq!(members[2].name, "鈴木花子");
        assert_eq!(members[2].name_kana, members[1].name_kana);
    }

    #[test]
    fn test_parse_question_list() {
        let html = fs::read_to_string("fixtures/sangiin/questions.html")
            .expect("Failed to read fixture");

        let questions = parse_question_list(&html).expect("Failed to parse questions");

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].number, 1);
        assert_eq!(questions[0].title, "円安対策に関する質問主意書");
        assert_eq!(questions[0].submitter, "山田太郎");
        assert_eq!(questions[1].number, 2);
        assert_eq!(questions[1].submitter, "佐藤花子");
    }
}

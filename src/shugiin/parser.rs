use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::attributes::{Delimiter, speaker_or_unattributed};
use crate::duration::parse_clock_minutes;
use crate::parser::{
    ParseError, clean_submitter, elem_text, nth, normalize_whitespace, selector,
};
use crate::types::{House, MeetingInfo, MeetingSummary, Member, Question, Speech};

use super::{BASE_URL, MEMBERS_URL_BASE, QUESTIONS_URL_BASE};

/// Header above the government respondents that follow the member speeches.
pub const RESPONDENT_HEADER: &str = "答弁者等";
/// Header above the list of attending ministers.
pub const MINISTERS_HEADER: &str = "大臣等（建制順）：";

const SPEAKER_CELL: &str = r#"td[width="380"]"#;

static RE_QUOTED_ARG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']*)'").expect("invalid regex: quoted argument"));

pub fn listing_url(date: NaiveDate) -> String {
    format!("{}index.php?ex=VL&u_day={}", BASE_URL, date.format("%Y%m%d"))
}

pub fn members_url(page: u32) -> String {
    format!("{}{}giin.htm", MEMBERS_URL_BASE, page)
}

pub fn question_url(term: u32, number: u32) -> String {
    format!("{}{}{:03}.htm", QUESTIONS_URL_BASE, term, number)
}

/// Meetings held on one day. Links look like
/// `javascript:openWin('index.php?ex=VL&deli_id=54000')`.
pub fn parse_meeting_list(html: &str) -> Vec<MeetingSummary> {
    let document = Html::parse_document(html);
    let link_sel = selector(r#"td[class="s14_24"] a"#);

    let mut summaries = Vec::new();

    for link in document.select(&link_sel) {
        let name = normalize_whitespace(&elem_text(link));
        let href = link.value().attr("href").unwrap_or("");

        let Some(path) = RE_QUOTED_ARG.captures(href).and_then(|caps| caps.get(1)) else {
            log::warn!("Skipping listing '{}': no detail path in '{}'", name, href);
            continue;
        };

        summaries.push(MeetingSummary {
            name,
            detail_url: format!("{}{}", BASE_URL, path.as_str()),
        });
    }

    summaries
}

fn detail_tables(document: &Html) -> Result<Vec<ElementRef<'_>>, ParseError> {
    let container_sel = selector("div#library2");
    let table_sel = selector("table");

    let container = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("div#library2".to_string()))?;

    Ok(container.select(&table_sel).collect())
}

fn topics_table<'a>(tables: &[ElementRef<'a>]) -> Result<ElementRef<'a>, ParseError> {
    nth(tables, 0, "topics table")
}

fn speakers_table<'a>(tables: &[ElementRef<'a>]) -> Result<ElementRef<'a>, ParseError> {
    nth(tables, 1, "speakers table")
}

fn speaker_time_table<'a>(tables: &[ElementRef<'a>]) -> Result<ElementRef<'a>, ParseError> {
    nth(tables, 2, "speaker-time table")
}

fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let row_sel = selector("tr");
    table.select(&row_sel).collect()
}

fn row_has_text(row: ElementRef, literal: &str) -> bool {
    row.text().any(|t| t.trim() == literal)
}

pub fn is_respondent_header(row: ElementRef) -> bool {
    row_has_text(row, RESPONDENT_HEADER)
}

pub fn is_ministers_header(row: ElementRef) -> bool {
    row_has_text(row, MINISTERS_HEADER)
}

/// Topic rows sit between a title row and a footer row.
fn parse_topics(table: ElementRef) -> Vec<String> {
    let rows = table_rows(table);
    if rows.len() < 2 {
        return Vec::new();
    }

    rows[1..rows.len() - 1]
        .iter()
        .map(|row| normalize_whitespace(&elem_text(*row)))
        .filter(|topic| !topic.is_empty())
        .collect()
}

/// Member speech rows of the speaker-time table: everything after the title
/// row and before the ministers / respondents trailers, minus the separator
/// row that closes the block.
pub fn speech_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows: Vec<ElementRef> = table_rows(table).into_iter().skip(1).collect();

    if let Some(pos) = rows.iter().position(|row| is_ministers_header(*row)) {
        rows.truncate(pos);
    }
    if let Some(pos) = rows.iter().position(|row| is_respondent_header(*row)) {
        rows.truncate(pos);
    }
    if rows.len() > 1 {
        rows.pop();
    }
    // a lone separator means the meeting had no member speeches
    if rows.len() == 1 && !has_speaker_cell(rows[0]) {
        rows.clear();
    }

    rows
}

fn has_speaker_cell(row: ElementRef) -> bool {
    row.select(&selector(SPEAKER_CELL)).next().is_some()
}

fn parse_speech_row(row: ElementRef) -> Result<Speech, ParseError> {
    let name_sel = selector(SPEAKER_CELL);
    let time_sel = selector(r#"td[width="100"]"#);

    let label = row
        .select(&name_sel)
        .next()
        .map(|cell| elem_text(cell).trim().to_string())
        .ok_or_else(|| ParseError::MissingField("speaker cell".to_string()))?;

    let time_cells: Vec<ElementRef> = row.select(&time_sel).collect();
    let start = elem_text(nth(&time_cells, 0, "start cell")?).trim().to_string();
    let duration = elem_text(nth(&time_cells, 1, "duration cell")?)
        .trim()
        .to_string();

    Ok(Speech::published(
        speaker_or_unattributed(&label, Delimiter::Nakaguro),
        parse_clock_minutes(&start),
        duration,
    ))
}

/// Parses a TV minutes detail page. Durations are not filled in here.
pub fn parse_meeting_detail(
    document: &Html,
    date: NaiveDate,
    summary: &MeetingSummary,
) -> Result<MeetingInfo, ParseError> {
    let tables = detail_tables(document)?;

    let topics = parse_topics(topics_table(&tables)?);
    let listed = table_rows(speakers_table(&tables)?).len();

    let speeches = speech_rows(speaker_time_table(&tables)?)
        .into_iter()
        .map(parse_speech_row)
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "{} {}: {} topic(s), {} speech(es), {} speaker row(s) listed",
        date,
        summary.name,
        topics.len(),
        speeches.len(),
        listed
    );

    Ok(MeetingInfo {
        house: House::Shugiin,
        date,
        name: summary.name.clone(),
        topics,
        duration_total_min: None,
        speeches,
    })
}

/// One page of the member roster. The first two rows are headers.
pub fn parse_member_list(html: &str) -> Result<Vec<Member>, ParseError> {
    let document = Html::parse_document(html);
    let container_sel = selector("div#sh1body");
    let table_sel = selector("table");
    let cell_sel = selector("td");

    let container = document
        .select(&container_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("div#sh1body".to_string()))?;
    let tables: Vec<ElementRef> = container.select(&table_sel).collect();
    let table = nth(&tables, 1, "member table")?;

    let mut members = Vec::new();

    for row in table_rows(table).into_iter().skip(2) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            log::warn!("Skipping member row with {} cell(s)", cells.len());
            continue;
        }

        members.push(Member {
            name: clean_submitter(&elem_text(cells[0])),
            name_kana: normalize_whitespace(&elem_text(cells[1])),
            party: elem_text(cells[2]).trim().to_string(),
        });
    }

    Ok(members)
}

pub fn parse_question(html: &str) -> Result<Question, ParseError> {
    let document = Html::parse_document(html);
    let row_sel = selector("tr");
    let cell_sel = selector("td");

    let rows: Vec<ElementRef> = document.select(&row_sel).collect();
    let value = |index: usize, what: &str| -> Result<String, ParseError> {
        let row = nth(&rows, index, what)?;
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        Ok(elem_text(nth(&cells, 1, what)?))
    };

    let number_text = value(3, "question number")?;
    let number = number_text
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::MissingField(format!("question number '{}'", number_text)))?;

    Ok(Question {
        number,
        title: value(4, "question title")?.trim().to_string(),
        submitter: clean_submitter(&value(5, "question submitter")?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Layout;
    use std::fs;

    fn budget_committee() -> MeetingSummary {
        MeetingSummary {
            name: "予算委員会".to_string(),
            detail_url: "https://www.shugiintv.go.jp/jp/index.php?ex=VL&deli_id=54000"
                .to_string(),
        }
    }

    fn oct_18() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 10, 18).unwrap()
    }

    #[test]
    fn test_listing_url_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2021, 8, 5).unwrap();
        assert_eq!(
            listing_url(date),
            "https://www.shugiintv.go.jp/jp/index.php?ex=VL&u_day=20210805"
        );
    }

    #[test]
    fn test_question_url() {
        assert_eq!(
            question_url(210, 7),
            "https://www.shugiin.go.jp/internet/itdb_shitsumon.nsf/html/shitsumon/210007.htm"
        );
    }

    #[test]
    fn test_parse_meeting_list() {
        let html = fs::read_to_string("fixtures/shugiin/meeting_list.html")
            .expect("Failed to read fixture");

        let summaries = parse_meeting_list(&html);

        assert_eq!(summaries.len(), 2, "The link without a quoted path is skipped");
        assert_eq!(summaries[0], budget_committee());
        assert_eq!(summaries[1].name, "本会議");
        assert!(summaries[1].detail_url.ends_with("deli_id=54001"));
    }

    #[test]
    fn test_parse_meeting_detail() {
        let html = fs::read_to_string("fixtures/shugiin/meeting_detail.html")
            .expect("Failed to read fixture");
        let document = Html::parse_document(&html);

        let meeting = parse_meeting_detail(&document, oct_18(), &budget_committee())
            .expect("Failed to parse detail");

        assert_eq!(meeting.house, House::Shugiin);
        assert_eq!(meeting.date, oct_18());
        assert_eq!(meeting.name, "予算委員会");
        assert_eq!(
            meeting.topics,
            vec!["令和四年度一般会計補正予算", "令和四年度特別会計補正予算"]
        );
        assert_eq!(meeting.speeches.len(), 3, "Trailer rows must be cut off");

        let first = &meeting.speeches[0];
        assert_eq!(first.speaker.name, "山田太郎");
        assert_eq!(first.speaker.attributes, vec!["自由民主党", "無所属の会"]);
        assert_eq!(first.anchor_min, Some(9 * 60));
        assert_eq!(first.published.as_deref(), Some("20分"));
        assert!(first.duration_min.is_none(), "Durations are derived later");

        let names: Vec<&str> = meeting
            .speeches
            .iter()
            .map(|s| s.speaker.name.as_str())
            .collect();
        assert!(!names.contains(&"岸田文雄"), "Respondents are not member speeches");
    }

    #[test]
    fn test_listing_to_meeting_durations_sum_to_sixty() {
        let list_html = fs::read_to_string("fixtures/shugiin/meeting_list.html")
            .expect("Failed to read fixture");
        let detail_html = fs::read_to_string("fixtures/shugiin/meeting_detail.html")
            .expect("Failed to read fixture");

        let summary = parse_meeting_list(&list_html)
            .into_iter()
            .find(|s| s.name == "予算委員会")
            .expect("Should list the budget committee");

        let meeting = Layout::Shugiin {
            date: oct_18(),
            summary,
        }
        .extract(&detail_html)
        .expect("Failed to extract");

        assert_eq!(meeting.speeches.len(), 3);
        let total: u32 = meeting.speeches.iter().filter_map(|s| s.duration_min).sum();
        assert_eq!(total, 60);
        assert_eq!(meeting.speeches[1].duration_min, Some(30));
    }

    #[test]
    fn test_missing_container_is_reported() {
        let document = Html::parse_document("<html><body><p>メンテナンス中</p></body></html>");
        let err = parse_meeting_detail(&document, oct_18(), &budget_committee()).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement(_)));
    }

    #[test]
    fn test_missing_table_is_out_of_range() {
        let document = Html::parse_document(
            r#"<div id="library2"><table><tr><td>案件</td></tr></table></div>"#,
        );
        let err = parse_meeting_detail(&document, oct_18(), &budget_committee()).unwrap_err();
        assert!(matches!(err, ParseError::IndexOutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_header_predicates() {
        let html = r#"<table>
            <tr><td>答弁者等</td></tr>
            <tr><td><span><b>大臣等（建制順）：</b></span></td></tr>
            <tr><td>答弁者等の一覧</td></tr>
        </table>"#;
        let document = Html::parse_fragment(html);
        let row_sel = selector("tr");
        let rows: Vec<ElementRef> = document.select(&row_sel).collect();

        assert!(is_respondent_header(rows[0]));
        assert!(!is_ministers_header(rows[0]));
        assert!(is_ministers_header(rows[1]));
        assert!(!is_respondent_header(rows[2]), "Only an exact header matches");
    }

    #[test]
    fn test_single_row_block_is_kept() {
        let html = r#"<table>
            <tr><td>発言者</td></tr>
            <tr><td width="380">山田太郎(自由民主党)</td><td width="100">9:00</td><td width="100">5分</td></tr>
        </table>"#;
        let document = Html::parse_fragment(html);
        let table_sel = selector("table");
        let table = document.select(&table_sel).next().unwrap();

        assert_eq!(speech_rows(table).len(), 1);
    }

    #[test]
    fn test_lone_separator_row_is_not_a_speech() {
        let html = r#"<table>
            <tr><td>発言者</td></tr>
            <tr><td colspan="3"><hr></td></tr>
            <tr><td>答弁者等</td></tr>
            <tr><td width="380">岸田文雄(内閣総理大臣)</td><td width="100"></td><td width="100"></td></tr>
        </table>"#;
        let document = Html::parse_fragment(html);
        let table_sel = selector("table");
        let table = document.select(&table_sel).next().unwrap();

        assert!(speech_rows(table).is_empty());
    }

    #[test]
    fn test_meeting_without_member_speeches() {
        let document = Html::parse_document(
            r#"<div id="library2">
                <table><tr><td>案件</td></tr><tr><td>議席の指定</td></tr><tr><td>&nbsp;</td></tr></table>
                <table><tr><td>発言者一覧</td></tr></table>
                <table>
                    <tr><td>発言者</td></tr>
                    <tr><td colspan="3"><hr></td></tr>
                    <tr><td>答弁者等</td></tr>
                    <tr><td width="380">岸田文雄(内閣総理大臣)</td><td width="100"></td><td width="100"></td></tr>
                </table>
            </div>"#,
        );

        let meeting = parse_meeting_detail(&document, oct_18(), &budget_committee())
            .expect("A meeting without member speeches still parses");

        assert_eq!(meeting.topics, vec!["議席の指定"]);
        assert!(meeting.speeches.is_empty());
    }

    #[test]
    fn test_parse_member_list() {
        let html = fs::read_to_string("fixtures/shugiin/members.html")
            .expect("Failed to read fixture");

        let members = parse_member_list(&html).expect("Failed to parse members");

        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "山田太郎");
        assert_eq!(members[0].name_kana, "やまだ たろう");
        assert_eq!(members[0].party, "自民");
        assert_eq!(members[1].name, "鈴木花子");
    }

    #[test]
    fn test_parse_question() {
        let html = fs::read_to_string("fixtures/shugiin/question.html")
            .expect("Failed to read fixture");

        let question = parse_question(&html).expect("Failed to parse question");

        assert_eq!(question.number, 7);
        assert_eq!(question.title, "物価高騰対策に関する質問主意書");
        assert_eq!(question.submitter, "鈴木花子");
    }
}

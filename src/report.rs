use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, XlsxError};
use serde::{Serialize, de::DeserializeOwned};

use crate::types::{House, Member, OutputRow, Question};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to lay out sheet {name}: {source}")]
    Sheet {
        name: String,
        #[source]
        source: csv::Error,
    },
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No cached meetings at {0}; run the meetings command first")]
    MissingCache(PathBuf),
}

/// Attribute fragments marking chairs, ministers, witnesses and other
/// speakers who are not questioning members.
pub const SHUGIIN_BLACKLIST: &[&str] = &[
    "委員長",
    "大臣",
    "議長",
    "会長",
    "主査",
    "長官",
    "担当",
    "参考人",
    "公述人",
    "局長",
    "採決",
    "総裁",
    "ウクライナ大統領",
    "日本弁護士連合会",
    "参議院",
];

pub const SANGIIN_BLACKLIST: &[&str] = &[
    "委員長",
    "大臣",
    "議長",
    "参考人",
    "総裁",
    "公述人",
    "長官",
    "総長",
    "局長",
    "院長",
    "会長",
    "衆議院議員",
];

pub fn blacklist(house: House) -> &'static [&'static str] {
    match house {
        House::Shugiin => SHUGIIN_BLACKLIST,
        House::Sangiin => SANGIIN_BLACKLIST,
    }
}

pub fn meetings_cache(dir: &Path, house: House) -> PathBuf {
    dir.join(format!("{}_meetings.csv", house.slug()))
}

pub fn members_cache(dir: &Path, house: House) -> PathBuf {
    dir.join(format!("{}_members.csv", house.slug()))
}

pub fn questions_cache(dir: &Path, house: House) -> PathBuf {
    dir.join(format!("{}_questions.csv", house.slug()))
}

pub fn workbook_path(dir: &Path, house: House) -> PathBuf {
    dir.join(format!("{}_report.xlsx", house.slug()))
}

pub fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush()?;

    log::info!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| ReportError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// A speech row joined with the speaker's roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedRow {
    #[serde(rename = "日にち")]
    pub date: NaiveDate,
    #[serde(rename = "委員会")]
    pub meeting_name: String,
    #[serde(rename = "議員名")]
    pub speaker_name: String,
    #[serde(rename = "ふりがな")]
    pub name_kana: String,
    #[serde(rename = "政党")]
    pub party: String,
    #[serde(rename = "時間")]
    pub duration_min: Option<u32>,
    #[serde(rename = "案件")]
    pub topics: String,
    #[serde(rename = "属性")]
    pub attributes: String,
}

/// Left join on the speaker name. Unmatched speakers keep empty kana and
/// party.
pub fn merge_members(rows: &[OutputRow], members: &[Member]) -> Vec<MergedRow> {
    rows.iter()
        .map(|row| {
            let member = members.iter().find(|m| m.name == row.speaker_name);
            MergedRow {
                date: row.date,
                meeting_name: row.meeting_name.clone(),
                speaker_name: row.speaker_name.clone(),
                name_kana: member.map(|m| m.name_kana.clone()).unwrap_or_default(),
                party: member.map(|m| m.party.clone()).unwrap_or_default(),
                duration_min: row.duration_min,
                topics: row.topics.clone(),
                attributes: row.attributes.clone(),
            }
        })
        .collect()
}

pub fn is_excluded(attributes: &str, blacklist: &[&str]) -> bool {
    blacklist.iter().any(|word| attributes.contains(word))
}

/// Splits merged rows into (kept, excluded), preserving order.
pub fn partition_excluded(rows: Vec<MergedRow>, house: House) -> (Vec<MergedRow>, Vec<MergedRow>) {
    let words = blacklist(house);
    rows.into_iter()
        .partition(|row| !is_excluded(&row.attributes, words))
}

/// One worksheet: the header row, then one row per record. Cells hold the
/// same text the CSV caches would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Lays out `records` through their serde field names. A sheet without
    /// records is left blank.
    pub fn from_records<T: Serialize>(
        name: impl Into<String>,
        records: &[T],
    ) -> Result<Self, ReportError> {
        let name = name.into();
        let sheet_err = |source| ReportError::Sheet {
            name: name.clone(),
            source,
        };

        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record).map_err(sheet_err)?;
        }
        let bytes = writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()
            .map_err(sheet_err)?;

        Ok(Self { name, rows })
    }
}

/// Everything the report sheets are built from, as read back from the
/// CSV caches of earlier runs.
#[derive(Debug, Clone)]
pub struct Report {
    pub house: House,
    pub rows: Vec<OutputRow>,
    pub members: Vec<Member>,
    pub questions: Vec<Question>,
}

impl Report {
    pub fn load(dir: &Path, house: House) -> Result<Self, ReportError> {
        let meetings_path = meetings_cache(dir, house);
        if !meetings_path.exists() {
            return Err(ReportError::MissingCache(meetings_path));
        }

        Ok(Self {
            house,
            rows: read_csv(&meetings_path)?,
            members: read_optional(&members_cache(dir, house))?,
            questions: read_optional(&questions_cache(dir, house))?,
        })
    }

    /// The workbook sheets, in workbook order. Sheet ⑥ (member bills) is
    /// not produced.
    pub fn sheets(&self) -> Result<Vec<Sheet>, ReportError> {
        let merged = merge_members(&self.rows, &self.members);
        let (kept, excluded) = partition_excluded(merged.clone(), self.house);

        log::info!(
            "{} report: {} row(s), {} excluded, {} kept",
            self.house,
            merged.len(),
            excluded.len(),
            kept.len()
        );

        Ok(vec![
            Sheet::from_records("⑦主意書", &self.questions)?,
            Sheet::from_records("⑤③からブラックリストを弾いた最終データ", &kept)?,
            Sheet::from_records("④③のうちブラックリストから抽出された発言", &excluded)?,
            Sheet::from_records(format!("③会議発言①と{}議員②を結合", self.house), &merged)?,
            Sheet::from_records(format!("②元データ・{}議員", self.house), &self.members)?,
            Sheet::from_records("①元データ・会議発言", &self.rows)?,
        ])
    }

    /// Writes `{dir}/{house}_report.xlsx` and returns its path.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = workbook_path(dir, self.house);
        fs::create_dir_all(dir)?;

        let mut workbook = Workbook::new();
        for sheet in self.sheets()? {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (row_num, row) in (0u32..).zip(&sheet.rows) {
                for (col_num, cell) in (0u16..).zip(row) {
                    // header cells stay text even when numeric
                    match whole_number(cell) {
                        Some(n) if row_num > 0 => worksheet.write_number(row_num, col_num, n)?,
                        _ => worksheet.write_string(row_num, col_num, cell)?,
                    };
                }
            }
        }

        workbook.save(&path)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }
}

fn whole_number(cell: &str) -> Option<f64> {
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cell.parse::<u32>().ok().map(f64::from)
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ReportError> {
    if !path.exists() {
        log::warn!("No cache at {}, sheet will be empty", path.display());
        return Ok(Vec::new());
    }
    read_csv(path)
}

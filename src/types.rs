use std::{fmt::Display, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("Invalid house '{0}'. Accepted values: 'shugiin', 'lower', 'sangiin', 'upper'")]
pub struct HouseParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum House {
    Shugiin,
    Sangiin,
}

impl House {
    pub fn slug(&self) -> &'static str {
        match self {
            House::Shugiin => "shugiin",
            House::Sangiin => "sangiin",
        }
    }
}

impl FromStr for House {
    type Err = HouseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shugiin" | "lower" => Ok(House::Shugiin),
            "sangiin" | "upper" => Ok(House::Sangiin),
            _ => Err(HouseParseError(s.to_string())),
        }
    }
}

impl Display for House {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            House::Shugiin => write!(f, "衆議院"),
            House::Sangiin => write!(f, "参議院"),
        }
    }
}

/// One meeting found on a lower-house day listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub name: String,
    pub detail_url: String,
}

impl Display for MeetingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.detail_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    pub attributes: Vec<String>,
}

impl Speaker {
    pub fn unattributed(name: String) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }
}

/// A single speech within a meeting.
///
/// `anchor_min` is the minute offset at which the speech starts (the
/// upper-house seek anchor, or the lower-house start cell when it reads as a
/// clock time). `published` holds the lower-house duration text as printed.
/// `duration_min` stays `None` until a [`crate::duration::Calculator`] has
/// run, and also when the calculation faulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speech {
    pub speaker: Speaker,
    pub anchor_min: Option<u32>,
    pub published: Option<String>,
    pub duration_min: Option<u32>,
}

impl Speech {
    pub fn anchored(speaker: Speaker, anchor_min: Option<u32>) -> Self {
        Self {
            speaker,
            anchor_min,
            published: None,
            duration_min: None,
        }
    }

    pub fn published(speaker: Speaker, anchor_min: Option<u32>, text: String) -> Self {
        Self {
            speaker,
            anchor_min,
            published: Some(text),
            duration_min: None,
        }
    }
}

impl Display for Speech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  ▸ {}", self.speaker.name)?;
        if !self.speaker.attributes.is_empty() {
            write!(f, " ({})", self.speaker.attributes.join("・"))?;
        }
        match self.duration_min {
            Some(min) => writeln!(f, " — {}分", min),
            None => writeln!(f, " — ?"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub house: House,
    pub date: NaiveDate,
    pub name: String,
    pub topics: Vec<String>,
    pub duration_total_min: Option<u32>,
    pub speeches: Vec<Speech>,
}

impl Display for MeetingInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─ {} ─ {} ─ {}", self.house, self.date, self.name)?;
        if let Some(total) = self.duration_total_min {
            writeln!(f, "│  Duration: {}分", total)?;
        }
        for topic in &self.topics {
            writeln!(f, "│  案件: {}", topic)?;
        }
        writeln!(f, "└─ {} speech(es)", self.speeches.len())?;
        for speech in &self.speeches {
            write!(f, "{}", speech)?;
        }
        Ok(())
    }
}

/// Flattened per-speech row, the unit cached to CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub date: NaiveDate,
    pub meeting_name: String,
    pub speaker_name: String,
    pub attributes: String,
    pub duration_min: Option<u32>,
    pub topics: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub name_kana: String,
    pub party: String,
}

impl Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.name_kana)?;
        if !self.party.is_empty() {
            write!(f, " — {}", self.party)?;
        }
        Ok(())
    }
}

/// A written question (主意書).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub number: u32,
    pub title: String,
    pub submitter: String,
}

impl Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>4}. {} — {}", self.number, self.title, self.submitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_from_str() {
        assert_eq!(House::from_str("shugiin").unwrap(), House::Shugiin);
        assert_eq!(House::from_str("upper").unwrap(), House::Sangiin);
        assert!(House::from_str("senate").is_err());
    }

    #[test]
    fn test_speech_starts_underived() {
        let speech = Speech::anchored(Speaker::unattributed("山田太郎".to_string()), Some(12));
        assert_eq!(speech.anchor_min, Some(12));
        assert!(speech.duration_min.is_none());
    }
}

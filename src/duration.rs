use std::sync::LazyLock;

use regex::Regex;

use crate::types::{House, MeetingInfo, Speech};

static RE_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*時間").expect("invalid regex: hours"));

static RE_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*分").expect("invalid regex: minutes"));

static RE_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})").expect("invalid regex: clock"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationFault {
    #[error("speech {index} ({speaker}): anchors not increasing, derived {delta} minutes")]
    NonMonotonic {
        index: usize,
        speaker: String,
        delta: i64,
    },
    #[error("speech {index} ({speaker}): no anchor time")]
    MissingAnchor { index: usize, speaker: String },
    #[error("speech {index} ({speaker}): total meeting duration unknown")]
    MissingTotal { index: usize, speaker: String },
    #[error("speech {index} ({speaker}): unreadable duration '{text}'")]
    UnreadableText {
        index: usize,
        speaker: String,
        text: String,
    },
}

/// How per-speech durations are obtained. The two sites publish different
/// signals, so each house gets its own algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculator {
    /// Subtract adjacent seek anchors; the last speech runs to the end of
    /// the meeting.
    AnchorInterval,
    /// Read the duration printed next to each speech.
    PublishedText,
}

impl Calculator {
    pub fn for_house(house: House) -> Self {
        match house {
            House::Shugiin => Calculator::PublishedText,
            House::Sangiin => Calculator::AnchorInterval,
        }
    }

    /// Fills `duration_min` on every speech it can. Speeches that fault keep
    /// `None` and are reported back.
    pub fn apply(&self, meeting: &mut MeetingInfo) -> Vec<DurationFault> {
        match self {
            Calculator::AnchorInterval => {
                derive_from_anchors(&mut meeting.speeches, meeting.duration_total_min)
            }
            Calculator::PublishedText => read_published(&mut meeting.speeches),
        }
    }
}

pub fn derive_from_anchors(speeches: &mut [Speech], total_min: Option<u32>) -> Vec<DurationFault> {
    let anchors: Vec<Option<u32>> = speeches.iter().map(|s| s.anchor_min).collect();
    let last = anchors.len().saturating_sub(1);
    let mut faults = Vec::new();

    for (index, speech) in speeches.iter_mut().enumerate() {
        speech.duration_min = None;
        let speaker = speech.speaker.name.clone();

        let Some(start) = anchors[index] else {
            faults.push(DurationFault::MissingAnchor { index, speaker });
            continue;
        };

        let end = if index == last {
            match total_min {
                Some(total) => total,
                None => {
                    faults.push(DurationFault::MissingTotal { index, speaker });
                    continue;
                }
            }
        } else {
            // a missing following anchor is reported at its own index
            let Some(next) = anchors[index + 1] else {
                continue;
            };
            next
        };

        let delta = i64::from(end) - i64::from(start);
        if delta < 0 {
            faults.push(DurationFault::NonMonotonic {
                index,
                speaker,
                delta,
            });
            continue;
        }

        speech.duration_min = u32::try_from(delta).ok();
    }

    faults
}

pub fn read_published(speeches: &mut [Speech]) -> Vec<DurationFault> {
    let mut faults = Vec::new();

    for (index, speech) in speeches.iter_mut().enumerate() {
        let text = speech.published.clone().unwrap_or_default();
        speech.duration_min = parse_duration_text(&text);
        if speech.duration_min.is_none() {
            faults.push(DurationFault::UnreadableText {
                index,
                speaker: speech.speaker.name.clone(),
                text,
            });
        }
    }

    faults
}

fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Parses "H時間M分", "M分", "約H時間" and the like into minutes. A missing
/// hours or minutes part counts as zero; `None` when neither is present.
pub fn parse_duration_text(text: &str) -> Option<u32> {
    let text = ascii_digits(text);

    let hours = RE_HOURS
        .captures(&text)
        .and_then(|caps| caps[1].parse::<u32>().ok());
    let minutes = RE_MINUTES
        .captures(&text)
        .and_then(|caps| caps[1].parse::<u32>().ok());

    if hours.is_none() && minutes.is_none() {
        return None;
    }

    Some(hours.unwrap_or(0) * 60 + minutes.unwrap_or(0))
}

/// Minutes since midnight for a "HH:MM" start cell.
pub fn parse_clock_minutes(text: &str) -> Option<u32> {
    let text = ascii_digits(text);
    let caps = RE_CLOCK.captures(&text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 47 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Converts a seek link fragment such as `#1530` (elapsed seconds) into
/// whole minutes, rounded to nearest with exact half-minutes going to the
/// even minute.
pub fn anchor_minutes(href: &str) -> Option<u32> {
    let fragment = href.rsplit('#').next()?.trim();
    let seconds: f64 = fragment.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds / 60.0).round_ties_even() as u32)
}

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Speaker;

static RE_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(（].+?[)）]").expect("invalid regex: parenthetical")
});

static RE_FIRST_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(（](.+?)[)）]").expect("invalid regex: first group")
});

const IDEOGRAPHIC_SPACE: char = '\u{3000}';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("No attribute group in speaker label '{name}'")]
    MissingAttributes { name: String },
}

/// Separator used between attribute tokens inside the parenthetical group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `・`, lower house.
    Nakaguro,
    /// `、`, upper house.
    Touten,
}

impl Delimiter {
    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Nakaguro => '・',
            Delimiter::Touten => '、',
        }
    }
}

/// Removes every parenthetical span from `label`. A label without any
/// comes back trimmed but otherwise unchanged.
pub fn strip_parentheticals(label: &str) -> String {
    RE_PARENTHETICAL.replace_all(label, "").trim().to_string()
}

/// Inner text of the first parenthetical group, if there is one.
pub fn first_parenthetical(label: &str) -> Option<&str> {
    RE_FIRST_GROUP
        .captures(label)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Splits `DisplayName(tok1・tok2)` into a [`Speaker`].
///
/// Ideographic spaces inside the group count as delimiters. Fails with
/// [`AttributeError::MissingAttributes`] (carrying the bare name) when the
/// label has no parenthetical group at all.
pub fn parse_speaker_label(label: &str, delimiter: Delimiter) -> Result<Speaker, AttributeError> {
    let name = strip_parentheticals(label);

    let Some(inner) = first_parenthetical(label) else {
        return Err(AttributeError::MissingAttributes { name });
    };

    let sep = delimiter.as_char();
    let attributes: Vec<String> = inner
        .replace(IDEOGRAPHIC_SPACE, &sep.to_string())
        .split(sep)
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(str::to_string)
        .collect();

    if attributes.is_empty() {
        return Err(AttributeError::MissingAttributes { name });
    }

    Ok(Speaker { name, attributes })
}

/// Like [`parse_speaker_label`], but keeps the speaker with no attributes
/// when the group is missing. The failure is logged.
pub fn speaker_or_unattributed(label: &str, delimiter: Delimiter) -> Speaker {
    parse_speaker_label(label, delimiter).unwrap_or_else(|e| {
        log::warn!("{}; keeping speaker without attributes", e);
        match e {
            AttributeError::MissingAttributes { name } => Speaker::unattributed(name),
        }
    })
}

//! Filename classifier.
//!
//! Remote files follow `[<digits>_]<yyyymmdd>_<basename>.<csv|zip>`. A
//! leading number marks one part of a multi-part upload. Anything else is not
//! ours and is skipped without error.

use std::sync::LazyLock;

use regex::Regex;

use crate::grouping::GroupKey;

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:([0-9]+)_)?([0-9]{8})_(.+?)\.(csv|zip)$").expect("filename pattern is valid")
});

/// How an artifact is handled after download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Plain,
    Archive,
}

/// A recognised remote filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Position within a multi-part set; `None` for standalone files.
    /// Saturates at `u64::MAX` for prefixes too long to represent.
    pub part_number: Option<u64>,
    /// 8-digit date token, kept as text.
    pub date: String,
    pub base_name: String,
    pub kind: ArtifactKind,
    /// Exact remote name, used to fetch the file.
    pub original_name: String,
}

impl FileDescriptor {
    pub fn is_archive(&self) -> bool {
        self.kind == ArtifactKind::Archive
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.date, &self.base_name)
    }
}

/// Parse one remote filename. Returns `None` for names that do not follow the
/// naming convention.
pub fn classify(name: &str) -> Option<FileDescriptor> {
    let caps = FILENAME_PATTERN.captures(name)?;

    // The prefix is all digits, so the only parse failure is overflow; an
    // oversized prefix still marks a part.
    let part_number = caps
        .get(1)
        .map(|digits| digits.as_str().parse::<u64>().unwrap_or(u64::MAX));
    let kind = match &caps[4] {
        "zip" => ArtifactKind::Archive,
        _ => ArtifactKind::Plain,
    };

    Some(FileDescriptor {
        part_number,
        date: caps[2].to_string(),
        base_name: caps[3].to_string(),
        kind,
        original_name: name.to_string(),
    })
}

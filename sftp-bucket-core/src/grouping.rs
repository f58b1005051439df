//! Group builder: partitions a remote listing into logical datasets.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::classify::{classify, FileDescriptor};

/// Identifies one logical dataset: files sharing a date and base name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    date: String,
    base_name: String,
}

impl GroupKey {
    pub fn new(date: &str, base_name: &str) -> Self {
        Self {
            date: date.to_string(),
            base_name: base_name.to_string(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date, self.base_name)
    }
}

/// Members of each group, in listing order.
pub type Groups = BTreeMap<GroupKey, Vec<FileDescriptor>>;

/// Classify every name and bucket the recognised ones by [`GroupKey`].
/// Unrecognised names are dropped.
pub fn build_groups<I, S>(names: I) -> Groups
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups = Groups::new();
    for name in names {
        let name = name.as_ref();
        match classify(name) {
            Some(descriptor) => {
                groups
                    .entry(descriptor.group_key())
                    .or_default()
                    .push(descriptor);
            }
            None => debug!(file = %name, "Skipping unrecognised remote file"),
        }
    }
    groups
}

/// A group is reassembled when any member carries a part number.
pub fn requires_merge(members: &[FileDescriptor]) -> bool {
    members.iter().any(|m| m.part_number.is_some())
}

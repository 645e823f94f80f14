//! Shard file names.

use std::cmp::Ordering;
use std::fmt;

/// File suffix shared by every shard.
pub const SHARD_SUFFIX: &str = ".shard";

const SHARD_PREFIX: &str = "data_";

/// Name of one shard file, e.g. `data_3.shard`.
///
/// Shards order by their numeric index, so `data_10.shard` comes after
/// `data_9.shard`. Files that carry the shard suffix but no parsable index
/// sort before all indexed shards, by name, so the newest indexed shard is
/// always last.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShardName {
    name: String,
    index: Option<u64>,
}

impl ShardName {
    /// Returns the canonical name for shard number `index`.
    #[must_use]
    pub fn for_index(index: u64) -> Self {
        Self {
            name: format!("{SHARD_PREFIX}{index}{SHARD_SUFFIX}"),
            index: Some(index),
        }
    }

    /// Interprets a file name as a shard name.
    ///
    /// Returns `None` if the name lacks the shard suffix.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(SHARD_SUFFIX)?;
        let index = stem
            .strip_prefix(SHARD_PREFIX)
            .and_then(|digits| digits.parse::<u64>().ok());
        Some(Self {
            name: name.to_owned(),
            index,
        })
    }

    /// Returns the file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the numeric shard index, if the name follows `data_<n>.shard`.
    #[must_use]
    pub const fn index(&self) -> Option<u64> {
        self.index
    }
}

impl Ord for ShardName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.index, other.index) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for ShardName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ShardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardName({})", self.name)
    }
}

impl fmt::Display for ShardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for ShardName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

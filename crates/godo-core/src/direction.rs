use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four mutually exclusive swipe outcomes.
///
/// Each direction is bound to exactly one destination collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Right swipe: going, kept on the private calendar.
    CommitPrivate,
    /// Up swipe: going, shared with friends.
    CommitPublic,
    /// Down swipe: saved for later.
    Defer,
    /// Left swipe: pass.
    Discard,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::CommitPrivate,
        Direction::CommitPublic,
        Direction::Defer,
        Direction::Discard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommitPrivate => "commit-private",
            Self::CommitPublic => "commit-public",
            Self::Defer => "defer",
            Self::Discard => "discard",
        }
    }

    /// Stable index into per-direction tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            Self::CommitPrivate => 0,
            Self::CommitPublic => 1,
            Self::Defer => 2,
            Self::Discard => 3,
        }
    }

    /// Physical swipe name used by the swipes API.
    pub fn swipe(&self) -> &'static str {
        match self {
            Self::CommitPrivate => "right",
            Self::CommitPublic => "up",
            Self::Defer => "down",
            Self::Discard => "left",
        }
    }

    /// Swipe action name used by the swipes API.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CommitPrivate => "going_private",
            Self::CommitPublic => "going_shared",
            Self::Defer => "maybe_later",
            Self::Discard => "not_interested",
        }
    }

    /// Calendar visibility for attending directions.
    pub fn visibility(&self) -> Option<&'static str> {
        match self {
            Self::CommitPrivate => Some("private"),
            Self::CommitPublic => Some("friends"),
            Self::Defer | Self::Discard => None,
        }
    }

    /// Whether the item lands on the calendar.
    pub fn is_attending(&self) -> bool {
        matches!(self, Self::CommitPrivate | Self::CommitPublic)
    }

    /// Display label for the destination collection.
    pub fn collection_label(&self) -> &'static str {
        match self {
            Self::CommitPrivate => "Private calendar",
            Self::CommitPublic => "Shared calendar",
            Self::Defer => "Saved for later",
            Self::Discard => "Passed",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    /// Accepts the canonical name, the swipe direction or the API action.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s || d.swipe() == s || d.action() == s)
            .ok_or_else(|| format!("Unknown direction: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_vocabularies() {
        assert_eq!("commit-private".parse::<Direction>().unwrap(), Direction::CommitPrivate);
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::CommitPublic);
        assert_eq!("MAYBE_LATER".parse::<Direction>().unwrap(), Direction::Defer);
        assert_eq!("left".parse::<Direction>().unwrap(), Direction::Discard);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&Direction::CommitPublic).unwrap();
        assert_eq!(json, "\"commit-public\"");
    }

    #[test]
    fn indices_are_distinct() {
        let mut seen = [false; 4];
        for d in Direction::ALL {
            assert!(!seen[d.index()]);
            seen[d.index()] = true;
        }
    }
}

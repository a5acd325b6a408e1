//! GADM-style boundary records.
//!
//! A record is one row of the flat source table: one finest-grained
//! administrative unit together with the sparse chain of every level above
//! it. Levels have a fixed semantic order; most are empty for any given row.

use std::fmt;

/// The geographical levels of a boundary record, in nesting order.
///
/// `Sovereign` and `GovernedBy` are the mutually exclusive "sub-country"
/// pair: at most one of them is meaningful per record, selected by
/// precedence (the first non-empty one wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Continent,
    Subcontinent,
    Sovereign,
    GovernedBy,
    Country,
    Region,
    Name0,
    Name1,
    Name2,
    Name3,
    Name4,
    Name5,
}

impl Level {
    /// All levels in the fixed semantic order.
    pub const ALL: [Level; 12] = [
        Level::Continent,
        Level::Subcontinent,
        Level::Sovereign,
        Level::GovernedBy,
        Level::Country,
        Level::Region,
        Level::Name0,
        Level::Name1,
        Level::Name2,
        Level::Name3,
        Level::Name4,
        Level::Name5,
    ];

    /// The mutually exclusive sub-country levels, in precedence order.
    pub const SUBCOUNTRY: [Level; 2] = [Level::Sovereign, Level::GovernedBy];

    /// The generic name levels below NAME_0.
    pub const DEEP_NAMES: [Level; 5] = [
        Level::Name1,
        Level::Name2,
        Level::Name3,
        Level::Name4,
        Level::Name5,
    ];

    /// Position in [`Level::ALL`].
    pub fn index(self) -> usize {
        match self {
            Level::Continent => 0,
            Level::Subcontinent => 1,
            Level::Sovereign => 2,
            Level::GovernedBy => 3,
            Level::Country => 4,
            Level::Region => 5,
            Level::Name0 => 6,
            Level::Name1 => 7,
            Level::Name2 => 8,
            Level::Name3 => 9,
            Level::Name4 => 10,
            Level::Name5 => 11,
        }
    }

    /// Source column name for this level.
    pub fn column(self) -> &'static str {
        match self {
            Level::Continent => "CONTINENT",
            Level::Subcontinent => "SUBCONT",
            Level::Sovereign => "SOVEREIGN",
            Level::GovernedBy => "GOVERNEDBY",
            Level::Country => "COUNTRY",
            Level::Region => "REGION",
            Level::Name0 => "NAME_0",
            Level::Name1 => "NAME_1",
            Level::Name2 => "NAME_2",
            Level::Name3 => "NAME_3",
            Level::Name4 => "NAME_4",
            Level::Name5 => "NAME_5",
        }
    }

    /// Whether this is one of the sub-country pair.
    pub fn is_subcountry(self) -> bool {
        matches!(self, Level::Sovereign | Level::GovernedBy)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One row of the flat source table.
///
/// Level names are normalized on insertion: empty or whitespace-only values
/// become `None`, so "empty" means exactly one thing downstream.
#[derive(Debug, Clone, Default)]
pub struct BoundaryRecord {
    levels: [Option<String>; 12],
    /// External unique id of the finest-grained unit (the GADM UID).
    pub uid: Option<i64>,
}

impl BoundaryRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a level's name. Empty and whitespace-only values are dropped.
    pub fn set_level(&mut self, level: Level, name: impl Into<String>) {
        let name = name.into();
        let trimmed = name.trim();
        self.levels[level.index()] = if trimmed.is_empty() {
            None
        } else if trimmed.len() == name.len() {
            Some(name)
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Builder-style [`set_level`](Self::set_level).
    pub fn with_level(mut self, level: Level, name: impl Into<String>) -> Self {
        self.set_level(level, name);
        self
    }

    /// Builder-style uid setter.
    pub fn with_uid(mut self, uid: i64) -> Self {
        self.uid = Some(uid);
        self
    }

    /// The name at a level, if non-empty.
    pub fn level(&self, level: Level) -> Option<&str> {
        self.levels[level.index()].as_deref()
    }

    /// Whether every level is empty.
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|l| l.is_none())
    }
}

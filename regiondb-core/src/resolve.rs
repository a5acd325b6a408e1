//! Per-record level resolution.
//!
//! Converts one [`BoundaryRecord`] into the ordered list of tree nodes it
//! should materialize, applying the skip rules for redundant levels. The
//! output is a tagged result rather than an in-band sentinel: the terminal
//! action tells the hierarchy builder whether the last emitted node is the
//! record's leaf, or whether the record turned out to be a country with no
//! further subdivision whose id and geometry belong on an already-emitted
//! division.
//!
//! Skip rules, applied per level in the fixed order:
//!
//! - empty levels are skipped;
//! - of the two sub-country levels, only the first non-empty one is kept,
//!   and it is dropped when it merely repeats the country name;
//! - NAME_0 repeating the country name is dropped when a deeper name level
//!   exists (the country node already sits higher in the chain), and turns
//!   into a terminal-update signal when none does.

use crate::record::{BoundaryRecord, Level};

/// What to do once all of a record's nodes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The last node in `nodes` is the record's leaf: it carries the
    /// record's uid and geometry and is marked childless.
    LeafNode,
    /// The record adds no new leaf (a country with no subdivision): attach
    /// the record's uid and geometry to the deepest emitted division and
    /// mark it childless.
    UpdateExisting,
    /// Every level was empty; nothing to materialize.
    Empty,
}

/// One level to materialize as a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub level: Level,
    pub name: String,
    /// True iff some deeper, to-be-materialized level is non-empty for
    /// this record.
    pub has_children: bool,
}

/// The resolver's output for one record: nodes in nesting order (a node's
/// parent always precedes it) plus the terminal action.
#[derive(Debug, Clone)]
pub struct ResolvedRecord {
    pub nodes: Vec<ResolvedNode>,
    pub terminal: Terminal,
}

/// Resolve one record into its node sequence.
pub fn resolve(record: &BoundaryRecord) -> ResolvedRecord {
    let country = record.level(Level::Country);
    let subcountry = Level::SUBCOUNTRY
        .iter()
        .copied()
        .find(|l| record.level(*l).is_some());

    let mut emitted: Vec<(Level, String)> = Vec::new();
    let mut terminal_update = false;

    for level in Level::ALL {
        let Some(name) = record.level(level) else {
            continue;
        };

        if level.is_subcountry() {
            if Some(level) != subcountry {
                continue;
            }
            if Some(name) == country {
                // Redundant: "France governs France".
                continue;
            }
        }

        if level == Level::Name0 && Some(name) == country {
            let has_deeper = Level::DEEP_NAMES
                .iter()
                .any(|l| record.level(*l).is_some());
            if !has_deeper && !emitted.is_empty() {
                // Country with no further subdivision: this row's uid and
                // geometry belong on the country division emitted above.
                terminal_update = true;
            }
            continue;
        }

        emitted.push((level, name.to_string()));
    }

    let terminal = if emitted.is_empty() {
        Terminal::Empty
    } else if terminal_update {
        Terminal::UpdateExisting
    } else {
        Terminal::LeafNode
    };

    // In the terminal-update case the deepest emitted node still has a
    // deeper non-empty level (NAME_0 itself), so it is created as internal;
    // the update pass flips it to a leaf when it attaches the geometry.
    let last = emitted.len().saturating_sub(1);
    let nodes = emitted
        .into_iter()
        .enumerate()
        .map(|(i, (level, name))| ResolvedNode {
            level,
            name,
            has_children: i < last || terminal == Terminal::UpdateExisting,
        })
        .collect();

    ResolvedRecord { nodes, terminal }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(resolved: &ResolvedRecord) -> Vec<&str> {
        resolved.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn full_chain_emits_in_order() {
        let rec = BoundaryRecord::new()
            .with_level(Level::Continent, "Europe")
            .with_level(Level::Country, "Germany")
            .with_level(Level::Name0, "Germany")
            .with_level(Level::Name1, "Berlin")
            .with_uid(42);
        let resolved = resolve(&rec);
        // NAME_0 repeats the country and a deeper level exists: skipped.
        assert_eq!(names(&resolved), vec!["Europe", "Germany", "Berlin"]);
        assert_eq!(resolved.terminal, Terminal::LeafNode);
        assert!(resolved.nodes[0].has_children);
        assert!(resolved.nodes[1].has_children);
        assert!(!resolved.nodes[2].has_children);
    }

    #[test]
    fn country_without_subdivision_signals_terminal_update() {
        // The Samoa shape: NAME_0 repeats the country, nothing deeper.
        let rec = BoundaryRecord::new()
            .with_level(Level::Continent, "Oceania")
            .with_level(Level::Country, "Samoa")
            .with_level(Level::Name0, "Samoa")
            .with_uid(7);
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["Oceania", "Samoa"]);
        assert_eq!(resolved.terminal, Terminal::UpdateExisting);
        // The country is created internal; the terminal update makes it a leaf.
        assert!(resolved.nodes[1].has_children);
    }

    #[test]
    fn subcountry_precedence_first_nonempty_wins() {
        let rec = BoundaryRecord::new()
            .with_level(Level::Sovereign, "France")
            .with_level(Level::GovernedBy, "Elsewhere")
            .with_level(Level::Country, "New Caledonia")
            .with_level(Level::Name0, "New Caledonia")
            .with_level(Level::Name1, "Sud");
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["France", "New Caledonia", "Sud"]);
    }

    #[test]
    fn governedby_selected_when_sovereign_empty() {
        let rec = BoundaryRecord::new()
            .with_level(Level::GovernedBy, "Denmark")
            .with_level(Level::Country, "Greenland")
            .with_level(Level::Name1, "Sermersooq");
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["Denmark", "Greenland", "Sermersooq"]);
    }

    #[test]
    fn subcountry_equal_to_country_is_dropped() {
        let rec = BoundaryRecord::new()
            .with_level(Level::Sovereign, "France")
            .with_level(Level::Country, "France")
            .with_level(Level::Name1, "Bretagne");
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["France", "Bretagne"]);
    }

    #[test]
    fn distinct_name0_becomes_a_node() {
        let rec = BoundaryRecord::new()
            .with_level(Level::Country, "Cyprus")
            .with_level(Level::Name0, "Akrotiri and Dhekelia");
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["Cyprus", "Akrotiri and Dhekelia"]);
        assert_eq!(resolved.terminal, Terminal::LeafNode);
        assert!(resolved.nodes[0].has_children);
        assert!(!resolved.nodes[1].has_children);
    }

    #[test]
    fn empty_record_resolves_to_nothing() {
        let resolved = resolve(&BoundaryRecord::new());
        assert!(resolved.nodes.is_empty());
        assert_eq!(resolved.terminal, Terminal::Empty);
    }

    #[test]
    fn name0_without_country_is_kept() {
        // Country empty: the NAME_0 comparison cannot fire.
        let rec = BoundaryRecord::new().with_level(Level::Name0, "Antarctica");
        let resolved = resolve(&rec);
        assert_eq!(names(&resolved), vec!["Antarctica"]);
        assert_eq!(resolved.terminal, Terminal::LeafNode);
    }
}

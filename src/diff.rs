//! FILE→SERVER diff engine.
//!
//! Compares the entries of a freshly parsed definition against the entries
//! currently stored server-side (converted back to file representation) and
//! reports what a sync would add, change or drop.
//!
//! Output order is fully determined by the input order: new entries are
//! walked in file order, then old entries in server order. The hash map is
//! only used for lookups, never iterated.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::Entry;
use crate::percent::{approx_eq, format_percent};
use crate::tolerance::Band;

/// What happened to one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChangeKind {
    Add,
    Remove,
    Modify,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "ADD"),
            ChangeKind::Remove => write!(f, "REMOVE"),
            ChangeKind::Modify => write!(f, "MODIFY"),
        }
    }
}

/// One line of a change report.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    /// Ticker or component name.
    pub subject: String,
    /// Field deltas (`"target 10 -> 11"`) or, for adds and removes, the band.
    pub details: Vec<String>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            ChangeKind::Add => '+',
            ChangeKind::Remove => '-',
            ChangeKind::Modify => '~',
        };
        write!(f, "{marker} {}", self.subject)?;
        if !self.details.is_empty() {
            write!(f, ": {}", self.details.join(", "))?;
        }
        Ok(())
    }
}

/// Number of records of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeCounts {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
}

impl ChangeCounts {
    pub fn of(changes: &[ChangeRecord]) -> Self {
        let mut counts = Self::default();
        for change in changes {
            match change.kind {
                ChangeKind::Add => counts.added += 1,
                ChangeKind::Modify => counts.modified += 1,
                ChangeKind::Remove => counts.removed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed
    }
}

impl fmt::Display for ChangeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} modified, {} removed",
            self.added, self.modified, self.removed
        )
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn band_details(band: Band) -> Vec<String> {
    vec![
        format!("lower {}", format_percent(band.lower_bound)),
        format!("target {}", format_percent(band.target)),
        format!("upper {}", format_percent(band.upper_bound)),
    ]
}

fn field_delta(field: &str, old: f64, new: f64, out: &mut Vec<String>) {
    if !approx_eq(old, new) {
        out.push(format!(
            "{field} {} -> {}",
            format_percent(old),
            format_percent(new)
        ));
    }
}

/// Set difference `a − b` on case-insensitive tickers, in `a` order, deduplicated.
fn ticker_difference(a: &[String], b: &[String]) -> Vec<String> {
    let exclude: FxHashSet<String> = b.iter().map(|t| normalize(t)).collect();
    let mut seen = FxHashSet::default();
    a.iter()
        .filter(|t| {
            let key = normalize(t);
            !exclude.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}

/// Compute the change list that turns `old` into `new`.
///
/// Entries are matched by case-insensitive key. Bounds are compared within
/// 1e-9 so that values reconstructed from server tolerances do not produce
/// spurious deltas.
pub fn diff<N: Entry, O: Entry>(new: &[N], old: &[O]) -> Vec<ChangeRecord> {
    let mut old_by_key: FxHashMap<String, &O> = FxHashMap::default();
    for entry in old {
        old_by_key.entry(normalize(entry.key())).or_insert(entry);
    }

    let mut changes = Vec::new();
    let mut new_keys: FxHashSet<String> = FxHashSet::default();

    for entry in new {
        let key = normalize(entry.key());
        let band = entry.band();

        match old_by_key.get(&key) {
            None => changes.push(ChangeRecord {
                kind: ChangeKind::Add,
                subject: entry.key().to_string(),
                details: band_details(band),
            }),
            Some(previous) => {
                let before = previous.band();
                let mut details = Vec::new();
                field_delta("lower", before.lower_bound, band.lower_bound, &mut details);
                field_delta("target", before.target, band.target, &mut details);
                field_delta("upper", before.upper_bound, band.upper_bound, &mut details);

                let added = ticker_difference(entry.equivalents(), previous.equivalents());
                let removed = ticker_difference(previous.equivalents(), entry.equivalents());
                if !added.is_empty() {
                    details.push(format!("equivalents added: {}", added.join(" ")));
                }
                if !removed.is_empty() {
                    details.push(format!("equivalents removed: {}", removed.join(" ")));
                }

                if !details.is_empty() {
                    changes.push(ChangeRecord {
                        kind: ChangeKind::Modify,
                        subject: entry.key().to_string(),
                        details,
                    });
                }
            }
        }
        new_keys.insert(key);
    }

    for entry in old {
        if !new_keys.contains(&normalize(entry.key())) {
            changes.push(ChangeRecord {
                kind: ChangeKind::Remove,
                subject: entry.key().to_string(),
                details: band_details(entry.band()),
            });
        }
    }

    changes
}

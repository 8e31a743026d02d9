//! Conversion between definition files and Eclipse records.
//!
//! Server → file: offsets become absolute bands, children are ordered by
//! rank. File → server: bands become offsets, tickers and component names
//! become ids, and on update the ids the server already assigned are carried
//! onto the matching new entries.

use log::warn;
use modelsync::{
    Band, Entry, ModelComponent, ModelDefinition, SecurityEntry, SecuritySetDefinition, Tolerance,
};
use modelsync_client::{
    AssetRef, Equivalence, Model, ModelDetail, NewModel, SecuritySet, SecuritySetPayload,
    SecuritySetSecurity,
};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::resolver::Resolver;
use crate::sync::SyncOptions;

fn band_of(target: Option<f64>, lower: Option<f64>, upper: Option<f64>) -> Band {
    Tolerance::new(
        target.unwrap_or(0.0),
        lower.unwrap_or(0.0),
        upper.unwrap_or(0.0),
    )
    .to_band()
}

/// Indices of `ranks` in ascending rank order; unranked items keep their
/// relative position after the ranked ones.
fn rank_order(ranks: &[Option<u32>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ranks.len()).collect();
    order.sort_by_key(|&i| (ranks[i].is_none(), ranks[i].unwrap_or(0)));
    order
}

// === Server → file ===

/// Ticker written for a stored security. Without a symbol the id stands in;
/// only an update of the same set resolves it again.
fn symbol_or_id(symbol: Option<&str>, id: i64, set_name: &str) -> String {
    match symbol {
        Some(symbol) => symbol.to_string(),
        None => {
            warn!("Security {id} in '{set_name}' has no symbol, writing its id as the ticker");
            id.to_string()
        }
    }
}

/// Entries of a stored security set, in rank order.
pub fn security_entries(set: &SecuritySet) -> Vec<SecurityEntry> {
    let ranks: Vec<Option<u32>> = set.securities.iter().map(|s| s.rank).collect();
    rank_order(&ranks)
        .into_iter()
        .enumerate()
        .map(|(position, i)| {
            let sec = &set.securities[i];
            let band = band_of(
                sec.target_percent,
                sec.lower_model_tolerance_percent,
                sec.upper_model_tolerance_percent,
            );
            let ticker = symbol_or_id(sec.symbol.as_deref(), sec.id, &set.name);
            SecurityEntry {
                ticker,
                lower_bound: band.lower_bound,
                target: band.target,
                upper_bound: band.upper_bound,
                equivalents: sec
                    .equivalences
                    .iter()
                    .map(|e| symbol_or_id(e.symbol.as_deref(), e.id, &set.name))
                    .collect(),
                rank: position as u32,
            }
        })
        .collect()
}

/// Components of a stored model tree, in rank order. A model without a
/// tree has none.
pub fn model_components(model: &Model) -> Vec<ModelComponent> {
    let Some(root) = &model.model_detail else {
        return Vec::new();
    };
    let ranks: Vec<Option<u32>> = root.children.iter().map(|c| c.rank).collect();
    rank_order(&ranks)
        .into_iter()
        .enumerate()
        .map(|(position, i)| {
            let child = &root.children[i];
            let band = band_of(
                child.target_percent,
                child.lower_model_tolerance_percent,
                child.upper_model_tolerance_percent,
            );
            ModelComponent {
                name: child.name.clone(),
                lower_bound: band.lower_bound,
                target: band.target,
                upper_bound: band.upper_bound,
                rank: position as u32,
            }
        })
        .collect()
}

pub fn security_set_definition(set: &SecuritySet) -> SecuritySetDefinition {
    SecuritySetDefinition {
        name: set.name.clone(),
        description: set.description.clone().filter(|d| !d.trim().is_empty()),
        entries: security_entries(set),
    }
}

pub fn model_definition(model: &Model) -> ModelDefinition {
    ModelDefinition {
        name: model.name.clone(),
        description: model.description.clone().filter(|d| !d.trim().is_empty()),
        entries: model_components(model),
    }
}

// === File → server ===

/// Resolve one equivalent. Misses are dropped with a warning unless strict.
fn resolve_equivalent(
    resolver: &mut Resolver<'_>,
    owner: &str,
    ticker: &str,
    strict: bool,
) -> Result<Option<i64>> {
    match resolver.resolve_security(ticker) {
        Ok(id) => Ok(Some(id)),
        Err(Error::NotFound(msg)) if !strict => {
            warn!("Dropping equivalent {ticker} of {owner}: {msg}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Server form of every entry, with ids resolved. Nothing is written.
pub fn security_set_securities(
    entries: &[SecurityEntry],
    resolver: &mut Resolver<'_>,
    strict_equivalents: bool,
) -> Result<Vec<SecuritySetSecurity>> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = resolver.resolve_security(&entry.ticker)?;
        let tol = entry.band().to_tolerance();

        let mut equivalences = Vec::new();
        for eq in &entry.equivalents {
            if let Some(eq_id) = resolve_equivalent(resolver, &entry.ticker, eq, strict_equivalents)? {
                equivalences.push(Equivalence {
                    id: eq_id,
                    ..Default::default()
                });
            }
        }

        out.push(SecuritySetSecurity {
            id,
            symbol: None,
            target_percent: Some(tol.target),
            lower_model_tolerance_percent: Some(tol.lower_tolerance),
            upper_model_tolerance_percent: Some(tol.upper_tolerance),
            rank: Some(entry.rank),
            equivalences,
            ..Default::default()
        });
    }
    Ok(out)
}

pub fn new_security_set_payload(
    def: &SecuritySetDefinition,
    securities: Vec<SecuritySetSecurity>,
    options: &SyncOptions,
) -> SecuritySetPayload {
    SecuritySetPayload {
        name: def.name.clone(),
        description: def.description.clone(),
        tolerance_type: options.tolerance_type.clone(),
        tolerance_type_value: options.tolerance_type_value,
        securities,
    }
}

/// Update body: the set's tolerance settings stay as stored; the description
/// is only replaced when the file has one.
pub fn updated_security_set_payload(
    def: &SecuritySetDefinition,
    securities: Vec<SecuritySetSecurity>,
    existing: &SecuritySet,
    options: &SyncOptions,
) -> SecuritySetPayload {
    SecuritySetPayload {
        name: def.name.clone(),
        description: def
            .description
            .clone()
            .or_else(|| existing.description.clone()),
        tolerance_type: existing
            .tolerance_type
            .clone()
            .unwrap_or_else(|| options.tolerance_type.clone()),
        tolerance_type_value: existing
            .tolerance_type_value
            .unwrap_or(options.tolerance_type_value),
        securities,
    }
}

/// Children of a model tree.
///
/// Every component must name an existing security set. Components that
/// match a child of `existing` by name keep that child's `id`,
/// `modelDetailId` and unmodelled fields; the rest carry none.
pub fn model_children(
    entries: &[ModelComponent],
    resolver: &mut Resolver<'_>,
    existing: Option<&ModelDetail>,
) -> Result<Vec<ModelDetail>> {
    let mut previous: FxHashMap<String, &ModelDetail> = FxHashMap::default();
    if let Some(root) = existing {
        for child in &root.children {
            previous
                .entry(child.name.trim().to_lowercase())
                .or_insert(child);
        }
    }

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let set = resolver
            .find_security_set_by_name(&entry.name)?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "security set '{}' used by model component",
                    entry.name
                ))
            })?;
        let tol = entry.band().to_tolerance();
        let matched = previous.get(&entry.name.trim().to_lowercase());

        out.push(ModelDetail {
            id: matched.and_then(|c| c.id),
            model_detail_id: matched.and_then(|c| c.model_detail_id),
            extra: matched.map(|c| c.extra.clone()).unwrap_or_default(),
            name: entry.name.clone(),
            security_asset: Some(AssetRef { id: set.id }),
            target_percent: Some(tol.target),
            lower_model_tolerance_percent: Some(tol.lower_tolerance),
            upper_model_tolerance_percent: Some(tol.upper_tolerance),
            rank: Some(entry.rank),
            ..Default::default()
        });
    }
    Ok(out)
}

pub fn new_model(def: &ModelDefinition) -> NewModel {
    NewModel {
        description: def.description.clone(),
        ..NewModel::new(&def.name)
    }
}

/// Tree for a model that has none yet.
pub fn new_model_root(model: &Model, children: Vec<ModelDetail>) -> ModelDetail {
    ModelDetail {
        id: Some(model.id),
        name: model.name.clone(),
        name_space: model.name_space.clone(),
        children,
        ..Default::default()
    }
}

/// Replacement tree: the root keeps its identity, only the children change.
pub fn updated_model_root(model: &Model, children: Vec<ModelDetail>) -> ModelDetail {
    match &model.model_detail {
        Some(root) => ModelDetail {
            id: root.id.or(Some(model.id)),
            model_detail_id: root.model_detail_id,
            name: root.name.clone(),
            name_space: root.name_space.clone().or_else(|| model.name_space.clone()),
            children,
            extra: root.extra.clone(),
            ..Default::default()
        },
        None => new_model_root(model, children),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsync_client::mock::MockEclipse;

    fn stored(id: i64, symbol: &str, rank: Option<u32>, target: f64) -> SecuritySetSecurity {
        SecuritySetSecurity {
            id,
            symbol: Some(symbol.into()),
            target_percent: Some(target),
            lower_model_tolerance_percent: Some(1.0),
            upper_model_tolerance_percent: Some(2.0),
            rank,
            ..Default::default()
        }
    }

    #[test]
    fn server_entries_follow_rank() {
        let set = SecuritySet {
            id: 1,
            name: "S".into(),
            securities: vec![
                stored(3, "C", None, 10.0),
                stored(2, "B", Some(1), 10.0),
                stored(1, "A", Some(0), 10.0),
            ],
            ..Default::default()
        };
        let entries = security_entries(&set);
        let tickers: Vec<&str> = entries.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["A", "B", "C"]);
        assert_eq!(entries[2].rank, 2);
        assert_eq!(entries[0].band(), Band::new(9.0, 10.0, 12.0));
    }

    #[test]
    fn missing_percentages_are_zero() {
        let set = SecuritySet {
            securities: vec![SecuritySetSecurity {
                id: 9,
                ..Default::default()
            }],
            ..Default::default()
        };
        let entries = security_entries(&set);
        assert_eq!(entries[0].ticker, "9");
        assert_eq!(entries[0].band(), Band::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn file_entries_become_offsets() {
        let mock = MockEclipse::builder()
            .with_security(101, "AAPL")
            .with_security(201, "VOO")
            .build();
        let mut resolver = Resolver::new(&mock);
        let entries = vec![
            SecurityEntry::new("AAPL", 5.0, 10.0, 20.0)
                .with_equivalents(&["VOO", "NOPE"])
                .with_rank(3),
        ];
        let securities = security_set_securities(&entries, &mut resolver, false).unwrap();
        let sec = &securities[0];
        assert_eq!(sec.id, 101);
        assert_eq!(sec.lower_model_tolerance_percent, Some(5.0));
        assert_eq!(sec.upper_model_tolerance_percent, Some(10.0));
        assert_eq!(sec.rank, Some(3));
        assert_eq!(sec.equivalences.len(), 1);
        assert_eq!(sec.equivalences[0].id, 201);
    }

    #[test]
    fn strict_equivalents_fail() {
        let mock = MockEclipse::builder().with_security(101, "AAPL").build();
        let mut resolver = Resolver::new(&mock);
        let entries = vec![SecurityEntry::new("AAPL", 5.0, 10.0, 20.0).with_equivalents(&["NOPE"])];
        let err = security_set_securities(&entries, &mut resolver, true).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn update_payload_keeps_tolerance_settings() {
        let def = SecuritySetDefinition {
            name: "S".into(),
            description: None,
            entries: Vec::new(),
        };
        let existing = SecuritySet {
            id: 4,
            description: Some("kept".into()),
            tolerance_type: Some("BAND".into()),
            tolerance_type_value: Some(3.0),
            ..Default::default()
        };
        let payload = updated_security_set_payload(&def, Vec::new(), &existing, &SyncOptions::default());
        assert_eq!(payload.tolerance_type, "BAND");
        assert_eq!(payload.tolerance_type_value, 3.0);
        assert_eq!(payload.description.as_deref(), Some("kept"));
    }

    #[test]
    fn model_root_identity_is_preserved() {
        let model = Model {
            id: 7,
            name: "Growth".into(),
            name_space: Some("growth".into()),
            model_detail: Some(ModelDetail {
                id: Some(7),
                model_detail_id: Some(70),
                name: "Growth".into(),
                name_space: Some("growth".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let root = updated_model_root(&model, Vec::new());
        assert_eq!(root.id, Some(7));
        assert_eq!(root.model_detail_id, Some(70));
        assert_eq!(root.name_space.as_deref(), Some("growth"));
    }
}

//! Integration tests for preview, sync and export against the in-memory
//! Eclipse.

use std::fs;
use std::path::{Path, PathBuf};

use modelsync::{ChangeKind, DefinitionKind, parse_model, parse_security_set};
use modelsync_client::mock::{MockEclipse, RecordedWrite};
use modelsync_client::{
    AssetRef, Equivalence, Model, ModelDetail, SecuritySet, SecuritySetSecurity,
};
use modelsync_engine::config::Config;
use modelsync_engine::error::Error;
use modelsync_engine::execution::{self, SyncRunOptions};
use modelsync_engine::{SyncOptions, SyncOutcome, Syncer};
use serde_json::json;

fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn security_set_text() -> &'static str {
    "# Security Set: Test Set
# Description: A test security set
# Ticker  Lower%  Target%  Upper%
AAPL      5       10       20
= VOO
MSFT      3       8        15
"
}

fn mock_with_tickers() -> MockEclipse {
    MockEclipse::builder()
        .with_security(101, "AAPL")
        .with_security(102, "MSFT")
        .with_security(103, "VOO")
        .with_security(104, "BND")
        .build()
}

fn stored_security(id: i64, symbol: &str, rank: u32) -> SecuritySetSecurity {
    SecuritySetSecurity {
        id,
        symbol: Some(symbol.into()),
        target_percent: Some(10.0),
        lower_model_tolerance_percent: Some(5.0),
        upper_model_tolerance_percent: Some(10.0),
        rank: Some(rank),
        ..Default::default()
    }
}

fn equity_set(id: i64, name: &str) -> SecuritySet {
    SecuritySet {
        id,
        name: name.into(),
        ..Default::default()
    }
}

fn model_with_equity_child() -> Model {
    Model {
        id: 7,
        name: "Growth".into(),
        model_detail: Some(ModelDetail {
            id: Some(7),
            model_detail_id: Some(70),
            name: "Growth".into(),
            children: vec![
                ModelDetail {
                    id: Some(42),
                    model_detail_id: Some(420),
                    name: "Equity".into(),
                    security_asset: Some(AssetRef { id: 10 }),
                    target_percent: Some(60.0),
                    lower_model_tolerance_percent: Some(5.0),
                    upper_model_tolerance_percent: Some(5.0),
                    rank: Some(0),
                    ..Default::default()
                },
                ModelDetail {
                    id: Some(43),
                    model_detail_id: Some(430),
                    name: "Bonds".into(),
                    security_asset: Some(AssetRef { id: 11 }),
                    target_percent: Some(40.0),
                    lower_model_tolerance_percent: Some(5.0),
                    upper_model_tolerance_percent: Some(5.0),
                    rank: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn model_mock() -> MockEclipse {
    MockEclipse::builder()
        .with_security_set(equity_set(10, "Equity"))
        .with_security_set(equity_set(11, "Bonds"))
        .with_security_set(equity_set(12, "Cash"))
        .with_model(model_with_equity_child())
        .build()
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.logging.dir = dir.join("logs").display().to_string();
    config
}

fn audit_events(config: &Config) -> Vec<String> {
    fs::read_to_string(config.audit_path())
        .unwrap()
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect()
}

// ============================================================================
// Security sets
// ============================================================================

#[test]
fn create_security_set_resolves_ids_and_tolerances() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let (object, outcome) = syncer.sync_from_file_by_name(&path).unwrap();
    assert_eq!(outcome, SyncOutcome::Created);
    assert_eq!(object.kind, DefinitionKind::SecuritySet);
    assert_eq!(object.entries, 2);

    let writes = mock.writes();
    assert_eq!(writes.len(), 1);
    let RecordedWrite::CreateSecuritySet(payload) = &writes[0] else {
        panic!("expected a create, got {writes:?}");
    };
    assert_eq!(payload.name, "Test Set");
    assert_eq!(payload.description.as_deref(), Some("A test security set"));
    assert_eq!(payload.tolerance_type, "ABSOLUTE");

    let aapl = &payload.securities[0];
    assert_eq!(aapl.id, 101);
    assert_eq!(aapl.target_percent, Some(10.0));
    assert_eq!(aapl.lower_model_tolerance_percent, Some(5.0));
    assert_eq!(aapl.upper_model_tolerance_percent, Some(10.0));
    assert_eq!(aapl.equivalences.len(), 1);
    assert_eq!(aapl.equivalences[0].id, 103);
    assert_eq!(payload.securities[1].id, 102);
    assert_eq!(payload.securities[1].rank, Some(1));
}

#[test]
fn second_sync_updates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let (created, first) = syncer.sync_from_file_by_name(&path).unwrap();
    let (updated, second) = syncer.sync_from_file_by_name(&path).unwrap();
    assert_eq!(first, SyncOutcome::Created);
    assert_eq!(second, SyncOutcome::Updated);
    assert_eq!(created.id, updated.id);
    assert!(matches!(
        mock.writes()[1],
        RecordedWrite::UpdateSecuritySet { id, .. } if id == created.id
    ));
}

#[test]
fn update_reuses_existing_ids_without_searching() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let mut aapl = stored_security(501, "AAPL", 0);
    aapl.equivalences.push(Equivalence {
        id: 503,
        symbol: Some("VOO".into()),
        ..Default::default()
    });
    let existing = SecuritySet {
        id: 9,
        name: "Test Set".into(),
        description: Some("old".into()),
        tolerance_type: Some("PERCENT".into()),
        tolerance_type_value: Some(2.5),
        securities: vec![aapl, stored_security(502, "MSFT", 1)],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(existing).build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let object = syncer.sync_from_file(&path, Some(9)).unwrap();
    assert_eq!(object.id, 9);
    assert!(!mock.calls().contains(&"search_securities".to_string()));

    let writes = mock.writes();
    let RecordedWrite::UpdateSecuritySet { id, payload } = &writes[0] else {
        panic!("expected an update, got {writes:?}");
    };
    assert_eq!(*id, 9);
    assert_eq!(payload.securities[0].id, 501);
    assert_eq!(payload.securities[0].equivalences[0].id, 503);
    assert_eq!(payload.securities[1].id, 502);
    // Set-level tolerance stays as stored
    assert_eq!(payload.tolerance_type, "PERCENT");
    assert_eq!(payload.tolerance_type_value, 2.5);
    assert_eq!(payload.description.as_deref(), Some("A test security set"));
}

#[test]
fn unknown_ticker_fails_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "set.txt",
        "# Security Set: S\nAAPL 5 10 20\nZZZZ 1 2 3\n",
    );
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let err = syncer.sync_from_file(&path, None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(mock.writes().is_empty());
}

#[test]
fn unresolvable_equivalent_is_dropped_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", "# Security Set: S\nAAPL 5 10 20\n= NOPE\n");
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    syncer.sync_from_file(&path, None).unwrap();
    let writes = mock.writes();
    let RecordedWrite::CreateSecuritySet(payload) = &writes[0] else {
        panic!("expected a create");
    };
    assert!(payload.securities[0].equivalences.is_empty());
}

#[test]
fn strict_equivalents_fail_the_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", "# Security Set: S\nAAPL 5 10 20\n= NOPE\n");
    let mock = mock_with_tickers();
    let options = SyncOptions {
        strict_equivalents: true,
        ..SyncOptions::default()
    };
    let syncer = Syncer::new(&mock, options);

    let err = syncer.sync_from_file(&path, None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(mock.writes().is_empty());
}

#[test]
fn duplicate_tickers_are_rejected_offline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "set.txt",
        "# Security Set: S\nAAPL 5 10 20\naapl 1 2 3\n",
    );
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    assert!(matches!(syncer.preview_changes(&path), Err(Error::Validation(_))));
    assert!(matches!(syncer.sync_from_file(&path, None), Err(Error::Validation(_))));
    assert!(mock.calls().is_empty());
}

#[test]
fn failing_write_surfaces_api_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let mock = MockEclipse::builder()
        .with_security(101, "AAPL")
        .with_security(102, "MSFT")
        .with_security(103, "VOO")
        .fail_writes("database unavailable")
        .build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let err = syncer.sync_from_file(&path, None).unwrap_err();
    assert!(matches!(err, Error::Api(_)));
    assert!(err.to_string().contains("database unavailable"));
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn preview_never_writes_and_settles_after_sync() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let before = syncer.preview_changes(&path).unwrap();
    assert_eq!(before.existing_id, None);
    assert_eq!(before.counts().added, 2);
    assert!(mock.writes().is_empty());

    syncer.sync_from_file_by_name(&path).unwrap();

    let after = syncer.preview_changes(&path).unwrap();
    assert!(after.existing_id.is_some());
    assert!(after.is_empty(), "unexpected changes: {:?}", after.changes);
    assert_eq!(mock.writes().len(), 1);
}

#[test]
fn preview_reports_modify_add_remove() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "set.txt",
        "# Security Set: Test Set\nAAPL 5 11 20\nBND 1 2 3\n",
    );
    let existing = SecuritySet {
        id: 9,
        name: "test set".into(),
        securities: vec![stored_security(101, "AAPL", 0), stored_security(102, "MSFT", 1)],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(existing).build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let preview = syncer.preview_changes(&path).unwrap();
    assert_eq!(preview.existing_id, Some(9));
    let kinds: Vec<ChangeKind> = preview.changes.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Modify, ChangeKind::Modify, ChangeKind::Add, ChangeKind::Remove]
    );
    // Lookup is case-insensitive, but the update writes the file's spelling
    assert_eq!(preview.changes[0].subject, "(name)");
    assert_eq!(preview.changes[0].details, vec!["'test set' -> 'Test Set'"]);
    assert_eq!(preview.changes[1].details, vec!["target 10 -> 11"]);
    assert_eq!(preview.changes[3].subject, "MSFT");

    let shown = preview.to_string();
    assert!(shown.starts_with("security set 'Test Set' (id 9): 1 added, 2 modified, 1 removed"));
}

#[test]
fn description_only_change_is_synced() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "set.txt",
        "# Security Set: Core\n# Description: new text\nAAPL 5 10 20\n",
    );
    let config = config_in(dir.path());
    let existing = SecuritySet {
        id: 9,
        name: "Core".into(),
        description: Some("old text".into()),
        securities: vec![stored_security(101, "AAPL", 0)],
        ..Default::default()
    };
    let mock = MockEclipse::builder()
        .with_security(101, "AAPL")
        .with_security_set(existing)
        .build();

    let syncer = Syncer::new(&mock, SyncOptions::default());
    let preview = syncer.preview_changes(&path).unwrap();
    assert_eq!(preview.changes.len(), 1);
    assert_eq!(preview.changes[0].subject, "(description)");
    assert_eq!(preview.changes[0].details, vec!["'old text' -> 'new text'"]);

    let opts = SyncRunOptions {
        file: path.clone(),
        existing_id: None,
        dry_run: false,
        force: true,
    };
    let (object, outcome) = execution::run_sync(&config, &mock, &opts).unwrap().unwrap();
    assert_eq!(outcome, SyncOutcome::Updated);
    assert_eq!(object.id, 9);
    assert_eq!(mock.writes().len(), 1);
    assert_eq!(mock.security_set(9).unwrap().description.as_deref(), Some("new text"));

    // Now in step
    assert!(syncer.preview_changes(&path).unwrap().is_empty());
}

#[test]
fn missing_description_keeps_the_stored_one_without_a_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", "# Security Set: Core\nAAPL 5 10 20\n");
    let existing = SecuritySet {
        id: 9,
        name: "Core".into(),
        description: Some("kept".into()),
        securities: vec![stored_security(101, "AAPL", 0)],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(existing).build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    assert!(syncer.preview_changes(&path).unwrap().is_empty());
}

#[test]
fn empty_path_is_a_validation_error() {
    let mock = mock_with_tickers();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let err = syncer.preview_changes(Path::new("")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(matches!(
        syncer.sync_from_file_by_name(Path::new("")),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        execution::run_parse(Path::new("")),
        Err(Error::Validation(_))
    ));
    assert!(mock.calls().is_empty());
}

// ============================================================================
// Models
// ============================================================================

#[test]
fn model_update_keeps_child_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "model.txt",
        "# Model: Growth\nEquity 50 65 70\nCash 0 35 40\n",
    );
    let mock = model_mock();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let (object, outcome) = syncer.sync_from_file_by_name(&path).unwrap();
    assert_eq!(outcome, SyncOutcome::Updated);
    assert_eq!(object.id, 7);

    let writes = mock.writes();
    let RecordedWrite::UpdateModelDetail { model_id, detail } = &writes[0] else {
        panic!("expected a model detail update, got {writes:?}");
    };
    assert_eq!(*model_id, 7);
    assert_eq!(detail.id, Some(7));
    assert_eq!(detail.model_detail_id, Some(70));

    let equity = &detail.children[0];
    assert_eq!(equity.name, "Equity");
    assert_eq!(equity.id, Some(42));
    assert_eq!(equity.model_detail_id, Some(420));
    assert_eq!(equity.target_percent, Some(65.0));
    assert_eq!(equity.lower_model_tolerance_percent, Some(15.0));
    assert_eq!(equity.upper_model_tolerance_percent, Some(5.0));
    assert_eq!(equity.security_asset, Some(AssetRef { id: 10 }));

    let cash = &detail.children[1];
    assert_eq!(cash.id, None);
    assert_eq!(cash.security_asset, Some(AssetRef { id: 12 }));
    assert_eq!(detail.children.len(), 2);
}

#[test]
fn model_update_passes_unmodelled_fields_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "model.txt",
        "# Model: Growth\nEquity 50 65 70\nCash 0 35 40\n",
    );
    let mut model = model_with_equity_child();
    let root = model.model_detail.as_mut().unwrap();
    root.extra.insert("toleranceType".into(), json!("range"));
    root.children[0]
        .extra
        .insert("toleranceTypeValue".into(), json!(2.5));
    let mock = MockEclipse::builder()
        .with_security_set(equity_set(10, "Equity"))
        .with_security_set(equity_set(12, "Cash"))
        .with_model(model)
        .build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    syncer.sync_from_file_by_name(&path).unwrap();
    let writes = mock.writes();
    let RecordedWrite::UpdateModelDetail { detail, .. } = &writes[0] else {
        panic!("expected a model detail update, got {writes:?}");
    };
    assert_eq!(detail.extra.get("toleranceType"), Some(&json!("range")));

    let equity = &detail.children[0];
    assert_eq!(equity.id, Some(42));
    assert_eq!(equity.extra.get("toleranceTypeValue"), Some(&json!(2.5)));
    // New children have nothing to carry
    assert!(detail.children[1].extra.is_empty());
}

#[test]
fn new_model_is_created_then_filled() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "model.txt",
        "# Model: Income Plus\n# Description: bonds heavy\nBonds 60 70 80\nCash 20 30 40\n",
    );
    let mock = model_mock();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let (object, outcome) = syncer.sync_from_file_by_name(&path).unwrap();
    assert_eq!(outcome, SyncOutcome::Created);
    assert_eq!(object.name, "Income Plus");

    let writes = mock.writes();
    assert_eq!(writes.len(), 2);
    let RecordedWrite::CreateModel(new_model) = &writes[0] else {
        panic!("expected a model create first");
    };
    assert_eq!(new_model.name, "Income Plus");
    assert_eq!(new_model.description.as_deref(), Some("bonds heavy"));
    let RecordedWrite::AddModelDetail { model_id, detail } = &writes[1] else {
        panic!("expected the tree to be added second");
    };
    assert_eq!(*model_id, object.id);
    assert_eq!(detail.children.len(), 2);

    // The stored model now diffs clean
    assert!(syncer.preview_changes(&path).unwrap().is_empty());
}

#[test]
fn unknown_component_aborts_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "model.txt",
        "# Model: Growth\nEquity 50 60 70\nCommodities 0 40 50\n",
    );
    let mock = model_mock();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let err = syncer.sync_from_file_by_name(&path).unwrap_err();
    assert!(matches!(err, Error::NotFound(msg) if msg.contains("Commodities")));
    assert!(mock.writes().is_empty());
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn exported_security_set_parses_back_to_server_bands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.txt");
    let mut msft = stored_security(502, "MSFT", 0);
    msft.target_percent = Some(8.0);
    msft.lower_model_tolerance_percent = Some(5.0);
    msft.upper_model_tolerance_percent = Some(7.0);
    let set = SecuritySet {
        id: 9,
        name: "Core".into(),
        securities: vec![stored_security(501, "AAPL", 1), msft],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(set).build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    syncer.export_to_file(DefinitionKind::SecuritySet, 9, &path).unwrap();
    let def = parse_security_set(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(def.name, "Core");
    // Rank order, not storage order
    assert_eq!(def.entries[0].ticker, "MSFT");
    assert_eq!(
        (def.entries[0].lower_bound, def.entries[0].target, def.entries[0].upper_bound),
        (3.0, 8.0, 15.0)
    );
    assert_eq!(def.entries[1].ticker, "AAPL");
    assert_eq!(def.entries[1].lower_bound, 5.0);
    assert_eq!(def.entries[1].upper_bound, 20.0);
}

#[test]
fn exported_model_parses_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("growth.txt");
    let mock = model_mock();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    syncer.export_to_file(DefinitionKind::Model, 7, &path).unwrap();
    let def = parse_model(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(def.name, "Growth");
    assert_eq!(def.entries.len(), 2);
    assert_eq!(def.entries[0].name, "Equity");
    assert_eq!(def.entries[0].lower_bound, 55.0);
    assert_eq!(def.entries[0].upper_bound, 65.0);
}

#[test]
fn security_without_symbol_exports_its_id_and_resyncs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("core.txt");
    let mut unnamed = stored_security(555, "X", 0);
    unnamed.symbol = None;
    let set = SecuritySet {
        id: 9,
        name: "Core".into(),
        securities: vec![unnamed],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(set).build();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let def = syncer.export_security_set(9, &path).unwrap();
    assert_eq!(def.entries[0].ticker, "555");

    // The same set resolves its own id without a search
    syncer.sync_from_file(&path, Some(9)).unwrap();
    assert!(!mock.calls().contains(&"search_securities".to_string()));
    let writes = mock.writes();
    let RecordedWrite::UpdateSecuritySet { payload, .. } = &writes[0] else {
        panic!("expected an update");
    };
    assert_eq!(payload.securities[0].id, 555);
}

#[test]
fn export_to_bad_path_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("set.txt");
    let mock = model_mock();
    let syncer = Syncer::new(&mock, SyncOptions::default());

    let err = syncer.export_to_file(DefinitionKind::SecuritySet, 10, &path).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(mock.calls().is_empty());
}

// ============================================================================
// CLI workflow
// ============================================================================

#[test]
fn forced_run_writes_and_audits() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let config = config_in(dir.path());
    let mock = mock_with_tickers();
    let opts = SyncRunOptions {
        file: path,
        existing_id: None,
        dry_run: false,
        force: true,
    };

    let (object, outcome) = execution::run_sync(&config, &mock, &opts).unwrap().unwrap();
    assert_eq!(outcome, SyncOutcome::Created);
    assert_eq!(object.name, "Test Set");
    assert_eq!(
        audit_events(&config),
        vec!["sync_started", "preview_computed", "created"]
    );
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let config = config_in(dir.path());
    let mock = mock_with_tickers();
    let opts = SyncRunOptions {
        file: path,
        existing_id: None,
        dry_run: true,
        force: false,
    };

    assert!(execution::run_sync(&config, &mock, &opts).unwrap().is_none());
    assert!(mock.writes().is_empty());
    assert_eq!(audit_events(&config), vec!["sync_started", "preview_computed"]);
}

#[test]
fn unchanged_file_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", security_set_text());
    let config = config_in(dir.path());
    let mock = mock_with_tickers();
    let opts = SyncRunOptions {
        file: path,
        existing_id: None,
        dry_run: false,
        force: true,
    };

    execution::run_sync(&config, &mock, &opts).unwrap();
    assert!(execution::run_sync(&config, &mock, &opts).unwrap().is_none());
    assert_eq!(mock.writes().len(), 1);
    assert_eq!(audit_events(&config).last().map(String::as_str), Some("no_changes"));
}

#[test]
fn explicit_id_overrides_name_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "set.txt", "# Security Set: Renamed\nAAPL 5 11 20\n");
    let config = config_in(dir.path());
    let existing = SecuritySet {
        id: 9,
        name: "Old Name".into(),
        securities: vec![stored_security(101, "AAPL", 0)],
        ..Default::default()
    };
    let mock = MockEclipse::builder().with_security_set(existing).build();
    let opts = SyncRunOptions {
        file: path,
        existing_id: Some(9),
        dry_run: false,
        force: true,
    };

    let (object, outcome) = execution::run_sync(&config, &mock, &opts).unwrap().unwrap();
    assert_eq!(outcome, SyncOutcome::Updated);
    assert_eq!(object.id, 9);
    assert_eq!(mock.security_set(9).unwrap().name, "Renamed");
    assert!(!mock.calls().contains(&"list_security_sets".to_string()));
}

#[test]
fn export_command_audits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mock = model_mock();
    let path = dir.path().join("growth.txt");

    execution::run_export(&config, &mock, DefinitionKind::Model, 7, &path).unwrap();
    assert!(path.exists());
    assert_eq!(audit_events(&config), vec!["exported"]);
}

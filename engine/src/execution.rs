//! CLI workflows: preview → confirm → sync → audit, plus the read-only
//! commands.

use std::path::{Path, PathBuf};

use modelsync::{Definition, DefinitionKind, render};
use modelsync_client::{EclipseClient, EclipseGateway, OrionClient};
use serde_json::{Map, Value};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::{self, SyncOptions, SyncOutcome, SyncedObject, Syncer};

/// Options for a sync run.
pub struct SyncRunOptions {
    pub file: PathBuf,
    /// Update this object instead of looking one up by name.
    pub existing_id: Option<i64>,
    pub dry_run: bool,
    pub force: bool,
}

/// Parse a file offline and print its canonical form.
pub fn run_parse(file: &Path) -> Result<()> {
    let def = sync::read_definition_file(file)?;
    let entries = match &def {
        Definition::SecuritySet(d) => d.entries.len(),
        Definition::Model(d) => d.entries.len(),
    };
    println!("{} '{}': {entries} entries\n", def.kind(), def.name());
    print!("{}", render(&def));
    Ok(())
}

pub fn run_preview(config: &Config, gateway: &dyn EclipseGateway, file: &Path) -> Result<()> {
    let syncer = Syncer::new(gateway, SyncOptions::from(&config.sync));
    let preview = syncer.preview_changes(file)?;
    print!("{preview}");
    Ok(())
}

/// Full sync of one file. Returns `None` when nothing was written.
pub fn run_sync(
    config: &Config,
    gateway: &dyn EclipseGateway,
    opts: &SyncRunOptions,
) -> Result<Option<(SyncedObject, SyncOutcome)>> {
    let syncer = Syncer::new(gateway, SyncOptions::from(&config.sync));

    // 1. Parse before touching the network or the audit log
    let def = syncer.parse_definition_file(&opts.file)?;
    let file = opts.file.display().to_string();

    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_sync_started(&mut audit, &file, def.kind(), def.name())?;

    // 2. Find what the file replaces
    let existing_id = match opts.existing_id {
        Some(id) => Some(id),
        None => syncer.existing_id(&def)?,
    };

    // 3. Show the plan
    let preview = syncer.preview_against(&def, existing_id)?;
    audit::log_preview(&mut audit, existing_id, &preview.changes)?;
    print!("{preview}");

    if preview.is_empty() && existing_id.is_some() {
        println!("\nNothing to sync: server matches {file}.");
        audit.log_simple("no_changes")?;
        return Ok(None);
    }

    // 4. Dry run stops here
    if opts.dry_run {
        println!("\n[DRY RUN] Nothing written.");
        return Ok(None);
    }

    // 5. Confirm
    if !opts.force {
        let verb = if existing_id.is_some() { "Update" } else { "Create" };
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("{verb} {} '{}'?", def.kind(), def.name()))
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;

        audit::log_confirmation(&mut audit, confirmed)?;
        if !confirmed {
            return Err(Error::Aborted("sync declined, nothing written".into()));
        }
    }

    // 6. Write
    let (object, outcome) = syncer.sync_definition(&def, existing_id)?;
    audit::log_synced(&mut audit, outcome, &object)?;
    println!(
        "\n{} {object}. Audit logged to {}",
        capitalize(&outcome.to_string()),
        config.audit_path().display()
    );
    Ok(Some((object, outcome)))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn run_export(
    config: &Config,
    gateway: &dyn EclipseGateway,
    kind: DefinitionKind,
    id: i64,
    path: &Path,
) -> Result<()> {
    let syncer = Syncer::new(gateway, SyncOptions::from(&config.sync));
    let def = syncer.export_to_file(kind, id, path)?;

    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::log_exported(&mut audit, kind, id, &path.display().to_string())?;
    println!("Exported {} '{}' to {}", kind, def.name(), path.display());
    Ok(())
}

pub fn run_find_account(client: &EclipseClient, number: &str, name: &str) -> Result<()> {
    let account = client.find_account(number, name)?;
    println!(
        "{}  {}  {}  {}",
        account.id,
        account.account_number,
        account.name,
        account.account_type.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Parse `code=value` pairs; values that look like JSON are passed as JSON.
pub fn parse_query_params(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    for pair in pairs {
        let (code, raw) = pair.split_once('=').ok_or_else(|| {
            Error::Validation(format!("query parameter '{pair}' is not code=value"))
        })?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        params.insert(code.trim().to_string(), value);
    }
    Ok(params)
}

pub fn run_query(client: &OrionClient, id: i64, params: &Map<String, Value>) -> Result<()> {
    let result = client.query(id, params)?;
    let text = serde_json::to_string_pretty(&result)
        .map_err(|e| Error::Validation(format!("cannot render query result: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Check Eclipse credentials and connectivity.
pub fn check_status(client: &EclipseClient) -> Result<()> {
    let user = client.check_username()?;
    println!("Eclipse session OK, logged in as {user}");
    let sets = client.list_security_sets()?;
    let models = client.list_models()?;
    println!("{} security sets, {} models", sets.len(), models.len());
    Ok(())
}

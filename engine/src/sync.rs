//! Sync orchestrator: parse → resolve → diff or write.
//!
//! A [`Syncer`] turns a definition file into exactly one write against the
//! Eclipse API. Every identity the write needs (tickers, equivalents,
//! component security sets) is resolved first, so a bad file fails before
//! anything on the server changes.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use modelsync::{
    ChangeCounts, ChangeKind, ChangeRecord, Definition, DefinitionKind, Entry, ModelComponent,
    ModelDefinition, ParsedDefinition, SecurityEntry, SecuritySetDefinition, diff, parse_any,
};
use modelsync_client::{EclipseGateway, SecuritySet};
use serde::Serialize;

use crate::config::SyncConfig;
use crate::convert;
use crate::error::{Error, Result};
use crate::export;
use crate::resolver::Resolver;

/// Knobs for conversion and creation.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncOptions {
    /// Fail on an equivalent that cannot be resolved instead of dropping it.
    pub strict_equivalents: bool,
    /// Tolerance type for new security sets.
    pub tolerance_type: String,
    pub tolerance_type_value: f64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            strict_equivalents: false,
            tolerance_type: "ABSOLUTE".into(),
            tolerance_type_value: 0.0,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            strict_equivalents: config.strict_equivalents,
            tolerance_type: config.tolerance_type.clone(),
            tolerance_type_value: config.tolerance_type_value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    Created,
    Updated,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created => write!(f, "created"),
            SyncOutcome::Updated => write!(f, "updated"),
        }
    }
}

/// The server object a sync wrote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncedObject {
    pub kind: DefinitionKind,
    pub id: i64,
    pub name: String,
    /// Number of securities or components sent.
    pub entries: usize,
}

impl fmt::Display for SyncedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' (id {}, {} entries)",
            self.kind, self.name, self.id, self.entries
        )
    }
}

/// What a sync of a file would change.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewResult {
    pub kind: DefinitionKind,
    pub name: String,
    /// Id of the object the file would update; `None` means it would be created.
    pub existing_id: Option<i64>,
    pub changes: Vec<ChangeRecord>,
}

impl PreviewResult {
    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts::of(&self.changes)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl fmt::Display for PreviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.existing_id {
            Some(id) => format!("id {id}"),
            None => "new".to_string(),
        };
        writeln!(
            f,
            "{} '{}' ({target}): {}",
            self.kind,
            self.name,
            self.counts()
        )?;
        if self.changes.is_empty() {
            writeln!(f, "  no changes")?;
        }
        for change in &self.changes {
            writeln!(f, "  {change}")?;
        }
        Ok(())
    }
}

fn check_duplicates<E: Entry>(kind: DefinitionKind, def: &ParsedDefinition<E>) -> Result<()> {
    let dups = def.duplicate_keys();
    if dups.is_empty() {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "{kind} '{}' lists {} more than once",
        def.name,
        dups.join(", ")
    )))
}

/// Set-level fields an update would change. The description only counts
/// when the file has one, since an update keeps the stored one otherwise.
fn security_set_header_changes(def: &SecuritySetDefinition, set: &SecuritySet) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    if def.name.trim() != set.name.trim() {
        changes.push(ChangeRecord {
            kind: ChangeKind::Modify,
            subject: "(name)".into(),
            details: vec![format!("'{}' -> '{}'", set.name, def.name)],
        });
    }
    if let Some(desc) = &def.description {
        let stored = set.description.as_deref().unwrap_or("");
        if desc.trim() != stored.trim() {
            changes.push(ChangeRecord {
                kind: ChangeKind::Modify,
                subject: "(description)".into(),
                details: vec![format!("'{stored}' -> '{desc}'")],
            });
        }
    }
    changes
}

/// Read and parse a file of either kind, rejecting duplicate entries.
pub fn read_definition_file(path: &Path) -> Result<Definition> {
    if path.as_os_str().is_empty() {
        return Err(Error::Validation("definition file path must not be empty".into()));
    }
    let text = std::fs::read_to_string(path).map_err(|e| Error::DefinitionRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let def = parse_any(&text)?;
    debug!(
        "Parsed {} '{}' from {}",
        def.kind(),
        def.name(),
        path.display()
    );
    match &def {
        Definition::SecuritySet(d) => check_duplicates(DefinitionKind::SecuritySet, d)?,
        Definition::Model(d) => check_duplicates(DefinitionKind::Model, d)?,
    }
    Ok(def)
}

/// Syncs definition files against one Eclipse session.
pub struct Syncer<'a> {
    gateway: &'a dyn EclipseGateway,
    options: SyncOptions,
}

impl<'a> Syncer<'a> {
    pub fn new(gateway: &'a dyn EclipseGateway, options: SyncOptions) -> Self {
        Self { gateway, options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn parse_definition_file(&self, path: &Path) -> Result<Definition> {
        read_definition_file(path)
    }

    pub fn parse_security_set_file(&self, path: &Path) -> Result<SecuritySetDefinition> {
        match self.parse_definition_file(path)? {
            Definition::SecuritySet(def) => Ok(def),
            Definition::Model(def) => Err(Error::Validation(format!(
                "{} is a model definition ('{}'), expected a security set",
                path.display(),
                def.name
            ))),
        }
    }

    pub fn parse_model_file(&self, path: &Path) -> Result<ModelDefinition> {
        match self.parse_definition_file(path)? {
            Definition::Model(def) => Ok(def),
            Definition::SecuritySet(def) => Err(Error::Validation(format!(
                "{} is a security set definition ('{}'), expected a model",
                path.display(),
                def.name
            ))),
        }
    }

    // === Preview ===

    /// Diff a file against the server object of the same name. Never writes.
    pub fn preview_changes(&self, path: &Path) -> Result<PreviewResult> {
        let def = self.parse_definition_file(path)?;
        self.preview_definition(&def)
    }

    /// Diff against the object named like `def`.
    pub fn preview_definition(&self, def: &Definition) -> Result<PreviewResult> {
        let existing_id = self.existing_id(def)?;
        self.preview_against(def, existing_id)
    }

    /// Diff against a specific object, or against nothing when `existing_id`
    /// is `None`. Security-set name and description changes lead the list;
    /// a model update never renames, so models compare entries only.
    pub fn preview_against(&self, def: &Definition, existing_id: Option<i64>) -> Result<PreviewResult> {
        match def {
            Definition::SecuritySet(d) => {
                check_duplicates(DefinitionKind::SecuritySet, d)?;
                let mut changes = Vec::new();
                let old: Vec<SecurityEntry> = match existing_id {
                    Some(id) => {
                        let set = self.gateway.get_security_set(id)?;
                        changes.extend(security_set_header_changes(d, &set));
                        convert::security_entries(&set)
                    }
                    None => Vec::new(),
                };
                changes.extend(diff(&d.entries, &old));
                Ok(PreviewResult {
                    kind: DefinitionKind::SecuritySet,
                    name: d.name.clone(),
                    existing_id,
                    changes,
                })
            }
            Definition::Model(d) => {
                check_duplicates(DefinitionKind::Model, d)?;
                let old: Vec<ModelComponent> = match existing_id {
                    Some(id) => convert::model_components(&self.gateway.get_model(id)?),
                    None => Vec::new(),
                };
                Ok(PreviewResult {
                    kind: DefinitionKind::Model,
                    name: d.name.clone(),
                    existing_id,
                    changes: diff(&d.entries, &old),
                })
            }
        }
    }

    // === Sync ===

    /// Create the object, or update `existing_id` when given.
    pub fn sync_from_file(&self, path: &Path, existing_id: Option<i64>) -> Result<SyncedObject> {
        let def = self.parse_definition_file(path)?;
        let (object, _) = self.sync_definition(&def, existing_id)?;
        Ok(object)
    }

    /// Update the object whose name matches the file's, or create it.
    pub fn sync_from_file_by_name(&self, path: &Path) -> Result<(SyncedObject, SyncOutcome)> {
        let def = self.parse_definition_file(path)?;
        let existing_id = self.existing_id(&def)?;
        self.sync_definition(&def, existing_id)
    }

    /// Id of the server object named like `def`, if any.
    pub fn existing_id(&self, def: &Definition) -> Result<Option<i64>> {
        let mut resolver = Resolver::new(self.gateway);
        let id = match def {
            Definition::SecuritySet(d) => resolver.find_security_set_by_name(&d.name)?.map(|s| s.id),
            Definition::Model(d) => resolver.find_model_by_name(&d.name)?.map(|m| m.id),
        };
        Ok(id)
    }

    pub fn sync_definition(
        &self,
        def: &Definition,
        existing_id: Option<i64>,
    ) -> Result<(SyncedObject, SyncOutcome)> {
        match def {
            Definition::SecuritySet(d) => self.sync_security_set(d, existing_id),
            Definition::Model(d) => self.sync_model(d, existing_id),
        }
    }

    pub fn sync_security_set(
        &self,
        def: &SecuritySetDefinition,
        existing_id: Option<i64>,
    ) -> Result<(SyncedObject, SyncOutcome)> {
        check_duplicates(DefinitionKind::SecuritySet, def)?;
        let mut resolver = Resolver::new(self.gateway);

        let existing = match existing_id {
            Some(id) => Some(self.gateway.get_security_set(id)?),
            None => None,
        };
        if let Some(set) = &existing {
            resolver.seed_from_security_set(set);
        }

        let securities = convert::security_set_securities(
            &def.entries,
            &mut resolver,
            self.options.strict_equivalents,
        )?;
        let entries = securities.len();

        match existing {
            Some(set) => {
                let payload =
                    convert::updated_security_set_payload(def, securities, &set, &self.options);
                info!(
                    "Updating security set '{}' (id {}) with {entries} securities",
                    payload.name, set.id
                );
                self.gateway.update_security_set(set.id, &payload)?;
                Ok((
                    SyncedObject {
                        kind: DefinitionKind::SecuritySet,
                        id: set.id,
                        name: payload.name,
                        entries,
                    },
                    SyncOutcome::Updated,
                ))
            }
            None => {
                let payload = convert::new_security_set_payload(def, securities, &self.options);
                info!(
                    "Creating security set '{}' with {entries} securities",
                    payload.name
                );
                let created = self.gateway.create_security_set(&payload)?;
                Ok((
                    SyncedObject {
                        kind: DefinitionKind::SecuritySet,
                        id: created.id,
                        name: payload.name,
                        entries,
                    },
                    SyncOutcome::Created,
                ))
            }
        }
    }

    pub fn sync_model(
        &self,
        def: &ModelDefinition,
        existing_id: Option<i64>,
    ) -> Result<(SyncedObject, SyncOutcome)> {
        check_duplicates(DefinitionKind::Model, def)?;
        let mut resolver = Resolver::new(self.gateway);

        let existing = match existing_id {
            Some(id) => Some(self.gateway.get_model(id)?),
            None => None,
        };

        let children = convert::model_children(
            &def.entries,
            &mut resolver,
            existing.as_ref().and_then(|m| m.model_detail.as_ref()),
        )?;
        let entries = children.len();

        match existing {
            Some(model) => {
                let root = convert::updated_model_root(&model, children);
                if model.model_detail.is_some() {
                    info!(
                        "Updating model '{}' (id {}) with {entries} components",
                        model.name, model.id
                    );
                    self.gateway.update_model_detail(model.id, &root)?;
                } else {
                    info!(
                        "Adding {entries} components to model '{}' (id {})",
                        model.name, model.id
                    );
                    self.gateway.add_model_detail(model.id, &root)?;
                }
                Ok((
                    SyncedObject {
                        kind: DefinitionKind::Model,
                        id: model.id,
                        name: model.name,
                        entries,
                    },
                    SyncOutcome::Updated,
                ))
            }
            None => {
                info!("Creating model '{}' with {entries} components", def.name);
                let created = self.gateway.create_model(&convert::new_model(def))?;
                let root = convert::new_model_root(&created, children);
                self.gateway.add_model_detail(created.id, &root)?;
                Ok((
                    SyncedObject {
                        kind: DefinitionKind::Model,
                        id: created.id,
                        name: created.name,
                        entries,
                    },
                    SyncOutcome::Created,
                ))
            }
        }
    }

    // === Export ===

    /// Write the server object `id` as a definition file.
    pub fn export_to_file(&self, kind: DefinitionKind, id: i64, path: &Path) -> Result<Definition> {
        match kind {
            DefinitionKind::SecuritySet => self.export_security_set(id, path).map(Definition::SecuritySet),
            DefinitionKind::Model => self.export_model(id, path).map(Definition::Model),
        }
    }

    pub fn export_security_set(&self, id: i64, path: &Path) -> Result<SecuritySetDefinition> {
        export::validate_path(path)?;
        let set = self.gateway.get_security_set(id)?;
        let def = convert::security_set_definition(&set);
        export::write_definition(path, &modelsync::render_security_set(&def))?;
        info!(
            "Exported security set '{}' ({} securities) to {}",
            def.name,
            def.entries.len(),
            path.display()
        );
        Ok(def)
    }

    pub fn export_model(&self, id: i64, path: &Path) -> Result<ModelDefinition> {
        export::validate_path(path)?;
        let model = self.gateway.get_model(id)?;
        let def = convert::model_definition(&model);
        export::write_definition(path, &modelsync::render_model(&def))?;
        info!(
            "Exported model '{}' ({} components) to {}",
            def.name,
            def.entries.len(),
            path.display()
        );
        Ok(def)
    }
}

//! JSONL audit trail logging.
//!
//! Each CLI run appends events to an audit.jsonl file, one JSON object per
//! line: what file was synced, the change list that was shown, whether the
//! user approved it and what the server ended up with.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use modelsync::{ChangeCounts, ChangeRecord, DefinitionKind};
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::sync::{SyncOutcome, SyncedObject};

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, json!({}))
    }
}

pub fn log_sync_started(
    audit: &mut AuditLog,
    file: &str,
    kind: DefinitionKind,
    name: &str,
) -> Result<()> {
    audit.log(
        "sync_started",
        json!({
            "file": file,
            "kind": kind,
            "name": name,
        }),
    )
}

/// The change list the user was shown.
pub fn log_preview(audit: &mut AuditLog, existing_id: Option<i64>, changes: &[ChangeRecord]) -> Result<()> {
    audit.log(
        "preview_computed",
        json!({
            "existing_id": existing_id,
            "counts": ChangeCounts::of(changes),
            "changes": changes,
        }),
    )
}

pub fn log_confirmation(audit: &mut AuditLog, approved: bool) -> Result<()> {
    audit.log("user_confirmed", json!({ "approved": approved }))
}

pub fn log_synced(audit: &mut AuditLog, outcome: SyncOutcome, object: &SyncedObject) -> Result<()> {
    let event = match outcome {
        SyncOutcome::Created => "created",
        SyncOutcome::Updated => "updated",
    };
    audit.log(
        event,
        json!({
            "kind": object.kind,
            "id": object.id,
            "name": object.name,
            "entries": object.entries,
        }),
    )
}

pub fn log_exported(audit: &mut AuditLog, kind: DefinitionKind, id: i64, path: &str) -> Result<()> {
    audit.log(
        "exported",
        json!({
            "kind": kind,
            "id": id,
            "path": path,
        }),
    )
}

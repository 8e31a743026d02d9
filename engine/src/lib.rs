//! modelsync-engine: keeps Eclipse security sets and models in step with
//! plain-text definition files.
//!
//! Parses a definition file, resolves every ticker and component against the
//! server, shows the diff, and after confirmation writes exactly one create
//! or update. Every run leaves a JSONL audit trail.

pub mod audit;
pub mod config;
pub mod connect;
pub mod convert;
pub mod error;
pub mod execution;
pub mod export;
pub mod resolver;
pub mod sync;

pub use error::{Error, Result};
pub use sync::{PreviewResult, SyncOptions, SyncOutcome, SyncedObject, Syncer};

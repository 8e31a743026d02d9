//! Blocking clients for the Orion advisor API and the Eclipse trading API.
//!
//! - [`EclipseClient`]: security sets, models, securities and accounts
//! - [`OrionClient`]: user lookup and custom reporting queries
//! - [`MockEclipse`](mock::MockEclipse): in-memory [`EclipseGateway`] for tests
//!
//! Every request goes through the same transport: client-side throttle,
//! `Authorization: Session <token>`, timeout, optional TLS relaxation and
//! sanitized debug logging. Non-2xx responses become [`ApiError`] variants.

pub mod eclipse;
pub mod error;
mod http;
pub mod mock;
pub mod orion;
pub mod sanitize;
pub mod search;
pub mod throttle;
pub mod types;

pub use eclipse::{Credentials, ECLIPSE_BASE_URL, EclipseClient};
pub use error::{ApiError, Result};
pub use http::HttpSettings;
pub use orion::{ORION_BASE_URL, OrionClient};
pub use types::*;

use serde_json::Value;

/// The slice of the Eclipse API that synchronization needs.
///
/// Create calls return the stored object so the caller learns the new id.
/// Update calls return the server's raw acknowledgement.
pub trait EclipseGateway {
    /// Securities whose symbol or name matches `ticker` (server-side search).
    fn search_securities(&self, ticker: &str) -> Result<Vec<Security>>;

    fn list_security_sets(&self) -> Result<Vec<SecuritySetSummary>>;

    fn get_security_set(&self, id: i64) -> Result<SecuritySet>;

    fn create_security_set(&self, payload: &SecuritySetPayload) -> Result<SecuritySet>;

    /// Replace the securities of an existing set. Entries left out are deleted.
    fn update_security_set(&self, id: i64, payload: &SecuritySetPayload) -> Result<Value>;

    fn list_models(&self) -> Result<Vec<ModelSummary>>;

    fn get_model(&self, id: i64) -> Result<Model>;

    /// Create an empty model; its tree is attached with [`add_model_detail`](Self::add_model_detail).
    fn create_model(&self, payload: &NewModel) -> Result<Model>;

    /// Replace the tree of a model that already has one.
    fn update_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value>;

    /// Attach a tree to a model that has none.
    fn add_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value>;
}

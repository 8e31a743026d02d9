//! Eclipse API records.
//!
//! Only the fields this workspace reads or writes are modelled. Everything
//! else the server sends is kept in `extra` and written back untouched, so an
//! update round trip does not silently drop server-side settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unmodelled fields passed through verbatim.
pub type Extra = Map<String, Value>;

/// Security search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: i64,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Security set as returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySetSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Full security set (details endpoint).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySet {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_type_value: Option<f64>,
    #[serde(default)]
    pub securities: Vec<SecuritySetSecurity>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One security inside a security set. `id` is the security's own id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySetSecurity {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_model_tolerance_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_model_tolerance_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default)]
    pub equivalences: Vec<Equivalence>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Equivalent security attached to a security-set entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equivalence {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of the security-set create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySetPayload {
    pub name: String,
    pub description: Option<String>,
    pub tolerance_type: String,
    pub tolerance_type_value: f64,
    pub securities: Vec<SecuritySetSecurity>,
}

/// Model as returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_space: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Full model with its allocation tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_space: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_detail: Option<ModelDetail>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Node of a model tree. The root describes the model itself; its children
/// are the security-set components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_detail_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_space: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_asset: Option<AssetRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_model_tolerance_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_model_tolerance_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default)]
    pub children: Vec<ModelDetail>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Reference to the security set behind a model component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: i64,
}

/// Body of the model create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModel {
    pub name: String,
    pub name_space: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub status_id: i64,
    pub management_style_id: i64,
    pub is_community_model: bool,
    /// The API expects 0/1 here rather than a boolean.
    pub is_dynamic: u8,
    pub exclude_rebalance_sleeve: bool,
}

impl NewModel {
    /// Static, non-community model with the API's default status and style.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            name_space: None,
            description: None,
            tags: None,
            status_id: 1,
            management_style_id: 2,
            is_community_model: false,
            is_dynamic: 0,
            exclude_rebalance_sleeve: false,
        }
    }
}

/// Account row from the simple accounts endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub account_id: Option<Value>,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

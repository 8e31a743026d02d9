//! In-memory Eclipse for tests: implements [`EclipseGateway`] over seeded
//! objects and records every call.
//!
//! Writes are applied to the in-memory state, so a sync followed by a preview
//! sees its own changes.
//!
//! ```
//! use modelsync_client::EclipseGateway;
//! use modelsync_client::mock::MockEclipse;
//!
//! let eclipse = MockEclipse::builder()
//!     .with_security(101, "AAPL")
//!     .with_security(102, "MSFT")
//!     .build();
//!
//! let hits = eclipse.search_securities("aapl").unwrap();
//! assert_eq!(hits[0].id, 101);
//! assert!(eclipse.writes().is_empty());
//! ```

use std::sync::Mutex;

use serde_json::{Value, json};

use crate::EclipseGateway;
use crate::error::{ApiError, Result};
use crate::types::*;

/// A write the mock received, for assertions.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedWrite {
    CreateSecuritySet(SecuritySetPayload),
    UpdateSecuritySet { id: i64, payload: SecuritySetPayload },
    CreateModel(NewModel),
    UpdateModelDetail { model_id: i64, detail: ModelDetail },
    AddModelDetail { model_id: i64, detail: ModelDetail },
}

/// Builder for `MockEclipse`.
pub struct MockEclipseBuilder {
    securities: Vec<Security>,
    security_sets: Vec<SecuritySet>,
    models: Vec<Model>,
    fail_writes: Option<String>,
    next_id: i64,
}

impl MockEclipseBuilder {
    pub fn with_security(mut self, id: i64, symbol: &str) -> Self {
        self.securities.push(Security {
            id,
            symbol: Some(symbol.to_string()),
            name: Some(format!("{symbol} Inc")),
            ..Default::default()
        });
        self
    }

    pub fn with_security_set(mut self, set: SecuritySet) -> Self {
        self.security_sets.push(set);
        self
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Every write call fails with `ApiError::Api { status: 500, .. }`.
    pub fn fail_writes(mut self, message: &str) -> Self {
        self.fail_writes = Some(message.to_string());
        self
    }

    /// First id handed out by create calls.
    pub fn next_id(mut self, id: i64) -> Self {
        self.next_id = id;
        self
    }

    pub fn build(self) -> MockEclipse {
        MockEclipse {
            securities: self.securities,
            security_sets: Mutex::new(self.security_sets),
            models: Mutex::new(self.models),
            fail_writes: self.fail_writes,
            next_id: Mutex::new(self.next_id),
            calls: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
        }
    }
}

/// Fake Eclipse backend.
pub struct MockEclipse {
    securities: Vec<Security>,
    security_sets: Mutex<Vec<SecuritySet>>,
    models: Mutex<Vec<Model>>,
    fail_writes: Option<String>,
    next_id: Mutex<i64>,
    calls: Mutex<Vec<String>>,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl MockEclipse {
    pub fn builder() -> MockEclipseBuilder {
        MockEclipseBuilder {
            securities: Vec::new(),
            security_sets: Vec::new(),
            models: Vec::new(),
            fail_writes: None,
            next_id: 1000,
        }
    }

    /// Names of every gateway method called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Writes received, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// Current state of a stored security set.
    pub fn security_set(&self, id: i64) -> Option<SecuritySet> {
        self.security_sets
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Current state of a stored model.
    pub fn model(&self, id: i64) -> Option<Model> {
        self.models
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    fn call(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn write(&self, write: RecordedWrite) -> Result<()> {
        self.writes.lock().unwrap().push(write);
        match &self.fail_writes {
            Some(message) => Err(ApiError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn allocate_id(&self) -> i64 {
        let mut next = self.next_id.lock().unwrap();
        let id = *next;
        *next += 1;
        id
    }

    fn symbol_of(&self, id: i64) -> Option<String> {
        self.securities
            .iter()
            .find(|s| s.id == id)
            .and_then(|s| s.symbol.clone())
    }

    /// Stored form of a payload: symbols filled in from the security list.
    fn store_securities(&self, payload: &SecuritySetPayload) -> Vec<SecuritySetSecurity> {
        payload
            .securities
            .iter()
            .map(|s| {
                let mut stored = s.clone();
                stored.symbol = stored.symbol.or_else(|| self.symbol_of(s.id));
                for eq in &mut stored.equivalences {
                    eq.symbol = eq.symbol.take().or_else(|| self.symbol_of(eq.id));
                }
                stored
            })
            .collect()
    }

    /// Stored form of a model tree: every node gets a `modelDetailId`.
    fn store_detail(&self, detail: &ModelDetail) -> ModelDetail {
        let mut stored = detail.clone();
        if stored.model_detail_id.is_none() {
            stored.model_detail_id = Some(self.allocate_id());
        }
        stored.children = detail.children.iter().map(|c| self.store_detail(c)).collect();
        stored
    }

    fn set_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value> {
        let stored = self.store_detail(detail);
        let mut models = self.models.lock().unwrap();
        let model = models
            .iter_mut()
            .find(|m| m.id == model_id)
            .ok_or_else(|| ApiError::NotFound(format!("model {model_id}")))?;
        model.model_detail = Some(stored);
        Ok(json!({ "id": model_id }))
    }
}

impl EclipseGateway for MockEclipse {
    fn search_securities(&self, ticker: &str) -> Result<Vec<Security>> {
        self.call("search_securities");
        let needle = ticker.to_lowercase();
        Ok(self
            .securities
            .iter()
            .filter(|s| {
                s.symbol
                    .as_deref()
                    .is_some_and(|sym| sym.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    fn list_security_sets(&self) -> Result<Vec<SecuritySetSummary>> {
        self.call("list_security_sets");
        Ok(self
            .security_sets
            .lock()
            .unwrap()
            .iter()
            .map(|s| SecuritySetSummary {
                id: s.id,
                name: s.name.clone(),
                description: s.description.clone(),
                ..Default::default()
            })
            .collect())
    }

    fn get_security_set(&self, id: i64) -> Result<SecuritySet> {
        self.call("get_security_set");
        self.security_set(id)
            .ok_or_else(|| ApiError::NotFound(format!("security set {id}")))
    }

    fn create_security_set(&self, payload: &SecuritySetPayload) -> Result<SecuritySet> {
        self.call("create_security_set");
        self.write(RecordedWrite::CreateSecuritySet(payload.clone()))?;
        let set = SecuritySet {
            id: self.allocate_id(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            tolerance_type: Some(payload.tolerance_type.clone()),
            tolerance_type_value: Some(payload.tolerance_type_value),
            securities: self.store_securities(payload),
            ..Default::default()
        };
        self.security_sets.lock().unwrap().push(set.clone());
        Ok(set)
    }

    fn update_security_set(&self, id: i64, payload: &SecuritySetPayload) -> Result<Value> {
        self.call("update_security_set");
        self.write(RecordedWrite::UpdateSecuritySet {
            id,
            payload: payload.clone(),
        })?;
        let securities = self.store_securities(payload);
        let mut sets = self.security_sets.lock().unwrap();
        let set = sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("security set {id}")))?;
        set.name = payload.name.clone();
        set.description = payload.description.clone();
        set.tolerance_type = Some(payload.tolerance_type.clone());
        set.tolerance_type_value = Some(payload.tolerance_type_value);
        set.securities = securities;
        Ok(json!({ "id": id }))
    }

    fn list_models(&self) -> Result<Vec<ModelSummary>> {
        self.call("list_models");
        Ok(self
            .models
            .lock()
            .unwrap()
            .iter()
            .map(|m| ModelSummary {
                id: m.id,
                name: m.name.clone(),
                name_space: m.name_space.clone(),
                ..Default::default()
            })
            .collect())
    }

    fn get_model(&self, id: i64) -> Result<Model> {
        self.call("get_model");
        self.model(id)
            .ok_or_else(|| ApiError::NotFound(format!("model {id}")))
    }

    fn create_model(&self, payload: &NewModel) -> Result<Model> {
        self.call("create_model");
        self.write(RecordedWrite::CreateModel(payload.clone()))?;
        let model = Model {
            id: self.allocate_id(),
            name: payload.name.clone(),
            name_space: payload.name_space.clone(),
            description: payload.description.clone(),
            ..Default::default()
        };
        self.models.lock().unwrap().push(model.clone());
        Ok(model)
    }

    fn update_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value> {
        self.call("update_model_detail");
        self.write(RecordedWrite::UpdateModelDetail {
            model_id,
            detail: detail.clone(),
        })?;
        self.set_detail(model_id, detail)
    }

    fn add_model_detail(&self, model_id: i64, detail: &ModelDetail) -> Result<Value> {
        self.call("add_model_detail");
        self.write(RecordedWrite::AddModelDetail {
            model_id,
            detail: detail.clone(),
        })?;
        self.set_detail(model_id, detail)
    }
}

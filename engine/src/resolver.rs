//! Name and ticker resolution against the server.
//!
//! A resolver lives for one sync or preview. It memoizes ticker ids and the
//! security-set listing so a file naming the same security twice, or a model
//! with many components, does not repeat lookups.

use log::debug;
use modelsync_client::{EclipseGateway, ModelSummary, SecuritySet, SecuritySetSummary};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

pub struct Resolver<'a> {
    gateway: &'a dyn EclipseGateway,
    tickers: FxHashMap<String, i64>,
    security_sets: Option<Vec<SecuritySetSummary>>,
}

fn key(s: &str) -> String {
    s.trim().to_lowercase()
}

impl<'a> Resolver<'a> {
    pub fn new(gateway: &'a dyn EclipseGateway) -> Self {
        Self {
            gateway,
            tickers: FxHashMap::default(),
            security_sets: None,
        }
    }

    /// Record a known ticker id. Existing entries are kept.
    pub fn seed_ticker(&mut self, ticker: &str, id: i64) {
        self.tickers.entry(key(ticker)).or_insert(id);
    }

    /// Learn every ticker (and equivalent) already present in a set, so an
    /// update reuses the ids the server already holds. Entries without a
    /// symbol are learned under their id, which is what an export writes.
    pub fn seed_from_security_set(&mut self, set: &SecuritySet) {
        for sec in &set.securities {
            self.seed_stored(sec.symbol.as_deref(), sec.id);
            for eq in &sec.equivalences {
                self.seed_stored(eq.symbol.as_deref(), eq.id);
            }
        }
    }

    fn seed_stored(&mut self, symbol: Option<&str>, id: i64) {
        match symbol {
            Some(symbol) => self.seed_ticker(symbol, id),
            None => self.seed_ticker(&id.to_string(), id),
        }
    }

    /// Security id for an exact (case-insensitive) ticker.
    pub fn resolve_security(&mut self, ticker: &str) -> Result<i64> {
        let k = key(ticker);
        if let Some(&id) = self.tickers.get(&k) {
            return Ok(id);
        }

        let hits = self.gateway.search_securities(ticker.trim())?;
        let found = hits
            .iter()
            .find(|s| s.symbol.as_deref().is_some_and(|sym| key(sym) == k))
            .map(|s| s.id);

        match found {
            Some(id) => {
                debug!("Resolved {ticker} -> {id}");
                self.tickers.insert(k, id);
                Ok(id)
            }
            None => Err(Error::NotFound(format!(
                "security '{ticker}' ({} search results, none with that exact symbol)",
                hits.len()
            ))),
        }
    }

    /// Exact case-insensitive name match in the security-set listing.
    pub fn find_security_set_by_name(&mut self, name: &str) -> Result<Option<SecuritySetSummary>> {
        if self.security_sets.is_none() {
            self.security_sets = Some(self.gateway.list_security_sets()?);
        }
        let wanted = key(name);
        Ok(self
            .security_sets
            .iter()
            .flatten()
            .find(|s| key(&s.name) == wanted)
            .cloned())
    }

    /// Exact case-insensitive name match in the model listing.
    pub fn find_model_by_name(&mut self, name: &str) -> Result<Option<ModelSummary>> {
        let wanted = key(name);
        Ok(self
            .gateway
            .list_models()?
            .into_iter()
            .find(|m| key(&m.name) == wanted))
    }
}

//! Bar Record Store — the read interface the core consumes.
//!
//! Population is the ingestion side's job; from the core's perspective a
//! store is read-only for the duration of a request. Implementations must be
//! `Send + Sync` so independent builds can share one store across threads.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Bar, BarKind, ContractId, ContractSeries, ProductId};
use crate::error::CoreError;

/// Read access to per-contract bar series keyed by `(product, contract, date)`.
pub trait BarStore: Send + Sync {
    /// Every product known to the store.
    fn products(&self) -> Vec<&ProductId>;

    /// All contracts of `product`, ordered by contract id.
    ///
    /// Fails with `NotFound` for an unknown product.
    fn contracts(&self, product: &ProductId) -> Result<Vec<&ContractSeries>, CoreError>;

    fn get_series(
        &self,
        product: &ProductId,
        contract: &ContractId,
    ) -> Result<&ContractSeries, CoreError> {
        self.contracts(product)?
            .into_iter()
            .find(|s| s.id() == contract)
            .ok_or_else(|| CoreError::NotFound(format!("contract '{contract}' of '{product}'")))
    }

    fn get_bar(
        &self,
        product: &ProductId,
        contract: &ContractId,
        date: NaiveDate,
    ) -> Result<&Bar, CoreError> {
        self.get_series(product, contract)?
            .bar_on(date)
            .ok_or_else(|| CoreError::NotFound(format!("bar for '{contract}' on {date}")))
    }

    /// Contracts with at least one bar on or before `as_of` and not yet expired.
    fn list_contracts(
        &self,
        product: &ProductId,
        as_of: NaiveDate,
    ) -> Result<BTreeSet<ContractId>, CoreError> {
        Ok(self.live_series(product, as_of)?.into_iter().map(|s| s.id().clone()).collect())
    }

    /// Series behind [`BarStore::list_contracts`], ordered by contract id.
    fn live_series(
        &self,
        product: &ProductId,
        as_of: NaiveDate,
    ) -> Result<Vec<&ContractSeries>, CoreError> {
        Ok(self.contracts(product)?.into_iter().filter(|s| s.is_listed(as_of)).collect())
    }
}

#[derive(Debug, Clone)]
struct ProductBook {
    kind: BarKind,
    series: BTreeMap<ContractId, ContractSeries>,
}

/// In-memory store: products → contracts → date-sorted bars.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBarStore {
    products: BTreeMap<ProductId, ProductBook>,
}

impl InMemoryBarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one contract series.
    ///
    /// A contract can be ingested once; all series of a product must share a
    /// bar kind.
    pub fn insert(&mut self, product: ProductId, series: ContractSeries) -> Result<(), CoreError> {
        let book = self
            .products
            .entry(product)
            .or_insert_with(|| ProductBook { kind: series.kind(), series: BTreeMap::new() });
        if book.kind != series.kind() {
            return Err(CoreError::invalid_series(
                series.id().as_str(),
                format!("bar kind {:?} differs from product kind {:?}", series.kind(), book.kind),
            ));
        }
        if book.series.contains_key(series.id()) {
            return Err(CoreError::invalid_series(series.id().as_str(), "already ingested"));
        }
        book.series.insert(series.id().clone(), series);
        Ok(())
    }

    /// Builder form of [`InMemoryBarStore::insert`].
    pub fn with_series(mut self, product: ProductId, series: ContractSeries) -> Result<Self, CoreError> {
        self.insert(product, series)?;
        Ok(self)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn contract_count(&self, product: &ProductId) -> usize {
        self.products.get(product).map_or(0, |b| b.series.len())
    }

    /// Bar kind shared by the series of `product`.
    pub fn kind(&self, product: &ProductId) -> Option<BarKind> {
        self.products.get(product).map(|b| b.kind)
    }

    fn book(&self, product: &ProductId) -> Result<&ProductBook, CoreError> {
        self.products
            .get(product)
            .ok_or_else(|| CoreError::NotFound(format!("product '{product}'")))
    }
}

impl BarStore for InMemoryBarStore {
    fn products(&self) -> Vec<&ProductId> {
        self.products.keys().collect()
    }

    fn contracts(&self, product: &ProductId) -> Result<Vec<&ContractSeries>, CoreError> {
        Ok(self.book(product)?.series.values().collect())
    }

    fn get_series(
        &self,
        product: &ProductId,
        contract: &ContractId,
    ) -> Result<&ContractSeries, CoreError> {
        self.book(product)?
            .series
            .get(contract)
            .ok_or_else(|| CoreError::NotFound(format!("contract '{contract}' of '{product}'")))
    }
}

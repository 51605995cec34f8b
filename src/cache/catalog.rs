use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::application::repos::{CatalogSource, ProductQuery, RepoError};
use crate::domain::entities::{Category, Product, ProductType};
use crate::domain::types::TaxonomyKind;

use super::lock::mutex_lock;
use super::snapshot::CatalogSnapshot;
use super::views::{self, BrowseFilter};

const SOURCE: &str = "cache::catalog";

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("catalog fetch failed")]
    Fetch(#[source] Arc<RepoError>),
}

type LoadResult = Result<Arc<CatalogSnapshot>, CatalogError>;
type PendingLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Empty,
    Loading { generation: u64, load: PendingLoad },
    Ready(Arc<CatalogSnapshot>),
}

struct SlotState {
    slot: Slot,
    generation: u64,
}

/// Lazily populated in-memory mirror of categories, product types and products.
///
/// The first access starts one fetch of all three collections; every caller that
/// arrives while it is pending awaits that same fetch and receives the same
/// outcome. A failed fetch publishes nothing and leaves the cache empty, so the
/// next access starts over. Once published, a snapshot is served until
/// [`CatalogCache::invalidate`] is called.
#[derive(Clone)]
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    state: Arc<Mutex<SlotState>>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(SlotState {
                slot: Slot::Empty,
                generation: 0,
            })),
        }
    }

    pub fn is_initialized(&self) -> bool {
        let state = mutex_lock(&self.state, SOURCE, "is_initialized");
        matches!(state.slot, Slot::Ready(_))
    }

    /// Return the published snapshot, fetching it first if nothing is published yet.
    pub async fn ensure_initialized(&self) -> LoadResult {
        let pending = {
            let mut state = mutex_lock(&self.state, SOURCE, "ensure_initialized");
            match &state.slot {
                Slot::Ready(snapshot) => return Ok(snapshot.clone()),
                Slot::Loading { load, .. } => {
                    debug!(target = SOURCE, "joining in-flight catalog fetch");
                    load.clone()
                }
                Slot::Empty => {
                    state.generation += 1;
                    let generation = state.generation;
                    let load = fetch_and_publish(self.source.clone(), self.state.clone(), generation)
                        .boxed()
                        .shared();
                    state.slot = Slot::Loading {
                        generation,
                        load: load.clone(),
                    };
                    load
                }
            }
        };

        pending.await
    }

    /// Drop the published snapshot so the next access fetches again.
    ///
    /// A fetch that is still pending completes for the callers already waiting on
    /// it, but its result is not published.
    pub fn invalidate(&self) {
        let mut state = mutex_lock(&self.state, SOURCE, "invalidate");
        state.generation += 1;
        state.slot = Slot::Empty;
        counter!("butik_catalog_invalidations_total").increment(1);
        info!(target = SOURCE, "catalog cache invalidated");
    }

    pub async fn categories(&self) -> Result<BTreeMap<String, Category>, CatalogError> {
        Ok(self.ensure_initialized().await?.categories().clone())
    }

    pub async fn product_types(&self) -> Result<BTreeMap<String, ProductType>, CatalogError> {
        Ok(self.ensure_initialized().await?.product_types().clone())
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.ensure_initialized().await?.products().to_vec())
    }

    pub async fn best_sellers(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.ensure_initialized().await?.best_sellers().to_vec())
    }

    pub async fn products_by_category(&self, key: &str) -> Result<Vec<Product>, CatalogError> {
        let snapshot = self.ensure_initialized().await?;
        Ok(owned(views::filter_by_category(snapshot.products(), key)))
    }

    pub async fn products_by_type(&self, key: &str) -> Result<Vec<Product>, CatalogError> {
        let snapshot = self.ensure_initialized().await?;
        Ok(owned(views::filter_by_type(snapshot.products(), key)))
    }

    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        let snapshot = self.ensure_initialized().await?;
        Ok(owned(views::search(snapshot.products(), query)))
    }

    pub async fn browse(&self, filter: &BrowseFilter) -> Result<Vec<Product>, CatalogError> {
        let snapshot = self.ensure_initialized().await?;
        Ok(owned(views::browse(snapshot.products(), filter)))
    }

    pub async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        Ok(self.ensure_initialized().await?.product(id).cloned())
    }
}

fn owned(products: Vec<&Product>) -> Vec<Product> {
    products.into_iter().cloned().collect()
}

async fn fetch_and_publish(
    source: Arc<dyn CatalogSource>,
    state: Arc<Mutex<SlotState>>,
    generation: u64,
) -> LoadResult {
    let started = Instant::now();
    counter!("butik_catalog_fetch_total").increment(1);

    let ordered = ProductQuery::ordered_by_name();
    let fetched = tokio::try_join!(
        source.list_taxonomy(TaxonomyKind::Category),
        source.list_taxonomy(TaxonomyKind::ProductType),
        source.list_products(&ordered),
    );
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    histogram!("butik_catalog_fetch_ms").record(elapsed_ms);

    let result = match fetched {
        Ok((categories, product_types, products)) => {
            let snapshot = Arc::new(CatalogSnapshot::build(categories, product_types, products));
            info!(
                target = SOURCE,
                categories = snapshot.categories().len(),
                product_types = snapshot.product_types().len(),
                products = snapshot.products().len(),
                best_sellers = snapshot.best_sellers().len(),
                elapsed_ms,
                "catalog snapshot loaded"
            );
            Ok(snapshot)
        }
        Err(err) => {
            counter!("butik_catalog_fetch_failed_total").increment(1);
            error!(target = SOURCE, error = %err, elapsed_ms, "catalog fetch failed");
            Err(CatalogError::Fetch(Arc::new(err)))
        }
    };

    let mut guard = mutex_lock(&state, SOURCE, "publish");
    let current = matches!(
        &guard.slot,
        Slot::Loading { generation: pending, .. } if *pending == generation
    );
    if current {
        guard.slot = match &result {
            Ok(snapshot) => Slot::Ready(snapshot.clone()),
            Err(_) => Slot::Empty,
        };
    }
    drop(guard);

    result
}

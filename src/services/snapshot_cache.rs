//! Product snapshot cache implementation
//!
//! A favorite toggle can arrive from a callback long after the search that
//! rendered the product, so every rendered item is snapshotted here. Reads
//! go through a bounded in-memory map first, then the product_snapshots
//! table; a miss on both fabricates a placeholder instead of failing the
//! favorite action. Persistence is asynchronous and allowed to race;
//! snapshots are immutable-in-practice per item id, last writer wins.

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use crate::database::repositories::SnapshotRepository;
use crate::models::product::{Product, ProductSnapshot};
use crate::utils::cache::BoundedMap;

/// Cap on the in-memory snapshot map
const SNAPSHOT_CACHE_CAPACITY: usize = 512;

#[derive(Clone)]
pub struct SnapshotCache {
    memory: Arc<Mutex<BoundedMap<ProductSnapshot>>>,
    repository: SnapshotRepository,
}

impl SnapshotCache {
    pub fn new(repository: SnapshotRepository) -> Self {
        Self {
            memory: Arc::new(Mutex::new(BoundedMap::new(SNAPSHOT_CACHE_CAPACITY))),
            repository,
        }
    }

    /// Record snapshots for every product in a rendered result list
    pub fn put_all(&self, products: &[Product]) {
        for product in products {
            self.put(ProductSnapshot::from_product(product));
        }
    }

    /// Record one snapshot: in-memory immediately, table write spawned
    pub fn put(&self, snapshot: ProductSnapshot) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(snapshot.product_id.clone(), snapshot.clone());
        }

        let repository = self.repository.clone();
        tokio::spawn(async move {
            if let Err(e) = repository.upsert(&snapshot).await {
                warn!(product_id = %snapshot.product_id, error = %e,
                      "Snapshot persist failed (best-effort, ignored)");
            }
        });
    }

    /// Resolve a product id to its snapshot: memory, then table, then a
    /// placeholder. Never errors; loss degrades the rendering only.
    pub async fn get(&self, product_id: &str) -> ProductSnapshot {
        if let Ok(memory) = self.memory.lock() {
            if let Some(snapshot) = memory.get(product_id) {
                return snapshot.clone();
            }
        }

        match self.repository.find(product_id).await {
            Ok(Some(snapshot)) => {
                if let Ok(mut memory) = self.memory.lock() {
                    memory.insert(product_id.to_string(), snapshot.clone());
                }
                snapshot
            }
            Ok(None) => {
                debug!(product_id = %product_id, "Snapshot missing, using placeholder");
                ProductSnapshot::placeholder(product_id)
            }
            Err(e) => {
                warn!(product_id = %product_id, error = %e,
                      "Snapshot lookup failed, using placeholder");
                ProductSnapshot::placeholder(product_id)
            }
        }
    }
}

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use tracing::debug;

use crate::key::CacheKey;
use crate::models::Dish;

/// Storage for cooked dishes, keyed by canonical request key.
///
/// Implementations hand out owned copies: a caller mutating a looked-up dish
/// never changes what the next lookup sees.
#[async_trait]
pub trait DishStore: Send + Sync {
    async fn lookup(&self, key: &CacheKey) -> Option<Dish>;

    // Last write wins
    async fn insert(&self, key: &CacheKey, dish: &Dish);

    // Full key -> dish dump for the debug endpoint
    async fn snapshot(&self) -> BTreeMap<String, Dish>;

    async fn len(&self) -> usize;
}

// In-process store, lives as long as the server does. No expiry, no eviction.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Dish>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DishStore for MemoryStore {
    async fn lookup(&self, key: &CacheKey) -> Option<Dish> {
        // clone out so the shard guard is dropped right here
        self.entries.get(key.as_str()).map(|entry| entry.value().clone())
    }

    async fn insert(&self, key: &CacheKey, dish: &Dish) {
        let replaced = self
            .entries
            .insert(key.as_str().to_string(), dish.clone())
            .is_some();
        debug!(key = %key.digest(), replaced, "stored dish");
    }

    async fn snapshot(&self) -> BTreeMap<String, Dish> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key;
    use crate::models::{IngredientDetail, Quality};
    use std::sync::Arc;

    fn sample_dish() -> Dish {
        Dish {
            name: "Simple Dough".into(),
            modifier: Some("w/ water".into()),
            description: "A basic, sticky dough.".into(),
            quality: Quality::Decent,
            rationale: Some("Flour and water make dough.".into()),
            calories: Some(1820.0),
            protein: Some(50.0),
            fat: None,
            carbohydrates: Some(380.0),
            is_new_discovery: true,
        }
    }

    fn key_for(name: &str) -> CacheKey {
        derive_key(&[IngredientDetail::new(name, 500.0, "g")], "knead", None).key
    }

    #[tokio::test]
    async fn lookup_returns_inserted_value() {
        let store = MemoryStore::new();
        let key = key_for("flour");
        assert!(store.lookup(&key).await.is_none());

        store.insert(&key, &sample_dish()).await;
        assert_eq!(store.lookup(&key).await, Some(sample_dish()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn mutating_lookup_result_does_not_touch_store() {
        let store = MemoryStore::new();
        let key = key_for("flour");
        store.insert(&key, &sample_dish()).await;

        let mut copy = store.lookup(&key).await.unwrap();
        copy.name.push_str(" (eaten)");
        copy.is_new_discovery = false;
        copy.modifier = None;

        assert_eq!(store.lookup(&key).await, Some(sample_dish()));
    }

    #[tokio::test]
    async fn mutating_inserted_value_does_not_touch_store() {
        let store = MemoryStore::new();
        let key = key_for("flour");
        let mut dish = sample_dish();
        store.insert(&key, &dish).await;

        dish.description.clear();
        assert_eq!(store.lookup(&key).await.unwrap().description, "A basic, sticky dough.");
    }

    #[tokio::test]
    async fn overwrite_is_last_write_wins() {
        let store = MemoryStore::new();
        let key = key_for("flour");
        store.insert(&key, &sample_dish()).await;

        let mut newer = sample_dish();
        newer.quality = Quality::Dubious;
        store.insert(&key, &newer).await;

        assert_eq!(store.lookup(&key).await.unwrap().quality, Quality::Dubious);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_for_different_keys() {
        let store = Arc::new(MemoryStore::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let key = key_for(&format!("ingredient-{i}"));
                store.insert(&key, &sample_dish()).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 32);
        assert!(snapshot.values().all(|d| *d == sample_dish()));
    }
}

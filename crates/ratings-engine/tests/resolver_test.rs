//! Host resolvers that keep cached totals in a store of their own.

mod common;

use std::sync::Arc;

use ratings_core::config::{AttributeDefaults, RatingAttribute, RatingsConfig};
use ratings_core::errors::RatingsResult;
use ratings_core::models::Aggregate;
use ratings_core::traits::{EntityResolver, IRatingStorage};
use ratings_engine::{CascadeRecompute, EntityRegistry, RatingEngine};
use ratings_storage::StorageEngine;

use common::{anon, article, ip, rating};

/// Writes every cached aggregate into a separate host database.
struct HostStore {
    store: StorageEngine,
}

impl EntityResolver for HostStore {
    fn exists(&self, entity_id: i64) -> RatingsResult<bool> {
        Ok((1..=10).contains(&entity_id))
    }

    fn store_cached(&self, aggregate: &Aggregate) -> RatingsResult<()> {
        self.store.atomic(&mut |tx| tx.put_aggregate(aggregate))
    }
}

#[test]
fn resolver_writes_to_its_own_store_while_the_vote_commits() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let host = Arc::new(HostStore {
        store: StorageEngine::open_in_memory().unwrap(),
    });
    let mut registry = EntityRegistry::new();
    registry.register(
        "article",
        host.clone(),
        vec![RatingAttribute::from_defaults("rating", &AttributeDefaults::default())
            .allow_anonymous(true)],
    );
    let registry = Arc::new(registry);
    let engine = RatingEngine::new(storage.clone(), registry.clone(), RatingsConfig::default());

    engine.submit_vote(&article(3), &rating(), 2, &anon("10.0.0.1")).unwrap();
    engine.submit_vote(&article(3), &rating(), 1, &anon("10.0.0.2")).unwrap();
    let cached = host.store.get_aggregate(&article(3), &rating()).unwrap().unwrap();
    assert_eq!((cached.score, cached.votes), (3, 2));

    CascadeRecompute::new(storage, registry)
        .purge_ip_address(ip("10.0.0.1"))
        .unwrap();
    let cached = host.store.get_aggregate(&article(3), &rating()).unwrap().unwrap();
    assert_eq!((cached.score, cached.votes), (1, 1));
}

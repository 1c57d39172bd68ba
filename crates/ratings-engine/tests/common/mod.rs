//! Shared setup for ratings-engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use ratings_core::config::{AttributeDefaults, RatingAttribute, RatingsConfig};
use ratings_core::errors::RatingsResult;
use ratings_core::models::{Aggregate, EntityRef, RatingKey, VoterContext};
use ratings_core::traits::EntityResolver;
use ratings_engine::{CascadeRecompute, EntityRegistry, RatingEngine};
use ratings_storage::StorageEngine;

/// Host entities that keep a cached (score, votes) pair per rating key.
#[derive(Default)]
pub struct CachedEntities {
    ids: Mutex<HashSet<i64>>,
    cached: Mutex<HashMap<(i64, RatingKey), (i64, u64)>>,
}

impl CachedEntities {
    pub fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
            cached: Mutex::default(),
        }
    }

    pub fn remove(&self, entity_id: i64) {
        self.ids.lock().unwrap().remove(&entity_id);
    }

    pub fn cached(&self, entity_id: i64, key: &RatingKey) -> Option<(i64, u64)> {
        self.cached
            .lock()
            .unwrap()
            .get(&(entity_id, key.clone()))
            .copied()
    }
}

impl EntityResolver for CachedEntities {
    fn exists(&self, entity_id: i64) -> RatingsResult<bool> {
        Ok(self.ids.lock().unwrap().contains(&entity_id))
    }

    fn store_cached(&self, aggregate: &Aggregate) -> RatingsResult<()> {
        self.cached.lock().unwrap().insert(
            (aggregate.entity.entity_id, aggregate.key.clone()),
            (aggregate.score, aggregate.votes),
        );
        Ok(())
    }
}

/// Engine, cascade and host entities over one in-memory store.
pub struct Harness {
    pub storage: Arc<StorageEngine>,
    pub entities: Arc<CachedEntities>,
    pub engine: RatingEngine,
    pub cascade: CascadeRecompute,
}

/// `article` entities 1..=10 with two attributes, mirroring a host model with
/// an anonymous, changeable `rating` and a user-only, fixed `rating2`.
pub fn harness(per_ip_vote_cap: u64) -> Harness {
    harness_with(per_ip_vote_cap, |attrs| attrs)
}

pub fn harness_with(
    per_ip_vote_cap: u64,
    customize: impl FnOnce(Vec<RatingAttribute>) -> Vec<RatingAttribute>,
) -> Harness {
    ratings_core::tracing_setup::init_tracing();
    let config = RatingsConfig {
        per_ip_vote_cap,
        ..RatingsConfig::default()
    };
    let defaults = AttributeDefaults::default();
    let attributes = customize(vec![
        RatingAttribute::from_defaults("rating", &defaults)
            .allow_anonymous(true)
            .can_change_vote(true),
        RatingAttribute::from_defaults("rating2", &defaults),
    ]);

    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let entities = Arc::new(CachedEntities::with_ids(1..=10));
    let mut registry = EntityRegistry::new();
    registry.register("article", entities.clone(), attributes);
    let registry = Arc::new(registry);

    Harness {
        engine: RatingEngine::new(storage.clone(), registry.clone(), config),
        cascade: CascadeRecompute::new(storage.clone(), registry),
        storage,
        entities,
    }
}

pub fn article(id: i64) -> EntityRef {
    EntityRef::new("article", id)
}

pub fn rating() -> RatingKey {
    RatingKey::derive("rating")
}

pub fn rating2() -> RatingKey {
    RatingKey::derive("rating2")
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn anon(addr: &str) -> VoterContext {
    VoterContext::anonymous(ip(addr))
}

pub fn user(user_id: i64, addr: &str) -> VoterContext {
    VoterContext::authenticated(user_id, ip(addr))
}

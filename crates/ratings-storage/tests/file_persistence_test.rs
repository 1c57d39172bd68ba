//! File-backed persistence: restart survival, WAL mode, read pool visibility.

use chrono::Utc;

use ratings_core::config::StorageConfig;
use ratings_core::models::{EntityRef, NewVote, RatingKey, SimilarityEdge, VoterIdentity};
use ratings_core::traits::{IRatingStorage, ISimilarityStorage};
use ratings_storage::pool::pragmas::verify_wal_mode;
use ratings_storage::StorageEngine;

fn vote(entity_id: i64, user_id: i64, score: i64) -> NewVote {
    NewVote {
        entity: EntityRef::new("photo", entity_id),
        key: RatingKey::derive("rating"),
        score,
        identity: VoterIdentity::User { user_id },
        ip_address: "192.168.0.1".parse().unwrap(),
    }
}

fn cast(engine: &StorageEngine, vote: &NewVote) {
    engine
        .atomic(&mut |tx| {
            tx.insert_vote(vote, Utc::now())?;
            tx.apply_aggregate_delta(&vote.entity, &vote.key, vote.score, 1)?;
            Ok(())
        })
        .unwrap();
}

#[test]
fn votes_and_aggregates_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratings.db");

    {
        let engine = StorageEngine::open(&path).unwrap();
        cast(&engine, &vote(1, 1, 2));
        cast(&engine, &vote(1, 2, 1));
        engine
            .replace_edges(&[SimilarityEdge {
                from_user_id: 1,
                to_user_id: 2,
                agrees: 3,
                disagrees: 0,
                exclude: true,
            }])
            .unwrap();
    }

    let engine = StorageEngine::open(&path).unwrap();
    let entity = EntityRef::new("photo", 1);
    let key = RatingKey::derive("rating");
    let agg = engine.get_aggregate(&entity, &key).unwrap().unwrap();
    assert_eq!((agg.score, agg.votes), (3, 2));
    assert_eq!(engine.list_votes(&entity, &key).unwrap().len(), 2);

    let edges = engine.list_edges().unwrap();
    assert_eq!(edges.len(), 1);
    assert!(edges[0].exclude);
}

#[test]
fn reopen_does_not_rerun_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratings.db");
    let first = StorageEngine::open(&path).unwrap().schema_version().unwrap();
    let second = StorageEngine::open(&path).unwrap().schema_version().unwrap();
    assert_eq!(first, second);
    assert_eq!(second, ratings_storage::migrations::LATEST_VERSION);
}

#[test]
fn file_backed_writer_uses_wal() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StorageEngine::open(&dir.path().join("wal.db")).unwrap();
    let wal = engine.pool().writer.with_conn_sync(verify_wal_mode).unwrap();
    assert!(wal);
}

#[test]
fn read_pool_sees_committed_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig { read_pool_size: 3 };
    let engine = StorageEngine::open_with_config(&dir.path().join("pool.db"), &config).unwrap();
    assert_eq!(engine.pool().readers.size(), 3);

    cast(&engine, &vote(4, 1, 2));
    // Several reads rotate across the pool; every reader sees the commit.
    for _ in 0..6 {
        let agg = engine
            .get_aggregate(&EntityRef::new("photo", 4), &RatingKey::derive("rating"))
            .unwrap()
            .unwrap();
        assert_eq!(agg.votes, 1);
    }
}

#[test]
fn concurrent_writers_keep_aggregate_consistent() {
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(StorageEngine::open(&dir.path().join("concurrent.db")).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|user_id| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || cast(&engine, &vote(9, user_id, 1)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let agg = engine
        .get_aggregate(&EntityRef::new("photo", 9), &RatingKey::derive("rating"))
        .unwrap()
        .unwrap();
    assert_eq!((agg.score, agg.votes), (8, 8));
}

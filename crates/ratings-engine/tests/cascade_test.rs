//! Bulk purge and recompute of aggregates.

mod common;

use chrono::Utc;

use ratings_core::models::{Aggregate, VoteFilter};
use ratings_core::traits::IRatingStorage;

use common::*;

fn totals(h: &Harness, entity_id: i64) -> (i64, u64) {
    let agg = h.engine.aggregate(&article(entity_id), &rating()).unwrap();
    (agg.score, agg.votes)
}

#[test]
fn purging_an_ip_returns_aggregate_to_remaining_votes() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 2, &anon("127.0.0.1")).unwrap();
    h.engine.submit_vote(&article(1), &rating(), 2, &anon("127.0.0.2")).unwrap();
    assert_eq!(totals(&h, 1), (4, 2));

    let report = h.cascade.purge_ip_address(ip("127.0.0.1")).unwrap();
    assert_eq!(report.votes_deleted, 1);
    assert_eq!(report.entities, 1);
    assert_eq!(totals(&h, 1), (2, 1));
    assert_eq!(h.entities.cached(1, &rating()), Some((2, 1)));
}

#[test]
fn purge_covers_every_entity_and_key_the_ip_touched() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 1, &user(1, "10.0.0.1")).unwrap();
    h.engine.submit_vote(&article(1), &rating2(), 2, &user(1, "10.0.0.1")).unwrap();
    h.engine.submit_vote(&article(2), &rating(), 2, &user(1, "10.0.0.1")).unwrap();
    h.engine.submit_vote(&article(2), &rating(), 1, &user(2, "10.0.0.2")).unwrap();

    let report = h.cascade.purge_ip_address(ip("10.0.0.1")).unwrap();
    assert_eq!(report.votes_deleted, 3);
    assert_eq!(report.entities, 2);

    assert_eq!(totals(&h, 1), (0, 0));
    let agg2 = h.engine.aggregate(&article(1), &rating2()).unwrap();
    assert_eq!((agg2.score, agg2.votes), (0, 0));
    assert_eq!(totals(&h, 2), (1, 1));
    assert_eq!(h.entities.cached(2, &rating()), Some((1, 1)));
}

#[test]
fn purge_user_removes_only_their_votes() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 2, &user(5, "10.0.0.5")).unwrap();
    h.engine.submit_vote(&article(1), &rating(), 1, &anon("10.0.0.5")).unwrap();

    let report = h.cascade.purge_user(5).unwrap();
    assert_eq!(report.votes_deleted, 1);
    assert_eq!(totals(&h, 1), (1, 1));
}

#[test]
fn purge_with_no_matches_is_a_no_op() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 2, &anon("10.0.0.1")).unwrap();
    let report = h.cascade.purge_ip_address(ip("10.9.9.9")).unwrap();
    assert_eq!(report.votes_deleted, 0);
    assert_eq!(report.aggregates_recomputed, 0);
    assert_eq!(totals(&h, 1), (2, 1));
}

#[test]
fn recompute_after_external_delete() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 2, &anon("10.0.0.1")).unwrap();
    h.engine.submit_vote(&article(1), &rating(), 1, &anon("10.0.0.2")).unwrap();

    // Delete behind the engine's back; the aggregate goes stale.
    let mut deleted = Vec::new();
    h.storage
        .atomic(&mut |tx| {
            deleted = tx.delete_votes(&VoteFilter::by_ip(ip("10.0.0.2")))?;
            Ok(())
        })
        .unwrap();
    assert_eq!(totals(&h, 1), (3, 2));

    let report = h.cascade.recompute_after_delete(&deleted).unwrap();
    assert_eq!(report.entities, 1);
    assert_eq!(totals(&h, 1), (2, 1));

    // Re-running converges on the same totals.
    h.cascade.recompute_after_delete(&deleted).unwrap();
    assert_eq!(totals(&h, 1), (2, 1));
    assert!(h.cascade.recompute_after_delete(&[]).unwrap().entities == 0);
}

#[test]
fn recompute_entity_repairs_stale_aggregate() {
    let h = harness(0);
    h.engine.submit_vote(&article(4), &rating(), 2, &anon("10.0.0.1")).unwrap();
    h.storage
        .atomic(&mut |tx| {
            tx.put_aggregate(&Aggregate {
                entity: article(4),
                key: rating(),
                score: 40,
                votes: 9,
            })
        })
        .unwrap();

    let report = h.cascade.recompute_entity(&article(4)).unwrap();
    // Both registered attributes are rewritten.
    assert_eq!(report.aggregates_recomputed, 2);
    assert_eq!(totals(&h, 4), (2, 1));
    assert_eq!(h.entities.cached(4, &rating2()), Some((0, 0)));
}

#[test]
fn recompute_skips_cached_fields_of_removed_entities() {
    let h = harness(0);
    h.engine.submit_vote(&article(6), &rating(), 2, &anon("10.0.0.1")).unwrap();
    h.entities.remove(6);

    h.cascade.purge_ip_address(ip("10.0.0.1")).unwrap();
    assert_eq!(totals(&h, 6), (0, 0));
    // The last cached value written while the entity existed is untouched.
    assert_eq!(h.entities.cached(6, &rating()), Some((2, 1)));
}

#[test]
fn recompute_preserves_unrelated_vote_timestamps() {
    let h = harness(0);
    h.engine.submit_vote(&article(1), &rating(), 1, &anon("10.0.0.1")).unwrap();
    h.engine.submit_vote(&article(1), &rating(), 2, &anon("10.0.0.2")).unwrap();
    let before = h.storage.list_votes(&article(1), &rating()).unwrap();

    h.cascade.purge_ip_address(ip("10.0.0.1")).unwrap();
    let after = h.storage.list_votes(&article(1), &rating()).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0], before[1]);
    assert!(after[0].changed_at <= Utc::now());
}

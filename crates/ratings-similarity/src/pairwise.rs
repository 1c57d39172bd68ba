//! Pairwise agreement pass over user votes.

use std::collections::BTreeMap;

use ratings_core::config::SimilarityConfig;
use ratings_core::models::{EntityRef, RatingKey, SimilarityEdge, Vote};

/// Output of one pairwise pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairwiseResult {
    /// Similar pairs, both directions, ordered by (from, to).
    pub edges: Vec<SimilarityEdge>,
    /// Distinct unordered user pairs that co-rated at least one attribute.
    pub pairs_considered: usize,
}

/// Count agreements and disagreements for every pair of distinct users that
/// voted on the same (entity, key), and keep the pairs whose
/// `agrees / (disagrees + epsilon)` exceeds the threshold.
///
/// Anonymous votes are ignored. Counts are symmetric, so each similar pair
/// yields an edge in both directions.
pub fn compute_edges(votes: &[Vote], config: &SimilarityConfig) -> PairwiseResult {
    let mut groups: BTreeMap<(&EntityRef, &RatingKey), Vec<(i64, i64)>> = BTreeMap::new();
    for vote in votes {
        if let Some(user_id) = vote.user_id {
            groups
                .entry((&vote.entity, &vote.key))
                .or_default()
                .push((user_id, vote.score));
        }
    }

    // (low user, high user) -> (agrees, disagrees)
    let mut counts: BTreeMap<(i64, i64), (u64, u64)> = BTreeMap::new();
    for voters in groups.values() {
        for (i, &(u1, s1)) in voters.iter().enumerate() {
            for &(u2, s2) in &voters[i + 1..] {
                if u1 == u2 {
                    continue;
                }
                let pair = if u1 < u2 { (u1, u2) } else { (u2, u1) };
                let entry = counts.entry(pair).or_default();
                if config.agrees(s1, s2) {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }
    }

    let mut edges = Vec::new();
    for (&(low, high), &(agrees, disagrees)) in &counts {
        let forward = SimilarityEdge {
            from_user_id: low,
            to_user_id: high,
            agrees,
            disagrees,
            exclude: false,
        };
        if forward.is_similar(config.epsilon, config.threshold) {
            edges.push(SimilarityEdge {
                from_user_id: high,
                to_user_id: low,
                ..forward.clone()
            });
            edges.push(forward);
        }
    }
    edges.sort();

    PairwiseResult {
        edges,
        pairs_considered: counts.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn vote(user_id: Option<i64>, entity_id: i64, score: i64) -> Vote {
        Vote {
            id: 0,
            entity: EntityRef::new("article", entity_id),
            key: RatingKey::derive("rating"),
            score,
            user_id,
            ip_address: "10.0.0.1".parse().unwrap(),
            token: None,
            created_at: Utc::now(),
            changed_at: Utc::now(),
        }
    }

    /// Users 1 and 2 agree on `n` entities.
    fn agreeing(n: i64) -> Vec<Vote> {
        (1..=n)
            .flat_map(|e| [vote(Some(1), e, 2), vote(Some(2), e, 2)])
            .collect()
    }

    #[test]
    fn strength_must_exceed_threshold() {
        let config = SimilarityConfig::default();
        // No disagreements: the epsilon alone keeps the ratio finite.
        let result = compute_edges(&agreeing(3), &config);
        assert_eq!(result.pairs_considered, 1);
        assert_eq!(result.edges.len(), 2);
        assert_eq!(result.edges[0].from_user_id, 1);
        assert_eq!(result.edges[0].to_user_id, 2);
        assert_eq!(result.edges[0].agrees, 3);

        // 3 agreements against 1 disagreement: 3 / 1.0001 < 3.
        let mut votes = agreeing(3);
        votes.push(vote(Some(1), 9, 1));
        votes.push(vote(Some(2), 9, 2));
        assert!(compute_edges(&votes, &config).edges.is_empty());
    }

    #[test]
    fn equal_scores_agree() {
        let config = SimilarityConfig {
            threshold: 0.5,
            ..SimilarityConfig::default()
        };
        let votes = vec![vote(Some(1), 1, 1), vote(Some(2), 1, 1)];
        let edge = &compute_edges(&votes, &config).edges[0];
        assert_eq!((edge.agrees, edge.disagrees), (1, 0));
    }

    #[test]
    fn tolerance_widens_agreement() {
        let votes = vec![vote(Some(1), 1, 1), vote(Some(2), 1, 2)];
        let strict = SimilarityConfig {
            threshold: 0.0,
            ..SimilarityConfig::default()
        };
        assert!(compute_edges(&votes, &strict).edges.is_empty());

        let loose = SimilarityConfig {
            agreement_tolerance: 1,
            ..strict
        };
        assert_eq!(compute_edges(&votes, &loose).edges.len(), 2);
    }

    #[test]
    fn anonymous_votes_and_single_voters_are_ignored() {
        let votes = vec![
            vote(None, 1, 2),
            vote(Some(1), 1, 2),
            vote(Some(3), 2, 2),
        ];
        let result = compute_edges(&votes, &SimilarityConfig::default());
        assert_eq!(result.pairs_considered, 0);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn keys_are_compared_separately() {
        let mut votes = agreeing(2);
        let mut other_key = vote(Some(1), 1, 2);
        other_key.key = RatingKey::derive("rating2");
        votes.push(other_key);
        let result = compute_edges(&votes, &SimilarityConfig::default());
        // The rating2 vote has no co-voter, so only two agreements count.
        assert!(result.edges.iter().all(|e| e.agrees == 2));
    }
}

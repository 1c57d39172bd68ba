//! RatingEngine: vote submission, per-identity lookup and rating read-outs.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use ratings_core::config::{RatingAttribute, RatingsConfig};
use ratings_core::constants::{MAX_UNIQUE_RETRIES, RETRACTION_SCORE};
use ratings_core::errors::{RatingError, RatingsResult, StorageError};
use ratings_core::models::{
    parse_score, Aggregate, EntityRef, NewVote, RatingKey, Vote, VoteChange, VoteOutcome,
    VoterContext, VoterIdentity,
};
use ratings_core::traits::{EntityResolver, IRatingStorage};

use crate::registry::EntityRegistry;
use crate::summary::RatingSummary;

/// Applies votes to the vote store and keeps the running aggregate in
/// lock-step with them.
///
/// Stateless between calls: everything it needs is the attribute
/// configuration from the registry, the caller's identity and the storage
/// handle.
pub struct RatingEngine {
    storage: Arc<dyn IRatingStorage>,
    registry: Arc<EntityRegistry>,
    config: RatingsConfig,
}

impl RatingEngine {
    pub fn new(
        storage: Arc<dyn IRatingStorage>,
        registry: Arc<EntityRegistry>,
        config: RatingsConfig,
    ) -> Self {
        Self {
            storage,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &RatingsConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Submit `score` for `key` on `entity` as `voter`.
    ///
    /// A score of 0 retracts the voter's existing vote. The vote write, the
    /// aggregate update and the resolver's cached-field save happen in one
    /// atomic unit.
    pub fn submit_vote(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        score: i64,
        voter: &VoterContext,
    ) -> RatingsResult<VoteOutcome> {
        let attribute = self.registry.attribute(&entity.entity_type, key)?;

        if !(0..=attribute.range).contains(&score) {
            return Err(RatingError::InvalidRating {
                score: score.to_string(),
                range: attribute.range,
            }
            .into());
        }
        let retract = score == RETRACTION_SCORE;
        if retract && !attribute.allow_delete {
            return Err(RatingError::RetractionNotAllowed {
                key: key.to_string(),
            }
            .into());
        }

        let resolver = self.registry.resolve(entity)?;

        let mut identity = voter.resolve(attribute.use_anonymous_token);
        if identity.is_anonymous() && !attribute.allow_anonymous {
            return Err(RatingError::AuthRequired {
                key: key.to_string(),
            }
            .into());
        }
        if attribute.use_anonymous_token && !retract {
            if let VoterIdentity::Anonymous {
                token: token @ None, ..
            } = &mut identity
            {
                *token = Some(crate::token::mint_token());
            }
        }

        let mut attempt = 0;
        let (change, aggregate, previous_score) = loop {
            match self.apply_vote(attribute, resolver, entity, score, &identity, voter.ip_address) {
                Err(err) if err.is_unique_violation() && attempt < MAX_UNIQUE_RETRIES => {
                    attempt += 1;
                    warn!(
                        entity = %entity,
                        voter = %identity,
                        attempt,
                        "concurrent vote insert lost the race, retrying as an update"
                    );
                }
                other => break other?,
            }
        };

        info!(
            entity = %entity,
            attribute = %attribute.name,
            voter = %identity,
            change = ?change,
            score = aggregate.score,
            votes = aggregate.votes,
            "vote applied"
        );

        let token = if attribute.use_anonymous_token {
            identity.token().map(str::to_string)
        } else {
            None
        };
        Ok(VoteOutcome {
            change,
            aggregate,
            previous_score,
            token,
        })
    }

    /// Parse raw client input and submit it.
    pub fn submit_raw(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        raw_score: &str,
        voter: &VoterContext,
    ) -> RatingsResult<VoteOutcome> {
        let range = self.registry.attribute(&entity.entity_type, key)?.range;
        let score = parse_score(raw_score, range)?;
        self.submit_vote(entity, key, score, voter)
    }

    /// One attempt at the read-decide-write unit.
    fn apply_vote(
        &self,
        attribute: &RatingAttribute,
        resolver: &dyn EntityResolver,
        entity: &EntityRef,
        score: i64,
        identity: &VoterIdentity,
        ip_address: IpAddr,
    ) -> RatingsResult<(VoteChange, Aggregate, Option<i64>)> {
        let key = &attribute.key;
        let retract = score == RETRACTION_SCORE;
        let cap = self.config.per_ip_vote_cap;
        let now = Utc::now();
        let mut applied = None;

        self.storage.atomic(&mut |tx| {
            let existing = tx.find_vote(entity, key, identity)?;

            let (change, previous, score_delta, votes_delta) = match existing {
                None if retract => {
                    return Err(RatingError::VoteNotFound {
                        key: key.to_string(),
                    }
                    .into());
                }
                None => {
                    if cap > 0 {
                        let held = tx.count_votes_from_ip(entity, key, &ip_address)?;
                        if held >= cap {
                            return Err(RatingError::IpLimitReached { ip_address, cap }.into());
                        }
                    }
                    tx.insert_vote(
                        &NewVote {
                            entity: entity.clone(),
                            key: key.clone(),
                            score,
                            identity: identity.clone(),
                            ip_address,
                        },
                        now,
                    )?;
                    (VoteChange::Added, None, score, 1)
                }
                Some(_) if !attribute.can_change_vote => {
                    return Err(RatingError::CannotChangeVote {
                        key: key.to_string(),
                    }
                    .into());
                }
                Some(vote) if retract => {
                    tx.delete_vote(vote.id)?;
                    (VoteChange::Retracted, Some(vote.score), -vote.score, -1)
                }
                Some(vote) => {
                    tx.update_vote_score(vote.id, score, now)?;
                    (VoteChange::Changed, Some(vote.score), score - vote.score, 0)
                }
            };

            let aggregate = tx.apply_aggregate_delta(entity, key, score_delta, votes_delta)?;
            resolver.store_cached(&aggregate)?;
            applied = Some((change, aggregate, previous));
            Ok(())
        })?;

        applied.ok_or_else(|| {
            StorageError::Sqlite {
                message: "vote transaction committed without an outcome".to_string(),
            }
            .into()
        })
    }

    /// The score `voter` currently holds for `key` on `entity`, if any.
    pub fn query_vote_for_identity(
        &self,
        entity: &EntityRef,
        key: &RatingKey,
        voter: &VoterContext,
    ) -> RatingsResult<Option<i64>> {
        let attribute = self.registry.attribute(&entity.entity_type, key)?;
        let identity = voter.resolve(attribute.use_anonymous_token);
        let vote = self.storage.get_vote(entity, key, &identity)?;
        debug!(entity = %entity, voter = %identity, found = vote.is_some(), "vote lookup");
        Ok(vote.map(|v| v.score))
    }

    /// Current aggregate; zeroed if nobody has voted yet.
    pub fn aggregate(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Aggregate> {
        self.registry.attribute(&entity.entity_type, key)?;
        Ok(self
            .storage
            .get_aggregate(entity, key)?
            .unwrap_or_else(|| Aggregate::empty(entity.clone(), key.clone())))
    }

    /// `score / (votes + weight)` for the attribute.
    pub fn weighted_rating(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<f64> {
        Ok(self.summary(entity, key)?.weighted)
    }

    /// `score / votes` for the attribute.
    pub fn raw_rating(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<f64> {
        Ok(self.summary(entity, key)?.raw)
    }

    pub fn percent(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<f64> {
        Ok(self.summary(entity, key)?.percent)
    }

    pub fn real_percent(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<f64> {
        Ok(self.summary(entity, key)?.real_percent)
    }

    pub fn opinion_percent(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<f64> {
        Ok(self.summary(entity, key)?.opinion_percent)
    }

    /// Every read-out for one attribute in one go.
    pub fn summary(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<RatingSummary> {
        let attribute = self.registry.attribute(&entity.entity_type, key)?;
        let aggregate = self
            .storage
            .get_aggregate(entity, key)?
            .unwrap_or_else(|| Aggregate::empty(entity.clone(), key.clone()));
        Ok(RatingSummary::new(attribute, &aggregate))
    }

    /// All votes on one attribute, oldest first.
    pub fn list_votes(&self, entity: &EntityRef, key: &RatingKey) -> RatingsResult<Vec<Vote>> {
        self.registry.attribute(&entity.entity_type, key)?;
        self.storage.list_votes(entity, key)
    }
}

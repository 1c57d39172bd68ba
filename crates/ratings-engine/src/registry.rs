//! EntityRegistry: type tag → (rating attributes, resolver).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ratings_core::config::RatingAttribute;
use ratings_core::errors::{RatingError, RatingsResult};
use ratings_core::models::{EntityRef, RatingKey};
use ratings_core::traits::EntityResolver;

struct Registration {
    attributes: Vec<RatingAttribute>,
    resolver: Arc<dyn EntityResolver>,
}

/// Registered rateable entity types.
///
/// Built once at startup and shared read-only by the engines.
#[derive(Default)]
pub struct EntityRegistry {
    types: HashMap<String, Registration>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity_type` with its resolver and rating attributes.
    /// Registering the same tag again replaces the earlier registration.
    pub fn register(
        &mut self,
        entity_type: impl Into<String>,
        resolver: Arc<dyn EntityResolver>,
        attributes: Vec<RatingAttribute>,
    ) -> &mut Self {
        let entity_type = entity_type.into();
        tracing::debug!(entity_type = %entity_type, attributes = attributes.len(), "entity type registered");
        self.types.insert(
            entity_type,
            Registration {
                attributes,
                resolver,
            },
        );
        self
    }

    /// Whether `entity_type` has been registered, with or without attributes.
    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }

    /// Rating attributes of `entity_type`; empty if the type is unknown.
    pub fn attributes(&self, entity_type: &str) -> &[RatingAttribute] {
        self.types
            .get(entity_type)
            .map(|r| r.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// The attribute with `key` on `entity_type`.
    pub fn attribute(&self, entity_type: &str, key: &RatingKey) -> RatingsResult<&RatingAttribute> {
        self.attributes(entity_type)
            .iter()
            .find(|a| &a.key == key)
            .ok_or_else(|| {
                RatingError::UnknownRatingKey {
                    entity_type: entity_type.to_string(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    /// Look an attribute up by its field name.
    pub fn attribute_by_name(&self, entity_type: &str, name: &str) -> RatingsResult<&RatingAttribute> {
        self.attributes(entity_type)
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| {
                RatingError::UnknownRatingKey {
                    entity_type: entity_type.to_string(),
                    key: name.to_string(),
                }
                .into()
            })
    }

    /// Resolve `entity` to its type's resolver, failing with `EntityNotFound`
    /// when the type is unregistered or the resolver doesn't know the id.
    pub fn resolve(&self, entity: &EntityRef) -> RatingsResult<&dyn EntityResolver> {
        let not_found = || RatingError::EntityNotFound {
            entity: entity.clone(),
        };
        let registration = self.types.get(&entity.entity_type).ok_or_else(not_found)?;
        if !registration.resolver.exists(entity.entity_id)? {
            return Err(not_found().into());
        }
        Ok(registration.resolver.as_ref())
    }

    /// The resolver for `entity` if the type is registered and the entity
    /// still exists; `None` otherwise.
    pub fn try_resolve(&self, entity: &EntityRef) -> RatingsResult<Option<&dyn EntityResolver>> {
        match self.types.get(&entity.entity_type) {
            Some(registration) if registration.resolver.exists(entity.entity_id)? => {
                Ok(Some(registration.resolver.as_ref()))
            }
            _ => Ok(None),
        }
    }
}

impl fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.types.keys().collect();
        types.sort();
        f.debug_struct("EntityRegistry").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratings_core::config::AttributeDefaults;
    use ratings_core::errors::RatingsError;

    struct Ids(Vec<i64>);

    impl EntityResolver for Ids {
        fn exists(&self, entity_id: i64) -> RatingsResult<bool> {
            Ok(self.0.contains(&entity_id))
        }
    }

    fn registry() -> EntityRegistry {
        let defaults = AttributeDefaults::default();
        let mut registry = EntityRegistry::new();
        registry.register(
            "article",
            Arc::new(Ids(vec![1, 2])),
            vec![
                RatingAttribute::from_defaults("rating", &defaults),
                RatingAttribute::from_defaults("rating2", &defaults).with_range(5),
            ],
        );
        registry
    }

    #[test]
    fn attribute_lookup_by_key_and_name() {
        let registry = registry();
        let attr = registry
            .attribute("article", &RatingKey::derive("rating2"))
            .unwrap();
        assert_eq!(attr.range, 5);
        assert_eq!(registry.attribute_by_name("article", "rating").unwrap().range, 2);
    }

    #[test]
    fn unknown_key_is_reported() {
        let err = registry()
            .attribute("article", &RatingKey::new("nope"))
            .unwrap_err();
        assert!(matches!(
            err,
            RatingsError::Rating(RatingError::UnknownRatingKey { .. })
        ));
        assert!(registry().attributes("photo").is_empty());
    }

    #[test]
    fn registration_is_per_type_tag() {
        let mut registry = registry();
        assert!(registry.is_registered("article"));
        assert!(!registry.is_registered("photo"));

        registry.register("photo", Arc::new(Ids(vec![])), Vec::new());
        assert!(registry.is_registered("photo"));
        assert!(registry.attributes("photo").is_empty());
    }

    #[test]
    fn resolve_checks_type_and_id() {
        let registry = registry();
        assert!(registry.resolve(&EntityRef::new("article", 1)).is_ok());

        for missing in [EntityRef::new("article", 3), EntityRef::new("photo", 1)] {
            let err = registry.resolve(&missing).err().expect("expected resolve to fail");
            assert_eq!(
                err.as_rating(),
                Some(&RatingError::EntityNotFound { entity: missing })
            );
        }
        assert!(registry
            .try_resolve(&EntityRef::new("article", 3))
            .unwrap()
            .is_none());
    }
}

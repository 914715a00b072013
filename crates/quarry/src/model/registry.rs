use super::{Entity, Model, ModelOption};
use crate::error::OrmResult;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Concurrency-safe cache of parsed models, keyed by type.
///
/// Lookups take the read lock only; a miss upgrades to the write lock and
/// re-checks before parsing, so each type is parsed at most once.
#[derive(Debug, Default)]
pub struct Registry {
    models: RwLock<HashMap<TypeId, Arc<Model>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached model for `T`, parsing it on first use.
    pub fn get<T: Entity>(&self) -> OrmResult<Arc<Model>> {
        let key = TypeId::of::<T>();
        if let Some(model) = self.cached(key) {
            return Ok(model);
        }

        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(Model::parse::<T>()?);
        tracing::debug!(
            target: "quarry.model",
            entity = type_name::<T>(),
            table = %model.table_name,
            fields = model.fields.len(),
            "parsed model"
        );
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Parse and cache `T`, applying `opts` to the fresh model.
    ///
    /// Options only take effect when `T` is not cached yet; an already cached
    /// model is returned unchanged.
    pub fn register<T, I>(&self, opts: I) -> OrmResult<Arc<Model>>
    where
        T: Entity,
        I: IntoIterator<Item = ModelOption>,
    {
        let key = TypeId::of::<T>();
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }

        let mut model = Model::parse::<T>()?;
        for opt in opts {
            opt.apply(&mut model)?;
        }
        let model = Arc::new(model);
        tracing::debug!(
            target: "quarry.model",
            entity = type_name::<T>(),
            table = %model.table_name,
            "registered model"
        );
        models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Number of cached models.
    pub fn len(&self) -> usize {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: TypeId) -> Option<Arc<Model>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }
}

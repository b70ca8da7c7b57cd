//! Relation linking: entity resolution, type-hierarchy expansion, constraint
//! matching, semantic ranking and final selection.

pub mod constraints;
pub mod hierarchy;
pub mod rank;
pub mod resolve;
pub mod select;

pub use rank::{ChannelRankings, RankedCandidate};
pub use select::RelationSelection;

use std::sync::Arc;

use crate::cache::SuperclassCache;
use crate::config::LinkingConfig;
use crate::embeddings::TextEmbedder;
use crate::tables::{ConstraintTable, PropertyTable};
use crate::wikidata::QueryService;

/// Tunables for one linking run.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub top_k: usize,
    pub max_depth: usize,
    pub similarity_threshold: f32,
    pub language: String,
    pub search_limit: usize,
    pub superclass_cache_capacity: usize,
}

impl LinkOptions {
    pub fn from_config(config: &LinkingConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_depth: config.max_depth,
            similarity_threshold: config.similarity_threshold,
            language: config.language.clone(),
            search_limit: config.search_limit,
            superclass_cache_capacity: config.superclass_cache_capacity,
        }
    }
}

/// Everything a linking call needs, built once at startup and passed by
/// reference into every component. Tables are read-only after construction;
/// the superclass cache is the only cross-call state.
pub struct LinkContext {
    pub service: Arc<dyn QueryService>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub properties: PropertyTable,
    pub constraints: ConstraintTable,
    pub options: LinkOptions,
    pub superclass_cache: SuperclassCache,
}

impl LinkContext {
    pub fn new(
        service: Arc<dyn QueryService>,
        embedder: Arc<dyn TextEmbedder>,
        properties: PropertyTable,
        constraints: ConstraintTable,
        options: LinkOptions,
    ) -> Self {
        let superclass_cache = SuperclassCache::new(options.superclass_cache_capacity);
        Self {
            service,
            embedder,
            properties,
            constraints,
            options,
            superclass_cache,
        }
    }
}

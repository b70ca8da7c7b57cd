//! Wikidata access: SPARQL result model, query builders and the retrying
//! HTTP client behind the [`QueryService`] seam.

mod client;
pub mod queries;

pub use client::WikidataClient;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::Result;

/// Decoded SPARQL JSON result set.
#[derive(Debug, Clone, Deserialize)]
pub struct SparqlResponse {
    pub results: SparqlResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparqlResults {
    pub bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SparqlValue {
    pub value: String,
}

impl SparqlResponse {
    /// Collect the values bound to `var` across all rows, IRI prefixes trimmed.
    pub fn values_of(&self, var: &str) -> Vec<String> {
        self.results
            .bindings
            .iter()
            .filter_map(|row| row.get(var))
            .map(|v| trim_iri(&v.value).to_string())
            .collect()
    }
}

/// A ranked hit from the entity-search API; label may be absent for
/// label-less items.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub label: Option<String>,
}

/// A search candidate enriched with canonical label and aliases via the
/// batched entity lookup. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct EntityCandidate {
    pub id: String,
    pub label: Option<String>,
    pub aliases: Vec<String>,
}

/// Access to the graph endpoint and the entity-search API.
///
/// One trait for both services so the resolver and expander take a single
/// collaborator, and tests substitute doubles with call counters.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Run a SPARQL query. `rotating_agent` selects a random identity from
    /// the configured pool instead of the stable one.
    async fn run_sparql(&self, query: &str, rotating_agent: bool) -> Result<SparqlResponse>;

    /// Free-text entity search, ranked by the service.
    async fn search_entities(
        &self,
        term: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Batched label/alias lookup for a list of entity identifiers.
    async fn fetch_entities(&self, ids: &[String], language: &str)
        -> Result<Vec<EntityCandidate>>;
}

/// Last path segment of an entity IRI; identifiers in SPARQL bindings arrive
/// as full IRIs like `http://www.wikidata.org/entity/Q42`.
pub fn trim_iri(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

/// Full entity IRI for a bare identifier.
pub fn entity_iri(qid: &str) -> String {
    format!("http://www.wikidata.org/entity/{}", qid)
}

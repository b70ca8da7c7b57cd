//! Retrying HTTP client for the SPARQL endpoint and the entity-search API.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::WikidataConfig;
use crate::error::{KglinkError, Result};
use crate::retry::RetryPolicy;
use crate::wikidata::{EntityCandidate, QueryService, SearchHit, SparqlResponse};

/// HTTP client for Wikidata with bounded-timeout requests and linear-backoff
/// retries. Bulk SPARQL calls may rotate the client identity to reduce
/// throttling; resolution calls keep the stable one.
pub struct WikidataClient {
    http: Client,
    sparql_url: String,
    api_url: String,
    user_agent: String,
    rotating_user_agents: Vec<String>,
    policy: RetryPolicy,
}

impl WikidataClient {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(config: &WikidataConfig) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            sparql_url: config.sparql_url.clone(),
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
            rotating_user_agents: config.rotating_user_agents.clone(),
            policy: RetryPolicy::new(
                config.max_retries,
                std::time::Duration::from_secs(config.base_delay_secs),
            ),
        }
    }

    /// Identity header for one logical request. A random pool entry when
    /// rotation is requested and the pool is non-empty, the stable identity
    /// otherwise.
    fn agent(&self, rotating: bool) -> &str {
        if rotating {
            if let Some(agent) = self.rotating_user_agents.choose(&mut rand::thread_rng()) {
                return agent;
            }
        }
        &self.user_agent
    }

    /// One GET with retries; the decoded JSON body on success.
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        rotating: bool,
    ) -> Result<serde_json::Value> {
        let agent = self.agent(rotating).to_string();
        self.policy
            .run("wikidata request", || self.try_get(url, params, &agent))
            .await
    }

    async fn try_get(
        &self,
        url: &str,
        params: &[(&str, String)],
        agent: &str,
    ) -> Result<serde_json::Value> {
        let response = self
            .http
            .get(url)
            .query(params)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, agent)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<RawSearchHit>,
}

#[derive(Deserialize)]
struct RawSearchHit {
    id: String,
    label: Option<String>,
}

#[derive(Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, RawEntity>,
}

#[derive(Deserialize)]
struct RawEntity {
    #[serde(default)]
    labels: HashMap<String, TermValue>,
    #[serde(default)]
    aliases: HashMap<String, Vec<TermValue>>,
}

#[derive(Deserialize)]
struct TermValue {
    value: String,
}

#[async_trait]
impl QueryService for WikidataClient {
    async fn run_sparql(&self, query: &str, rotating_agent: bool) -> Result<SparqlResponse> {
        let params = [
            ("query", query.to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.get_json(&self.sparql_url, &params, rotating_agent).await?;
        serde_json::from_value(body)
            .map_err(|e| KglinkError::Parse(format!("SPARQL response: {}", e)))
    }

    async fn search_entities(
        &self,
        term: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        log::debug!("Searching entities for mention: {}", term);
        let params = [
            ("action", "wbsearchentities".to_string()),
            ("search", term.to_string()),
            ("language", language.to_string()),
            ("limit", limit.to_string()),
            ("type", "item".to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.get_json(&self.api_url, &params, false).await?;
        let decoded: SearchResponse = serde_json::from_value(body)
            .map_err(|e| KglinkError::Parse(format!("entity search response: {}", e)))?;

        Ok(decoded
            .search
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                label: hit.label,
            })
            .collect())
    }

    async fn fetch_entities(
        &self,
        ids: &[String],
        language: &str,
    ) -> Result<Vec<EntityCandidate>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("action", "wbgetentities".to_string()),
            ("ids", ids.join("|")),
            ("props", "labels|aliases".to_string()),
            ("languages", language.to_string()),
            ("format", "json".to_string()),
        ];
        let body = self.get_json(&self.api_url, &params, false).await?;
        let mut decoded: EntitiesResponse = serde_json::from_value(body)
            .map_err(|e| KglinkError::Parse(format!("entity lookup response: {}", e)))?;

        // Preserve the search ranking: emit candidates in input-id order.
        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = decoded.entities.remove(id) {
                candidates.push(EntityCandidate {
                    id: id.clone(),
                    label: entity
                        .labels
                        .get(language)
                        .map(|term| term.value.clone()),
                    aliases: entity
                        .aliases
                        .get(language)
                        .map(|terms| terms.iter().map(|t| t.value.clone()).collect())
                        .unwrap_or_default(),
                });
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WikidataConfig {
        WikidataConfig {
            sparql_url: "https://query.wikidata.org/sparql".to_string(),
            api_url: "https://www.wikidata.org/w/api.php".to_string(),
            timeout_secs: 5,
            max_retries: 2,
            base_delay_secs: 1,
            user_agent: "kglink-test/0.1".to_string(),
            rotating_user_agents: vec!["pool-a".to_string(), "pool-b".to_string()],
        }
    }

    #[test]
    fn test_stable_agent_for_resolution_calls() {
        let client = WikidataClient::new(&test_config());
        assert_eq!(client.agent(false), "kglink-test/0.1");
    }

    #[test]
    fn test_rotating_agent_drawn_from_pool() {
        let client = WikidataClient::new(&test_config());
        let agent = client.agent(true).to_string();
        assert!(agent == "pool-a" || agent == "pool-b");
    }

    #[test]
    fn test_rotating_agent_empty_pool_falls_back() {
        let mut config = test_config();
        config.rotating_user_agents.clear();
        let client = WikidataClient::new(&config);
        assert_eq!(client.agent(true), "kglink-test/0.1");
    }

    #[test]
    fn test_search_response_decoding() {
        let body = serde_json::json!({
            "search": [
                {"id": "Q7186", "label": "Marie Curie"},
                {"id": "Q12345"}
            ]
        });
        let decoded: SearchResponse = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.search.len(), 2);
        assert_eq!(decoded.search[0].label.as_deref(), Some("Marie Curie"));
        assert!(decoded.search[1].label.is_none());
    }

    #[test]
    fn test_entities_response_decoding() {
        let body = serde_json::json!({
            "entities": {
                "Q7186": {
                    "labels": {"en": {"value": "Marie Curie"}},
                    "aliases": {"en": [{"value": "Maria Sklodowska"}]}
                }
            }
        });
        let decoded: EntitiesResponse = serde_json::from_value(body).unwrap();
        let entity = decoded.entities.get("Q7186").unwrap();
        assert_eq!(entity.labels.get("en").unwrap().value, "Marie Curie");
        assert_eq!(entity.aliases.get("en").unwrap()[0].value, "Maria Sklodowska");
    }
}

//! Type-hierarchy expansion through the graph store.
//!
//! Each level issues one batched superclass query for the whole frontier;
//! the cumulative visited set makes cyclic hierarchies safe.

use std::collections::HashSet;

use crate::error::Result;
use crate::link::LinkContext;
use crate::wikidata::queries;

/// Direct types of an entity (instance-of edges).
pub async fn direct_types(ctx: &LinkContext, entity_id: &str) -> Result<HashSet<String>> {
    log::debug!("Fetching direct types for {}", entity_id);
    let query = queries::build_class_query(entity_id);
    let response = ctx.service.run_sparql(&query, false).await?;
    Ok(response.values_of("class").into_iter().collect())
}

/// All type identifiers reachable within `max_depth` subclass-of edges of
/// `entity_id`. Terminates early when a level discovers nothing new.
pub async fn expand_superclasses(
    ctx: &LinkContext,
    entity_id: &str,
    max_depth: usize,
) -> Result<HashSet<String>> {
    let mut discovered: HashSet<String> = HashSet::new();
    if max_depth == 0 {
        return Ok(discovered);
    }

    let start = vec![entity_id.to_string()];
    let mut frontier: Vec<String> = frontier_superclasses(ctx, &start)
        .await?
        .into_iter()
        .collect();
    discovered.extend(frontier.iter().cloned());

    let mut depth = 1;
    while depth < max_depth && !frontier.is_empty() {
        let found = frontier_superclasses(ctx, &frontier).await?;
        // Subtracting the visited set is the cycle-safety invariant.
        let new_nodes: Vec<String> = found
            .into_iter()
            .filter(|node| !discovered.contains(node))
            .collect();
        if new_nodes.is_empty() {
            break;
        }
        discovered.extend(new_nodes.iter().cloned());
        frontier = new_nodes;
        depth += 1;
    }

    log::info!(
        "{}: {} superclasses within {} levels",
        entity_id,
        discovered.len(),
        max_depth
    );
    Ok(discovered)
}

/// Superclasses of a whole frontier via one batched query, memoized for the
/// process lifetime. Members of the input frontier are never re-admitted.
async fn frontier_superclasses(
    ctx: &LinkContext,
    frontier: &[String],
) -> Result<HashSet<String>> {
    if frontier.is_empty() {
        return Ok(HashSet::new());
    }

    if let Some(memoized) = ctx.superclass_cache.get(frontier) {
        log::debug!("Superclass cache hit for frontier of {}", frontier.len());
        return Ok(memoized);
    }

    // Sort for deterministic query text regardless of set iteration order.
    let mut ids = frontier.to_vec();
    ids.sort_unstable();
    let query = queries::build_superclass_query(&ids);
    let response = ctx.service.run_sparql(&query, true).await?;

    let input: HashSet<&str> = frontier.iter().map(String::as_str).collect();
    let superclasses: HashSet<String> = response
        .values_of("superclass")
        .into_iter()
        .filter(|node| !input.contains(node.as_str()))
        .collect();

    ctx.superclass_cache.put(frontier, superclasses.clone());
    Ok(superclasses)
}

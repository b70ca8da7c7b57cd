//! Entity resolution: map a surface mention to a knowledge-graph identifier.
//!
//! Exact label/alias agreement short-circuits before any embedding work; the
//! semantic fallback ranks the remaining candidates by alias then label
//! similarity and applies the acceptance threshold.

use std::cmp::Ordering;

use crate::embeddings::dot;
use crate::error::Result;
use crate::link::LinkContext;
use crate::wikidata::EntityCandidate;

/// Resolve a mention to an entity identifier, or `None` when no candidate
/// clears the similarity threshold ("entity unknown", not an error).
pub async fn resolve_entity(ctx: &LinkContext, mention: &str) -> Result<Option<String>> {
    log::info!("Resolving entity mention: {}", mention);

    let hits = ctx
        .service
        .search_entities(mention, &ctx.options.language, ctx.options.search_limit)
        .await?;
    if hits.is_empty() {
        log::warn!("No search candidates for mention: {}", mention);
        return Ok(None);
    }

    let ids: Vec<String> = hits.into_iter().map(|hit| hit.id).collect();
    let candidates = ctx.service.fetch_entities(&ids, &ctx.options.language).await?;

    // Exact lexical agreement is the strongest evidence and skips the
    // expensive embedding path entirely.
    let needle = normalize(mention);
    for candidate in &candidates {
        if matches_exactly(candidate, &needle) {
            log::info!("Exact match for '{}': {}", mention, candidate.id);
            return Ok(Some(candidate.id.clone()));
        }
    }

    semantic_fallback(ctx, mention, &candidates).await
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn matches_exactly(candidate: &EntityCandidate, needle: &str) -> bool {
    if let Some(label) = &candidate.label {
        if normalize(label) == needle {
            return true;
        }
    }
    candidate.aliases.iter().any(|alias| normalize(alias) == needle)
}

/// Rank candidates by (alias similarity, label similarity) descending and
/// gate the top one on the configured threshold. Candidates with strong alias
/// agreement are promoted in the sort key, but once aliases exist acceptance
/// requires the mean of both signals to clear the threshold.
async fn semantic_fallback(
    ctx: &LinkContext,
    mention: &str,
    candidates: &[EntityCandidate],
) -> Result<Option<String>> {
    let mention_emb = ctx.embedder.embed(mention).await?;

    let mut scored: Vec<(f32, f32, &EntityCandidate)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let label_sim = match &candidate.label {
            Some(label) => dot(&mention_emb, &ctx.embedder.embed(label).await?),
            None => 0.0,
        };
        let alias_sim = if candidate.aliases.is_empty() {
            0.0
        } else {
            let alias_embs = ctx.embedder.embed_batch(&candidate.aliases).await?;
            let total: f32 = alias_embs.iter().map(|emb| dot(&mention_emb, emb)).sum();
            total / alias_embs.len() as f32
        };
        scored.push((alias_sim, label_sim, candidate));
    }

    scored.sort_by(|a, b| {
        (b.0, b.1)
            .partial_cmp(&(a.0, a.1))
            .unwrap_or(Ordering::Equal)
    });

    let Some(&(alias_sim, label_sim, top)) = scored.first() else {
        return Ok(None);
    };

    let threshold = ctx.options.similarity_threshold;
    let accepted = if top.aliases.is_empty() {
        label_sim >= threshold
    } else {
        (label_sim + alias_sim) / 2.0 >= threshold
    };

    if accepted {
        log::info!(
            "Resolved '{}' to {} (label {:.3}, alias {:.3})",
            mention,
            top.id,
            label_sim,
            alias_sim
        );
        Ok(Some(top.id.clone()))
    } else {
        log::warn!(
            "Best candidate {} for '{}' below threshold (label {:.3}, alias {:.3})",
            top.id,
            mention,
            label_sim,
            alias_sim
        );
        Ok(None)
    }
}

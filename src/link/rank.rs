//! Semantic ranking of the property vocabulary along four channels.
//!
//! All table embeddings and embedder output are pre-normalized, so cosine
//! similarity is a plain dot product.

use std::cmp::Ordering;

use crate::embeddings::dot;
use crate::error::Result;
use crate::link::LinkContext;

/// A (property, score) pair from one ranking channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub property_id: String,
    pub score: f32,
}

/// Top-K candidates per channel, each sorted by score descending.
#[derive(Debug, Clone, Default)]
pub struct ChannelRankings {
    /// predicate text vs. property labels
    pub by_label: Vec<RankedCandidate>,
    /// full clause vs. property descriptions
    pub by_description: Vec<RankedCandidate>,
    /// full clause vs. exemplar statements (max per property)
    pub by_statements: Vec<RankedCandidate>,
    /// predicate text vs. property aliases (max per property)
    pub by_aliases: Vec<RankedCandidate>,
}

impl ChannelRankings {
    /// All candidates in fixed channel order: label, description, statement,
    /// alias. A property may appear more than once when several channels
    /// favor it.
    pub fn pooled(&self) -> impl Iterator<Item = &RankedCandidate> {
        self.by_label
            .iter()
            .chain(self.by_description.iter())
            .chain(self.by_statements.iter())
            .chain(self.by_aliases.iter())
    }
}

/// Score every property against the mention along the four channels and keep
/// the top-K of each. Properties without alias or exemplar embeddings are
/// excluded from those channels, not scored as zero.
pub async fn rank_properties(
    ctx: &LinkContext,
    clause: &str,
    predicate: &str,
) -> Result<ChannelRankings> {
    log::info!("Ranking candidate properties for predicate: {}", predicate);

    let clause_emb = ctx.embedder.embed(clause).await?;
    let predicate_emb = ctx.embedder.embed(predicate).await?;
    let top_k = ctx.options.top_k;

    let by_label = top_channel(
        ctx.properties
            .iter()
            .map(|p| (p.id.as_str(), dot(&predicate_emb, &p.label_embedding))),
        top_k,
    );

    let by_description = top_channel(
        ctx.properties
            .iter()
            .map(|p| (p.id.as_str(), dot(&clause_emb, &p.description_embedding))),
        top_k,
    );

    let by_statements = top_channel(
        ctx.constraints.iter().filter_map(|c| {
            c.statements_embedding
                .as_deref()
                .filter(|embs| !embs.is_empty())
                .map(|embs| (c.id.as_str(), max_similarity(&clause_emb, embs)))
        }),
        top_k,
    );

    let by_aliases = top_channel(
        ctx.properties.iter().filter_map(|p| {
            p.aliases_embedding
                .as_deref()
                .filter(|embs| !embs.is_empty())
                .map(|embs| (p.id.as_str(), max_similarity(&predicate_emb, embs)))
        }),
        top_k,
    );

    Ok(ChannelRankings {
        by_label,
        by_description,
        by_statements,
        by_aliases,
    })
}

fn max_similarity(query: &[f32], embeddings: &[Vec<f32>]) -> f32 {
    embeddings
        .iter()
        .map(|emb| dot(query, emb))
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Sort descending and truncate. The sort is stable, so equal scores keep
/// first-seen table order.
fn top_channel<'a>(
    scored: impl Iterator<Item = (&'a str, f32)>,
    top_k: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = scored
        .map(|(id, score)| RankedCandidate {
            property_id: id.to_string(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked.truncate(top_k);
    ranked
}

//! Final relation selection for one subject/predicate/object triple.

use crate::error::Result;
use crate::link::constraints::match_properties;
use crate::link::rank::rank_properties;
use crate::link::LinkContext;

/// Outcome of selecting a relation for one triple.
#[derive(Debug, Clone)]
pub struct RelationSelection {
    /// Highest-scoring property across all channels, if any channel produced
    /// candidates.
    pub property_id: Option<String>,
    /// Type-compatible properties, returned as auxiliary evidence. This set
    /// never gates the embedding-based choice.
    pub constraint_matches: Vec<String>,
}

/// Rank the vocabulary against the mention, validate type constraints, and
/// pick the single best-scoring property. Ties across channels resolve to
/// the earlier channel in fixed order (label, description, statement, alias).
pub async fn select_relation(
    ctx: &LinkContext,
    subject: &str,
    subject_id: &str,
    object: &str,
    object_id: &str,
    predicate: &str,
) -> Result<RelationSelection> {
    let clause = format!("{} {} {}", subject, predicate, object);

    let rankings = rank_properties(ctx, &clause, predicate).await?;
    log::info!("Top ranked by label: {:?}", rankings.by_label);
    log::info!("Top ranked by description: {:?}", rankings.by_description);
    log::info!("Top ranked by statements: {:?}", rankings.by_statements);
    log::info!("Top ranked by aliases: {:?}", rankings.by_aliases);

    let constraint_matches = match_properties(ctx, subject_id, object_id).await?;

    // Strict greater-than keeps the first occurrence on equal scores.
    let mut best: Option<&crate::link::RankedCandidate> = None;
    for candidate in rankings.pooled() {
        if best.map_or(true, |current| candidate.score > current.score) {
            best = Some(candidate);
        }
    }

    let property_id = match best {
        Some(candidate) => {
            log::info!(
                "Selected property {} (score {:.3})",
                candidate.property_id,
                candidate.score
            );
            Some(candidate.property_id.clone())
        }
        None => {
            log::warn!("No ranked candidates available for predicate '{}'", predicate);
            None
        }
    };

    Ok(RelationSelection {
        property_id,
        constraint_matches,
    })
}

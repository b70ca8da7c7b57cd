//! Type-constraint matching for a resolved subject/object pair.

use std::collections::HashSet;

use crate::error::Result;
use crate::link::hierarchy::{direct_types, expand_superclasses};
use crate::link::LinkContext;

/// Properties whose domain intersects the subject's types AND whose range
/// intersects the object's types. Direct types are checked first; the costly
/// superclass expansion runs only when that check yields nothing, because
/// direct types are usually narrower than the declared constraint classes.
///
/// The result is a plain membership set in table order, not a ranking.
pub async fn match_properties(
    ctx: &LinkContext,
    subject_id: &str,
    object_id: &str,
) -> Result<Vec<String>> {
    let (subject_types, object_types) = tokio::join!(
        direct_types(ctx, subject_id),
        direct_types(ctx, object_id)
    );
    let subject_types = subject_types?;
    let object_types = object_types?;

    let mut matched = match_with_constraints(ctx, &subject_types, &object_types);

    if matched.is_empty() {
        log::info!(
            "No property matched direct types of {} / {}; expanding superclasses",
            subject_id,
            object_id
        );
        let max_depth = ctx.options.max_depth;
        let (subject_expanded, object_expanded) = tokio::join!(
            expand_superclasses(ctx, subject_id, max_depth),
            expand_superclasses(ctx, object_id, max_depth)
        );
        matched = match_with_constraints(ctx, &subject_expanded?, &object_expanded?);
    }

    log::info!("Constraint matched properties: {:?}", matched);
    Ok(matched)
}

/// Conjunctive intersection test: both ends must be plausible.
fn match_with_constraints(
    ctx: &LinkContext,
    subject_types: &HashSet<String>,
    object_types: &HashSet<String>,
) -> Vec<String> {
    ctx.constraints
        .iter()
        .filter(|constraint| {
            !constraint.subject_constraints.is_disjoint(subject_types)
                && !constraint.value_constraints.is_disjoint(object_types)
        })
        .map(|constraint| constraint.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::testing::{context_with, StubEmbedder, StubService};
    use crate::tables::{Constraint, ConstraintTable, PropertyTable};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn constraint(id: &str, domain: &[&str], range: &[&str]) -> Constraint {
        Constraint {
            id: id.to_string(),
            subject_constraints: domain.iter().map(|s| s.to_string()).collect(),
            value_constraints: range.iter().map(|s| s.to_string()).collect(),
            statements_embedding: None,
        }
    }

    fn validation_context(
        service: StubService,
        constraints: Vec<Constraint>,
    ) -> (crate::link::LinkContext, Arc<StubService>) {
        let service = Arc::new(service);
        let ctx = context_with(
            service.clone(),
            Arc::new(StubEmbedder::default()),
            PropertyTable::default(),
            ConstraintTable::new(constraints),
        );
        (ctx, service)
    }

    #[tokio::test]
    async fn test_direct_type_match() {
        let service = StubService::with_direct_types(&[
            ("Q7186", &["Q5"][..]),
            ("Q38104", &["Q618779"][..]),
        ]);
        let (ctx, _) = validation_context(
            service,
            vec![constraint("P166", &["Q5"], &["Q618779"])],
        );

        let matched = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        assert_eq!(matched, vec!["P166".to_string()]);
    }

    #[tokio::test]
    async fn test_one_sided_match_is_rejected() {
        // Domain intersects, range does not: conjunction fails.
        let service = StubService::with_direct_types(&[
            ("Q7186", &["Q5"][..]),
            ("Q38104", &["Q618779"][..]),
        ]);
        let (ctx, _) = validation_context(
            service,
            vec![constraint("P19", &["Q5"], &["Q515"])],
        );

        let matched = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_expansion_replaces_direct_types() {
        // The fallback re-checks against the expanded sets, which hold only
        // ancestors, not the direct types themselves.
        let mut service = StubService::with_direct_types(&[
            ("Q7186", &["Q901"][..]),      // scientist
            ("Q38104", &["Q618779"][..]),
        ]);
        service.add_superclass_edge("Q901", &["Q5"]);
        service.add_superclass_edge("Q618779", &["Q618779"]); // self-loop, no new nodes
        let (ctx, _) = validation_context(
            service,
            vec![constraint("P166", &["Q5"], &["Q618779"])],
        );

        let matched = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        assert!(matched.is_empty(), "expanded object types lose the direct type");
    }

    #[tokio::test]
    async fn test_superclass_fallback_matches_ancestor() {
        let mut service = StubService::with_direct_types(&[
            ("Q7186", &["Q901"][..]),
            ("Q38104", &["Q378427"][..]),
        ]);
        service.add_superclass_edge("Q901", &["Q5"]);
        service.add_superclass_edge("Q378427", &["Q618779"]);
        let (ctx, _) = validation_context(
            service,
            vec![constraint("P166", &["Q5"], &["Q618779"])],
        );

        let matched = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        assert_eq!(matched, vec!["P166".to_string()]);
    }

    #[tokio::test]
    async fn test_no_expansion_when_direct_types_match() {
        let service = StubService::with_direct_types(&[
            ("Q7186", &["Q5"][..]),
            ("Q38104", &["Q618779"][..]),
        ]);
        let (ctx, service) = validation_context(
            service,
            vec![constraint("P166", &["Q5"], &["Q618779"])],
        );

        let _ = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        // Two direct-type queries, no superclass queries
        assert_eq!(service.sparql_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_matches_are_advisory() {
        let service = StubService::with_direct_types(&[
            ("Q1", &["Q1000"][..]),
            ("Q2", &["Q2000"][..]),
        ]);
        let (ctx, _) = validation_context(
            service,
            vec![constraint("P166", &["Q5"], &["Q618779"])],
        );

        let matched = match_properties(&ctx, "Q1", "Q2").await.unwrap();
        assert!(matched.is_empty());
    }

    #[tokio::test]
    async fn test_table_order_preserved() {
        let service = StubService::with_direct_types(&[
            ("Q7186", &["Q5"][..]),
            ("Q38104", &["Q618779"][..]),
        ]);
        let (ctx, _) = validation_context(
            service,
            vec![
                constraint("P2", &["Q5"], &["Q618779"]),
                constraint("P1", &["Q5"], &["Q618779"]),
            ],
        );

        let matched = match_properties(&ctx, "Q7186", "Q38104").await.unwrap();
        assert_eq!(matched, vec!["P2".to_string(), "P1".to_string()]);
    }
}

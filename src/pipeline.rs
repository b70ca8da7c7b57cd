//! Triple extraction pipeline: strip span tags, resolve both entities, select
//! the relation, de-duplicate within the run.
//!
//! Upstream producers (coreference, NER, clause splitting) hand this module
//! already-segmented subject/predicate/object clauses.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;

use crate::error::Result;
use crate::link::resolve::resolve_entity;
use crate::link::select::select_relation;
use crate::link::LinkContext;
use crate::wikidata::entity_iri;

/// One clause from the upstream extractor; fields may still carry span-tag
/// markup like `<PER>Marie Curie</PER>`.
#[derive(Debug, Clone)]
pub struct TaggedClause {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl TaggedClause {
    pub fn new(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
        }
    }
}

/// A triple endpoint: either a resolved knowledge-graph entity or the raw
/// mention text when resolution failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Entity { id: String, iri: String },
    Mention(String),
}

impl EntityRef {
    fn resolved(id: String) -> Self {
        let iri = entity_iri(&id);
        EntityRef::Entity { id, iri }
    }

    /// De-duplication key within one run.
    fn key(&self) -> &str {
        match self {
            EntityRef::Entity { iri, .. } => iri,
            EntityRef::Mention(text) => text,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An extracted triple. `property` is `None` when either entity was unknown
/// and relation extraction was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTriple {
    pub subject: EntityRef,
    pub property: Option<String>,
    pub object: EntityRef,
}

impl fmt::Display for ExtractedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}, {}>",
            self.subject,
            self.property.as_deref().unwrap_or("-"),
            self.object
        )
    }
}

/// Process a batch of clauses sequentially, one triple at a time.
pub async fn extract_triples(
    ctx: &LinkContext,
    clauses: &[TaggedClause],
) -> Result<Vec<ExtractedTriple>> {
    let tag_re = Regex::new(r"</?[^>]+>").expect("Invalid regex pattern");

    let mut triples: Vec<ExtractedTriple> = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for clause in clauses {
        let subject = strip_tags(&tag_re, &clause.subject);
        let predicate = strip_tags(&tag_re, &clause.predicate);
        let object = strip_tags(&tag_re, &clause.object);
        log::info!("Processing clause: ({}, {}, {})", subject, predicate, object);

        let subject_ref = match resolve_entity(ctx, &subject).await? {
            Some(id) => EntityRef::resolved(id),
            None => EntityRef::Mention(subject.clone()),
        };
        let object_ref = match resolve_entity(ctx, &object).await? {
            Some(id) => EntityRef::resolved(id),
            None => EntityRef::Mention(object.clone()),
        };

        let triple = match (&subject_ref, &object_ref) {
            (
                EntityRef::Entity { id: subject_id, .. },
                EntityRef::Entity { id: object_id, .. },
            ) => {
                let selection = select_relation(
                    ctx,
                    &subject,
                    subject_id,
                    &object,
                    object_id,
                    &predicate,
                )
                .await?;
                match selection.property_id {
                    Some(property_id) => ExtractedTriple {
                        subject: subject_ref.clone(),
                        property: Some(property_id),
                        object: object_ref.clone(),
                    },
                    None => {
                        log::warn!(
                            "No suitable property for ({}, {}, {}); dropping triple",
                            subject,
                            predicate,
                            object
                        );
                        continue;
                    }
                }
            }
            _ => {
                // Entity unknown: carry the raw mention and skip relation
                // extraction for this triple.
                log::warn!(
                    "Unresolved entity in ({}, {}, {}); keeping raw mentions",
                    subject,
                    predicate,
                    object
                );
                ExtractedTriple {
                    subject: subject_ref.clone(),
                    property: None,
                    object: object_ref.clone(),
                }
            }
        };

        let dedup_key = (
            triple.subject.key().to_string(),
            triple.property.clone().unwrap_or_default(),
            triple.object.key().to_string(),
        );
        if seen.insert(dedup_key) {
            log::info!("Extracted triple: {}", triple);
            triples.push(triple);
        }
    }

    log::info!("Extracted {} triples", triples.len());
    Ok(triples)
}

fn strip_tags(tag_re: &Regex, text: &str) -> String {
    tag_re.replace_all(text, "").trim().to_string()
}

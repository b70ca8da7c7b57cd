//! SPARQL query builders for the Wikidata graph endpoint.

/// Direct types of one entity (instance-of edges).
pub fn build_class_query(qid: &str) -> String {
    format!(
        "SELECT ?class WHERE {{\n  wd:{} wdt:P31 ?class .\n}}",
        qid
    )
}

/// Superclasses of a whole frontier in one batched query (subclass-of edges).
/// `qids` must be non-empty; callers skip the query for an empty frontier.
pub fn build_superclass_query(qids: &[String]) -> String {
    let values: Vec<String> = qids.iter().map(|q| format!("wd:{}", q)).collect();
    format!(
        "SELECT ?superclass WHERE {{\n  VALUES ?class {{ {} }}\n  ?class wdt:P279 ?superclass .\n}}",
        values.join(" ")
    )
}

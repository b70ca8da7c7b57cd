//! Property and constraint tables.
//!
//! Two read-only tables produced by an offline embedding job, loaded once per
//! process and shared immutably for the run's duration. Embedding vectors in
//! the files are already L2-normalized.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{KglinkError, Result};
use crate::wikidata::trim_iri;

/// One property of the knowledge-graph vocabulary with its precomputed
/// semantic embeddings. Identity is the opaque identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    #[serde(rename = "property")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub label_embedding: Vec<f32>,
    pub description_embedding: Vec<f32>,
    /// One embedding per alias; absent when the property has no aliases.
    #[serde(default)]
    pub aliases_embedding: Option<Vec<Vec<f32>>>,
}

/// Declared type constraints and exemplar statements for one property.
#[derive(Debug, Clone, Deserialize)]
pub struct Constraint {
    #[serde(rename = "property")]
    pub id: String,
    /// Acceptable subject types (domain).
    #[serde(rename = "subjectConstraints", default)]
    pub subject_constraints: HashSet<String>,
    /// Acceptable object types (range).
    #[serde(rename = "valueConstraints", default)]
    pub value_constraints: HashSet<String>,
    /// One embedding per exemplar statement; absent when there are none.
    #[serde(default)]
    pub statements_embedding: Option<Vec<Vec<f32>>>,
}

/// Properties in file order. Order matters: channel rankings break score
/// ties by first-seen position.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    entries: Vec<Property>,
}

impl PropertyTable {
    pub fn new(entries: Vec<Property>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Constraints in file order, with an identifier index for lookups.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTable {
    entries: Vec<Constraint>,
    index: HashMap<String, usize>,
}

impl ConstraintTable {
    pub fn new(mut entries: Vec<Constraint>) -> Self {
        // Constraint sets in raw exports carry full entity IRIs; keep only
        // the trailing identifier so they compare against SPARQL-fetched types.
        for entry in &mut entries {
            entry.subject_constraints = entry
                .subject_constraints
                .iter()
                .map(|c| trim_iri(c).to_string())
                .collect();
            entry.value_constraints = entry
                .value_constraints
                .iter()
                .map(|c| trim_iri(c).to_string())
                .collect();
        }
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.entries.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Constraint> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load both precomputed tables from their JSON files.
pub fn load_tables(
    properties_path: &Path,
    constraints_path: &Path,
) -> Result<(PropertyTable, ConstraintTable)> {
    log::info!(
        "Loading property table from {}",
        properties_path.display()
    );
    let properties: Vec<Property> = serde_json::from_str(&std::fs::read_to_string(
        properties_path,
    )?)
    .map_err(|e| KglinkError::Parse(format!("property table: {}", e)))?;

    log::info!(
        "Loading constraint table from {}",
        constraints_path.display()
    );
    let constraints: Vec<Constraint> = serde_json::from_str(&std::fs::read_to_string(
        constraints_path,
    )?)
    .map_err(|e| KglinkError::Parse(format!("constraint table: {}", e)))?;

    log::info!(
        "Loaded {} properties and {} constraints",
        properties.len(),
        constraints.len()
    );

    Ok((
        PropertyTable::new(properties),
        ConstraintTable::new(constraints),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_tables_from_json() {
        let temp_dir = TempDir::new().unwrap();
        let properties_path = temp_dir.path().join("properties.json");
        let constraints_path = temp_dir.path().join("constraints.json");

        fs::write(
            &properties_path,
            r#"[
                {
                    "property": "P166",
                    "label": "award received",
                    "description": "award or recognition received",
                    "aliases": ["won", "award won"],
                    "label_embedding": [1.0, 0.0],
                    "description_embedding": [0.0, 1.0],
                    "aliases_embedding": [[1.0, 0.0], [0.0, 1.0]]
                },
                {
                    "property": "P19",
                    "label": "place of birth",
                    "label_embedding": [0.0, 1.0],
                    "description_embedding": [1.0, 0.0]
                }
            ]"#,
        )
        .unwrap();

        fs::write(
            &constraints_path,
            r#"[
                {
                    "property": "P166",
                    "subjectConstraints": ["http://www.wikidata.org/entity/Q5"],
                    "valueConstraints": ["Q618779"],
                    "statements_embedding": [[0.6, 0.8]]
                }
            ]"#,
        )
        .unwrap();

        let (properties, constraints) =
            load_tables(&properties_path, &constraints_path).unwrap();

        assert_eq!(properties.len(), 2);
        let first = properties.iter().next().unwrap();
        assert_eq!(first.id, "P166");
        assert_eq!(first.aliases.len(), 2);
        assert!(first.aliases_embedding.is_some());

        let second = properties.iter().nth(1).unwrap();
        assert_eq!(second.description, "");
        assert!(second.aliases.is_empty());
        assert!(second.aliases_embedding.is_none());

        let constraint = constraints.get("P166").unwrap();
        // Full IRIs are trimmed to bare identifiers on load
        assert!(constraint.subject_constraints.contains("Q5"));
        assert!(constraint.value_constraints.contains("Q618779"));
        assert!(constraint.statements_embedding.is_some());
    }

    #[test]
    fn test_load_tables_rejects_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        let properties_path = temp_dir.path().join("properties.json");
        let constraints_path = temp_dir.path().join("constraints.json");
        fs::write(&properties_path, "not json").unwrap();
        fs::write(&constraints_path, "[]").unwrap();

        let result = load_tables(&properties_path, &constraints_path);
        assert!(matches!(result, Err(KglinkError::Parse(_))));
    }

    #[test]
    fn test_constraint_table_lookup() {
        let table = ConstraintTable::new(vec![Constraint {
            id: "P31".to_string(),
            subject_constraints: HashSet::new(),
            value_constraints: HashSet::new(),
            statements_embedding: None,
        }]);
        assert!(table.get("P31").is_some());
        assert!(table.get("P999").is_none());
    }
}

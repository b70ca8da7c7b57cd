pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod link;
pub mod pipeline;
pub mod retry;
pub mod tables;
pub mod wikidata;

pub use config::Config;
pub use error::{KglinkError, Result};
pub use link::{LinkContext, LinkOptions};
pub use pipeline::{extract_triples, ExtractedTriple, TaggedClause};

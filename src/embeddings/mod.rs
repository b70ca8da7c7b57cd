//! Text embeddings: the [`TextEmbedder`] seam, the HTTP embedding service
//! client, and the similarity helpers used by the resolver and ranker.

mod http;

pub use http::HttpEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Produces fixed-length, L2-normalized embedding vectors for text.
///
/// Implementations must return unit vectors so similarity reduces to a dot
/// product against the pre-normalized table embeddings.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Dot product; cosine similarity for pre-normalized vectors.
///
/// # Panics
///
/// Panics if vectors have different lengths (should not happen in normal
/// operation).
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(
        a.len(),
        b.len(),
        "Vectors must have same length for dot product"
    );
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity between two vectors of any magnitude.
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot(a, b) / (mag_a * mag_b)
}

/// Scale a vector to unit length in place. Zero vectors are left unchanged.
pub fn normalize(v: &mut [f32]) {
    let mag: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag > 0.0 {
        for x in v.iter_mut() {
            *x /= mag;
        }
    }
}

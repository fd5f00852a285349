use async_trait::async_trait;
use codegraph_core::{CodeGraphError, Embedder, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

/// A deterministic, model-free `Embedder` (§6): stands in for a real
/// embedding backend in environments that don't have one available.
/// Repeatedly hashes the input text to fill a fixed-dimension vector, then
/// L2-normalizes it, so cosine similarity between two texts is still a
/// meaningful (if crude) measure of surface-level overlap.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        HashingEmbedder { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        HashingEmbedder::new(384)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(count = texts.len(), dimension = self.dimension, "embedding batch via hashing provider");
        Ok(texts.iter().map(|text| embed_one(text, self.dimension)).collect())
    }

    async fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

fn embed_one(text: &str, dimension: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(dimension);
    let mut counter: u32 = 0;
    while values.len() < dimension {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();
        for chunk in digest.chunks_exact(4) {
            if values.len() >= dimension {
                break;
            }
            let bits = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let unit = bits as f32 / u32::MAX as f32;
            values.push(unit * 2.0 - 1.0);
        }
        counter += 1;
    }
    normalize(&mut values);
    values
}

fn normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in values.iter_mut() {
            *v /= norm;
        }
    }
}

pub fn validate_dimension(embedder: &dyn Embedder, vectors: &[Vec<f32>]) -> Result<()> {
    for vector in vectors {
        if vector.len() != embedder.dimension() {
            return Err(CodeGraphError::Invariant(format!(
                "embedder produced a {}-dim vector, expected {}",
                vector.len(),
                embedder.dimension()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_are_deterministic_and_correctly_sized() {
        tokio_test::block_on(async {
            let embedder = HashingEmbedder::new(384);
            let texts = vec!["fn foo() {}".to_string(), "fn bar() {}".to_string()];
            let first = embedder.embed_batch(&texts).await.unwrap();
            let second = embedder.embed_batch(&texts).await.unwrap();
            assert_eq!(first, second);
            assert_eq!(first[0].len(), 384);
            assert_ne!(first[0], first[1]);
        });
    }

    #[test]
    fn validate_dimension_rejects_mismatched_vectors() {
        let embedder = HashingEmbedder::new(384);
        let bad = vec![vec![0.0_f32; 10]];
        assert!(validate_dimension(&embedder, &bad).is_err());
    }

    #[test]
    fn dispose_is_a_no_op_and_always_succeeds() {
        tokio_test::block_on(async {
            let mut embedder = HashingEmbedder::default();
            assert!(embedder.dispose().await.is_ok());
        });
    }
}

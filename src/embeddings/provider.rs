//! Embedding provider port.

use crate::types::Result;
use async_trait::async_trait;

/// Text to fixed-dimension vector.
///
/// Implementations must be deterministic for a given model version. Vectors are
/// not required to be unit length; callers normalize before searching.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts. Default implementation embeds one at a time.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Output dimensionality.
    fn dimensions(&self) -> usize;

    /// Short backend name used in spans (`openai`, `hash`, ...).
    fn system(&self) -> &'static str;
}

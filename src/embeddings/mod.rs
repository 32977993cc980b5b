// Embedding generation module
// The provider is treated as an opaque text -> vector function behind the
// TextEmbedder capability so tests can substitute a deterministic fake.

pub mod openai;

use crate::Result;

/// Capability for converting free text into a fixed-dimension vector.
///
/// Exactly one model/dimension pair is pinned per deployment; every vector
/// stored in the index must come from the same embedder.
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text. One outbound provider call per invocation; no
    /// local caching.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimensionality of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}

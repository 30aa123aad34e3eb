//! Event Vectorization Pipeline (C7, spec.md §4.7).

pub mod chunker;
pub mod document;
pub mod embedder;
pub mod pipeline;
pub mod search;

pub use embedder::EmbeddingClient;
pub use pipeline::{VectorizationPipeline, VectorizationSummary};
pub use search::{SearchFilters, VectorSearch};

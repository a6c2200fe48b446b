//! Retrieval ports: text embedding and hosted vector index search.
//!
//! - `embedder`: the `Embedder` trait and its `BoxEmbedder` wrapper
//! - `index`: the `VectorIndex` trait and its `BoxVectorIndex` wrapper

pub mod box_embedder;
pub mod box_index;
pub mod embedder;
pub mod index;

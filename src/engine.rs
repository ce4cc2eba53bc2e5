//! The capability interface implemented by ANN index engines.
//!
//! Engines are external collaborators: this crate selects, persists, and
//! tunes them but never implements the search math itself.

use crate::blob::BlobSet;
use crate::error::{Result, VecIndexError};
use crate::params::IndexParams;
use crate::variant::IndexVariant;

/// A borrowed batch of row-major vectors.
#[derive(Debug, Clone, Copy)]
pub struct Dataset<'a> {
    vectors: &'a [f32],
    dim: usize,
}

impl<'a> Dataset<'a> {
    /// Create a dataset over a row-major vector buffer.
    pub fn new(vectors: &'a [f32], dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(VecIndexError::invalid_argument("dimension must be nonzero"));
        }
        if vectors.len() % dim != 0 {
            return Err(VecIndexError::invalid_argument(format!(
                "buffer length {} is not a multiple of dimension {dim}",
                vectors.len()
            )));
        }
        Ok(Dataset { vectors, dim })
    }

    /// The raw row-major buffer.
    pub fn vectors(&self) -> &'a [f32] {
        self.vectors
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows in the batch.
    pub fn rows(&self) -> usize {
        self.vectors.len() / self.dim
    }
}

/// Nearest-neighbor results for a search batch, row-major per query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHits {
    /// Matched vector ids, `top_k` per query.
    pub ids: Vec<i64>,
    /// Distances corresponding to `ids`.
    pub distances: Vec<f32>,
}

/// The capability interface every ANN index engine exposes.
///
/// Implementations own their algorithm state and are free to manage device
/// memory however they like; this crate only drives the lifecycle.
pub trait VectorEngine: Send {
    /// Train the index over a dataset.
    fn train(&mut self, data: &Dataset, params: &IndexParams) -> Result<()>;

    /// Search for the `top_k` nearest neighbors of each query row.
    fn search(&self, queries: &Dataset, top_k: usize, params: &IndexParams) -> Result<SearchHits>;

    /// Export the engine's internal state as named blobs.
    fn serialize(&self) -> Result<BlobSet>;

    /// Restore internal state from named blobs, consuming them.
    ///
    /// Fails with [`VecIndexError::Load`] on malformed or incompatible
    /// contents.
    fn load(&mut self, blobs: BlobSet) -> Result<()>;

    /// The variant this engine implements.
    fn variant(&self) -> IndexVariant;
}

/// Construction seam between the factory and a deployment's engine set.
///
/// A provider maps a variant (plus GPU device ordinal) to a fresh, untrained
/// engine. Returning `None` declares the variant unavailable in this
/// deployment, e.g. GPU variants on a machine without an accelerator.
pub trait EngineProvider: Send + Sync {
    /// Create a new, untrained engine for the given variant.
    fn create(&self, variant: IndexVariant, gpu_id: i64) -> Option<Box<dyn VectorEngine>>;
}

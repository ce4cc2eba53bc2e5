//! The uniform handle wrapping a constructed index engine.

use crate::blob::BlobSet;
use crate::engine::{Dataset, SearchHits, VectorEngine};
use crate::error::Result;
use crate::params::IndexParams;
use crate::variant::IndexVariant;

/// Construction shape of a handle.
///
/// Most variants share the generic shape. The brute-force flat index and the
/// mixed families get their own: a mixed handle carries the originating
/// family tag, which must win over the inner engine's own variant when the
/// index is re-serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleShape {
    /// Brute-force flat index.
    Flat,
    /// Mixed-family index; the tag names the family the handle was built for.
    Mixed(IndexVariant),
    /// Any other variant.
    Generic,
}

/// The uniform object returned by the factory.
///
/// A handle owns exactly one engine instance and exposes its variant
/// identity, persistence entry points, and train/search passthroughs. There
/// is no implicit sharing across handles.
pub struct IndexHandle {
    engine: Box<dyn VectorEngine>,
    shape: HandleShape,
}

impl IndexHandle {
    pub(crate) fn flat(engine: Box<dyn VectorEngine>) -> Self {
        IndexHandle {
            engine,
            shape: HandleShape::Flat,
        }
    }

    pub(crate) fn mixed(engine: Box<dyn VectorEngine>, family: IndexVariant) -> Self {
        IndexHandle {
            engine,
            shape: HandleShape::Mixed(family),
        }
    }

    pub(crate) fn generic(engine: Box<dyn VectorEngine>) -> Self {
        IndexHandle {
            engine,
            shape: HandleShape::Generic,
        }
    }

    /// The shape this handle was constructed with.
    pub fn shape(&self) -> HandleShape {
        self.shape
    }

    /// The variant identity of this index.
    ///
    /// For mixed handles this is the family tag, not the inner engine's
    /// variant — the persisted container must reconstruct through the mixed
    /// path.
    pub fn variant(&self) -> IndexVariant {
        match self.shape {
            HandleShape::Mixed(family) => family,
            _ => self.engine.variant(),
        }
    }

    /// Train the underlying engine over a dataset.
    pub fn train(&mut self, data: &Dataset, params: &IndexParams) -> Result<()> {
        self.engine.train(data, params)
    }

    /// Search the underlying engine.
    pub fn search(
        &self,
        queries: &Dataset,
        top_k: usize,
        params: &IndexParams,
    ) -> Result<SearchHits> {
        self.engine.search(queries, top_k, params)
    }

    /// Export the engine's state as named blobs.
    pub fn serialize(&self) -> Result<BlobSet> {
        self.engine.serialize()
    }

    /// Restore the engine's state from named blobs, consuming them.
    pub fn load(&mut self, blobs: BlobSet) -> Result<()> {
        self.engine.load(blobs)
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("variant", &self.variant())
            .field("shape", &self.shape)
            .finish()
    }
}

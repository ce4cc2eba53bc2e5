//! Index factory: variant selection and handle construction.

use crate::blob::BlobSet;
use crate::engine::EngineProvider;
use crate::error::Result;
use crate::handle::IndexHandle;
use crate::params::{IndexParams, keys};
use crate::variant::IndexVariant;

/// Constructs index handles for requested variants.
///
/// The factory owns the construction policy — which engine backs which
/// variant, how the GPU device is threaded through, and which variants get a
/// special handle shape. The engines themselves come from the deployment's
/// [`EngineProvider`].
pub struct IndexFactory {
    provider: Box<dyn EngineProvider>,
}

impl IndexFactory {
    /// Create a factory over the given engine provider.
    pub fn new(provider: Box<dyn EngineProvider>) -> Self {
        IndexFactory { provider }
    }

    /// Construct a new, untrained handle for the requested variant.
    ///
    /// Returns `Ok(None)` for [`IndexVariant::Invalid`] and for any variant
    /// the provider declines — callers must check for emptiness. The only
    /// error path is a type-mismatched `gpu_id` in the configuration.
    pub fn build(
        &self,
        variant: IndexVariant,
        params: &IndexParams,
    ) -> Result<Option<IndexHandle>> {
        let gpu_id = params.get_i64_or(keys::GPU_ID, 0)?;

        let handle = match variant {
            IndexVariant::Invalid => None,
            IndexVariant::Flat => self
                .provider
                .create(IndexVariant::Flat, gpu_id)
                .map(IndexHandle::flat),
            // Mixed families train on the GPU sibling engine but keep their
            // own variant identity on the handle.
            IndexVariant::IvfFlatMixed => self
                .provider
                .create(IndexVariant::IvfFlatGpu, gpu_id)
                .map(|engine| IndexHandle::mixed(engine, IndexVariant::IvfFlatMixed)),
            IndexVariant::IvfSq8Mixed => self
                .provider
                .create(IndexVariant::IvfSq8Gpu, gpu_id)
                .map(|engine| IndexHandle::mixed(engine, IndexVariant::IvfSq8Mixed)),
            other => self.provider.create(other, gpu_id).map(IndexHandle::generic),
        };

        Ok(handle)
    }

    /// Rebuild an index from a persisted blob set.
    ///
    /// Builds an empty engine for `variant`, then immediately loads the
    /// blobs into it. This is the sole path used after reading a persisted
    /// container.
    pub fn reconstruct(
        &self,
        variant: IndexVariant,
        blobs: BlobSet,
    ) -> Result<Option<IndexHandle>> {
        let Some(mut handle) = self.build(variant, &IndexParams::new())? else {
            return Ok(None);
        };
        handle.load(blobs)?;
        Ok(Some(handle))
    }
}

impl std::fmt::Debug for IndexFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexFactory").finish_non_exhaustive()
    }
}

//! Parameter auto-tuning and hardware validation.
//!
//! [`auto_tune_params`] fills unset tuning parameters from the dataset size
//! and variant-specific heuristics; [`validate_params`] caps values that
//! would exceed a GPU's capability. Neither ever rejects a value — the only
//! failure mode is type misuse of an existing entry.

use crate::error::{Result, VecIndexError};
use crate::params::{IndexParams, keys};
use crate::variant::IndexVariant;

/// Dataset size the cluster-count heuristics are anchored to.
pub const REFERENCE_DATASET_SIZE: f64 = 1_000_000.0;

/// Cluster count for an IVF index at the reference dataset size.
pub const IVF_NLIST_AT_REFERENCE: f64 = 16384.0;

/// Cluster count for the graph index at the reference dataset size.
pub const GRAPH_NLIST_AT_REFERENCE: f64 = 8192.0;

/// Dimensionality that maps to one unit of graph scale factor.
pub const SCALE_FACTOR_DIM_UNIT: f64 = 128.0;

/// Ceiling on the graph scale factor.
pub const MAX_SCALE_FACTOR: i64 = 4;

/// Maximum GPU search breadth on modern accelerator driver generations.
pub const GPU_MAX_NPROBE_MODERN: i64 = 2048;

/// Maximum GPU search breadth on older accelerator driver generations.
pub const GPU_MAX_NPROBE_LEGACY: i64 = 1024;

/// Accelerator driver generation, which bounds GPU search breadth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverTier {
    /// Older driver generations.
    Legacy,
    /// Current driver generations.
    Modern,
}

impl DriverTier {
    /// The maximum `nprobe` a GPU search supports on this tier.
    pub fn max_nprobe(self) -> i64 {
        match self {
            DriverTier::Legacy => GPU_MAX_NPROBE_LEGACY,
            DriverTier::Modern => GPU_MAX_NPROBE_MODERN,
        }
    }
}

/// Fill unset tuning parameters from the dataset size.
///
/// The cluster count scales roughly linearly with corpus size, with a floor
/// correction for tiny corpora. Present keys are respected except where the
/// heuristic is documented to recompute them (the graph variant always owns
/// `nlist`).
pub fn auto_tune_params(
    variant: IndexVariant,
    dataset_size: u64,
    params: &mut IndexParams,
) -> Result<()> {
    let nlist = params.get_i64_or(keys::NLIST, 0)?;
    let size = dataset_size as f64;

    if size <= REFERENCE_DATASET_SIZE / IVF_NLIST_AT_REFERENCE + 1.0 {
        // Tiny corpus: anything else would derive zero clusters.
        params.set(keys::NLIST, 1i64);
    } else if nlist == 0 || (size / REFERENCE_DATASET_SIZE).trunc() == 0.0 {
        params.set(
            keys::NLIST,
            (size / REFERENCE_DATASET_SIZE * IVF_NLIST_AT_REFERENCE) as i64,
        );
    }

    params.set_default(keys::GPU_ID, 0i64);
    params.set_default(keys::METRIC_TYPE, "L2");

    match variant {
        IndexVariant::IvfSq8Mixed => {
            params.set_default(keys::NBITS, 8i64);
        }
        IndexVariant::NsgMixed => {
            let dim = params.get_i64(keys::DIM)?.ok_or_else(|| {
                VecIndexError::invalid_argument("graph auto-tuning requires 'dim'")
            })?;
            let scale_factor =
                ((dim as f64 / SCALE_FACTOR_DIM_UNIT).round() as i64).min(MAX_SCALE_FACTOR);

            // The graph index derives its own partitioning; caller-supplied
            // nlist is always overridden.
            params.set(
                keys::NLIST,
                (size / REFERENCE_DATASET_SIZE * GRAPH_NLIST_AT_REFERENCE) as i64,
            );
            params.set_default(keys::NPROBE, 6 + 10 * scale_factor);
            params.set_default(keys::KNNG, 100 + 100 * scale_factor);
            params.set_default(keys::SEARCH_LENGTH, 40 + 5 * scale_factor);
            params.set_default(keys::OUT_DEGREE, 50 + 5 * scale_factor);
            params.set_default(keys::CANDIDATE_POOL_SIZE, 200 + 100 * scale_factor);

            log::debug!(
                "graph tuning for {dataset_size} vectors: {}",
                serde_json::to_string(params).unwrap_or_default()
            );
        }
        _ => {}
    }

    Ok(())
}

/// Cap parameters that would exceed the accelerator's capability.
///
/// Only GPU-executing variants are affected. A capped value is reported as a
/// warning, never an error.
pub fn validate_params(
    variant: IndexVariant,
    tier: DriverTier,
    params: &mut IndexParams,
) -> Result<()> {
    if !variant.executes_on_gpu() {
        return Ok(());
    }

    let nprobe = params.get_i64_or(keys::NPROBE, 0)?;
    if nprobe != 0 {
        let ceiling = tier.max_nprobe();
        if nprobe > ceiling {
            log::warn!(
                "when searching with GPU, nprobe should be no more than {ceiling}, \
                 but {nprobe} was passed; searching with {ceiling} instead"
            );
            params.set(keys::NPROBE, ceiling);
        }
    }

    Ok(())
}

//! Index variant identification and CPU/GPU conversion maps.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ANN index algorithm combined with its execution target.
///
/// The variant is immutable once assigned to an index instance. Mixed
/// variants train on the GPU but are persisted and searched through a
/// different path than their plain CPU/GPU siblings, so they keep their own
/// identity (see [`crate::handle::HandleShape::Mixed`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum IndexVariant {
    /// Sentinel for an unassigned or unrecognized variant.
    Invalid = 0,
    /// Brute-force flat index with exact search.
    Flat = 1,
    /// Inverted-file index, CPU execution.
    IvfFlatCpu = 2,
    /// Inverted-file index, GPU execution.
    IvfFlatGpu = 3,
    /// Inverted-file index, GPU training with CPU search.
    IvfFlatMixed = 4,
    /// Inverted-file index with product quantization, CPU execution.
    IvfPqCpu = 5,
    /// Inverted-file index with product quantization, GPU execution.
    IvfPqGpu = 6,
    /// Inverted-file index with scalar quantization, CPU execution.
    IvfSq8Cpu = 7,
    /// Inverted-file index with scalar quantization, GPU execution.
    IvfSq8Gpu = 8,
    /// Inverted-file index with scalar quantization, GPU training with CPU search.
    IvfSq8Mixed = 9,
    /// KD-tree random-neighborhood-graph index, CPU execution.
    KdTreeRng = 10,
    /// Navigating-spreading-out-graph index, GPU-assisted build.
    NsgMixed = 11,
}

impl IndexVariant {
    /// The stable on-disk tag for this variant.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Decode an on-disk tag. Unknown tags yield `None`.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(IndexVariant::Invalid),
            1 => Some(IndexVariant::Flat),
            2 => Some(IndexVariant::IvfFlatCpu),
            3 => Some(IndexVariant::IvfFlatGpu),
            4 => Some(IndexVariant::IvfFlatMixed),
            5 => Some(IndexVariant::IvfPqCpu),
            6 => Some(IndexVariant::IvfPqGpu),
            7 => Some(IndexVariant::IvfSq8Cpu),
            8 => Some(IndexVariant::IvfSq8Gpu),
            9 => Some(IndexVariant::IvfSq8Mixed),
            10 => Some(IndexVariant::KdTreeRng),
            11 => Some(IndexVariant::NsgMixed),
            _ => None,
        }
    }

    /// Map this variant to its CPU-only counterpart.
    ///
    /// Variants without a CPU counterpart pass through unchanged. The IVF-PQ
    /// pair is deliberately not mapped: its CPU and GPU persisted states do
    /// not interoperate.
    pub fn to_cpu(self) -> Self {
        match self {
            IndexVariant::IvfFlatGpu | IndexVariant::IvfFlatMixed => IndexVariant::IvfFlatCpu,
            IndexVariant::IvfSq8Gpu | IndexVariant::IvfSq8Mixed => IndexVariant::IvfSq8Cpu,
            other => other,
        }
    }

    /// Map this variant to its GPU-only counterpart.
    ///
    /// Variants without a GPU counterpart pass through unchanged.
    pub fn to_gpu(self) -> Self {
        match self {
            IndexVariant::IvfFlatCpu | IndexVariant::IvfFlatMixed => IndexVariant::IvfFlatGpu,
            IndexVariant::IvfSq8Cpu | IndexVariant::IvfSq8Mixed => IndexVariant::IvfSq8Gpu,
            other => other,
        }
    }

    /// Whether searches on this variant execute on a GPU.
    pub fn executes_on_gpu(self) -> bool {
        matches!(
            self,
            IndexVariant::IvfFlatGpu | IndexVariant::IvfPqGpu | IndexVariant::IvfSq8Gpu
        )
    }

    /// Whether this is a mixed (GPU-trained, CPU-searched) family variant.
    pub fn is_mixed(self) -> bool {
        matches!(
            self,
            IndexVariant::IvfFlatMixed | IndexVariant::IvfSq8Mixed | IndexVariant::NsgMixed
        )
    }
}

impl fmt::Display for IndexVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexVariant::Invalid => "invalid",
            IndexVariant::Flat => "flat",
            IndexVariant::IvfFlatCpu => "ivf_flat_cpu",
            IndexVariant::IvfFlatGpu => "ivf_flat_gpu",
            IndexVariant::IvfFlatMixed => "ivf_flat_mixed",
            IndexVariant::IvfPqCpu => "ivf_pq_cpu",
            IndexVariant::IvfPqGpu => "ivf_pq_gpu",
            IndexVariant::IvfSq8Cpu => "ivf_sq8_cpu",
            IndexVariant::IvfSq8Gpu => "ivf_sq8_gpu",
            IndexVariant::IvfSq8Mixed => "ivf_sq8_mixed",
            IndexVariant::KdTreeRng => "kd_tree_rng",
            IndexVariant::NsgMixed => "nsg_mixed",
        };
        write!(f, "{name}")
    }
}

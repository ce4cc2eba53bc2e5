//! Integration tests for the full index lifecycle: build, tune, persist,
//! reconstruct.

use vecindex::blob::BlobSet;
use vecindex::container::{ReadError, WriteError, read_index, write_index};
use vecindex::engine::{Dataset, EngineProvider, SearchHits, VectorEngine};
use vecindex::error::{Result, VecIndexError};
use vecindex::factory::IndexFactory;
use vecindex::params::{IndexParams, keys};
use vecindex::storage::{FileStorage, MemoryStorage, Storage, StorageConfig};
use vecindex::tuning::{DriverTier, auto_tune_params, validate_params};
use vecindex::variant::IndexVariant;

use tempfile::TempDir;

/// A minimal engine that keeps the raw training vectors as its state.
struct RawVectorEngine {
    variant: IndexVariant,
    vectors: Vec<u8>,
    dim: u64,
}

impl RawVectorEngine {
    fn new(variant: IndexVariant) -> Self {
        RawVectorEngine {
            variant,
            vectors: Vec::new(),
            dim: 0,
        }
    }
}

impl VectorEngine for RawVectorEngine {
    fn train(&mut self, data: &Dataset, _params: &IndexParams) -> Result<()> {
        self.vectors = data.vectors().iter().flat_map(|v| v.to_le_bytes()).collect();
        self.dim = data.dim() as u64;
        Ok(())
    }

    fn search(&self, queries: &Dataset, top_k: usize, _params: &IndexParams) -> Result<SearchHits> {
        if self.vectors.is_empty() {
            return Err(VecIndexError::engine("engine is not trained"));
        }
        Ok(SearchHits {
            ids: vec![0; queries.rows() * top_k],
            distances: vec![0.0; queries.rows() * top_k],
        })
    }

    fn serialize(&self) -> Result<BlobSet> {
        let mut blobs = BlobSet::new();
        blobs.append("vectors", self.vectors.clone());
        blobs.append("dim", self.dim.to_le_bytes().to_vec());
        Ok(blobs)
    }

    fn load(&mut self, mut blobs: BlobSet) -> Result<()> {
        let dim_bytes = blobs
            .take("dim")
            .ok_or_else(|| VecIndexError::load("missing 'dim' blob"))?;
        let dim_bytes: [u8; 8] = dim_bytes
            .try_into()
            .map_err(|_| VecIndexError::load("'dim' blob has the wrong size"))?;
        self.dim = u64::from_le_bytes(dim_bytes);
        self.vectors = blobs
            .take("vectors")
            .ok_or_else(|| VecIndexError::load("missing 'vectors' blob"))?;
        Ok(())
    }

    fn variant(&self) -> IndexVariant {
        self.variant
    }
}

/// Serves a raw-vector engine for every valid variant.
struct RawVectorProvider;

impl EngineProvider for RawVectorProvider {
    fn create(&self, variant: IndexVariant, _gpu_id: i64) -> Option<Box<dyn VectorEngine>> {
        if variant == IndexVariant::Invalid {
            return None;
        }
        Some(Box::new(RawVectorEngine::new(variant)))
    }
}

fn factory() -> IndexFactory {
    IndexFactory::new(Box::new(RawVectorProvider))
}

#[test]
fn test_flat_index_round_trip_through_file_storage() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(temp_dir.path(), StorageConfig::default())?;
    let factory = factory();

    let mut handle = factory
        .build(IndexVariant::Flat, &IndexParams::new())?
        .expect("flat variant should construct");

    let buffer: Vec<f32> = (0..64).map(|i| i as f32).collect();
    let data = Dataset::new(&buffer, 8)?;
    handle.train(&data, &IndexParams::new())?;
    let original_blobs = handle.serialize()?;

    write_index(&handle, &storage, "flat.idx").expect("write should succeed");

    let restored = read_index(&factory, &storage, "flat.idx")
        .expect("read should succeed")
        .expect("container should not be empty");

    assert_eq!(restored.variant(), IndexVariant::Flat);

    // Re-serializing the reconstructed index reproduces the original blob
    // set byte for byte.
    let restored_blobs = restored.serialize()?;
    assert_eq!(restored_blobs, original_blobs);
    assert_eq!(restored_blobs.get("vectors"), original_blobs.get("vectors"));

    Ok(())
}

#[test]
fn test_reading_before_any_write_yields_empty_handle() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let storage = FileStorage::new(temp_dir.path(), StorageConfig::default())?;

    let result = read_index(&factory(), &storage, "never_built.idx").expect("not an error");
    assert!(result.is_none());

    Ok(())
}

#[test]
fn test_mixed_family_survives_persistence() -> Result<()> {
    let storage = MemoryStorage::new_default();
    let factory = factory();

    let mut handle = factory
        .build(IndexVariant::IvfSq8Mixed, &IndexParams::new())?
        .expect("mixed variant should construct");

    let buffer = vec![0.5f32; 32];
    handle.train(&Dataset::new(&buffer, 4)?, &IndexParams::new())?;

    write_index(&handle, &storage, "mixed.idx").expect("write should succeed");

    // The container carries the family tag, not the inner GPU engine's
    // variant, so reconstruction goes back through the mixed path.
    let restored = read_index(&factory, &storage, "mixed.idx")
        .expect("read should succeed")
        .expect("container should not be empty");
    assert_eq!(restored.variant(), IndexVariant::IvfSq8Mixed);

    Ok(())
}

#[test]
fn test_storage_exhaustion_is_reported_distinctly() -> Result<()> {
    let factory = factory();

    let mut handle = factory
        .build(IndexVariant::Flat, &IndexParams::new())?
        .expect("flat variant should construct");
    let buffer = vec![1.0f32; 1024];
    handle.train(&Dataset::new(&buffer, 16)?, &IndexParams::new())?;

    let storage = MemoryStorage::new_default().with_capacity_limit(64);
    let err = write_index(&handle, &storage, "full.idx").unwrap_err();
    assert!(matches!(err, WriteError::StorageExhausted));

    // A generic failure keeps its own status.
    let mut closed = MemoryStorage::new_default();
    closed.close()?;
    let err = write_index(&handle, &closed, "closed.idx").unwrap_err();
    assert!(matches!(err, WriteError::Storage(_)));

    Ok(())
}

#[test]
fn test_corrupt_container_fails_instead_of_overreading() -> Result<()> {
    use std::io::Write;

    let storage = MemoryStorage::new_default();

    // A container whose final record declares more bytes than remain.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&IndexVariant::Flat.tag().to_le_bytes());
    bytes.extend_from_slice(&7u64.to_le_bytes());
    bytes.extend_from_slice(b"vectors");
    bytes.extend_from_slice(&(1u64 << 20).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 16]);

    let mut output = storage.create_output("corrupt.idx")?;
    output.write_all(&bytes)?;
    output.close()?;

    let err = read_index(&factory(), &storage, "corrupt.idx").unwrap_err();
    assert!(matches!(err, ReadError::Truncated { .. }));

    Ok(())
}

#[test]
fn test_tuned_and_validated_build_pipeline() -> Result<()> {
    let factory = factory();
    let storage = MemoryStorage::new_default();

    // A service-layer request: GPU scalar-quantized index over two million
    // vectors with an oversized search breadth.
    let mut params = IndexParams::new()
        .with(keys::DIM, 128)
        .with(keys::NPROBE, 5000);

    auto_tune_params(IndexVariant::IvfSq8Gpu, 2_000_000, &mut params)?;
    validate_params(IndexVariant::IvfSq8Gpu, DriverTier::Modern, &mut params)?;

    assert_eq!(params.get_i64(keys::NLIST)?, Some(32768));
    assert_eq!(params.get_i64(keys::NPROBE)?, Some(2048));
    assert_eq!(params.get_str(keys::METRIC_TYPE)?, Some("L2"));

    let mut handle = factory
        .build(IndexVariant::IvfSq8Gpu, &params)?
        .expect("variant should construct");

    let buffer = vec![0.1f32; 256];
    handle.train(&Dataset::new(&buffer, 128)?, &params)?;
    write_index(&handle, &storage, "sq8.idx").expect("write should succeed");

    let restored = read_index(&factory, &storage, "sq8.idx")
        .expect("read should succeed")
        .expect("container should not be empty");
    assert_eq!(restored.variant(), IndexVariant::IvfSq8Gpu);

    Ok(())
}

#[test]
fn test_cpu_fallback_keeps_persisted_state_loadable() -> Result<()> {
    let storage = MemoryStorage::new_default();
    let factory = factory();

    // Persist a GPU-built index.
    let mut handle = factory
        .build(IndexVariant::IvfFlatGpu, &IndexParams::new())?
        .expect("gpu variant should construct");
    let buffer = vec![2.0f32; 48];
    handle.train(&Dataset::new(&buffer, 8)?, &IndexParams::new())?;
    write_index(&handle, &storage, "gpu.idx").expect("write should succeed");

    // A deployment without an accelerator substitutes the CPU sibling and
    // loads the same blob set.
    let cpu_variant = IndexVariant::IvfFlatGpu.to_cpu();
    assert_eq!(cpu_variant, IndexVariant::IvfFlatCpu);

    let restored = read_index(&factory, &storage, "gpu.idx")
        .expect("read should succeed")
        .expect("container should not be empty");
    let blobs = restored.serialize()?;

    let fallback = factory
        .reconstruct(cpu_variant, blobs)?
        .expect("cpu variant should construct");
    assert_eq!(fallback.variant(), IndexVariant::IvfFlatCpu);

    Ok(())
}

//! Binary container codec for persisted index state.
//!
//! A container is a single self-describing stream:
//!
//! ```text
//! variant_tag   u32 little-endian
//! repeated until end of stream:
//!   name_len    u64 little-endian
//!   name        name_len bytes of UTF-8
//!   blob_len    u64 little-endian
//!   blob        blob_len bytes
//! ```
//!
//! No compression, no checksum, and no version field beyond the variant tag;
//! format evolution happens through new variant values. The reader validates
//! every declared length against the measured stream length and fails hard
//! on truncation.
//!
//! Concurrent writes to the same location are not synchronized here; callers
//! must serialize writers per path themselves.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use crate::blob::BlobSet;
use crate::error::VecIndexError;
use crate::factory::IndexFactory;
use crate::handle::IndexHandle;
use crate::storage::Storage;
use crate::variant::IndexVariant;

/// Failure taxonomy for [`write_index`].
#[derive(Error, Debug)]
pub enum WriteError {
    /// The destination ran out of space mid-write.
    #[error("no space left on storage device")]
    StorageExhausted,

    /// The engine failed to serialize its state.
    #[error("engine serialization failed: {0}")]
    Engine(String),

    /// Any other storage-level failure.
    #[error("container write failed: {0}")]
    Storage(String),
}

/// Failure taxonomy for [`read_index`].
#[derive(Error, Debug)]
pub enum ReadError {
    /// A record's declared length exceeds the remaining stream.
    #[error("container truncated: record at offset {offset} exceeds length {length}")]
    Truncated { offset: u64, length: u64 },

    /// The variant tag does not decode to a known variant.
    #[error("unknown index variant tag {0}")]
    UnknownVariant(u32),

    /// The stream is structurally invalid in some other way.
    #[error("container corrupt: {0}")]
    Corrupt(String),

    /// The variant is known but unavailable in this deployment.
    #[error("index variant {0} is not available in this deployment")]
    Unsupported(IndexVariant),

    /// The engine rejected the persisted state.
    #[error("engine rejected persisted state: {0}")]
    Load(String),

    /// Any other storage-level failure.
    #[error("container read failed: {0}")]
    Storage(String),
}

/// Whether an error's underlying cause is an exhausted storage device.
fn is_no_space(err: &VecIndexError) -> bool {
    match err {
        VecIndexError::Io(io_err) => io_err.kind() == std::io::ErrorKind::StorageFull,
        other => other.to_string().contains("No space left on device"),
    }
}

fn write_failure(err: VecIndexError) -> WriteError {
    if is_no_space(&err) {
        WriteError::StorageExhausted
    } else {
        WriteError::Storage(err.to_string())
    }
}

fn io_write_failure(err: std::io::Error) -> WriteError {
    write_failure(VecIndexError::Io(err))
}

/// Persist an index handle to a named container in storage.
///
/// Serializes the handle's engine to a blob set, then writes the variant tag
/// followed by each `(name, blob)` record. An ENOSPC condition surfaces as
/// the distinct [`WriteError::StorageExhausted`] status.
pub fn write_index(
    handle: &IndexHandle,
    storage: &dyn Storage,
    name: &str,
) -> Result<(), WriteError> {
    let blobs = handle
        .serialize()
        .map_err(|e| WriteError::Engine(e.to_string()))?;

    let mut output = storage.create_output(name).map_err(write_failure)?;

    output
        .write_u32::<LittleEndian>(handle.variant().tag())
        .map_err(io_write_failure)?;

    for (blob_name, data) in blobs.iter() {
        output
            .write_u64::<LittleEndian>(blob_name.len() as u64)
            .map_err(io_write_failure)?;
        output
            .write_all(blob_name.as_bytes())
            .map_err(io_write_failure)?;
        output
            .write_u64::<LittleEndian>(data.len() as u64)
            .map_err(io_write_failure)?;
        output.write_all(data).map_err(io_write_failure)?;
    }

    output.close().map_err(write_failure)?;
    Ok(())
}

/// Read a persisted container and reconstruct its index.
///
/// A missing or zero-length container yields `Ok(None)` — it signals
/// "nothing persisted yet," not corruption. Anything structurally wrong with
/// a non-empty container is a hard error.
pub fn read_index(
    factory: &IndexFactory,
    storage: &dyn Storage,
    name: &str,
) -> Result<Option<IndexHandle>, ReadError> {
    if !storage.file_exists(name) {
        return Ok(None);
    }

    let mut input = storage
        .open_input(name)
        .map_err(|e| ReadError::Storage(e.to_string()))?;
    let length = input.size().map_err(|e| ReadError::Storage(e.to_string()))?;
    if length == 0 {
        return Ok(None);
    }

    let mut offset = 0u64;
    let tag = read_u32(&mut input, &mut offset, length)?;
    let variant =
        IndexVariant::from_tag(tag).ok_or(ReadError::UnknownVariant(tag))?;

    let mut blobs = BlobSet::new();
    while offset < length {
        let name_len = read_u64(&mut input, &mut offset, length)?;
        let name_bytes = read_exact(&mut input, &mut offset, length, name_len)?;
        let blob_name = String::from_utf8(name_bytes)
            .map_err(|_| ReadError::Corrupt("blob name is not valid UTF-8".to_string()))?;

        let blob_len = read_u64(&mut input, &mut offset, length)?;
        let data = read_exact(&mut input, &mut offset, length, blob_len)?;

        blobs.append(blob_name, data);
    }

    match factory.reconstruct(variant, blobs) {
        Ok(Some(handle)) => Ok(Some(handle)),
        Ok(None) => Err(ReadError::Unsupported(variant)),
        Err(e) => Err(ReadError::Load(e.to_string())),
    }
}

/// Check that `needed` more bytes fit inside the measured stream length.
fn check_remaining(offset: u64, length: u64, needed: u64) -> Result<(), ReadError> {
    if needed > length - offset {
        Err(ReadError::Truncated { offset, length })
    } else {
        Ok(())
    }
}

fn read_u32<R: Read>(input: &mut R, offset: &mut u64, length: u64) -> Result<u32, ReadError> {
    check_remaining(*offset, length, 4)?;
    let value = input
        .read_u32::<LittleEndian>()
        .map_err(|e| ReadError::Storage(e.to_string()))?;
    *offset += 4;
    Ok(value)
}

fn read_u64<R: Read>(input: &mut R, offset: &mut u64, length: u64) -> Result<u64, ReadError> {
    check_remaining(*offset, length, 8)?;
    let value = input
        .read_u64::<LittleEndian>()
        .map_err(|e| ReadError::Storage(e.to_string()))?;
    *offset += 8;
    Ok(value)
}

fn read_exact<R: Read>(
    input: &mut R,
    offset: &mut u64,
    length: u64,
    needed: u64,
) -> Result<Vec<u8>, ReadError> {
    check_remaining(*offset, length, needed)?;
    let mut buffer = vec![0u8; needed as usize];
    input
        .read_exact(&mut buffer)
        .map_err(|e| ReadError::Storage(e.to_string()))?;
    *offset += needed;
    Ok(buffer)
}

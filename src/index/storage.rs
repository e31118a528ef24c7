//! Index persistence
//!
//! Layout (little endian):
//!
//! ```text
//! magic    4 bytes  "SBIX"
//! version  u16
//! dim      u32
//! rows     u64
//! payload  rows * dim * f32
//! ```
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! reader either sees the previous index or the complete new one.

use bytes::{Buf, BufMut, BytesMut};
use std::path::{Path, PathBuf};

use crate::errors::{Result, SiteError};
use crate::index::flat::FlatIndex;

const MAGIC: &[u8; 4] = b"SBIX";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 8;

/// Serialize an index into its on-disk representation
pub fn encode(index: &FlatIndex) -> BytesMut {
    let payload = index.raw();
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len() * 4);

    buf.put_slice(MAGIC);
    buf.put_u16_le(FORMAT_VERSION);
    buf.put_u32_le(index.dimension() as u32);
    buf.put_u64_le(index.len() as u64);
    for value in payload {
        buf.put_f32_le(*value);
    }
    buf
}

/// Parse an index from its on-disk representation
pub fn decode(mut bytes: &[u8]) -> std::result::Result<FlatIndex, String> {
    if bytes.len() < HEADER_LEN {
        return Err(format!("file too short: {} bytes", bytes.len()));
    }

    let mut magic = [0u8; 4];
    bytes.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err("not an index file (bad magic)".to_string());
    }

    let version = bytes.get_u16_le();
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", version));
    }

    let dimension = bytes.get_u32_le() as usize;
    let rows = bytes.get_u64_le() as usize;

    let expected = rows
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| "row count overflows".to_string())?;
    if bytes.remaining() != expected {
        return Err(format!(
            "payload is {} bytes, header declares {}",
            bytes.remaining(),
            expected
        ));
    }

    let mut data = Vec::with_capacity(rows * dimension);
    while bytes.has_remaining() {
        let value = bytes.get_f32_le();
        if !value.is_finite() {
            return Err("payload contains non-finite values".to_string());
        }
        data.push(value);
    }

    FlatIndex::from_raw(dimension, data).map_err(|e| e.to_string())
}

/// Write an index to `path`, replacing any previous file atomically
pub fn persist(index: &FlatIndex, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, encode(index))?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read an index from `path`
pub fn load(path: &Path) -> Result<FlatIndex> {
    let failure = |reason: String| SiteError::IndexLoadFailure {
        path: path.display().to_string(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| failure(e.to_string()))?;
    decode(&bytes).map_err(failure)
}

/// Persist on the blocking pool
pub async fn persist_async(index: FlatIndex, path: PathBuf) -> Result<FlatIndex> {
    tokio::task::spawn_blocking(move || persist(&index, &path).map(|_| index))
        .await
        .map_err(|e| SiteError::Generic(format!("index writer failed: {}", e)))?
}

/// Load on the blocking pool
pub async fn load_async(path: PathBuf) -> Result<FlatIndex> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || load(&path))
        .await
        .map_err(|e| SiteError::IndexLoadFailure {
            path: display,
            reason: e.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> FlatIndex {
        FlatIndex::build(&[vec![0.6, 0.8], vec![1.0, 0.0], vec![-0.8, 0.6]], 2).unwrap()
    }

    #[test]
    fn test_persist_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index.bin");

        persist(&sample(), &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!temp.path().join("nested").join("index.bin.tmp").exists());
    }

    #[test]
    fn test_empty_index_keeps_dimension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");

        persist(&FlatIndex::empty(384), &path).unwrap();
        let loaded = load(&path).unwrap();

        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension(), 384);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load(&temp.path().join("index.bin")).unwrap_err();
        assert!(matches!(err, SiteError::IndexLoadFailure { .. }));
    }

    #[test]
    fn test_truncated_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");
        let bytes = encode(&sample());
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, SiteError::IndexLoadFailure { .. }));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample()).to_vec();
        bytes[0] = b'X';
        assert!(decode(&bytes).unwrap_err().contains("magic"));
    }

    #[test]
    fn test_unknown_version() {
        let mut bytes = encode(&sample()).to_vec();
        bytes[4] = 9;
        assert!(decode(&bytes).unwrap_err().contains("version"));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");

        let persisted = persist_async(sample(), path.clone()).await.unwrap();
        let loaded = load_async(path).await.unwrap();
        assert_eq!(persisted, loaded);
    }
}

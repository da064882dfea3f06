//! Audio chunk persistence
//!
//! The persistence stage writes every inbound chunk through an
//! `AudioStore` and hands the resulting locator back to the caller.
//! The shipped implementation wraps raw PCM into a WAV container on
//! the local filesystem.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Sink for persisted audio chunks.
///
/// Called only from the persistence worker thread, so implementations
/// may block and need no internal locking.
pub trait AudioStore: Send + Sync {
    /// Durably store one chunk and return a locator identifying the
    /// stored artifact.
    fn store(&self, session_id: Uuid, payload: &[u8], timestamp: f64) -> Result<String>;
}

/// Writes chunks as 16-bit PCM WAV files under a storage directory.
pub struct WavStore {
    root: PathBuf,
    sample_rate: u32,
    channels: u16,
}

impl WavStore {
    pub fn new(root: impl Into<PathBuf>, sample_rate: u32, channels: u16) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            sample_rate,
            channels,
        })
    }

    /// Filename derived deterministically from session id and
    /// timestamp. Sub-second precision keeps names collision-free as
    /// long as the clock increases monotonically per session.
    fn chunk_filename(session_id: Uuid, timestamp: DateTime<Utc>) -> String {
        format!("{}_{}.wav", session_id, timestamp.format("%Y%m%d_%H%M%S_%6f"))
    }

    fn parse_timestamp(timestamp: f64) -> Result<DateTime<Utc>> {
        let secs = timestamp.trunc() as i64;
        let nanos = ((timestamp - timestamp.trunc()) * 1e9).round() as u32;
        DateTime::from_timestamp(secs, nanos).ok_or_else(|| PipelineError::Storage {
            message: format!("invalid chunk timestamp {timestamp}"),
        })
    }
}

impl AudioStore for WavStore {
    fn store(&self, session_id: Uuid, payload: &[u8], timestamp: f64) -> Result<String> {
        let instant = Self::parse_timestamp(timestamp)?;
        let path = self.root.join(Self::chunk_filename(session_id, instant));

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer =
            hound::WavWriter::create(&path, spec).map_err(|e| PipelineError::Storage {
                message: format!("failed to create {}: {}", path.display(), e),
            })?;

        // Payload is little-endian 16-bit samples; a dangling odd byte
        // is truncated rather than rejected.
        for sample in payload.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
                .map_err(|e| PipelineError::Storage {
                    message: format!("failed to write sample: {e}"),
                })?;
        }

        writer.finalize().map_err(|e| PipelineError::Storage {
            message: format!("failed to finalize {}: {}", path.display(), e),
        })?;

        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_filename_carries_subsecond_precision() {
        let id = Uuid::new_v4();
        let a = WavStore::chunk_filename(id, WavStore::parse_timestamp(1724567890.100).unwrap());
        let b = WavStore::chunk_filename(id, WavStore::parse_timestamp(1724567890.200).unwrap());
        assert_ne!(a, b, "chunks 100ms apart must not collide");
        assert!(a.starts_with(&id.to_string()));
        assert!(a.ends_with(".wav"));
    }

    #[test]
    fn test_store_writes_readable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavStore::new(dir.path(), 16000, 1).unwrap();

        let samples: Vec<i16> = (0..160).collect();
        let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let locator = store
            .store(Uuid::new_v4(), &payload, 1724567890.5)
            .unwrap();

        let mut reader = hound::WavReader::open(&locator).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn test_store_rejects_invalid_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = WavStore::new(dir.path(), 16000, 1).unwrap();

        let result = store.store(Uuid::new_v4(), &[0, 0], f64::MAX);
        assert!(matches!(result, Err(PipelineError::Storage { .. })));
    }

    #[test]
    fn test_store_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = WavStore::new(&nested, 16000, 1).unwrap();

        let locator = store.store(Uuid::new_v4(), &[1, 0, 2, 0], 100.0).unwrap();
        assert!(std::path::Path::new(&locator).exists());
    }
}

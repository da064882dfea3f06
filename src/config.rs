use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub transcriber: TranscriberConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Directory where persisted chunks are written
    pub storage_path: String,
    /// Inbound chunks must match this format (Whisper expects 16kHz)
    pub sample_rate: u32,
    pub channels: u16,
}

/// Tuning knobs for the persistence/transcription pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the persistence stage queue
    pub persist_queue_capacity: usize,
    /// Capacity of the transcription stage queue
    pub transcribe_queue_capacity: usize,
    /// Capacity of each session's outbound result channel
    pub outbound_queue_capacity: usize,
    /// How long a parked worker waits before re-checking the stop flag
    pub poll_interval_ms: u64,
    /// How long `stop` waits for workers before abandoning them
    pub shutdown_timeout_secs: u64,
    /// Number of transcription workers. The default of 1 keeps inference
    /// strictly sequential and bounds load on the engine to one in-flight
    /// call; raising it trades that for cross-session throughput.
    pub transcribe_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            persist_queue_capacity: 100,
            transcribe_queue_capacity: 100,
            outbound_queue_capacity: 100,
            poll_interval_ms: 500,
            shutdown_timeout_secs: 5,
            transcribe_workers: 1,
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriberConfig {
    /// URL of the speech-to-text inference endpoint
    pub endpoint: String,
    /// Per-request timeout for the inference call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_pipeline_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.persist_queue_capacity, 100);
        assert_eq!(cfg.transcribe_queue_capacity, 100);
        assert_eq!(cfg.outbound_queue_capacity, 100);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(500));
        assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.transcribe_workers, 1);
    }

    #[test]
    fn test_load_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[service]
name = "live-transcribe"

[service.http]
bind = "127.0.0.1"
port = 8000

[audio]
storage_path = "audio_chunks"
sample_rate = 16000
channels = 1

[transcriber]
endpoint = "http://localhost:9000/transcribe"
"#
        )
        .unwrap();

        let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.name, "live-transcribe");
        assert_eq!(cfg.audio.sample_rate, 16000);
        // Pipeline section is optional and falls back to defaults
        assert_eq!(cfg.pipeline.persist_queue_capacity, 100);
        assert_eq!(cfg.transcriber.request_timeout_secs, 120);
    }

    #[test]
    fn test_load_overridden_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[service]
name = "live-transcribe"

[service.http]
bind = "0.0.0.0"
port = 8000

[audio]
storage_path = "audio_chunks"
sample_rate = 16000
channels = 1

[pipeline]
persist_queue_capacity = 8
transcribe_workers = 2

[transcriber]
endpoint = "http://localhost:9000/transcribe"
request_timeout_secs = 30
"#
        )
        .unwrap();

        let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();
        assert_eq!(cfg.pipeline.persist_queue_capacity, 8);
        assert_eq!(cfg.pipeline.transcribe_workers, 2);
        // Unspecified pipeline keys keep their defaults
        assert_eq!(cfg.pipeline.transcribe_queue_capacity, 100);
        assert_eq!(cfg.transcriber.request_timeout_secs, 30);
    }
}

use super::Transcriber;
use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// Remote transcription binding: posts the chunk to an inference
/// endpoint and reads the text out of its JSON response.
///
/// Uses the blocking reqwest client deliberately — this only ever runs
/// on the transcription worker thread, never on the runtime.
pub struct HttpTranscriber {
    client: reqwest::blocking::Client,
    endpoint: String,
    sample_rate: u32,
    channels: u16,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl HttpTranscriber {
    pub fn new(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PipelineError::Inference {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            sample_rate,
            channels,
        })
    }
}

/// The pipeline carries raw headerless PCM; the endpoint expects a
/// WAV container, so each chunk is wrapped in one before posting.
fn encode_wav(payload: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| PipelineError::Inference {
            message: format!("failed to encode chunk: {e}"),
        })?;

    for sample in payload.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .map_err(|e| PipelineError::Inference {
                message: format!("failed to encode sample: {e}"),
            })?;
    }

    writer.finalize().map_err(|e| PipelineError::Inference {
        message: format!("failed to encode chunk: {e}"),
    })?;

    Ok(cursor.into_inner())
}

impl Transcriber for HttpTranscriber {
    fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let started = std::time::Instant::now();
        let body = encode_wav(audio, self.sample_rate, self.channels)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::Inference {
                message: format!("request to {} failed: {}", self.endpoint, e),
            })?;

        let body: TranscriptionResponse =
            response.json().map_err(|e| PipelineError::Inference {
                message: format!("malformed response from {}: {}", self.endpoint, e),
            })?;

        debug!(
            "Inference call completed in {:.3}s ({} chars)",
            started.elapsed().as_secs_f64(),
            body.text.len()
        );

        Ok(body.text.trim().to_string())
    }
}

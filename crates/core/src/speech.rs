//! Speech Synthesis Service
//!
//! Defines the contract for turning narration text into audio, plus the
//! ElevenLabs-backed implementation. The narration coordinator is the sole
//! consumer; synthesis failures are contained there and never fatal.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Tuning parameters forwarded to the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            stability: 0.75,
            similarity_boost: 0.75,
            style: 0.5,
            use_speaker_boost: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("speech backend returned {status}: {body}")]
    Backend { status: u16, body: String },
}

/// A backend able to synthesize spoken audio for a piece of text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechService: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        params: &VoiceParams,
    ) -> Result<Bytes, SpeechError>;
}

/// `SpeechService` backed by the ElevenLabs text-to-speech HTTP API.
pub struct ElevenLabsSpeech {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ElevenLabsSpeech {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.elevenlabs.io")
    }

    /// Overridable base URL, used to point at a stub server in tests.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettingsBody,
}

#[derive(Serialize)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[async_trait]
impl SpeechService for ElevenLabsSpeech {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        params: &VoiceParams,
    ) -> Result<Bytes, SpeechError> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        let body = SynthesisRequest {
            text,
            model_id: "eleven_monolingual_v1",
            voice_settings: VoiceSettingsBody {
                stability: params.stability,
                similarity_boost: params.similarity_boost,
                style: params.style,
                use_speaker_boost: params.use_speaker_boost,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_voice_params_match_the_tuned_baseline() {
        let params = VoiceParams::default();
        assert_eq!(params.stability, 0.75);
        assert_eq!(params.similarity_boost, 0.75);
        assert_eq!(params.style, 0.5);
        assert!(params.use_speaker_boost);
    }

    #[tokio::test]
    async fn mock_speech_service_round_trips() {
        let mut mock = MockSpeechService::new();
        mock.expect_synthesize()
            .returning(|_, _, _| Ok(Bytes::from_static(b"audio")));

        let out = mock
            .synthesize("hello", "voice-1", &VoiceParams::default())
            .await
            .unwrap();
        assert_eq!(&out[..], b"audio");
    }
}

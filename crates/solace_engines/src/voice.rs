#![forbid(unsafe_code)]

use solace_contracts::voice::{AudioPayload, MediaType, SpeechFormat, TranscriptBundle};
use solace_contracts::{ContractViolation, Validate};

use crate::oracle::{Oracle, OracleCallError};
use crate::wav::{encode_wav, WavEncodeError};

pub const VOICE_ENGINE_ID: &str = "CARE.VOICE";

/// Unlike the text flows, the two voice endpoints have no graceful textual
/// fallback: a voice interaction without a transcript or without spoken audio
/// cannot satisfy its contract, so these are hard errors.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEngineError {
    EmptyTranscription,
    EmptySynthesis,
    Oracle(OracleCallError),
    Contract(ContractViolation),
    Wav(WavEncodeError),
}

impl From<OracleCallError> for VoiceEngineError {
    fn from(e: OracleCallError) -> Self {
        VoiceEngineError::Oracle(e)
    }
}

impl From<ContractViolation> for VoiceEngineError {
    fn from(e: ContractViolation) -> Self {
        VoiceEngineError::Contract(e)
    }
}

impl From<WavEncodeError> for VoiceEngineError {
    fn from(e: WavEncodeError) -> Self {
        VoiceEngineError::Wav(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceConfig {
    pub speech_format: SpeechFormat,
}

impl VoiceConfig {
    pub fn mvp_v1() -> Self {
        Self {
            speech_format: SpeechFormat::companion_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VoiceRuntime {
    config: VoiceConfig,
}

impl VoiceRuntime {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }

    pub fn speech_format(&self) -> &SpeechFormat {
        &self.config.speech_format
    }

    /// One combined oracle step: transcript and vocal mood judged together.
    pub fn transcribe(
        &self,
        oracle: &dyn Oracle,
        audio: &AudioPayload,
    ) -> Result<TranscriptBundle, VoiceEngineError> {
        audio.validate()?;
        match oracle.transcribe_and_detect_mood(audio)? {
            Some(bundle) => Ok(bundle),
            None => Err(VoiceEngineError::EmptyTranscription),
        }
    }

    /// Synthesize the reply and wrap the PCM frames into a WAV payload whose
    /// header matches the configured format.
    pub fn synthesize(
        &self,
        oracle: &dyn Oracle,
        reply_text: &str,
    ) -> Result<AudioPayload, VoiceEngineError> {
        let pcm = match oracle.synthesize_speech(reply_text, &self.config.speech_format)? {
            Some(pcm) if !pcm.is_empty() => pcm,
            _ => return Err(VoiceEngineError::EmptySynthesis),
        };
        let wav = encode_wav(&pcm, &self.config.speech_format)?;
        let media_type = MediaType::new("audio/wav")?;
        Ok(AudioPayload::v1(media_type, wav)?)
    }
}

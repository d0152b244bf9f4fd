#![forbid(unsafe_code)]

use crate::chat::{ChatTurn, TherapyReply, MAX_HISTORY_TURNS};
use crate::profile::UserProfile;
use crate::wellness::MoodLabel;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const VOICE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

pub const CANONICAL_SPEECH_SAMPLE_RATE_HZ: SampleRateHz = SampleRateHz(24_000);
pub const CANONICAL_SPEECH_CHANNELS: ChannelCount = ChannelCount(1);
pub const CANONICAL_SPEECH_BITS_PER_SAMPLE: BitsPerSample = BitsPerSample(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleRateHz(pub u32);

impl Validate for SampleRateHz {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "sample_rate_hz",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelCount(pub u16);

impl Validate for ChannelCount {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "channel_count",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitsPerSample(pub u16);

impl Validate for BitsPerSample {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !matches!(self.0, 8 | 16 | 24 | 32) {
            return Err(ContractViolation::InvalidValue {
                field: "bits_per_sample",
                reason: "must be 8, 16, 24 or 32",
            });
        }
        Ok(())
    }
}

/// PCM layout requested from the synthesis step and declared in the wrapped
/// payload's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechFormat {
    pub sample_rate_hz: SampleRateHz,
    pub channels: ChannelCount,
    pub bits_per_sample: BitsPerSample,
}

impl SpeechFormat {
    pub fn v1(
        sample_rate_hz: SampleRateHz,
        channels: ChannelCount,
        bits_per_sample: BitsPerSample,
    ) -> Result<Self, ContractViolation> {
        let f = Self {
            sample_rate_hz,
            channels,
            bits_per_sample,
        };
        f.validate()?;
        Ok(f)
    }

    pub fn companion_default() -> Self {
        Self {
            sample_rate_hz: CANONICAL_SPEECH_SAMPLE_RATE_HZ,
            channels: CANONICAL_SPEECH_CHANNELS,
            bits_per_sample: CANONICAL_SPEECH_BITS_PER_SAMPLE,
        }
    }

    /// Bytes per PCM frame (one sample across all channels).
    pub fn block_align(&self) -> u16 {
        self.channels.0 * (self.bits_per_sample.0 / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate_hz.0 * u32::from(self.block_align())
    }
}

impl Validate for SpeechFormat {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.sample_rate_hz.validate()?;
        self.channels.validate()?;
        self.bits_per_sample.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    pub fn new(value: impl Into<String>) -> Result<Self, ContractViolation> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "media_type",
                reason: "must not be empty",
            });
        }
        if value.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "media_type",
                reason: "must be <= 64 chars",
            });
        }
        if !value.contains('/') {
            return Err(ContractViolation::InvalidValue {
                field: "media_type",
                reason: "must be type/subtype",
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for MediaType {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.contains('/') {
            return Err(ContractViolation::InvalidValue {
                field: "media_type",
                reason: "must be type/subtype",
            });
        }
        Ok(())
    }
}

/// Self-describing media payload: declared type plus raw encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub schema_version: SchemaVersion,
    pub media_type: MediaType,
    pub data: Vec<u8>,
}

impl AudioPayload {
    pub fn v1(media_type: MediaType, data: Vec<u8>) -> Result<Self, ContractViolation> {
        let p = Self {
            schema_version: VOICE_CONTRACT_VERSION,
            media_type,
            data,
        };
        p.validate()?;
        Ok(p)
    }
}

impl Validate for AudioPayload {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VOICE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "audio_payload.schema_version",
                reason: "must match VOICE_CONTRACT_VERSION",
            });
        }
        self.media_type.validate()?;
        if self.data.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "audio_payload.data",
                reason: "must not be empty",
            });
        }
        if self.data.len() > MAX_AUDIO_BYTES {
            return Err(ContractViolation::InvalidValue {
                field: "audio_payload.data",
                reason: "must be <= MAX_AUDIO_BYTES",
            });
        }
        Ok(())
    }
}

/// Combined transcription + vocal mood judgment. The two are produced in one
/// step; tone and pace cues only make sense alongside the words themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptBundle {
    pub transcript: String,
    pub mood: MoodLabel,
}

impl TranscriptBundle {
    pub fn v1(transcript: impl Into<String>, mood: MoodLabel) -> Result<Self, ContractViolation> {
        let b = Self {
            transcript: transcript.into(),
            mood,
        };
        b.validate()?;
        Ok(b)
    }
}

impl Validate for TranscriptBundle {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.transcript.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "transcript_bundle.transcript",
                reason: "must not be empty",
            });
        }
        self.mood.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTurnRequest {
    pub schema_version: SchemaVersion,
    pub audio: AudioPayload,
    pub history: Vec<ChatTurn>,
    pub profile: UserProfile,
}

impl VoiceTurnRequest {
    pub fn v1(
        audio: AudioPayload,
        history: Vec<ChatTurn>,
        profile: UserProfile,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: VOICE_CONTRACT_VERSION,
            audio,
            history,
            profile,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for VoiceTurnRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VOICE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "voice_turn_request.schema_version",
                reason: "must match VOICE_CONTRACT_VERSION",
            });
        }
        self.audio.validate()?;
        if self.history.len() > MAX_HISTORY_TURNS {
            return Err(ContractViolation::InvalidValue {
                field: "voice_turn_request.history",
                reason: "must be <= MAX_HISTORY_TURNS entries",
            });
        }
        for turn in &self.history {
            turn.validate()?;
        }
        self.profile.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTurnResponse {
    pub schema_version: SchemaVersion,
    pub reply: TherapyReply,
    pub transcript: String,
    pub mood: MoodLabel,
    pub audio: AudioPayload,
}

impl VoiceTurnResponse {
    pub fn v1(
        reply: TherapyReply,
        transcript: impl Into<String>,
        mood: MoodLabel,
        audio: AudioPayload,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: VOICE_CONTRACT_VERSION,
            reply,
            transcript: transcript.into(),
            mood,
            audio,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for VoiceTurnResponse {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != VOICE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "voice_turn_response.schema_version",
                reason: "must match VOICE_CONTRACT_VERSION",
            });
        }
        self.reply.validate()?;
        if self.transcript.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "voice_turn_response.transcript",
                reason: "must not be empty",
            });
        }
        self.mood.validate()?;
        self.audio.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_requires_a_subtype() {
        assert!(MediaType::new("audio").is_err());
        assert!(MediaType::new("audio/wav").is_ok());
    }

    #[test]
    fn audio_payload_rejects_empty_data() {
        let mt = MediaType::new("audio/wav").unwrap();
        assert!(AudioPayload::v1(mt, Vec::new()).is_err());
    }

    #[test]
    fn default_speech_format_is_mono_24k_16bit() {
        let f = SpeechFormat::companion_default();
        assert_eq!(f.sample_rate_hz, SampleRateHz(24_000));
        assert_eq!(f.channels, ChannelCount(1));
        assert_eq!(f.bits_per_sample, BitsPerSample(16));
        assert_eq!(f.block_align(), 2);
        assert_eq!(f.byte_rate(), 48_000);
    }

    #[test]
    fn bits_per_sample_rejects_odd_widths() {
        assert!(BitsPerSample(12).validate().is_err());
    }
}

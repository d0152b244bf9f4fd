#![forbid(unsafe_code)]

use solace_contracts::chat::{TherapyRequest, TurnSource};
use solace_contracts::voice::{VoiceTurnRequest, VoiceTurnResponse};
use solace_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use solace_engines::alert::AlertChannel;
use solace_engines::oracle::Oracle;
use solace_engines::therapy::TherapyConfig;
use solace_engines::voice::{VoiceConfig, VoiceEngineError, VoiceRuntime};
use solace_storage::repo::ConversationRepo;

use crate::therapy::{ChatFlowError, TherapyPipeline};

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceFlowError {
    Voice(VoiceEngineError),
    Chat(ChatFlowError),
    Contract(ContractViolation),
}

impl From<VoiceEngineError> for VoiceFlowError {
    fn from(e: VoiceEngineError) -> Self {
        VoiceFlowError::Voice(e)
    }
}

impl From<ChatFlowError> for VoiceFlowError {
    fn from(e: ChatFlowError) -> Self {
        VoiceFlowError::Chat(e)
    }
}

impl From<ContractViolation> for VoiceFlowError {
    fn from(e: ContractViolation) -> Self {
        VoiceFlowError::Contract(e)
    }
}

/// Straight-line voice turn: transcribe+mood, full chat pipeline, synthesize.
/// No branching, no retries. The two media endpoints are fatal on empty
/// results; everything between inherits the chat pipeline's guarantees.
#[derive(Debug, Clone)]
pub struct VoicePipeline {
    voice: VoiceRuntime,
    therapy: TherapyPipeline,
}

impl VoicePipeline {
    pub fn new(voice_config: VoiceConfig, therapy_config: TherapyConfig) -> Self {
        Self {
            voice: VoiceRuntime::new(voice_config),
            therapy: TherapyPipeline::new(therapy_config),
        }
    }

    pub fn run_voice_turn(
        &self,
        oracle: &dyn Oracle,
        channel: &dyn AlertChannel,
        store: &mut dyn ConversationRepo,
        req: &VoiceTurnRequest,
        now: MonotonicTimeNs,
    ) -> Result<VoiceTurnResponse, VoiceFlowError> {
        req.validate()?;

        // 1. One combined step: words and vocal mood judged together.
        let bundle = self.voice.transcribe(oracle, &req.audio)?;

        // 2. The transcript becomes the user input; the detected mood rides
        //    along as the out-of-band signal. Same pipeline, unchanged.
        let therapy_request = TherapyRequest::v1(
            req.profile.user_id.clone(),
            Some(bundle.transcript.clone()),
            req.history.clone(),
            Some(bundle.mood.clone()),
            None,
            None,
            None,
        )?;
        let reply = self.therapy.run_chat_turn(
            oracle,
            channel,
            store,
            &req.profile,
            &therapy_request,
            TurnSource::VoiceTranscript,
            now,
        )?;

        // 3. Speak the final reply, whatever the alert path did to it.
        let audio = self.voice.synthesize(oracle, &reply.reply)?;

        Ok(VoiceTurnResponse::v1(
            reply,
            bundle.transcript,
            bundle.mood,
            audio,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use solace_contracts::chat::RiskLevel;
    use solace_contracts::profile::{CaretakerContact, EmailAddress, UserId, UserProfile};
    use solace_contracts::voice::{AudioPayload, MediaType, SpeechFormat, TranscriptBundle};
    use solace_contracts::wellness::MoodLabel;
    use solace_engines::alert::{AlertMessage, AlertSendError};
    use solace_engines::oracle::{OracleCall, OracleCallError};
    use solace_storage::WellnessStore;
    use std::cell::RefCell;

    struct VoiceScriptOracle {
        bundle: Option<TranscriptBundle>,
        pcm: Option<Vec<u8>>,
        generate_replies: RefCell<Vec<Option<Value>>>,
        generate_inputs: RefCell<Vec<Value>>,
    }

    impl Oracle for VoiceScriptOracle {
        fn generate(&self, call: &OracleCall) -> Result<Option<Value>, OracleCallError> {
            self.generate_inputs.borrow_mut().push(call.input.clone());
            let mut replies = self.generate_replies.borrow_mut();
            if replies.is_empty() {
                return Ok(None);
            }
            Ok(replies.remove(0))
        }
        fn transcribe_and_detect_mood(
            &self,
            _audio: &AudioPayload,
        ) -> Result<Option<TranscriptBundle>, OracleCallError> {
            Ok(self.bundle.clone())
        }
        fn synthesize_speech(
            &self,
            _text: &str,
            _format: &SpeechFormat,
        ) -> Result<Option<Vec<u8>>, OracleCallError> {
            Ok(self.pcm.clone())
        }
    }

    struct NullChannel;
    impl AlertChannel for NullChannel {
        fn send(&self, _message: &AlertMessage) -> Result<(), AlertSendError> {
            Ok(())
        }
    }

    fn profile() -> UserProfile {
        UserProfile::v1(
            UserId::new("student_voice").unwrap(),
            CaretakerContact {
                email: Some(EmailAddress::new("caretaker@example.com").unwrap()),
            },
        )
        .unwrap()
    }

    fn request() -> VoiceTurnRequest {
        VoiceTurnRequest::v1(
            AudioPayload::v1(MediaType::new("audio/webm").unwrap(), vec![9; 128]).unwrap(),
            Vec::new(),
            profile(),
        )
        .unwrap()
    }

    fn pipeline() -> VoicePipeline {
        VoicePipeline::new(VoiceConfig::mvp_v1(), TherapyConfig::mvp_v1())
    }

    #[test]
    fn at_voice_flow_01_full_turn_returns_transcript_mood_reply_and_wav() {
        let oracle = VoiceScriptOracle {
            bundle: Some(
                TranscriptBundle::v1("I had a rough week", MoodLabel::new("Sad").unwrap()).unwrap(),
            ),
            pcm: Some(vec![0u8; 2_400]),
            generate_replies: RefCell::new(vec![Some(serde_json::json!({
                "reply": "A rough week deserves rest. I'm glad you told me.",
                "risk_level": "normal",
            }))]),
            generate_inputs: RefCell::new(Vec::new()),
        };
        let mut store = WellnessStore::new_in_memory();
        let out = pipeline()
            .run_voice_turn(&oracle, &NullChannel, &mut store, &request(), MonotonicTimeNs(1))
            .unwrap();
        assert_eq!(out.transcript, "I had a rough week");
        assert_eq!(out.mood.as_str(), "Sad");
        assert_eq!(out.reply.risk_level, RiskLevel::Normal);
        assert_eq!(out.audio.media_type.as_str(), "audio/wav");
        assert_eq!(&out.audio.data[0..4], b"RIFF");
        // The detected mood was handed to the classifier as the signal.
        assert_eq!(
            oracle.generate_inputs.borrow()[0]
                .get("voice_mood")
                .and_then(Value::as_str),
            Some("Sad")
        );
    }

    #[test]
    fn at_voice_flow_02_missing_transcript_is_fatal() {
        let oracle = VoiceScriptOracle {
            bundle: None,
            pcm: Some(vec![0u8; 2_400]),
            generate_replies: RefCell::new(Vec::new()),
            generate_inputs: RefCell::new(Vec::new()),
        };
        let mut store = WellnessStore::new_in_memory();
        let err = pipeline()
            .run_voice_turn(&oracle, &NullChannel, &mut store, &request(), MonotonicTimeNs(1))
            .unwrap_err();
        assert_eq!(
            err,
            VoiceFlowError::Voice(VoiceEngineError::EmptyTranscription)
        );
        // Nothing was persisted for the failed turn.
        assert_eq!(store.conversation_turn_count(), 0);
    }

    #[test]
    fn at_voice_flow_03_missing_synthesis_is_fatal_after_the_chat_step() {
        let oracle = VoiceScriptOracle {
            bundle: Some(
                TranscriptBundle::v1("long day", MoodLabel::new("Tired").unwrap()).unwrap(),
            ),
            pcm: None,
            generate_replies: RefCell::new(vec![Some(serde_json::json!({
                "reply": "Rest well tonight.",
                "risk_level": "normal",
            }))]),
            generate_inputs: RefCell::new(Vec::new()),
        };
        let mut store = WellnessStore::new_in_memory();
        let err = pipeline()
            .run_voice_turn(&oracle, &NullChannel, &mut store, &request(), MonotonicTimeNs(1))
            .unwrap_err();
        assert_eq!(err, VoiceFlowError::Voice(VoiceEngineError::EmptySynthesis));
    }

    #[test]
    fn at_voice_flow_04_voice_turns_are_stored_as_voice_transcripts() {
        let oracle = VoiceScriptOracle {
            bundle: Some(
                TranscriptBundle::v1("I had a rough week", MoodLabel::new("Sad").unwrap()).unwrap(),
            ),
            pcm: Some(vec![0u8; 2_400]),
            generate_replies: RefCell::new(vec![Some(serde_json::json!({
                "reply": "I'm glad you told me.",
                "risk_level": "normal",
            }))]),
            generate_inputs: RefCell::new(Vec::new()),
        };
        let mut store = WellnessStore::new_in_memory();
        pipeline()
            .run_voice_turn(&oracle, &NullChannel, &mut store, &request(), MonotonicTimeNs(1))
            .unwrap();
        let rows = store.conversation_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, TurnSource::VoiceTranscript);
        assert_eq!(rows[1].source, TurnSource::CompanionOutput);
    }
}

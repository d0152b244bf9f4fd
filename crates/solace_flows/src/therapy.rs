#![forbid(unsafe_code)]

use solace_contracts::chat::{
    ChatRole, ConversationTurnInput, RiskLevel, TherapyReply, TherapyRequest, TurnSource,
};
use solace_contracts::profile::UserProfile;
use solace_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use solace_engines::alert::{AlertChannel, AlertDispatchRuntime};
use solace_engines::oracle::Oracle;
use solace_engines::therapy::{reason_codes as therapy_reason_codes, TherapyConfig, TherapyRuntime};
use solace_storage::repo::ConversationRepo;
use solace_storage::StorageError;

/// Recorded when escalation is required but no caretaker email exists.
pub const NO_CARETAKER_NOTICE: &str = "No caretaker email is configured in the profile.";
/// Recorded when escalation is required but the turn carried no user message.
pub const NO_MESSAGE_NOTICE: &str = "Cannot send an alert without a user message.";

/// Calm canned reply the surface uses when the pipeline itself errors.
pub const FALLBACK_CONNECTIVITY_REPLY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatFlowError {
    Contract(ContractViolation),
    Storage(StorageError),
}

impl From<ContractViolation> for ChatFlowError {
    fn from(v: ContractViolation) -> Self {
        ChatFlowError::Contract(v)
    }
}

impl From<StorageError> for ChatFlowError {
    fn from(v: StorageError) -> Self {
        ChatFlowError::Storage(v)
    }
}

/// Classify, conditionally alert, conditionally re-classify, persist, return.
/// The alert step can only ever add informational text to the reply; it never
/// fails the request and never changes the assessed risk.
#[derive(Debug, Clone)]
pub struct TherapyPipeline {
    therapy: TherapyRuntime,
    alert: AlertDispatchRuntime,
}

impl TherapyPipeline {
    pub fn new(therapy_config: TherapyConfig) -> Self {
        Self {
            therapy: TherapyRuntime::new(therapy_config),
            alert: AlertDispatchRuntime::new(),
        }
    }

    pub fn fallback_reply() -> TherapyReply {
        TherapyReply {
            schema_version: solace_contracts::chat::CHAT_CONTRACT_VERSION,
            reply: FALLBACK_CONNECTIVITY_REPLY.to_string(),
            risk_level: RiskLevel::Normal,
            alert_error: None,
        }
    }

    pub fn run_chat_turn(
        &self,
        oracle: &dyn Oracle,
        channel: &dyn AlertChannel,
        store: &mut dyn ConversationRepo,
        profile: &UserProfile,
        req: &TherapyRequest,
        source: TurnSource,
        now: MonotonicTimeNs,
    ) -> Result<TherapyReply, ChatFlowError> {
        req.validate()?;
        profile.validate()?;

        // 1. Classify.
        let outcome = self.therapy.run(oracle, req);
        let risk_level = outcome.assessment.risk_level;
        let mut reply = outcome.assessment.reply;

        // 2. Escalate. The code, not the oracle, owns the side effect.
        let mut alert_error: Option<String> = None;
        if risk_level == RiskLevel::High {
            match (&profile.caretaker.email, &req.user_input) {
                (None, _) => alert_error = Some(NO_CARETAKER_NOTICE.to_string()),
                (Some(_), None) => alert_error = Some(NO_MESSAGE_NOTICE.to_string()),
                (Some(email), Some(user_input)) => {
                    if let Err(send_error) =
                        self.alert.dispatch(channel, email.clone(), user_input)
                    {
                        alert_error = Some(send_error.detail);
                    }
                }
            }
        }

        // 3. At most one re-classification, carrying the recorded error so
        //    the disclosure is phrased by the model. Risk is already decided.
        if let Some(notice) = &alert_error {
            let requery = req.with_alert_notice(notice.clone())?;
            let disclosure = self.therapy.run(oracle, &requery);
            if disclosure.reason_code == therapy_reason_codes::THERAPY_OK_ASSESSED {
                reply = disclosure.assessment.reply;
            }
        }

        // 4. Persist both sides of the exchange, append-only.
        if let Some(user_input) = &req.user_input {
            store.append_conversation_turn(ConversationTurnInput::v1(
                now,
                req.user_id.clone(),
                ChatRole::User,
                source,
                user_input.clone(),
                None,
            )?)?;
        }
        store.append_conversation_turn(ConversationTurnInput::v1(
            now,
            req.user_id.clone(),
            ChatRole::Companion,
            TurnSource::CompanionOutput,
            reply.clone(),
            None,
        )?)?;

        Ok(TherapyReply::v1(reply, risk_level, alert_error)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use solace_contracts::profile::{CaretakerContact, EmailAddress, UserId};
    use solace_contracts::voice::{AudioPayload, SpeechFormat, TranscriptBundle};
    use solace_engines::alert::{AlertMessage, AlertSendError};
    use solace_engines::oracle::{OracleCall, OracleCallError};
    use solace_storage::repo::ConversationRepo;
    use solace_storage::WellnessStore;
    use std::cell::RefCell;

    /// Replays scripted replies in order and records every call.
    struct ScriptedOracle {
        replies: RefCell<Vec<Option<Value>>>,
        calls: RefCell<Vec<OracleCall>>,
    }

    impl ScriptedOracle {
        fn new(replies: Vec<Option<Value>>) -> Self {
            Self {
                replies: RefCell::new(replies),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn call_input(&self, index: usize) -> Value {
            self.calls.borrow()[index].input.clone()
        }
    }

    impl Oracle for ScriptedOracle {
        fn generate(&self, call: &OracleCall) -> Result<Option<Value>, OracleCallError> {
            self.calls.borrow_mut().push(call.clone());
            let mut replies = self.replies.borrow_mut();
            if replies.is_empty() {
                return Ok(None);
            }
            Ok(replies.remove(0))
        }
        fn transcribe_and_detect_mood(
            &self,
            _audio: &AudioPayload,
        ) -> Result<Option<TranscriptBundle>, OracleCallError> {
            Ok(None)
        }
        fn synthesize_speech(
            &self,
            _text: &str,
            _format: &SpeechFormat,
        ) -> Result<Option<Vec<u8>>, OracleCallError> {
            Ok(None)
        }
    }

    struct RecordingChannel {
        sent: RefCell<Vec<AlertMessage>>,
        fail_with: Option<String>,
    }

    impl RecordingChannel {
        fn succeeding() -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(detail: &str) -> Self {
            Self {
                sent: RefCell::new(Vec::new()),
                fail_with: Some(detail.to_string()),
            }
        }

        fn attempt_count(&self) -> usize {
            self.sent.borrow().len()
        }
    }

    impl AlertChannel for RecordingChannel {
        fn send(&self, message: &AlertMessage) -> Result<(), AlertSendError> {
            self.sent.borrow_mut().push(message.clone());
            match &self.fail_with {
                Some(detail) => Err(AlertSendError {
                    detail: detail.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    fn assessment(reply: &str, risk: &str) -> Option<Value> {
        Some(serde_json::json!({ "reply": reply, "risk_level": risk }))
    }

    fn user() -> UserId {
        UserId::new("student_flow").unwrap()
    }

    fn profile_with_caretaker() -> UserProfile {
        UserProfile::v1(
            user(),
            CaretakerContact {
                email: Some(EmailAddress::new("caretaker@example.com").unwrap()),
            },
        )
        .unwrap()
    }

    fn profile_without_caretaker() -> UserProfile {
        UserProfile::v1(user(), CaretakerContact { email: None }).unwrap()
    }

    fn request(input: &str) -> TherapyRequest {
        TherapyRequest::v1(user(), Some(input.to_string()), Vec::new(), None, None, None, None)
            .unwrap()
    }

    fn pipeline() -> TherapyPipeline {
        TherapyPipeline::new(TherapyConfig::mvp_v1())
    }

    #[test]
    fn at_chat_flow_01_normal_risk_never_touches_the_dispatcher() {
        let oracle = ScriptedOracle::new(vec![assessment("that sounds stressful", "normal")]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request("work was a little stressful, but I'm fine"),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(reply.risk_level, RiskLevel::Normal);
        assert!(!reply.show_crisis_options());
        assert_eq!(channel.attempt_count(), 0);
        assert_eq!(oracle.call_count(), 1);
        assert!(reply.alert_error.is_none());
    }

    #[test]
    fn at_chat_flow_02_high_risk_with_caretaker_dispatches_exactly_once() {
        let oracle = ScriptedOracle::new(vec![assessment("I'm here with you", "high")]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        let input = "I can't stop crying and I feel hopeless";
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request(input),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(reply.risk_level, RiskLevel::High);
        assert!(reply.show_crisis_options());
        assert_eq!(channel.attempt_count(), 1);
        // Successful dispatch: no re-classification.
        assert_eq!(oracle.call_count(), 1);
        let sent = channel.sent.borrow();
        assert!(sent[0].subject.contains("Immediate Attention"));
        assert!(sent[0].html.contains(input));
    }

    #[test]
    fn at_chat_flow_03_dispatch_failure_requeries_once_with_the_literal_error() {
        let oracle = ScriptedOracle::new(vec![
            assessment("I'm here with you", "high"),
            assessment("I need to be transparent: the alert could not be sent.", "high"),
        ]);
        let channel = RecordingChannel::failing("connection reset by peer");
        let mut store = WellnessStore::new_in_memory();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request("I feel hopeless"),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(channel.attempt_count(), 1);
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(
            oracle.call_input(1).get("alert_notice").and_then(|v| v.as_str()),
            Some("connection reset by peer")
        );
        assert_eq!(reply.alert_error.as_deref(), Some("connection reset by peer"));
        assert_eq!(
            reply.reply,
            "I need to be transparent: the alert could not be sent."
        );
        // Risk and crisis flag survive the re-query untouched.
        assert_eq!(reply.risk_level, RiskLevel::High);
        assert!(reply.show_crisis_options());
    }

    #[test]
    fn at_chat_flow_04_missing_caretaker_skips_dispatch_but_still_discloses() {
        let oracle = ScriptedOracle::new(vec![
            assessment("I'm here with you", "high"),
            assessment("I could not reach anyone on your behalf.", "high"),
        ]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_without_caretaker(),
                &request("I feel hopeless"),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(channel.attempt_count(), 0);
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(
            oracle.call_input(1).get("alert_notice").and_then(|v| v.as_str()),
            Some(NO_CARETAKER_NOTICE)
        );
        assert_eq!(reply.alert_error.as_deref(), Some(NO_CARETAKER_NOTICE));
    }

    #[test]
    fn at_chat_flow_05_greeting_without_message_cannot_dispatch() {
        let oracle = ScriptedOracle::new(vec![assessment("Welcome back.", "high")]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        let req =
            TherapyRequest::v1(user(), None, Vec::new(), None, None, None, None).unwrap();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &req,
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        // Greetings are forced to normal risk upstream, so no escalation path runs.
        assert_eq!(reply.risk_level, RiskLevel::Normal);
        assert_eq!(channel.attempt_count(), 0);
        assert_eq!(oracle.call_count(), 1);
    }

    #[test]
    fn at_chat_flow_06_requery_fallback_keeps_the_original_reply() {
        // The disclosure re-query returns nothing usable; the first reply stands.
        let oracle = ScriptedOracle::new(vec![
            assessment("I'm here with you", "high"),
            None,
        ]);
        let channel = RecordingChannel::failing("gateway timeout");
        let mut store = WellnessStore::new_in_memory();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request("I feel hopeless"),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(reply.reply, "I'm here with you");
        assert_eq!(reply.alert_error.as_deref(), Some("gateway timeout"));
    }

    #[test]
    fn at_chat_flow_07_both_turns_are_persisted_in_order() {
        let oracle = ScriptedOracle::new(vec![assessment("hang in there", "normal")]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request("long day today"),
                TurnSource::TypedText,
                MonotonicTimeNs(7),
            )
            .unwrap();
        let rows = store.conversation_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, ChatRole::User);
        assert_eq!(rows[0].content, "long day today");
        assert_eq!(rows[1].role, ChatRole::Companion);
        assert_eq!(rows[1].content, "hang in there");
    }

    #[test]
    fn at_chat_flow_08_oracle_empty_still_returns_a_valid_reply() {
        let oracle = ScriptedOracle::new(vec![None]);
        let channel = RecordingChannel::succeeding();
        let mut store = WellnessStore::new_in_memory();
        let reply = pipeline()
            .run_chat_turn(
                &oracle,
                &channel,
                &mut store,
                &profile_with_caretaker(),
                &request("hello"),
                TurnSource::TypedText,
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert_eq!(reply.risk_level, RiskLevel::Normal);
        assert!(reply.validate().is_ok());
    }
}

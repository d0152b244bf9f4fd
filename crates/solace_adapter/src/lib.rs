#![forbid(unsafe_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use solace_contracts::chat::{
    ChatRole, ChatTurn, LanguageTag, TherapyReply, TherapyRequest, TurnSource,
};
use solace_contracts::community::{PostId, PostSubmission, ReplySubmission};
use solace_contracts::profile::{CaretakerContact, EmailAddress, UserId, UserProfile};
use solace_contracts::voice::{AudioPayload, MediaType, VoiceTurnRequest};
use solace_contracts::wellness::{
    AffirmationRequest, BloodPressure, ClockTime, CycleDay, CycleInsightRequest,
    FoodInsightRequest, MoodLabel, MoodObservation, MoodScore, SleepInsightRequest, SleepSchedule,
    Spo2Percent, StressScore, VitalsSnapshot,
};
use solace_contracts::{ContractViolation, MonotonicTimeNs};
use solace_engines::alert::WebhookChannel;
use solace_engines::moderation::ModerationConfig;
use solace_engines::oracle::HttpOracle;
use solace_engines::therapy::TherapyConfig;
use solace_engines::voice::{VoiceConfig, VoiceEngineError};
use solace_flows::community::{CommunityFlowError, CommunityFlows};
use solace_flows::therapy::{ChatFlowError, TherapyPipeline};
use solace_flows::voice::{VoiceFlowError, VoicePipeline};
use solace_flows::wellness::WellnessFlows;
use solace_storage::repo::WellnessRepo;
use solace_storage::WellnessStore;

const DAY_NS: u64 = 86_400_000_000_000;

// ---------------------------------------------------------------------------
// Wire DTOs. Flat, permissive shapes; contract types are built at the edge.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatTurnDto {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatTurnAdapterRequest {
    pub user_id: String,
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurnDto>,
    pub language: Option<String>,
    pub caretaker_email: Option<String>,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChatTurnAdapterResponse {
    pub status: String,
    pub reply: String,
    pub risk_level: String,
    pub show_crisis_options: bool,
    pub alert_error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VoiceTurnAdapterRequest {
    pub user_id: String,
    pub audio_data_uri: String,
    #[serde(default)]
    pub history: Vec<ChatTurnDto>,
    pub caretaker_email: Option<String>,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VoiceTurnAdapterResponse {
    pub status: String,
    pub reply: String,
    pub risk_level: String,
    pub show_crisis_options: bool,
    pub alert_error: Option<String>,
    pub transcript: String,
    pub mood: String,
    pub audio_data_uri: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunityPostAdapterRequest {
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CommunityReplyAdapterRequest {
    pub user_id: String,
    pub post_id: u64,
    pub content: String,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModerationAdapterResponse {
    pub status: String,
    pub approved: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoodLogAdapterRequest {
    pub user_id: String,
    pub mood: String,
    pub score: u8,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VitalsLogAdapterRequest {
    pub user_id: String,
    pub bp: String,
    pub stress: u8,
    pub spo2: u8,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CycleLogAdapterRequest {
    pub user_id: String,
    pub day_of_cycle: u8,
    pub mood: String,
    pub now_ns: Option<u64>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AffirmationAdapterRequest {
    pub mood: String,
    pub needs: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MoodObservationDto {
    pub mood: String,
    pub observed_at_ns: u64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SleepInsightAdapterRequest {
    pub weekday_wake: Option<String>,
    pub weekday_sleep: Option<String>,
    pub weekend_wake: Option<String>,
    pub weekend_sleep: Option<String>,
    #[serde(default)]
    pub recent_moods: Vec<MoodObservationDto>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FoodInsightAdapterRequest {
    pub food_diary: String,
    pub mood: String,
    pub bmi_category: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CycleInsightAdapterRequest {
    pub day_of_cycle: u8,
    pub mood: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WellnessTextAdapterResponse {
    pub status: String,
    pub text: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusAdapterResponse {
    pub status: String,
    pub outcome: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AdapterHealthResponse {
    pub status: String,
    pub outcome: String,
    pub reason: Option<String>,
    pub conversation_turns: usize,
    pub community_posts: usize,
    pub community_replies: usize,
    pub oracle_configured: bool,
    pub alert_channel_configured: bool,
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Everything a request handler needs, constructed once at process start and
/// passed by reference. No ambient singletons.
pub struct AdapterRuntime {
    store: WellnessStore,
    oracle: HttpOracle,
    channel: WebhookChannel,
    therapy: TherapyPipeline,
    voice: VoicePipeline,
    community: CommunityFlows,
    wellness: WellnessFlows,
}

impl AdapterRuntime {
    pub fn default_from_env() -> Result<Self, String> {
        Ok(Self {
            store: WellnessStore::new_in_memory(),
            oracle: HttpOracle::from_env(),
            channel: WebhookChannel::from_env(),
            therapy: TherapyPipeline::new(TherapyConfig::mvp_v1()),
            voice: VoicePipeline::new(VoiceConfig::mvp_v1(), TherapyConfig::mvp_v1()),
            community: CommunityFlows::new(ModerationConfig::mvp_v1()),
            wellness: WellnessFlows::new(),
        })
    }

    pub fn health_report(&self) -> AdapterHealthResponse {
        AdapterHealthResponse {
            status: "ok".to_string(),
            outcome: "HEALTHY".to_string(),
            reason: None,
            conversation_turns: self.store.conversation_turn_count(),
            community_posts: self.store.community_post_count(),
            community_replies: self.store.community_reply_count(),
            oracle_configured: self.oracle.config().has_api_key(),
            alert_channel_configured: self.channel.is_configured(),
        }
    }

    pub fn run_chat_turn(
        &mut self,
        request: ChatTurnAdapterRequest,
    ) -> Result<ChatTurnAdapterResponse, String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let profile = build_profile(user_id.clone(), request.caretaker_email)?;
        let history = parse_history(&request.history)?;
        let language = match request.language {
            Some(tag) => Some(LanguageTag::new(tag).map_err(contract_reason)?),
            None => None,
        };
        // Today's logged vitals ride along as a physiological signal.
        let day_start = MonotonicTimeNs(now.0 - (now.0 % DAY_NS));
        let vitals = self
            .store
            .latest_vitals_in_range(&user_id, day_start, now)
            .map(|row| row.vitals.clone());
        let therapy_request = TherapyRequest::v1(
            user_id,
            request.message,
            history,
            None,
            vitals,
            language,
            None,
        )
        .map_err(contract_reason)?;

        let reply = match self.therapy.run_chat_turn(
            &self.oracle,
            &self.channel,
            &mut self.store,
            &profile,
            &therapy_request,
            TurnSource::TypedText,
            now,
        ) {
            Ok(reply) => reply,
            Err(ChatFlowError::Contract(violation)) => return Err(contract_reason(violation)),
            Err(ChatFlowError::Storage(storage_error)) => {
                eprintln!("solace_adapter chat turn storage error: {storage_error:?}");
                TherapyPipeline::fallback_reply()
            }
        };
        Ok(chat_response(reply))
    }

    pub fn run_voice_turn(
        &mut self,
        request: VoiceTurnAdapterRequest,
    ) -> Result<VoiceTurnAdapterResponse, String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let profile = build_profile(user_id, request.caretaker_email)?;
        let history = parse_history(&request.history)?;
        let audio = parse_audio_data_uri(&request.audio_data_uri)?;
        let voice_request =
            VoiceTurnRequest::v1(audio, history, profile).map_err(contract_reason)?;

        let response = self
            .voice
            .run_voice_turn(&self.oracle, &self.channel, &mut self.store, &voice_request, now)
            .map_err(voice_flow_reason)?;

        Ok(VoiceTurnAdapterResponse {
            status: "ok".to_string(),
            reply: response.reply.reply.clone(),
            risk_level: response.reply.risk_level.as_str().to_string(),
            show_crisis_options: response.reply.show_crisis_options(),
            alert_error: response.reply.alert_error.clone(),
            transcript: response.transcript,
            mood: response.mood.as_str().to_string(),
            audio_data_uri: encode_audio_data_uri(&response.audio),
        })
    }

    pub fn submit_community_post(
        &mut self,
        request: CommunityPostAdapterRequest,
    ) -> Result<ModerationAdapterResponse, String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let submission =
            PostSubmission::v1(request.title, request.content).map_err(contract_reason)?;
        let verdict = match self.community.submit_post(
            &self.oracle,
            &mut self.store,
            &user_id,
            &submission,
            now,
        ) {
            Ok(verdict) => verdict,
            Err(CommunityFlowError::Contract(violation)) => return Err(contract_reason(violation)),
            Err(CommunityFlowError::Storage(storage_error)) => {
                eprintln!("solace_adapter community post storage error: {storage_error:?}");
                CommunityFlows::error_verdict()
            }
        };
        Ok(moderation_response(verdict))
    }

    pub fn submit_community_reply(
        &mut self,
        request: CommunityReplyAdapterRequest,
    ) -> Result<ModerationAdapterResponse, String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let submission = ReplySubmission::v1(request.content).map_err(contract_reason)?;
        let verdict = match self.community.submit_reply(
            &self.oracle,
            &mut self.store,
            &user_id,
            PostId(request.post_id),
            &submission,
            now,
        ) {
            Ok(verdict) => verdict,
            Err(CommunityFlowError::Contract(violation)) => return Err(contract_reason(violation)),
            Err(CommunityFlowError::Storage(storage_error)) => {
                eprintln!("solace_adapter community reply storage error: {storage_error:?}");
                CommunityFlows::error_verdict()
            }
        };
        Ok(moderation_response(verdict))
    }

    pub fn record_mood(&mut self, request: MoodLogAdapterRequest) -> Result<(), String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let mood = MoodLabel::new(request.mood).map_err(contract_reason)?;
        self.wellness
            .record_mood(&mut self.store, user_id, mood, MoodScore(request.score), now)
            .map_err(|e| format!("{e:?}"))
    }

    pub fn record_vitals(&mut self, request: VitalsLogAdapterRequest) -> Result<(), String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let vitals = VitalsSnapshot::v1(
            BloodPressure::new(request.bp).map_err(contract_reason)?,
            StressScore(request.stress),
            Spo2Percent(request.spo2),
        )
        .map_err(contract_reason)?;
        self.wellness
            .record_vitals(&mut self.store, user_id, vitals, now)
            .map_err(|e| format!("{e:?}"))
    }

    pub fn record_cycle_day(&mut self, request: CycleLogAdapterRequest) -> Result<(), String> {
        let now = resolve_now(request.now_ns);
        let user_id = UserId::new(request.user_id).map_err(contract_reason)?;
        let mood = MoodLabel::new(request.mood).map_err(contract_reason)?;
        self.wellness
            .record_cycle_day(&mut self.store, user_id, CycleDay(request.day_of_cycle), mood, now)
            .map_err(|e| format!("{e:?}"))
    }

    pub fn generate_affirmation(
        &self,
        request: AffirmationAdapterRequest,
    ) -> Result<WellnessTextAdapterResponse, String> {
        let req = AffirmationRequest::v1(
            MoodLabel::new(request.mood).map_err(contract_reason)?,
            request.needs,
        )
        .map_err(contract_reason)?;
        Ok(wellness_text_response(
            self.wellness.affirmation(&self.oracle, &req).text,
        ))
    }

    pub fn sleep_insight(
        &self,
        request: SleepInsightAdapterRequest,
    ) -> Result<WellnessTextAdapterResponse, String> {
        let schedule = SleepSchedule {
            weekday_wake: parse_clock(request.weekday_wake)?,
            weekday_sleep: parse_clock(request.weekday_sleep)?,
            weekend_wake: parse_clock(request.weekend_wake)?,
            weekend_sleep: parse_clock(request.weekend_sleep)?,
        };
        let mut recent_moods = Vec::with_capacity(request.recent_moods.len());
        for observation in request.recent_moods {
            recent_moods.push(MoodObservation {
                mood: MoodLabel::new(observation.mood).map_err(contract_reason)?,
                observed_at: MonotonicTimeNs(observation.observed_at_ns),
            });
        }
        let req = SleepInsightRequest::v1(schedule, recent_moods).map_err(contract_reason)?;
        Ok(wellness_text_response(
            self.wellness.sleep_insight(&self.oracle, &req).text,
        ))
    }

    pub fn food_insight(
        &self,
        request: FoodInsightAdapterRequest,
    ) -> Result<WellnessTextAdapterResponse, String> {
        let req = FoodInsightRequest::v1(
            request.food_diary,
            MoodLabel::new(request.mood).map_err(contract_reason)?,
            request.bmi_category,
        )
        .map_err(contract_reason)?;
        Ok(wellness_text_response(
            self.wellness.food_insight(&self.oracle, &req).text,
        ))
    }

    pub fn cycle_insight(
        &self,
        request: CycleInsightAdapterRequest,
    ) -> Result<WellnessTextAdapterResponse, String> {
        let req = CycleInsightRequest::v1(
            CycleDay(request.day_of_cycle),
            MoodLabel::new(request.mood).map_err(contract_reason)?,
        )
        .map_err(contract_reason)?;
        Ok(wellness_text_response(
            self.wellness.cycle_insight(&self.oracle, &req).text,
        ))
    }
}

// ---------------------------------------------------------------------------
// Edge helpers
// ---------------------------------------------------------------------------

fn build_profile(user_id: UserId, caretaker_email: Option<String>) -> Result<UserProfile, String> {
    let email = match caretaker_email {
        Some(address) if !address.trim().is_empty() => {
            Some(EmailAddress::new(address).map_err(contract_reason)?)
        }
        _ => None,
    };
    UserProfile::v1(user_id, CaretakerContact { email }).map_err(contract_reason)
}

fn parse_history(history: &[ChatTurnDto]) -> Result<Vec<ChatTurn>, String> {
    let mut turns = Vec::with_capacity(history.len());
    for dto in history {
        let role = match dto.role.as_str() {
            "user" => ChatRole::User,
            "companion" | "bot" => ChatRole::Companion,
            other => return Err(format!("history role '{other}' is not recognized")),
        };
        turns.push(ChatTurn::v1(role, dto.content.clone()).map_err(contract_reason)?);
    }
    Ok(turns)
}

fn parse_clock(value: Option<String>) -> Result<Option<ClockTime>, String> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Ok(Some(ClockTime::new(v).map_err(contract_reason)?))
        }
        _ => Ok(None),
    }
}

/// `data:<media-type>;base64,<payload>` in both directions.
pub fn parse_audio_data_uri(uri: &str) -> Result<AudioPayload, String> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| "audio payload must be a data: URI".to_string())?;
    let (media_type, encoded) = rest
        .split_once(";base64,")
        .ok_or_else(|| "audio payload must be base64-encoded".to_string())?;
    let media_type = MediaType::new(media_type).map_err(contract_reason)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| "audio payload is not valid base64".to_string())?;
    AudioPayload::v1(media_type, data).map_err(contract_reason)
}

pub fn encode_audio_data_uri(payload: &AudioPayload) -> String {
    format!(
        "data:{};base64,{}",
        payload.media_type.as_str(),
        base64::engine::general_purpose::STANDARD.encode(&payload.data)
    )
}

fn chat_response(reply: TherapyReply) -> ChatTurnAdapterResponse {
    ChatTurnAdapterResponse {
        status: "ok".to_string(),
        show_crisis_options: reply.show_crisis_options(),
        risk_level: reply.risk_level.as_str().to_string(),
        reply: reply.reply,
        alert_error: reply.alert_error,
    }
}

fn moderation_response(
    verdict: solace_contracts::community::ModerationVerdict,
) -> ModerationAdapterResponse {
    ModerationAdapterResponse {
        status: "ok".to_string(),
        approved: verdict.approved,
        reason: verdict.reason,
    }
}

fn wellness_text_response(text: String) -> WellnessTextAdapterResponse {
    WellnessTextAdapterResponse {
        status: "ok".to_string(),
        text,
    }
}

fn contract_reason(violation: ContractViolation) -> String {
    match violation {
        ContractViolation::InvalidValue { field, reason } => format!("{field}: {reason}"),
        ContractViolation::InvalidRange {
            field,
            min,
            max,
            got,
        } => format!("{field}: must be within {min}..={max}, got {got}"),
    }
}

fn voice_flow_reason(error: VoiceFlowError) -> String {
    match error {
        VoiceFlowError::Voice(VoiceEngineError::EmptyTranscription) => {
            "the audio could not be transcribed".to_string()
        }
        VoiceFlowError::Voice(VoiceEngineError::EmptySynthesis) => {
            "no spoken reply could be synthesized".to_string()
        }
        VoiceFlowError::Voice(VoiceEngineError::Oracle(call_error)) => call_error.safe_detail(),
        VoiceFlowError::Voice(other) => format!("voice pipeline error: {other:?}"),
        VoiceFlowError::Chat(ChatFlowError::Contract(violation)) => contract_reason(violation),
        VoiceFlowError::Chat(ChatFlowError::Storage(storage_error)) => {
            format!("storage error: {storage_error:?}")
        }
        VoiceFlowError::Contract(violation) => contract_reason(violation),
    }
}

pub fn system_time_now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

fn resolve_now(now_ns: Option<u64>) -> MonotonicTimeNs {
    MonotonicTimeNs(now_ns.unwrap_or_else(system_time_now_ns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_data_uri_round_trips() {
        let payload = AudioPayload::v1(
            MediaType::new("audio/wav").unwrap(),
            vec![82, 73, 70, 70, 0, 1, 2, 3],
        )
        .unwrap();
        let uri = encode_audio_data_uri(&payload);
        assert!(uri.starts_with("data:audio/wav;base64,"));
        let back = parse_audio_data_uri(&uri).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn audio_data_uri_rejects_plain_strings() {
        assert!(parse_audio_data_uri("not a data uri").is_err());
        assert!(parse_audio_data_uri("data:audio/wav;base64,@@@").is_err());
    }

    #[test]
    fn history_accepts_the_legacy_bot_role() {
        let turns = parse_history(&[
            ChatTurnDto {
                role: "user".to_string(),
                content: "hi".to_string(),
            },
            ChatTurnDto {
                role: "bot".to_string(),
                content: "hello".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(turns[1].role, ChatRole::Companion);
    }

    #[test]
    fn unknown_history_role_is_a_field_error() {
        let err = parse_history(&[ChatTurnDto {
            role: "narrator".to_string(),
            content: "hi".to_string(),
        }])
        .unwrap_err();
        assert!(err.contains("narrator"));
    }

    #[test]
    fn blank_caretaker_email_means_no_caretaker() {
        let profile = build_profile(
            UserId::new("student_adapter").unwrap(),
            Some("   ".to_string()),
        )
        .unwrap();
        assert!(profile.caretaker.email.is_none());
    }
}

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::profile::UserId;
use crate::wellness::{MoodLabel, VitalsSnapshot};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const CHAT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const MAX_USER_INPUT_CHARS: usize = 8_192;
pub const MAX_HISTORY_TURNS: usize = 64;
pub const MAX_ALERT_NOTICE_CHARS: usize = 1_024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: impl Into<String>) -> Result<Self, ContractViolation> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "language_tag",
                reason: "must not be empty",
            });
        }
        if tag.len() > 32 {
            return Err(ContractViolation::InvalidValue {
                field: "language_tag",
                reason: "must be <= 32 chars",
            });
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for LanguageTag {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "language_tag",
                reason: "must not be empty",
            });
        }
        if self.0.len() > 32 {
            return Err(ContractViolation::InvalidValue {
                field: "language_tag",
                reason: "must be <= 32 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Companion,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Companion => "companion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TurnId(pub u64);

impl Validate for TurnId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "turn_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// One prior exchange carried as classifier context. History turns are
/// read-only inputs; persisted turns are `ConversationTurnRecord`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn v1(role: ChatRole, content: impl Into<String>) -> Result<Self, ContractViolation> {
        let t = Self {
            role,
            content: content.into(),
        };
        t.validate()?;
        Ok(t)
    }
}

impl Validate for ChatTurn {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.content.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "chat_turn.content",
                reason: "must not be empty",
            });
        }
        if self.content.len() > MAX_USER_INPUT_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "chat_turn.content",
                reason: "must be <= MAX_USER_INPUT_CHARS",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnSource {
    TypedText,
    VoiceTranscript,
    CompanionOutput,
}

/// Append-only conversation write. The store assigns the `TurnId` and the
/// content hash; callers supply everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurnInput {
    pub schema_version: SchemaVersion,
    pub created_at: MonotonicTimeNs,
    pub user_id: UserId,
    pub role: ChatRole,
    pub source: TurnSource,
    pub content: String,
    /// Optional key to dedupe storage writes on retries.
    pub idempotency_key: Option<String>,
}

impl ConversationTurnInput {
    pub fn v1(
        created_at: MonotonicTimeNs,
        user_id: UserId,
        role: ChatRole,
        source: TurnSource,
        content: impl Into<String>,
        idempotency_key: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let t = Self {
            schema_version: CHAT_CONTRACT_VERSION,
            created_at,
            user_id,
            role,
            source,
            content: content.into(),
            idempotency_key,
        };
        t.validate()?;
        Ok(t)
    }
}

impl Validate for ConversationTurnInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CHAT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_input.schema_version",
                reason: "must match CHAT_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        if self.content.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_input.content",
                reason: "must not be empty",
            });
        }
        if self.content.len() > MAX_USER_INPUT_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_input.content",
                reason: "must be <= MAX_USER_INPUT_CHARS",
            });
        }
        if let Some(key) = &self.idempotency_key {
            if key.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "conversation_turn_input.idempotency_key",
                    reason: "must not be empty when present",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurnRecord {
    pub schema_version: SchemaVersion,
    pub turn_id: TurnId,
    pub created_at: MonotonicTimeNs,
    pub user_id: UserId,
    pub role: ChatRole,
    pub source: TurnSource,
    pub content: String,
    /// Hex digest of `content`, assigned by the store on append.
    pub content_hash: String,
    pub idempotency_key: Option<String>,
}

impl Validate for ConversationTurnRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CHAT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_record.schema_version",
                reason: "must match CHAT_CONTRACT_VERSION",
            });
        }
        self.turn_id.validate()?;
        self.user_id.validate()?;
        if self.content.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_record.content",
                reason: "must not be empty",
            });
        }
        if self.content_hash.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "conversation_turn_record.content_hash",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::High => "high",
        }
    }
}

/// Classifier input. Everything is optional except the requesting user:
/// an absent `user_input` is a greeting request, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TherapyRequest {
    pub schema_version: SchemaVersion,
    pub user_id: UserId,
    pub user_input: Option<String>,
    pub history: Vec<ChatTurn>,
    pub voice_mood: Option<MoodLabel>,
    pub vitals: Option<VitalsSnapshot>,
    pub language: Option<LanguageTag>,
    /// Set only by the alert orchestration when a dispatch error must be
    /// disclosed in the reply. Carried verbatim into the oracle input.
    pub alert_notice: Option<String>,
}

impl TherapyRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        user_id: UserId,
        user_input: Option<String>,
        history: Vec<ChatTurn>,
        voice_mood: Option<MoodLabel>,
        vitals: Option<VitalsSnapshot>,
        language: Option<LanguageTag>,
        alert_notice: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: CHAT_CONTRACT_VERSION,
            user_id,
            user_input,
            history,
            voice_mood,
            vitals,
            language,
            alert_notice,
        };
        r.validate()?;
        Ok(r)
    }

    pub fn with_alert_notice(&self, notice: impl Into<String>) -> Result<Self, ContractViolation> {
        let mut r = self.clone();
        r.alert_notice = Some(notice.into());
        r.validate()?;
        Ok(r)
    }
}

impl Validate for TherapyRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CHAT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "therapy_request.schema_version",
                reason: "must match CHAT_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        if let Some(input) = &self.user_input {
            if input.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "therapy_request.user_input",
                    reason: "must not be empty when present",
                });
            }
            if input.len() > MAX_USER_INPUT_CHARS {
                return Err(ContractViolation::InvalidValue {
                    field: "therapy_request.user_input",
                    reason: "must be <= MAX_USER_INPUT_CHARS",
                });
            }
        }
        if self.history.len() > MAX_HISTORY_TURNS {
            return Err(ContractViolation::InvalidValue {
                field: "therapy_request.history",
                reason: "must be <= MAX_HISTORY_TURNS entries",
            });
        }
        for turn in &self.history {
            turn.validate()?;
        }
        if let Some(mood) = &self.voice_mood {
            mood.validate()?;
        }
        if let Some(vitals) = &self.vitals {
            vitals.validate()?;
        }
        if let Some(language) = &self.language {
            language.validate()?;
        }
        if let Some(notice) = &self.alert_notice {
            if notice.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "therapy_request.alert_notice",
                    reason: "must not be empty when present",
                });
            }
            if notice.len() > MAX_ALERT_NOTICE_CHARS {
                return Err(ContractViolation::InvalidValue {
                    field: "therapy_request.alert_notice",
                    reason: "must be <= MAX_ALERT_NOTICE_CHARS",
                });
            }
        }
        Ok(())
    }
}

/// Raw classifier output: reply text plus the assessed risk level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TherapyAssessment {
    pub reply: String,
    pub risk_level: RiskLevel,
}

impl Validate for TherapyAssessment {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.reply.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "therapy_assessment.reply",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Final pipeline output returned to the caller. The crisis flag is a pure
/// function of the risk level and is never stored independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TherapyReply {
    pub schema_version: SchemaVersion,
    pub reply: String,
    pub risk_level: RiskLevel,
    pub alert_error: Option<String>,
}

impl TherapyReply {
    pub fn v1(
        reply: impl Into<String>,
        risk_level: RiskLevel,
        alert_error: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: CHAT_CONTRACT_VERSION,
            reply: reply.into(),
            risk_level,
            alert_error,
        };
        r.validate()?;
        Ok(r)
    }

    pub fn show_crisis_options(&self) -> bool {
        self.risk_level == RiskLevel::High
    }
}

impl Validate for TherapyReply {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != CHAT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "therapy_reply.schema_version",
                reason: "must match CHAT_CONTRACT_VERSION",
            });
        }
        if self.reply.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "therapy_reply.reply",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

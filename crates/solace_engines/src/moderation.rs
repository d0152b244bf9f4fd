#![forbid(unsafe_code)]

use serde_json::Value;
use solace_contracts::community::{ModerationVerdict, PostSubmission, ReplySubmission};
use solace_contracts::{ReasonCodeId, Validate};

use crate::oracle::{Oracle, OracleCall};

pub mod reason_codes {
    use solace_contracts::ReasonCodeId;

    // CARE.MOD reason-code namespace.
    pub const MOD_OK_APPROVED: ReasonCodeId = ReasonCodeId(0x4D4F_0001);
    pub const MOD_OK_REJECTED: ReasonCodeId = ReasonCodeId(0x4D4F_0002);
    pub const MOD_OK_UNVERIFIED: ReasonCodeId = ReasonCodeId(0x4D4F_0003);

    pub const MOD_FAIL_SCHEMA_INVALID: ReasonCodeId = ReasonCodeId(0x4D4F_00F1);
}

pub const MODERATION_ENGINE_ID: &str = "CARE.MOD";

/// Reason attached when the oracle produced no verdict. Fail closed: an
/// unverifiable submission is never published.
pub const UNVERIFIED_REASON: &str = "The content could not be verified at this time.";

/// Strict gate for top-level posts: both relevance and appropriateness must
/// hold.
const POST_GATE_INSTRUCTION: &str = "You are a strict but fair content moderator for an \
anonymous mental-health support community. Approve a post ONLY if BOTH hold: \
(1) Relevance - it is a personal mental-health struggle, question, feeling, or experience; a \
genuine request for support or a shared journey, including stress, sadness, or anxiety around \
everyday events like exams, work, or relationships. Posts about commerce, chit-chat, politics, \
or anything unrelated to mental health fail this test. \
(2) Appropriateness - it contains no profanity, hate speech, spam, advertisements, personal \
attacks, or explicit or harmful content. \
If either test fails, reject with a brief, clear, non-judgmental reason the author will read, \
for example: 'This post does not seem to be about a mental health topic.', 'This post contains \
inappropriate language.', 'Advertisements are not allowed in this community.'. \
Answer with a single JSON object: {\"approved\": bool, \"reason\": string|null}.";

/// Deliberately more permissive gate for replies: protect from clear harm,
/// allow imperfect good-faith support.
const REPLY_GATE_INSTRUCTION: &str = "You are a fair and lenient safety moderator for an \
anonymous mental-health support community. Approve any reply that is a good-faith attempt to \
help, even when it is blunt, direct, or imperfectly phrased. Reject ONLY when the reply contains \
one of: encouragement or glorification of self-harm or suicide; name-calling, insults, or \
direct aggression; blunt, complete dismissal of the poster's feelings with nothing of value \
(for example 'Just get over it', 'That's not a real problem'); profanity or hate speech; \
prescriptive medical advice naming specific medications, doses, or definitive diagnoses; spam \
or advertising. Direct solution-oriented advice such as 'you should better manage time and \
work' must be approved. When rejecting, give a very brief, direct reason such as 'This reply \
dismisses the poster's feelings without offering support.'. \
Answer with a single JSON object: {\"approved\": bool, \"reason\": string|null}.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModerationConfig {
    /// Rejection reasons are shown inline in the submission form; keep them
    /// short regardless of how chatty the oracle felt.
    pub max_reason_chars: usize,
}

impl ModerationConfig {
    pub fn mvp_v1() -> Self {
        Self {
            max_reason_chars: 240,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub verdict: ModerationVerdict,
    pub reason_code: ReasonCodeId,
}

#[derive(Debug, Clone)]
pub struct ModerationRuntime {
    config: ModerationConfig,
}

impl ModerationRuntime {
    pub fn new(config: ModerationConfig) -> Self {
        Self { config }
    }

    pub fn review_post(&self, oracle: &dyn Oracle, post: &PostSubmission) -> ModerationOutcome {
        if post.validate().is_err() {
            return unverified(reason_codes::MOD_FAIL_SCHEMA_INVALID);
        }
        let input = serde_json::json!({
            "title": post.title,
            "content": post.content,
        });
        self.review(oracle, POST_GATE_INSTRUCTION, input)
    }

    pub fn review_reply(&self, oracle: &dyn Oracle, reply: &ReplySubmission) -> ModerationOutcome {
        if reply.validate().is_err() {
            return unverified(reason_codes::MOD_FAIL_SCHEMA_INVALID);
        }
        let input = serde_json::json!({
            "reply_content": reply.content,
        });
        self.review(oracle, REPLY_GATE_INSTRUCTION, input)
    }

    fn review(&self, oracle: &dyn Oracle, instruction: &str, input: Value) -> ModerationOutcome {
        let call = match OracleCall::v1(instruction, input) {
            Ok(call) => call,
            Err(_) => return unverified(reason_codes::MOD_FAIL_SCHEMA_INVALID),
        };
        let value = match oracle.generate(&call) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return unverified(reason_codes::MOD_OK_UNVERIFIED),
        };
        match parse_verdict(&value, self.config.max_reason_chars) {
            Some(verdict) if verdict.approved => ModerationOutcome {
                verdict,
                reason_code: reason_codes::MOD_OK_APPROVED,
            },
            Some(verdict) => ModerationOutcome {
                verdict,
                reason_code: reason_codes::MOD_OK_REJECTED,
            },
            None => unverified(reason_codes::MOD_OK_UNVERIFIED),
        }
    }
}

fn parse_verdict(value: &Value, max_reason_chars: usize) -> Option<ModerationVerdict> {
    let approved = value.get("approved")?.as_bool()?;
    if approved {
        return Some(ModerationVerdict::approved());
    }
    let reason = value
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(UNVERIFIED_REASON);
    let reason: String = reason.chars().take(max_reason_chars).collect();
    Some(ModerationVerdict::rejected(reason))
}

fn unverified(reason_code: ReasonCodeId) -> ModerationOutcome {
    ModerationOutcome {
        verdict: ModerationVerdict::rejected(UNVERIFIED_REASON),
        reason_code,
    }
}

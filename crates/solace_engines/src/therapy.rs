#![forbid(unsafe_code)]

use serde_json::{Map, Value};
use solace_contracts::chat::{RiskLevel, TherapyAssessment, TherapyRequest};
use solace_contracts::{ReasonCodeId, Validate};

use crate::oracle::{Oracle, OracleCall};

pub mod reason_codes {
    use solace_contracts::ReasonCodeId;

    // CARE.THERAPY reason-code namespace.
    pub const THERAPY_OK_ASSESSED: ReasonCodeId = ReasonCodeId(0x5448_0001);
    pub const THERAPY_OK_GREETING: ReasonCodeId = ReasonCodeId(0x5448_0002);
    pub const THERAPY_OK_FALLBACK: ReasonCodeId = ReasonCodeId(0x5448_0003);

    pub const THERAPY_FAIL_SCHEMA_INVALID: ReasonCodeId = ReasonCodeId(0x5448_00F1);
}

pub const THERAPY_ENGINE_ID: &str = "CARE.THERAPY";

/// Reply used when the oracle produces nothing usable. The session must keep
/// moving; a classification error is never surfaced to the user.
pub const FALLBACK_CLARIFY_REPLY: &str =
    "I'm not sure how to respond to that. Could you tell me more?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TherapyConfig {
    pub max_history_turns: usize,
}

impl TherapyConfig {
    pub fn mvp_v1() -> Self {
        Self {
            max_history_turns: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TherapyOutcome {
    pub assessment: TherapyAssessment,
    pub reason_code: ReasonCodeId,
}

#[derive(Debug, Clone)]
pub struct TherapyRuntime {
    config: TherapyConfig,
}

impl TherapyRuntime {
    pub fn new(config: TherapyConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, oracle: &dyn Oracle, req: &TherapyRequest) -> TherapyOutcome {
        if req.validate().is_err() {
            return fallback_outcome(reason_codes::THERAPY_FAIL_SCHEMA_INVALID);
        }

        let call = match OracleCall::v1(self.build_instruction(req), self.build_input_document(req))
        {
            Ok(call) => call,
            Err(_) => return fallback_outcome(reason_codes::THERAPY_FAIL_SCHEMA_INVALID),
        };

        let value = match oracle.generate(&call) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return fallback_outcome(reason_codes::THERAPY_OK_FALLBACK),
        };

        let Some(mut assessment) = parse_assessment(&value) else {
            return fallback_outcome(reason_codes::THERAPY_OK_FALLBACK);
        };

        // A greeting request carries no user message; nothing in it can
        // justify escalation, whatever the oracle said.
        if req.user_input.is_none() {
            assessment.risk_level = RiskLevel::Normal;
            return TherapyOutcome {
                assessment,
                reason_code: reason_codes::THERAPY_OK_GREETING,
            };
        }

        TherapyOutcome {
            assessment,
            reason_code: reason_codes::THERAPY_OK_ASSESSED,
        }
    }

    /// Assembled per request: the classification policy, the language rule,
    /// and whichever context blocks apply. The vague-unwellness default is a
    /// deliberate, stated policy, not a hope about model behavior.
    pub fn build_instruction(&self, req: &TherapyRequest) -> String {
        let mut sections: Vec<String> = Vec::new();

        sections.push(
            "You are Solace, a compassionate and empathetic companion for students. Create a \
             safe, non-judgmental space. Never lecture; respond like a steady, caring presence."
                .to_string(),
        );

        match &req.language {
            Some(language) => sections.push(format!(
                "The user has explicitly selected the language '{}'. You MUST respond in it.",
                language.as_str()
            )),
            None => sections.push(
                "Respond in exactly the language and script the user writes in. If they mix \
                 languages using Latin script, reply the same way; do not switch scripts."
                    .to_string(),
            ),
        }

        sections.push(
            "Classify the distress expressed in the user's latest message as 'normal' or 'high'. \
             'normal' covers everyday negative emotion, temporary stress, and mild sadness where \
             the user still shows coping or resilience. 'high' covers significant distress, \
             hopelessness, crisis, inability to cope, or any mention of self-harm or not wanting \
             to exist."
                .to_string(),
        );
        sections.push(
            "IMPORTANT RULE: if the user makes a vague statement about feeling unwell (for \
             example 'I'm not feeling good', 'I feel off', 'I'm down'), ALWAYS classify it as \
             'normal' unless the same message contains another clear and strong crisis \
             indicator. Never escalate on vague feelings alone."
                .to_string(),
        );

        if let Some(mood) = &req.voice_mood {
            sections.push(format!(
                "A vocal analysis of the user's voice detected the mood '{}'. Weigh this \
                 alongside their words; tone can reveal more than phrasing.",
                mood.as_str()
            ));
        }

        if req.vitals.is_some() {
            sections.push(
                "The input document carries today's logged vitals (blood pressure, stress level \
                 out of 100, SpO2). Treat abnormal values as a physiological signal of distress \
                 even when the words read calm."
                    .to_string(),
            );
        }

        if let Some(notice) = &req.alert_notice {
            sections.push(format!(
                "IMPORTANT: the system tried to send a caretaker alert and could not. You MUST \
                 gently tell the user about this, quoting the issue: '{notice}'. Frame it \
                 transparently and compassionately, then continue your normal supportive reply."
            ));
        }

        if req.user_input.is_none() {
            if req.history.is_empty() {
                sections.push(
                    "There is no message yet: greet a first-time user, introduce yourself as \
                     Solace, ask how their day has been, and use risk level 'normal'."
                        .to_string(),
                );
            } else {
                sections.push(
                    "There is no new message: write a short, personalized welcome-back note \
                     grounded in the conversation history, and use risk level 'normal'."
                        .to_string(),
                );
            }
        }

        sections.push(
            "Consider the conversation history in the input document; do not repeat yourself. \
             Answer with a single JSON object: {\"reply\": string, \"risk_level\": \
             \"normal\"|\"high\"}."
                .to_string(),
        );

        sections.join("\n\n")
    }

    pub fn build_input_document(&self, req: &TherapyRequest) -> Value {
        let mut doc = Map::new();
        if let Some(input) = &req.user_input {
            doc.insert("user_input".to_string(), Value::String(input.clone()));
        }
        let start = req.history.len().saturating_sub(self.config.max_history_turns);
        let history: Vec<Value> = req.history[start..]
            .iter()
            .map(|turn| {
                serde_json::json!({
                    "role": turn.role.as_str(),
                    "content": turn.content,
                })
            })
            .collect();
        doc.insert("history".to_string(), Value::Array(history));
        if let Some(mood) = &req.voice_mood {
            doc.insert(
                "voice_mood".to_string(),
                Value::String(mood.as_str().to_string()),
            );
        }
        if let Some(vitals) = &req.vitals {
            doc.insert(
                "vitals".to_string(),
                serde_json::json!({
                    "bp": vitals.bp.as_str(),
                    "stress": vitals.stress.0,
                    "spo2": vitals.spo2.0,
                }),
            );
        }
        if let Some(language) = &req.language {
            doc.insert(
                "language".to_string(),
                Value::String(language.as_str().to_string()),
            );
        }
        if let Some(notice) = &req.alert_notice {
            doc.insert("alert_notice".to_string(), Value::String(notice.clone()));
        }
        Value::Object(doc)
    }
}

fn parse_assessment(value: &Value) -> Option<TherapyAssessment> {
    let reply = value.get("reply")?.as_str()?;
    if reply.trim().is_empty() {
        return None;
    }
    let risk_level = match value.get("risk_level")?.as_str()? {
        "normal" => RiskLevel::Normal,
        "high" => RiskLevel::High,
        _ => return None,
    };
    Some(TherapyAssessment {
        reply: reply.to_string(),
        risk_level,
    })
}

fn fallback_outcome(reason_code: ReasonCodeId) -> TherapyOutcome {
    TherapyOutcome {
        assessment: TherapyAssessment {
            reply: FALLBACK_CLARIFY_REPLY.to_string(),
            risk_level: RiskLevel::Normal,
        },
        reason_code,
    }
}

#![forbid(unsafe_code)]

use serde_json::Value;
use solace_contracts::wellness::{AffirmationRequest, WellnessText};
use solace_contracts::{ReasonCodeId, Validate};

use crate::oracle::{Oracle, OracleCall};

pub mod reason_codes {
    use solace_contracts::ReasonCodeId;

    // CARE.AFFIRM reason-code namespace.
    pub const AFFIRM_OK_GENERATED: ReasonCodeId = ReasonCodeId(0x4146_0001);
    pub const AFFIRM_OK_FALLBACK: ReasonCodeId = ReasonCodeId(0x4146_0002);

    pub const AFFIRM_FAIL_SCHEMA_INVALID: ReasonCodeId = ReasonCodeId(0x4146_00F1);
}

pub const AFFIRMATION_ENGINE_ID: &str = "CARE.AFFIRM";

pub const FALLBACK_AFFIRMATION: &str = "I am capable of handling whatever comes my way.";

const AFFIRMATION_INSTRUCTION: &str = "You craft positive affirmations. Write one short, \
powerful, personal affirmation for the user: first person ('I' or 'My'), positive and \
empowering, directly tied to the stated mood and need, at most two sentences. \
Answer with a single JSON object: {\"affirmation\": string}.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffirmationOutcome {
    pub affirmation: WellnessText,
    pub reason_code: ReasonCodeId,
}

#[derive(Debug, Clone)]
pub struct AffirmationRuntime;

impl AffirmationRuntime {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, oracle: &dyn Oracle, req: &AffirmationRequest) -> AffirmationOutcome {
        if req.validate().is_err() {
            return fallback(reason_codes::AFFIRM_FAIL_SCHEMA_INVALID);
        }
        let input = serde_json::json!({
            "mood": req.mood.as_str(),
            "needs": req.needs,
        });
        let call = match OracleCall::v1(AFFIRMATION_INSTRUCTION, input) {
            Ok(call) => call,
            Err(_) => return fallback(reason_codes::AFFIRM_FAIL_SCHEMA_INVALID),
        };
        let value = match oracle.generate(&call) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return fallback(reason_codes::AFFIRM_OK_FALLBACK),
        };
        let affirmation = value
            .get("affirmation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .and_then(|text| WellnessText::v1(text).ok());
        match affirmation {
            Some(affirmation) => AffirmationOutcome {
                affirmation,
                reason_code: reason_codes::AFFIRM_OK_GENERATED,
            },
            None => fallback(reason_codes::AFFIRM_OK_FALLBACK),
        }
    }
}

impl Default for AffirmationRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn fallback(reason_code: ReasonCodeId) -> AffirmationOutcome {
    AffirmationOutcome {
        affirmation: WellnessText {
            text: FALLBACK_AFFIRMATION.to_string(),
        },
        reason_code,
    }
}

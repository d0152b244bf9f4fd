#![forbid(unsafe_code)]

use serde_json::Value;
use solace_contracts::wellness::{
    CycleInsightRequest, FoodInsightRequest, SleepInsightRequest, WellnessText,
};
use solace_contracts::{ReasonCodeId, Validate};

use crate::oracle::{Oracle, OracleCall};

pub mod reason_codes {
    use solace_contracts::ReasonCodeId;

    // CARE.INSIGHT reason-code namespace.
    pub const INSIGHT_OK_GENERATED: ReasonCodeId = ReasonCodeId(0x494E_0001);
    pub const INSIGHT_OK_FALLBACK: ReasonCodeId = ReasonCodeId(0x494E_0002);

    pub const INSIGHT_FAIL_SCHEMA_INVALID: ReasonCodeId = ReasonCodeId(0x494E_00F1);
}

pub const INSIGHT_ENGINE_ID: &str = "CARE.INSIGHT";

pub const SLEEP_FALLBACK: &str = "I'm having a little trouble analyzing your sleep patterns \
right now. Please try again in a moment.";
pub const FOOD_FALLBACK: &str =
    "I'm having a little trouble analyzing that right now. Please try again in a moment.";
pub const CYCLE_FALLBACK: &str = "I'm having a little trouble generating an insight right now. \
Please try again in a moment.";

const SLEEP_INSTRUCTION: &str = "You are a wellness assistant specializing in circadian rhythms \
and their effect on mood. Analyze the user's sleep schedule against their recent mood logs. \
Comment on schedule consistency (weekday vs weekend), connect any pattern to the logged moods, \
and offer exactly one simple, practical suggestion. Be gentle and non-clinical; use hedged \
phrasing such as 'It seems like...' or 'You might notice...'. Never make medical claims. Keep \
the whole analysis to 2-4 sentences. \
Answer with a single JSON object: {\"analysis\": string}.";

const FOOD_INSTRUCTION: &str = "You are a gentle, encouraging wellness assistant. Analyze the \
user's food diary against their current mood and look for possible connections. Never give \
medical advice or definitive claims; use curious phrasing such as 'Sometimes, certain foods can \
influence...'. If the mood is positive, acknowledge it and note what might be supporting it. If \
a BMI category is present, weave it in gently for energy context only, never weight loss. Offer \
exactly one simple, actionable suggestion. Keep the analysis to 2-3 sentences. \
Answer with a single JSON object: {\"analysis\": string}.";

const CYCLE_INSTRUCTION: &str = "You are a gentle wellness assistant specializing in menstrual \
health. Relate the user's current cycle day to the typical phase (menstrual days 1-5, follicular \
6-14, ovulatory 15-18, luteal 19-28), address their stated mood within that context, and offer \
one supportive self-care suggestion. Never diagnose; use phrasing such as 'It's common to \
feel...'. Keep the insight to 2-3 sentences. \
Answer with a single JSON object: {\"analysis\": string}.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightOutcome {
    pub insight: WellnessText,
    pub reason_code: ReasonCodeId,
}

#[derive(Debug, Clone)]
pub struct InsightRuntime;

impl InsightRuntime {
    pub fn new() -> Self {
        Self
    }

    pub fn sleep_stress(&self, oracle: &dyn Oracle, req: &SleepInsightRequest) -> InsightOutcome {
        if req.validate().is_err() {
            return fallback(SLEEP_FALLBACK, reason_codes::INSIGHT_FAIL_SCHEMA_INVALID);
        }
        let schedule = &req.schedule;
        let moods: Vec<Value> = req
            .recent_moods
            .iter()
            .map(|m| {
                serde_json::json!({
                    "mood": m.mood.as_str(),
                    "observed_at_ns": m.observed_at.0,
                })
            })
            .collect();
        let input = serde_json::json!({
            "sleep_schedule": {
                "weekday_wake": schedule.weekday_wake.as_ref().map(|t| t.as_str()),
                "weekday_sleep": schedule.weekday_sleep.as_ref().map(|t| t.as_str()),
                "weekend_wake": schedule.weekend_wake.as_ref().map(|t| t.as_str()),
                "weekend_sleep": schedule.weekend_sleep.as_ref().map(|t| t.as_str()),
            },
            "recent_moods": moods,
        });
        self.generate(oracle, SLEEP_INSTRUCTION, input, SLEEP_FALLBACK)
    }

    pub fn food_mood(&self, oracle: &dyn Oracle, req: &FoodInsightRequest) -> InsightOutcome {
        if req.validate().is_err() {
            return fallback(FOOD_FALLBACK, reason_codes::INSIGHT_FAIL_SCHEMA_INVALID);
        }
        let input = serde_json::json!({
            "food_diary": req.food_diary,
            "mood": req.mood.as_str(),
            "bmi_category": req.bmi_category,
        });
        self.generate(oracle, FOOD_INSTRUCTION, input, FOOD_FALLBACK)
    }

    pub fn cycle(&self, oracle: &dyn Oracle, req: &CycleInsightRequest) -> InsightOutcome {
        if req.validate().is_err() {
            return fallback(CYCLE_FALLBACK, reason_codes::INSIGHT_FAIL_SCHEMA_INVALID);
        }
        let input = serde_json::json!({
            "day_of_cycle": req.day_of_cycle.0,
            "mood": req.mood.as_str(),
        });
        self.generate(oracle, CYCLE_INSTRUCTION, input, CYCLE_FALLBACK)
    }

    fn generate(
        &self,
        oracle: &dyn Oracle,
        instruction: &str,
        input: Value,
        fallback_text: &str,
    ) -> InsightOutcome {
        let call = match OracleCall::v1(instruction, input) {
            Ok(call) => call,
            Err(_) => return fallback(fallback_text, reason_codes::INSIGHT_FAIL_SCHEMA_INVALID),
        };
        let value = match oracle.generate(&call) {
            Ok(Some(value)) => value,
            Ok(None) | Err(_) => return fallback(fallback_text, reason_codes::INSIGHT_OK_FALLBACK),
        };
        let analysis = value
            .get("analysis")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .and_then(|text| WellnessText::v1(text).ok());
        match analysis {
            Some(insight) => InsightOutcome {
                insight,
                reason_code: reason_codes::INSIGHT_OK_GENERATED,
            },
            None => fallback(fallback_text, reason_codes::INSIGHT_OK_FALLBACK),
        }
    }
}

impl Default for InsightRuntime {
    fn default() -> Self {
        Self::new()
    }
}

fn fallback(text: &str, reason_code: ReasonCodeId) -> InsightOutcome {
    InsightOutcome {
        insight: WellnessText {
            text: text.to_string(),
        },
        reason_code,
    }
}

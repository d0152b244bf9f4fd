#![forbid(unsafe_code)]

use crate::profile::UserId;
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const WELLNESS_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const MAX_FOOD_DIARY_CHARS: usize = 2_000;
pub const MAX_NEEDS_CHARS: usize = 200;
pub const MAX_RECENT_MOODS: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoodLabel(String);

impl MoodLabel {
    pub fn new(label: impl Into<String>) -> Result<Self, ContractViolation> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "mood_label",
                reason: "must not be empty",
            });
        }
        if label.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "mood_label",
                reason: "must be <= 64 chars",
            });
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for MoodLabel {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "mood_label",
                reason: "must not be empty",
            });
        }
        if self.0.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "mood_label",
                reason: "must be <= 64 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MoodScore(pub u8);

impl Validate for MoodScore {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 > 100 {
            return Err(ContractViolation::InvalidRange {
                field: "mood_score",
                min: 0,
                max: 100,
                got: self.0 as i64,
            });
        }
        Ok(())
    }
}

/// Blood pressure as logged, e.g. "120/80". Kept as text the way the user
/// entered it; only the coarse shape is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BloodPressure(String);

impl BloodPressure {
    pub fn new(reading: impl Into<String>) -> Result<Self, ContractViolation> {
        let reading = reading.into();
        if reading.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "blood_pressure",
                reason: "must not be empty",
            });
        }
        if reading.len() > 16 {
            return Err(ContractViolation::InvalidValue {
                field: "blood_pressure",
                reason: "must be <= 16 chars",
            });
        }
        if !reading.contains('/') {
            return Err(ContractViolation::InvalidValue {
                field: "blood_pressure",
                reason: "must look like systolic/diastolic",
            });
        }
        Ok(Self(reading))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for BloodPressure {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.contains('/') {
            return Err(ContractViolation::InvalidValue {
                field: "blood_pressure",
                reason: "must look like systolic/diastolic",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StressScore(pub u8);

impl Validate for StressScore {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 > 100 {
            return Err(ContractViolation::InvalidRange {
                field: "stress_score",
                min: 0,
                max: 100,
                got: self.0 as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Spo2Percent(pub u8);

impl Validate for Spo2Percent {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 > 100 {
            return Err(ContractViolation::InvalidRange {
                field: "spo2_percent",
                min: 0,
                max: 100,
                got: self.0 as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalsSnapshot {
    pub bp: BloodPressure,
    pub stress: StressScore,
    pub spo2: Spo2Percent,
}

impl VitalsSnapshot {
    pub fn v1(
        bp: BloodPressure,
        stress: StressScore,
        spo2: Spo2Percent,
    ) -> Result<Self, ContractViolation> {
        let v = Self { bp, stress, spo2 };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for VitalsSnapshot {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.bp.validate()?;
        self.stress.validate()?;
        self.spo2.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodLogRecord {
    pub schema_version: SchemaVersion,
    pub user_id: UserId,
    pub mood: MoodLabel,
    pub score: MoodScore,
    pub logged_at: MonotonicTimeNs,
}

impl MoodLogRecord {
    pub fn v1(
        user_id: UserId,
        mood: MoodLabel,
        score: MoodScore,
        logged_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            user_id,
            mood,
            score,
            logged_at,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for MoodLogRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "mood_log_record.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        self.mood.validate()?;
        self.score.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalsLogRecord {
    pub schema_version: SchemaVersion,
    pub user_id: UserId,
    pub vitals: VitalsSnapshot,
    pub logged_at: MonotonicTimeNs,
}

impl VitalsLogRecord {
    pub fn v1(
        user_id: UserId,
        vitals: VitalsSnapshot,
        logged_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            user_id,
            vitals,
            logged_at,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for VitalsLogRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "vitals_log_record.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        self.vitals.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleDay(pub u8);

impl Validate for CycleDay {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 || self.0 > 60 {
            return Err(ContractViolation::InvalidRange {
                field: "cycle_day",
                min: 1,
                max: 60,
                got: self.0 as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleLogRecord {
    pub schema_version: SchemaVersion,
    pub user_id: UserId,
    pub day_of_cycle: CycleDay,
    pub mood: MoodLabel,
    pub logged_at: MonotonicTimeNs,
}

impl CycleLogRecord {
    pub fn v1(
        user_id: UserId,
        day_of_cycle: CycleDay,
        mood: MoodLabel,
        logged_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            user_id,
            day_of_cycle,
            mood,
            logged_at,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for CycleLogRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "cycle_log_record.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        self.day_of_cycle.validate()?;
        self.mood.validate()?;
        Ok(())
    }
}

/// Wall-clock "HH:MM" as the user entered it in their sleep schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClockTime(String);

impl ClockTime {
    pub fn new(hhmm: impl Into<String>) -> Result<Self, ContractViolation> {
        let hhmm = hhmm.into();
        let bytes = hhmm.as_bytes();
        let shape_ok = bytes.len() == 5
            && bytes[2] == b':'
            && bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_digit()
            && bytes[3].is_ascii_digit()
            && bytes[4].is_ascii_digit();
        if !shape_ok {
            return Err(ContractViolation::InvalidValue {
                field: "clock_time",
                reason: "must be HH:MM",
            });
        }
        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        if hour > 23 || minute > 59 {
            return Err(ContractViolation::InvalidValue {
                field: "clock_time",
                reason: "must be a valid 24h time",
            });
        }
        Ok(Self(hhmm))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ClockTime {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.len() != 5 {
            return Err(ContractViolation::InvalidValue {
                field: "clock_time",
                reason: "must be HH:MM",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SleepSchedule {
    pub weekday_wake: Option<ClockTime>,
    pub weekday_sleep: Option<ClockTime>,
    pub weekend_wake: Option<ClockTime>,
    pub weekend_sleep: Option<ClockTime>,
}

impl Validate for SleepSchedule {
    fn validate(&self) -> Result<(), ContractViolation> {
        for slot in [
            &self.weekday_wake,
            &self.weekday_sleep,
            &self.weekend_wake,
            &self.weekend_sleep,
        ] {
            if let Some(t) = slot {
                t.validate()?;
            }
        }
        Ok(())
    }
}

/// A mood log row carried as analysis context rather than read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodObservation {
    pub mood: MoodLabel,
    pub observed_at: MonotonicTimeNs,
}

impl Validate for MoodObservation {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.mood.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffirmationRequest {
    pub schema_version: SchemaVersion,
    pub mood: MoodLabel,
    pub needs: String,
}

impl AffirmationRequest {
    pub fn v1(mood: MoodLabel, needs: impl Into<String>) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            mood,
            needs: needs.into(),
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for AffirmationRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "affirmation_request.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.mood.validate()?;
        if self.needs.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "affirmation_request.needs",
                reason: "must not be empty",
            });
        }
        if self.needs.len() > MAX_NEEDS_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "affirmation_request.needs",
                reason: "must be <= MAX_NEEDS_CHARS",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepInsightRequest {
    pub schema_version: SchemaVersion,
    pub schedule: SleepSchedule,
    pub recent_moods: Vec<MoodObservation>,
}

impl SleepInsightRequest {
    pub fn v1(
        schedule: SleepSchedule,
        recent_moods: Vec<MoodObservation>,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            schedule,
            recent_moods,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for SleepInsightRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "sleep_insight_request.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.schedule.validate()?;
        if self.recent_moods.len() > MAX_RECENT_MOODS {
            return Err(ContractViolation::InvalidValue {
                field: "sleep_insight_request.recent_moods",
                reason: "must be <= MAX_RECENT_MOODS entries",
            });
        }
        for m in &self.recent_moods {
            m.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodInsightRequest {
    pub schema_version: SchemaVersion,
    pub food_diary: String,
    pub mood: MoodLabel,
    pub bmi_category: Option<String>,
}

impl FoodInsightRequest {
    pub fn v1(
        food_diary: impl Into<String>,
        mood: MoodLabel,
        bmi_category: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            food_diary: food_diary.into(),
            mood,
            bmi_category,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for FoodInsightRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "food_insight_request.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        if self.food_diary.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "food_insight_request.food_diary",
                reason: "must not be empty",
            });
        }
        if self.food_diary.len() > MAX_FOOD_DIARY_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "food_insight_request.food_diary",
                reason: "must be <= MAX_FOOD_DIARY_CHARS",
            });
        }
        self.mood.validate()?;
        if let Some(category) = &self.bmi_category {
            if category.trim().is_empty() || category.len() > 32 {
                return Err(ContractViolation::InvalidValue {
                    field: "food_insight_request.bmi_category",
                    reason: "must be 1..=32 chars when present",
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleInsightRequest {
    pub schema_version: SchemaVersion,
    pub day_of_cycle: CycleDay,
    pub mood: MoodLabel,
}

impl CycleInsightRequest {
    pub fn v1(day_of_cycle: CycleDay, mood: MoodLabel) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: WELLNESS_CONTRACT_VERSION,
            day_of_cycle,
            mood,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for CycleInsightRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != WELLNESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "cycle_insight_request.schema_version",
                reason: "must match WELLNESS_CONTRACT_VERSION",
            });
        }
        self.day_of_cycle.validate()?;
        self.mood.validate()?;
        Ok(())
    }
}

/// Output of every text-generating wellness engine: a short passage of
/// supportive prose, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellnessText {
    pub text: String,
}

impl WellnessText {
    pub fn v1(text: impl Into<String>) -> Result<Self, ContractViolation> {
        let t = Self { text: text.into() };
        t.validate()?;
        Ok(t)
    }
}

impl Validate for WellnessText {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.text.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "wellness_text.text",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

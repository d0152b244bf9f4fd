#![forbid(unsafe_code)]

use solace_contracts::profile::UserId;
use solace_contracts::wellness::{
    AffirmationRequest, CycleDay, CycleInsightRequest, CycleLogRecord, FoodInsightRequest,
    MoodLabel, MoodLogRecord, MoodScore, SleepInsightRequest, VitalsLogRecord, VitalsSnapshot,
    WellnessText,
};
use solace_contracts::MonotonicTimeNs;
use solace_engines::affirmation::AffirmationRuntime;
use solace_engines::insight::InsightRuntime;
use solace_engines::oracle::Oracle;
use solace_storage::repo::WellnessRepo;
use solace_storage::StorageError;

/// Log appends plus the oracle-backed generators. The generators already
/// degrade to fixed fallback strings inside their engines, so these calls
/// cannot fail; only the storage writes carry errors.
#[derive(Debug, Clone)]
pub struct WellnessFlows {
    affirmation: AffirmationRuntime,
    insight: InsightRuntime,
}

impl WellnessFlows {
    pub fn new() -> Self {
        Self {
            affirmation: AffirmationRuntime::new(),
            insight: InsightRuntime::new(),
        }
    }

    pub fn record_mood(
        &self,
        store: &mut dyn WellnessRepo,
        user_id: UserId,
        mood: MoodLabel,
        score: MoodScore,
        now: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        store.append_mood_log(MoodLogRecord::v1(user_id, mood, score, now)?)
    }

    pub fn record_vitals(
        &self,
        store: &mut dyn WellnessRepo,
        user_id: UserId,
        vitals: VitalsSnapshot,
        now: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        store.append_vitals_log(VitalsLogRecord::v1(user_id, vitals, now)?)
    }

    pub fn record_cycle_day(
        &self,
        store: &mut dyn WellnessRepo,
        user_id: UserId,
        day_of_cycle: CycleDay,
        mood: MoodLabel,
        now: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        store.append_cycle_log(CycleLogRecord::v1(user_id, day_of_cycle, mood, now)?)
    }

    pub fn affirmation(&self, oracle: &dyn Oracle, req: &AffirmationRequest) -> WellnessText {
        self.affirmation.run(oracle, req).affirmation
    }

    pub fn sleep_insight(&self, oracle: &dyn Oracle, req: &SleepInsightRequest) -> WellnessText {
        self.insight.sleep_stress(oracle, req).insight
    }

    pub fn food_insight(&self, oracle: &dyn Oracle, req: &FoodInsightRequest) -> WellnessText {
        self.insight.food_mood(oracle, req).insight
    }

    pub fn cycle_insight(&self, oracle: &dyn Oracle, req: &CycleInsightRequest) -> WellnessText {
        self.insight.cycle(oracle, req).insight
    }
}

impl Default for WellnessFlows {
    fn default() -> Self {
        Self::new()
    }
}

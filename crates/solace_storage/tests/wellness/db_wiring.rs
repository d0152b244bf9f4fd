#![forbid(unsafe_code)]

use solace_contracts::profile::UserId;
use solace_contracts::wellness::{
    BloodPressure, CycleDay, CycleLogRecord, MoodLabel, MoodLogRecord, MoodScore, Spo2Percent,
    StressScore, VitalsLogRecord, VitalsSnapshot,
};
use solace_contracts::MonotonicTimeNs;
use solace_storage::repo::WellnessRepo;
use solace_storage::WellnessStore;

fn user() -> UserId {
    UserId::new("dbw_user_1").unwrap()
}

fn mood(label: &str, score: u8, t: u64) -> MoodLogRecord {
    MoodLogRecord::v1(
        user(),
        MoodLabel::new(label).unwrap(),
        MoodScore(score),
        MonotonicTimeNs(t),
    )
    .unwrap()
}

fn vitals(stress: u8, t: u64) -> VitalsLogRecord {
    VitalsLogRecord::v1(
        user(),
        VitalsSnapshot::v1(
            BloodPressure::new("120/80").unwrap(),
            StressScore(stress),
            Spo2Percent(98),
        )
        .unwrap(),
        MonotonicTimeNs(t),
    )
    .unwrap()
}

#[test]
fn mood_range_read_filters_and_orders_ascending() {
    let mut store = WellnessStore::new_in_memory();
    store.append_mood_log(mood("Happy", 80, 30)).unwrap();
    store.append_mood_log(mood("Stressed", 30, 10)).unwrap();
    store.append_mood_log(mood("Tired", 40, 20)).unwrap();
    store.append_mood_log(mood("Calm", 70, 50)).unwrap();

    let rows = store.mood_logs_in_range(&user(), MonotonicTimeNs(10), MonotonicTimeNs(30));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].mood.as_str(), "Stressed");
    assert_eq!(rows[2].mood.as_str(), "Happy");
}

#[test]
fn mood_range_read_is_scoped_per_user() {
    let mut store = WellnessStore::new_in_memory();
    store.append_mood_log(mood("Happy", 80, 10)).unwrap();
    store
        .append_mood_log(
            MoodLogRecord::v1(
                UserId::new("dbw_user_2").unwrap(),
                MoodLabel::new("Sad").unwrap(),
                MoodScore(20),
                MonotonicTimeNs(11),
            )
            .unwrap(),
        )
        .unwrap();
    let rows = store.mood_logs_in_range(&user(), MonotonicTimeNs(0), MonotonicTimeNs(100));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].mood.as_str(), "Happy");
}

#[test]
fn latest_vitals_in_range_picks_the_newest_row() {
    let mut store = WellnessStore::new_in_memory();
    store.append_vitals_log(vitals(20, 10)).unwrap();
    store.append_vitals_log(vitals(65, 40)).unwrap();
    store.append_vitals_log(vitals(50, 25)).unwrap();

    let row = store
        .latest_vitals_in_range(&user(), MonotonicTimeNs(0), MonotonicTimeNs(100))
        .unwrap();
    assert_eq!(row.vitals.stress, StressScore(65));
}

#[test]
fn latest_vitals_outside_the_window_is_none() {
    let mut store = WellnessStore::new_in_memory();
    store.append_vitals_log(vitals(20, 10)).unwrap();
    assert!(store
        .latest_vitals_in_range(&user(), MonotonicTimeNs(50), MonotonicTimeNs(100))
        .is_none());
}

#[test]
fn cycle_logs_read_back_oldest_first() {
    let mut store = WellnessStore::new_in_memory();
    store
        .append_cycle_log(
            CycleLogRecord::v1(
                user(),
                CycleDay(25),
                MoodLabel::new("Anxious").unwrap(),
                MonotonicTimeNs(20),
            )
            .unwrap(),
        )
        .unwrap();
    store
        .append_cycle_log(
            CycleLogRecord::v1(
                user(),
                CycleDay(2),
                MoodLabel::new("Tired").unwrap(),
                MonotonicTimeNs(5),
            )
            .unwrap(),
        )
        .unwrap();
    let rows = store.cycle_logs(&user());
    assert_eq!(rows[0].day_of_cycle, CycleDay(2));
    assert_eq!(rows[1].day_of_cycle, CycleDay(25));
}

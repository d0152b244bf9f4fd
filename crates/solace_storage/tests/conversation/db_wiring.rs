#![forbid(unsafe_code)]

use solace_contracts::chat::{ChatRole, ConversationTurnInput, TurnId, TurnSource};
use solace_contracts::profile::UserId;
use solace_contracts::MonotonicTimeNs;
use solace_storage::repo::ConversationRepo;
use solace_storage::WellnessStore;

fn user() -> UserId {
    UserId::new("dbw_user_1").unwrap()
}

fn other_user() -> UserId {
    UserId::new("dbw_user_2").unwrap()
}

fn turn(
    user_id: UserId,
    role: ChatRole,
    content: &str,
    t: u64,
    idempotency_key: Option<&str>,
) -> ConversationTurnInput {
    ConversationTurnInput::v1(
        MonotonicTimeNs(t),
        user_id,
        role,
        match role {
            ChatRole::User => TurnSource::TypedText,
            ChatRole::Companion => TurnSource::CompanionOutput,
        },
        content,
        idempotency_key.map(str::to_string),
    )
    .unwrap()
}

#[test]
fn conversation_appends_are_ordered_and_ids_monotonic() {
    let mut store = WellnessStore::new_in_memory();
    let a = store
        .append_conversation_turn(turn(user(), ChatRole::User, "hello", 1, None))
        .unwrap();
    let b = store
        .append_conversation_turn(turn(user(), ChatRole::Companion, "hi there", 2, None))
        .unwrap();
    assert_eq!(a, TurnId(1));
    assert_eq!(b, TurnId(2));
    assert_eq!(store.conversation_rows().len(), 2);
    assert!(store.conversation_rows()[0].created_at < store.conversation_rows()[1].created_at);
}

#[test]
fn append_assigns_a_sha256_content_hash() {
    let mut store = WellnessStore::new_in_memory();
    store
        .append_conversation_turn(turn(user(), ChatRole::User, "hello", 1, None))
        .unwrap();
    let row = &store.conversation_rows()[0];
    assert_eq!(row.content_hash.len(), 64);
    assert!(row.content_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn idempotent_retry_returns_the_original_turn_id_without_a_second_row() {
    let mut store = WellnessStore::new_in_memory();
    let first = store
        .append_conversation_turn(turn(user(), ChatRole::User, "hello", 1, Some("idem_1")))
        .unwrap();
    let retry = store
        .append_conversation_turn(turn(user(), ChatRole::User, "hello", 5, Some("idem_1")))
        .unwrap();
    assert_eq!(first, retry);
    assert_eq!(store.conversation_rows().len(), 1);
}

#[test]
fn same_idempotency_key_under_different_users_is_two_rows() {
    let mut store = WellnessStore::new_in_memory();
    store
        .append_conversation_turn(turn(user(), ChatRole::User, "hello", 1, Some("idem_1")))
        .unwrap();
    store
        .append_conversation_turn(turn(other_user(), ChatRole::User, "hello", 2, Some("idem_1")))
        .unwrap();
    assert_eq!(store.conversation_rows().len(), 2);
}

#[test]
fn recent_turns_returns_the_newest_window_oldest_first() {
    let mut store = WellnessStore::new_in_memory();
    for i in 1..=6u64 {
        store
            .append_conversation_turn(turn(
                user(),
                ChatRole::User,
                &format!("message {i}"),
                i,
                None,
            ))
            .unwrap();
    }
    store
        .append_conversation_turn(turn(other_user(), ChatRole::User, "other", 7, None))
        .unwrap();

    let recent = store.recent_turns(&user(), 3);
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].content, "message 4");
    assert_eq!(recent[2].content, "message 6");
    assert!(recent.iter().all(|row| row.user_id == user()));
}

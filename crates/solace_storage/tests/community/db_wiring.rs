#![forbid(unsafe_code)]

use solace_contracts::community::{AuthorAlias, PostId, PostSubmission, ReplySubmission};
use solace_contracts::profile::UserId;
use solace_contracts::MonotonicTimeNs;
use solace_storage::repo::CommunityRepo;
use solace_storage::{StorageError, WellnessStore};

fn author() -> AuthorAlias {
    AuthorAlias::anonymize(&UserId::new("dbw_user_1").unwrap())
}

fn post() -> PostSubmission {
    PostSubmission::v1("exam stress", "I am overwhelmed by finals week and cannot sleep").unwrap()
}

#[test]
fn posts_start_with_zero_replies() {
    let mut store = WellnessStore::new_in_memory();
    let post_id = store
        .append_post(&post(), author(), MonotonicTimeNs(1))
        .unwrap();
    assert_eq!(store.post(post_id).unwrap().reply_count, 0);
}

#[test]
fn appending_a_reply_bumps_the_parent_reply_count() {
    let mut store = WellnessStore::new_in_memory();
    let post_id = store
        .append_post(&post(), author(), MonotonicTimeNs(1))
        .unwrap();
    store
        .append_reply(
            post_id,
            &ReplySubmission::v1("hang in there").unwrap(),
            author(),
            MonotonicTimeNs(2),
        )
        .unwrap();
    store
        .append_reply(
            post_id,
            &ReplySubmission::v1("it gets easier after the first exam").unwrap(),
            author(),
            MonotonicTimeNs(3),
        )
        .unwrap();
    assert_eq!(store.post(post_id).unwrap().reply_count, 2);
    assert_eq!(store.replies_for(post_id).len(), 2);
}

#[test]
fn reply_to_a_missing_post_is_a_foreign_key_violation() {
    let mut store = WellnessStore::new_in_memory();
    let err = store
        .append_reply(
            PostId(99),
            &ReplySubmission::v1("hello").unwrap(),
            author(),
            MonotonicTimeNs(1),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::ForeignKeyViolation { table: "community_replies", .. }
    ));
}

#[test]
fn posts_read_newest_first() {
    let mut store = WellnessStore::new_in_memory();
    store
        .append_post(&post(), author(), MonotonicTimeNs(1))
        .unwrap();
    let newer = store
        .append_post(
            &PostSubmission::v1("lonely lately", "I feel alone in my new dorm this term").unwrap(),
            author(),
            MonotonicTimeNs(5),
        )
        .unwrap();
    let rows = store.posts_recent_first();
    assert_eq!(rows[0].post_id, newer);
}

#[test]
fn stored_author_is_the_anonymized_alias() {
    let mut store = WellnessStore::new_in_memory();
    let post_id = store
        .append_post(&post(), author(), MonotonicTimeNs(1))
        .unwrap();
    assert_eq!(store.post(post_id).unwrap().author_alias.as_str(), "anonymous_dbw_u");
}

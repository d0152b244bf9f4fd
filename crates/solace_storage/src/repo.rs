#![forbid(unsafe_code)]

use solace_contracts::chat::{ConversationTurnInput, ConversationTurnRecord, TurnId};
use solace_contracts::community::{
    AuthorAlias, CommunityPostRecord, CommunityReplyRecord, PostId, PostSubmission, ReplyId,
    ReplySubmission,
};
use solace_contracts::profile::UserId;
use solace_contracts::wellness::{CycleLogRecord, MoodLogRecord, VitalsLogRecord};
use solace_contracts::MonotonicTimeNs;

use crate::store::StorageError;

/// Append-only chat turn storage, keyed per user. Turn ids are assigned
/// monotonically; an idempotency key makes retried appends deterministic
/// no-ops returning the original id.
pub trait ConversationRepo {
    fn append_conversation_turn(
        &mut self,
        input: ConversationTurnInput,
    ) -> Result<TurnId, StorageError>;

    /// The most recent `limit` turns for a user, oldest first.
    fn recent_turns(&self, user_id: &UserId, limit: usize) -> Vec<&ConversationTurnRecord>;

    fn conversation_rows(&self) -> &[ConversationTurnRecord];
}

/// Moderated community content. The caller decides whether to append; the
/// store only enforces referential integrity and counts.
pub trait CommunityRepo {
    fn append_post(
        &mut self,
        submission: &PostSubmission,
        author: AuthorAlias,
        created_at: MonotonicTimeNs,
    ) -> Result<PostId, StorageError>;

    /// Appends under an existing post and bumps its reply count.
    fn append_reply(
        &mut self,
        post_id: PostId,
        submission: &ReplySubmission,
        author: AuthorAlias,
        created_at: MonotonicTimeNs,
    ) -> Result<ReplyId, StorageError>;

    fn post(&self, post_id: PostId) -> Option<&CommunityPostRecord>;

    /// All posts, newest first.
    fn posts_recent_first(&self) -> Vec<&CommunityPostRecord>;

    /// Replies for one post, oldest first.
    fn replies_for(&self, post_id: PostId) -> Vec<&CommunityReplyRecord>;
}

/// Per-user wellness logs with timestamp range reads. Windows are computed by
/// the caller; the store just filters and orders.
pub trait WellnessRepo {
    fn append_mood_log(&mut self, record: MoodLogRecord) -> Result<(), StorageError>;
    fn append_vitals_log(&mut self, record: VitalsLogRecord) -> Result<(), StorageError>;
    fn append_cycle_log(&mut self, record: CycleLogRecord) -> Result<(), StorageError>;

    /// Mood logs in `[from, to]`, oldest first.
    fn mood_logs_in_range(
        &self,
        user_id: &UserId,
        from: MonotonicTimeNs,
        to: MonotonicTimeNs,
    ) -> Vec<&MoodLogRecord>;

    /// The newest vitals log in `[from, to]`, if any.
    fn latest_vitals_in_range(
        &self,
        user_id: &UserId,
        from: MonotonicTimeNs,
        to: MonotonicTimeNs,
    ) -> Option<&VitalsLogRecord>;

    /// All cycle logs for a user, oldest first.
    fn cycle_logs(&self, user_id: &UserId) -> Vec<&CycleLogRecord>;
}

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use solace_contracts::chat::{ConversationTurnInput, ConversationTurnRecord, TurnId};
use solace_contracts::community::{
    AuthorAlias, CommunityPostRecord, CommunityReplyRecord, PostId, PostSubmission, ReplyId,
    ReplySubmission, COMMUNITY_CONTRACT_VERSION,
};
use solace_contracts::profile::UserId;
use solace_contracts::wellness::{CycleLogRecord, MoodLogRecord, VitalsLogRecord};
use solace_contracts::{ContractViolation, MonotonicTimeNs, Validate};

use crate::repo::{CommunityRepo, ConversationRepo, WellnessRepo};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    ForeignKeyViolation { table: &'static str, key: String },
    DuplicateKey { table: &'static str, key: String },
    ContractViolation(ContractViolation),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

fn sha256_hex(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// In-memory document store: append-only ledgers plus keyed current rows.
/// Every write is independently keyed per user or post; nothing here needs
/// compare-and-swap semantics.
#[derive(Debug, Clone, Default)]
pub struct WellnessStore {
    conversation_ledger: Vec<ConversationTurnRecord>,
    // (user_id, idempotency_key) -> turn_id: deterministic no-op on retry.
    conversation_idempotency_index: BTreeMap<(UserId, String), TurnId>,
    next_turn_seq: u64,

    posts: BTreeMap<PostId, CommunityPostRecord>,
    next_post_seq: u64,
    replies: Vec<CommunityReplyRecord>,
    next_reply_seq: u64,

    mood_ledger: Vec<MoodLogRecord>,
    vitals_ledger: Vec<VitalsLogRecord>,
    cycle_ledger: Vec<CycleLogRecord>,
}

impl WellnessStore {
    pub fn new_in_memory() -> Self {
        Self {
            next_turn_seq: 1,
            next_post_seq: 1,
            next_reply_seq: 1,
            ..Self::default()
        }
    }

    pub fn conversation_turn_count(&self) -> usize {
        self.conversation_ledger.len()
    }

    pub fn community_post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn community_reply_count(&self) -> usize {
        self.replies.len()
    }
}

impl ConversationRepo for WellnessStore {
    fn append_conversation_turn(
        &mut self,
        input: ConversationTurnInput,
    ) -> Result<TurnId, StorageError> {
        input.validate()?;

        if let Some(key) = &input.idempotency_key {
            let index_key = (input.user_id.clone(), key.clone());
            if let Some(existing) = self.conversation_idempotency_index.get(&index_key) {
                return Ok(*existing);
            }
        }

        let turn_id = TurnId(self.next_turn_seq);
        self.next_turn_seq += 1;

        let record = ConversationTurnRecord {
            schema_version: input.schema_version,
            turn_id,
            created_at: input.created_at,
            user_id: input.user_id.clone(),
            role: input.role,
            source: input.source,
            content_hash: sha256_hex(&input.content),
            content: input.content,
            idempotency_key: input.idempotency_key.clone(),
        };
        record.validate()?;

        if let Some(key) = input.idempotency_key {
            self.conversation_idempotency_index
                .insert((input.user_id, key), turn_id);
        }
        self.conversation_ledger.push(record);
        Ok(turn_id)
    }

    fn recent_turns(&self, user_id: &UserId, limit: usize) -> Vec<&ConversationTurnRecord> {
        let mut rows: Vec<&ConversationTurnRecord> = self
            .conversation_ledger
            .iter()
            .filter(|row| &row.user_id == user_id)
            .collect();
        let start = rows.len().saturating_sub(limit);
        rows.drain(..start);
        rows
    }

    fn conversation_rows(&self) -> &[ConversationTurnRecord] {
        &self.conversation_ledger
    }
}

impl CommunityRepo for WellnessStore {
    fn append_post(
        &mut self,
        submission: &PostSubmission,
        author: AuthorAlias,
        created_at: MonotonicTimeNs,
    ) -> Result<PostId, StorageError> {
        submission.validate()?;
        author.validate()?;

        let post_id = PostId(self.next_post_seq);
        self.next_post_seq += 1;

        let record = CommunityPostRecord {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            post_id,
            title: submission.title.clone(),
            content: submission.content.clone(),
            author_alias: author,
            created_at,
            reply_count: 0,
        };
        record.validate()?;
        self.posts.insert(post_id, record);
        Ok(post_id)
    }

    fn append_reply(
        &mut self,
        post_id: PostId,
        submission: &ReplySubmission,
        author: AuthorAlias,
        created_at: MonotonicTimeNs,
    ) -> Result<ReplyId, StorageError> {
        submission.validate()?;
        author.validate()?;

        if !self.posts.contains_key(&post_id) {
            return Err(StorageError::ForeignKeyViolation {
                table: "community_replies",
                key: format!("post_id={}", post_id.0),
            });
        }

        let reply_id = ReplyId(self.next_reply_seq);
        self.next_reply_seq += 1;

        let record = CommunityReplyRecord {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            reply_id,
            post_id,
            content: submission.content.clone(),
            author_alias: author,
            created_at,
        };
        record.validate()?;
        self.replies.push(record);

        if let Some(post) = self.posts.get_mut(&post_id) {
            post.reply_count = post.reply_count.saturating_add(1);
        }
        Ok(reply_id)
    }

    fn post(&self, post_id: PostId) -> Option<&CommunityPostRecord> {
        self.posts.get(&post_id)
    }

    fn posts_recent_first(&self) -> Vec<&CommunityPostRecord> {
        let mut rows: Vec<&CommunityPostRecord> = self.posts.values().collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.post_id.cmp(&a.post_id))
        });
        rows
    }

    fn replies_for(&self, post_id: PostId) -> Vec<&CommunityReplyRecord> {
        self.replies
            .iter()
            .filter(|row| row.post_id == post_id)
            .collect()
    }
}

impl WellnessRepo for WellnessStore {
    fn append_mood_log(&mut self, record: MoodLogRecord) -> Result<(), StorageError> {
        record.validate()?;
        self.mood_ledger.push(record);
        Ok(())
    }

    fn append_vitals_log(&mut self, record: VitalsLogRecord) -> Result<(), StorageError> {
        record.validate()?;
        self.vitals_ledger.push(record);
        Ok(())
    }

    fn append_cycle_log(&mut self, record: CycleLogRecord) -> Result<(), StorageError> {
        record.validate()?;
        self.cycle_ledger.push(record);
        Ok(())
    }

    fn mood_logs_in_range(
        &self,
        user_id: &UserId,
        from: MonotonicTimeNs,
        to: MonotonicTimeNs,
    ) -> Vec<&MoodLogRecord> {
        let mut rows: Vec<&MoodLogRecord> = self
            .mood_ledger
            .iter()
            .filter(|row| {
                &row.user_id == user_id && row.logged_at >= from && row.logged_at <= to
            })
            .collect();
        rows.sort_by_key(|row| row.logged_at);
        rows
    }

    fn latest_vitals_in_range(
        &self,
        user_id: &UserId,
        from: MonotonicTimeNs,
        to: MonotonicTimeNs,
    ) -> Option<&VitalsLogRecord> {
        self.vitals_ledger
            .iter()
            .filter(|row| {
                &row.user_id == user_id && row.logged_at >= from && row.logged_at <= to
            })
            .max_by_key(|row| row.logged_at)
    }

    fn cycle_logs(&self, user_id: &UserId) -> Vec<&CycleLogRecord> {
        let mut rows: Vec<&CycleLogRecord> = self
            .cycle_ledger
            .iter()
            .filter(|row| &row.user_id == user_id)
            .collect();
        rows.sort_by_key(|row| row.logged_at);
        rows
    }
}

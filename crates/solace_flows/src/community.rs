#![forbid(unsafe_code)]

use solace_contracts::community::{
    AuthorAlias, ModerationVerdict, PostId, PostSubmission, ReplySubmission,
};
use solace_contracts::profile::UserId;
use solace_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use solace_engines::moderation::{ModerationConfig, ModerationRuntime};
use solace_engines::oracle::Oracle;
use solace_storage::repo::CommunityRepo;
use solace_storage::StorageError;

/// Generic rejection surfaced when the submission flow itself errors.
pub const SUBMIT_ERROR_REASON: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum CommunityFlowError {
    Contract(ContractViolation),
    Storage(StorageError),
}

impl From<ContractViolation> for CommunityFlowError {
    fn from(v: ContractViolation) -> Self {
        CommunityFlowError::Contract(v)
    }
}

impl From<StorageError> for CommunityFlowError {
    fn from(v: StorageError) -> Self {
        CommunityFlowError::Storage(v)
    }
}

/// Moderate, then persist only on approval. A rejected verdict never writes;
/// the submitter must resubmit fresh content.
#[derive(Debug, Clone)]
pub struct CommunityFlows {
    moderation: ModerationRuntime,
}

impl CommunityFlows {
    pub fn new(config: ModerationConfig) -> Self {
        Self {
            moderation: ModerationRuntime::new(config),
        }
    }

    pub fn error_verdict() -> ModerationVerdict {
        ModerationVerdict::rejected(SUBMIT_ERROR_REASON)
    }

    pub fn submit_post(
        &self,
        oracle: &dyn Oracle,
        store: &mut dyn CommunityRepo,
        user_id: &UserId,
        submission: &PostSubmission,
        now: MonotonicTimeNs,
    ) -> Result<ModerationVerdict, CommunityFlowError> {
        submission.validate()?;
        let outcome = self.moderation.review_post(oracle, submission);
        if outcome.verdict.approved {
            store.append_post(submission, AuthorAlias::anonymize(user_id), now)?;
        }
        Ok(outcome.verdict)
    }

    pub fn submit_reply(
        &self,
        oracle: &dyn Oracle,
        store: &mut dyn CommunityRepo,
        user_id: &UserId,
        post_id: PostId,
        submission: &ReplySubmission,
        now: MonotonicTimeNs,
    ) -> Result<ModerationVerdict, CommunityFlowError> {
        submission.validate()?;
        let outcome = self.moderation.review_reply(oracle, submission);
        if outcome.verdict.approved {
            store.append_reply(post_id, submission, AuthorAlias::anonymize(user_id), now)?;
        }
        Ok(outcome.verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use solace_contracts::voice::{AudioPayload, SpeechFormat, TranscriptBundle};
    use solace_engines::moderation::UNVERIFIED_REASON;
    use solace_engines::oracle::{OracleCall, OracleCallError};
    use solace_storage::WellnessStore;

    struct FixedOracle(Option<Value>);

    impl Oracle for FixedOracle {
        fn generate(&self, _call: &OracleCall) -> Result<Option<Value>, OracleCallError> {
            Ok(self.0.clone())
        }
        fn transcribe_and_detect_mood(
            &self,
            _audio: &AudioPayload,
        ) -> Result<Option<TranscriptBundle>, OracleCallError> {
            Ok(None)
        }
        fn synthesize_speech(
            &self,
            _text: &str,
            _format: &SpeechFormat,
        ) -> Result<Option<Vec<u8>>, OracleCallError> {
            Ok(None)
        }
    }

    fn approving() -> FixedOracle {
        FixedOracle(Some(serde_json::json!({"approved": true, "reason": null})))
    }

    fn rejecting(reason: &str) -> FixedOracle {
        FixedOracle(Some(serde_json::json!({"approved": false, "reason": reason})))
    }

    fn flows() -> CommunityFlows {
        CommunityFlows::new(ModerationConfig::mvp_v1())
    }

    fn user() -> UserId {
        UserId::new("student_community").unwrap()
    }

    fn post() -> PostSubmission {
        PostSubmission::v1("exam anxiety", "I've been feeling so anxious about finals lately")
            .unwrap()
    }

    #[test]
    fn at_community_01_approved_post_is_persisted() {
        let mut store = WellnessStore::new_in_memory();
        let verdict = flows()
            .submit_post(&approving(), &mut store, &user(), &post(), MonotonicTimeNs(1))
            .unwrap();
        assert!(verdict.approved);
        assert_eq!(store.community_post_count(), 1);
        assert_eq!(
            store.posts_recent_first()[0].author_alias.as_str(),
            "anonymous_stude"
        );
    }

    #[test]
    fn at_community_02_rejected_post_never_writes() {
        let mut store = WellnessStore::new_in_memory();
        let verdict = flows()
            .submit_post(
                &rejecting("Advertisements are not allowed in this community."),
                &mut store,
                &user(),
                &PostSubmission::v1("bike for sale", "Selling my old bike, DM me for details")
                    .unwrap(),
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert!(!verdict.approved);
        assert!(verdict.reason.as_deref().unwrap().contains("Advertisements"));
        assert_eq!(store.community_post_count(), 0);
    }

    #[test]
    fn at_community_03_empty_oracle_fails_closed_and_writes_nothing() {
        let mut store = WellnessStore::new_in_memory();
        let verdict = flows()
            .submit_post(
                &FixedOracle(None),
                &mut store,
                &user(),
                &post(),
                MonotonicTimeNs(1),
            )
            .unwrap();
        assert!(!verdict.approved);
        assert_eq!(verdict.reason.as_deref(), Some(UNVERIFIED_REASON));
        assert_eq!(store.community_post_count(), 0);
    }

    #[test]
    fn at_community_04_approved_reply_bumps_the_parent_count() {
        let mut store = WellnessStore::new_in_memory();
        flows()
            .submit_post(&approving(), &mut store, &user(), &post(), MonotonicTimeNs(1))
            .unwrap();
        let post_id = store.posts_recent_first()[0].post_id;
        let verdict = flows()
            .submit_reply(
                &approving(),
                &mut store,
                &user(),
                post_id,
                &ReplySubmission::v1("you should better manage time and work").unwrap(),
                MonotonicTimeNs(2),
            )
            .unwrap();
        assert!(verdict.approved);
        assert_eq!(store.post(post_id).unwrap().reply_count, 1);
        assert_eq!(store.community_reply_count(), 1);
    }

    #[test]
    fn at_community_05_rejected_reply_leaves_the_count_untouched() {
        let mut store = WellnessStore::new_in_memory();
        flows()
            .submit_post(&approving(), &mut store, &user(), &post(), MonotonicTimeNs(1))
            .unwrap();
        let post_id = store.posts_recent_first()[0].post_id;
        let verdict = flows()
            .submit_reply(
                &rejecting("This reply dismisses the poster's feelings without offering support."),
                &mut store,
                &user(),
                post_id,
                &ReplySubmission::v1("Just get over it, that's not a real problem").unwrap(),
                MonotonicTimeNs(2),
            )
            .unwrap();
        assert!(!verdict.approved);
        assert!(verdict.reason.as_deref().unwrap().contains("dismisses"));
        assert_eq!(store.post(post_id).unwrap().reply_count, 0);
        assert_eq!(store.community_reply_count(), 0);
    }

    #[test]
    fn at_community_06_reply_to_missing_post_surfaces_a_storage_error() {
        let mut store = WellnessStore::new_in_memory();
        let err = flows()
            .submit_reply(
                &approving(),
                &mut store,
                &user(),
                PostId(41),
                &ReplySubmission::v1("hang in there").unwrap(),
                MonotonicTimeNs(2),
            )
            .unwrap_err();
        assert!(matches!(err, CommunityFlowError::Storage(_)));
    }
}

#![forbid(unsafe_code)]

use crate::profile::UserId;
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const COMMUNITY_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const MIN_POST_TITLE_CHARS: usize = 3;
pub const MAX_POST_TITLE_CHARS: usize = 150;
pub const MIN_POST_CONTENT_CHARS: usize = 10;
pub const MAX_POST_CONTENT_CHARS: usize = 10_000;
pub const MAX_REPLY_CONTENT_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId(pub u64);

impl Validate for PostId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "post_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyId(pub u64);

impl Validate for ReplyId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "reply_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Display identity for community content. Community posts never carry the
/// real user id; the alias is derived from it at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorAlias(String);

impl AuthorAlias {
    pub fn anonymize(user_id: &UserId) -> Self {
        let prefix: String = user_id.as_str().chars().take(5).collect();
        Self(format!("anonymous_{prefix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for AuthorAlias {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.starts_with("anonymous_") {
            return Err(ContractViolation::InvalidValue {
                field: "author_alias",
                reason: "must be an anonymized alias",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSubmission {
    pub schema_version: SchemaVersion,
    pub title: String,
    pub content: String,
}

impl PostSubmission {
    pub fn v1(
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, ContractViolation> {
        let s = Self {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            title: title.into(),
            content: content.into(),
        };
        s.validate()?;
        Ok(s)
    }
}

impl Validate for PostSubmission {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != COMMUNITY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "post_submission.schema_version",
                reason: "must match COMMUNITY_CONTRACT_VERSION",
            });
        }
        let title_chars = self.title.trim().chars().count();
        if title_chars < MIN_POST_TITLE_CHARS {
            return Err(ContractViolation::InvalidRange {
                field: "post_submission.title",
                min: MIN_POST_TITLE_CHARS as i64,
                max: MAX_POST_TITLE_CHARS as i64,
                got: title_chars as i64,
            });
        }
        if title_chars > MAX_POST_TITLE_CHARS {
            return Err(ContractViolation::InvalidRange {
                field: "post_submission.title",
                min: MIN_POST_TITLE_CHARS as i64,
                max: MAX_POST_TITLE_CHARS as i64,
                got: title_chars as i64,
            });
        }
        let content_chars = self.content.trim().chars().count();
        if content_chars < MIN_POST_CONTENT_CHARS {
            return Err(ContractViolation::InvalidRange {
                field: "post_submission.content",
                min: MIN_POST_CONTENT_CHARS as i64,
                max: MAX_POST_CONTENT_CHARS as i64,
                got: content_chars as i64,
            });
        }
        if content_chars > MAX_POST_CONTENT_CHARS {
            return Err(ContractViolation::InvalidRange {
                field: "post_submission.content",
                min: MIN_POST_CONTENT_CHARS as i64,
                max: MAX_POST_CONTENT_CHARS as i64,
                got: content_chars as i64,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySubmission {
    pub schema_version: SchemaVersion,
    pub content: String,
}

impl ReplySubmission {
    pub fn v1(content: impl Into<String>) -> Result<Self, ContractViolation> {
        let s = Self {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            content: content.into(),
        };
        s.validate()?;
        Ok(s)
    }
}

impl Validate for ReplySubmission {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != COMMUNITY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "reply_submission.schema_version",
                reason: "must match COMMUNITY_CONTRACT_VERSION",
            });
        }
        let content_chars = self.content.trim().chars().count();
        if content_chars == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "reply_submission.content",
                reason: "must not be empty",
            });
        }
        if content_chars > MAX_REPLY_CONTENT_CHARS {
            return Err(ContractViolation::InvalidRange {
                field: "reply_submission.content",
                min: 1,
                max: MAX_REPLY_CONTENT_CHARS as i64,
                got: content_chars as i64,
            });
        }
        Ok(())
    }
}

/// Gate decision for a submitted post or reply. A rejected verdict must carry
/// a reason; the calling context persists content only on approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub schema_version: SchemaVersion,
    pub approved: bool,
    pub reason: Option<String>,
}

impl ModerationVerdict {
    pub fn approved() -> Self {
        Self {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            approved: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            approved: false,
            reason: Some(reason.into()),
        }
    }
}

impl Validate for ModerationVerdict {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != COMMUNITY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "moderation_verdict.schema_version",
                reason: "must match COMMUNITY_CONTRACT_VERSION",
            });
        }
        if !self.approved {
            match &self.reason {
                Some(reason) if !reason.trim().is_empty() => {}
                _ => {
                    return Err(ContractViolation::InvalidValue {
                        field: "moderation_verdict.reason",
                        reason: "must be present for a rejected verdict",
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityPostRecord {
    pub schema_version: SchemaVersion,
    pub post_id: PostId,
    pub title: String,
    pub content: String,
    pub author_alias: AuthorAlias,
    pub created_at: MonotonicTimeNs,
    pub reply_count: u32,
}

impl Validate for CommunityPostRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != COMMUNITY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "community_post_record.schema_version",
                reason: "must match COMMUNITY_CONTRACT_VERSION",
            });
        }
        self.post_id.validate()?;
        self.author_alias.validate()?;
        if self.title.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "community_post_record.title",
                reason: "must not be empty",
            });
        }
        if self.content.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "community_post_record.content",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityReplyRecord {
    pub schema_version: SchemaVersion,
    pub reply_id: ReplyId,
    pub post_id: PostId,
    pub content: String,
    pub author_alias: AuthorAlias,
    pub created_at: MonotonicTimeNs,
}

impl Validate for CommunityReplyRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != COMMUNITY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "community_reply_record.schema_version",
                reason: "must match COMMUNITY_CONTRACT_VERSION",
            });
        }
        self.reply_id.validate()?;
        self.post_id.validate()?;
        self.author_alias.validate()?;
        if self.content.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "community_reply_record.content",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_title_must_be_at_least_three_chars() {
        assert!(PostSubmission::v1("hi", "a long enough body here").is_err());
        assert!(PostSubmission::v1("exams", "a long enough body here").is_ok());
    }

    #[test]
    fn post_content_must_be_at_least_ten_chars() {
        assert!(PostSubmission::v1("exams", "too short").is_err());
    }

    #[test]
    fn reply_rejects_empty_and_oversized_content() {
        assert!(ReplySubmission::v1("  ").is_err());
        assert!(ReplySubmission::v1("a".repeat(MAX_REPLY_CONTENT_CHARS + 1)).is_err());
        assert!(ReplySubmission::v1("hang in there").is_ok());
    }

    #[test]
    fn rejected_verdict_requires_a_reason() {
        let bare = ModerationVerdict {
            schema_version: COMMUNITY_CONTRACT_VERSION,
            approved: false,
            reason: None,
        };
        assert!(bare.validate().is_err());
        assert!(ModerationVerdict::rejected("contains advertising")
            .validate()
            .is_ok());
    }

    #[test]
    fn alias_takes_first_five_chars_of_user_id() {
        let alias = AuthorAlias::anonymize(&UserId::new("student_77").unwrap());
        assert_eq!(alias.as_str(), "anonymous_stude");
    }
}

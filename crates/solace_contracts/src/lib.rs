#![forbid(unsafe_code)]

pub mod chat;
pub mod common;
pub mod community;
pub mod profile;
pub mod voice;
pub mod wellness;

pub use common::{
    ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, Validate,
};

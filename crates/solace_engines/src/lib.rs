#![forbid(unsafe_code)]

pub mod affirmation;
pub mod alert;
pub mod insight;
pub mod moderation;
pub mod oracle;
pub mod therapy;
pub mod voice;
pub mod wav;

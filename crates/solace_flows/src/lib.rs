#![forbid(unsafe_code)]

pub mod community;
pub mod therapy;
pub mod voice;
pub mod wellness;

// content-safety: moderation decisions on top of Azure Content Safety.
//
// This is the library root. `client` talks to the remote API, `moderation`
// holds the decision types and the aggregation logic built on top of them.

pub mod client;
pub mod config;
pub mod error;
pub mod moderation;

pub use client::ContentSafetyClient;
pub use config::ContentSafetyConfig;
pub use error::{ContentSafetyError, Result};
pub use moderation::category::{Category, CategoryScore};
pub use moderation::traits::ContentModerator;
pub use moderation::verdict::{ModerationStatus, Verdict};

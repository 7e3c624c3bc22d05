// Azure Content Safety client.
//
// `http` is the retrying transport, `wire` the JSON bodies, `azure` the
// moderation calls and `blocklist` the list management calls. Everything is
// reached through ContentSafetyClient.

pub mod azure;
pub mod blocklist;
pub mod http;
mod wire;

pub use azure::{ContentSafetyClient, ProtectedMaterial};
pub use blocklist::{Blocklist, BlocklistItem, NewBlocklistItem};

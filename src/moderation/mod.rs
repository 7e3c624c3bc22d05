// Moderation decisions: backend-independent types and aggregation.
//
// Nothing here talks to the network. The client module produces verdicts
// through the ContentModerator trait; batch, context and guard logic work
// on any implementation of it.

pub mod batch;
pub mod category;
pub mod decision;
pub mod guard;
pub mod request;
pub mod severity;
pub mod traits;
pub mod verdict;

//! The two halves of the relay: turning inbound attachments into links (ingest + reply)
//! and turning links back into storage paths (resolver).

mod ingest;
mod reply;
mod resolver;

pub use ingest::UpdateIngestor;
pub use reply::ReplyEmitter;
pub use resolver::{FileResolver, PathResolver, ResolveError, ResolvedPath};

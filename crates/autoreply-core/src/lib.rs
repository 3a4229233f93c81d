pub mod config;
pub mod error;
pub mod reply;
pub mod resolver;
pub mod slot;

// Re-export common types
pub use config::AutoReplyConfig;
pub use error::{AutoReplyError, Result};
pub use reply::{ReplyMode, ReplyStore};
pub use resolver::{FALLBACK_REPLY, IncomingMessage, ReplyResolver, ResolveError};
pub use slot::{InMemorySlot, KeyValueSlot};

//! Reply domain module.
//!
//! # Module Structure
//!
//! - `model`: validated reply entries and the bounded history
//! - `mode`: local vs. remote interpretation of the current reply
//! - `store`: the persisted history backed by a key-value slot

mod mode;
mod model;
mod store;

pub use mode::{ModeSelection, ReplyMode, is_server_url};
pub use model::{InvalidReply, MAX_NUM_REPLIES, MAX_REPLY_LENGTH, ReplyEntry, ReplyHistory};
pub use store::{REPLY_HISTORY_KEY, ReplyStore, StoredHistory};

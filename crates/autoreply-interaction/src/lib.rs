//! Outbound integrations used to resolve replies.

pub mod remote_resolver;

pub use remote_resolver::RemoteReplyResolver;

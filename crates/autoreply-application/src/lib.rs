//! Application layer for autoreply.
//!
//! Wires the reply store to a resolver and exposes the operations used by
//! the host integration and configuration surfaces.

pub mod bootstrap;
pub mod reply_service;

pub use bootstrap::AppBootstrap;
pub use reply_service::ReplyService;

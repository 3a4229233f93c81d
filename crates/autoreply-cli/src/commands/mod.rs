pub mod reply;
pub mod resolve;

//! Storage layer for the persisted key-value slot.

mod json_slot;

pub use json_slot::JsonFileSlot;

//! Storage layer for the lunch fund
//!
//! The history document is plain text with atomic writes; settings are JSON.

pub mod file_io;
pub mod history;

pub use file_io::{read_json, read_text, write_json_atomic, write_text_atomic};
pub use history::HistoryStore;

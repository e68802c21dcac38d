//! Low-level file and time helpers shared across membench crates.
//!
//! Provides line/JSONL readers used to load datasets and resume sets, and
//! timestamp helpers for backend payloads.

pub mod jsonl;
pub mod time_utils;

pub use jsonl::{read_jsonl_dir, read_jsonl_file, read_trimmed_lines, JsonlLoad, JsonlSkip};
pub use time_utils::{current_unix_timestamp, now_rfc3339};

//! Utilities shared by the template store and the artifact synthesizer
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes, text and tab-indented JSON helpers

pub mod fs;

pub use fs::{atomic_write, ensure_dir, read_text_file, write_json_file, write_text_file};

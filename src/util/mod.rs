//! Utility modules

pub mod text;

pub use text::{byte_to_char, char_len, char_slice, char_to_byte, line_at, line_count};

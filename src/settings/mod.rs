//! Settings read and write operations against one connected session
//!
//! Stored data is the UTF-8 JSON text of the settings, with no envelope.

pub mod reader;
pub mod writer;

pub use reader::{decode_settings, read_settings, ReadSettings};
pub use writer::{encode_settings, write_settings, WriteSettings};

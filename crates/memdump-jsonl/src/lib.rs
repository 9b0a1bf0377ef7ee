//! Line-delimited JSON I/O for heap dump files.
//!
//! A heap dump is one self-describing JSON object per line. This crate
//! reads such files one record at a time (with line numbers for error
//! reporting), writes them back, and replaces files atomically so an
//! interrupted save never leaves a truncated dump behind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::JsonlReader;
pub use stream::read_stream;
pub use writer::JsonlWriter;

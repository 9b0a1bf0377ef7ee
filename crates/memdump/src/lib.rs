//! Memdump - heap dump analysis.
//!
//! This crate provides both a CLI application and a library for analyzing
//! line-delimited heap dumps: loading them into immutable [`snapshot::Dump`]s
//! and deriving new dumps from them (differences, ancestor chains, node
//! removal, contraction, class-name resolution, ...).
//!
//! ```no_run
//! # use std::path::Path;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> memdump::error::Result<()> {
//! use memdump::snapshot::load_from_jsonl;
//!
//! let before = load_from_jsonl(Path::new("before.json")).await?;
//! let after = load_from_jsonl(Path::new("after.json")).await?;
//! let leaks = before.diff(&after);
//! println!("{} objects involved", leaks.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod config;
pub mod domain;
pub mod error;
pub mod snapshot;

// Output formatting (text, JSON, GML)
pub mod output;

// Public CLI module (needed by binary)
pub mod cli;

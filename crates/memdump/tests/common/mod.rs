//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use memdump::domain::{Address, Record};
use memdump::snapshot::Dump;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Path of the memdump binary built for this test run
pub fn memdump_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_memdump"))
}

/// Run the memdump binary directly in the specified directory
pub fn run_memdump_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(memdump_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute memdump binary")
}

/// Write `lines` as a dump file named `name` in `dir`
pub fn write_dump(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(&path, content).expect("Failed to write dump file");
    path
}

/// Build a record referencing `refs`
pub fn record(address: &str, refs: &[&str]) -> Record {
    Record::new(address).with_references(refs.iter().copied())
}

/// Sorted addresses of a dump
pub fn addresses(dump: &Dump) -> Vec<&str> {
    dump.addresses().map(Address::as_str).collect()
}

/// Sorted references of one record of a dump
pub fn refs<'a>(dump: &'a Dump, address: &str) -> Vec<&'a str> {
    dump.find_by_address(address)
        .unwrap_or_else(|| panic!("{address} missing from dump"))
        .references
        .iter()
        .map(Address::as_str)
        .collect()
}

/// Parse JSON lines printed by the binary
pub fn parse_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line is not JSON"))
        .collect()
}

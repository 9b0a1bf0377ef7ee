//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use clap::{Args, Parser};
use std::path::PathBuf;

use super::validators::{validate_address, validate_type_tag};

/// Optional destination of the resulting records
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArg {
    /// Write the records to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `diff` command
#[derive(Parser, Debug, Clone)]
pub struct DiffArgs {
    /// Dump taken first
    pub source: PathBuf,

    /// Dump taken later
    pub target: PathBuf,

    /// Where to write the new objects and what keeps them alive
    pub output: PathBuf,

    /// Write only the new objects, leaving out the records holding them
    #[arg(long)]
    pub new_only: bool,
}

/// Arguments for the `subgraph-of` command
#[derive(Parser, Debug, Clone)]
pub struct SubgraphOfArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Address to start from
    #[arg(value_parser = validate_address)]
    pub address: String,

    /// Maximum number of hops from the address (unbounded by default)
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `root-of` command
#[derive(Parser, Debug, Clone)]
pub struct RootOfArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Address of the object whose holders are wanted
    #[arg(value_parser = validate_address)]
    pub address: String,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `keepalive` command
#[derive(Parser, Debug, Clone)]
pub struct KeepaliveArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Dump holding the target records (e.g. the output of `diff`)
    pub targets: PathBuf,

    /// Start the paths from these addresses instead of the GC roots
    #[arg(long = "root", value_parser = validate_address)]
    pub roots: Vec<String>,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `spanning-tree` command
#[derive(Parser, Debug, Clone)]
pub struct SpanningTreeArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Root of the tree
    #[arg(value_parser = validate_address)]
    pub root: String,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `remove-node` command
#[derive(Parser, Debug, Clone)]
pub struct RemoveNodeArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Address of the node to remove
    #[arg(value_parser = validate_address)]
    pub node: String,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `replace-class` command
#[derive(Parser, Debug, Clone)]
pub struct ReplaceClassArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Where to write the result (defaults to overwriting DUMP)
    pub output: Option<PathBuf>,

    /// Also add a reference from each object to its class
    #[arg(long)]
    pub add_ref: bool,
}

/// Arguments for the `cleanup-refs` command
#[derive(Parser, Debug, Clone)]
pub struct CleanupRefsArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Where to write the cleaned dump
    pub output: PathBuf,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Dump file
    pub dump: PathBuf,
}

/// Arguments for the `collapse` command
#[derive(Parser, Debug, Clone)]
pub struct CollapseArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Where to write the collapsed dump
    pub output: PathBuf,

    /// Collapse every record of this type (repeatable)
    #[arg(long = "type", value_parser = validate_type_tag)]
    pub types: Vec<String>,

    /// Collapse every record of this class (repeatable)
    #[arg(long = "class")]
    pub classes: Vec<String>,

    /// Also collapse the types and classes listed in the configuration
    #[arg(long)]
    pub common: bool,
}

/// Arguments for the `roots` command
#[derive(Parser, Debug, Clone)]
pub struct RootsArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Annotate each root with the number of objects it keeps alive
    #[arg(long)]
    pub keepalive: bool,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `remove-small-components` command
#[derive(Parser, Debug, Clone)]
pub struct RemoveSmallComponentsArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Where to write the pruned dump
    pub output: PathBuf,

    /// Largest component size that gets removed
    #[arg(long, default_value = "1")]
    pub max_size: usize,
}

/// Arguments for the `interface` command
#[derive(Parser, Debug, Clone)]
pub struct InterfaceArgs {
    /// Dump holding the referencing side
    pub dump_a: PathBuf,

    /// Dump holding the referenced side
    pub dump_b: PathBuf,

    #[command(flatten)]
    pub output: OutputArg,
}

/// Arguments for the `stats` command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Dump file
    pub dump: PathBuf,
}

/// Arguments for the `out-degree` command
#[derive(Parser, Debug, Clone)]
pub struct OutDegreeArgs {
    /// Dump file
    pub dump: PathBuf,

    /// Hide the objects holding fewer references than this
    #[arg(long, default_value = "0")]
    pub min: usize,
}

/// Arguments for the `gml` command
#[derive(Parser, Debug, Clone)]
pub struct GmlArgs {
    /// Dump file
    pub dump: PathBuf,

    /// GML file to write (defaults to DUMP with a `.gml` extension)
    pub gml: Option<PathBuf>,
}

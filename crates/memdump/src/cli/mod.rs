//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for memdump using clap's
//! derive API. Each command is a thin wrapper around one snapshot
//! operation: it loads the dumps it is given, runs the analysis and writes
//! the resulting records as JSON lines.
//!
//! # Commands
//!
//! - `diff`: Objects new in a later dump, and what keeps them alive
//! - `subgraph-of`: Objects reachable from an address
//! - `root-of`: Objects holding an address alive
//! - `keepalive`: Shortest paths from the roots to a set of objects
//! - `spanning-tree`: Spanning tree from one address
//! - `remove-node`: What survives once an object is gone
//! - `replace-class`: Replace class addresses by class names
//! - `cleanup-refs`: Drop references to missing objects
//! - `validate`: Check that every reference resolves
//! - `collapse`: Remove structural objects, keeping paths through them
//! - `roots`: Objects nothing references
//! - `remove-small-components`: Drop small isolated clusters
//! - `interface`: References from one dump into another
//! - `stats`: Object count per class
//! - `out-degree`: Reference count per object
//! - `gml`: Export to GML
//!
//! # Global Flags
//!
//! - `--json`: Output reports in JSON format
//! - `--config`: Read settings from this file instead of `memdump.yaml`
//!
//! # Example
//!
//! ```bash
//! memdump diff before.json after.json leaks.json
//! memdump collapse leaks.json readable.json --common
//! memdump root-of heap.json 0x7f2a3c4d5e60
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AnalysisConfig;
use crate::output::OutputMode;

// Re-export argument structs
pub use args::{
    CleanupRefsArgs, CollapseArgs, DiffArgs, GmlArgs, InterfaceArgs, KeepaliveArgs, OutDegreeArgs,
    OutputArg, RemoveNodeArgs, RemoveSmallComponentsArgs, ReplaceClassArgs, RootOfArgs, RootsArgs,
    SpanningTreeArgs, StatsArgs, SubgraphOfArgs, ValidateArgs,
};

// Re-export validators for external use
pub use validators::{validate_address, validate_type_tag};

/// Memdump - heap dump analysis
///
/// Load line-delimited heap dumps and answer questions about them: what
/// appeared between two dumps, what keeps an object alive, what survives
/// once an object is gone.
#[derive(Parser, Debug)]
#[command(name = "memdump")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output reports in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./memdump.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Objects of TARGET not in SOURCE, and everything keeping them alive
    ///
    /// References leaving that set are dropped, so the output shows only
    /// the chains holding the new objects.
    Diff(DiffArgs),

    /// Objects reachable from an address
    ///
    /// References are kept as found, so the boundary of the subgraph is
    /// visible.
    SubgraphOf(SubgraphOfArgs),

    /// Objects holding an address alive, up to the roots
    RootOf(RootOfArgs),

    /// Shortest paths from the GC roots to the objects of another dump
    Keepalive(KeepaliveArgs),

    /// Unit-weight spanning tree rooted at one address
    SpanningTree(SpanningTreeArgs),

    /// Remove an object and everything only it kept alive
    RemoveNode(RemoveNodeArgs),

    /// Replace class addresses by class names
    ReplaceClass(ReplaceClassArgs),

    /// Remove references to objects missing from the dump
    CleanupRefs(CleanupRefsArgs),

    /// Check that every reference points to an object of the dump
    Validate(ValidateArgs),

    /// Remove objects while keeping the paths going through them
    Collapse(CollapseArgs),

    /// Objects that no object references
    Roots(RootsArgs),

    /// Remove clusters reachable from a root with at most N objects
    RemoveSmallComponents(RemoveSmallComponentsArgs),

    /// References from the objects of one dump into another
    Interface(InterfaceArgs),

    /// Object count per class
    Stats(StatsArgs),

    /// Number of references held by each object
    OutDegree(OutDegreeArgs),

    /// Convert a dump to GML (for Gephi, yEd, ...)
    Gml(GmlArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Load the configuration selected by `--config`, or discover it in
    /// the working directory.
    pub async fn load_config(&self) -> Result<AnalysisConfig> {
        let config = match &self.config {
            Some(path) => AnalysisConfig::load(path).await?,
            None => AnalysisConfig::discover(&std::env::current_dir()?).await?,
        };
        Ok(config)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AnalysisConfig) -> Result<()> {
        let output_mode = OutputMode::from_flag(self.json);

        match &self.command {
            Some(Commands::Diff(args)) => execute::execute_diff(args).await,
            Some(Commands::SubgraphOf(args)) => execute::execute_subgraph_of(args).await,
            Some(Commands::RootOf(args)) => execute::execute_root_of(args).await,
            Some(Commands::Keepalive(args)) => execute::execute_keepalive(args).await,
            Some(Commands::SpanningTree(args)) => execute::execute_spanning_tree(args).await,
            Some(Commands::RemoveNode(args)) => execute::execute_remove_node(args).await,
            Some(Commands::ReplaceClass(args)) => execute::execute_replace_class(args).await,
            Some(Commands::CleanupRefs(args)) => execute::execute_cleanup_refs(args).await,
            Some(Commands::Validate(args)) => execute::execute_validate(args, output_mode).await,
            Some(Commands::Collapse(args)) => execute::execute_collapse(args, config).await,
            Some(Commands::Roots(args)) => execute::execute_roots(args).await,
            Some(Commands::RemoveSmallComponents(args)) => {
                execute::execute_remove_small_components(args).await
            }
            Some(Commands::Interface(args)) => execute::execute_interface(args).await,
            Some(Commands::Stats(args)) => execute::execute_stats(args, output_mode).await,
            Some(Commands::OutDegree(args)) => execute::execute_out_degree(args, output_mode).await,
            Some(Commands::Gml(args)) => execute::execute_gml(args).await,
            None => {
                println!("Memdump heap dump analysis");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

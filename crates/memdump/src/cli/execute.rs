//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Each one
//! loads its dumps, calls a single snapshot operation and writes the
//! result.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use std::path::{Path, PathBuf};

use super::args::{
    CleanupRefsArgs, CollapseArgs, DiffArgs, GmlArgs, InterfaceArgs, KeepaliveArgs, OutDegreeArgs,
    OutputArg, RemoveNodeArgs, RemoveSmallComponentsArgs, ReplaceClassArgs, RootOfArgs, RootsArgs,
    SpanningTreeArgs, StatsArgs, SubgraphOfArgs, ValidateArgs,
};
use crate::config::AnalysisConfig;
use crate::domain::Address;
use crate::output::{self, OutputConfig, OutputMode};
use crate::snapshot::{self, Dump, Stats};

async fn load(path: &Path) -> Result<Dump> {
    snapshot::load_from_jsonl(path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Write `dump` to `path`, or to stdout as JSON lines.
async fn emit(dump: &Dump, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let written = snapshot::save_to_jsonl(dump, path)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            let config = OutputConfig::from_env();
            output::print_message(&output::success(
                &format!("Wrote {written} records to {}", path.display()),
                &config,
            ))?;
        }
        None => {
            snapshot::save_to_writer(dump, tokio::io::stdout()).await?;
        }
    }
    Ok(())
}

fn output_path(arg: &OutputArg) -> Option<&Path> {
    arg.output.as_deref()
}

/// Execute the diff command
pub async fn execute_diff(args: &DiffArgs) -> Result<()> {
    let from = load(&args.source).await?;
    let to = load(&args.target).await?;
    let result = if args.new_only {
        from.new_objects(&to)
    } else {
        from.diff(&to)
    };
    emit(&result, Some(args.output.as_path())).await
}

/// Execute the subgraph-of command
pub async fn execute_subgraph_of(args: &SubgraphOfArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.subgraph_of(&args.address, args.max_depth)?;
    emit(&result, output_path(&args.output)).await
}

/// Execute the root-of command
pub async fn execute_root_of(args: &RootOfArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.ancestors_of(&args.address)?;
    emit(&result, output_path(&args.output)).await
}

/// Execute the keepalive command
pub async fn execute_keepalive(args: &KeepaliveArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let targets = load(&args.targets).await?;
    let roots: Vec<Address> = args.roots.iter().map(Address::new).collect();
    let roots = (!roots.is_empty()).then_some(roots.as_slice());
    let result = dump.shortest_keepalive_subgraph(&targets, roots)?;
    emit(&result, output_path(&args.output)).await
}

/// Execute the spanning-tree command
pub async fn execute_spanning_tree(args: &SpanningTreeArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.minimum_spanning_tree(&[Address::new(&args.root)])?;
    emit(&result, output_path(&args.output)).await
}

/// Execute the remove-node command
pub async fn execute_remove_node(args: &RemoveNodeArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.remove_node(&args.node)?;
    tracing::info!(
        before = dump.len(),
        after = result.len(),
        "removed {} and what it kept alive",
        args.node
    );
    emit(&result, output_path(&args.output)).await
}

/// Execute the replace-class command
pub async fn execute_replace_class(args: &ReplaceClassArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.resolve_class_names(args.add_ref);
    let output = args.output.as_deref().unwrap_or(&args.dump);
    emit(&result, Some(output)).await
}

/// Execute the cleanup-refs command
pub async fn execute_cleanup_refs(args: &CleanupRefsArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let (cleaned, missing) = dump.remove_invalid_references();
    if !missing.is_empty() {
        let config = OutputConfig::from_env();
        output::print_message(&output::warning(
            &format!("Removed references to {} missing objects", missing.len()),
            &config,
        ))?;
    }
    emit(&cleaned, Some(args.output.as_path())).await
}

/// Execute the validate command
pub async fn execute_validate(args: &ValidateArgs, output_mode: OutputMode) -> Result<()> {
    let dump = load(&args.dump).await?;
    let outcome = dump.validate_references();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "records": dump.len(),
                "valid": outcome.is_ok(),
                "error": outcome.as_ref().err().map(ToString::to_string),
            }))?;
        }
        OutputMode::Text => {
            if outcome.is_ok() {
                let config = OutputConfig::from_env();
                output::print_message(&output::success(
                    &format!("{} records, all references resolve", dump.len()),
                    &config,
                ))?;
            }
        }
    }

    outcome.with_context(|| format!("{} is not self-contained", args.dump.display()))
}

/// Execute the collapse command
pub async fn execute_collapse(args: &CollapseArgs, config: &AnalysisConfig) -> Result<()> {
    if args.types.is_empty() && args.classes.is_empty() && !args.common {
        anyhow::bail!("Nothing to collapse: pass --type, --class or --common");
    }

    let mut selection = AnalysisConfig {
        collapse_types: args.types.clone(),
        collapse_classes: args.classes.clone(),
        ..config.clone()
    };
    if args.common {
        selection.collapse_types.extend(config.collapse_types.iter().cloned());
        selection.collapse_classes.extend(config.collapse_classes.iter().cloned());
    }

    let dump = load(&args.dump).await?;
    let result = dump.common_cleanup(&selection);
    tracing::info!(before = dump.len(), after = result.len(), "collapsed records");
    emit(&result, Some(args.output.as_path())).await
}

/// Execute the roots command
pub async fn execute_roots(args: &RootsArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.roots(args.keepalive);
    emit(&result, output_path(&args.output)).await
}

/// Execute the remove-small-components command
pub async fn execute_remove_small_components(args: &RemoveSmallComponentsArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let result = dump.remove_small_components(args.max_size);
    emit(&result, Some(args.output.as_path())).await
}

/// Execute the interface command
pub async fn execute_interface(args: &InterfaceArgs) -> Result<()> {
    let a = load(&args.dump_a).await?;
    let b = load(&args.dump_b).await?;
    let result = a.interface_with(&b);
    emit(&result, output_path(&args.output)).await
}

/// Execute the stats command
///
/// Records are streamed from the file; the dump is never materialized.
pub async fn execute_stats(args: &StatsArgs, output_mode: OutputMode) -> Result<()> {
    let stats = snapshot::stream_records(&args.dump)
        .await
        .with_context(|| format!("failed to open {}", args.dump.display()))?
        .try_fold(Stats::default(), |mut stats, record| async move {
            stats.count(&record);
            Ok::<_, crate::error::Error>(stats)
        })
        .await
        .with_context(|| format!("failed to read {}", args.dump.display()))?;
    output::print_stats(&stats, output_mode)?;
    Ok(())
}

/// Execute the out-degree command
pub async fn execute_out_degree(args: &OutDegreeArgs, output_mode: OutputMode) -> Result<()> {
    let dump = load(&args.dump).await?;
    let degrees: Vec<(Address, usize)> = dump
        .out_degree()
        .into_iter()
        .filter(|(_, degree)| *degree >= args.min)
        .collect();
    output::print_out_degree(&degrees, output_mode)?;
    Ok(())
}

/// Execute the gml command
pub async fn execute_gml(args: &GmlArgs) -> Result<()> {
    let dump = load(&args.dump).await?;
    let gml_path = args
        .gml
        .clone()
        .unwrap_or_else(|| default_gml_path(&args.dump));

    let rendered = output::gml::render_gml(&dump)
        .with_context(|| format!("failed to render {}", args.dump.display()))?;
    tokio::fs::write(&gml_path, rendered)
        .await
        .with_context(|| format!("failed to write {}", gml_path.display()))?;

    let config = OutputConfig::from_env();
    output::print_message(&output::success(
        &format!("Wrote {}", gml_path.display()),
        &config,
    ))?;
    Ok(())
}

fn default_gml_path(dump: &Path) -> PathBuf {
    dump.with_extension("gml")
}

//! Command-line runners shared by the stage binaries.
//!
//! Each runner takes the process arguments (without the program name),
//! installs the tracing subscriber, and returns an error for the binary to
//! report with a non-zero exit status.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, error::ErrorKind};

use crate::clean::clean_split;
use crate::config::{CleanOptions, PipelineConfig, StorageConfig, UnionConfig};
use crate::errors::PipelineError;
use crate::map::map_source;
use crate::source::{LocalShardSource, RawRecordSource, SourceRegistry};
use crate::storage::{BucketStore, ObjectStore, object_key_for, sync_down, sync_up};
use crate::union::run_union;

#[derive(Debug, Parser)]
#[command(
    name = "map_source",
    disable_help_subcommand = true,
    about = "Map a registered source into the RAW tier",
    long_about = "Acquire every requested split of a registered dataset, translate each record into the unified schema, and write one RAW parquet file per split.",
    after_help = "Records are fetched from the HuggingFace hub unless --source-root points at a local shard directory."
)]
struct MapSourceCli {
    #[arg(long, value_name = "KEY", help = "Registered dataset key")]
    dataset: String,
    #[arg(
        long = "split",
        value_name = "SPLIT",
        help = "Split to materialize, repeat as needed (defaults to the registered splits)"
    )]
    splits: Vec<String>,
    #[arg(long = "data-dir", value_name = "DIR", help = "Override PROBLEMSET_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[arg(
        long = "source-root",
        value_name = "PATH",
        help = "Read shards from <PATH>/<KEY>/ instead of the hub"
    )]
    source_root: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "clean_split",
    disable_help_subcommand = true,
    about = "Clean one RAW split into the CLEAN tier",
    long_about = "Enforce the unified schema, normalize text, drop invalid rows, and remove duplicates for one (source, split) pair."
)]
struct CleanSplitCli {
    #[arg(long, value_name = "KEY", help = "Dataset key under the RAW tier")]
    dataset: String,
    #[arg(long, default_value = "train", help = "Split to clean")]
    split: String,
    #[arg(long = "require-solution", help = "Drop rows whose solution is empty")]
    require_solution: bool,
    #[arg(long = "data-dir", value_name = "DIR", help = "Override PROBLEMSET_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "union_corpus",
    disable_help_subcommand = true,
    about = "Union every CLEAN table into the global corpus",
    long_about = "Read all CLEAN tables in parallel, re-normalize prompts, deduplicate globally, and write the source-partitioned UNION tier with a sample and stats file."
)]
struct UnionCorpusCli {
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Worker threads (defaults to one per core)"
    )]
    workers: Option<usize>,
    #[arg(
        long = "shuffle-partitions",
        value_parser = parse_positive_usize,
        help = "Shuffle buckets used for global deduplication"
    )]
    shuffle_partitions: Option<usize>,
    #[arg(long = "data-dir", value_name = "DIR", help = "Override PROBLEMSET_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "artifact_store",
    disable_help_subcommand = true,
    about = "Upload, download, list, and sync pipeline artifacts",
    after_help = "Requires PROBLEMSET_STORE_BUCKET, PROBLEMSET_STORE_ACCESS_KEY and PROBLEMSET_STORE_SECRET_KEY."
)]
struct ArtifactStoreCli {
    #[arg(
        long = "project-root",
        value_name = "DIR",
        help = "Root that object keys are derived from (defaults to the working directory)"
    )]
    project_root: Option<PathBuf>,
    #[command(subcommand)]
    command: ArtifactStoreCommand,
}

#[derive(Debug, Subcommand)]
enum ArtifactStoreCommand {
    /// Upload one file.
    UploadFile {
        local_path: PathBuf,
        #[arg(long, help = "Explicit object key (defaults to the project-relative path)")]
        key: Option<String>,
    },
    /// Download one object.
    DownloadFile { key: String, dest: PathBuf },
    /// List objects under a prefix.
    List {
        #[arg(long, help = "Prefix to list (defaults to PROBLEMSET_STORE_PREFIX)")]
        prefix: Option<String>,
    },
    /// Upload a directory tree.
    SyncDir {
        local_dir: PathBuf,
        #[arg(long, help = "Prefix override for this sync")]
        prefix: Option<String>,
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[arg(long = "no-only-changed", help = "Upload even when the remote size matches")]
        no_only_changed: bool,
    },
    /// Download every object under a prefix.
    SyncDown {
        prefix: String,
        local_dir: PathBuf,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn pipeline_config(data_dir: Option<PathBuf>) -> PipelineConfig {
    data_dir
        .map(PipelineConfig::new)
        .unwrap_or_else(PipelineConfig::from_env)
}

/// Entry point of `map_source`.
pub fn run_map_source<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<MapSourceCli, _>(std::iter::once("map_source".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = pipeline_config(cli.data_dir);
    let registry = SourceRegistry::builtin();
    let backend = acquisition_backend(cli.source_root, &config)?;
    let written = map_source(&config, &registry, backend.as_ref(), &cli.dataset, &cli.splits)?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn acquisition_backend(
    source_root: Option<PathBuf>,
    config: &PipelineConfig,
) -> Result<Box<dyn RawRecordSource>, PipelineError> {
    if let Some(root) = source_root {
        return Ok(Box::new(LocalShardSource::new(root)));
    }
    hub_backend(config)
}

#[cfg(feature = "huggingface")]
fn hub_backend(config: &PipelineConfig) -> Result<Box<dyn RawRecordSource>, PipelineError> {
    use crate::source::{HuggingFaceSource, HuggingFaceSourceConfig};
    Ok(Box::new(HuggingFaceSource::new(
        HuggingFaceSourceConfig::from_env(&config.data_dir),
    )))
}

#[cfg(not(feature = "huggingface"))]
fn hub_backend(_config: &PipelineConfig) -> Result<Box<dyn RawRecordSource>, PipelineError> {
    Err(PipelineError::Configuration(
        "built without the `huggingface` feature; pass --source-root".to_string(),
    ))
}

/// Entry point of `clean_split`.
pub fn run_clean_split<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) =
        parse_cli::<CleanSplitCli, _>(std::iter::once("clean_split".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let config = pipeline_config(cli.data_dir);
    let opts = CleanOptions {
        require_solution: cli.require_solution,
        ..CleanOptions::default()
    };
    let report = clean_split(&config, &cli.dataset, &cli.split, &opts)?;
    println!(
        "{}/{}: {} -> {} rows ({} duplicates removed)",
        cli.dataset,
        cli.split,
        report.input_rows,
        report.output_rows(),
        report.duplicates_removed
    );
    for (name, value) in &report.summary {
        println!("  {name}: {value}");
    }
    Ok(())
}

/// Entry point of `union_corpus`.
pub fn run_union_corpus<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) = parse_cli::<UnionCorpusCli, _>(
        std::iter::once("union_corpus".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = pipeline_config(cli.data_dir);
    let mut union = UnionConfig {
        workers: cli.workers,
        ..UnionConfig::default()
    };
    if let Some(partitions) = cli.shuffle_partitions {
        union.shuffle_partitions = partitions;
    }

    match run_union(&config, &union)? {
        Some(report) => println!(
            "Unified {} rows from {} files: sources={} languages={} duplicates_removed={}",
            report.stats.rows,
            report.files,
            report.stats.sources,
            report.stats.languages,
            report.duplicates_removed
        ),
        None => println!(
            "No clean tables found under {}; nothing to do.",
            config.clean_dir().display()
        ),
    }
    Ok(())
}

/// Entry point of `artifact_store`.
pub fn run_artifact_store<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    init_tracing();
    let Some(cli) = parse_cli::<ArtifactStoreCli, _>(
        std::iter::once("artifact_store".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let settings = StorageConfig::from_env()?;
    let store = BucketStore::connect(&settings)?;
    let project_root = match cli.project_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let project_root = fs::canonicalize(&project_root).map_err(|_| PipelineError::MissingInput {
        path: project_root.clone(),
    })?;

    match cli.command {
        ArtifactStoreCommand::UploadFile { local_path, key } => {
            let local = existing_path(&local_path)?;
            let key = match key {
                Some(key) => key,
                None => object_key_for(&project_root, &local, &settings.prefix)?,
            };
            store.put_file(&local, &key)?;
            println!("Uploaded {} to {}/{key}", local.display(), store.describe());
        }
        ArtifactStoreCommand::DownloadFile { key, dest } => {
            store.get_file(&key, &dest)?;
            println!("Downloaded {key} to {}", dest.display());
        }
        ArtifactStoreCommand::List { prefix } => {
            let prefix = prefix.unwrap_or_else(|| settings.prefix.clone());
            for entry in store.list_prefix(prefix.trim_matches('/'))? {
                println!("{}\t{}", entry.key, entry.size);
            }
        }
        ArtifactStoreCommand::SyncDir {
            local_dir,
            prefix,
            dry_run,
            no_only_changed,
        } => {
            let local_dir = existing_path(&local_dir)?;
            let prefix = prefix.unwrap_or_else(|| settings.prefix.clone());
            let report = sync_up(
                &store,
                &project_root,
                &local_dir,
                &prefix,
                dry_run,
                !no_only_changed,
            )?;
            println!(
                "Sync complete: {} uploaded, {} unchanged",
                report.transferred, report.skipped
            );
        }
        ArtifactStoreCommand::SyncDown {
            prefix,
            local_dir,
            dry_run,
        } => {
            let report = sync_down(&store, &prefix, &local_dir, dry_run)?;
            println!(
                "Sync-down complete: {} downloaded, {} unchanged",
                report.transferred, report.skipped
            );
        }
    }
    Ok(())
}

fn existing_path(path: &Path) -> Result<PathBuf, PipelineError> {
    fs::canonicalize(path).map_err(|_| PipelineError::MissingInput {
        path: path.to_path_buf(),
    })
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

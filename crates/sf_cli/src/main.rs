// crates/sf_cli/src/main.rs
//
// `sf` entry point: parse → init logging → dispatch → exit code.
// Artifacts are canonical JSON written atomically into --out.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const INSUFFICIENT_SELLERS: i32 = 3;
    pub const IO: i32 = 4;
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{AllocateArgs, Cli, CliError, Command, InputArgs, InputSource, RankArgs};
use sf_algo::AllocError;
use sf_io::canonical_json::write_canonical;
use sf_io::loader;
use sf_pipeline::{run_catalog_allocation, storefront_view, PipelineCtx, PipelineError};

const STOREFRONT_FILE: &str = "storefront.json";
const PRODUCTS_FILE: &str = "products.json";
const CHANGES_FILE: &str = "changes.json";
const RUN_RECORD_FILE: &str = "run_record.json";

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Bad flags, unusable inputs, params out of domain.
    Validation(String),
    /// Not enough eligible sellers for an odd-position product.
    Insufficient(String),
    /// Missing files, read/write failures, store failures.
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Insufficient(m) | MainError::Io(m) => f.write_str(m),
        }
    }
}

impl From<CliError> for MainError {
    fn from(e: CliError) -> Self {
        match e {
            CliError::NotFound(_) => MainError::Io(e.to_string()),
            CliError::Missing(_) | CliError::NonLocalPath(_) | CliError::WouldOverwrite(_) => {
                MainError::Validation(e.to_string())
            }
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Allocate(AllocError::InsufficientSellers { .. }) => {
                MainError::Insufficient(e.to_string())
            }
            PipelineError::Allocate(AllocError::ZeroPartitions) | PipelineError::Validate(_) => {
                MainError::Validation(e.to_string())
            }
            PipelineError::Io(_) | PipelineError::Store(_) => MainError::Io(e.to_string()),
        }
    }
}

impl From<sf_io::IoError> for MainError {
    fn from(e: sf_io::IoError) -> Self {
        PipelineError::from(e).into()
    }
}

impl From<sf_core::CoreError> for MainError {
    fn from(e: sf_core::CoreError) -> Self {
        MainError::Validation(e.to_string())
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            // --help / --version are not errors.
            if !e.use_stderr() {
                let _ = e.print();
                return ExitCode::from(exitcodes::OK as u8);
            }
            eprintln!("sf: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };

    init_tracing(cli.quiet);

    let result = match &cli.command {
        Command::Rank(a) => run_rank(a, cli.quiet),
        Command::Allocate(a) => run_allocate(a, cli.quiet),
        Command::Validate(a) => run_validate(a, cli.quiet),
    };

    let rc = match result {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("sf: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `--quiet`.
fn init_tracing(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Insufficient(_) => INSUFFICIENT_SELLERS,
        MainError::Io(_) => IO,
    }
}

/// Load the inputs; also returns every file read, manifest included.
fn load_ctx(inputs: &InputArgs) -> Result<(PipelineCtx, Vec<PathBuf>), MainError> {
    let (ctx, mut read) = match inputs.resolve()? {
        InputSource::Manifest(m) => (PipelineCtx::from_manifest(&m)?, vec![m]),
        InputSource::Files { sellers, products, params } => {
            (PipelineCtx::from_paths(&sellers, &products, params.as_deref())?, Vec::new())
        }
    };
    let paths = &ctx.loaded.paths;
    read.push(paths.sellers.clone());
    read.push(paths.products.clone());
    read.extend(paths.params.clone());
    Ok((ctx, read))
}

fn run_validate(inputs: &InputArgs, quiet: bool) -> Result<(), MainError> {
    let (ctx, _) = load_ctx(inputs)?;
    tracing::debug!(
        sellers_sha256 = %ctx.loaded.digests.sellers_sha256,
        products_sha256 = %ctx.loaded.digests.products_sha256,
        "inputs digested"
    );
    if !quiet {
        println!(
            "inputs OK: {} sellers, {} products",
            ctx.loaded.sellers.len(),
            ctx.loaded.products.len()
        );
    }
    Ok(())
}

fn run_rank(a: &RankArgs, quiet: bool) -> Result<(), MainError> {
    let (sellers_path, params_path) = args::resolve_rank_inputs(a)?;
    let out_dir = args::resolve_out(&a.out)?;
    let read: Vec<&Path> = std::iter::once(sellers_path.as_path()).chain(params_path.as_deref()).collect();
    args::ensure_outputs_clear(&out_dir, &[STOREFRONT_FILE], &read)?;

    let sellers = loader::load_sellers(&sellers_path)?;
    let mut params = match params_path {
        Some(p) => loader::load_params(&p)?,
        None => Default::default(),
    };
    if let Some(limit) = a.limit {
        params.top_k = limit;
    }
    params.validate_domains()?;

    let view = storefront_view(&sellers, &params);
    write_artifact(&out_dir, STOREFRONT_FILE, &view)?;

    if !quiet {
        println!(
            "storefront: {} top, {} brand, {} collapsed",
            view.top_sellers.len(),
            view.brand_sellers.len(),
            view.collapsed.len()
        );
    }
    Ok(())
}

fn run_allocate(a: &AllocateArgs, quiet: bool) -> Result<(), MainError> {
    let out_dir = args::resolve_out(&a.out)?;
    let (mut ctx, read) = load_ctx(&a.inputs)?;
    let read: Vec<&Path> = read.iter().map(PathBuf::as_path).collect();
    args::ensure_outputs_clear(&out_dir, &[PRODUCTS_FILE, CHANGES_FILE, RUN_RECORD_FILE], &read)?;

    if let Some(seed) = a.seed {
        tracing::debug!(seed, "seed override");
        ctx.loaded.params.seed = Some(seed);
    }
    if let Some(partitions) = a.partitions {
        ctx.loaded.params.partitions = partitions;
    }

    let run = run_catalog_allocation(&ctx)?;
    write_artifact(&out_dir, PRODUCTS_FILE, &run.outcome.products)?;
    write_artifact(&out_dir, CHANGES_FILE, &run.change_rows())?;
    write_artifact(&out_dir, RUN_RECORD_FILE, &run.run_record)?;

    if !quiet {
        println!(
            "{}: {} products, {} changed",
            run.run_record.id,
            run.run_record.counts.products,
            run.run_record.counts.changed
        );
    }
    Ok(())
}

fn write_artifact<T: serde::Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
) -> Result<(), MainError> {
    let path = dir.join(name);
    write_canonical(&path, value)?;
    tracing::debug!(path = %path.display(), "artifact written");
    Ok(())
}

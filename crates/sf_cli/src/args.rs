// crates/sf_cli/src/args.rs
//
// Offline CLI argument surface.
//
// - No networked paths (reject any scheme:// like http/https/file)
// - Inputs: --manifest XOR (--sellers + --products [+ --params])
// - `rank` needs only --sellers (+ optional --params)
// - Seed override accepts decimal u64 or 0x-hex up to 16 nybbles
// - Paths are normalized to absolute form before use

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sf_io::looks_like_url_strict;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sf",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic seller ranking and catalog allocation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Only log warnings and errors (RUST_LOG still wins when set).
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deduplicate and rank sellers; writes storefront.json.
    Rank(RankArgs),
    /// Allocate products to sellers; writes products.json, changes.json, run_record.json.
    Allocate(AllocateArgs),
    /// Load and validate inputs without running anything.
    Validate(InputArgs),
}

/// Snapshot inputs: a manifest, or explicit files.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Manifest JSON naming the snapshot files (exclusive with explicit file flags).
    #[arg(long, conflicts_with_all = ["sellers", "products", "params"])]
    pub manifest: Option<PathBuf>,
    /// Sellers snapshot (JSON array).
    #[arg(long)]
    pub sellers: Option<PathBuf>,
    /// Products snapshot (JSON array).
    #[arg(long)]
    pub products: Option<PathBuf>,
    /// Engine params JSON (defaults apply when omitted).
    #[arg(long)]
    pub params: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct RankArgs {
    #[arg(long)]
    pub sellers: PathBuf,
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Overrides `topK`.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Output directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct AllocateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Overrides `seed`. Decimal u64 or 0x-hex (≤16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,
    /// Overrides `partitions`.
    #[arg(long)]
    pub partitions: Option<usize>,
    /// Output directory.
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

/// Inputs after mode resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Manifest(PathBuf),
    Files {
        sellers: PathBuf,
        products: PathBuf,
        params: Option<PathBuf>,
    },
}

/// Argument errors. Messages are short and stable for scripts.
#[derive(Debug)]
pub enum CliError {
    Missing(&'static str),
    NonLocalPath(String),
    NotFound(String),
    WouldOverwrite(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
            WouldOverwrite(p) => write!(f, "output would overwrite an input: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if looks_like_url_strict(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Local, existing regular file.
fn ensure_local_exists(p: &Path, label: &'static str) -> Result<PathBuf, CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(normalize_path(p))
}

/// Best-effort absolute path; falls back to CWD-joined when the path does not exist yet.
pub fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

impl InputArgs {
    /// Resolve the input mode and check every named file.
    pub fn resolve(&self) -> Result<InputSource, CliError> {
        if let Some(m) = &self.manifest {
            return Ok(InputSource::Manifest(ensure_local_exists(m, "--manifest")?));
        }
        let sellers = self.sellers.as_deref().ok_or(CliError::Missing("--sellers"))?;
        let products = self.products.as_deref().ok_or(CliError::Missing("--products"))?;
        Ok(InputSource::Files {
            sellers: ensure_local_exists(sellers, "--sellers")?,
            products: ensure_local_exists(products, "--products")?,
            params: self
                .params
                .as_deref()
                .map(|p| ensure_local_exists(p, "--params"))
                .transpose()?,
        })
    }
}

/// Output directory: local path, normalized (it may not exist yet).
pub fn resolve_out(out: &Path) -> Result<PathBuf, CliError> {
    ensure_local_path(out)?;
    Ok(normalize_path(out))
}

/// Refuse to write any of `artifacts` (names inside `out_dir`) over an input file.
pub fn ensure_outputs_clear(out_dir: &Path, artifacts: &[&str], inputs: &[&Path]) -> Result<(), CliError> {
    let inputs: Vec<PathBuf> = inputs.iter().map(|p| normalize_path(p)).collect();
    for name in artifacts {
        let target = normalize_path(&out_dir.join(name));
        if inputs.contains(&target) {
            return Err(CliError::WouldOverwrite(target.display().to_string()));
        }
    }
    Ok(())
}

/// Rank inputs: sellers file plus optional params.
pub fn resolve_rank_inputs(a: &RankArgs) -> Result<(PathBuf, Option<PathBuf>), CliError> {
    let sellers = ensure_local_exists(&a.sellers, "--sellers")?;
    let params = a
        .params
        .as_deref()
        .map(|p| ensure_local_exists(p, "--params"))
        .transpose()?;
    Ok((sellers, params))
}

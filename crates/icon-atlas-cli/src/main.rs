use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, anyhow, bail};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use icon_atlas_core::prelude::*;
use image::ImageReader;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "icon-atlas",
    about = "Pack icon folders into texture atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack one directory of images into an atlas
    Pack(PackArgs),
    /// Run every atlas job listed in a YAML file
    Build(BuildArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png and name.json|xml)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Log and leave out images that fail to decode instead of failing the job
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    skip_unreadable: bool,

    /// Previously shipped atlas image whose tiles are packed again
    #[arg(long, requires = "legacy_sidecar", help_heading = "Legacy")]
    legacy_image: Option<PathBuf>,
    /// JSON or XML sidecar written with --legacy-image
    #[arg(long, requires = "legacy_image", help_heading = "Legacy")]
    legacy_sidecar: Option<PathBuf>,

    /// Canvas width; every atlas is emitted at exactly this width
    #[arg(long, default_value_t = icon_atlas_core::DEFAULT_MAX_WIDTH, help_heading = "Layout")]
    max_width: u32,
    /// Height limit; packing fails when a tile would reach past it
    #[arg(long, default_value_t = icon_atlas_core::DEFAULT_MAX_HEIGHT, help_heading = "Layout")]
    max_height: u32,
    /// Sort tiles by size before packing (default when a legacy atlas is given)
    #[arg(long, default_value_t = false, conflicts_with = "no_sort", help_heading = "Layout")]
    sort: bool,
    /// Keep input order (default without a legacy atlas)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    no_sort: bool,

    /// Metadata format: json | xml
    #[arg(long, default_value = "json", value_parser = ["json", "xml"], help_heading = "Export")]
    metadata: String,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    /// YAML file listing the atlas jobs
    config: PathBuf,
    /// Only run the jobs with these names
    #[arg(long)]
    only: Vec<String>,
    /// Log and leave out images that fail to decode instead of failing the job
    #[arg(long, default_value_t = false)]
    skip_unreadable: bool,
    /// Dry run: compute layouts and stats but do not write files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

/// Everything needed to run one atlas job, after merging flags or YAML.
#[derive(Debug, Clone)]
struct JobPlan {
    name: String,
    input: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
    skip_unreadable: bool,
    legacy: Option<(PathBuf, PathBuf)>,
    /// `None` follows the job mode.
    sort: Option<bool>,
    out_dir: PathBuf,
    metadata: MetadataFormat,
    cfg: AtlasConfig,
    export_stats: Option<PathBuf>,
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Pack(args) => run_pack(args, show_progress),
        Commands::Build(args) => run_build(args, show_progress),
    }
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = AtlasConfig::builder()
        .with_max_dimensions(args.max_width, args.max_height)
        .build();

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let sort = if args.sort {
        Some(true)
    } else if args.no_sort {
        Some(false)
    } else {
        None
    };
    let plan = JobPlan {
        name: args.name.clone(),
        input: args.input.clone(),
        include: args.include.clone(),
        exclude: args.exclude.clone(),
        skip_unreadable: args.skip_unreadable,
        legacy: args.legacy_image.clone().zip(args.legacy_sidecar.clone()),
        sort,
        out_dir: args.out_dir.clone(),
        metadata: parse_metadata(&args.metadata)?,
        cfg,
        export_stats: args.export_stats.clone(),
        dry_run: args.dry_run,
    };
    run_job(&plan, show_progress)
}

fn run_build(args: &BuildArgs, show_progress: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.config)
        .with_context(|| format!("read build file {}", args.config.display()))?;
    let file: YamlConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parse build file {}", args.config.display()))?;
    let base = args
        .config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut plans = file.into_plans(&base, args.dry_run)?;
    if args.skip_unreadable {
        for plan in &mut plans {
            plan.skip_unreadable = true;
        }
    }
    let mut ran = 0usize;
    for plan in &plans {
        if !args.only.is_empty() && !args.only.iter().any(|n| n == &plan.name) {
            continue;
        }
        run_job(plan, show_progress).with_context(|| format!("atlas job '{}'", plan.name))?;
        ran += 1;
    }
    if ran == 0 {
        warn!(file = %args.config.display(), "no jobs matched");
    }
    Ok(())
}

fn run_job(plan: &JobPlan, show_progress: bool) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let paths = gather_paths(&plan.input, &plan.include, &plan.exclude)?;
    let tiles = load_tiles_with_progress(&plan.input, &paths, plan.skip_unreadable, show_progress)?;
    info!(job = %plan.name, count = tiles.len(), "loaded input images");

    let mut job = match &plan.legacy {
        Some((image, sidecar)) => {
            AtlasJob::legacy_augmented(&plan.name, SidecarLegacySource::new(image, sidecar))
        }
        None => AtlasJob::fresh(&plan.name),
    };
    if let Some(sort) = plan.sort {
        job = job.with_sort(sort);
    }

    let out = pack_atlas(tiles, &job, &plan.cfg)
        .with_context(|| format!("pack atlas '{}'", plan.name))?;
    let stats = out.stats();
    info!(job = %plan.name, elapsed_ms = t0.elapsed().as_millis() as u64, "{}", stats.summary());

    if let Some(path) = &plan.export_stats {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create stats dir {}", parent.display()))?;
        }
        fs::write(path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write stats {}", path.display()))?;
    }

    if plan.dry_run {
        info!(job = %plan.name, "dry run: nothing written");
        return Ok(());
    }
    let written = write_atlas(&out, &plan.out_dir, &PngEncoder, plan.metadata)
        .with_context(|| format!("write atlas to {}", plan.out_dir.display()))?;
    info!(
        texture = %written.texture.display(),
        metadata = %written.metadata.display(),
        "wrote atlas"
    );
    Ok(())
}

fn parse_metadata(s: &str) -> anyhow::Result<MetadataFormat> {
    s.parse()
        .map_err(|_| anyhow!("unknown metadata format '{}' (expected json or xml)", s))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globs(include)?;
    let exc_set = build_globs(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else if path.is_dir() {
        // Sorted walk so the fresh-mode input order is reproducible.
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    } else {
        bail!("input {} does not exist", path.display());
    }
    Ok(list)
}

fn build_globs(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat).with_context(|| format!("bad glob '{}'", pat))?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

/// Tile id: path relative to the input root, extension dropped, `/` separated.
fn tile_id(root: &Path, p: &Path) -> String {
    let rel = match p.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => Path::new(p.file_name().unwrap_or(p.as_os_str())),
    };
    rel.with_extension("").to_string_lossy().replace('\\', "/")
}

/// Decodes every path into a tile, in path order.
///
/// A file that fails to decode fails the whole load, unless `skip_unreadable`
/// is set, in which case it is logged and left out.
fn load_tiles_with_progress(
    root: &Path,
    paths: &[PathBuf],
    skip_unreadable: bool,
    progress: bool,
) -> anyhow::Result<Vec<Tile>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };

    let load = |p: &PathBuf| -> Option<anyhow::Result<Tile>> {
        if let Some(b) = &bar {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
        }
        let tile = match load_tile(root, p) {
            Ok(tile) => Some(Ok(tile)),
            Err(e) if skip_unreadable => {
                warn!(?p, error = %e, "skip unreadable image");
                None
            }
            Err(e) => Some(Err(e.context(format!("decode image {}", p.display())))),
        };
        if let Some(b) = &bar {
            b.inc(1);
        }
        tile
    };

    #[cfg(feature = "parallel")]
    let list = paths.par_iter().filter_map(load).collect::<anyhow::Result<Vec<Tile>>>();
    #[cfg(not(feature = "parallel"))]
    let list = paths.iter().filter_map(load).collect::<anyhow::Result<Vec<Tile>>>();

    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    list
}

fn load_tile(root: &Path, p: &Path) -> anyhow::Result<Tile> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(Tile::new(tile_id(root, p), img.to_rgba8()))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Build file: shared defaults plus one entry per atlas.
///
/// ```yaml
/// max_width: 4096
/// out_dir: out
/// jobs:
///   - name: standard
///     input: icons/standard
///     legacy_image: shipped/standard.png
///     legacy_sidecar: shipped/standard.json
///   - name: free
///     input: icons/free
/// ```
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct YamlConfig {
    max_width: Option<u32>,
    max_height: Option<u32>,
    out_dir: Option<PathBuf>,
    metadata: Option<String>,
    #[serde(default)]
    jobs: Vec<YamlJob>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlJob {
    name: String,
    input: PathBuf,
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    skip_unreadable: bool,
    legacy_image: Option<PathBuf>,
    legacy_sidecar: Option<PathBuf>,
    sort: Option<bool>,
    out_dir: Option<PathBuf>,
    metadata: Option<String>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    export_stats: Option<PathBuf>,
}

impl YamlConfig {
    /// Relative paths resolve against `base`, the directory of the build file.
    fn into_plans(self, base: &Path, dry_run: bool) -> anyhow::Result<Vec<JobPlan>> {
        if self.jobs.is_empty() {
            bail!("build file lists no jobs");
        }
        let defaults = AtlasConfig::default();
        let mut plans = Vec::with_capacity(self.jobs.len());
        for job in self.jobs {
            let legacy = match (job.legacy_image, job.legacy_sidecar) {
                (Some(img), Some(side)) => Some((base.join(img), base.join(side))),
                (None, None) => None,
                _ => bail!(
                    "job '{}': legacy_image and legacy_sidecar must be given together",
                    job.name
                ),
            };
            let cfg = AtlasConfig {
                max_width: job.max_width.or(self.max_width).unwrap_or(defaults.max_width),
                max_height: job
                    .max_height
                    .or(self.max_height)
                    .unwrap_or(defaults.max_height),
            };
            let metadata = job
                .metadata
                .as_deref()
                .or(self.metadata.as_deref())
                .map(parse_metadata)
                .transpose()?
                .unwrap_or(MetadataFormat::Json);
            let out_dir = job
                .out_dir
                .or_else(|| self.out_dir.clone())
                .unwrap_or_else(|| PathBuf::from("out"));
            plans.push(JobPlan {
                name: job.name,
                input: base.join(job.input),
                include: job.include,
                exclude: job.exclude,
                skip_unreadable: job.skip_unreadable,
                legacy,
                sort: job.sort,
                out_dir: base.join(out_dir),
                metadata,
                cfg,
                export_stats: job.export_stats.map(|p| base.join(p)),
                dry_run,
            });
        }
        Ok(plans)
    }
}

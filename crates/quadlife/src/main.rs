//! `quadlife`: run a pattern headlessly and write the result.
//!
//! ```text
//! quadlife glider.rle --steps 1024 --out runs/
//! ```
//!
//! Writes `runs/glider.rle.1024`. Set `RUST_LOG=quadlife=debug` for
//! per-step progress.
//!
//! `quadlife --serve-worker` instead runs a bare worker that speaks
//! newline-delimited JSON on stdin and stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use quadlife::headless;
use quadlife::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "quadlife",
    version,
    about = "Advance a Life pattern with hashlife and export the result"
)]
struct Cli {
    /// Pattern file (`x = W, y = H` header followed by a run-length body).
    #[arg(required_unless_present = "serve_worker")]
    input: Option<PathBuf>,

    /// Generations to advance; the run stops at the first age at or past this.
    #[arg(long, required_unless_present = "serve_worker")]
    steps: Option<u64>,

    /// Directory the `{name}.{age}` export is written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Worker node threshold is `2^E`.
    #[arg(long = "gc-exponent", value_name = "E", default_value_t = 20)]
    gc_exponent: u32,

    /// Generations per step request are `2^S`.
    #[arg(long, value_name = "S", default_value_t = 10)]
    speed: u32,

    /// Print the final status and worker counters as JSON.
    #[arg(long)]
    json: bool,

    /// Serve the worker protocol as JSON lines over stdin/stdout.
    #[arg(long, conflicts_with_all = ["input", "steps"])]
    serve_worker: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn split_input(path: &Path) -> Result<(PathBuf, String)> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        bail!("input path {} has no file name", path.display());
    };
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Ok((root.to_path_buf(), name.to_string()))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if cli.serve_worker {
        let stdin = std::io::stdin().lock();
        let stdout = std::io::stdout().lock();
        let metrics = quadlife::runtime::serve_lines::<Universe, _, _>(stdin, stdout)
            .context("serving worker over stdio")?;
        tracing::info!(steps = metrics.steps_applied, "worker finished");
        return Ok(());
    }
    let (Some(input), Some(steps)) = (cli.input.as_deref(), cli.steps) else {
        bail!("a pattern file and --steps are required");
    };

    let (root, name) = split_input(input)?;
    let source = FsPatternSource::new(root);
    let text = source
        .fetch(&name)
        .with_context(|| format!("loading {}", input.display()))?;

    let mut config = SessionConfig {
        initial_pattern: text,
        pattern_name: name,
        gc_threshold_exponent: cli.gc_exponent,
        ..SessionConfig::default()
    };
    config.pacing = PacingConfig {
        speed_exponent: cli.speed,
        fps_exponent: quadlife::runtime::pacing::MAX_FPS_EXPONENT,
        max_speed_exponent: config.pacing.max_speed_exponent.max(cli.speed),
        ..config.pacing
    };

    let outcome = headless::run::<Universe>(config, steps).context("running session")?;

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;
    let path = cli.out.join(&outcome.export.file_name);
    std::fs::write(&path, &outcome.export.text)
        .with_context(|| format!("writing {}", path.display()))?;

    if cli.json {
        let report = serde_json::json!({
            "export": path,
            "status": outcome.status,
            "worker": outcome.worker,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: age {}, {} live cells",
            path.display(),
            outcome.status.age,
            outcome.status.live_cells
        );
    }
    Ok(())
}

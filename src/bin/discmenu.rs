//! CLI entry point (§10.4).
//!
//! ```text
//! discmenu <input_path> --out <dir> [--stage menu_images] [--jobs N]
//! ```

use anyhow::{bail, Context};
use clap::Parser;
use discmenu::{run_pool, ButtonEntry, Config, DvdFormatAdapter, NavMapping, OcrCapability, OcrResult};
use discmenu::frames::FrameSampler;
use std::path::{Path, PathBuf};

/// Recovers DVD menu button geometry and page structure from SPU navigation data.
#[derive(Parser, Debug)]
#[command(name = "discmenu", version, about, long_about = None)]
struct Cli {
    /// Path to the validated nav-stage mapping artifact (JSON).
    input_path: PathBuf,

    /// Stage output directory; button PNGs and menu_images.json are written here.
    #[arg(long = "out")]
    out: PathBuf,

    /// Accepted for forward compatibility with the larger pipeline's stage-selection convention.
    #[arg(long = "stage", default_value = "menu_images")]
    stage: String,

    /// Worker pool size. Defaults to available CPU parallelism.
    #[arg(long = "jobs")]
    jobs: Option<usize>,

    /// Optional TOML file overriding Config defaults.
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

/// Placeholder frame sampler: real deployments wire this to an external media tool. Kept here
/// (rather than in the library) since invoking an external process is a binary-only concern.
struct ExternalToolSampler {
    timeout_secs: u64,
}

impl FrameSampler for ExternalToolSampler {
    fn sample_frames(&self, menu_id: &str, vob_path: &Path, out_dir: &Path) -> discmenu::Result<Vec<PathBuf>> {
        let _ = self.timeout_secs;
        Err(discmenu::Error::new(discmenu::ErrorDetails::ToolFailure {
            menu_id: menu_id.to_string(),
            message: format!(
                "no frame-sampling tool configured for {} (out_dir {})",
                vob_path.display(),
                out_dir.display()
            ),
        }))
    }
}

/// Placeholder OCR capability; see [`ExternalToolSampler`].
struct ExternalToolOcr;

impl OcrCapability for ExternalToolOcr {
    fn recognize(&self, menu_id: &str, image_path: &Path) -> discmenu::Result<OcrResult> {
        Err(discmenu::Error::new(discmenu::ErrorDetails::ToolFailure {
            menu_id: menu_id.to_string(),
            message: format!("no OCR tool configured for {}", image_path.display()),
        }))
    }
}

fn write_manifest(out_dir: &Path, entries: &[ButtonEntry]) -> anyhow::Result<()> {
    let path = out_dir.join("menu_images.json");
    let json = serde_json::to_vec_pretty(entries).context("serializing menu_images.json")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.stage != "menu_images" {
        bail!("unsupported --stage {:?}; this binary only implements menu_images", cli.stage);
    }

    let bytes = std::fs::read(&cli.input_path)
        .with_context(|| format!("reading nav-stage mapping at {}", cli.input_path.display()))?;
    let mapping = NavMapping::from_json(&bytes).context("validating nav-stage mapping")?;

    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
            Config::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };

    std::fs::create_dir_all(&cli.out).with_context(|| format!("creating output directory {}", cli.out.display()))?;

    let jobs = cli
        .jobs
        .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));

    let sampler = ExternalToolSampler {
        timeout_secs: config.tool_timeout_secs,
    };
    let adapter = DvdFormatAdapter::new(mapping, sampler);
    let ocr = ExternalToolOcr;

    let menu_ids: Vec<String> = adapter.list_menus();
    let results = run_pool(&adapter, &ocr, &menu_ids, &cli.out, &config, jobs);

    let mut all_entries = Vec::new();
    for result in &results {
        log::info!(
            "menu {}: {:?}, {} button(s)",
            result.menu_id,
            result.state,
            result.buttons.len()
        );
        if matches!(result.state, discmenu::PipelineState::DoneNoButtons) && result.buttons.is_empty() {
            log::warn!("menu {}: zero buttons recovered", result.menu_id);
        }
        all_entries.extend(result.buttons.clone());
    }

    write_manifest(&cli.out, &all_entries)?;

    Ok(())
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("discmenu: {e:#}");
        std::process::exit(1);
    }
}

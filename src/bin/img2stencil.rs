//! CLI binary for img2stencil.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `StencilConfig`, renders workflow progress, and writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use img2stencil::{
    config, stencilize, DownloadPayload, StencilConfig, WorkflowCallback, WorkflowHooks,
    WorkflowPhase,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress rendering: a spinner through upload/submit, switching to
/// a poll-count bar once the job is processing.
struct CliWorkflowCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Poll attempt budget; becomes the bar length.
    max_polls: u32,
    /// Whether the bar has been switched from spinner to counter style.
    bar_active: AtomicBool,
}

impl CliWorkflowCallback {
    fn new(max_polls: u32) -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            max_polls,
            bar_active: AtomicBool::new(false),
        })
    }

    /// Switch to the poll-counter style on the first processing event.
    fn activate_bar(&self) {
        if self.bar_active.swap(true, Ordering::SeqCst) {
            return;
        }
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} polls  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(u64::from(self.max_polls));
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Processing");
    }
}

impl WorkflowCallback for CliWorkflowCallback {
    fn on_phase(&self, phase: &WorkflowPhase) {
        match phase {
            WorkflowPhase::Uploading => {
                self.bar.set_prefix("Uploading");
                self.bar.set_message("transferring image to storage…");
            }
            WorkflowPhase::Ready => {
                self.bar.set_message("upload confirmed");
            }
            WorkflowPhase::Submitting => {
                self.bar.set_prefix("Submitting");
                self.bar.set_message("sending transformation job…");
            }
            WorkflowPhase::Processing { attempt: 0 } => {
                self.activate_bar();
            }
            WorkflowPhase::Processing { attempt } => {
                self.activate_bar();
                self.bar.set_position(u64::from(*attempt));
            }
            WorkflowPhase::Complete => {
                self.bar.finish_and_clear();
            }
            WorkflowPhase::Error => {
                self.bar.finish_and_clear();
            }
        }
    }

    fn on_preview(&self, url: &str) {
        self.bar
            .println(format!("  {} input asset  {}", cyan("◆"), dim(url)));
    }

    fn on_result(&self, url: &str) {
        self.bar
            .println(format!("  {} result ready {}", green("✓"), dim(url)));
    }

    fn on_error(&self, message: &str) {
        self.bar.println(format!("  {} {}", red("✗"), red(message)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Stencilise a photo (writes ./stencil_art_<id>.<ext>)
  img2stencil photo.jpg

  # Choose the output path
  img2stencil photo.jpg -o stencil.png

  # A different effect, keeping the service watermark
  img2stencil --effect sketchMaker --keep-watermark photo.jpg

  # Structured JSON result on stdout
  img2stencil --json photo.jpg > run.json

  # Patience for a busy backend: poll every 5 s, up to 5 minutes
  img2stencil --poll-interval 5000 --max-polls 60 photo.jpg

WHAT A RUN DOES:
  1. uploads the image under a random storage key
  2. submits the effect job referencing the uploaded asset
  3. polls the job status (poll-interval × max-polls bounds the wait)
  4. downloads the result — falling back from the service's download proxy
     to a direct fetch to a local PNG re-encode; if every byte-yielding
     route fails you get the raw URL to open yourself

ENVIRONMENT VARIABLES:
  IMG2STENCIL_API_BASE       Effects API base URL
  IMG2STENCIL_CONTENTS_BASE  Public storage base URL
  IMG2STENCIL_USER_ID        Owner id for submissions
  IMG2STENCIL_EFFECT         Effect id (default: stencilMaker)
"#;

/// Turn photos into stencil art via a remote image-effects service.
#[derive(Parser, Debug)]
#[command(
    name = "img2stencil",
    version,
    about = "Turn photos into stencil art via the ChromaStudio image-effects API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image file to transform.
    input: PathBuf,

    /// Write the result to this file instead of ./<generated name>.
    #[arg(short, long, env = "IMG2STENCIL_OUTPUT")]
    output: Option<PathBuf>,

    /// Effects API base URL.
    #[arg(long, env = "IMG2STENCIL_API_BASE", default_value = config::DEFAULT_API_BASE)]
    api_base: String,

    /// Public storage base URL uploads are served from.
    #[arg(long, env = "IMG2STENCIL_CONTENTS_BASE", default_value = config::DEFAULT_CONTENTS_BASE)]
    contents_base: String,

    /// Owner id sent with submissions and status queries.
    #[arg(long, env = "IMG2STENCIL_USER_ID", default_value = config::DEFAULT_USER_ID)]
    user_id: String,

    /// Effect id to apply.
    #[arg(long, env = "IMG2STENCIL_EFFECT", default_value = config::DEFAULT_EFFECT_ID)]
    effect: String,

    /// Delay between status polls, in milliseconds.
    #[arg(long, env = "IMG2STENCIL_POLL_INTERVAL", default_value_t = 2000)]
    poll_interval: u64,

    /// Maximum number of status polls before giving up.
    #[arg(long, env = "IMG2STENCIL_MAX_POLLS", default_value_t = 60)]
    max_polls: u32,

    /// Per-request API timeout in seconds.
    #[arg(long, env = "IMG2STENCIL_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Upload (PUT) timeout in seconds.
    #[arg(long, env = "IMG2STENCIL_UPLOAD_TIMEOUT", default_value_t = 120)]
    upload_timeout: u64,

    /// Result-fetch timeout in seconds.
    #[arg(long, env = "IMG2STENCIL_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Keep the service watermark on the result.
    #[arg(long)]
    keep_watermark: bool,

    /// Allow the job into public galleries.
    #[arg(long)]
    public: bool,

    /// Output the structured run result as JSON on stdout.
    #[arg(long, env = "IMG2STENCIL_JSON")]
    json: bool,

    /// Disable progress rendering.
    #[arg(long, env = "IMG2STENCIL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2STENCIL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2STENCIL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let hooks: Option<WorkflowHooks> = if show_progress {
        Some(CliWorkflowCallback::new(cli.max_polls) as WorkflowHooks)
    } else {
        None
    };

    let mut builder = StencilConfig::builder()
        .api_base(&cli.api_base)
        .contents_base(&cli.contents_base)
        .user_id(&cli.user_id)
        .effect_id(&cli.effect)
        .poll_interval_ms(cli.poll_interval)
        .max_polls(cli.max_polls)
        .api_timeout_secs(cli.api_timeout)
        .upload_timeout_secs(cli.upload_timeout)
        .download_timeout_secs(cli.download_timeout)
        .remove_watermark(!cli.keep_watermark)
        .is_private(!cli.public);

    if let Some(cb) = hooks {
        builder = builder.hooks(cb);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let output = stencilize(&cli.input, &config)
        .await
        .context("Stencil run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    }

    // ── Write the result ─────────────────────────────────────────────────
    match output.payload {
        DownloadPayload::Bytes(ref bytes) => {
            let out_path = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&output.file_name));
            write_atomic(&out_path, bytes)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;

            if !cli.quiet {
                eprintln!(
                    "{}  {}  {}",
                    green("✔"),
                    bold(&out_path.display().to_string()),
                    dim(&format!("{} bytes via {}", bytes.len(), output.strategy)),
                );
            }
        }
        DownloadPayload::Navigate { ref url } => {
            // Every byte-yielding route failed; hand the URL to the user.
            if !cli.quiet {
                eprintln!(
                    "{}  could not fetch the result bytes; open it yourself:",
                    cyan("⚠")
                );
                eprintln!("   {}", bold(url));
                eprintln!("   suggested name: {}", output.file_name);
            }
        }
    }

    if !cli.quiet {
        eprintln!(
            "   {}",
            dim(&format!(
                "job {}  ·  {} polls  ·  {}ms total",
                output.job_id, output.stats.poll_attempts, output.stats.total_ms
            )),
        );
        for failure in &output.download_failures {
            eprintln!(
                "   {}",
                dim(&format!("{} stage skipped: {}", failure.strategy, failure.reason)),
            );
        }
    }

    Ok(())
}

/// Temp-then-rename write so an interrupted run never leaves a torn file.
fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)
}

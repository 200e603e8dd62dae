//! CLI binary for resumind.
//!
//! A thin shim over the library crate: maps flags to `AnalysisConfig`, shows
//! the workflow status on a spinner and prints reports.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumind::report::{render_list, render_report, ReportStyle};
use resumind::{
    analyze_resume, AnalysisConfig, AnalysisProgressCallback, JobDetails, ProgressCallback,
    ResumeLibrary, Stage, COMPLETE_STATUS,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

static COLOR: AtomicBool = AtomicBool::new(true);

fn paint(code: &str, s: &str) -> String {
    if COLOR.load(Ordering::Relaxed) {
        format!("\x1b[{code}m{s}\x1b[0m")
    } else {
        s.to_string()
    }
}
fn green(s: &str) -> String {
    paint("32", s)
}
fn red(s: &str) -> String {
    paint("31", s)
}
fn dim(s: &str) -> String {
    paint("2", s)
}
fn bold(s: &str) -> String {
    paint("1", s)
}

// ── CLI status callback using indicatif ──────────────────────────────────────

/// Spinner showing the current status line; each finished step is printed
/// above it with a tick.
struct CliProgressCallback {
    bar: ProgressBar,
    current: Mutex<Option<String>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    fn close_current(&self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(done) = current.take() {
                self.bar.println(format!("  {} {}", green("✓"), dim(&done)));
            }
        }
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_status(&self, _stage: Stage, text: &str) {
        self.close_current();
        if let Ok(mut current) = self.current.lock() {
            *current = Some(text.to_string());
        }
        self.bar.set_message(text.to_string());
    }

    fn on_failure(&self, _stage: Stage, text: &str) {
        self.bar.finish_and_clear();
        eprintln!("  {} {}", red("✗"), red(text));
    }

    fn on_complete(&self, _id: &str) {
        self.close_current();
        self.bar.finish_and_clear();
        eprintln!("{} {}", green("✔"), bold(COMPLETE_STATUS));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a resume against a job posting
  resumind analyze cv.pdf --company Acme --title "Backend Engineer" \
      --description-file job.txt

  # Resume hosted somewhere, JSON output
  resumind analyze https://example.com/cv.pdf --company Acme \
      --title "Data Analyst" --description "SQL, Python, dashboards" --json

  # Browse past reviews
  resumind list
  resumind show 3f2a... --pdf-out cv.pdf --image-out cv.png
  resumind delete 3f2a...

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY      OpenAI API key (default provider)
  ANTHROPIC_API_KEY   Anthropic API key
  GEMINI_API_KEY      Google Gemini API key
  RESUMIND_PROVIDER   Provider name (openai, anthropic, gemini, ollama)
  RESUMIND_MODEL      Model ID (default gpt-4.1-mini)
  RESUMIND_STORE      Storage directory (default .resumind)
  PDFIUM_LIB_PATH     Path to libpdfium or the directory holding it
"#;

/// Review resumes against job descriptions with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "resumind",
    version,
    about = "Review resumes against job descriptions with a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding stored resumes, previews and records.
    #[arg(long, global = true, env = "RESUMIND_STORE", default_value = ".resumind")]
    store: PathBuf,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "RESUMIND_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "RESUMIND_MODEL")]
    model: Option<String>,

    /// Path to libpdfium, or the directory containing it.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUMIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "RESUMIND_QUIET")]
    quiet: bool,

    /// Disable ANSI colours.
    #[arg(long, global = true, env = "RESUMIND_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a resume and review it against a job.
    Analyze(AnalyzeArgs),
    /// List stored resumes.
    List {
        /// Output records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the review of one stored resume.
    Show {
        id: String,
        /// Output the record as JSON.
        #[arg(long)]
        json: bool,
        /// Write the stored PDF to this file.
        #[arg(long)]
        pdf_out: Option<PathBuf>,
        /// Write the first-page preview PNG to this file.
        #[arg(long)]
        image_out: Option<PathBuf>,
    },
    /// Delete a stored resume and its files.
    Delete { id: String },
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("job_description")
        .required(true)
        .args(["description", "description_file"])
))]
struct AnalyzeArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Company name.
    #[arg(long)]
    company: String,

    /// Job title.
    #[arg(long)]
    title: String,

    /// Job description text.
    #[arg(long)]
    description: Option<String>,

    /// Read the job description from a file.
    #[arg(long)]
    description_file: Option<PathBuf>,

    /// Print the saved record as JSON instead of a report.
    #[arg(long)]
    json: bool,

    /// PDF user password for encrypted resumes.
    #[arg(long, env = "RESUMIND_PASSWORD")]
    password: Option<String>,

    /// Leading pages sent to the model.
    #[arg(long, env = "RESUMIND_PAGES", default_value_t = 2)]
    pages: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RESUMIND_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUMIND_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUMIND_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Retries on LLM failure.
    #[arg(long, env = "RESUMIND_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "RESUMIND_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUMIND_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let no_color = cli.no_color || std::env::var_os("NO_COLOR").is_some();
    COLOR.store(!no_color && io::stderr().is_terminal(), Ordering::Relaxed);

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would fight with the spinner; keep them off unless
    // --verbose asks for everything.
    let filter = if cli.verbose { "debug" } else { "error" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let style = ReportStyle {
        color: COLOR.load(Ordering::Relaxed) && io::stdout().is_terminal(),
    };

    match cli.command {
        Command::Analyze(ref args) => run_analyze(&cli, args, style).await,
        Command::List { json } => {
            let records = ResumeLibrary::open(&cli.store)
                .list()
                .await
                .context("Failed to list resumes")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&records).context("Failed to serialise records")?
                );
            } else {
                print!("{}", render_list(&records, style));
            }
            Ok(())
        }
        Command::Show {
            ref id,
            json,
            ref pdf_out,
            ref image_out,
        } => {
            let loaded = ResumeLibrary::open(&cli.store)
                .load(id)
                .await
                .with_context(|| format!("Failed to load resume {id}"))?;

            if let Some(path) = pdf_out {
                tokio::fs::write(path, &loaded.pdf)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            if let Some(path) = image_out {
                tokio::fs::write(path, &loaded.image)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&loaded.record)
                        .context("Failed to serialise record")?
                );
            } else {
                print!("{}", render_report(&loaded.record, style));
            }
            Ok(())
        }
        Command::Delete { ref id } => {
            let record = ResumeLibrary::open(&cli.store)
                .delete(id)
                .await
                .with_context(|| format!("Failed to delete resume {id}"))?;
            if !cli.quiet {
                match record {
                    Some(record) => eprintln!(
                        "{} Deleted {} at {} ({})",
                        green("✔"),
                        record.job_title,
                        record.company_name,
                        dim(&record.id)
                    ),
                    None => eprintln!("{} Deleted unreadable record {}", green("✔"), dim(id)),
                }
            }
            Ok(())
        }
    }
}

async fn run_analyze(cli: &Cli, args: &AnalyzeArgs, style: ReportStyle) -> Result<()> {
    let job_description = match (&args.description, &args.description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        (None, None) => String::new(),
    };
    let job = JobDetails {
        company_name: args.company.clone(),
        job_title: args.title.clone(),
        job_description,
    };

    let show_progress = !cli.quiet && !cli.verbose;
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let config = build_config(cli, args, progress).await?;

    let outcome = analyze_resume(&args.input, job, &config)
        .await
        .context("Analysis failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome.record).context("Failed to serialise record")?
        );
    } else {
        print!("{}", render_report(&outcome.record, style));
    }

    if !cli.quiet {
        eprintln!(
            "   {}  {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&outcome.record.id),
            outcome.stats.input_tokens,
            outcome.stats.output_tokens,
            outcome.stats.total_duration_ms,
        );
    }
    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(
    cli: &Cli,
    args: &AnalyzeArgs,
    progress: Option<ProgressCallback>,
) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .storage_dir(&cli.store)
        .analysis_pages(args.pages)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .max_retries(args.max_retries)
        .api_timeout_secs(args.api_timeout)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(ref password) = args.password {
        builder = builder.password(password);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

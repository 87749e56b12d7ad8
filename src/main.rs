use batch_resize::imaging::OutputFormat;
use batch_resize::{config, output, process};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Options shared by every command that resolves a config.
#[derive(clap::Args, Clone)]
struct ResizeArgs {
    /// Input folder containing images
    #[arg(short, long)]
    input: PathBuf,

    /// Target width in pixels
    #[arg(short, long)]
    width: Option<u32>,

    /// Target height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Stretch to exactly width x height instead of fitting inside
    #[arg(long)]
    no_aspect: bool,

    /// JPEG quality (1-100) [default: 95]
    #[arg(short, long)]
    quality: Option<u32>,

    /// Output image format [default: keep source format]
    #[arg(short, long, value_enum, ignore_case = true)]
    format: Option<OutputFormat>,

    /// Prefix for output file names
    #[arg(long)]
    prefix: Option<String>,

    /// Suffix for output file names (before the extension)
    #[arg(long)]
    suffix: Option<String>,

    /// Config file [default: <input>/resize.toml when present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum parallel workers [default: CPU cores]
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl ResizeArgs {
    fn overrides(&self) -> config::ConfigOverrides {
        config::ConfigOverrides {
            resize: config::ResizeOverrides {
                width: self.width,
                height: self.height,
                maintain_aspect: self.no_aspect.then_some(false),
            },
            output: config::OutputOverrides {
                format: self.format,
                quality: self.quality,
                prefix: self.prefix.clone(),
                suffix: self.suffix.clone(),
            },
            processing: config::ProcessingOverrides {
                max_processes: self.jobs,
            },
        }
    }

    fn load_config(&self) -> Result<config::ResizeConfig, config::ConfigError> {
        config::load_config(&self.input, self.config.as_deref(), &self.overrides())
    }
}

#[derive(Parser)]
#[command(name = "batch-resize")]
#[command(about = "Batch-resize and convert every image in a folder")]
#[command(long_about = "\
Batch-resize and convert every image in a folder

Every image directly inside the input folder (jpg, jpeg, png, bmp, gif, tiff,
tif, webp) is resized and written to the output folder. Subfolders are not
visited. A broken image is reported and skipped; the rest of the batch goes on.

Sizing:
  -w 800              800 wide, height follows the aspect ratio
  -H 600              600 high, width follows the aspect ratio
  -w 800 -H 600       fit inside 800x600, keeping the aspect ratio
  -w 800 -H 600 --no-aspect
                      exactly 800x600

Output names are prefix + original name + suffix + extension of the written
format. Converting to JPEG flattens transparency onto white.

Settings can also live in resize.toml in the input folder; command-line flags
win. Run 'batch-resize gen-config' to generate a documented resize.toml.")]
#[command(version)]
struct Cli {
    /// Show debug logging on stderr (RUST_LOG also works)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize every image in the input folder
    Resize {
        #[command(flatten)]
        args: ResizeArgs,

        /// Output folder for resized images (created if missing)
        #[arg(short, long)]
        output: PathBuf,

        /// Print the batch summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the images that would be resized and their output names, without decoding
    Check {
        #[command(flatten)]
        args: ResizeArgs,
    },
    /// Print a stock resize.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Execute one subcommand. `Ok(FAILURE)` means the batch ran but some images failed.
fn run(command: Command) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Resize {
            args,
            output: output_dir,
            json,
        } => {
            let config = args.load_config()?;
            init_thread_pool(&config.processing);
            tracing::debug!(?config, "resolved configuration");

            let summary = if json {
                process::process(&args.input, &output_dir, &config, None)?
            } else {
                run_with_progress(&args.input, &output_dir, &config)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                output::print_summary(&summary, &args.input);
            }
            if summary.has_failures() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Check { args } => {
            let config = args.load_config()?;
            let planned = process::plan(&args.input, &config)?;
            output::print_check_output(&planned, &args.input);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run the batch with a printer thread draining progress events.
fn run_with_progress(
    input: &Path,
    output_dir: &Path,
    config: &config::ResizeConfig,
) -> Result<process::BatchSummary, process::ProcessError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(input, output_dir, config, Some(tx));
    // The sender is gone once process() returns, so the printer always ends.
    if printer.join().is_err() {
        tracing::warn!("progress printer panicked");
    }
    result
}

/// Diagnostics go to stderr so stdout stays clean for progress and `--json`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

use blurred_images::{config, output, process};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blurred-images")]
#[command(about = "Produce blurred variants of images for asset builds")]
#[command(long_about = "\
Produce blurred variants of images for asset builds

Each target in the task file pairs a list of blur levels with file groups.
Every source image gets one output per level:

  assets/panther.jpg  ─┬─ level 1, \"low\"   →  build/panther-low.jpg
                       └─ level 3, \"high\"  →  build/panther-high.jpg

Existing outputs are left alone unless skip_existing = false, so running
the same task twice only fills in what is missing.

Engines: rust (built in, default), gm (GraphicsMagick), im (ImageMagick).

Run 'blurred-images gen-config' to generate a documented task file.")]
#[command(version)]
struct Cli {
    /// Task file; relative paths inside it resolve against its directory
    #[arg(long, default_value = "blurred-images.toml", global = true)]
    config: PathBuf,

    /// List every file as it is processed and show debug diagnostics
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Blur all targets, or only the named ones
    Run {
        /// Target names, in any order; targets run in task-file order
        targets: Vec<String>,
    },
    /// Validate the task file and print the plan without writing anything
    Check {
        /// Target names; all targets when omitted
        targets: Vec<String>,
    },
    /// Print a stock task file with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fatal error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Warnings to stderr; `RUST_LOG` overrides, `--verbose` forces debug.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Run { targets } => {
            let task = config::load_config(&cli.config)?;
            let base = base_dir(&cli.config);
            for target in task.select_targets(&targets)? {
                output::print_target_header(&target.name);
                let (tx, rx) = mpsc::channel();
                let printer_base = base.clone();
                let verbose = cli.verbose;
                let printer = std::thread::spawn(move || {
                    for event in rx {
                        for line in output::format_process_event(&event, &printer_base, verbose) {
                            println!("{}", line);
                        }
                    }
                });
                let result = process::run_target(&task, target, &base, Some(tx));
                if printer.join().is_err() {
                    return Err("output thread panicked".into());
                }
                let result = result?;
                tracing::debug!(
                    target_name = %target.name,
                    "{} file(s) blurred",
                    result.total_blurred()
                );
            }
        }
        Command::Check { targets } => {
            let task = config::load_config(&cli.config)?;
            let base = base_dir(&cli.config);
            println!("==> Checking {}", cli.config.display());
            for target in task.select_targets(&targets)? {
                let plan = process::prepare_target(&task, target, &base)?;
                let steps = plan.steps()?;
                output::print_plan(&plan, &steps);
            }
            println!("==> Task file is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Directory holding the task file.
fn base_dir(config: &Path) -> PathBuf {
    match config.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

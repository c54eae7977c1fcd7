use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thumbsweep::config::{self, ConfigOverrides};
use thumbsweep::imaging::RustBackend;
use thumbsweep::output;
use thumbsweep::paths::PathPolicy;
use thumbsweep::sweep::{self, SweepOptions};

fn version_string() -> &'static str {
    match (env!("THUMBSWEEP_RELEASE"), env!("THUMBSWEEP_BUILD")) {
        ("true", _) => env!("CARGO_PKG_VERSION"),
        (_, "") => "dev@unknown",
        _ => concat!("dev@", env!("THUMBSWEEP_BUILD")),
    }
}

#[derive(Parser)]
#[command(name = "thumbsweep")]
#[command(about = "Downsize marked images on a website tree and convert them to WebP")]
#[command(long_about = "\
Downsize marked images on a website tree and convert them to WebP

Walks the site root depth-first. In every HTML page, each <img> carrying a
marker class (default: fastimg) is checked. Images wider than the target width
(default: 700px) are resized to exactly that width, saved as WebP next to the
original, and the page's src is switched to the new file. The original moves
into a per-directory archive folder (default: imgsource/):

  site/
  ├── thumbsweep.toml       # Optional config
  ├── index.html            # <img class=\"fastimg\" src=\"pic.webp\">
  ├── pic.webp              # 700px wide
  └── imgsource/
      └── pic.png           # Original, never overwritten

Running again changes nothing. Use 'thumbsweep check' to see what a run
would do without writing anything.

Run 'thumbsweep gen-config' to generate a documented thumbsweep.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root to sweep
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Marker class that opts an <img> in (repeatable, replaces the configured list)
    #[arg(long = "marker", value_name = "CLASS", global = true)]
    markers: Vec<String>,

    /// Directory never descended into, relative to the root (repeatable, replaces the configured list)
    #[arg(long = "ignore", value_name = "DIR", global = true)]
    ignore: Vec<String>,

    /// Name of the per-directory folder that receives originals
    #[arg(long, value_name = "NAME", global = true)]
    archive_folder: Option<String>,

    /// Images wider than this many pixels are downsized to it
    #[arg(long, value_name = "PX", global = true)]
    target_width: Option<u32>,

    /// Config file (default: <root>/thumbsweep.toml if present)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Report every directory and file fetched
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Clone, Default)]
struct RunArgs {
    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Sweep the site: downsize, convert, archive, rewrite (default)
    Run(RunArgs),
    /// Report what a run would change without writing anything
    Check,
    /// Print a stock thumbsweep.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            marker_classes: self.markers.clone(),
            ignore_dirs: self.ignore.clone(),
            archive_folder: self.archive_folder.clone(),
            target_width: self.target_width,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Command::Run(RunArgs::default())) {
        Command::Run(args) => run_sweep(&cli, false, args.report.as_deref())?,
        Command::Check => run_sweep(&cli, true, None)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run_sweep(
    cli: &Cli,
    dry_run: bool,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli
        .overrides()
        .apply(config::load_config(&cli.root, cli.config.as_deref())?);
    config.validate()?;
    let policy = PathPolicy::new(&cli.root, &config.ignore_dirs)?;

    output::print_run_header(&policy, &config, dry_run);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_sweep_event(&event) {
                println!("{}", line);
            }
        }
    });
    let backend = RustBackend::new();
    let options = SweepOptions {
        dry_run,
        verbose: cli.verbose,
    };
    let result = sweep::sweep(&config, &policy, &backend, options, Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;
    let summary = result?;

    output::print_summary(&summary);
    if let Some(path) = report {
        sweep::write_report(&summary, path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

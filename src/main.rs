use clap::{Parser, Subcommand};
use signet::{config, output, process, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "signet")]
#[command(about = "Stamp a signature onto every photo in a directory")]
#[command(long_about = "\
Stamp a signature onto every photo in a directory

Every file in the source directory whose extension is configured gets the
signature text drawn near its bottom-right corner. The result is written to
the output directory under the same name and in the same format.

  source-images/                 output-images/
  ├── 001-dawn.jpg         →     ├── 001-dawn.jpg       # signed
  ├── 002-dusk.jpg         →     ├── 002-dusk.jpg       # signed
  ├── notes.txt                  └── .watermark-cache.json
  └── archive/                   # subdirectories are ignored

Font size follows image area (1px per 19000 pixels, capped by
max_font_size). The text sits at 98% of the free space on each axis.

Run 'signet gen-config' to generate a documented signet.toml.")]
#[command(version)]
struct Cli {
    /// Output directory (overrides output_dir from the config)
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Source directory (overrides source_dir from the config)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Config file (defaults to ./signet.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable the watermark cache and re-encode every image
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watermark every matching file (the default)
    Run,
    /// List the files a run would process
    List,
    /// Print a stock signet.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Command::Run) {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::List => {
            let config = load_config(&cli)?;
            let files = scan::list_files(&config.source_dir, &config.extensions)?;
            output::print_file_list(&config.source_dir, &files);
        }
        Command::Run => {
            let config = load_config(&cli)?;
            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::run(&config, !cli.no_cache, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;
            output::print_summary(&config.output_dir, &result.cache_stats);
        }
    }

    Ok(())
}

/// Config file (explicit or `./signet.toml`) with the directory flags applied.
fn load_config(cli: &Cli) -> Result<config::WatermarkConfig, config::ConfigError> {
    Ok(config::load_config(cli.config.as_deref())?
        .with_overrides(cli.source.clone(), cli.path.clone()))
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

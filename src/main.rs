use clap::{Parser, Subcommand};
use purtypics::generate::{GenerateError, Generator};
use purtypics::imaging::{NativeBackend, VideoTools};
use purtypics::render::ManifestRenderer;
use purtypics::{config, metadata, output, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "purtypics")]
#[command(about = "Static photo and video gallery generator")]
#[command(long_about = "\
Static photo and video gallery generator

Your filesystem is the data source. Every directory under the source root
becomes an album; its photos and videos become the album's entries.

Source structure:

  photos/
  ├── config.toml          # Generator settings (optional)
  ├── gallery.yaml         # Titles, descriptions, hidden flags (optional)
  ├── Trip_One/            # Album \"Trip One\"
  │   ├── IMG_0001.jpg
  │   └── clip.mov         # Video: poster frame + copied original
  └── empty_dir/           # No media: not an album

Output structure:

  dist/
  ├── gallery.json                          # Album model for the renderer
  └── static/
      ├── thumbs/<album>/<photo>_<size>.jpg
      └── videos/<album>/<photo>.<ext>

Processed files are cached: a variant is only regenerated when its source
is newer. Videos need ffmpeg and ffprobe on the PATH.

Run 'purtypics gen-config' to print a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory containing album folders
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Metadata file, relative to the source directory unless absolute
    /// (defaults to the configured file)
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    /// Log debug detail (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan, process media and write the gallery
    Generate,
    /// Validate the source tree and metadata without processing
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate => {
            ensure_distinct(&cli.source, &cli.output)?;
            let config = config::load_config(&cli.source)?;
            let backend = NativeBackend::with_tools(VideoTools::new(
                config.video.ffmpeg.as_str(),
                config.video.ffprobe.as_str(),
            ));

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
            });

            let metadata_path = config.metadata_path_with(&cli.source, cli.metadata.as_deref());
            let generator = Generator::new(&cli.source, &cli.output, config, &backend)
                .metadata_path(metadata_path)
                .events(tx);
            let result = generator.run(&ManifestRenderer);
            // Dropping the generator closes the channel so the printer can finish
            drop(generator);
            if printer.join().is_err() {
                tracing::warn!("progress printer panicked");
            }

            let result = result?;
            output::print_summary(&result);
            println!("==> Gallery written to {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let config = config::load_config(&cli.source)?;
            let metadata_path = config.metadata_path_with(&cli.source, cli.metadata.as_deref());
            let meta = metadata::load(&metadata_path)?;
            let albums = scan::scan(&cli.source)?;
            if albums.is_empty() {
                return Err(GenerateError::NoAlbums(cli.source.clone()).into());
            }
            output::print_scan_output(&albums, &meta, &cli.source, &metadata_path);
            println!("==> Source is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `info` by default, `debug` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default = if verbose { "purtypics=debug" } else { "purtypics=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Writing the gallery into its own source tree would scan the output as albums.
fn ensure_distinct(source: &Path, output: &Path) -> Result<(), String> {
    let source = source
        .canonicalize()
        .map_err(|e| format!("cannot read source directory {}: {e}", source.display()))?;
    let same = match output.canonicalize() {
        Ok(output) => output == source,
        Err(_) => false,
    };
    if same {
        return Err(format!(
            "output directory must differ from the source directory ({})",
            source.display()
        ));
    }
    Ok(())
}

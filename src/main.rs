use clap::{Parser, Subcommand};
use srcsetter::transform::Transformer;
use srcsetter::types::OutputFormat;
use srcsetter::{config, naming, output, pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "srcsetter")]
#[command(about = "Responsive, lazy-loading images for rendered static sites")]
#[command(long_about = "\
Responsive, lazy-loading images for rendered static sites

Runs after your site generator has rendered its pages. Every <img> gets
loading=\"lazy\". Images referenced under the managed prefix are resized to
the configured widths and formats and replaced by <picture> markup:

  src/posts/img/image one.jpg          # source, referenced as img/image%20one.jpg
  _site/img/image-one-716.webp         # derivatives: {stem}-{width}.{format}
  _site/img/image-one-716.jpeg
  _site/img/image-one-800.webp
  ...

Derivatives already on disk are reused, so rebuilding is cheap.

Run 'srcsetter gen-config' to generate a documented srcsetter.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform every HTML page of a rendered site in place
    Build {
        /// Rendered site directory
        #[arg(long, default_value = "_site")]
        site: PathBuf,
        /// Write a JSON report of every page to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Transform a single rendered file
    Transform {
        /// Rendered file to read
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the derivative filename for a source image
    Name {
        /// Source image path, e.g. src/posts/img/desk.jpg
        source: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long, default_value = "webp")]
        format: OutputFormat,
    },
    /// Print a stock srcsetter.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Build { site, report } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            let transformer = Transformer::from_site_config(&config);

            println!("==> Transforming {}", site.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_page_event(&event);
                }
            });
            let result = pipeline::build_site(
                &transformer,
                &site,
                Some(Path::new(&config.images.output_dir)),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;

            output::print_site_summary(&result);
            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)?;
            }

            let failed = result.failed().count();
            if failed > 0 {
                return Err(format!("{failed} page(s) failed to transform").into());
            }
            println!("==> Build complete");
        }
        Command::Transform { file, output: out } => {
            let config = config::load_config(&cli.config)?;
            let transformer = Transformer::from_site_config(&config);

            let html = std::fs::read_to_string(&file)?;
            let target = out.as_deref().unwrap_or(file.as_path());
            let page = transformer.transform(&html, target)?;

            for line in output::format_page_report(&page.report) {
                eprintln!("{}", line);
            }
            match out {
                Some(path) => pipeline::write_atomic(&path, &page.html)?,
                None => print!("{}", page.html),
            }
        }
        Command::Name {
            source,
            width,
            format,
        } => {
            let config = config::load_config(&cli.config)?;
            println!(
                "{}",
                naming::derivative_filename(&source, &config.managed_root(), width, format)
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("srcsetter=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

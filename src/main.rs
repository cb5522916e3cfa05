use clap::{Parser, Subcommand};
use jinjagen::generate::{self, BuildOptions};
use jinjagen::{config, output};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Directories shared by `build` and `check`.
#[derive(clap::Args, Clone)]
struct DirArgs {
    /// Directory holding the Jinja templates
    #[arg(long, default_value = "templates")]
    templates: PathBuf,

    /// Data directory (site.toml, content collections, media, published bodies)
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// Output directory; stylesheets, scripts, and icons are resolved against it
    #[arg(long, default_value = "dist")]
    output: PathBuf,

    /// Downgrade missing required fields and article bodies to warnings
    #[arg(long)]
    no_strict: bool,
}

impl DirArgs {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            templates: self.templates.clone(),
            data: self.data.clone(),
            output: self.output.clone(),
            strict: !self.no_strict,
        }
    }
}

#[derive(Parser)]
#[command(name = "jinjagen")]
#[command(about = "Static site generator for visual and article blogs")]
#[command(long_about = "\
Static site generator for visual and article blogs

Content comes from JSON collections in the data directory; layout comes from
Jinja templates. Every page sees a single `props` object.

Data structure:

  data/
  ├── site.toml                  # Config (optional, merged onto defaults)
  ├── content.sections.json      # Sections: category landing pages
  ├── content.visual.json        # Visual posts (img, video)
  ├── content.article.json       # Article posts
  └── published/
      ├── img/, video/           # Files named by visual posts
      ├── article/{url}/html/content.html   # Article bodies
      └── news/content.html      # News snippet (site.show_news)

Run 'jinjagen gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate content and render the site
    Build {
        #[command(flatten)]
        dirs: DirArgs,

        /// Write a tab-separated log of every generated page
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Validate content, templates, and assets without rendering
    Check {
        #[command(flatten)]
        dirs: DirArgs,
    },
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build { dirs, log_file } => {
            println!("==> Building {} → {}", dirs.data.display(), dirs.output.display());
            let (site, report) = generate::build(&dirs.options())?;
            output::print_site_summary(&site);
            output::print_generate_output(&report);
            if let Some(path) = log_file {
                output::write_build_log(&path, &report.rows)?;
                println!("Build log: {}", path.display());
            }
            println!("==> Build complete: {}", dirs.output.display());
        }
        Command::Check { dirs } => {
            println!("==> Checking {}", dirs.data.display());
            let site = generate::check(&dirs.options())?;
            output::print_site_summary(&site);
            println!("==> Content is valid ({} warnings)", site.warnings.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr: warnings by default, debug detail with `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

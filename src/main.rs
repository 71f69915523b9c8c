use clap::{Parser, Subcommand};
use participa_site::config::{self, SourceOverrides};
use participa_site::fetch::HttpFetcher;
use participa_site::{BUILD_ID, generate, output};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "participa-site")]
#[command(about = "Static site generator for civic-participation campaigns")]
#[command(long_about = "\
Static site generator for civic-participation campaigns

Fetches the campaign catalog, renders an index page plus one page per active
campaign, and removes directories of campaigns that are no longer active.

Site root layout:

  <root>/
  ├── participa.toml                 # Optional config (see gen-config)
  ├── templates/
  │   ├── campaign.html              # Campaign page template
  │   └── partials/
  │       └── barrio-options.html    # Neighbourhood <option> list
  ├── css/style.css                  # Versioned as ?v=<content hash>
  ├── js/campaign.js
  ├── index.html                     # Generated
  └── <slug>/index.html              # Generated, one per active campaign

Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.")]
#[command(version = BUILD_ID)]
struct Cli {
    /// Site root: templates and assets are read from it, pages written into it
    #[arg(long, env = "PARTICIPA_SITE_ROOT", default_value = ".", global = true)]
    root: PathBuf,

    /// Campaign catalog URL
    #[arg(long, env = "CAMPAIGNS_JSON_URL", global = true)]
    catalog_url: Option<String>,

    /// Base URL for per-campaign stats (<base><slug>.json)
    #[arg(long, env = "STATS_BASE_URL", global = true)]
    stats_base_url: Option<String>,

    /// Participation webhook handed to the browser form
    #[arg(long, env = "PARTICIPATION_WEBHOOK_URL", global = true)]
    webhook_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the catalog and regenerate the site (default)
    Build,
    /// Print a stock participa.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            let mut shown = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                let text = cause.to_string();
                if !shown.contains(&text) {
                    eprintln!("  caused by: {text}");
                }
                shown = text;
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let overrides = SourceOverrides {
                catalog_url: cli.catalog_url,
                stats_base_url: cli.stats_base_url,
                webhook_url: cli.webhook_url,
            };
            let site_config = config::load_config(&cli.root, &overrides)?;
            let fetcher = HttpFetcher::new()?;

            println!("==> Generating {}", cli.root.display());
            let report = generate::generate(&site_config, &cli.root, &fetcher)?;
            output::print_generate_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Log to stderr so stdout carries only the run summary.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

//! Command-line interface for the scraper.
//!
//! `list` and `check` print to stdout. `scrape` writes NDJSON to stdout
//! or a file, so its status lines go to stderr.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::aggregate::Built;
use crate::config::Family;
use crate::error::Result;
use crate::families::create_component_registry;
use crate::http::HttpFetcher;
use crate::jurisdictions;
use crate::views::Site;

/// legistar-scraper - Harvest municipal legislation from Legistar portals.
#[derive(Parser)]
#[command(name = "legistar-scraper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered jurisdictions.
    List,

    /// Look up a jurisdiction and validate its configuration offline.
    Check {
        /// Host, division id, or nickname.
        jurisdiction: String,
    },

    /// Scrape one document family as NDJSON.
    Scrape {
        /// Host, division id, or nickname.
        jurisdiction: String,

        /// Document family to walk.
        #[arg(value_enum)]
        family: FamilyArg,

        /// Stop after this many documents.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Follow detail links and emit detail documents.
        #[arg(short, long)]
        details: bool,

        /// Write NDJSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FamilyArg {
    Bills,
    People,
    Orgs,
    Events,
}

impl From<FamilyArg> for Family {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Bills => Family::Bills,
            FamilyArg::People => Family::People,
            FamilyArg::Orgs => Family::Orgs,
            FamilyArg::Events => Family::Events,
        }
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list_command(),
        Commands::Check { jurisdiction } => check_command(&jurisdiction),
        Commands::Scrape {
            jurisdiction,
            family,
            limit,
            details,
            output,
        } => scrape_command(
            &jurisdiction,
            family.into(),
            limit,
            details,
            output.as_deref(),
        ),
    }
}

fn list_command() -> Result<()> {
    let registry = jurisdictions::default_registry()?;

    for config in registry.configs() {
        println!(
            "{}  {}",
            style(&config.name).cyan().bold(),
            style(config.host()?).dim()
        );
        if let Some(division) = &config.division_id {
            println!("    {division}");
        }
        if !config.nicknames.is_empty() {
            println!("    aka: {}", config.nicknames.join(", "));
        }
    }
    Ok(())
}

fn check_command(key: &str) -> Result<()> {
    let registry = jurisdictions::default_registry()?;
    let config = registry.lookup(key)?;

    // Binding a site runs the full load-time validation: config
    // selectors and every component key each scope references.
    let components = Rc::new(create_component_registry());
    let fetcher = Rc::new(HttpFetcher::new()?);
    Site::new(Rc::clone(&config), components, fetcher)?;

    println!(
        "{} {} ({})",
        style("OK").green().bold(),
        style(&config.name).cyan(),
        config.host()?
    );
    for family in Family::ALL {
        println!("  {:<7} {}", family.as_str(), config.tab_url(family)?);
    }
    Ok(())
}

fn scrape_command(
    key: &str,
    family: Family,
    limit: Option<usize>,
    details: bool,
    output: Option<&Path>,
) -> Result<()> {
    let registry = jurisdictions::default_registry()?;
    let config = registry.lookup(key)?;
    let components = Rc::new(create_component_registry());
    let fetcher = Rc::new(HttpFetcher::new()?);
    let site = Site::new(Rc::clone(&config), components, fetcher)?;
    let view = site.search(family)?;

    eprintln!(
        "{} {} {} from {}",
        style("Scraping").bold(),
        style(&config.name).cyan(),
        style(family.as_str()).green(),
        view.url()
    );

    let mut sink: Box<dyn Write> = match output {
        Some(path) => Box::new(io::BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let spinner = output.map(|_| scrape_spinner());

    let mut written = 0usize;
    let mut documents = view.documents()?;
    loop {
        if let Some(n) = limit {
            if written >= n {
                break;
            }
        }
        let Some(row) = documents.next() else {
            break;
        };
        let row = row?;

        let document = if details {
            match row.follow()? {
                Some(Built::Document(detail)) => Some(detail),
                // The detail page vetoed the document.
                Some(Built::Skipped) => None,
                // No detail link; the row is all there is.
                None => Some(row.document),
            }
        } else {
            Some(row.document)
        };
        let Some(document) = document else {
            continue;
        };

        writeln!(sink, "{}", document.to_json()?)?;
        written += 1;
        if let Some(pb) = &spinner {
            pb.set_message(format!("{written} documents"));
        }
    }
    sink.flush()?;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    match output {
        Some(path) => eprintln!(
            "{} {} documents to {}",
            style("Wrote").green().bold(),
            written,
            path.display()
        ),
        None => eprintln!("{} {} documents", style("Wrote").green().bold(), written),
    }
    Ok(())
}

fn scrape_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use artpipe::analyse::process_artwork;
use artpipe::config::{self, PipelineConfig};
use artpipe::finalise::{FinaliseMetadata, finalise_artwork};
use artpipe::intake::{delete_artwork, intake};
use artpipe::mockups::generate_mockups;
use artpipe::repair::{repair_orphan, scan_orphans};
use artpipe::sku::SkuTracker;
use artpipe::validate::validate;

#[derive(Parser)]
#[command(name = "artpipe")]
#[command(about = "Artwork intake and publishing pipeline")]
#[command(long_about = "\
Artwork intake and publishing pipeline

Artworks move through three folder-based lifecycle stages under the project
root, tracked by sequential SKUs and a slug -> artifact-path registry:

  <root>/
  ├── config.toml                  # Project marker + configuration
  ├── registry.json                # Slug -> artifact paths (atomic writes)
  ├── sku-tracker.json             # Last issued SKU number
  ├── templates/                   # Mockup backgrounds (first 9 *.jpg used)
  ├── unanalysed/<slug>/           # Upload + THUMB/ANALYSE + QC metadata
  ├── processed/<slug>/            # Main artwork, analysis, 9 mockups, THUMBS/
  └── finalised/<slug>/            # Final artwork + byte-capped preview

Typical flow:

  artpipe intake painting.jpg      # -> unanalysed/painting/, SKU assigned
  artpipe analyse painting         # -> processed/painting/ + mockups
  artpipe finalise painting --title \"Painting\" --primary-colour blue
  artpipe validate                 # audit the whole tree, exit 1 on problems

Run 'artpipe gen-config' to print a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root (holds config.toml and the stage directories)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take image files into the unanalysed stage
    Intake {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move an unanalysed artwork to processed and run analysis
    Analyse {
        slug: String,
        /// Skip the automatic mockup generation after analysis
        #[arg(long)]
        no_mockups: bool,
    },
    /// Generate mockup composites for a processed artwork
    Mockups { slug: String },
    /// Finalise a processed artwork with listing metadata
    Finalise {
        slug: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        primary_colour: String,
        #[arg(long, default_value = "")]
        secondary_colour: String,
    },
    /// Remove an artwork from every stage and purge its registry entry
    Delete { slug: String },
    /// List uploads without SKUs; --fix renames them and builds derivatives
    Repair {
        #[arg(long)]
        fix: bool,
    },
    /// Check the tree for missing artifacts; exits 1 when problems exist
    Validate,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artpipe=info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = &cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = PipelineConfig::load(&cli.root)?;

    match cli.command {
        Command::Intake { files } => {
            for file in files {
                let report = intake(&file, &config)?;
                println!(
                    "{} -> {} ({})",
                    file.display(),
                    report.dir.display(),
                    report.sku
                );
            }
        }
        Command::Analyse { slug, no_mockups } => {
            let report = process_artwork(&slug, None, &config)?;
            println!("{} analysed ({})", report.slug, report.sku);
            if !no_mockups {
                let produced = generate_mockups(&report.slug, &config)?;
                println!("{} mockups present", produced.len());
            }
        }
        Command::Mockups { slug } => {
            let produced = generate_mockups(&slug, &config)?;
            println!("{} mockups present", produced.len());
        }
        Command::Finalise {
            slug,
            title,
            description,
            primary_colour,
            secondary_colour,
        } => {
            let metadata = FinaliseMetadata {
                title,
                description,
                primary_colour,
                secondary_colour,
            };
            finalise_artwork(&slug, &metadata, &config)?;
            println!("{slug} finalised");
        }
        Command::Delete { slug } => {
            delete_artwork(&slug, &config)?;
            println!("{slug} deleted");
        }
        Command::Repair { fix } => {
            let orphans = scan_orphans(&config)?;
            if orphans.is_empty() {
                println!("No orphans found");
            } else if fix {
                let tracker = SkuTracker::new(&config);
                for orphan in &orphans {
                    let sku = tracker.next()?;
                    let repaired = repair_orphan(orphan, &sku, &config)?;
                    println!("{} -> {}", orphan.display(), repaired.display());
                }
            } else {
                for orphan in &orphans {
                    println!("orphan: {}", orphan.display());
                }
                println!("{} orphans found (re-run with --fix to repair)", orphans.len());
            }
        }
        Command::Validate => {
            let errors = validate(&config);
            if errors.is_empty() {
                println!("All artwork assets validated");
            } else {
                for error in &errors {
                    println!("{error}");
                }
                println!("{} problems found", errors.len());
                std::process::exit(1);
            }
        }
        Command::GenConfig => unreachable!("handled before config load"),
    }

    Ok(())
}

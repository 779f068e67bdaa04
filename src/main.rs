mod catalog;
mod config;
mod db;
mod error;
mod export;
mod fetch;
mod health;
mod parser;
mod resolve;
mod workshop;

use std::time::Instant;

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::fetch::HttpFetcher;
use crate::parser::HtmlExtractor;

#[derive(Parser)]
#[command(name = "rust_skins", about = "Rust workshop skin crawler and catalog builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Import reference items from the item list page plus the built-in items
    ImportItems,
    /// Crawl workshop categories and store resolvable skins
    ImportSkins {
        /// First index page per category
        #[arg(long, default_value = "1")]
        start_page: u32,
        /// Last index page per category (inclusive)
        #[arg(long, default_value = "1")]
        max_page: u32,
    },
    /// Check stored skin pages for Steam error pages and wrong apps
    Check {
        /// Lowest skin row id to check
        #[arg(long)]
        min: i64,
        /// Highest skin row id to check
        #[arg(long)]
        max: i64,
    },
    /// Write the skin catalog JSON grouped by item shortname
    Export,
    /// Show item and skin counts
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let started_at = Local::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;

    let result = match cli.command {
        Commands::Init => {
            println!("Schema ready at {:?}", settings.db_path);
            Ok(())
        }
        Commands::ImportItems => {
            let fetcher = HttpFetcher::new(&settings)?;
            let summary = catalog::run(
                &conn,
                &fetcher,
                &HtmlExtractor::steam(),
                &settings.item_list_url,
            )?;
            summary.print();
            Ok(())
        }
        Commands::ImportSkins { start_page, max_page } => {
            let fetcher = HttpFetcher::new(&settings)?;
            let opts = workshop::ImportOptions {
                browse_url: &settings.workshop_url,
                categories: workshop::CATEGORIES,
                start_page,
                max_page,
            };
            println!(
                "Importing {} categories, pages {}..={}",
                opts.categories.len(),
                start_page,
                max_page
            );
            let summary = workshop::run(&conn, &fetcher, &HtmlExtractor::steam(), &opts)?;
            summary.print();
            Ok(())
        }
        Commands::Check { min, max } => {
            let fetcher = HttpFetcher::new(&settings)?;
            let summary = health::run(&conn, &fetcher, &HtmlExtractor::steam(), min, max)?;
            summary.print();
            health::write_report(&settings.report_path, &summary.errors)?;
            println!("Report written to {:?}", settings.report_path);
            Ok(())
        }
        Commands::Export => {
            let catalog = export::build(&conn)?;
            export::write(&settings.export_path, &catalog)?;
            println!(
                "Wrote {} skin groups to {:?}",
                catalog.skins.len(),
                settings.export_path
            );
            Ok(())
        }
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Items:            {}", s.items);
            println!("Skins:            {}", s.skins);
            println!("Items with skins: {}", s.items_with_skins);
            Ok(())
        }
    };

    println!("\nStart time:  {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Ending time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Done in {}", format_duration(t0.elapsed()));

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

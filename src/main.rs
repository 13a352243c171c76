use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use log::{error, info};
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::process;
use userfinder::{catalog, utils, Args, Site, UserFinderEngine};

const BANNER: &str = r#"
  _   _               _____ _           _
 | | | |___  ___ _ __|  ___(_)_ __   __| | ___ _ __
 | | | / __|/ _ \ '__| |_  | | '_ \ / _` |/ _ \ '__|
 | |_| \__ \  __/ |  |  _| | | | | | (_| |  __/ |
  \___/|___/\___|_|  |_|   |_|_| |_|\__,_|\___|_|

       Username enumeration across web platforms
"#;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else if args.silent || args.json {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if args.no_color {
        colored::control::set_override(false);
    }

    if !args.silent && !args.json {
        println!("{}", BANNER.cyan());
    }

    if args.list_sites {
        return list_sites(&args);
    }

    let usernames = get_usernames_from_args(&args);
    if usernames.is_empty() {
        error!("No input provided. Pass a username, -l <file>, or pipe usernames to stdin");
        process::exit(1);
    }

    let engine = UserFinderEngine::new(&args).await?;
    let stats = engine
        .run(usernames)
        .await
        .map_err(|e| anyhow::anyhow!("Scan failed: {}", e))?;

    info!(
        "Finished: {} hits, {} misses, {} errors across {} checks in {:.2}s",
        stats.found,
        stats.not_found,
        stats.errors,
        stats.total_sites,
        stats.duration.as_secs_f64()
    );

    Ok(())
}

fn list_sites(args: &Args) -> Result<()> {
    let config = UserFinderEngine::config_from_args(args)?;
    let sites = catalog::resolve_sites(&config)?;

    let mut by_category: BTreeMap<String, Vec<&Site>> = BTreeMap::new();
    for site in &sites {
        let category = site.category.clone().unwrap_or_else(|| "uncategorized".to_string());
        by_category.entry(category).or_default().push(site);
    }

    println!("Available sites ({})\n", sites.len());
    for (category, entries) in by_category {
        println!("{} ({})", category.bold(), entries.len());
        for site in entries {
            println!("  {:<20} {}", site.name.cyan(), site.url_template.dimmed());
        }
        println!();
    }
    Ok(())
}

fn get_usernames_from_args(args: &Args) -> Vec<String> {
    let mut usernames = utils::parse_username_lines(&args.usernames);

    if let Some(file_path) = &args.usernames_file {
        match utils::read_lines(file_path) {
            Ok(lines) => usernames.extend(utils::parse_username_lines(lines)),
            Err(e) => {
                error!("Failed to read usernames from file {:?}: {}", file_path, e);
            }
        }
    }

    if args.use_stdin() {
        let stdin = io::stdin();
        let lines: Vec<String> = stdin.lock().lines().map_while(|line| line.ok()).collect();
        usernames.extend(utils::parse_username_lines(lines));
    }

    usernames
}

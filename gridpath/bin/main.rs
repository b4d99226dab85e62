use std::{path::PathBuf, time::Instant};

use anyhow::bail;
use clap::Parser;
use gridpath::{
    util::load_field, Heuristic, PathFinder, PathFinderState, PathOverlay, Point, SearchConfig,
};
use log::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "gridpath")]
#[command(about = "Find the shortest 8-directional path across a terrain map", long_about = None)]
struct Args {
    /// Marker map (text) or image to search
    map: PathBuf,

    /// Start cell as `row,col`
    #[arg(short, long)]
    start: Point,

    /// Goal cell as `row,col`
    #[arg(short, long)]
    goal: Point,

    /// TOML search configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Expand the cheapest cell first and keep the original relaxation rule
    #[arg(long)]
    legacy: bool,

    /// manhattan, manhattan-unscaled or octile
    #[arg(long)]
    heuristic: Option<Heuristic>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            SearchConfig::load(path)?
        }
        None => SearchConfig::default(),
    };
    if args.legacy {
        config = SearchConfig {
            costs: config.costs,
            ..SearchConfig::legacy()
        };
    }
    if let Some(heuristic) = args.heuristic {
        config.heuristic = heuristic;
    }

    let field = load_field(&args.map)?;
    if field.terrain(args.goal)?.is_wall() {
        warn!("goal {} is a wall and cannot be reached", args.goal);
    }

    let started = Instant::now();
    let (state, visited) =
        PathFinder::new(&field, args.start, args.goal, config)?.finish(&field)?;
    let elapsed = started.elapsed();
    debug!("accumulated costs:\n{}", visited);

    let path: &[Point] = match &state {
        PathFinderState::PathFound(result) => result.path.as_slice(),
        PathFinderState::NoPathFound => &[],
        PathFinderState::Computing => bail!("search stopped before it finished"),
    };

    if args.json {
        let output = match &state {
            PathFinderState::PathFound(result) => {
                serde_json::json!({ "found": true, "result": result })
            }
            _ => serde_json::json!({ "found": false }),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("File: {}", args.map.display());
    if path.is_empty() {
        println!("The path is not found!");
    } else {
        println!(
            "The path is found! The length of the path is: {}",
            path.len()
        );
        println!("Time: {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    }
    print!(
        "{}",
        PathOverlay {
            field: &field,
            path
        }
    );

    Ok(())
}

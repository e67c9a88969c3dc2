//! Binary entrypoint for the mazemap CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `enter [--collect] [--exit] [--option <dir[:ce]>...]` - record maze entry
//! - `move <dir> [--collect] [--exit] [--option <dir[:ce]>...]` - record a move result
//! - `map` - print the ASCII map and legend
//! - `status` - print a one-line exploration summary
//! - `forget` - clear the saved map
//!
//! Each invocation loads the player's snapshot, applies one command and saves it again,
//! so the tool can be driven from scripts one step at a time. See the library crate docs
//! for details: `mazemap::`.
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use mazemap::config::Config;
use mazemap::map::{legend, MapTracker, MoveOption, MoveOutcome, Observation};

#[derive(Parser)]
#[command(name = "mazemap")]
#[command(about = "Track and draw the explored part of a partially observed maze")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Player whose map to use (overrides [player] name)
    #[arg(short, long, global = true)]
    player: Option<String>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Server response fields for the tile the player ends up on.
#[derive(Args, Debug)]
struct ObservationArgs {
    /// Score can be collected on this tile
    #[arg(long)]
    collect: bool,

    /// The maze can be exited from this tile
    #[arg(long)]
    exit: bool,

    /// Walkable direction, optionally flagged c (leads to collection) and/or e (leads to exit),
    /// e.g. `--option up --option right:ce`
    #[arg(short, long = "option", value_name = "DIR[:ce]")]
    options: Vec<MoveOption>,
}

impl From<ObservationArgs> for Observation {
    fn from(args: ObservationArgs) -> Self {
        Observation::new(args.collect, args.exit, args.options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Record entering a maze (keeps any existing progress)
    Enter {
        #[command(flatten)]
        observation: ObservationArgs,
    },
    /// Record the result of moving in a direction (u|up|↑, r|right|→, d|down|↓, l|left|←)
    Move {
        direction: String,
        #[command(flatten)]
        observation: ObservationArgs,
    },
    /// Print the explored map
    Map,
    /// Print a one-line summary of the explored map
    Status,
    /// Forget the saved map
    Forget,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let player = cli.player.as_deref();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Writing default configuration to {}", cli.config);
            Config::create_default(&cli.config).await?;
            println!("Created {}", cli.config);
        }
        Commands::Enter { observation } => {
            let mut tracker = open_tracker(&cli.config, player, cli.verbose).await?;
            tracker.enter(&observation.into());
            print!("{}", tracker.render_ascii());
        }
        Commands::Move {
            direction,
            observation,
        } => {
            let mut tracker = open_tracker(&cli.config, player, cli.verbose).await?;
            match tracker.record_move(&direction, &observation.into())? {
                MoveOutcome::Moved { to } => info!("Now at {}", to),
                MoveOutcome::Refreshed { at } => {
                    println!("Move {} was not expected from {}; map refreshed.", direction, at)
                }
            }
            print!("{}", tracker.render_ascii());
        }
        Commands::Map => {
            let mut tracker = open_tracker(&cli.config, player, cli.verbose).await?;
            print!("{}", tracker.render_ascii());
            print!("{}", legend());
        }
        Commands::Status => {
            let mut tracker = open_tracker(&cli.config, player, cli.verbose).await?;
            println!("{}", tracker.summary());
        }
        Commands::Forget => {
            let mut tracker = open_tracker(&cli.config, player, cli.verbose).await?;
            tracker.reset();
            println!("Map forgotten.");
        }
    }

    Ok(())
}

/// Load config (falling back to defaults when the file is absent), start logging and
/// open the player's map.
async fn open_tracker(
    config_path: &str,
    player: Option<&str>,
    verbosity: u8,
) -> Result<MapTracker> {
    let config = match Config::load(config_path).await {
        Ok(config) => {
            init_logging(&Some(config.clone()), verbosity);
            config
        }
        Err(e) => {
            init_logging(&None, verbosity);
            if std::path::Path::new(config_path).exists() {
                return Err(e);
            }
            warn!("{}; using defaults", e);
            Config::default()
        }
    };

    let store = config.map_store(player)?;
    info!("Using map snapshot {}", store.path().display());
    Ok(MapTracker::new(store))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when a human is watching
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}

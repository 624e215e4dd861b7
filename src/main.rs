use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use expandix_sync::cache::{LocalCache, MemoryStorage, SnapshotStorage, SqliteStorage};
use expandix_sync::config::Config;
use expandix_sync::remote::RestRemote;
use expandix_sync::sync::SyncCoordinator;

#[derive(Parser, Debug)]
#[command(name = "expandix-sync")]
#[command(about = "Headless sync client for Expandix boards")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/expandix/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch the latest snapshot (remote first, cache fallback) and print it
  Pull {
    /// Dump the full snapshot as JSON instead of a summary
    #[arg(long)]
    json: bool,
  },
  /// Print the effective user profile
  Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let config = Config::load(args.config.as_deref())?;

  let storage: Box<dyn SnapshotStorage> = if config.cache.disabled {
    Box::new(MemoryStorage::default())
  } else {
    match &config.cache.path {
      Some(path) => Box::new(SqliteStorage::open_at(path)?),
      None => Box::new(SqliteStorage::open()?),
    }
  };

  let remote = RestRemote::new(&config)?;
  let mut coordinator = SyncCoordinator::new(remote, LocalCache::new(storage));

  match args.command.unwrap_or(Command::Pull { json: false }) {
    Command::Pull { json } => {
      let snapshot = coordinator.load_all().await;
      if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.boards)?);
      } else {
        println!("state: {:?}", coordinator.state());
        for board in &snapshot.boards {
          let tasks: usize = board.groups.iter().map(|g| g.tasks.len()).sum();
          let value: f64 = board
            .groups
            .iter()
            .flat_map(|g| g.tasks.iter())
            .map(|t| t.value)
            .sum();
          println!(
            "{}  groups: {}  tasks: {}  value: {:.2}",
            board.name,
            board.groups.len(),
            tasks,
            value
          );
        }
      }
    }
    Command::Profile => {
      let snapshot = coordinator.load_all().await;
      let profile = snapshot.profile;
      println!("{} <{}> ({:?})", profile.name, profile.email, profile.role);
    }
  }

  Ok(())
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("expandix")
    .join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(log_dir, "expandix-sync.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

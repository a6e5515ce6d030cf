//! beatgrid - log beats from a running tempo

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use beatgrid_cli::{config::Config, listeners, BeatsSetting, Driver, Overrides};

#[derive(Parser)]
#[command(name = "beatgrid")]
#[command(author, version, about = "Rhythm-driven callback scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path (default: ~/.config/beatgrid/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tempo and log listener activity (default)
    Run(RunArgs),
    /// Create a default configuration file
    Init,
    /// Show the configuration file path
    ConfigPath,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Beats per minute
    #[arg(short, long)]
    bpm: Option<f64>,

    /// Milliseconds per beat
    #[arg(long, conflicts_with = "bpm")]
    ms_per_beat: Option<f64>,

    /// Start listener period in beats, e.g. `1` or `2,4` (repeatable)
    #[arg(short, long)]
    every: Vec<BeatsSetting>,

    /// Progress listener period in beats (repeatable)
    #[arg(short, long)]
    progress: Vec<BeatsSetting>,

    /// Clock offset for every listener in milliseconds
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Frame interval in milliseconds
    #[arg(long)]
    frame_ms: Option<f64>,

    /// Advance a virtual clock instead of sleeping
    #[arg(long)]
    simulate: bool,
}

impl From<RunArgs> for Overrides {
    fn from(args: RunArgs) -> Self {
        Overrides {
            bpm: args.bpm,
            ms_per_beat: args.ms_per_beat,
            every: args.every,
            progress: args.progress,
            offset_ms: args.offset,
            duration_secs: args.duration,
            frame_ms: args.frame_ms,
            simulate: args.simulate,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let args = match cli.command {
        Some(Commands::Init) => {
            let path = match &cli.config {
                Some(path) => {
                    Config::write_default_config(path)?;
                    path.clone()
                }
                None => Config::create_default_config_file()?,
            };
            println!("Created default config at: {}", path.display());
            return Ok(());
        }
        Some(Commands::ConfigPath) => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };
            println!("{}", path.display());
            return Ok(());
        }
        Some(Commands::Run(args)) => args,
        None => RunArgs::default(),
    };

    // Load config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };

    // Apply CLI overrides
    config.apply_overrides(args.into());
    config.validate().context("Invalid configuration")?;

    run(config)
}

fn run(config: Config) -> Result<()> {
    let mut tempo = config.tempo.build().context("Failed to build tempo")?;
    let names = listeners::register_all(&mut tempo, &config.listeners)
        .context("Failed to register listeners")?;

    log::info!(
        "Tempo {} bpm ({:.1}ms per beat), listeners: {}",
        tempo.bpm(),
        tempo.ms_per_beat(),
        names.join(", ")
    );

    let mut driver = Driver::new(&config.driver).context("Invalid driver settings")?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, driver.stop_flag())
        .context("Failed to install Ctrl+C handler")?;
    driver.add(tempo);

    let stats = driver.run();
    log::info!(
        "Stopped after {} frames ({:.0}ms)",
        stats.frames,
        stats.elapsed_ms
    );
    Ok(())
}

//! beatgrid-cli - Command-line driver for beatgrid
//!
//! Runs a [`beatgrid_core::Tempo`] from a frame loop and logs what its
//! listeners see. Features include:
//!
//! - Start listeners that log each beat crossing
//! - Progress listeners that log position within each period
//! - Cycling rhythms such as `2,4` (two beats, then four)
//! - Realtime or simulated clocks
//! - Configurable via TOML file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use beatgrid_cli::{listeners, Config, Driver};
//!
//! let config = Config::load_or_default();
//! config.validate().unwrap();
//!
//! let mut tempo = config.tempo.build().unwrap();
//! listeners::register_all(&mut tempo, &config.listeners).unwrap();
//!
//! let mut driver = Driver::new(&config.driver).unwrap();
//! driver.add(tempo);
//! let stats = driver.run();
//! println!("{} frames", stats.frames);
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod listeners;

// Re-export main types
pub use config::{BeatsSetting, Config, ListenerSettings, ListenerType, Overrides};
pub use driver::{ClockMode, Driver, RunStats};
pub use error::{Error, Result};

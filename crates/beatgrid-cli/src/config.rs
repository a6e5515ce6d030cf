//! Configuration file support for beatgrid
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/beatgrid/config.toml`
//! - macOS: `~/Library/Application Support/beatgrid/config.toml`
//! - Windows: `%APPDATA%\beatgrid\config.toml`

use crate::error::{Error, Result};
use beatgrid_core::{IntoRhythm, Rhythm, Tempo};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default tempo in beats per minute
pub const DEFAULT_BPM: f64 = 120.0;

/// Default frame interval (roughly 60 frames per second)
pub const DEFAULT_FRAME_MS: f64 = 16.0;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Beat rate
    pub tempo: TempoSettings,
    /// Frame loop settings
    pub driver: DriverSettings,
    /// Listeners registered on startup
    pub listeners: Vec<ListenerSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo: TempoSettings::default(),
            driver: DriverSettings::default(),
            listeners: vec![
                ListenerSettings {
                    name: Some("beat".to_string()),
                    ..ListenerSettings::start(BeatsSetting::Single(1.0))
                },
                ListenerSettings {
                    name: Some("bar".to_string()),
                    ..ListenerSettings::progress(BeatsSetting::Single(4.0))
                },
            ],
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::NotFound(path))
        }
    }

    /// Load configuration from an explicit path
    ///
    /// The result is not validated; call [`Config::validate`] once
    /// command-line overrides have been applied.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_or_default_from(&path),
            Err(e) => {
                log::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Load `path`, falling back to the default when it does not exist
    ///
    /// A file that exists but cannot be read or parsed is reported at `warn`
    /// before falling back.
    pub fn load_or_default_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "beatgrid") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Reject settings the driver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.driver.simulate && self.driver.duration_secs.is_none() {
            return Err(Error::Config(
                "simulated runs need a duration (driver.duration_secs)".to_string(),
            ));
        }
        self.driver.frame()?;
        self.driver.duration()?;
        for listener in &self.listeners {
            listener.beats.clone().into_rhythm()?;
        }
        self.tempo.build()?;
        Ok(())
    }

    /// Apply command-line overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(bpm) = overrides.bpm {
            self.tempo.bpm = bpm;
            self.tempo.ms_per_beat = None;
        }
        if let Some(ms) = overrides.ms_per_beat {
            self.tempo.ms_per_beat = Some(ms);
        }

        if !overrides.every.is_empty() || !overrides.progress.is_empty() {
            let offset_ms = overrides.offset_ms.unwrap_or(0.0);
            let starts = overrides.every.into_iter().map(ListenerSettings::start);
            let progresses = overrides.progress.into_iter().map(ListenerSettings::progress);
            self.listeners = starts
                .chain(progresses)
                .map(|l| ListenerSettings { offset_ms, ..l })
                .collect();
        } else if let Some(offset_ms) = overrides.offset_ms {
            for listener in &mut self.listeners {
                listener.offset_ms = offset_ms;
            }
        }

        if let Some(secs) = overrides.duration_secs {
            self.driver.duration_secs = Some(secs);
        }
        if let Some(frame_ms) = overrides.frame_ms {
            self.driver.frame_ms = frame_ms;
        }
        if overrides.simulate {
            self.driver.simulate = true;
        }
    }
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bpm: Option<f64>,
    pub ms_per_beat: Option<f64>,
    /// Start-style listeners; replace the configured list when non-empty
    pub every: Vec<BeatsSetting>,
    /// Progress-style listeners; replace the configured list when non-empty
    pub progress: Vec<BeatsSetting>,
    pub offset_ms: Option<f64>,
    pub duration_secs: Option<f64>,
    pub frame_ms: Option<f64>,
    pub simulate: bool,
}

/// Tempo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoSettings {
    /// Beats per minute
    pub bpm: f64,
    /// Milliseconds per beat; takes precedence over `bpm` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_per_beat: Option<f64>,
}

impl Default for TempoSettings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            ms_per_beat: None,
        }
    }
}

impl TempoSettings {
    /// Build a tempo with no listeners
    pub fn build(&self) -> Result<Tempo> {
        let tempo = match self.ms_per_beat {
            Some(ms) => Tempo::from_beat(ms)?,
            None => Tempo::new(self.bpm)?,
        };
        Ok(tempo)
    }
}

/// Frame loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Interval between frames in milliseconds
    pub frame_ms: f64,
    /// Stop after this many seconds (run until Ctrl+C when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Advance a virtual clock instead of following wall-clock time
    pub simulate: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            frame_ms: DEFAULT_FRAME_MS,
            duration_secs: None,
            simulate: false,
        }
    }
}

impl DriverSettings {
    /// Frame interval; must be positive and fit in a [`Duration`]
    pub fn frame(&self) -> Result<Duration> {
        if !(self.frame_ms.is_finite() && self.frame_ms > 0.0) {
            return Err(Error::Config(format!(
                "driver.frame_ms must be positive, got {}",
                self.frame_ms
            )));
        }
        Duration::try_from_secs_f64(self.frame_ms / 1000.0).map_err(|e| {
            Error::Config(format!("driver.frame_ms {} out of range: {}", self.frame_ms, e))
        })
    }

    /// Run length, `None` when the run is open-ended
    pub fn duration(&self) -> Result<Option<Duration>> {
        let Some(secs) = self.duration_secs else {
            return Ok(None);
        };
        if !(secs.is_finite() && secs >= 0.0) {
            return Err(Error::Config(format!(
                "driver.duration_secs must be >= 0, got {}",
                secs
            )));
        }
        Duration::try_from_secs_f64(secs).map(Some).map_err(|e| {
            Error::Config(format!("driver.duration_secs {} out of range: {}", secs, e))
        })
    }
}

/// Listener kind in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerType {
    /// Fire once per boundary crossing
    Start,
    /// Fire every frame with progress through the period
    Progress,
}

/// A beat period, or a list of periods to cycle through
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BeatsSetting {
    Single(f64),
    Cycle(Vec<f64>),
}

impl IntoRhythm for BeatsSetting {
    fn into_rhythm(self) -> beatgrid_core::Result<Rhythm> {
        match self {
            BeatsSetting::Single(beats) => Rhythm::new(beats),
            BeatsSetting::Cycle(beats) => Rhythm::sequence(beats),
        }
    }
}

/// Parses `4` as a single period and `2,4,2` as a cycle.
impl FromStr for BeatsSetting {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let beats = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid beat count '{}': {}", part.trim(), e))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        match beats.as_slice() {
            [single] => Ok(BeatsSetting::Single(*single)),
            _ => Ok(BeatsSetting::Cycle(beats)),
        }
    }
}

/// One listener registered at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerSettings {
    /// Start or progress
    pub kind: ListenerType,
    /// Period in beats, or a list to cycle through
    pub beats: BeatsSetting,
    /// Clock shift in milliseconds
    #[serde(default)]
    pub offset_ms: f64,
    /// Registry name (generated when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unsubscribe after this many boundary crossings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl ListenerSettings {
    pub fn start(beats: BeatsSetting) -> Self {
        Self::new(ListenerType::Start, beats)
    }

    pub fn progress(beats: BeatsSetting) -> Self {
        Self::new(ListenerType::Progress, beats)
    }

    fn new(kind: ListenerType, beats: BeatsSetting) -> Self {
        Self {
            kind,
            beats,
            offset_ms: 0.0,
            name: None,
            limit: None,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# beatgrid configuration file

[tempo]
# Beats per minute
bpm = 120.0

# Milliseconds per beat (overrides bpm when set)
# ms_per_beat = 500.0

[driver]
# Interval between frames in milliseconds
frame_ms = 16.0

# Stop after this many seconds (runs until Ctrl+C when unset)
# duration_secs = 8.0

# Advance a virtual clock instead of wall-clock time (needs duration_secs)
simulate = false

# Start listeners fire once each time their period elapses.
[[listeners]]
kind = "start"
beats = 1
name = "beat"

# Progress listeners fire every frame; a list of beats cycles.
[[listeners]]
kind = "progress"
beats = [4, 4, 2, 2]
name = "phrase"
# offset_ms = -50.0
# limit = 8
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tempo.bpm, DEFAULT_BPM);
        assert_eq!(config.driver.frame_ms, DEFAULT_FRAME_MS);
        assert!(!config.driver.simulate);
        assert_eq!(config.listeners.len(), 2);
        assert_eq!(config.listeners[0].kind, ListenerType::Start);
        config.validate().unwrap();
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tempo.bpm, config.tempo.bpm);
        assert_eq!(parsed.listeners.len(), config.listeners.len());
        assert_eq!(parsed.listeners[1].beats, BeatsSetting::Single(4.0));
    }

    #[test]
    fn test_default_config_file_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tempo.bpm, 120.0);
        assert_eq!(config.listeners[0].beats, BeatsSetting::Single(1.0));
        assert_eq!(
            config.listeners[1].beats,
            BeatsSetting::Cycle(vec![4.0, 4.0, 2.0, 2.0])
        );
        assert_eq!(config.listeners[1].kind, ListenerType::Progress);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.tempo.ms_per_beat = Some(400.0);
        config.listeners[0].limit = Some(3);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.tempo.ms_per_beat, Some(400.0));
        assert_eq!(loaded.listeners[0].limit, Some(3));
        assert_eq!(loaded.tempo.build().unwrap().bpm(), 150.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[tempo]\nbpm = 0\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(matches!(config.validate(), Err(Error::Tempo(_))));

        fs::write(&path, "[driver]\nsimulate = true\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        fs::write(&path, "[[listeners]]\nkind = \"start\"\nbeats = []\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(matches!(config.validate(), Err(Error::Tempo(_))));

        fs::write(&path, "[tempo\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn test_duration_override_completes_simulated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[driver]\nsimulate = true\n").unwrap();

        let mut config = Config::load_from(&path).unwrap();
        config.apply_overrides(Overrides {
            duration_secs: Some(5.0),
            ..Overrides::default()
        });
        config.validate().unwrap();
        assert_eq!(config.driver.duration_secs, Some(5.0));
    }

    #[test]
    fn test_load_or_default_keeps_existing_file() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("missing.toml");
        assert_eq!(Config::load_or_default_from(&missing).tempo.bpm, DEFAULT_BPM);

        // Invalid settings are left for validate() to report.
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tempo]\nbpm = 90.0\n\n[driver]\nsimulate = true\n").unwrap();
        let config = Config::load_or_default_from(&path);
        assert_eq!(config.tempo.bpm, 90.0);
        assert!(config.driver.simulate);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        fs::write(&path, "[tempo\n").unwrap();
        assert_eq!(Config::load_or_default_from(&path).tempo.bpm, DEFAULT_BPM);
    }

    #[test]
    fn test_out_of_range_driver_values_rejected() {
        let mut config = Config::default();
        config.driver.frame_ms = 1e25;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
        assert!(config.driver.frame().is_err());

        let mut config = Config::default();
        config.driver.duration_secs = Some(1e20);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.driver.frame_ms = 0.0;
        config.driver.duration_secs = Some(-1.0);
        assert!(config.driver.frame().is_err());
        assert!(config.driver.duration().is_err());

        let config = Config::default();
        assert!((config.driver.frame().unwrap().as_secs_f64() - 0.016).abs() < 1e-9);
        assert_eq!(config.driver.duration().unwrap(), None);
    }

    #[test]
    fn test_beats_from_str() {
        assert_eq!("4".parse::<BeatsSetting>(), Ok(BeatsSetting::Single(4.0)));
        assert_eq!(
            "2, 4,0.5".parse::<BeatsSetting>(),
            Ok(BeatsSetting::Cycle(vec![2.0, 4.0, 0.5]))
        );
        assert!("2,x".parse::<BeatsSetting>().is_err());
    }

    #[test]
    fn test_overrides_replace_listeners() {
        let mut config = Config::default();
        config.apply_overrides(Overrides {
            bpm: Some(90.0),
            every: vec![BeatsSetting::Single(2.0)],
            progress: vec![BeatsSetting::Cycle(vec![1.0, 3.0])],
            offset_ms: Some(-20.0),
            duration_secs: Some(4.0),
            simulate: true,
            ..Overrides::default()
        });

        assert_eq!(config.tempo.bpm, 90.0);
        assert_eq!(config.listeners.len(), 2);
        assert_eq!(config.listeners[0].kind, ListenerType::Start);
        assert_eq!(config.listeners[1].kind, ListenerType::Progress);
        assert!(config.listeners.iter().all(|l| l.offset_ms == -20.0));
        assert_eq!(config.driver.duration_secs, Some(4.0));
        assert!(config.driver.simulate);
        config.validate().unwrap();
    }

    #[test]
    fn test_offset_override_keeps_file_listeners() {
        let mut config = Config::default();
        config.apply_overrides(Overrides {
            offset_ms: Some(100.0),
            ..Overrides::default()
        });
        assert_eq!(config.listeners.len(), 2);
        assert!(config.listeners.iter().all(|l| l.offset_ms == 100.0));
    }
}

//! Frame loop that feeds time to animated items
//!
//! The driver owns the clock. Each frame it computes the elapsed time in
//! milliseconds and hands it to every registered [`Animate`] item. In
//! realtime mode frames follow the wall clock; in simulated mode a virtual
//! clock advances by exactly one frame interval per step with no sleeping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use beatgrid_core::Animate;

use crate::config::DriverSettings;
use crate::error::Result;

/// Where frame timestamps come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    /// Elapsed wall-clock time since the run started
    Realtime,
    /// A virtual clock advanced by one frame per step
    Simulated,
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub elapsed_ms: f64,
}

/// Drives a set of [`Animate`] items from a single clock
pub struct Driver {
    items: Vec<Box<dyn Animate>>,
    mode: ClockMode,
    frame: Duration,
    duration: Option<Duration>,
    stop: Arc<AtomicBool>,
    last_time_ms: f64,
    frames: u64,
}

impl Driver {
    /// Build a driver, rejecting frame or duration values a [`Duration`]
    /// cannot hold
    pub fn new(settings: &DriverSettings) -> Result<Self> {
        Ok(Self {
            items: Vec::new(),
            mode: if settings.simulate {
                ClockMode::Simulated
            } else {
                ClockMode::Realtime
            },
            frame: settings.frame()?,
            duration: settings.duration()?,
            stop: Arc::new(AtomicBool::new(false)),
            last_time_ms: 0.0,
            frames: 0,
        })
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Add an item to be animated every frame
    pub fn add(&mut self, item: impl Animate + 'static) {
        self.items.push(Box::new(item));
    }

    /// Flag that ends the run once set (wired to SIGINT)
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Animate every item at `time_ms`
    ///
    /// Times earlier than the previous frame are held at the previous frame
    /// so items always see a non-decreasing clock.
    pub fn step(&mut self, time_ms: f64) {
        let time_ms = time_ms.max(self.last_time_ms);
        let frame_time = if self.frames == 0 {
            0.0
        } else {
            time_ms - self.last_time_ms
        };
        for item in &mut self.items {
            item.animate(time_ms, frame_time);
        }
        self.last_time_ms = time_ms;
        self.frames += 1;
    }

    /// Run until the configured duration elapses or the stop flag is set
    pub fn run(&mut self) -> RunStats {
        let frame_ms = self.frame.as_secs_f64() * 1000.0;
        let limit_ms = self.duration.map(|d| d.as_secs_f64() * 1000.0);
        let origin = Instant::now();
        let mut time_ms = 0.0;

        log::debug!(
            "Driver starting: {:?} clock, {:.1}ms frames, limit {:?}",
            self.mode,
            frame_ms,
            self.duration
        );

        while !self.stop.load(Ordering::Relaxed) {
            if limit_ms.is_some_and(|limit| time_ms > limit) {
                break;
            }
            self.step(time_ms);

            time_ms = match self.mode {
                ClockMode::Simulated => time_ms + frame_ms,
                ClockMode::Realtime => {
                    std::thread::sleep(self.frame);
                    origin.elapsed().as_secs_f64() * 1000.0
                }
            };
        }

        RunStats {
            frames: self.frames,
            elapsed_ms: self.last_time_ms,
        }
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("items", &self.items.len())
            .field("mode", &self.mode)
            .field("frame", &self.frame)
            .field("duration", &self.duration)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

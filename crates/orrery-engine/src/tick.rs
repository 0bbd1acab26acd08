//! Fixed-timestep driver for a [`World`].
//!
//! The [`TickLoop`] owns the world and paces it: each [`tick`](TickLoop::tick)
//! calls [`World::run`] once (every registered system, in registration order),
//! then advances the tick counter and the simulation clock. The loop never
//! sleeps; callers that want wall-clock pacing (one tick per rendered frame,
//! for example) decide when to call `tick`.
//!
//! # Example
//!
//! ```
//! use orrery_engine::tick::{TickConfig, TickLoop};
//! use orrery_ecs::prelude::*;
//!
//! let config = TickConfig { fixed_dt: 1.0 / 60.0, ..Default::default() };
//! let mut tick_loop = TickLoop::new(World::new(), config).unwrap();
//!
//! tick_loop.world_mut().add_named_system("physics", |_world| {
//!     // physics logic here
//! });
//!
//! for _ in 0..10 {
//!     tick_loop.tick();
//! }
//!
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```

use std::time::{Duration, Instant};

use orrery_ecs::world::World;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Stop advancing once this many ticks have run. `None` means unbounded.
    pub max_ticks: Option<u64>,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick), unbounded.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_ticks: None,
        }
    }
}

impl TickConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the tick loop relies on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(EngineError::InvalidTimestep(self.fixed_dt));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time of the whole `World::run` call.
    pub total_time: Duration,
    /// Alive entities once the tick finished.
    pub entity_count: usize,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The fixed-timestep tick loop.
pub struct TickLoop {
    world: World,
    tick_counter: u64,
    config: TickConfig,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a new tick loop around `world`.
    ///
    /// The tick counter starts at 0 and simulation time at 0.0.
    pub fn new(world: World, config: TickConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            world,
            tick_counter: 0,
            config,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Whether `max_ticks` has been reached.
    pub fn is_finished(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|max| self.tick_counter >= max)
    }

    /// Execute one tick: run every system once, then advance the clock.
    ///
    /// Returns `false` without doing anything once `max_ticks` is reached.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        let tick_start = Instant::now();
        self.world.run();
        self.tick_counter += 1;

        self.last_diagnostics = TickDiagnostics {
            total_time: tick_start.elapsed(),
            entity_count: self.world.entity_count(),
        };
        trace!(
            tick = self.tick_counter,
            elapsed_us = self.last_diagnostics.total_time.as_micros() as u64,
            "tick complete"
        );
        true
    }

    /// Run up to `count` ticks. Returns how many actually ran.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut ran = 0;
        for _ in 0..count {
            if !self.tick() {
                debug!(tick = self.tick_counter, "max_ticks reached");
                break;
            }
            ran += 1;
        }
        ran
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.config.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.config.fixed_dt
    }

    /// The configuration this loop was created with.
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and for collaborators that
    /// need to act between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Give the world back, ending the loop.
    pub fn into_world(self) -> World {
        self.world
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

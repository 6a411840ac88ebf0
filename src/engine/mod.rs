use std::path::PathBuf;

use anyhow::Result;

use crate::{
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    systems::{AgentSystem, AutomationSystem, ClockSystem, FeedbackSystem, ProductionSystem},
    world::{World, WorldSnapshot},
};

/// Wall-clock seconds between ticks at the 20 Hz cadence.
pub const DEFAULT_TICK_SECONDS: f64 = 0.05;

/// Slack for timer comparisons. Twenty 0.05 s steps sum to a hair under 1.0.
pub const TIME_EPSILON: f64 = 1e-9;

/// True once `timer` has reached `threshold`, allowing for float drift.
pub fn elapsed(timer: f64, threshold: f64) -> bool {
    timer + TIME_EPSILON >= threshold
}

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

impl EngineSettings {
    /// No snapshots on disk.
    pub fn in_memory(scenario_name: impl Into<String>, seed: u64) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            seed,
            snapshot_interval_ticks: 0,
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// Clock, production, agents, automation, then floating-text expiry.
    pub fn with_default_systems(self) -> Self {
        self.with_system(ClockSystem::new())
            .with_system(ProductionSystem::new())
            .with_system(AgentSystem::new())
            .with_system(AutomationSystem::new())
            .with_system(FeedbackSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Advances the world by `real_dt` wall-clock seconds.
    pub fn step(&mut self, world: &mut World, real_dt: f64) -> Result<()> {
        let real_dt = if real_dt.is_finite() {
            real_dt.max(0.0)
        } else {
            0.0
        };
        let dt = world.effective_delta(real_dt);
        world.advance_boost(real_dt);

        let ctx = SystemContext {
            tick: world.tick() + 1,
            real_dt,
            dt,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, world, &mut rng_stream)?;
        }
        world.advance_time(real_dt, dt);
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        Ok(())
    }

    /// Steps once and returns the resulting snapshot.
    pub fn advance(&mut self, world: &mut World, real_dt: f64) -> Result<WorldSnapshot> {
        self.step(world, real_dt)?;
        Ok(world.snapshot(&self.settings.scenario_name))
    }

    pub fn run(&mut self, world: &mut World, ticks: u64, real_dt: f64) -> Result<()> {
        for _ in 0..ticks {
            self.step(world, real_dt)?;
        }
        Ok(())
    }

    pub fn run_with_hook<F>(
        &mut self,
        world: &mut World,
        ticks: u64,
        real_dt: f64,
        mut hook: F,
    ) -> Result<()>
    where
        F: FnMut(&WorldSnapshot),
    {
        for _ in 0..ticks {
            let snapshot = self.advance(world, real_dt)?;
            hook(&snapshot);
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    /// 1-based number of the tick being run.
    pub tick: u64,
    /// Wall-clock seconds. Agents move on this.
    pub real_dt: f64,
    /// Simulated seconds after time scale and boost.
    pub dt: f64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

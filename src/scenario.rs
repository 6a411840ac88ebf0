use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    engine::DEFAULT_TICK_SECONDS,
    geometry::TilePos,
    grid::{Grid, TerrainKind},
    ledger::{Ledger, Resource},
    world::{Rules, World},
};

fn default_name() -> String {
    "default_island".to_string()
}

fn default_grid_size() -> usize {
    40
}

fn default_tick_seconds() -> f64 {
    DEFAULT_TICK_SECONDS
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_starting_resources() -> BTreeMap<Resource, f64> {
    BTreeMap::from([(Resource::Wood, 20.0), (Resource::Stone, 5.0)])
}

fn default_island() -> Vec<IslandTile> {
    vec![
        IslandTile::new(0, 0, TerrainKind::Grass),
        IslandTile::new(0, -1, TerrainKind::Grass),
        IslandTile::new(0, 1, TerrainKind::Rock),
        IslandTile::new(-1, 0, TerrainKind::Grass),
        IslandTile::new(1, 0, TerrainKind::Rock),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Wall-clock seconds per tick.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_ticks: u64,
    #[serde(default = "default_starting_resources")]
    pub starting_resources: BTreeMap<Resource, f64>,
    /// Land laid out around the grid centre.
    #[serde(default = "default_island")]
    pub island: Vec<IslandTile>,
    #[serde(default)]
    pub rules: Rules,
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    #[serde(default)]
    pub automation: bool,
}

/// A land tile given as an offset from the grid centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IslandTile {
    pub dx: i32,
    pub dy: i32,
    pub terrain: TerrainKind,
}

impl IslandTile {
    pub fn new(dx: i32, dy: i32, terrain: TerrainKind) -> Self {
        Self { dx, dy, terrain }
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// The five-tile starting island on a 40x40 sea.
    pub fn default_island() -> Self {
        Self {
            name: default_name(),
            description: None,
            seed: 0,
            grid_size: default_grid_size(),
            tick_seconds: default_tick_seconds(),
            ticks: None,
            snapshot_interval_ticks: 0,
            starting_resources: default_starting_resources(),
            island: default_island(),
            rules: Rules::default(),
            time_scale: default_time_scale(),
            automation: false,
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(data)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            bail!("grid_size must be positive");
        }
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            bail!("tick_seconds must be a positive number, got {}", self.tick_seconds);
        }
        if !(self.rules.day_duration.is_finite() && self.rules.day_duration > 0.0) {
            bail!("rules.day_duration must be positive, got {}", self.rules.day_duration);
        }
        if self.rules.base_capacity < 0.0 || self.rules.storage_bonus < 0.0 {
            bail!("capacities must not be negative");
        }
        for tile in &self.island {
            let pos = self.island_pos(tile);
            if !crate::geometry::in_bounds(pos, self.grid_size, self.grid_size) {
                bail!(
                    "island tile ({}, {}) falls outside a {}x{} grid",
                    tile.dx,
                    tile.dy,
                    self.grid_size,
                    self.grid_size
                );
            }
            if !tile.terrain.is_land() {
                bail!("island tile ({}, {}) must be grass or rock", tile.dx, tile.dy);
            }
        }
        Ok(())
    }

    fn island_pos(&self, tile: &IslandTile) -> TilePos {
        let center = (self.grid_size / 2) as i32;
        TilePos::new(center + tile.dx, center + tile.dy)
    }

    pub fn build_world(&self) -> World {
        let mut grid = Grid::ocean(self.grid_size, self.grid_size);
        for tile in &self.island {
            grid.raise_land(
                self.island_pos(tile),
                tile.terrain,
                self.rules.tile_initial_resources,
            );
        }

        let mut ledger = Ledger::new(self.rules.base_capacity);
        for (resource, amount) in &self.starting_resources {
            ledger.set(*resource, *amount);
        }

        let mut world = World::new(grid, ledger, self.rules.clone());
        world.set_time_scale(self.time_scale);
        world.set_automation(self.automation);
        world
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(1_200)
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::geometry::{self, ScreenPoint, TilePos};
use crate::grid::{Grid, Tile};
use crate::ledger::{Ledger, Resource};
use crate::progression::{SkillId, StructureKind};

pub const FLOATING_TEXT_SECONDS: f64 = 1.0;
pub const MIN_TIME_SCALE: f64 = 1.0;
pub const MAX_TIME_SCALE: f64 = 20.0;

fn default_day_duration() -> f64 {
    30.0
}

fn default_tile_resources() -> u32 {
    100
}

fn default_storage_bonus() -> f64 {
    50.0
}

fn default_base_capacity() -> f64 {
    50.0
}

fn default_true() -> bool {
    true
}

/// Tunables that scenarios may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default = "default_day_duration")]
    pub day_duration: f64,
    #[serde(default = "default_tile_resources")]
    pub tile_initial_resources: u32,
    #[serde(default = "default_storage_bonus")]
    pub storage_bonus: f64,
    #[serde(default = "default_base_capacity")]
    pub base_capacity: f64,
    /// Advanced structures need their skill before they can be built.
    #[serde(default = "default_true")]
    pub require_unlocks: bool,
    /// A converter whose output store is full still eats its inputs when the
    /// cycle fires.
    #[serde(default = "default_true")]
    pub consume_input_when_output_full: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            day_duration: default_day_duration(),
            tile_initial_resources: default_tile_resources(),
            storage_bonus: default_storage_bonus(),
            base_capacity: default_base_capacity(),
            require_unlocks: true,
            consume_input_when_output_full: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayClock {
    /// Simulated seconds into the current day.
    pub timer: f64,
    /// `timer / day_duration`.
    pub phase: f64,
    /// Darkness applied by the renderer, 0 to 0.5.
    pub night_overlay: f64,
    pub days_elapsed: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Boost {
    pub active: bool,
    /// Real seconds left in the window.
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boat {
    pub id: u64,
    pub position: ScreenPoint,
    pub target: Option<ScreenPoint>,
    /// Real seconds towards the next catch.
    pub timer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub position: ScreenPoint,
    pub current_tile: TilePos,
    pub target_tile: Option<TilePos>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "resource")]
pub enum YieldOutput {
    Resource(Resource),
    Vehicle,
}

impl YieldOutput {
    pub fn label(self) -> String {
        match self {
            YieldOutput::Resource(Resource::IronIngot) => "ingot +1".to_string(),
            YieldOutput::Resource(resource) => format!("{resource} +1"),
            YieldOutput::Vehicle => "vehicle +1".to_string(),
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            YieldOutput::Resource(Resource::Wood) => "#4ade80",
            YieldOutput::Resource(Resource::Stone) => "#94a3b8",
            YieldOutput::Resource(Resource::Iron) => "#cbd5e1",
            YieldOutput::Resource(Resource::IronIngot) => "#e5e7eb",
            YieldOutput::Resource(Resource::Lithium) => "#facc15",
            YieldOutput::Resource(Resource::Motor) => "#a78bfa",
            YieldOutput::Resource(Resource::Fish) => "#60a5fa",
            YieldOutput::Resource(Resource::Research) => "white",
            YieldOutput::Vehicle => "#f87171",
        }
    }
}

/// A discrete production event, kept until the renderer drains it or its
/// floating text expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldEvent {
    pub id: u64,
    pub tick: u64,
    pub tile: TilePos,
    pub output: YieldOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub id: u64,
    pub text: String,
    pub position: ScreenPoint,
    pub color: String,
    /// Real seconds until it disappears.
    pub ttl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub elapsed_real_seconds: f64,
    pub elapsed_sim_seconds: f64,
    pub days_elapsed: u64,
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Tile>,
    pub resources: BTreeMap<Resource, f64>,
    /// Capped resources only.
    pub capacities: BTreeMap<Resource, f64>,
    pub unlocked_skills: Vec<SkillId>,
    pub miner_level: u32,
    pub day_phase: f64,
    pub night_overlay: f64,
    pub boats: Vec<Boat>,
    pub vehicles: Vec<Vehicle>,
    pub boost_active: bool,
    pub boost_remaining: f64,
    pub time_scale: f64,
    pub automation: bool,
    pub floating_texts: Vec<FloatingText>,
    pub structure_counts: BTreeMap<StructureKind, usize>,
}

/// The whole game state. Systems and commands receive it by `&mut` and are
/// the only code that mutates it.
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) grid: Grid,
    pub(crate) ledger: Ledger,
    pub(crate) unlocked: BTreeSet<SkillId>,
    pub(crate) miner_level: u32,
    pub(crate) clock: DayClock,
    pub(crate) boats: Vec<Boat>,
    pub(crate) vehicles: Vec<Vehicle>,
    pub(crate) boost: Boost,
    pub(crate) floating_texts: Vec<FloatingText>,
    pub(crate) yield_events: Vec<YieldEvent>,
    pub(crate) rules: Rules,
    pub(crate) time_scale: f64,
    pub(crate) automation_enabled: bool,
    pub(crate) automation_timer: f64,
    next_id: u64,
    tick: u64,
    elapsed_real: f64,
    elapsed_sim: f64,
}

impl World {
    pub fn new(grid: Grid, ledger: Ledger, rules: Rules) -> Self {
        Self {
            grid,
            ledger,
            unlocked: BTreeSet::new(),
            miner_level: 0,
            clock: DayClock::default(),
            boats: Vec::new(),
            vehicles: Vec::new(),
            boost: Boost::default(),
            floating_texts: Vec::new(),
            yield_events: Vec::new(),
            rules,
            time_scale: MIN_TIME_SCALE,
            automation_enabled: false,
            automation_timer: 0.0,
            next_id: 1,
            tick: 0,
            elapsed_real: 0.0,
            elapsed_sim: 0.0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn quantity(&self, resource: Resource) -> f64 {
        self.ledger.quantity(resource)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn unlocked_skills(&self) -> &BTreeSet<SkillId> {
        &self.unlocked
    }

    pub fn is_unlocked(&self, skill: SkillId) -> bool {
        self.unlocked.contains(&skill)
    }

    pub fn miner_level(&self) -> u32 {
        self.miner_level
    }

    pub fn clock(&self) -> &DayClock {
        &self.clock
    }

    pub fn boats(&self) -> &[Boat] {
        &self.boats
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn boost(&self) -> &Boost {
        &self.boost
    }

    pub fn floating_texts(&self) -> &[FloatingText] {
        &self.floating_texts
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn automation_enabled(&self) -> bool {
        self.automation_enabled
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed_real(&self) -> f64 {
        self.elapsed_real
    }

    pub fn elapsed_sim(&self) -> f64 {
        self.elapsed_sim
    }

    /// Simulated seconds that `real_dt` wall-clock seconds are worth right now.
    pub fn effective_delta(&self, real_dt: f64) -> f64 {
        let boost = if self.boost.active { 2.0 } else { 1.0 };
        real_dt * self.time_scale * boost
    }

    /// Counts the boost window down in real time.
    pub fn advance_boost(&mut self, real_dt: f64) {
        if !self.boost.active {
            return;
        }
        self.boost.remaining -= real_dt;
        if self.boost.remaining <= 0.0 {
            self.boost.active = false;
            self.boost.remaining = 0.0;
            log::debug!("boost expired at tick {}", self.tick);
        }
    }

    pub fn advance_time(&mut self, real_dt: f64, sim_dt: f64) {
        self.tick += 1;
        self.elapsed_real += real_dt;
        self.elapsed_sim += sim_dt;
    }

    /// Tile under a point on the display plane, if it is on the map.
    pub fn tile_at_screen(&self, point: ScreenPoint) -> Option<&Tile> {
        self.grid.tile(geometry::screen_to_iso(point))
    }

    pub fn has_structure(&self, kind: StructureKind) -> bool {
        self.grid
            .tiles()
            .iter()
            .any(|tile| tile.structure_kind() == Some(kind))
    }

    /// Takes every yield event recorded since the last call.
    pub fn drain_yield_events(&mut self) -> Vec<YieldEvent> {
        std::mem::take(&mut self.yield_events)
    }

    pub(crate) fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Records a yield and the floating text that announces it. `lift` raises
    /// the text by fractions of a tile so simultaneous finds do not overlap.
    pub(crate) fn emit_yield(&mut self, tile: TilePos, output: YieldOutput, lift: f64) {
        let anchor = geometry::iso_to_screen(tile);
        let id = self.allocate_id();
        self.floating_texts.push(FloatingText {
            id,
            text: output.label(),
            position: ScreenPoint::new(anchor.x, anchor.y - lift * geometry::TILE_HEIGHT),
            color: output.color().to_string(),
            ttl: FLOATING_TEXT_SECONDS,
        });
        self.yield_events.push(YieldEvent {
            id,
            tick: self.tick,
            tile,
            output,
        });
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let structure_counts = StructureKind::ALL
            .iter()
            .map(|kind| (*kind, self.grid.count_structures(*kind)))
            .filter(|(_, count)| *count > 0)
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            elapsed_real_seconds: self.elapsed_real,
            elapsed_sim_seconds: self.elapsed_sim,
            days_elapsed: self.clock.days_elapsed,
            width: self.grid.width(),
            height: self.grid.height(),
            tiles: self.grid.tiles().to_vec(),
            resources: self.ledger.quantities().clone(),
            capacities: self.ledger.capacities().clone(),
            unlocked_skills: self.unlocked.iter().copied().collect(),
            miner_level: self.miner_level,
            day_phase: self.clock.phase,
            night_overlay: self.clock.night_overlay,
            boats: self.boats.clone(),
            vehicles: self.vehicles.clone(),
            boost_active: self.boost.active,
            boost_remaining: self.boost.remaining,
            time_scale: self.time_scale,
            automation: self.automation_enabled,
            floating_texts: self.floating_texts.clone(),
            structure_counts,
        }
    }
}

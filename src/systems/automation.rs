use anyhow::Result;

use crate::{
    engine::{self, System, SystemContext},
    geometry::TilePos,
    ledger::Resource,
    progression::{self, SkillId, StructureKind},
    rng::SystemRng,
    world::World,
};

/// Simulated seconds between decisions.
const DECISION_INTERVAL: f64 = 1.0;
/// Fill ratio of wood or stone that triggers a Storage build.
const STORAGE_PRESSURE: f64 = 0.8;

/// What a single automation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationAction {
    Unlocked(SkillId),
    UpgradedMiner(u32),
    Built(StructureKind, TilePos),
}

/// Greedy autoplay. While enabled it makes at most one move per simulated
/// second through the regular command layer.
pub struct AutomationSystem;

impl AutomationSystem {
    pub fn new() -> Self {
        Self
    }

    /// Tries each priority in turn and stops at the first one that succeeds.
    pub fn run_pass(world: &mut World) -> Option<AutomationAction> {
        let research = world.quantity(Resource::Research);
        if let Some(def) = progression::next_unlockable(&world.unlocked, research) {
            if world.unlock_skill(def.id).is_ok() {
                return Some(AutomationAction::Unlocked(def.id));
            }
        }
        if let Ok(level) = world.upgrade_global_miner() {
            return Some(AutomationAction::UpgradedMiner(level));
        }
        if under_storage_pressure(world) {
            if let Some(action) = try_build(world, StructureKind::Storage) {
                return Some(action);
            }
        }
        if !world.has_structure(StructureKind::Research) {
            if let Some(action) = try_build(world, StructureKind::Research) {
                return Some(action);
            }
        }
        try_build(world, StructureKind::Miner)
    }
}

impl Default for AutomationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AutomationSystem {
    fn name(&self) -> &str {
        "automation"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.automation_enabled {
            return Ok(());
        }
        world.automation_timer += ctx.dt;
        if !engine::elapsed(world.automation_timer, DECISION_INTERVAL) {
            return Ok(());
        }
        world.automation_timer = 0.0;
        if let Some(action) = Self::run_pass(world) {
            log::info!("tick {}: automation {:?}", ctx.tick, action);
        }
        Ok(())
    }
}

fn under_storage_pressure(world: &World) -> bool {
    [Resource::Wood, Resource::Stone].into_iter().any(|resource| {
        world
            .ledger
            .capacity(resource)
            .is_some_and(|cap| world.quantity(resource) > cap * STORAGE_PRESSURE)
    })
}

/// Builds `kind` on the first valid tile in row-major order.
fn try_build(world: &mut World, kind: StructureKind) -> Option<AutomationAction> {
    if !world.ledger.can_afford(kind.cost()) || !world.is_structure_unlocked(kind) {
        return None;
    }
    let pos = world
        .grid
        .tiles()
        .iter()
        .map(|tile| tile.pos)
        .find(|pos| world.can_place(*pos, kind))?;
    world
        .build(pos, kind)
        .ok()
        .map(|()| AutomationAction::Built(kind, pos))
}

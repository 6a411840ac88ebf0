use anyhow::Result;

use crate::{
    engine::{self, System, SystemContext},
    geometry::{self, TilePos},
    grid::TerrainKind,
    ledger::{Cost, Resource},
    progression::{self, SkillId, YieldRule},
    rng::SystemRng,
    world::{Vehicle, World, YieldOutput},
};

const IRON_CHANCE: f64 = 0.2;
const LITHIUM_CHANCE: f64 = 0.1;
const FASTER_RESEARCH_MULTIPLIER: f64 = 1.5;

/// Advances every structure's timer and resolves completed cycles in
/// row-major tile order.
pub struct ProductionSystem;

impl ProductionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProductionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ProductionSystem {
    fn name(&self) -> &str {
        "production"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for pos in world.grid.structure_positions() {
            let Some(structure) = world.grid.structure_mut(pos) else {
                continue;
            };
            let spec = structure.kind.spec();
            if spec.cycle_seconds.is_some() {
                structure.timer += ctx.dt;
            }
            let cycle = spec.cycle_seconds.unwrap_or(0.0);

            match spec.rule {
                YieldRule::Inert | YieldRule::LaunchBoat => {}
                YieldRule::Accrue {
                    resource,
                    per_second,
                } => accrue(world, resource, per_second, ctx.dt),
                YieldRule::Mine => {
                    let cycle = cycle / progression::miner_speed_multiplier(world.miner_level);
                    if complete_cycle(world, pos, cycle) {
                        mine(world, pos, rng);
                    }
                }
                YieldRule::Convert { inputs, output } => {
                    if world.ledger.can_afford(inputs) && complete_cycle(world, pos, cycle) {
                        convert(world, pos, inputs, output)?;
                    }
                }
                YieldRule::SpawnVehicle { inputs, limit } => {
                    if world.ledger.can_afford(inputs)
                        && world.vehicles.len() < limit
                        && complete_cycle(world, pos, cycle)
                    {
                        world.ledger.pay(inputs)?;
                        spawn_vehicle(world, pos);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Takes one cycle off the structure's timer if it has accumulated enough.
/// Surplus carries into the next cycle; at most one cycle fires per tick.
fn complete_cycle(world: &mut World, pos: TilePos, cycle: f64) -> bool {
    match world.grid.structure_mut(pos) {
        Some(structure) if engine::elapsed(structure.timer, cycle) => {
            structure.timer = (structure.timer - cycle).max(0.0);
            true
        }
        _ => false,
    }
}

fn accrue(world: &mut World, resource: Resource, per_second: f64, dt: f64) {
    let multiplier =
        if resource == Resource::Research && world.is_unlocked(SkillId::FasterResearch) {
            FASTER_RESEARCH_MULTIPLIER
        } else {
            1.0
        };
    world.ledger.credit(resource, per_second * multiplier * dt);
}

fn mine(world: &mut World, pos: TilePos, rng: &mut SystemRng<'_>) {
    let mut targets = vec![pos];
    let aoe = progression::miner_aoe(world.miner_level);
    if aoe > 0 {
        targets.extend(world.grid.neighbors(pos, aoe));
    }

    for target in targets {
        let Some(tile) = world.grid.tile(target) else {
            continue;
        };
        let terrain = tile.terrain;
        let Some(resource) = terrain.mined_resource() else {
            continue;
        };
        if tile.remaining_resources == 0 {
            continue;
        }

        if world.ledger.has_room(resource) {
            world.ledger.credit(resource, 1.0);
            if let Some(tile) = world.grid.tile_mut(target) {
                tile.remaining_resources -= 1;
            }
            world.emit_yield(target, YieldOutput::Resource(resource), 0.0);
        } else {
            log::trace!("{resource} store full, miner at ({}, {}) idles", pos.x, pos.y);
        }

        if terrain == TerrainKind::Rock {
            if world.is_unlocked(SkillId::UnlockIron) && rng.chance(IRON_CHANCE) {
                bonus_find(world, target, Resource::Iron, 0.5);
            }
            if world.is_unlocked(SkillId::AdvancedGeology) && rng.chance(LITHIUM_CHANCE) {
                bonus_find(world, target, Resource::Lithium, 1.0);
            }
        }
    }
}

fn bonus_find(world: &mut World, tile: TilePos, resource: Resource, lift: f64) {
    if world.ledger.has_room(resource) {
        world.ledger.credit(resource, 1.0);
        world.emit_yield(tile, YieldOutput::Resource(resource), lift);
    }
}

fn convert(world: &mut World, pos: TilePos, inputs: Cost, output: Resource) -> Result<()> {
    if world.ledger.has_room(output) {
        world.ledger.pay(inputs)?;
        world.ledger.credit(output, 1.0);
        world.emit_yield(pos, YieldOutput::Resource(output), 0.0);
    } else if world.rules.consume_input_when_output_full {
        world.ledger.pay(inputs)?;
        log::trace!("{output} store full, inputs ({inputs}) at ({}, {}) lost", pos.x, pos.y);
    }
    Ok(())
}

fn spawn_vehicle(world: &mut World, pos: TilePos) {
    let id = world.allocate_id();
    world.vehicles.push(Vehicle {
        id,
        position: geometry::tile_center(pos),
        current_tile: pos,
        target_tile: None,
    });
    log::debug!("vehicle {id} rolled out at ({}, {})", pos.x, pos.y);
    world.emit_yield(pos, YieldOutput::Vehicle, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Grid, Structure};
    use crate::ledger::Ledger;
    use crate::progression::StructureKind;
    use crate::rng::RngManager;
    use crate::world::Rules;

    const CENTER: TilePos = TilePos::new(2, 2);

    fn world_with(terrain: TerrainKind, kind: StructureKind) -> World {
        let mut grid = Grid::ocean(5, 5);
        grid.raise_land(CENTER, terrain, 100);
        if let Some(tile) = grid.tile_mut(CENTER) {
            tile.structure = Some(Structure::new(kind));
        }
        World::new(grid, Ledger::new(50.0), Rules::default())
    }

    fn run(world: &mut World, ticks: usize, dt: f64) {
        let mut manager = RngManager::new(3);
        let mut system = ProductionSystem::new();
        for _ in 0..ticks {
            let mut rng = manager.stream("production");
            let ctx = SystemContext {
                tick: world.tick() + 1,
                real_dt: dt,
                dt,
                scenario_name: "production",
            };
            system.run(&ctx, world, &mut rng).unwrap();
            world.advance_time(dt, dt);
        }
    }

    fn timer(world: &World) -> f64 {
        world.grid().tile(CENTER).unwrap().structure.as_ref().unwrap().timer
    }

    fn remaining(world: &World, pos: TilePos) -> u32 {
        world.grid().tile(pos).unwrap().remaining_resources
    }

    #[test]
    fn miner_yields_once_per_five_seconds() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        run(&mut world, 19, 0.25);
        assert_eq!(world.quantity(Resource::Wood), 0.0);
        run(&mut world, 1, 0.25);
        assert_eq!(world.quantity(Resource::Wood), 1.0);
        assert_eq!(remaining(&world, CENTER), 99);
        assert_eq!(world.floating_texts().len(), 1);
    }

    #[test]
    fn surplus_time_carries_into_next_cycle() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        run(&mut world, 2, 3.0);
        assert_eq!(world.quantity(Resource::Wood), 1.0);
        assert_eq!(timer(&world), 1.0);
    }

    #[test]
    fn one_cycle_per_tick_even_with_large_steps() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Miner);
        run(&mut world, 1, 12.0);
        assert_eq!(world.quantity(Resource::Stone), 1.0);
        assert_eq!(timer(&world), 7.0);
    }

    #[test]
    fn full_store_keeps_tile_reserve() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        world.ledger.set(Resource::Wood, 50.0);
        run(&mut world, 1, 5.0);
        assert_eq!(world.quantity(Resource::Wood), 50.0);
        assert_eq!(remaining(&world, CENTER), 100);
        assert!(world.floating_texts().is_empty());
    }

    #[test]
    fn depleted_tile_yields_nothing() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        world.grid.tile_mut(CENTER).unwrap().remaining_resources = 1;
        run(&mut world, 2, 5.0);
        assert_eq!(world.quantity(Resource::Wood), 1.0);
        assert_eq!(remaining(&world, CENTER), 0);
    }

    #[test]
    fn upgraded_miner_is_faster_and_reaches_neighbours() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        world.grid.raise_land(TilePos::new(1, 2), TerrainKind::Rock, 100);
        world.grid.raise_land(TilePos::new(3, 3), TerrainKind::Grass, 100);
        world.miner_level = 2;
        run(&mut world, 1, 2.5);
        assert_eq!(world.quantity(Resource::Wood), 2.0);
        assert_eq!(world.quantity(Resource::Stone), 1.0);
        assert_eq!(remaining(&world, TilePos::new(1, 2)), 99);
        assert_eq!(remaining(&world, TilePos::new(3, 3)), 99);
    }

    #[test]
    fn rock_turns_up_iron_once_unlocked() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Miner);
        run(&mut world, 10, 5.0);
        assert_eq!(world.quantity(Resource::Iron), 0.0);
        world.unlocked.insert(SkillId::UnlockIron);
        run(&mut world, 40, 5.0);
        let iron = world.quantity(Resource::Iron);
        assert!(iron >= 1.0 && iron <= 40.0, "iron = {iron}");
        assert_eq!(world.quantity(Resource::Lithium), 0.0);
    }

    #[test]
    fn rock_turns_up_lithium_with_advanced_geology() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Miner);
        world.unlocked.insert(SkillId::AdvancedGeology);
        run(&mut world, 200, 5.0);
        let lithium = world.quantity(Resource::Lithium);
        assert!(lithium >= 1.0 && lithium <= 50.0, "lithium = {lithium}");
        assert_eq!(world.quantity(Resource::Iron), 0.0);
        let finds = world
            .drain_yield_events()
            .into_iter()
            .filter(|e| e.output == YieldOutput::Resource(Resource::Lithium))
            .count();
        assert_eq!(finds as f64, lithium);
    }

    #[test]
    fn grass_never_turns_up_bonus_finds() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        world.unlocked.insert(SkillId::UnlockIron);
        world.unlocked.insert(SkillId::AdvancedGeology);
        run(&mut world, 200, 5.0);
        assert_eq!(world.quantity(Resource::Iron), 0.0);
        assert_eq!(world.quantity(Resource::Lithium), 0.0);
    }

    #[test]
    fn each_bonus_find_checks_its_own_store() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Miner);
        world.unlocked.insert(SkillId::UnlockIron);
        world.unlocked.insert(SkillId::AdvancedGeology);
        world.ledger.set(Resource::Iron, 50.0);
        run(&mut world, 200, 5.0);
        assert_eq!(world.quantity(Resource::Iron), 50.0);
        assert!(world.quantity(Resource::Lithium) >= 1.0);

        let events = world.drain_yield_events();
        assert!(!events
            .iter()
            .any(|e| e.output == YieldOutput::Resource(Resource::Iron)));

        world.ledger.set(Resource::Lithium, 50.0);
        run(&mut world, 200, 5.0);
        assert_eq!(world.quantity(Resource::Iron), 50.0);
        assert_eq!(world.quantity(Resource::Lithium), 50.0);
        assert!(!world.drain_yield_events().iter().any(|e| matches!(
            e.output,
            YieldOutput::Resource(Resource::Iron | Resource::Lithium)
        )));
    }

    #[test]
    fn miner_fires_on_schedule_at_twenty_hertz() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Miner);
        run(&mut world, 99, 0.05);
        assert_eq!(world.quantity(Resource::Wood), 0.0);
        run(&mut world, 1, 0.05);
        assert_eq!(world.quantity(Resource::Wood), 1.0);
        assert!(timer(&world) < 1e-6);
    }

    #[test]
    fn research_earns_a_point_in_forty_ticks() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Research);
        run(&mut world, 40, 0.05);
        assert!((world.quantity(Resource::Research) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn research_accrues_half_a_point_per_second() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Research);
        run(&mut world, 8, 0.25);
        assert_eq!(world.quantity(Resource::Research), 1.0);
        assert!(world.floating_texts().is_empty());

        world.unlocked.insert(SkillId::FasterResearch);
        run(&mut world, 8, 0.25);
        assert_eq!(world.quantity(Resource::Research), 2.5);
    }

    #[test]
    fn smelter_waits_for_iron() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Smelter);
        run(&mut world, 1, 10.0);
        assert_eq!(world.quantity(Resource::IronIngot), 0.0);
        assert_eq!(timer(&world), 10.0);

        world.ledger.set(Resource::Iron, 2.0);
        run(&mut world, 1, 0.25);
        assert_eq!(world.quantity(Resource::Iron), 1.0);
        assert_eq!(world.quantity(Resource::IronIngot), 1.0);
        assert_eq!(timer(&world), 0.25);
    }

    #[test]
    fn full_converter_output_still_consumes_inputs() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Smelter);
        world.ledger.set(Resource::Iron, 3.0);
        world.ledger.set(Resource::IronIngot, 50.0);
        run(&mut world, 1, 10.0);
        assert_eq!(world.quantity(Resource::Iron), 2.0);
        assert_eq!(world.quantity(Resource::IronIngot), 50.0);
    }

    #[test]
    fn full_converter_output_can_keep_inputs() {
        let mut world = world_with(TerrainKind::Rock, StructureKind::Smelter);
        world.rules.consume_input_when_output_full = false;
        world.ledger.set(Resource::Iron, 3.0);
        world.ledger.set(Resource::IronIngot, 50.0);
        run(&mut world, 1, 10.0);
        assert_eq!(world.quantity(Resource::Iron), 3.0);
        assert_eq!(timer(&world), 0.0);
    }

    #[test]
    fn assembler_needs_both_inputs() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Assembler);
        world.ledger.set(Resource::IronIngot, 5.0);
        run(&mut world, 1, 15.0);
        assert_eq!(world.quantity(Resource::Motor), 0.0);
        world.ledger.set(Resource::Lithium, 1.0);
        run(&mut world, 1, 0.25);
        assert_eq!(world.quantity(Resource::Motor), 1.0);
        assert_eq!(world.quantity(Resource::IronIngot), 4.0);
        assert_eq!(world.quantity(Resource::Lithium), 0.0);
    }

    #[test]
    fn vehicle_bay_spawns_until_the_cap() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::VehicleBay);
        world.ledger.adjust_capacity(1_000.0);
        world.ledger.set(Resource::IronIngot, 1_000.0);
        world.ledger.set(Resource::Motor, 100.0);
        run(&mut world, 12, 20.0);
        assert_eq!(world.vehicles().len(), 10);
        assert_eq!(world.quantity(Resource::IronIngot), 500.0);
        assert_eq!(world.quantity(Resource::Motor), 50.0);
        let vehicle = &world.vehicles()[0];
        assert_eq!(vehicle.current_tile, CENTER);
        assert_eq!(vehicle.position, geometry::tile_center(CENTER));
        let events = world.drain_yield_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.output == YieldOutput::Vehicle)
                .count(),
            10
        );
    }

    #[test]
    fn inert_structures_do_nothing() {
        let mut world = world_with(TerrainKind::Grass, StructureKind::Storage);
        run(&mut world, 4, 10.0);
        assert_eq!(timer(&world), 0.0);
        assert!(world.ledger().quantities().values().all(|q| *q == 0.0));
    }
}

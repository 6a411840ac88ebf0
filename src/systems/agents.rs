use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    geometry,
    ledger::Resource,
    rng::SystemRng,
    world::{World, YieldOutput},
};

/// Display units per real second.
pub const BOAT_SPEED: f64 = 20.0;
pub const VEHICLE_SPEED: f64 = 40.0;
/// Real seconds between catches.
pub const BOAT_CATCH_SECONDS: f64 = 15.0;
const ARRIVAL_RADIUS: f64 = 5.0;

/// Moves boats and vehicles. Agents run on wall-clock time so they keep a
/// steady pace under fast-forward.
pub struct AgentSystem;

impl AgentSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AgentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AgentSystem {
    fn name(&self) -> &str {
        "agents"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        update_boats(world, ctx.real_dt, rng);
        update_vehicles(world, ctx.real_dt, rng);
        Ok(())
    }
}

fn update_boats(world: &mut World, real_dt: f64, rng: &mut SystemRng<'_>) {
    if world.boats.is_empty() {
        return;
    }
    let fishing_grounds = world.grid.coastal_water();
    let mut catches = Vec::new();

    for boat in &mut world.boats {
        boat.timer += real_dt;
        if boat.timer >= BOAT_CATCH_SECONDS {
            boat.timer = 0.0;
            catches.push(geometry::tile_under(boat.position));
        }

        if boat.target.is_none() {
            boat.target = rng.pick(&fishing_grounds).map(geometry::tile_center);
        }
        if let Some(target) = boat.target {
            if boat.position.distance_to(target) < ARRIVAL_RADIUS {
                boat.target = None;
            } else {
                boat.position = boat.position.move_towards(target, BOAT_SPEED * real_dt);
            }
        }
    }

    for tile in catches {
        if world.ledger.has_room(Resource::Fish) {
            world.ledger.credit(Resource::Fish, 1.0);
            world.emit_yield(tile, YieldOutput::Resource(Resource::Fish), 0.0);
        }
    }
}

fn update_vehicles(world: &mut World, real_dt: f64, rng: &mut SystemRng<'_>) {
    let grid = &world.grid;
    for vehicle in &mut world.vehicles {
        if vehicle.target_tile.is_none() {
            vehicle.target_tile = rng.pick(&grid.land_neighbors(vehicle.current_tile));
        }
        let Some(target_tile) = vehicle.target_tile else {
            continue;
        };
        let target = geometry::tile_center(target_tile);
        if vehicle.position.distance_to(target) < ARRIVAL_RADIUS {
            vehicle.current_tile = target_tile;
            vehicle.target_tile = None;
        } else {
            vehicle.position = vehicle
                .position
                .move_towards(target, VEHICLE_SPEED * real_dt);
        }
    }
}

use anyhow::Result;
use rand::Rng;

use crate::{
    engine::{self, System, SystemContext},
    grid::TerrainKind,
    rng::SystemRng,
    world::World,
};

/// Share of the day spent fading in and out of night at each end.
const TWILIGHT: f64 = 0.25;
const MAX_DARKNESS: f64 = 0.5;

/// Darkness for a day phase in `[0, 1]`: fades from full night to clear over
/// the first quarter, stays clear, then darkens over the last quarter.
pub fn night_overlay(phase: f64) -> f64 {
    if phase < TWILIGHT {
        (1.0 - phase / TWILIGHT) * MAX_DARKNESS
    } else if phase > 1.0 - TWILIGHT {
        ((phase - (1.0 - TWILIGHT)) / TWILIGHT) * MAX_DARKNESS
    } else {
        0.0
    }
}

pub struct ClockSystem;

impl ClockSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClockSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ClockSystem {
    fn name(&self) -> &str {
        "clock"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let day = world.rules.day_duration;
        let clock = &mut world.clock;
        clock.timer += ctx.dt;
        clock.phase = clock.timer / day;
        clock.night_overlay = night_overlay(clock.phase);
        if !engine::elapsed(clock.timer, day) {
            return Ok(());
        }

        clock.timer = 0.0;
        clock.phase = 0.0;
        clock.night_overlay = night_overlay(0.0);
        clock.days_elapsed += 1;
        log::debug!("day {} began at tick {}", clock.days_elapsed, ctx.tick);
        expand_island(world, rng);
        Ok(())
    }
}

/// Raises one random coastal water tile into fresh land, if any exists.
fn expand_island(world: &mut World, rng: &mut SystemRng<'_>) {
    let coast = world.grid.coastal_water();
    let Some(pos) = rng.pick(&coast) else {
        log::trace!("no coastline left to expand");
        return;
    };
    let terrain = if rng.gen_bool(0.5) {
        TerrainKind::Grass
    } else {
        TerrainKind::Rock
    };
    let reserve = world.rules.tile_initial_resources;
    if world.grid.raise_land(pos, terrain, reserve) {
        log::info!("island grew: ({}, {}) is now {:?}", pos.x, pos.y, terrain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::TilePos;
    use crate::grid::Grid;
    use crate::ledger::Ledger;
    use crate::rng::RngManager;
    use crate::world::Rules;

    fn tick(world: &mut World, dt: f64) {
        let mut manager = RngManager::new(11);
        let mut rng = manager.stream("clock");
        let ctx = SystemContext {
            tick: world.tick() + 1,
            real_dt: dt,
            dt,
            scenario_name: "clock",
        };
        ClockSystem::new().run(&ctx, world, &mut rng).unwrap();
    }

    fn islet(day_duration: f64) -> World {
        let mut grid = Grid::ocean(5, 5);
        grid.raise_land(TilePos::new(2, 2), TerrainKind::Grass, 100);
        let rules = Rules {
            day_duration,
            ..Rules::default()
        };
        World::new(grid, Ledger::new(50.0), rules)
    }

    #[test]
    fn overlay_is_trapezoidal() {
        assert_eq!(night_overlay(0.0), 0.5);
        assert_eq!(night_overlay(0.125), 0.25);
        assert_eq!(night_overlay(0.25), 0.0);
        assert_eq!(night_overlay(0.5), 0.0);
        assert_eq!(night_overlay(0.75), 0.0);
        assert_eq!(night_overlay(0.875), 0.25);
        assert_eq!(night_overlay(1.0), 0.5);
    }

    #[test]
    fn phase_tracks_timer() {
        let mut world = islet(8.0);
        tick(&mut world, 2.0);
        assert_eq!(world.clock().phase, 0.25);
        assert_eq!(world.clock().night_overlay, 0.0);
        assert_eq!(world.clock().days_elapsed, 0);
    }

    #[test]
    fn day_rollover_grows_one_coastal_tile() {
        let mut world = islet(4.0);
        tick(&mut world, 4.0);
        assert_eq!(world.clock().timer, 0.0);
        assert_eq!(world.clock().days_elapsed, 1);
        let land: Vec<_> = world
            .grid()
            .tiles()
            .iter()
            .filter(|t| t.terrain.is_land())
            .collect();
        assert_eq!(land.len(), 2);
        let grown = land
            .iter()
            .find(|t| t.pos != TilePos::new(2, 2))
            .unwrap();
        assert_eq!(grown.remaining_resources, 100);
        assert_eq!(grown.initial_resources, 100);
        assert!(grown.pos.x.abs_diff(2) <= 1 && grown.pos.y.abs_diff(2) <= 1);
    }

    #[test]
    fn day_rolls_over_on_schedule_at_twenty_hertz() {
        let mut world = islet(1.0);
        for _ in 0..19 {
            tick(&mut world, 0.05);
        }
        assert_eq!(world.clock().days_elapsed, 0);
        tick(&mut world, 0.05);
        assert_eq!(world.clock().days_elapsed, 1);
        assert_eq!(world.clock().timer, 0.0);
    }

    #[test]
    fn enclosed_island_rolls_over_without_change() {
        let mut grid = Grid::ocean(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                grid.raise_land(TilePos::new(x, y), TerrainKind::Rock, 7);
            }
        }
        let before = grid.clone();
        let rules = Rules {
            day_duration: 1.0,
            ..Rules::default()
        };
        let mut world = World::new(grid, Ledger::new(50.0), rules);
        tick(&mut world, 1.0);
        assert_eq!(world.clock().timer, 0.0);
        assert_eq!(world.grid(), &before);
    }
}

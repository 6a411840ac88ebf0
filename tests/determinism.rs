use expactory::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    WorldSnapshot,
};
use tempfile::tempdir;

fn run_autopilot(seed: u64, ticks: u64) -> WorldSnapshot {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/autopilot.yaml").unwrap();
    let mut world = scenario.build_world();
    let mut engine = EngineBuilder::new(EngineSettings::in_memory(&scenario.name, seed))
        .with_default_systems()
        .build();
    engine
        .run(&mut world, ticks, scenario.tick_seconds)
        .unwrap();
    world.snapshot(&scenario.name)
}

#[test]
fn same_seed_same_world() {
    let a = serde_json::to_value(run_autopilot(77, 3_000)).unwrap();
    let b = serde_json::to_value(run_autopilot(77, 3_000)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn seed_changes_island_growth() {
    let grown = |seed| {
        run_autopilot(seed, 6_000)
            .tiles
            .into_iter()
            .filter(|tile| tile.terrain.is_land())
            .map(|tile| tile.pos)
            .collect::<Vec<_>>()
    };
    let runs: Vec<_> = [1, 2, 3].into_iter().map(grown).collect();
    assert!(runs.iter().all(|land| land.len() > 5));
    assert!(runs[0] != runs[1] || runs[1] != runs[2]);
}

#[test]
fn snapshots_land_in_scenario_directory() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/seed_island.yaml").unwrap();
    let mut world = scenario.build_world();
    let temp = tempdir().unwrap();
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 100,
        snapshot_dir: temp.path().to_path_buf(),
    };
    let mut engine = EngineBuilder::new(settings).with_default_systems().build();
    engine.run(&mut world, 300, scenario.tick_seconds).unwrap();

    let dir = temp.path().join("seed_island");
    let mut files: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec!["tick_000100.json", "tick_000200.json", "tick_000300.json"]
    );

    let body = std::fs::read_to_string(dir.join("tick_000300.json")).unwrap();
    let snapshot: WorldSnapshot = serde_json::from_str(&body).unwrap();
    assert_eq!(snapshot.tick, 300);
    assert_eq!(snapshot.scenario, "seed_island");
    assert_eq!(snapshot.tiles.len(), 40 * 40);
}

//! Static game data: the skill tree, the global miner tiers and the
//! structure catalogue. Nothing here is mutable; the world records which
//! entries have been reached.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{Cost, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillId {
    UnlockIron,
    IronSmelting,
    UnlockFishing,
    AdvancedGeology,
    ElectricalEngineering,
    Automation,
    FasterResearch,
}

impl SkillId {
    pub fn as_str(self) -> &'static str {
        self.definition().key
    }

    pub fn definition(self) -> &'static SkillDefinition {
        // SKILL_TREE is laid out in declaration order.
        &SKILL_TREE[self as usize]
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skill '{0}'")]
pub struct UnknownSkill(pub String);

impl FromStr for SkillId {
    type Err = UnknownSkill;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SKILL_TREE
            .iter()
            .find(|def| def.key == s)
            .map(|def| def.id)
            .ok_or_else(|| UnknownSkill(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: u32,
    pub prerequisites: &'static [SkillId],
}

impl SkillDefinition {
    pub fn prerequisites_met(&self, unlocked: &BTreeSet<SkillId>) -> bool {
        self.prerequisites.iter().all(|dep| unlocked.contains(dep))
    }

    pub fn missing_prerequisite(&self, unlocked: &BTreeSet<SkillId>) -> Option<SkillId> {
        self.prerequisites
            .iter()
            .copied()
            .find(|dep| !unlocked.contains(dep))
    }
}

pub const SKILL_TREE: &[SkillDefinition] = &[
    SkillDefinition {
        id: SkillId::UnlockIron,
        key: "unlock_iron",
        name: "Geology",
        description: "Miners on rocky tiles also find iron ore (20% chance).",
        cost: 25,
        prerequisites: &[],
    },
    SkillDefinition {
        id: SkillId::IronSmelting,
        key: "iron_smelting",
        name: "Iron Smelting",
        description: "Unlocks the smelter to turn iron ore into ingots.",
        cost: 100,
        prerequisites: &[SkillId::UnlockIron],
    },
    SkillDefinition {
        id: SkillId::UnlockFishing,
        key: "unlock_fishing",
        name: "Aquaculture",
        description: "Unlocks the fishing boat.",
        cost: 75,
        prerequisites: &[SkillId::IronSmelting],
    },
    SkillDefinition {
        id: SkillId::AdvancedGeology,
        key: "advanced_geology",
        name: "Advanced Geology",
        description: "Miners on rocky tiles can also find lithium (10% chance).",
        cost: 150,
        prerequisites: &[SkillId::IronSmelting],
    },
    SkillDefinition {
        id: SkillId::ElectricalEngineering,
        key: "electrical_engineering",
        name: "Electrical Engineering",
        description: "Unlocks the assembler to build electric motors.",
        cost: 200,
        prerequisites: &[SkillId::AdvancedGeology],
    },
    SkillDefinition {
        id: SkillId::Automation,
        key: "automation",
        name: "Automation",
        description: "Unlocks the vehicle bay.",
        cost: 300,
        prerequisites: &[SkillId::ElectricalEngineering],
    },
    SkillDefinition {
        id: SkillId::FasterResearch,
        key: "faster_research",
        name: "Efficient Methods",
        description: "Research stations produce 50% faster.",
        cost: 50,
        prerequisites: &[SkillId::UnlockIron],
    },
];

/// First skill in table order that is still locked, has its prerequisites
/// and fits within `research`.
pub fn next_unlockable(
    unlocked: &BTreeSet<SkillId>,
    research: f64,
) -> Option<&'static SkillDefinition> {
    SKILL_TREE.iter().find(|def| {
        !unlocked.contains(&def.id)
            && def.prerequisites_met(unlocked)
            && research >= f64::from(def.cost)
    })
}

#[derive(Debug, Clone, Copy)]
pub struct MinerTier {
    pub level: u32,
    pub cost: Cost,
    pub speed_multiplier: f64,
    pub aoe: u32,
    pub description: &'static str,
}

pub const MINER_TIERS: &[MinerTier] = &[
    MinerTier {
        level: 1,
        cost: Cost::new(&[(Resource::Wood, 50), (Resource::Stone, 50)]),
        speed_multiplier: 1.5,
        aoe: 0,
        description: "All miners work 1.5x faster.",
    },
    MinerTier {
        level: 2,
        cost: Cost::new(&[(Resource::Wood, 150), (Resource::Stone, 150)]),
        speed_multiplier: 2.0,
        aoe: 1,
        description: "All miners work 2x faster and also mine adjacent tiles.",
    },
    MinerTier {
        level: 3,
        cost: Cost::new(&[(Resource::Wood, 400), (Resource::Stone, 400)]),
        speed_multiplier: 3.0,
        aoe: 1,
        description: "Mining speed rises to 3x. Area of effect remains.",
    },
];

pub const MAX_MINER_LEVEL: u32 = MINER_TIERS.len() as u32;

/// Tier currently in force; level 0 has none.
pub fn current_miner_tier(level: u32) -> Option<&'static MinerTier> {
    level
        .checked_sub(1)
        .and_then(|index| MINER_TIERS.get(index as usize))
}

pub fn next_miner_tier(level: u32) -> Option<&'static MinerTier> {
    MINER_TIERS.get(level as usize)
}

pub fn miner_speed_multiplier(level: u32) -> f64 {
    current_miner_tier(level).map_or(1.0, |tier| tier.speed_multiplier)
}

pub fn miner_aoe(level: u32) -> u32 {
    current_miner_tier(level).map_or(0, |tier| tier.aoe)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Miner,
    Storage,
    Research,
    Smelter,
    FishingBoat,
    Assembler,
    VehicleBay,
}

/// What a structure does when its cycle completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YieldRule {
    /// Holds nothing and produces nothing on its own.
    Inert,
    /// Mines the host tile, plus the global area of effect.
    Mine,
    /// Continuous trickle, no cycle.
    Accrue { resource: Resource, per_second: f64 },
    /// Consumes `inputs` to produce one unit of `output`.
    Convert { inputs: Cost, output: Resource },
    /// Consumes `inputs` to put a new vehicle on the map.
    SpawnVehicle { inputs: Cost, limit: usize },
    /// Built as a mobile agent instead of occupying the tile.
    LaunchBoat,
}

#[derive(Debug, Clone, Copy)]
pub struct StructureSpec {
    pub kind: StructureKind,
    pub key: &'static str,
    pub cost: Cost,
    /// Simulated seconds per cycle before any speed multiplier.
    pub cycle_seconds: Option<f64>,
    pub rule: YieldRule,
    pub unlocked_by: Option<SkillId>,
}

const STRUCTURES: &[StructureSpec] = &[
    StructureSpec {
        kind: StructureKind::Miner,
        key: "miner",
        cost: Cost::new(&[(Resource::Wood, 10)]),
        cycle_seconds: Some(5.0),
        rule: YieldRule::Mine,
        unlocked_by: None,
    },
    StructureSpec {
        kind: StructureKind::Storage,
        key: "storage",
        cost: Cost::new(&[(Resource::Wood, 30), (Resource::Stone, 10)]),
        cycle_seconds: None,
        rule: YieldRule::Inert,
        unlocked_by: None,
    },
    StructureSpec {
        kind: StructureKind::Research,
        key: "research",
        cost: Cost::new(&[(Resource::Wood, 50), (Resource::Stone, 25)]),
        cycle_seconds: None,
        rule: YieldRule::Accrue {
            resource: Resource::Research,
            per_second: 0.5,
        },
        unlocked_by: None,
    },
    StructureSpec {
        kind: StructureKind::Smelter,
        key: "smelter",
        cost: Cost::new(&[(Resource::Stone, 25), (Resource::Iron, 10)]),
        cycle_seconds: Some(10.0),
        rule: YieldRule::Convert {
            inputs: Cost::new(&[(Resource::Iron, 1)]),
            output: Resource::IronIngot,
        },
        unlocked_by: Some(SkillId::IronSmelting),
    },
    StructureSpec {
        kind: StructureKind::FishingBoat,
        key: "fishing_boat",
        cost: Cost::new(&[(Resource::IronIngot, 15)]),
        cycle_seconds: None,
        rule: YieldRule::LaunchBoat,
        unlocked_by: Some(SkillId::UnlockFishing),
    },
    StructureSpec {
        kind: StructureKind::Assembler,
        key: "assembler",
        cost: Cost::new(&[(Resource::IronIngot, 20), (Resource::Lithium, 10)]),
        cycle_seconds: Some(15.0),
        rule: YieldRule::Convert {
            inputs: Cost::new(&[(Resource::IronIngot, 1), (Resource::Lithium, 1)]),
            output: Resource::Motor,
        },
        unlocked_by: Some(SkillId::ElectricalEngineering),
    },
    StructureSpec {
        kind: StructureKind::VehicleBay,
        key: "vehicle_bay",
        cost: Cost::new(&[(Resource::IronIngot, 50), (Resource::Motor, 5)]),
        cycle_seconds: Some(20.0),
        rule: YieldRule::SpawnVehicle {
            inputs: Cost::new(&[(Resource::IronIngot, 50), (Resource::Motor, 5)]),
            limit: 10,
        },
        unlocked_by: Some(SkillId::Automation),
    },
];

impl StructureKind {
    pub const ALL: [StructureKind; 7] = [
        StructureKind::Miner,
        StructureKind::Storage,
        StructureKind::Research,
        StructureKind::Smelter,
        StructureKind::FishingBoat,
        StructureKind::Assembler,
        StructureKind::VehicleBay,
    ];

    pub fn spec(self) -> &'static StructureSpec {
        &STRUCTURES[self as usize]
    }

    pub fn cost(self) -> Cost {
        self.spec().cost
    }

    pub fn as_str(self) -> &'static str {
        self.spec().key
    }

    /// Fishing boats leave the tile empty and become agents.
    pub fn launches_agent(self) -> bool {
        matches!(self.spec().rule, YieldRule::LaunchBoat)
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown structure '{0}'")]
pub struct UnknownStructure(pub String);

impl FromStr for StructureKind {
    type Err = UnknownStructure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STRUCTURES
            .iter()
            .find(|spec| spec.key == s)
            .map(|spec| spec.kind)
            .ok_or_else(|| UnknownStructure(s.to_string()))
    }
}

//! Player and automation actions. Each command either applies completely or
//! returns an error and leaves the world untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{self, TilePos};
use crate::grid::Structure;
use crate::ledger::{LedgerError, Resource};
use crate::progression::{self, SkillId, StructureKind, MAX_MINER_LEVEL};
use crate::world::{Boat, World, MAX_TIME_SCALE, MIN_TIME_SCALE};

pub const BOOST_FISH_COST: u32 = 20;
pub const BOOST_SECONDS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    Build { pos: TilePos, kind: StructureKind },
    Remove { pos: TilePos },
    UpgradeGlobalMiner,
    UnlockSkill { skill: SkillId },
    ToggleBoost,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("cannot place {kind} at ({}, {})", pos.x, pos.y)]
    InvalidPlacement { pos: TilePos, kind: StructureKind },
    #[error(transparent)]
    InsufficientResources(#[from] LedgerError),
    #[error("{kind} requires the {skill} skill")]
    StructureLocked { kind: StructureKind, skill: SkillId },
    #[error("no structure at ({}, {})", pos.x, pos.y)]
    NoStructure { pos: TilePos },
    #[error("global miner upgrade already at level {0}")]
    MaxTierReached(u32),
    #[error("skill {0} already unlocked")]
    AlreadyUnlocked(SkillId),
    #[error("skill {skill} requires {missing}")]
    PrerequisiteMissing { skill: SkillId, missing: SkillId },
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),
    #[error("boost already active")]
    BoostActive,
}

impl World {
    pub fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        let result = match command {
            Command::Build { pos, kind } => self.build(pos, kind),
            Command::Remove { pos } => self.remove(pos).map(|_| ()),
            Command::UpgradeGlobalMiner => self.upgrade_global_miner().map(|_| ()),
            Command::UnlockSkill { skill } => self.unlock_skill(skill),
            Command::ToggleBoost => self.toggle_boost(),
        };
        if let Err(err) = &result {
            log::trace!("{command:?} rejected: {err}");
        }
        result
    }

    /// Placement rules alone, ignoring cost and unlocks.
    pub fn can_place(&self, pos: TilePos, kind: StructureKind) -> bool {
        let Some(tile) = self.grid.tile(pos) else {
            return false;
        };
        if kind.launches_agent() {
            !tile.terrain.is_land() && self.grid.has_land_neighbor(pos)
        } else {
            tile.is_buildable_land()
        }
    }

    pub fn is_structure_unlocked(&self, kind: StructureKind) -> bool {
        !self.rules.require_unlocks
            || kind
                .spec()
                .unlocked_by
                .map_or(true, |skill| self.unlocked.contains(&skill))
    }

    pub fn build(&mut self, pos: TilePos, kind: StructureKind) -> Result<(), CommandError> {
        if !self.can_place(pos, kind) {
            return Err(CommandError::InvalidPlacement { pos, kind });
        }
        if !self.is_structure_unlocked(kind) {
            if let Some(skill) = kind.spec().unlocked_by {
                return Err(CommandError::StructureLocked { kind, skill });
            }
        }
        self.ledger.pay(kind.cost())?;

        if kind.launches_agent() {
            let id = self.allocate_id();
            self.boats.push(Boat {
                id,
                position: geometry::tile_center(pos),
                target: None,
                timer: 0.0,
            });
            log::debug!("launched boat {id} at ({}, {})", pos.x, pos.y);
            return Ok(());
        }

        if let Some(tile) = self.grid.tile_mut(pos) {
            tile.structure = Some(Structure::new(kind));
        }
        if kind == StructureKind::Storage {
            self.ledger.adjust_capacity(self.rules.storage_bonus);
        }
        log::debug!("built {kind} at ({}, {})", pos.x, pos.y);
        Ok(())
    }

    /// Clears the structure on `pos` and refunds half its cost. Boats are
    /// not tied to a tile and are unaffected.
    pub fn remove(&mut self, pos: TilePos) -> Result<StructureKind, CommandError> {
        let kind = self
            .grid
            .tile_mut(pos)
            .and_then(|tile| tile.structure.take())
            .map(|structure| structure.kind)
            .ok_or(CommandError::NoStructure { pos })?;

        if kind == StructureKind::Storage {
            self.ledger.adjust_capacity(-self.rules.storage_bonus);
        }
        for (resource, amount) in kind.cost().refund() {
            self.ledger.credit(resource, f64::from(amount));
        }
        log::debug!("removed {kind} at ({}, {})", pos.x, pos.y);
        Ok(kind)
    }

    /// Returns the new shared miner level.
    pub fn upgrade_global_miner(&mut self) -> Result<u32, CommandError> {
        let tier = progression::next_miner_tier(self.miner_level)
            .ok_or(CommandError::MaxTierReached(MAX_MINER_LEVEL))?;
        self.ledger.pay(tier.cost)?;
        self.miner_level += 1;
        log::debug!("global miner upgraded to level {}", self.miner_level);
        Ok(self.miner_level)
    }

    pub fn unlock_skill(&mut self, skill: SkillId) -> Result<(), CommandError> {
        if self.unlocked.contains(&skill) {
            return Err(CommandError::AlreadyUnlocked(skill));
        }
        let def = skill.definition();
        if let Some(missing) = def.missing_prerequisite(&self.unlocked) {
            return Err(CommandError::PrerequisiteMissing { skill, missing });
        }
        self.ledger
            .debit(Resource::Research, f64::from(def.cost))?;
        self.unlocked.insert(skill);
        log::debug!("unlocked skill {skill}");
        Ok(())
    }

    pub fn unlock_skill_by_name(&mut self, name: &str) -> Result<(), CommandError> {
        let skill = name
            .parse::<SkillId>()
            .map_err(|err| CommandError::UnknownSkill(err.0))?;
        self.unlock_skill(skill)
    }

    pub fn toggle_boost(&mut self) -> Result<(), CommandError> {
        if self.boost.active {
            return Err(CommandError::BoostActive);
        }
        self.ledger
            .debit(Resource::Fish, f64::from(BOOST_FISH_COST))?;
        self.boost.active = true;
        self.boost.remaining = BOOST_SECONDS;
        log::debug!("boost active for {BOOST_SECONDS}s");
        Ok(())
    }

    /// Clamped to the supported 1x..20x range; non-finite values are ignored.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.time_scale = scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        }
    }

    pub fn set_automation(&mut self, enabled: bool) {
        if self.automation_enabled != enabled {
            self.automation_timer = 0.0;
        }
        self.automation_enabled = enabled;
    }
}

//! The tile lattice: terrain, the structure occupying each tile and the
//! reserve of raw material left to mine.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, TilePos};
use crate::ledger::Resource;
use crate::progression::StructureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Water,
    Grass,
    Rock,
}

impl TerrainKind {
    pub fn is_land(self) -> bool {
        !matches!(self, TerrainKind::Water)
    }

    /// Raw material a miner pulls out of this terrain.
    pub fn mined_resource(self) -> Option<Resource> {
        match self {
            TerrainKind::Water => None,
            TerrainKind::Grass => Some(Resource::Wood),
            TerrainKind::Rock => Some(Resource::Stone),
        }
    }
}

/// A building and its production timer. The timer carries surplus seconds
/// across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub kind: StructureKind,
    pub timer: f64,
}

impl Structure {
    pub fn new(kind: StructureKind) -> Self {
        Self { kind, timer: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: TilePos,
    pub terrain: TerrainKind,
    pub structure: Option<Structure>,
    pub initial_resources: u32,
    pub remaining_resources: u32,
}

impl Tile {
    fn water(pos: TilePos) -> Self {
        Self {
            pos,
            terrain: TerrainKind::Water,
            structure: None,
            initial_resources: 0,
            remaining_resources: 0,
        }
    }

    pub fn structure_kind(&self) -> Option<StructureKind> {
        self.structure.as_ref().map(|s| s.kind)
    }

    pub fn is_buildable_land(&self) -> bool {
        self.terrain.is_land() && self.structure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    /// Row-major.
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn ocean(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile::water(TilePos::new(x as i32, y as i32)));
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn center(&self) -> TilePos {
        TilePos::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        geometry::in_bounds(pos, self.width, self.height)
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width + pos.x as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|index| &self.tiles[index])
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index(pos).map(move |index| &mut self.tiles[index])
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn structure_mut(&mut self, pos: TilePos) -> Option<&mut Structure> {
        self.tile_mut(pos).and_then(|tile| tile.structure.as_mut())
    }

    pub fn neighbors(&self, pos: TilePos, radius: u32) -> Vec<TilePos> {
        geometry::neighbors(pos, radius, self.width, self.height)
    }

    pub fn is_land(&self, pos: TilePos) -> bool {
        self.tile(pos).is_some_and(|tile| tile.terrain.is_land())
    }

    pub fn has_land_neighbor(&self, pos: TilePos) -> bool {
        self.neighbors(pos, 1).into_iter().any(|n| self.is_land(n))
    }

    /// Land tiles in the 8-neighbourhood of `pos`.
    pub fn land_neighbors(&self, pos: TilePos) -> Vec<TilePos> {
        self.neighbors(pos, 1)
            .into_iter()
            .filter(|n| self.is_land(*n))
            .collect()
    }

    /// Water tiles touching land, row-major. These are both the expansion
    /// frontier and the fishing grounds.
    pub fn coastal_water(&self) -> Vec<TilePos> {
        self.tiles
            .iter()
            .filter(|tile| tile.terrain == TerrainKind::Water && self.has_land_neighbor(tile.pos))
            .map(|tile| tile.pos)
            .collect()
    }

    /// Positions of every tile with a structure, row-major.
    pub fn structure_positions(&self) -> Vec<TilePos> {
        self.tiles
            .iter()
            .filter(|tile| tile.structure.is_some())
            .map(|tile| tile.pos)
            .collect()
    }

    pub fn count_structures(&self, kind: StructureKind) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.structure_kind() == Some(kind))
            .count()
    }

    /// Re-types a tile as fresh land with a full reserve. Returns false if
    /// `pos` is outside the grid or `terrain` is water.
    pub fn raise_land(&mut self, pos: TilePos, terrain: TerrainKind, reserve: u32) -> bool {
        if !terrain.is_land() {
            return false;
        }
        match self.tile_mut(pos) {
            Some(tile) => {
                tile.terrain = terrain;
                tile.initial_resources = reserve;
                tile.remaining_resources = reserve;
                true
            }
            None => false,
        }
    }
}

use std::collections::HashMap;

use crate::{
    records::{CapacityError, SessionError, Table, try_reserve},
    tile::Tile,
};

/// Pattern indices are stored as signed 16 bit values, so only the positive half is usable.
pub const MAX_PATTERNS: usize = 32768;

/// Unique tiles in the order they were first seen. A tile's position is its pattern index.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    tiles: Vec<Tile>,
    existing_tiles: HashMap<Tile, usize>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index of the first stored tile with identical content.
    pub fn find(&self, tile: &Tile) -> Option<usize> {
        self.existing_tiles.get(tile).copied()
    }

    /// Appends the tile without looking for an existing copy.
    pub fn push(&mut self, tile: Tile) -> Result<usize, SessionError> {
        if self.tiles.len() >= MAX_PATTERNS {
            return Err(CapacityError {
                table: Table::Pattern,
                limit: MAX_PATTERNS,
            }
            .into());
        }

        try_reserve(&mut self.tiles, 1, Table::Pattern)?;

        let index = self.tiles.len();
        self.existing_tiles.entry(tile.clone()).or_insert(index);
        self.tiles.push(tile);

        Ok(index)
    }

    pub fn find_or_push(&mut self, tile: Tile) -> Result<usize, SessionError> {
        match self.find(&tile) {
            Some(index) => Ok(index),
            None => self.push(tile),
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.tiles
            .iter()
            .flat_map(|tile| tile.as_bytes().iter().copied())
            .collect()
    }
}

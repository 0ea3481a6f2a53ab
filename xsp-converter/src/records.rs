use std::{collections::TryReserveError, fmt};

use snafu::Snafu;

/// Size in bytes of both composition and reference entries.
pub const ENTRY_BYTES: usize = 8;

pub const MAX_COMPOSITION_ENTRIES: usize = 32768;
/// The bundle header stores the composition table's length in bytes as a 16 bit value.
pub const MAX_BUNDLE_COMPOSITION_ENTRIES: usize = u16::MAX as usize / ENTRY_BYTES;
pub const MAX_REFERENCE_ENTRIES: usize = 32768 / 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Pattern,
    Composition,
    Reference,
    ClaimMask,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Table::Pattern => "pattern",
            Table::Composition => "composition",
            Table::Reference => "reference",
            Table::ClaimMask => "claim mask",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Snafu)]
#[snafu(display("{table} table is full, cannot hold more than {limit} entries"))]
pub struct CapacityError {
    pub table: Table,
    pub limit: usize,
}

#[derive(Debug, Snafu)]
#[snafu(display("could not allocate memory for the {table} table"))]
pub struct AllocationError {
    pub table: Table,
    source: TryReserveError,
}

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(transparent)]
    Capacity { source: CapacityError },
    #[snafu(transparent)]
    Allocation { source: AllocationError },
}

pub(crate) fn try_reserve<T>(
    buffer: &mut Vec<T>,
    additional: usize,
    table: Table,
) -> Result<(), AllocationError> {
    buffer
        .try_reserve(additional)
        .map_err(|source| AllocationError { table, source })
}

fn push_bounded<T>(
    buffer: &mut Vec<T>,
    item: T,
    table: Table,
    limit: usize,
) -> Result<(), SessionError> {
    if buffer.len() >= limit {
        return Err(CapacityError { table, limit }.into());
    }

    try_reserve(buffer, 1, table)?;
    buffer.push(item);
    Ok(())
}

/// One hardware sprite of a composite object, placed relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionEntry {
    pub dx: i16,
    pub dy: i16,
    pub pattern: u16,
    pub reserved: u16,
}

impl CompositionEntry {
    pub fn new(dx: i16, dy: i16, pattern: u16) -> Self {
        Self {
            dx,
            dy,
            pattern,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_BYTES] {
        let mut buffer = [0; ENTRY_BYTES];
        buffer[0..2].copy_from_slice(&self.dx.to_be_bytes());
        buffer[2..4].copy_from_slice(&self.dy.to_be_bytes());
        buffer[4..6].copy_from_slice(&self.pattern.to_be_bytes());
        buffer[6..8].copy_from_slice(&self.reserved.to_be_bytes());
        buffer
    }
}

/// Locates the composition entries making up one frame of the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub sprite_count: u16,
    pub composition_offset: u32,
    pub reserved: u16,
}

impl ReferenceEntry {
    pub fn new(sprite_count: u16, composition_offset: u32) -> Self {
        Self {
            sprite_count,
            composition_offset,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_BYTES] {
        let mut buffer = [0; ENTRY_BYTES];
        buffer[0..2].copy_from_slice(&self.sprite_count.to_be_bytes());
        buffer[2..6].copy_from_slice(&self.composition_offset.to_be_bytes());
        buffer[6..8].copy_from_slice(&self.reserved.to_be_bytes());
        buffer
    }
}

#[derive(Debug, Clone)]
pub struct CompositionTable {
    entries: Vec<CompositionEntry>,
    limit: usize,
}

impl Default for CompositionTable {
    fn default() -> Self {
        Self::with_limit(MAX_COMPOSITION_ENTRIES)
    }
}

impl CompositionTable {
    /// A table holding at most `limit` entries, never more than [`MAX_COMPOSITION_ENTRIES`].
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.min(MAX_COMPOSITION_ENTRIES),
        }
    }

    pub fn push(&mut self, entry: CompositionEntry) -> Result<(), SessionError> {
        push_bounded(&mut self.entries, entry, Table::Composition, self.limit)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[CompositionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.entries.len() * ENTRY_BYTES
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| e.to_bytes()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceTable {
    pub fn push(&mut self, entry: ReferenceEntry) -> Result<(), SessionError> {
        push_bounded(
            &mut self.entries,
            entry,
            Table::Reference,
            MAX_REFERENCE_ENTRIES,
        )
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.entries.len() * ENTRY_BYTES
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| e.to_bytes()).collect()
    }
}

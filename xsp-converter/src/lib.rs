//! Converts palette-indexed sprite sheets into data for the XSP sprite library on the X68000.
//!
//! Every frame of the sheet is cut into 16x16 hardware sprites. In composite mode identical
//! sprites share a pattern, and each frame becomes a list of sprite placements (the composition
//! table) located through the reference table. The results can be written as separate files or
//! as a single bundle, see [`packer`].

use snafu::Snafu;

mod canvas;
mod colour;
mod config;
mod image_loader;
mod metasprite;
pub mod packer;
mod pattern_store;
mod records;
mod scanner;
mod tile;

pub use canvas::{Frame, frames};
pub use colour::{PALETTE_SIZE, Palette, Rgba};
pub use config::{
    Anchor, ConfigError, ConfigV1, ConvertConfig, Layout, Mode, ModeSelect, Origin,
};
pub use image_loader::{IndexedImage, LoadError};
pub use pattern_store::{MAX_PATTERNS, PatternStore};
pub use records::{
    AllocationError, CapacityError, CompositionEntry, CompositionTable, ENTRY_BYTES,
    MAX_BUNDLE_COMPOSITION_ENTRIES, MAX_COMPOSITION_ENTRIES, MAX_REFERENCE_ENTRIES,
    ReferenceEntry, ReferenceTable, SessionError, Table,
};
pub use tile::{TILE_BYTES, TILE_SIZE, Tile};

use canvas::Canvas;
use metasprite::Session;

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(transparent)]
    Config { source: ConfigError },
    #[snafu(transparent)]
    Allocation { source: AllocationError },
}

/// The output of a conversion run, ready to be packed.
#[derive(Debug, Clone)]
pub struct Conversion {
    mode: Mode,
    patterns: PatternStore,
    composition: CompositionTable,
    references: ReferenceTable,
    palette: Palette,
    truncated: Option<CapacityError>,
}

impl Conversion {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn composition(&self) -> &CompositionTable {
        &self.composition
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Set when a table filled up and the remaining frames were skipped.
    pub fn truncated(&self) -> Option<CapacityError> {
        self.truncated
    }
}

/// Chops every frame of the sheet into sprites.
///
/// Running out of room in one of the tables is not an error: extraction stops, and whatever was
/// recorded up to that point is returned with [`Conversion::truncated`] set.
pub fn convert(image: &IndexedImage, config: &ConvertConfig) -> Result<Conversion, ConvertError> {
    config.validate(image.width(), image.height())?;

    let mode = config.mode();
    let placement_offset = config.placement_offset();

    let mut canvas = Canvas::new(image)?;
    let mut session = Session::new(mode).with_composition_limit(config.composition_limit());
    let mut truncated = None;

    for frame in frames(
        image.width(),
        image.height(),
        config.frame_width,
        config.frame_height,
    ) {
        match session.chop_frame(&mut canvas, &frame, placement_offset) {
            Ok(()) => {}
            Err(SessionError::Capacity { source }) => {
                tracing::error!(
                    x = frame.x,
                    y = frame.y,
                    "{source}, stopping extraction"
                );
                truncated = Some(source);
                break;
            }
            Err(SessionError::Allocation { source }) => return Err(source.into()),
        }
    }

    match mode {
        Mode::Composite => tracing::info!(
            patterns = session.patterns.len(),
            composition_entries = session.composition.len(),
            references = session.references.len(),
            "converted sprite sheet"
        ),
        Mode::SingleTile => tracing::info!(
            patterns = session.patterns.len(),
            "converted sprite sheet"
        ),
    }

    Ok(Conversion {
        mode,
        patterns: session.patterns,
        composition: session.composition,
        references: session.references,
        palette: Palette::from_rgba(image.palette()),
        truncated,
    })
}

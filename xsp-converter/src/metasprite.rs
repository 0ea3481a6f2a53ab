use crate::{
    canvas::{Canvas, Frame},
    config::Mode,
    pattern_store::PatternStore,
    records::{
        CompositionEntry, CompositionTable, ReferenceEntry, ReferenceTable, SessionError,
    },
    scanner,
    tile::Tile,
};

/// Everything accumulated over one conversion run.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub mode: Mode,
    pub patterns: PatternStore,
    pub composition: CompositionTable,
    pub references: ReferenceTable,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            patterns: PatternStore::new(),
            composition: CompositionTable::default(),
            references: ReferenceTable::default(),
        }
    }

    pub fn with_composition_limit(self, limit: usize) -> Self {
        Self {
            composition: CompositionTable::with_limit(limit),
            ..self
        }
    }

    /// Cuts every occupied block out of the frame.
    ///
    /// In composite mode the frame always gets a reference entry, even when it is empty or
    /// extraction stopped part way through.
    pub fn chop_frame(
        &mut self,
        canvas: &mut Canvas<'_>,
        frame: &Frame,
        placement_offset: (i32, i32),
    ) -> Result<(), SessionError> {
        let composition_offset = self.composition.byte_len() as u32;
        let mut sprite_count = 0;

        let extracted = self.extract_sprites(canvas, frame, placement_offset, &mut sprite_count);

        let recorded = match self.mode {
            Mode::Composite => self
                .references
                .push(ReferenceEntry::new(sprite_count, composition_offset)),
            Mode::SingleTile => Ok(()),
        };

        tracing::debug!(
            x = frame.x,
            y = frame.y,
            sprites = sprite_count,
            "chopped frame"
        );

        extracted.and(recorded)
    }

    fn extract_sprites(
        &mut self,
        canvas: &mut Canvas<'_>,
        frame: &Frame,
        (origin_x, origin_y): (i32, i32),
        sprite_count: &mut u16,
    ) -> Result<(), SessionError> {
        let mut last_vx = 0;
        let mut last_vy = 0;

        while let Some(block) = scanner::find_block(canvas, frame) {
            let tile = Tile::clip(canvas, block, frame);

            let pattern = match self.mode {
                Mode::Composite => self.patterns.find_or_push(tile)?,
                Mode::SingleTile => {
                    self.patterns.push(tile)?;
                    continue;
                }
            };

            let vx = (block.x - frame.x) as i32 - origin_x;
            let vy = (block.y - frame.y) as i32 - origin_y;

            self.composition.push(CompositionEntry::new(
                wrap_delta(vx - last_vx),
                wrap_delta(vy - last_vy),
                pattern as u16,
            ))?;

            *sprite_count += 1;
            last_vx = vx;
            last_vy = vy;
        }

        Ok(())
    }
}

// Deltas outside the i16 range wrap around rather than failing the conversion.
fn wrap_delta(delta: i32) -> i16 {
    let wrapped = delta as i16;
    if i32::from(wrapped) != delta {
        tracing::warn!(delta, wrapped, "sprite displacement does not fit in 16 bits");
    }

    wrapped
}

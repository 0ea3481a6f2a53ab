use crate::{
    canvas::{Canvas, Frame},
    tile::TILE_SIZE,
};

/// Top left corner of the next 16x16 block to cut out of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
    pub x: usize,
    pub y: usize,
}

/// Hunts top-down, then left-right, for the next occupied block in the frame.
///
/// The top-most occupied row becomes the block's top edge. The left edge is the left-most
/// column with an occupied pixel in the 16 rows starting there.
pub(crate) fn find_block(canvas: &Canvas<'_>, frame: &Frame) -> Option<Block> {
    let row = (frame.y..frame.bottom())
        .find(|&y| (frame.x..frame.right()).any(|x| canvas.is_occupied(x, y)))?;

    let band_end = (row + TILE_SIZE).min(frame.bottom());
    let Some(column) =
        (frame.x..frame.right()).find(|&x| (row..band_end).any(|y| canvas.is_occupied(x, y)))
    else {
        tracing::error!(row, "unexpectedly empty strip below occupied row");
        return None;
    };

    Some(Block { x: column, y: row })
}

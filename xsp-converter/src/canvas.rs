use crate::{
    image_loader::IndexedImage,
    records::{AllocationError, Table, try_reserve},
};

/// One cell of the sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x..self.right()).contains(&x) && (self.y..self.bottom()).contains(&y)
    }
}

/// Every whole frame in the sheet in row-major order. Partial cells at the right and bottom
/// edges are ignored.
pub fn frames(
    image_width: usize,
    image_height: usize,
    frame_width: usize,
    frame_height: usize,
) -> impl Iterator<Item = Frame> {
    let columns = image_width / frame_width;
    let rows = image_height / frame_height;

    (0..rows)
        .flat_map(move |row| (0..columns).map(move |column| (column, row)))
        .map(move |(column, row)| Frame {
            x: column * frame_width,
            y: row * frame_height,
            width: frame_width,
            height: frame_height,
        })
}

/// The sheet being converted, along with which pixels have already been taken by a tile.
///
/// The source image is never modified, so it can still be inspected once conversion ends.
pub(crate) struct Canvas<'a> {
    image: &'a IndexedImage,
    claimed: Vec<bool>,
}

impl<'a> Canvas<'a> {
    pub fn new(image: &'a IndexedImage) -> Result<Self, AllocationError> {
        let size = image.width() * image.height();
        let mut claimed = Vec::new();
        try_reserve(&mut claimed, size, Table::ClaimMask)?;
        claimed.resize(size, false);

        Ok(Self { image, claimed })
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        !self.claimed[self.index(x, y)] && self.image.pixel(x, y) != 0
    }

    /// Reads a pixel and marks it as used. Pixels which were already taken read as transparent.
    ///
    /// (x, y) must lie within the image. The tile clipper only asks for pixels inside the
    /// current frame, and every frame lies inside the image.
    pub fn take(&mut self, x: usize, y: usize) -> u8 {
        let index = self.index(x, y);
        if std::mem::replace(&mut self.claimed[index], true) {
            0
        } else {
            self.image.pixel(x, y)
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.image.width()
    }
}

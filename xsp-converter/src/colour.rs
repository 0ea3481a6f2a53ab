use std::fmt;

/// Number of entries in a sprite palette.
pub const PALETTE_SIZE: usize = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;

        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }

        Ok(())
    }
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    /// Packs the colour into the X68000's GGGGGRRRRRBBBBBI layout with the intensity bit clear.
    pub fn to_grb15(self) -> u16 {
        let (r, g, b) = (self.r as u16, self.g as u16, self.b as u16);
        (((g >> 3) & 31) << 11) | (((r >> 3) & 31) << 6) | (((b >> 3) & 31) << 1)
    }
}

/// The 16 colour sprite palette. Entry 0 is the transparent index and is always 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: [u16; PALETTE_SIZE],
}

impl Palette {
    pub fn from_rgba(colours: &[Rgba]) -> Self {
        if colours.len() < PALETTE_SIZE {
            tracing::warn!(
                colours = colours.len(),
                "source palette has fewer than {PALETTE_SIZE} entries, padding with 0"
            );
        }

        let mut entries = [0; PALETTE_SIZE];
        for (entry, colour) in entries.iter_mut().zip(colours).skip(1) {
            *entry = colour.to_grb15();
        }

        Palette { entries }
    }

    pub fn entries(&self) -> &[u16; PALETTE_SIZE] {
        &self.entries
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries
            .iter()
            .flat_map(|entry| entry.to_be_bytes())
            .collect()
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Rgba {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self::new(
            quickcheck::Arbitrary::arbitrary(g),
            quickcheck::Arbitrary::arbitrary(g),
            quickcheck::Arbitrary::arbitrary(g),
            quickcheck::Arbitrary::arbitrary(g),
        )
    }
}

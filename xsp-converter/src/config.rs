use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use snafu::{ResultExt, Snafu, ensure};

use crate::{
    records::{MAX_BUNDLE_COMPOSITION_ENTRIES, MAX_COMPOSITION_ENTRIES},
    tile::TILE_SIZE,
};

#[derive(Debug, Snafu)]
pub enum ConfigError {
    #[snafu(display("invalid frame size {width} x {height}"))]
    ZeroFrameSize { width: usize, height: usize },
    #[snafu(display(
        "frame size ({frame_width} x {frame_height}) exceeds source image ({image_width} x {image_height})"
    ))]
    FrameExceedsImage {
        frame_width: usize,
        frame_height: usize,
        image_width: usize,
        image_height: usize,
    },
    #[snafu(display("invalid origin {origin:?}, expected two characters such as \"cb\""))]
    InvalidOrigin { origin: String },
    #[snafu(display("unknown {kind} {value:?}"))]
    UnknownVariant { kind: &'static str, value: String },
    #[snafu(display("expected config version to be 1.0, got {version}"))]
    UnsupportedVersion { version: String },
    #[snafu(display("failed to read {}", path.display()))]
    ReadConfig { path: PathBuf, source: io::Error },
    #[snafu(display("failed to parse config"))]
    ParseConfig { source: toml::de::Error },
}

/// The resolved conversion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Frames become composite objects built from deduplicated tiles.
    Composite,
    /// Every extracted tile is emitted as-is, no composition or reference data.
    SingleTile,
}

impl Mode {
    pub fn tag(self) -> u16 {
        match self {
            Mode::Composite => 0,
            Mode::SingleTile => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelect {
    #[default]
    Auto,
    Composite,
    Single,
}

impl ModeSelect {
    pub fn resolve(self, frame_width: usize, frame_height: usize) -> Mode {
        match self {
            ModeSelect::Composite => Mode::Composite,
            ModeSelect::Single => Mode::SingleTile,
            ModeSelect::Auto if frame_width <= TILE_SIZE && frame_height <= TILE_SIZE => {
                Mode::SingleTile
            }
            ModeSelect::Auto => Mode::Composite,
        }
    }
}

impl FromStr for ModeSelect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ModeSelect::Auto),
            "composite" => Ok(ModeSelect::Composite),
            "single" => Ok(ModeSelect::Single),
            _ => UnknownVariantSnafu {
                kind: "mode",
                value: s,
            }
            .fail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Separate tile, composition, reference and palette files.
    #[default]
    Split,
    /// A single file with a header followed by every section.
    Bundle,
}

impl FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "split" => Ok(Layout::Split),
            "bundle" => Ok(Layout::Bundle),
            _ => UnknownVariantSnafu {
                kind: "layout",
                value: s,
            }
            .fail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    Start,
    #[default]
    Centre,
    End,
}

impl Anchor {
    fn position(self, length: usize) -> i32 {
        let length = length as i32;
        match self {
            Anchor::Start => 0,
            Anchor::Centre => length / 2,
            Anchor::End => length,
        }
    }
}

/// Where (0, 0) lies within each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct Origin {
    pub horizontal: Anchor,
    pub vertical: Anchor,
}

impl Origin {
    pub fn new(horizontal: Anchor, vertical: Anchor) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// The offset subtracted from a tile's frame position to place it.
    ///
    /// Hardware sprites are positioned by their centre, so the anchor point is pulled back by
    /// half a tile.
    pub fn placement_offset(self, frame_width: usize, frame_height: usize) -> (i32, i32) {
        let half_tile = (TILE_SIZE / 2) as i32;
        (
            self.horizontal.position(frame_width) - half_tile,
            self.vertical.position(frame_height) - half_tile,
        )
    }
}

impl FromStr for Origin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let horizontal = match lower.chars().next() {
            Some('l') => Some(Anchor::Start),
            Some('c') => Some(Anchor::Centre),
            Some('r') => Some(Anchor::End),
            _ => None,
        };
        let vertical = match lower.chars().nth(1) {
            Some('t') => Some(Anchor::Start),
            Some('c') => Some(Anchor::Centre),
            Some('b') => Some(Anchor::End),
            _ => None,
        };

        match (horizontal, vertical, lower.chars().count()) {
            (Some(horizontal), Some(vertical), 2) => Ok(Origin::new(horizontal, vertical)),
            _ => InvalidOriginSnafu { origin: s }.fail(),
        }
    }
}

impl TryFrom<String> for Origin {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertConfig {
    pub frame_width: usize,
    pub frame_height: usize,
    pub origin: Origin,
    pub mode: ModeSelect,
    pub layout: Layout,
}

impl ConvertConfig {
    pub fn new(frame_width: usize, frame_height: usize) -> Self {
        Self {
            frame_width,
            frame_height,
            origin: Origin::default(),
            mode: ModeSelect::default(),
            layout: Layout::default(),
        }
    }

    pub fn with_origin(&self, origin: Origin) -> Self {
        Self { origin, ..*self }
    }

    pub fn with_mode(&self, mode: ModeSelect) -> Self {
        Self { mode, ..*self }
    }

    pub fn with_layout(&self, layout: Layout) -> Self {
        Self { layout, ..*self }
    }

    pub fn validate(&self, image_width: usize, image_height: usize) -> Result<(), ConfigError> {
        ensure!(
            self.frame_width > 0 && self.frame_height > 0,
            ZeroFrameSizeSnafu {
                width: self.frame_width,
                height: self.frame_height,
            }
        );
        ensure!(
            self.frame_width <= image_width && self.frame_height <= image_height,
            FrameExceedsImageSnafu {
                frame_width: self.frame_width,
                frame_height: self.frame_height,
                image_width,
                image_height,
            }
        );

        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode.resolve(self.frame_width, self.frame_height)
    }

    pub fn placement_offset(&self) -> (i32, i32) {
        self.origin
            .placement_offset(self.frame_width, self.frame_height)
    }

    /// How many composition entries the chosen layout can describe.
    pub fn composition_limit(&self) -> usize {
        match self.layout {
            Layout::Split => MAX_COMPOSITION_ENTRIES,
            Layout::Bundle => MAX_BUNDLE_COMPOSITION_ENTRIES,
        }
    }
}

/// Settings read from a toml file. Anything left out keeps its default.
#[derive(Debug, Deserialize)]
pub struct ConfigV1 {
    version: String,
    origin: Option<Origin>,
    mode: Option<ModeSelect>,
    layout: Option<Layout>,
}

impl ConfigV1 {
    pub fn load(filename: &Path) -> Result<Self, ConfigError> {
        let config_toml = fs::read_to_string(filename).context(ReadConfigSnafu { path: filename })?;
        config_toml.parse()
    }

    pub fn apply(&self, config: ConvertConfig) -> ConvertConfig {
        ConvertConfig {
            origin: self.origin.unwrap_or(config.origin),
            mode: self.mode.unwrap_or(config.mode),
            layout: self.layout.unwrap_or(config.layout),
            ..config
        }
    }
}

impl FromStr for ConfigV1 {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: ConfigV1 = toml::from_str(s).context(ParseConfigSnafu)?;
        ensure!(
            config.version == "1.0",
            UnsupportedVersionSnafu {
                version: config.version,
            }
        );

        Ok(config)
    }
}
